//! Starting external programs without waiting for them.
//!
//! A launch goes through an ordered list of [`LaunchStrategy`] candidates, e.g. a few
//! terminal emulators followed by a plain background process. The first candidate that
//! is installed and starts successfully wins.

use crate::config::Environment;
use anyhow::{Result, anyhow};
use log::debug;
use std::ffi::{OsStr, OsString};
use std::io;
use std::path::{Component, Path, PathBuf};
use std::process::{Command, Stdio};

/// A program and its arguments, e.g. `python3 /abs/script.py`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: OsString,
    pub args: Vec<OsString>,
}

impl Invocation {
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// All words of the invocation, program first.
    pub fn words(&self) -> impl Iterator<Item = &OsStr> {
        std::iter::once(self.program.as_os_str()).chain(self.args.iter().map(|a| a.as_os_str()))
    }

    /// The invocation as one shell-like command line, with words containing spaces quoted.
    pub fn command_line(&self) -> String {
        self.words()
            .map(|w| {
                let w = w.to_string_lossy();
                if w.is_empty() || w.contains([' ', '\t', '"', '\'']) {
                    format!("\"{}\"", w.replace('\\', "\\\\").replace('"', "\\\""))
                } else {
                    w.into_owned()
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// One way of starting an [`Invocation`].
///
/// Returns `None` when the strategy does not apply here, typically because the program
/// it relies on is not installed.
pub trait LaunchStrategy {
    /// Short human readable name, e.g. "gnome-terminal".
    fn name(&self) -> &str;

    /// Build the command that starts `target`.
    fn try_create(&self, env: &Environment, target: &Invocation) -> Option<Command>;
}

/// Starts a prepared command.
///
/// The dashboard never waits on what it launches, so implementations only report
/// whether the process could be started.
pub trait Spawner {
    fn spawn(&mut self, cmd: &mut Command) -> io::Result<()>;
}

/// Spawns real processes and forgets about them.
#[derive(Debug, Default)]
pub struct SystemSpawner;

impl Spawner for SystemSpawner {
    fn spawn(&mut self, cmd: &mut Command) -> io::Result<()> {
        cmd.spawn().map(|_child| ())
    }
}

/// How a wrapper program receives the wrapped invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgStyle {
    /// Each word as its own argument: `xterm -e python3 /x.py`.
    Separate,
    /// The whole invocation as a single argument: `mate-terminal -e "python3 /x.py"`.
    Joined,
    /// An AppleScript asking Terminal.app to run the invocation.
    AppleScript,
}

/// Runs the invocation through another program, such as a terminal emulator or the
/// system file opener.
#[derive(Debug, Clone)]
pub struct Wrapper {
    pub name: &'static str,
    pub program: &'static str,
    pub prefix: &'static [&'static str],
    pub style: ArgStyle,
}

impl Wrapper {
    pub const fn new(
        name: &'static str,
        program: &'static str,
        prefix: &'static [&'static str],
        style: ArgStyle,
    ) -> Self {
        Self {
            name,
            program,
            prefix,
            style,
        }
    }
}

impl LaunchStrategy for Wrapper {
    fn name(&self) -> &str {
        self.name
    }

    fn try_create(&self, env: &Environment, target: &Invocation) -> Option<Command> {
        let search_paths = env.get_var("PATH")?;
        let program = find_command_path(
            OsStr::new(&search_paths),
            &env.current_dir,
            Path::new(self.program),
        )?;

        let mut cmd = Command::new(program);
        cmd.args(self.prefix);
        match self.style {
            ArgStyle::Separate => {
                cmd.args(target.words());
            }
            ArgStyle::Joined => {
                cmd.arg(target.command_line());
            }
            ArgStyle::AppleScript => {
                let line = target.command_line().replace('\\', "\\\\").replace('"', "\\\"");
                cmd.arg(format!("tell application \"Terminal\" to do script \"{}\"", line));
            }
        }
        cmd.current_dir(&env.current_dir);
        Some(cmd)
    }
}

/// Runs the invocation directly with all standard streams detached.
#[derive(Debug, Clone, Default)]
pub struct Background;

impl LaunchStrategy for Background {
    fn name(&self) -> &str {
        "background"
    }

    fn try_create(&self, env: &Environment, target: &Invocation) -> Option<Command> {
        let program = Path::new(&target.program);
        let program = if program.components().count() > 1 {
            env.current_dir.join(program)
        } else {
            program.to_path_buf()
        };
        let mut cmd = Command::new(program);
        cmd.args(&target.args)
            .current_dir(&env.current_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        Some(cmd)
    }
}

/// Terminal emulators worth trying on this platform, best first, with a silent
/// background process as the last resort.
pub fn terminal_strategies() -> Vec<Box<dyn LaunchStrategy>> {
    let mut strategies: Vec<Box<dyn LaunchStrategy>> = Vec::new();
    if cfg!(windows) {
        strategies.push(Box::new(Wrapper::new(
            "cmd",
            "cmd",
            &["/C", "start", "", "cmd", "/K"],
            ArgStyle::Separate,
        )));
    } else if cfg!(target_os = "macos") {
        strategies.push(Box::new(Wrapper::new(
            "Terminal.app",
            "osascript",
            &["-e"],
            ArgStyle::AppleScript,
        )));
    } else {
        strategies.push(Box::new(Wrapper::new(
            "gnome-terminal",
            "gnome-terminal",
            &["--"],
            ArgStyle::Separate,
        )));
        strategies.push(Box::new(Wrapper::new(
            "konsole",
            "konsole",
            &["-e"],
            ArgStyle::Separate,
        )));
        strategies.push(Box::new(Wrapper::new(
            "xterm",
            "xterm",
            &["-hold", "-e"],
            ArgStyle::Separate,
        )));
        strategies.push(Box::new(Wrapper::new(
            "mate-terminal",
            "mate-terminal",
            &["-e"],
            ArgStyle::Joined,
        )));
    }
    strategies.push(Box::new(Background));
    strategies
}

/// The program that opens files and folders with their default application.
pub fn opener_strategies() -> Vec<Box<dyn LaunchStrategy>> {
    let opener = if cfg!(windows) {
        Wrapper::new("start", "cmd", &["/C", "start", ""], ArgStyle::Separate)
    } else if cfg!(target_os = "macos") {
        Wrapper::new("open", "open", &[], ArgStyle::Separate)
    } else {
        Wrapper::new("xdg-open", "xdg-open", &[], ArgStyle::Separate)
    };
    vec![Box::new(opener)]
}

/// Start `target` with the first strategy that applies and spawns successfully.
///
/// Returns the name of the strategy used. The error lists every failed attempt.
pub fn launch_first<'a>(
    strategies: &'a [Box<dyn LaunchStrategy>],
    env: &Environment,
    target: &Invocation,
    spawner: &mut dyn Spawner,
) -> Result<&'a str> {
    let mut failures = Vec::new();
    for strategy in strategies {
        let Some(mut cmd) = strategy.try_create(env, target) else {
            debug!("{}: not available", strategy.name());
            continue;
        };
        match spawner.spawn(&mut cmd) {
            Ok(()) => {
                debug!("launched {} via {}", target.command_line(), strategy.name());
                return Ok(strategy.name());
            }
            Err(e) => {
                debug!("{}: {}", strategy.name(), e);
                failures.push(format!("{}: {}", strategy.name(), e));
            }
        }
    }

    if failures.is_empty() {
        Err(anyhow!("no launcher available for {}", target.command_line()))
    } else {
        Err(anyhow!(
            "could not start {} ({})",
            target.command_line(),
            failures.join("; ")
        ))
    }
}

/// Locate the executable file `path` refers to.
///
/// A bare name such as `python3` is looked up in the `search_paths` directories (on
/// Windows `.exe`, `.cmd` and `.bat` are tried as well). Anything else, `./tool` and
/// `venv/bin/python` included, is taken relative to `base` unless it is absolute.
/// Only regular files count.
pub fn find_command_path(search_paths: &OsStr, base: &Path, path: &Path) -> Option<PathBuf> {
    let mut components = path.components();
    match (components.next(), components.next()) {
        (None, _) => None,
        (Some(Component::Normal(name)), None) => find_in_path(search_paths, name),
        _ => find_by_path(&base.join(path)).map(Path::to_path_buf),
    }
}

fn find_in_path(search_paths: &OsStr, cmd: &OsStr) -> Option<PathBuf> {
    for dir in std::env::split_paths(search_paths) {
        let path = dir.join(cmd);
        if let Some(path) = find_by_path(&path) {
            return Some(path.to_owned());
        }
        if cfg!(windows) {
            for ext in ["exe", "cmd", "bat"] {
                let with_ext = path.with_extension(ext);
                if with_ext.is_file() {
                    return Some(with_ext);
                }
            }
        }
    }
    None
}

fn find_by_path(path: &Path) -> Option<&Path> {
    if path.is_file() { Some(path) } else { None }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::fs::{self, File};
    use std::rc::Rc;
    use tempfile::TempDir;

    /// Records the program of every spawn attempt and fails the ones listed in `broken`.
    struct RecordingSpawner {
        attempts: Rc<RefCell<Vec<String>>>,
        broken: Vec<&'static str>,
    }

    impl RecordingSpawner {
        fn with_handle(broken: Vec<&'static str>) -> (Self, Rc<RefCell<Vec<String>>>) {
            let attempts = Rc::new(RefCell::new(Vec::new()));
            let spawner = Self {
                attempts: attempts.clone(),
                broken,
            };
            (spawner, attempts)
        }
    }

    impl Spawner for RecordingSpawner {
        fn spawn(&mut self, cmd: &mut Command) -> io::Result<()> {
            let program = Path::new(cmd.get_program())
                .file_name()
                .unwrap_or_default()
                .to_string_lossy()
                .into_owned();
            self.attempts.borrow_mut().push(program.clone());
            if self.broken.contains(&program.as_str()) {
                Err(io::Error::new(io::ErrorKind::NotFound, "broken"))
            } else {
                Ok(())
            }
        }
    }

    /// An environment whose PATH only contains a temp dir with the given fake programs.
    fn env_with_programs(programs: &[&str]) -> (TempDir, Environment) {
        let tmp = TempDir::new().expect("temp dir");
        for program in programs {
            File::create(tmp.path().join(program)).expect("touch program");
        }
        let mut vars = HashMap::new();
        vars.insert(
            "PATH".to_string(),
            tmp.path().to_string_lossy().into_owned(),
        );
        let env = Environment {
            vars,
            current_dir: tmp.path().to_path_buf(),
        };
        (tmp, env)
    }

    fn target() -> Invocation {
        Invocation::new("python3").arg("/course/Unidad 1/a.py")
    }

    fn strategies() -> Vec<Box<dyn LaunchStrategy>> {
        vec![
            Box::new(Wrapper::new("first", "first-term", &["-e"], ArgStyle::Separate)),
            Box::new(Wrapper::new("second", "second-term", &["-e"], ArgStyle::Joined)),
            Box::new(Background),
        ]
    }

    #[test]
    fn command_line_quotes_words_with_spaces() {
        assert_eq!(target().command_line(), "python3 \"/course/Unidad 1/a.py\"");
        assert_eq!(Invocation::new("a").arg("b").command_line(), "a b");
    }

    #[test]
    fn separate_style_appends_each_word() {
        let (_tmp, env) = env_with_programs(&["xterm"]);
        let wrapper = Wrapper::new("xterm", "xterm", &["-hold", "-e"], ArgStyle::Separate);

        let cmd = wrapper.try_create(&env, &target()).expect("xterm is installed");
        let args: Vec<_> = cmd.get_args().map(|a| a.to_string_lossy().into_owned()).collect();

        assert_eq!(args, vec!["-hold", "-e", "python3", "/course/Unidad 1/a.py"]);
    }

    #[test]
    fn joined_style_passes_one_argument() {
        let (_tmp, env) = env_with_programs(&["mate-terminal"]);
        let wrapper = Wrapper::new("mate", "mate-terminal", &["-e"], ArgStyle::Joined);

        let cmd = wrapper.try_create(&env, &target()).expect("mate is installed");
        let args: Vec<_> = cmd.get_args().map(|a| a.to_string_lossy().into_owned()).collect();

        assert_eq!(args, vec!["-e", "python3 \"/course/Unidad 1/a.py\""]);
    }

    #[test]
    fn apple_script_style_escapes_quotes() {
        let (_tmp, env) = env_with_programs(&["osascript"]);
        let wrapper = Wrapper::new("Terminal.app", "osascript", &["-e"], ArgStyle::AppleScript);

        let cmd = wrapper.try_create(&env, &target()).expect("osascript is installed");
        let args: Vec<_> = cmd.get_args().map(|a| a.to_string_lossy().into_owned()).collect();

        assert_eq!(
            args[1],
            "tell application \"Terminal\" to do script \"python3 \\\"/course/Unidad 1/a.py\\\"\""
        );
    }

    #[test]
    fn missing_program_is_not_applicable() {
        let (_tmp, env) = env_with_programs(&[]);
        let wrapper = Wrapper::new("xterm", "xterm", &["-e"], ArgStyle::Separate);
        assert!(wrapper.try_create(&env, &target()).is_none());
    }

    #[test]
    fn first_installed_strategy_wins() {
        let (_tmp, env) = env_with_programs(&["first-term", "second-term"]);
        let (mut spawner, attempts) = RecordingSpawner::with_handle(vec![]);
        let list = strategies();

        let used = launch_first(&list, &env, &target(), &mut spawner).unwrap();

        assert_eq!(used, "first");
        assert_eq!(*attempts.borrow(), vec!["first-term"]);
    }

    #[test]
    fn spawn_failure_falls_through_to_next() {
        let (_tmp, env) = env_with_programs(&["first-term", "second-term"]);
        let (mut spawner, attempts) = RecordingSpawner::with_handle(vec!["first-term"]);
        let list = strategies();

        let used = launch_first(&list, &env, &target(), &mut spawner).unwrap();

        assert_eq!(used, "second");
        assert_eq!(*attempts.borrow(), vec!["first-term", "second-term"]);
    }

    #[test]
    fn falls_back_to_background() {
        let (_tmp, env) = env_with_programs(&[]);
        let (mut spawner, attempts) = RecordingSpawner::with_handle(vec![]);
        let list = strategies();

        let used = launch_first(&list, &env, &target(), &mut spawner).unwrap();

        assert_eq!(used, "background");
        assert_eq!(*attempts.borrow(), vec!["python3"]);
    }

    #[test]
    fn every_failure_is_reported() {
        let (_tmp, env) = env_with_programs(&["first-term"]);
        let (mut spawner, _attempts) =
            RecordingSpawner::with_handle(vec!["first-term", "python3"]);
        let list = strategies();

        let err = launch_first(&list, &env, &target(), &mut spawner).unwrap_err();
        let msg = err.to_string();

        assert!(msg.contains("first: broken"), "{}", msg);
        assert!(msg.contains("background: broken"), "{}", msg);
    }

    #[test]
    fn platform_lists_end_with_background() {
        let list = terminal_strategies();
        assert_eq!(list.last().map(|s| s.name()), Some("background"));
        assert_eq!(opener_strategies().len(), 1);
    }

    #[test]
    #[cfg(unix)]
    fn absolute_existing_true() {
        let path = Path::new("/bin/sh");
        let res = find_command_path(OsStr::new("/bin"), Path::new("/nowhere"), path);
        assert_eq!(res.as_deref(), Some(path));
    }

    #[test]
    #[cfg(unix)]
    fn single_component_found_in_path() {
        let (tmp, _env) = env_with_programs(&["tool"]);
        let res = find_command_path(tmp.path().as_os_str(), Path::new("/nowhere"), Path::new("tool"));
        assert_eq!(res, Some(tmp.path().join("tool")));
    }

    #[test]
    fn single_component_not_found_in_path() {
        let (tmp, _env) = env_with_programs(&[]);
        let res = find_command_path(tmp.path().as_os_str(), tmp.path(), Path::new("nonexisting"));
        assert!(res.is_none());
    }

    #[test]
    fn directories_are_not_commands() {
        let (tmp, _env) = env_with_programs(&[]);
        fs::create_dir(tmp.path().join("xterm")).unwrap();
        let res = find_command_path(tmp.path().as_os_str(), tmp.path(), Path::new("xterm"));
        assert!(res.is_none());
    }

    #[test]
    fn empty_path_is_none() {
        let res = find_command_path(OsStr::new("/bin"), Path::new("/"), Path::new(""));
        assert!(res.is_none());
    }

    #[test]
    fn relative_paths_resolve_against_base_not_process_cwd() {
        let (tmp, env) = env_with_programs(&[]);
        fs::create_dir(tmp.path().join("bin")).unwrap();
        File::create(tmp.path().join("bin").join("tool")).unwrap();
        File::create(tmp.path().join("local")).unwrap();
        assert_ne!(std::env::current_dir().unwrap(), env.current_dir);

        let nested = find_command_path(OsStr::new(""), &env.current_dir, Path::new("bin/tool"));
        assert_eq!(nested, Some(tmp.path().join("bin").join("tool")));

        let dotted = find_command_path(OsStr::new(""), &env.current_dir, Path::new("./local"));
        assert_eq!(dotted, Some(tmp.path().join("./local")));

        let bare = find_command_path(OsStr::new(""), &env.current_dir, Path::new("local"));
        assert!(bare.is_none());
    }

    #[test]
    fn background_anchors_relative_program_at_current_dir() {
        let (_tmp, env) = env_with_programs(&[]);
        let target = Invocation::new("venv/bin/python").arg("a.py");

        let cmd = Background.try_create(&env, &target).expect("always available");
        assert_eq!(
            Path::new(cmd.get_program()),
            env.current_dir.join("venv/bin/python")
        );

        let cmd = Background.try_create(&env, &Invocation::new("python3")).unwrap();
        assert_eq!(cmd.get_program(), "python3");
    }
}
