use crate::config::Environment;
use crate::launcher::{
    self, Invocation, LaunchStrategy, Spawner, SystemSpawner, find_command_path,
};
use crate::paths::absolutize;
use anyhow::{Context, Result};
use log::debug;
use std::ffi::OsStr;
use std::fs;
use std::path::Path;

/// Interpreter names tried in order when none is configured.
const INTERPRETER_CANDIDATES: &[&str] = if cfg!(windows) {
    &["python", "py"]
} else {
    &["python3", "python"]
};

/// Read a text file, decoding it as UTF-8 or, failing that, as Latin-1.
///
/// Latin-1 maps every byte to a character, so once the file is read the fallback
/// always succeeds. Returns `None` when the file can't be read at all.
pub fn read_text_file(path: &Path) -> Option<String> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            debug!("can't read {}: {}", path.display(), e);
            return None;
        }
    };
    match String::from_utf8(bytes) {
        Ok(text) => Some(text),
        Err(e) => {
            debug!("{} is not UTF-8, decoding as Latin-1", path.display());
            Some(e.into_bytes().iter().map(|&b| char::from(b)).collect())
        }
    }
}

/// Pick the interpreter used to run scripts: the first candidate found on `PATH`, or
/// the first candidate name if none is installed.
pub fn detect_interpreter(env: &Environment) -> String {
    let search_paths = env.get_var("PATH").unwrap_or_default();
    INTERPRETER_CANDIDATES
        .iter()
        .find_map(|name| {
            find_command_path(OsStr::new(&search_paths), &env.current_dir, Path::new(name))
                .map(|p| p.to_string_lossy().into_owned())
        })
        .unwrap_or_else(|| INTERPRETER_CANDIDATES[0].to_string())
}

/// Shows and launches scripts.
pub struct ScriptRunner {
    interpreter: String,
    env: Environment,
    terminals: Vec<Box<dyn LaunchStrategy>>,
    openers: Vec<Box<dyn LaunchStrategy>>,
    spawner: Box<dyn Spawner>,
}

impl ScriptRunner {
    /// Runner with the platform's terminal and opener strategies and real processes.
    ///
    /// Without an explicit `interpreter` one is looked up on `PATH`.
    pub fn new(interpreter: Option<String>, env: Environment) -> Self {
        let interpreter = interpreter.unwrap_or_else(|| detect_interpreter(&env));
        debug!("scripts run with {}", interpreter);
        Self {
            interpreter,
            env,
            terminals: launcher::terminal_strategies(),
            openers: launcher::opener_strategies(),
            spawner: Box::new(SystemSpawner),
        }
    }

    /// Replace the terminal and opener strategy lists.
    pub fn with_strategies(
        mut self,
        terminals: Vec<Box<dyn LaunchStrategy>>,
        openers: Vec<Box<dyn LaunchStrategy>>,
    ) -> Self {
        self.terminals = terminals;
        self.openers = openers;
        self
    }

    /// Replace how processes are started.
    pub fn with_spawner(mut self, spawner: Box<dyn Spawner>) -> Self {
        self.spawner = spawner;
        self
    }

    pub fn interpreter(&self) -> &str {
        &self.interpreter
    }

    /// Source text of the script, or `None` if it can't be read.
    pub fn show_code(&self, script_path: &Path) -> Option<String> {
        read_text_file(script_path)
    }

    /// Launch the script with the interpreter, in a new terminal window when possible.
    ///
    /// Returns the name of the launcher that started it. The process is not waited on.
    pub fn run(&mut self, script_path: &Path) -> Result<String> {
        let target = Invocation::new(&self.interpreter).arg(absolutize(script_path));
        let used = launcher::launch_first(
            &self.terminals,
            &self.env,
            &target,
            self.spawner.as_mut(),
        )
        .with_context(|| format!("can't run {}", script_path.display()))?;
        Ok(used.to_string())
    }

    /// Open a file or folder with its default application.
    pub fn open(&mut self, path: &Path) -> Result<()> {
        let target = Invocation::new(absolutize(path));
        launcher::launch_first(&self.openers, &self.env, &target, self.spawner.as_mut())
            .with_context(|| format!("can't open {}", path.display()))?;
        Ok(())
    }
}
