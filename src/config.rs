use anyhow::{Context, Result};
use argh::FromArgs;
use regex::{Regex, RegexBuilder};
use std::collections::HashMap;
use std::env as stdenv;
use std::path::PathBuf;

/// Default name of the favorites file, created inside the base directory.
pub const FAVORITES_FILE_NAME: &str = "dashboard_favorites.txt";

/// Snapshot of the process environment used to locate external programs.
///
/// The environment contains:
/// - `vars`: environment variables, `PATH` being the one that matters here.
/// - `current_dir`: the directory relative paths are resolved against.
///
/// Tests build one by hand to control which programs appear to be installed.
#[derive(Debug, Clone)]
pub struct Environment {
    pub vars: HashMap<String, String>,
    pub current_dir: PathBuf,
}

impl Environment {
    /// Capture the current process state.
    pub fn new() -> Self {
        let vars = stdenv::vars().collect();
        let current_dir = stdenv::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self { vars, current_dir }
    }

    /// Get the value of an environment variable.
    ///
    /// Only `self.vars` is consulted, so a hand-built environment stays isolated from
    /// the real one.
    pub fn get_var(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }

    pub fn set_var(&mut self, key: impl Into<String>, val: impl Into<String>) {
        self.vars.insert(key.into(), val.into());
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(FromArgs, Debug)]
/// Browse, read and launch the scripts of a course repository organised in unit and
/// topic folders.
pub struct Args {
    #[argh(option, short = 'b')]
    /// directory holding the unit folders. Defaults to the current directory.
    pub base: Option<PathBuf>,

    #[argh(option)]
    /// file where favorites are stored. Defaults to dashboard_favorites.txt in the base directory.
    pub favorites: Option<PathBuf>,

    #[argh(option, short = 'i')]
    /// interpreter used to run scripts. Defaults to the first python found on PATH.
    pub interpreter: Option<String>,

    #[argh(option, default = "String::from(\"py\")")]
    /// extension of the files listed as scripts.
    pub extension: String,

    #[argh(option, default = "String::from(\"^unidad\")")]
    /// case-insensitive regular expression selecting unit folders. When no folder
    /// matches, every folder is a unit.
    pub unit_pattern: String,

    #[argh(switch)]
    /// do not clear the screen between menus.
    pub no_clear: bool,

    #[argh(switch, short = 'v')]
    /// print debug logs to stderr.
    pub verbose: bool,
}

/// Fully resolved dashboard configuration.
#[derive(Debug, Clone)]
pub struct Settings {
    pub base_path: PathBuf,
    pub favorites_file: PathBuf,
    pub interpreter: Option<String>,
    pub extension: String,
    pub unit_pattern: Regex,
    pub clear_screen: bool,
}

impl Settings {
    /// Resolve command line arguments against the environment.
    ///
    /// Relative paths are anchored at `env.current_dir`. Fails only on an invalid unit
    /// pattern.
    pub fn from_args(args: Args, env: &Environment) -> Result<Self> {
        let base_path = match args.base {
            Some(base) if base.is_absolute() => base,
            Some(base) => env.current_dir.join(base),
            None => env.current_dir.clone(),
        };
        let base_path = crate::paths::normalize(&base_path);

        let favorites_file = match args.favorites {
            Some(file) if file.is_absolute() => file,
            Some(file) => env.current_dir.join(file),
            None => base_path.join(FAVORITES_FILE_NAME),
        };

        let unit_pattern = RegexBuilder::new(&args.unit_pattern)
            .case_insensitive(true)
            .build()
            .with_context(|| format!("invalid unit pattern: {}", args.unit_pattern))?;

        Ok(Self {
            base_path,
            favorites_file,
            interpreter: args.interpreter.filter(|i| !i.trim().is_empty()),
            extension: args.extension,
            unit_pattern,
            clear_screen: !args.no_clear,
        })
    }
}
