use crate::config::{Environment, Settings};
use crate::explorer::ProjectExplorer;
use crate::favorites::FavoritesStore;
use crate::input::LineSource;
use crate::item::{NO_TOPIC, ScriptItem};
use crate::runner::ScriptRunner;
use anyhow::Result;
use log::debug;
use std::io::Write;
use std::path::{Path, PathBuf};

const WIDTH: usize = 60;
const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";
const FAVORITE_MARK: &str = "★";

/// Where control goes after a menu returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    /// Back to the menu that opened this one.
    Back,
    /// Unwind to the main menu.
    Home,
    /// Leave the dashboard.
    Quit,
}

/// How a numbered menu answer was understood.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Choice {
    Back,
    Index(usize),
    NotANumber,
    OutOfRange,
}

fn parse_choice(answer: &str, len: usize) -> Choice {
    if answer == "0" {
        return Choice::Back;
    }
    if answer.is_empty() || !answer.chars().all(|c| c.is_ascii_digit()) {
        return Choice::NotANumber;
    }
    match answer.parse::<usize>() {
        Ok(n) if (1..=len).contains(&n) => Choice::Index(n - 1),
        _ => Choice::OutOfRange,
    }
}

/// The interactive menu application.
///
/// Every menu re-reads the filesystem when it is drawn, so the only state kept across
/// menus is the favorites list.
pub struct Dashboard<I: LineSource, W: Write> {
    base_path: PathBuf,
    clear_screen: bool,
    explorer: ProjectExplorer,
    runner: ScriptRunner,
    favorites: FavoritesStore,
    input: I,
    out: W,
}

impl<I: LineSource, W: Write> Dashboard<I, W> {
    pub fn new(settings: &Settings, env: Environment, input: I, out: W) -> Self {
        Self {
            base_path: settings.base_path.clone(),
            clear_screen: settings.clear_screen,
            explorer: ProjectExplorer::new(
                &settings.base_path,
                settings.unit_pattern.clone(),
                &settings.extension,
            ),
            runner: ScriptRunner::new(settings.interpreter.clone(), env),
            favorites: FavoritesStore::open(&settings.favorites_file),
            input,
            out,
        }
    }

    /// Replace the script runner, e.g. to control how processes are started.
    pub fn with_runner(mut self, runner: ScriptRunner) -> Self {
        self.runner = runner;
        self
    }

    pub fn favorites(&self) -> &FavoritesStore {
        &self.favorites
    }

    pub fn into_output(self) -> W {
        self.out
    }

    /// Run the main menu until the user exits or input ends.
    pub fn run(&mut self) -> Result<()> {
        loop {
            self.header("MAIN MENU - DASHBOARD")?;
            if self.explorer.units().is_empty() {
                writeln!(self.out, "No folders were found in the project.")?;
                writeln!(self.out, "Create folders such as 'Unidad 1', 'Unidad 2', etc.")?;
                self.pause(None)?;
                return Ok(());
            }

            writeln!(self.out, "\nOptions:")?;
            writeln!(self.out, "1) Browse units and scripts")?;
            writeln!(self.out, "2) Search a script by name")?;
            writeln!(self.out, "3) Favorites")?;
            writeln!(self.out, "4) Open the project folder")?;
            writeln!(self.out, "0) Exit")?;

            let Some(answer) = self.ask("Choose an option:")? else {
                return Ok(());
            };
            let flow = match answer.as_str() {
                "0" => {
                    writeln!(self.out, "\nLeaving the dashboard. Good luck!")?;
                    return Ok(());
                }
                "1" => self.units_menu()?,
                "2" => self.search_menu()?,
                "3" => self.favorites_menu()?,
                "4" => {
                    let base = self.base_path.clone();
                    self.open_path(&base)?;
                    self.pause_or_quit(Some("Tried to open the folder. Press Enter..."))?
                }
                _ => self.reject("Invalid option.")?,
            };
            if flow == Flow::Quit {
                return Ok(());
            }
        }
    }

    fn units_menu(&mut self) -> Result<Flow> {
        loop {
            self.header("UNITS")?;
            let units = self.explorer.units();
            self.numbered(&units)?;
            writeln!(self.out, "0) Back")?;

            let Some(answer) = self.ask("Select a unit:")? else {
                return Ok(Flow::Quit);
            };
            let flow = match parse_choice(&answer, units.len()) {
                Choice::Back => return Ok(Flow::Back),
                Choice::Index(i) => {
                    let unit_path = self.base_path.join(&units[i]);
                    self.topics_menu(&units[i], &unit_path)?
                }
                Choice::NotANumber => self.reject("Enter a valid number.")?,
                Choice::OutOfRange => self.reject("Option out of range.")?,
            };
            if flow != Flow::Back {
                return Ok(flow);
            }
        }
    }

    fn topics_menu(&mut self, unit: &str, unit_path: &Path) -> Result<Flow> {
        loop {
            self.header(&format!("TOPICS - {}", unit))?;
            let topics = self.explorer.topics(unit_path);
            if topics.is_empty() {
                writeln!(self.out, "This unit has no topic folders.")?;
                writeln!(self.out, "Looking for scripts directly inside the unit.\n")?;
                return self.scripts_menu(unit, NO_TOPIC, unit_path);
            }

            self.numbered(&topics)?;
            writeln!(self.out, "0) Back")?;

            let Some(answer) = self.ask("Select a topic:")? else {
                return Ok(Flow::Quit);
            };
            let flow = match parse_choice(&answer, topics.len()) {
                Choice::Back => return Ok(Flow::Back),
                Choice::Index(i) => {
                    let topic_path = unit_path.join(&topics[i]);
                    self.scripts_menu(unit, &topics[i], &topic_path)?
                }
                Choice::NotANumber => self.reject("Enter a valid number.")?,
                Choice::OutOfRange => self.reject("Option out of range.")?,
            };
            if flow != Flow::Back {
                return Ok(flow);
            }
        }
    }

    fn scripts_menu(&mut self, unit: &str, topic: &str, topic_path: &Path) -> Result<Flow> {
        loop {
            self.header(&format!("SCRIPTS - {} > {}", unit, topic))?;
            let scripts = self.explorer.scripts(topic_path);
            if scripts.is_empty() {
                writeln!(self.out, "No scripts were found in this folder.")?;
                return self.pause_or_quit(None);
            }

            for (i, script) in scripts.iter().enumerate() {
                let mark = self.mark(&topic_path.join(script));
                writeln!(self.out, "{}) [{}] {}", i + 1, mark, script)?;
            }
            writeln!(self.out, "\nActions:")?;
            writeln!(self.out, "0) Back")?;
            writeln!(self.out, "m) Main menu")?;

            let Some(answer) = self.ask("Choose a script (number), 0 or m:")? else {
                return Ok(Flow::Quit);
            };
            if answer.eq_ignore_ascii_case("m") {
                return Ok(Flow::Home);
            }
            let flow = match parse_choice(&answer, scripts.len()) {
                Choice::Back => return Ok(Flow::Back),
                Choice::Index(i) => {
                    let item = ScriptItem::new(
                        unit,
                        topic,
                        scripts[i].as_str(),
                        topic_path.join(&scripts[i]),
                    );
                    self.script_actions_menu(&item)?
                }
                Choice::NotANumber => self.reject("Enter a valid number.")?,
                Choice::OutOfRange => self.reject("Option out of range.")?,
            };
            if flow != Flow::Back {
                return Ok(flow);
            }
        }
    }

    fn script_actions_menu(&mut self, item: &ScriptItem) -> Result<Flow> {
        loop {
            self.header("SCRIPT ACTIONS")?;
            writeln!(self.out, "\nSelected: {}", item.display_label())?;
            writeln!(self.out, "Path: {}\n", item.script_path.display())?;
            writeln!(self.out, "1) View code")?;
            writeln!(self.out, "2) Run script")?;
            writeln!(self.out, "3) Open script in editor")?;
            writeln!(self.out, "4) Toggle favorite")?;
            writeln!(self.out, "0) Back")?;

            let Some(answer) = self.ask("Choose an action:")? else {
                return Ok(Flow::Quit);
            };
            let flow = match answer.as_str() {
                "0" => return Ok(Flow::Back),
                "1" => {
                    self.show_code(item)?;
                    self.pause_or_quit(None)?
                }
                "2" => {
                    writeln!(
                        self.out,
                        "Running... (a new terminal window opens when possible)"
                    )?;
                    match self.runner.run(&item.script_path) {
                        Ok(used) => writeln!(self.out, "Script launched via {}.", used)?,
                        Err(e) => writeln!(self.out, "Could not run the script: {:#}", e)?,
                    }
                    self.pause_or_quit(Some("Press Enter to go back..."))?
                }
                "3" => {
                    self.open_path(&item.script_path)?;
                    self.pause_or_quit(Some("Tried to open the script. Press Enter..."))?
                }
                "4" => {
                    self.toggle_favorite(item)?;
                    self.pause_or_quit(None)?
                }
                _ => self.reject("Invalid option.")?,
            };
            if flow == Flow::Quit {
                return Ok(flow);
            }
        }
    }

    fn search_menu(&mut self) -> Result<Flow> {
        loop {
            self.header("SEARCH SCRIPT")?;
            let Some(query) = self.ask("Type part of the script name, or 0 to go back:")? else {
                return Ok(Flow::Quit);
            };
            if query == "0" {
                return Ok(Flow::Back);
            }

            let matches = self.explorer.search(&query);
            debug!("search {:?}: {} match(es)", query, matches.len());
            if matches.is_empty() {
                writeln!(self.out, "\nNo matches found.")?;
                if self.pause_or_quit(None)? == Flow::Quit {
                    return Ok(Flow::Quit);
                }
                continue;
            }

            writeln!(self.out, "\nMatches:")?;
            for (i, item) in matches.iter().enumerate() {
                let mark = self.mark(&item.script_path);
                writeln!(self.out, "{}) [{}] {}", i + 1, mark, item.display_label())?;
            }

            let Some(answer) = self.ask("Pick a number to open its actions, or 0 to search again:")?
            else {
                return Ok(Flow::Quit);
            };
            let flow = match parse_choice(&answer, matches.len()) {
                Choice::Back => Flow::Back,
                Choice::Index(i) => self.script_actions_menu(&matches[i])?,
                Choice::NotANumber => self.reject("Enter a valid number.")?,
                Choice::OutOfRange => self.reject("Option out of range.")?,
            };
            if flow != Flow::Back {
                return Ok(flow);
            }
        }
    }

    fn favorites_menu(&mut self) -> Result<Flow> {
        loop {
            self.header("FAVORITES")?;
            let items: Vec<ScriptItem> = self
                .favorites
                .list()
                .iter()
                .map(|path| ScriptItem::from_path(path, &self.base_path))
                .collect();

            if items.is_empty() {
                writeln!(self.out, "You have no favorites yet.")?;
                writeln!(self.out, "Mark scripts as favorites from their actions menu.\n")?;
                return self.pause_or_quit(None);
            }

            for (i, item) in items.iter().enumerate() {
                writeln!(self.out, "{}) {} {}", i + 1, FAVORITE_MARK, item.display_label())?;
            }
            writeln!(self.out, "\nActions:")?;
            writeln!(self.out, "0) Back")?;

            let Some(answer) = self.ask("Choose a favorite for its actions, or 0 to go back:")?
            else {
                return Ok(Flow::Quit);
            };
            let flow = match parse_choice(&answer, items.len()) {
                Choice::Back => return Ok(Flow::Back),
                Choice::Index(i) => self.script_actions_menu(&items[i])?,
                Choice::NotANumber => self.reject("Enter a valid number.")?,
                Choice::OutOfRange => self.reject("Option out of range.")?,
            };
            if flow != Flow::Back {
                return Ok(flow);
            }
        }
    }

    fn show_code(&mut self, item: &ScriptItem) -> Result<()> {
        writeln!(self.out, "\n--- Code: {} ---\n", item.script_name)?;
        match self.runner.show_code(&item.script_path) {
            Some(code) => writeln!(self.out, "{}", code)?,
            None => writeln!(self.out, "Could not read the file.")?,
        }
        Ok(())
    }

    fn toggle_favorite(&mut self, item: &ScriptItem) -> Result<()> {
        if self.favorites.is_favorite(&item.script_path) {
            self.favorites.remove(&item.script_path);
            writeln!(self.out, "Favorite removed.")?;
        } else if self.favorites.add(&item.script_path) {
            writeln!(self.out, "Favorite added.")?;
        } else {
            writeln!(self.out, "Could not add the favorite: the file is gone.")?;
        }
        Ok(())
    }

    fn open_path(&mut self, path: &Path) -> Result<()> {
        if let Err(e) = self.runner.open(path) {
            writeln!(self.out, "Could not open it: {:#}", e)?;
        }
        Ok(())
    }

    fn mark(&self, path: &Path) -> &'static str {
        if self.favorites.is_favorite(path) {
            FAVORITE_MARK
        } else {
            " "
        }
    }

    fn numbered(&mut self, names: &[String]) -> Result<()> {
        for (i, name) in names.iter().enumerate() {
            writeln!(self.out, "{}) {}", i + 1, name)?;
        }
        Ok(())
    }

    fn header(&mut self, title: &str) -> Result<()> {
        if self.clear_screen {
            write!(self.out, "{}", CLEAR_SCREEN)?;
        }
        let rule = "=".repeat(WIDTH);
        writeln!(self.out, "{}", rule)?;
        writeln!(self.out, "{:^width$}", title, width = WIDTH)?;
        writeln!(self.out, "{}", rule)?;
        writeln!(self.out, "Project path: {}", self.base_path.display())?;
        writeln!(self.out, "{}", rule)?;
        Ok(())
    }

    /// Read one trimmed answer. `None` once input has ended.
    fn ask(&mut self, prompt: &str) -> Result<Option<String>> {
        writeln!(self.out)?;
        self.out.flush()?;
        let answer = self.input.read_line(&format!("{} ", prompt));
        Ok(answer.map(|a| a.trim().to_string()))
    }

    /// Wait for Enter. Returns false once input has ended.
    fn pause(&mut self, msg: Option<&str>) -> Result<bool> {
        let msg = msg.unwrap_or("Press Enter to continue...");
        Ok(self.ask(msg)?.is_some())
    }

    fn pause_or_quit(&mut self, msg: Option<&str>) -> Result<Flow> {
        Ok(if self.pause(msg)? { Flow::Back } else { Flow::Quit })
    }

    fn reject(&mut self, msg: &str) -> Result<Flow> {
        writeln!(self.out, "{}", msg)?;
        self.pause_or_quit(None)
    }
}
