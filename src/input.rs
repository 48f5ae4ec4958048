use log::warn;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

/// Source of user answers for the menus.
///
/// `None` means there is nothing more to read (end of input, Ctrl-C) and the dashboard
/// should shut down.
pub trait LineSource {
    fn read_line(&mut self, prompt: &str) -> Option<String>;
}

/// Interactive terminal input with line editing and history.
pub struct Readline {
    editor: DefaultEditor,
}

impl Readline {
    pub fn new() -> rustyline::Result<Self> {
        Ok(Self {
            editor: DefaultEditor::new()?,
        })
    }
}

impl LineSource for Readline {
    fn read_line(&mut self, prompt: &str) -> Option<String> {
        match self.editor.readline(prompt) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    if let Err(err) = self.editor.add_history_entry(line.as_str()) {
                        warn!("can't record history: {}", err);
                    }
                }
                Some(line)
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => None,
            Err(err) => {
                warn!("can't read input: {}", err);
                None
            }
        }
    }
}

/// Memory-backed input that replays prepared answers.
///
/// Prompts are recorded so a caller can check what was asked.
pub struct ScriptedInput {
    lines: VecDeque<String>,
    prompts: Rc<RefCell<Vec<String>>>,
}

impl ScriptedInput {
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
            prompts: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// Convenience: create the input and return (input, prompts handle).
    pub fn with_handle<I, S>(lines: I) -> (Self, Rc<RefCell<Vec<String>>>)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let input = Self::new(lines);
        let prompts = input.prompts.clone();
        (input, prompts)
    }
}

impl LineSource for ScriptedInput {
    fn read_line(&mut self, prompt: &str) -> Option<String> {
        self.prompts.borrow_mut().push(prompt.to_string());
        self.lines.pop_front()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scripted_input_replays_then_ends() {
        let (mut input, prompts) = ScriptedInput::with_handle(["1", "0"]);

        assert_eq!(input.read_line("a? ").as_deref(), Some("1"));
        assert_eq!(input.read_line("b? ").as_deref(), Some("0"));
        assert_eq!(input.read_line("c? "), None);
        assert_eq!(*prompts.borrow(), vec!["a? ", "b? ", "c? "]);
    }
}
