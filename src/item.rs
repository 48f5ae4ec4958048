use crate::paths;
use std::path::{Path, PathBuf};

/// Topic label used for scripts that sit directly inside a unit folder.
pub const NO_TOPIC: &str = "(no topic)";

const UNKNOWN_UNIT: &str = "(unknown)";

/// A script found in the project tree.
///
/// This is a display handle: it is rebuilt from a fresh scan every time a menu is
/// rendered and never outlives the menu that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptItem {
    pub unit_name: String,
    pub topic_name: String,
    pub script_name: String,
    pub script_path: PathBuf,
}

impl ScriptItem {
    pub fn new(
        unit_name: impl Into<String>,
        topic_name: impl Into<String>,
        script_name: impl Into<String>,
        script_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            unit_name: unit_name.into(),
            topic_name: topic_name.into(),
            script_name: script_name.into(),
            script_path: script_path.into(),
        }
    }

    /// Guess unit and topic for a bare path, e.g. a favorite read back from disk.
    ///
    /// The first component below `base` is the unit. The second one is the topic only
    /// when the script is at least two folders deep, otherwise it gets [`NO_TOPIC`].
    pub fn from_path(path: &Path, base: &Path) -> Self {
        let parts = paths::relative_components(path, base);
        let unit = parts.first().map(String::as_str).unwrap_or(UNKNOWN_UNIT);
        let topic = if parts.len() >= 3 { parts[1].as_str() } else { NO_TOPIC };
        let script = parts
            .last()
            .cloned()
            .unwrap_or_else(|| path.to_string_lossy().into_owned());
        Self::new(unit, topic, script, path)
    }

    pub fn display_label(&self) -> String {
        format!(
            "{} > {} > {}",
            self.unit_name, self.topic_name, self.script_name
        )
    }
}
