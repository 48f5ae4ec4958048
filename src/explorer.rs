use crate::item::{NO_TOPIC, ScriptItem};
use log::debug;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};

/// Scans the unit/topic/script tree below a base directory.
///
/// Nothing is cached: every call reads the directory again, so files added or removed
/// while the dashboard is open show up on the next listing.
#[derive(Debug, Clone)]
pub struct ProjectExplorer {
    base_path: PathBuf,
    unit_pattern: Regex,
    extension: String,
}

impl ProjectExplorer {
    /// `unit_pattern` selects unit folders by name; `extension` is the script
    /// extension without the leading dot, compared case-insensitively.
    pub fn new(base_path: impl Into<PathBuf>, unit_pattern: Regex, extension: &str) -> Self {
        Self {
            base_path: base_path.into(),
            unit_pattern,
            extension: extension.trim_start_matches('.').to_lowercase(),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Every folder directly below the base path.
    pub fn all_dirs(&self) -> Vec<String> {
        list_dirs(&self.base_path)
    }

    /// Unit folders: the ones matching the unit pattern, or all folders if none match.
    pub fn units(&self) -> Vec<String> {
        let all = self.all_dirs();
        let units: Vec<String> = all
            .iter()
            .filter(|name| self.unit_pattern.is_match(name))
            .cloned()
            .collect();
        if units.is_empty() { all } else { units }
    }

    pub fn topics(&self, unit_path: &Path) -> Vec<String> {
        list_dirs(unit_path)
    }

    pub fn scripts(&self, topic_path: &Path) -> Vec<String> {
        list_files(topic_path, |name| self.is_script(name))
    }

    pub fn is_script(&self, name: &str) -> bool {
        Path::new(name)
            .extension()
            .is_some_and(|ext| ext.to_string_lossy().to_lowercase() == self.extension)
    }

    /// Flatten the whole tree into a list of scripts.
    ///
    /// A unit without topic folders contributes the scripts lying directly inside it,
    /// labelled with [`NO_TOPIC`].
    pub fn collect_all_scripts(&self) -> Vec<ScriptItem> {
        let mut items = Vec::new();
        for unit in self.units() {
            let unit_path = self.base_path.join(&unit);
            let topics = self.topics(&unit_path);
            if topics.is_empty() {
                for script in self.scripts(&unit_path) {
                    let path = unit_path.join(&script);
                    items.push(ScriptItem::new(&unit, NO_TOPIC, script, path));
                }
                continue;
            }

            for topic in topics {
                let topic_path = unit_path.join(&topic);
                for script in self.scripts(&topic_path) {
                    let path = topic_path.join(&script);
                    items.push(ScriptItem::new(&unit, &topic, script, path));
                }
            }
        }
        items
    }

    /// Scripts whose file name contains `query`, ignoring case.
    pub fn search(&self, query: &str) -> Vec<ScriptItem> {
        let needle = query.to_lowercase();
        self.collect_all_scripts()
            .into_iter()
            .filter(|item| item.script_name.to_lowercase().contains(&needle))
            .collect()
    }
}

fn list_dirs(path: &Path) -> Vec<String> {
    list_entries(path, |entry| entry.path().is_dir())
}

fn list_files(path: &Path, keep: impl Fn(&str) -> bool) -> Vec<String> {
    let mut names = list_entries(path, |entry| entry.path().is_file());
    names.retain(|name| keep(name.as_str()));
    names
}

/// Sorted names of the entries of `path` accepted by `keep`.
///
/// Unreadable directories and entries yield nothing rather than an error, and names
/// that are not valid UTF-8 are skipped.
fn list_entries(path: &Path, keep: impl Fn(&fs::DirEntry) -> bool) -> Vec<String> {
    let entries = match fs::read_dir(path) {
        Ok(entries) => entries,
        Err(e) => {
            debug!("can't list {}: {}", path.display(), e);
            return Vec::new();
        }
    };

    let mut names: Vec<String> = entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| keep(entry))
        .filter_map(|entry| entry.file_name().into_string().ok())
        .collect();
    names.sort();
    names
}
