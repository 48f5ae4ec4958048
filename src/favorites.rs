use crate::paths::absolutize;
use crate::runner::read_text_file;
use anyhow::{Context, Result};
use log::{debug, warn};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Favorite scripts, persisted as one absolute path per line.
///
/// Stale entries (files that no longer exist) are dropped when the file is loaded,
/// but the file itself is only rewritten on the next change. Storage failures are
/// logged and otherwise ignored: losing a favorite is never worth interrupting the
/// user.
#[derive(Debug)]
pub struct FavoritesStore {
    file: PathBuf,
    favorites: Vec<PathBuf>,
}

impl FavoritesStore {
    /// Open the store backed by `file` and load its current contents.
    pub fn open(file: impl Into<PathBuf>) -> Self {
        let mut store = Self {
            file: file.into(),
            favorites: Vec::new(),
        };
        store.load();
        store
    }

    pub fn file(&self) -> &Path {
        &self.file
    }

    /// Replace the in-memory list with the entries of the backing file that still exist.
    pub fn load(&mut self) {
        let Some(content) = read_text_file(&self.file) else {
            debug!("no favorites at {}", self.file.display());
            self.favorites.clear();
            return;
        };

        self.favorites = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|line| absolutize(Path::new(line)))
            .filter(|path| {
                let exists = path.exists();
                if !exists {
                    debug!("dropping stale favorite {}", path.display());
                }
                exists
            })
            .fold(Vec::new(), |mut acc, path| {
                if !acc.contains(&path) {
                    acc.push(path);
                }
                acc
            });
    }

    /// Write the whole list back to the backing file.
    pub fn save(&self) {
        if let Err(e) = self.try_save() {
            warn!("could not save favorites: {:#}", e);
        }
    }

    fn try_save(&self) -> Result<()> {
        let mut f = fs::File::create(&self.file)
            .with_context(|| format!("can't create {}", self.file.display()))?;
        for path in &self.favorites {
            writeln!(f, "{}", path.display())
                .with_context(|| format!("can't write {}", self.file.display()))?;
        }
        Ok(())
    }

    /// Favorites in insertion order.
    pub fn list(&self) -> Vec<PathBuf> {
        self.favorites.clone()
    }

    pub fn is_favorite(&self, path: &Path) -> bool {
        let target = absolutize(path);
        self.favorites.iter().any(|p| absolutize(p) == target)
    }

    /// Add `path` if it exists and isn't a favorite yet. Returns whether the list changed.
    pub fn add(&mut self, path: &Path) -> bool {
        let path = absolutize(path);
        if path.as_os_str().to_string_lossy().contains(['\n', '\r']) {
            warn!(
                "can't store favorite {:?}: line breaks are not supported",
                path
            );
            return false;
        }
        if self.favorites.contains(&path) || !path.exists() {
            return false;
        }
        self.favorites.push(path);
        self.save();
        true
    }

    /// Remove `path` from the favorites. Returns whether the list changed.
    pub fn remove(&mut self, path: &Path) -> bool {
        let target = absolutize(path);
        let before = self.favorites.len();
        self.favorites.retain(|p| absolutize(p) != target);
        let changed = self.favorites.len() != before;
        self.save();
        changed
    }
}
