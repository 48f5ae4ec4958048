use std::env;
use std::path::{Component, Path, PathBuf};

/// Make `path` absolute without touching the filesystem.
///
/// Relative paths are joined onto the process working directory, then `.` and `..`
/// components are resolved lexically. Symlinks are not followed, so two spellings of
/// the same file through different links stay different.
pub fn absolutize(path: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    normalize(&joined)
}

/// Resolve `.` and `..` components lexically.
///
/// A `..` at the root is dropped, the same way `/..` is `/` on Unix.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let popped = matches!(out.components().next_back(), Some(Component::Normal(_)));
                if popped {
                    out.pop();
                } else if !out.has_root() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Components of `path` relative to `base`, as display strings.
///
/// Paths outside of `base` are returned in full, component by component.
pub fn relative_components(path: &Path, base: &Path) -> Vec<String> {
    let rel = path.strip_prefix(base).unwrap_or(path);
    rel.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(unix)]
    fn normalize_resolves_dots() {
        assert_eq!(normalize(Path::new("/a/./b/../c")), PathBuf::from("/a/c"));
        assert_eq!(normalize(Path::new("/../a")), PathBuf::from("/a"));
        assert_eq!(normalize(Path::new("a/../../b")), PathBuf::from("../b"));
    }

    #[test]
    fn absolutize_relative_uses_current_dir() {
        let cwd = env::current_dir().unwrap();
        assert_eq!(absolutize(Path::new("x/./y.py")), cwd.join("x").join("y.py"));
    }

    #[test]
    #[cfg(unix)]
    fn relative_components_strip_base() {
        let parts = relative_components(
            Path::new("/repo/Unidad 1/Tema A/s.py"),
            Path::new("/repo"),
        );
        assert_eq!(parts, vec!["Unidad 1", "Tema A", "s.py"]);

        let outside = relative_components(Path::new("/elsewhere/s.py"), Path::new("/repo"));
        assert_eq!(outside, vec!["elsewhere", "s.py"]);
    }
}
