//! Filesystem path helpers.

use std::path::{Path, PathBuf};

/// Absolute form of `path`.
///
/// Canonicalizes when the path exists; otherwise joins relative paths onto
/// the current directory without touching the filesystem.
pub fn normalize_path(path: &Path) -> PathBuf {
    if let Ok(canonical) = path.canonicalize() {
        return canonical;
    }
    if path.is_absolute() {
        return path.to_path_buf();
    }
    match std::env::current_dir() {
        Ok(cwd) => cwd.join(path),
        Err(_) => path.to_path_buf(),
    }
}

/// Resolve a config-relative path against `root`. Absolute paths and `~`
/// expansions are kept as given.
pub fn resolve_in(root: &Path, path: &Path) -> PathBuf {
    let expanded = shellexpand::tilde(&path.to_string_lossy()).into_owned();
    let expanded = PathBuf::from(expanded);
    if expanded.is_absolute() {
        expanded
    } else {
        root.join(expanded)
    }
}
