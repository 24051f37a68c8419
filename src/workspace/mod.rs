//! Disposable working copy of the viewer sources.
//!
//! Injection rewrites the entry HTML in place, so it only ever runs against
//! this copy. The copy lives in a fresh temporary directory and is removed
//! on `cleanup` (or drop).

use std::fs;
use std::path::{Path, PathBuf};

use jwalk::WalkDir;
use tempfile::TempDir;

use crate::core::PreviewError;
use crate::utils::path::normalize_path;

const DIR_PREFIX: &str = "livedoc-";

/// Never copied into the working copy
const IGNORED_FILES: &[&str] = &[".DS_Store"];

pub struct Workspace {
    dir: Option<TempDir>,
    /// Canonical path of the copy
    root: PathBuf,
}

impl Workspace {
    /// Copy `source` (recursively, hidden files included) into a new
    /// temporary directory.
    pub fn create(source: &Path) -> Result<Self, PreviewError> {
        if !source.is_dir() {
            return Err(PreviewError::Io(
                source.to_path_buf(),
                std::io::Error::new(std::io::ErrorKind::NotFound, "viewer directory not found"),
            ));
        }

        let dir = tempfile::Builder::new()
            .prefix(DIR_PREFIX)
            .tempdir()
            .map_err(|e| PreviewError::Io(std::env::temp_dir(), e))?;
        let root = normalize_path(dir.path());

        let stats = copy_tree(source, &root)?;
        crate::debug!("serve"; "copied {} files to {}", stats.copied, root.display());
        if stats.skipped > 0 {
            crate::log!("serve"; "working copy is incomplete: {} entries unreadable", stats.skipped);
        }

        Ok(Self {
            dir: Some(dir),
            root,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of `relative` inside the copy
    pub fn join(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.root.join(relative)
    }

    /// Remove the copy. Further calls are no-ops.
    pub fn cleanup(&mut self) -> Result<(), PreviewError> {
        match self.dir.take() {
            Some(dir) => dir
                .close()
                .map_err(|e| PreviewError::Io(self.root.clone(), e)),
            None => Ok(()),
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct CopyStats {
    copied: usize,
    /// Entries or directory listings that could not be read
    skipped: usize,
}

/// Copy every file under `from` into `to`. Unreadable entries are logged
/// and skipped; write failures abort.
fn copy_tree(from: &Path, to: &Path) -> Result<CopyStats, PreviewError> {
    let mut stats = CopyStats::default();

    for entry in WalkDir::new(from)
        .skip_hidden(false)
        .follow_links(true)
        .into_iter()
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                crate::log!("serve"; "skipped while copying viewer: {}", e);
                stats.skipped += 1;
                continue;
            }
        };
        if let Some(e) = &entry.read_children_error {
            crate::log!("serve"; "cannot list {}: {}", entry.path().display(), e);
            stats.skipped += 1;
        }

        let path = entry.path();
        let Ok(relative) = path.strip_prefix(from) else {
            continue;
        };
        let target = to.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target).map_err(|e| PreviewError::Io(target.clone(), e))?;
            continue;
        }

        let name = entry.file_name().to_str().unwrap_or_default();
        if !entry.file_type().is_file() || IGNORED_FILES.contains(&name) {
            continue;
        }

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|e| PreviewError::Io(parent.to_path_buf(), e))?;
        }
        fs::copy(&path, &target).map_err(|e| PreviewError::Io(path.clone(), e))?;
        stats.copied += 1;
    }

    Ok(stats)
}
