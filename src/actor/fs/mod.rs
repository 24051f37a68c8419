//! FileSystem Actor
//!
//! Watches the project tree and sends debounced change batches to the
//! ChangeCoordinator.
//!
//! ```text
//! notify watcher -> bridge thread -> Debouncer (300ms quiet) -> CoordinatorMsg::Changed
//! ```
//!
//! The watcher starts in `new`, so changes made while the session is still
//! starting up are buffered rather than lost.

use std::path::{Path, PathBuf};

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use super::messages::CoordinatorMsg;
use crate::utils::path::normalize_path;

mod debouncer;
mod types;

#[cfg(test)]
mod tests;

use debouncer::Debouncer;
use types::ChangeKind;

/// Directory names never worth regenerating for
const IGNORED_DIRS: &[&str] = &[".git", ".hg", ".svn", "node_modules", "bower_components", "target"];

/// FileSystem Actor - watches for file changes
pub struct FsActor {
    /// Channel to receive notify events (sync -> async bridge)
    notify_rx: std::sync::mpsc::Receiver<notify::Result<notify::Event>>,
    /// Watcher handle (must be kept alive)
    _watcher: RecommendedWatcher,
    coordinator_tx: mpsc::Sender<CoordinatorMsg>,
    filter: PathFilter,
}

impl FsActor {
    /// Start watching `roots` recursively. Paths under `ignored` never
    /// produce events.
    pub fn new(
        roots: &[PathBuf],
        ignored: Vec<PathBuf>,
        coordinator_tx: mpsc::Sender<CoordinatorMsg>,
    ) -> notify::Result<Self> {
        let (notify_tx, notify_rx) = std::sync::mpsc::channel();

        let mut watcher = notify::recommended_watcher(move |res| {
            let _ = notify_tx.send(res);
        })?;

        for root in roots {
            watcher.watch(root, RecursiveMode::Recursive)?;
            crate::debug!("watch"; "watching {}", root.display());
        }

        Ok(Self {
            notify_rx,
            _watcher: watcher,
            coordinator_tx,
            filter: PathFilter::new(ignored),
        })
    }

    /// Run the actor event loop. Returns when the coordinator is gone.
    pub async fn run(self) {
        let Self {
            notify_rx,
            _watcher,
            coordinator_tx,
            filter,
        } = self;
        let mut debouncer = Debouncer::new();

        let (async_tx, mut async_rx) = mpsc::channel::<notify::Event>(64);

        std::thread::spawn(move || {
            while let Ok(result) = notify_rx.recv() {
                match result {
                    Ok(event) => {
                        if async_tx.blocking_send(event).is_err() {
                            break;
                        }
                    }
                    Err(e) => crate::log!("watch"; "notify error: {}", e),
                }
            }
        });

        loop {
            tokio::select! {
                biased;
                event = async_rx.recv() => match event {
                    Some(event) => collect(&mut debouncer, &filter, &event),
                    None => break,
                },
                _ = tokio::time::sleep(debouncer.sleep_duration()) => {
                    let Some(paths) = debouncer.take_if_ready() else {
                        continue;
                    };
                    if coordinator_tx.send(CoordinatorMsg::Changed(paths)).await.is_err() {
                        break;
                    }
                }
            }
        }

        crate::debug!("watch"; "watcher stopped");
    }
}

fn collect(debouncer: &mut Debouncer, filter: &PathFilter, event: &notify::Event) {
    let Some(kind) = ChangeKind::from_event(&event.kind) else {
        return;
    };

    for path in &event.paths {
        if filter.is_ignored(path) {
            continue;
        }
        debouncer.add(normalize_path(path), kind);
    }
}

/// Decides which paths can trigger a regeneration
struct PathFilter {
    ignored: Vec<PathBuf>,
}

impl PathFilter {
    fn new(ignored: Vec<PathBuf>) -> Self {
        Self {
            ignored: ignored.iter().map(|p| normalize_path(p)).collect(),
        }
    }

    fn is_ignored(&self, path: &Path) -> bool {
        if is_temp_file(path) {
            return true;
        }

        let in_ignored_dir = path.components().any(|c| {
            c.as_os_str()
                .to_str()
                .is_some_and(|name| IGNORED_DIRS.contains(&name))
        });
        if in_ignored_dir {
            return true;
        }

        let path = normalize_path(path);
        self.ignored.iter().any(|dir| path.starts_with(dir))
    }
}

/// Editor swap/backup files and hidden files
fn is_temp_file(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    matches!(ext, "bck" | "bak" | "backup" | "swp" | "swo" | "swx" | "tmp")
        || name.ends_with('~')
        || name.starts_with('.')
        || name.starts_with('#')
}
