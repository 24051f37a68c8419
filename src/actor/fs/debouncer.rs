use std::path::PathBuf;
use std::time::{Duration, Instant};

use rustc_hash::FxHashMap;

use super::types::ChangeKind;

/// Quiet period before a burst of events is released
pub(super) const DEBOUNCE: Duration = Duration::from_millis(300);

/// Sleep used while nothing is pending
const IDLE_SLEEP: Duration = Duration::from_secs(3600);

/// Collects changes until the filesystem has been quiet for `DEBOUNCE`.
pub(super) struct Debouncer {
    pub(super) changes: FxHashMap<PathBuf, ChangeKind>,
    last_event: Option<Instant>,
}

impl Debouncer {
    pub(super) fn new() -> Self {
        Self {
            changes: FxHashMap::default(),
            last_event: None,
        }
    }

    /// Record one change. A file created and removed within the same window
    /// cancels out; otherwise the latest kind is kept.
    pub(super) fn add(&mut self, path: PathBuf, kind: ChangeKind) {
        self.last_event = Some(Instant::now());

        match (self.changes.get(&path).copied(), kind) {
            (Some(ChangeKind::Created), ChangeKind::Removed) => {
                crate::debug!("watch"; "discard transient file: {}", path.display());
                self.changes.remove(&path);
            }
            (Some(ChangeKind::Created), ChangeKind::Modified) => {}
            _ => {
                crate::debug!("watch"; "{}: {}", kind.label(), path.display());
                self.changes.insert(path, kind);
            }
        }
    }

    pub(super) fn is_ready(&self) -> bool {
        self.last_event
            .is_some_and(|t| t.elapsed() >= DEBOUNCE && !self.changes.is_empty())
    }

    /// Take the collected paths (sorted) once quiet long enough
    pub(super) fn take_if_ready(&mut self) -> Option<Vec<PathBuf>> {
        if !self.last_event.is_some_and(|t| t.elapsed() >= DEBOUNCE) {
            return None;
        }
        self.last_event = None;
        if self.changes.is_empty() {
            return None;
        }

        let mut paths: Vec<_> = std::mem::take(&mut self.changes).into_keys().collect();
        paths.sort();
        Some(paths)
    }

    /// Time until the pending burst could be released
    pub(super) fn sleep_duration(&self) -> Duration {
        match self.last_event {
            Some(t) => DEBOUNCE
                .saturating_sub(t.elapsed())
                .max(Duration::from_millis(1)),
            None => IDLE_SLEEP,
        }
    }
}
