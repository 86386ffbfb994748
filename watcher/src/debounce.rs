use std::collections::HashMap;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;
use std::time::Instant;

/// Last-seen timestamps per path, used to suppress duplicate modify events
/// within a fixed window. Entries never expire; the map grows with the number
/// of distinct touched files for the session lifetime.
#[derive(Debug)]
pub struct DebounceRegistry {
    window: Duration,
    last_seen: HashMap<PathBuf, Instant>,
}

impl DebounceRegistry {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_seen: HashMap::new(),
        }
    }

    /// Returns true when the event should be dispatched. The stored
    /// timestamp is only advanced for accepted events, so a burst of rapid
    /// changes is collapsed onto its first event.
    pub fn accept(&mut self, path: &Path, now: Instant) -> bool {
        if let Some(previous) = self.last_seen.get(path) {
            if now.duration_since(*previous) < self.window {
                return false;
            }
        }
        self.last_seen.insert(path.to_path_buf(), now);
        true
    }

    pub fn tracked_paths(&self) -> usize {
        self.last_seen.len()
    }
}
