use notify::Event;
use notify::EventKind;
use std::path::PathBuf;
use std::time::Instant;

/// Kind of a filesystem change delivered to the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileEventKind {
    Modified,
    Created,
    Deleted,
}

/// A single filesystem change. Transient: produced by the watch backend,
/// consumed immediately by the dispatcher, never persisted.
#[derive(Debug, Clone)]
pub struct FileEvent {
    pub path: PathBuf,
    pub kind: FileEventKind,
    pub timestamp: Instant,
}

impl FileEvent {
    pub fn new(path: PathBuf, kind: FileEventKind, timestamp: Instant) -> Self {
        Self {
            path,
            kind,
            timestamp,
        }
    }

    /// Convert a raw notify event into dispatchable events. Access and
    /// metadata-only notifications produce nothing.
    pub(crate) fn from_notify(event: Event) -> Vec<FileEvent> {
        let kind = match event.kind {
            EventKind::Create(_) => FileEventKind::Created,
            EventKind::Modify(_) => FileEventKind::Modified,
            EventKind::Remove(_) => FileEventKind::Deleted,
            EventKind::Access(_) | EventKind::Any | EventKind::Other => return Vec::new(),
        };
        let timestamp = Instant::now();
        event
            .paths
            .into_iter()
            .map(|path| FileEvent::new(path, kind, timestamp))
            .collect()
    }
}
