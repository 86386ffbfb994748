use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WatcherError {
    #[error("watch root does not exist: {}", .0.display())]
    PathNotFound(PathBuf),

    #[error("failed to start filesystem watch: {0}")]
    WatchStart(#[from] notify::Error),

    #[error("invalid watcher configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, WatcherError>;
