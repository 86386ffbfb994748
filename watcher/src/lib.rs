//! Filesystem watching for the Sentinel pipeline.
//!
//! An observer establishes a recursive watch over a source tree (native
//! change notifications, falling back to polling when the native mechanism
//! cannot start) and feeds raw events to a dispatcher on a dedicated handler
//! thread. The dispatcher filters by extension, debounces rapid modify
//! bursts, hands accepted paths to the static-analysis collaborator, and can
//! forward changed content to an AI hook after explicit operator
//! confirmation.

mod config;
mod debounce;
mod dispatcher;
mod error;
mod event;
mod observer;

pub use config::WatcherConfig;
pub use debounce::DebounceRegistry;
pub use dispatcher::AiHook;
pub use dispatcher::ChangeDispatcher;
pub use error::Result;
pub use error::WatcherError;
pub use event::FileEvent;
pub use event::FileEventKind;
pub use observer::WatchMode;
pub use observer::WatchSession;
pub use observer::start;
pub use observer::start_polling;
