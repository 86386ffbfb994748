use crate::config::WatcherConfig;
use crate::dispatcher::ChangeDispatcher;
use crate::error::Result;
use crate::error::WatcherError;
use crate::event::FileEvent;
use notify::Config as NotifyConfig;
use notify::PollWatcher;
use notify::RecommendedWatcher;
use notify::RecursiveMode;
use notify::Watcher;
use std::path::Path;
use std::path::PathBuf;
use std::sync::mpsc;
use std::thread;
use std::thread::JoinHandle;
use tracing::info;
use tracing::warn;

/// Watch strategy that ended up serving the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchMode {
    Native,
    Polling,
}

/// Uniform handle over the interchangeable watch backends.
type WatchBackend = Box<dyn Watcher + Send>;

/// A running watch over a directory tree. Stopping the session releases the
/// underlying watch and joins the handler thread, so no further dispatcher
/// invocations happen after `stop` returns.
pub struct WatchSession {
    root: PathBuf,
    mode: WatchMode,
    backend: Option<WatchBackend>,
    handler: Option<JoinHandle<()>>,
    running: bool,
}

impl std::fmt::Debug for WatchSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchSession")
            .field("root", &self.root)
            .field("mode", &self.mode)
            .field("backend", &self.backend.as_ref().map(|_| "..."))
            .field("handler", &self.handler)
            .field("running", &self.running)
            .finish()
    }
}

impl WatchSession {
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn mode(&self) -> WatchMode {
        self.mode
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn stop(&mut self) {
        if !self.running {
            return;
        }
        self.running = false;
        // Dropping the backend stops event delivery and closes the channel;
        // the handler thread drains what is already queued and exits.
        self.backend.take();
        if let Some(handle) = self.handler.take() {
            if handle.join().is_err() {
                warn!("watch handler thread panicked");
            }
        }
        info!("stopped watching {}", self.root.display());
    }
}

impl Drop for WatchSession {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Start watching `config.root_dir` recursively with the native
/// change-notification mechanism, falling back to a polling watch when the
/// native watch cannot start and `config.poll_fallback` is enabled.
pub fn start(config: WatcherConfig, dispatcher: ChangeDispatcher) -> Result<WatchSession> {
    prepare(&config)?;
    let (tx, rx) = mpsc::channel();
    let (backend, mode) = match start_native(&config, tx.clone()) {
        Ok(watcher) => (watcher, WatchMode::Native),
        Err(err) if config.poll_fallback => {
            warn!("native watch failed ({err}); falling back to polling");
            (start_poll(&config, tx.clone())?, WatchMode::Polling)
        }
        Err(err) => return Err(WatcherError::WatchStart(err)),
    };
    drop(tx);
    finish_start(config, dispatcher, backend, mode, rx)
}

/// Start a session that uses the polling strategy outright. Satisfies the
/// same contract as [`start`]; exists for environments where the native
/// mechanism is known to be unreliable.
pub fn start_polling(config: WatcherConfig, dispatcher: ChangeDispatcher) -> Result<WatchSession> {
    prepare(&config)?;
    let (tx, rx) = mpsc::channel();
    let backend = start_poll(&config, tx)?;
    finish_start(config, dispatcher, backend, WatchMode::Polling, rx)
}

fn prepare(config: &WatcherConfig) -> Result<()> {
    if !config.root_dir.is_dir() {
        return Err(WatcherError::PathNotFound(config.root_dir.clone()));
    }
    config.validate()
}

fn finish_start(
    config: WatcherConfig,
    dispatcher: ChangeDispatcher,
    backend: WatchBackend,
    mode: WatchMode,
    rx: mpsc::Receiver<FileEvent>,
) -> Result<WatchSession> {
    let handler = thread::Builder::new()
        .name("sentinel-watch".to_string())
        .spawn(move || {
            let mut dispatcher = dispatcher;
            for event in rx {
                dispatcher.handle_event(event);
            }
        })?;
    info!(
        "monitoring started on {} ({mode:?} watch)",
        config.root_dir.display()
    );
    Ok(WatchSession {
        root: config.root_dir,
        mode,
        backend: Some(backend),
        handler: Some(handler),
        running: true,
    })
}

fn event_forwarder(
    tx: mpsc::Sender<FileEvent>,
) -> impl FnMut(notify::Result<notify::Event>) + Send + 'static {
    move |result| match result {
        Ok(event) => {
            for file_event in FileEvent::from_notify(event) {
                // The receiver only disappears when the session stops.
                let _ = tx.send(file_event);
            }
        }
        Err(err) => warn!("watch backend error: {err}"),
    }
}

fn start_native(
    config: &WatcherConfig,
    tx: mpsc::Sender<FileEvent>,
) -> notify::Result<WatchBackend> {
    let mut watcher = RecommendedWatcher::new(event_forwarder(tx), NotifyConfig::default())?;
    watcher.watch(&config.root_dir, RecursiveMode::Recursive)?;
    Ok(Box::new(watcher))
}

fn start_poll(config: &WatcherConfig, tx: mpsc::Sender<FileEvent>) -> notify::Result<WatchBackend> {
    let mut watcher = PollWatcher::new(
        event_forwarder(tx),
        NotifyConfig::default().with_poll_interval(config.poll_interval()),
    )?;
    watcher.watch(&config.root_dir, RecursiveMode::Recursive)?;
    Ok(Box::new(watcher))
}
