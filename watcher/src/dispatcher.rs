use crate::config::WatcherConfig;
use crate::debounce::DebounceRegistry;
use crate::event::FileEvent;
use crate::event::FileEventKind;
use sentinel_analysis::Analyzer;
use std::fs;
use std::path::Path;
use tracing::info;
use tracing::warn;

/// Hook through which accepted modify events reach the AI gateway. The
/// dispatcher never auto-invokes inference: `confirm` must return true
/// before any content is forwarded.
pub trait AiHook: Send {
    /// Ask the operator whether the changed file should be sent for
    /// suggestions.
    fn confirm(&self, path: &Path) -> bool;

    /// Forward the file content for inference. Implementations surface the
    /// response and the feedback instruction to the operator.
    fn suggest(&self, path: &Path, content: &str);
}

/// Receives raw file events, filters and debounces them, and invokes the
/// analysis collaborator. Runs on the watch handler thread; a failure on one
/// file is logged and must not stop monitoring.
pub struct ChangeDispatcher {
    extensions: Vec<String>,
    debounce: DebounceRegistry,
    analyzer: Box<dyn Analyzer + Send>,
    ai_hook: Option<Box<dyn AiHook>>,
}

impl ChangeDispatcher {
    pub fn new(config: &WatcherConfig, analyzer: Box<dyn Analyzer + Send>) -> Self {
        Self {
            extensions: config.extensions.clone(),
            debounce: DebounceRegistry::new(config.debounce_window()),
            analyzer,
            ai_hook: None,
        }
    }

    pub fn with_ai_hook(mut self, hook: Box<dyn AiHook>) -> Self {
        self.ai_hook = Some(hook);
        self
    }

    pub fn handle_event(&mut self, event: FileEvent) {
        if event.path.is_dir() {
            return;
        }
        if !self.is_watched_extension(&event.path) {
            return;
        }
        match event.kind {
            FileEventKind::Modified => {
                if !self.debounce.accept(&event.path, event.timestamp) {
                    return;
                }
                info!("file modified: {}", event.path.display());
                self.run_analysis(&event.path);
                self.maybe_suggest(&event.path);
            }
            FileEventKind::Created => {
                info!("new file created: {}", event.path.display());
                self.run_analysis(&event.path);
            }
            FileEventKind::Deleted => {
                info!("file deleted: {}", event.path.display());
            }
        }
    }

    fn is_watched_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| self.extensions.iter().any(|allowed| allowed == ext))
    }

    fn run_analysis(&self, path: &Path) {
        match self.analyzer.analyze_file(path) {
            Ok(output) => {
                if !output.report.is_empty() {
                    info!("analysis report for {}:\n{}", path.display(), output.report);
                }
            }
            Err(err) => warn!("failed to analyze {}: {err}", path.display()),
        }
    }

    fn maybe_suggest(&self, path: &Path) {
        let Some(hook) = &self.ai_hook else {
            return;
        };
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) => {
                warn!("could not read {} for suggestions: {err}", path.display());
                return;
            }
        };
        if !hook.confirm(path) {
            return;
        }
        hook.suggest(path, &content);
    }
}
