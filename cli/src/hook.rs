use owo_colors::OwoColorize;
use sentinel_gateway::AiGateway;
use sentinel_gateway::CodeSubmission;
use sentinel_watcher::AiHook;
use std::io::BufRead;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tokio::runtime::Handle;
use tracing::warn;

/// Bridges the synchronous watch handler thread to the async gateway.
/// Inference only happens after the operator answers yes; declining leaves
/// the pipeline untouched.
pub struct TerminalAiHook {
    gateway: Arc<AiGateway>,
    runtime: Handle,
}

impl TerminalAiHook {
    pub fn new(gateway: Arc<AiGateway>, runtime: Handle) -> Self {
        Self { gateway, runtime }
    }
}

impl AiHook for TerminalAiHook {
    fn confirm(&self, path: &Path) -> bool {
        print!(
            "{} ",
            format!("Request AI suggestions for {}? [y/N]", path.display()).bold()
        );
        let _ = std::io::stdout().flush();

        let mut answer = String::new();
        if std::io::stdin().lock().read_line(&mut answer).is_err() {
            return false;
        }
        matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
    }

    fn suggest(&self, path: &Path, content: &str) {
        let filename = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("changed-file")
            .to_string();
        let prompt =
            format!("Review the latest changes to the code in {filename} and suggest improvements.");
        let submission = CodeSubmission {
            filename,
            code: content.to_string(),
        };

        match self.runtime.block_on(self.gateway.ask(&prompt, Some(submission))) {
            Ok(reply) => {
                println!("\n{}\n{}", "AI suggestion:".bold(), reply.text);
                if reply.suggestion_id.is_some() {
                    println!(
                        "{}",
                        "Rate this suggestion with: feedback <yes|no> [comments]".dimmed()
                    );
                }
            }
            Err(err) => warn!("suggestion request failed: {err}"),
        }
    }
}
