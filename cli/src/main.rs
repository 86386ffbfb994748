mod hook;
mod repl;

use anyhow::Context;
use anyhow::Result;
use clap::Parser;
use sentinel_analysis::AnalysisConfig;
use sentinel_analysis::ExternalParserAnalyzer;
use sentinel_gateway::AiGateway;
use sentinel_gateway::EngineConfig;
use sentinel_gateway::GatewayConfig;
use sentinel_gateway::OllamaEngine;
use sentinel_watcher::ChangeDispatcher;
use sentinel_watcher::WatchSession;
use sentinel_watcher::WatcherConfig;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Watches a source tree, runs static analysis on changed files, and offers
/// AI-assisted suggestions from a locally hosted model.
#[derive(Debug, Parser)]
#[command(name = "sentinel", version)]
struct Cli {
    /// Directory to monitor for source changes.
    #[arg(long, value_name = "PATH")]
    watch: Option<PathBuf>,

    /// Model served by the local inference server.
    #[arg(long, value_name = "NAME", default_value = "codellama:7b-instruct")]
    model: String,

    /// Force CPU-only inference.
    #[arg(long)]
    no_gpu: bool,

    /// Monitor and analyze only; never start the interactive assistant.
    #[arg(long)]
    watch_only: bool,

    /// External parser binary invoked for static analysis.
    #[arg(long, value_name = "BIN")]
    parser_bin: Option<PathBuf>,

    /// Poll interval in milliseconds for the fallback watch strategy.
    #[arg(long, value_name = "MS")]
    poll_interval_ms: Option<u64>,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            // Startup failures are fatal; per-event failures are logged by
            // the pipeline and never reach this point.
            eprintln!("sentinel: {err:#}");
            ExitCode::from(2)
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    if cli.watch_only && cli.watch.is_none() {
        anyhow::bail!("--watch-only requires --watch");
    }

    let engine = OllamaEngine::new(EngineConfig {
        model: cli.model.clone(),
        use_gpu: !cli.no_gpu,
        ..EngineConfig::default()
    })
    .context("failed to construct the inference client")?;
    let gateway = Arc::new(AiGateway::new(GatewayConfig::default(), Arc::new(engine)));

    let mut session: Option<WatchSession> = None;
    if let Some(root) = cli.watch.clone() {
        let started = start_watch(&cli, root, gateway.clone())
            .context("failed to start watching")?;
        session = Some(started);
    }

    if cli.watch_only {
        // No interactive loop: run until interrupted, like a daemon.
        tokio::signal::ctrl_c()
            .await
            .context("failed to listen for shutdown signal")?;
    } else {
        repl::run(gateway).await?;
    }

    if let Some(session) = session.as_mut() {
        session.stop();
    }
    Ok(())
}

fn start_watch(
    cli: &Cli,
    root: PathBuf,
    gateway: Arc<AiGateway>,
) -> sentinel_watcher::Result<WatchSession> {
    let mut config = WatcherConfig {
        root_dir: root,
        ..WatcherConfig::default()
    };
    if let Some(poll_interval_ms) = cli.poll_interval_ms {
        config.poll_interval_ms = poll_interval_ms;
    }

    let mut analysis_config = AnalysisConfig::default();
    if let Some(parser_bin) = cli.parser_bin.clone() {
        analysis_config.parser_bin = parser_bin;
    }
    let analyzer = ExternalParserAnalyzer::new(analysis_config);

    let mut dispatcher = ChangeDispatcher::new(&config, Box::new(analyzer));
    if !cli.watch_only {
        dispatcher = dispatcher.with_ai_hook(Box::new(hook::TerminalAiHook::new(
            gateway,
            tokio::runtime::Handle::current(),
        )));
    }
    sentinel_watcher::start(config, dispatcher)
}
