use std::sync::Arc;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use engram::config::Config;
use engram::store::{FactStore, InMemoryBackend};
use engram::Engine;

#[derive(Parser)]
#[command(name = "engramd")]
#[command(about = "Memory fact lifecycle and consistency engine daemon")]
struct Args {
    /// Run one forgetting sweep and exit
    #[arg(long)]
    sweep_once: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "engram=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();

    let store: Arc<dyn FactStore> = Arc::new(InMemoryBackend::new());

    tracing::info!(
        "Initializing embedding provider: {}...",
        config.embeddings.model
    );
    if let Some(llm_config) = &config.llm {
        tracing::info!("Initializing LLM provider: {}...", llm_config.model);
    }

    let engine = Engine::new(&config, store)?;
    if !engine.llm.is_available() {
        tracing::warn!("LLM unavailable - extraction will use regex rules only");
    }

    if args.sweep_once {
        let count = engine.sweeper.run_once().await?;
        tracing::info!(count, "Sweep finished");
        return Ok(());
    }

    let cancel_token = CancellationToken::new();
    let interval_secs = config.memory.forgetting_check_interval_secs;

    tracing::info!("Starting forgetting sweeper... (interval={}s)", interval_secs);
    let token = cancel_token.child_token();
    let sweeper = engine.sweeper;
    let sweep_handle = tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = token.cancelled() => {
                    tracing::info!("Forgetting sweeper shutting down...");
                    break;
                }
                _ = tokio::time::sleep(tokio::time::Duration::from_secs(interval_secs)) => {
                    if let Err(e) = sweeper.run_once().await {
                        tracing::error!("Forgetting sweep error: {}", e);
                    }
                }
            }
        }
    });

    shutdown_signal(cancel_token).await;
    sweep_handle.await?;

    Ok(())
}

async fn shutdown_signal(cancel_token: CancellationToken) {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, cancelling background tasks...");
    cancel_token.cancel();
}
