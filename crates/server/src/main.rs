use std::{net::SocketAddr, sync::Arc};

use pipeline::MutationPipeline;
use storage::SharedStore;
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod api;
mod app_state;
mod config;

use app_state::AppState;
use config::load_settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = load_settings()?;
    let store = SharedStore::seeded(settings.initial_size);
    let pipeline = Arc::new(MutationPipeline::new(store, settings.schedule()));
    info!(
        initial_size = settings.initial_size,
        add_flush_ms = settings.add_flush_ms,
        interactive_flush_ms = settings.interactive_flush_ms,
        "store seeded"
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let flushers = pipeline.spawn(shutdown_rx);

    let state = AppState {
        pipeline: Arc::clone(&pipeline),
        max_body_bytes: settings.max_body_bytes,
    };
    let app = api::build_router(Arc::new(state));

    let addr: SocketAddr = settings.server_bind.parse()?;
    info!(%addr, "server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    let _ = shutdown_tx.send(true);
    for flusher in flushers {
        if let Err(error) = flusher.await {
            warn!(%error, "flush loop ended abnormally");
        }
    }
    let drained: usize = pipeline
        .drain_all()
        .await
        .iter()
        .map(|report| report.applied + report.rejected)
        .sum();
    info!(drained, "pending operations flushed, exiting");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        warn!(%error, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
