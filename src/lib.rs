//! buildhistory -- Jenkins build status history for status-board widgets.
//!
//! Every cycle polls the Jenkins job list, appends the latest color of each
//! tracked job to a bounded CSV history, and republishes the whole history
//! as a widget payload.

pub mod api;
pub mod config;
pub mod cycle;
pub mod history;
pub mod jenkins;
pub mod logging;
pub mod publish;
pub mod report;
pub mod scheduler;
pub mod trim;

use anyhow::{Context, Result};
use tokio::sync::watch;

use crate::config::BuildHistoryConfig;
use crate::scheduler::{BuildHistoryJob, Ticker, Trigger};

/// Start the daemon: scheduler loop plus the read-only API, until Ctrl-C.
pub async fn serve(config: BuildHistoryConfig) -> Result<()> {
    // 1. Build the job (validates configuration)
    let trigger = Trigger::from_config(&config.schedule)?;
    let listen_address = config.api.listen_address.clone();
    let job = BuildHistoryJob::from_config(config)?;

    // 2. Shutdown signal shared by the scheduler and the API server
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            return;
        }
        tracing::info!("Shutdown requested");
        let _ = shutdown_tx.send(true);
    });

    // 3. Start Scheduler Engine (background task)
    let state = api::state::AppState::from_job(&job);
    let ticker = Ticker::new(trigger);
    let scheduler_task = tokio::spawn(scheduler::run_scheduler_loop(
        job,
        ticker,
        wait_for_shutdown(shutdown_rx.clone()),
    ));

    // 4. Start API Server
    let addr: std::net::SocketAddr = listen_address
        .parse()
        .with_context(|| format!("invalid api listen address '{}'", listen_address))?;
    let app = api::router(state);

    tracing::info!(%addr, "buildhistory listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(wait_for_shutdown(shutdown_rx))
        .await?;

    let cycles = scheduler_task.await?;
    tracing::info!(cycles, "buildhistory stopped");
    Ok(())
}

async fn wait_for_shutdown(mut rx: watch::Receiver<bool>) {
    // A closed channel means the sender is gone; treat it as shutdown too.
    let _ = rx.wait_for(|stop| *stop).await;
}
