use anyhow::{Context, Result};
use tokio::sync::watch;

use repoint::config::Config;
use repoint::scheduler::{CronSchedule, ReconcileTrigger};
use repoint::server::{self, AppState};

use super::build_reconciler;

/// Serve metrics and run the reconciliation trigger until Ctrl-C
pub async fn run(config: Config) -> Result<()> {
    let reconciler = build_reconciler(&config)?;
    let schedule = CronSchedule::parse(&config.schedule.expression)
        .context("Invalid schedule expression")?;

    println!("Starting repoint");
    println!("================");
    println!("  Schedule: {schedule}");
    println!("  Run on startup: {}", config.schedule.run_on_startup);
    println!("  Metrics: http://{}/metrics", config.server.bind_address);
    println!("  Locations: {}", config.locations.len());
    println!();

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let trigger = ReconcileTrigger::new(schedule, reconciler.clone())
        .run_on_startup(config.schedule.run_on_startup);
    let trigger_handle = tokio::spawn(async move { trigger.start(shutdown_rx).await });

    let state = AppState::new(reconciler.metrics(), reconciler.status_handle());
    let mut server_shutdown = shutdown_tx.subscribe();
    let mut server_handle = tokio::spawn(server::serve(
        config.server.bind_address,
        state,
        async move {
            let _ = server_shutdown.changed().await;
        },
    ));

    // Wait for shutdown signal, or for the server to stop on its own
    let finished = tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            match signal {
                Ok(()) => tracing::info!("Received Ctrl-C, shutting down"),
                Err(e) => tracing::error!(error = %e, "Failed to listen for Ctrl-C, shutting down"),
            }
            None
        }
        result = &mut server_handle => Some(result),
    };
    let _ = shutdown_tx.send(true);

    let server_result = match finished {
        Some(result) => result,
        None => server_handle.await,
    };

    trigger_handle.await.context("Trigger task panicked")??;
    server_result.context("Server task panicked")??;

    println!("repoint stopped");
    Ok(())
}
