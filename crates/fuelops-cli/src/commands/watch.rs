//! Watch command - follow the task board live

use anyhow::Result;
use clap::Args;
use fuelops_core::ports::IRealtimeFeed;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::{
    commands::tasks::print_board,
    context::{AppContext, GlobalArgs},
};

#[derive(Debug, Args)]
pub struct WatchCommand {
    /// Exit after the first board update (for scripting)
    #[arg(long)]
    once: bool,
}

impl WatchCommand {
    pub async fn execute(&self, globals: &GlobalArgs) -> Result<()> {
        let ctx = AppContext::open(globals).await?;
        let fmt = globals.formatter();
        let driver = ctx.require_profile().await?;

        let shutdown = CancellationToken::new();
        let events = match ctx.realtime().subscribe(&driver, shutdown.clone()).await {
            Ok(events) => events,
            Err(e) => {
                warn!(error = %e, "Realtime subscription failed, using periodic refresh");
                fmt.warn("Live updates unavailable, refreshing periodically");
                mpsc::channel(1).1
            }
        };

        let (engine, mut board) = ctx.engine(driver.clone(), shutdown.clone());
        let engine_task = tokio::spawn(engine.run(events));
        info!(driver = driver.name(), "Watching task board");
        fmt.info(&format!("Watching tasks for {} (Ctrl+C to stop)", driver.name()));

        let signal = shutdown_signal();
        tokio::pin!(signal);
        loop {
            tokio::select! {
                _ = &mut signal => {
                    info!("Shutdown signal received");
                    break;
                }
                changed = board.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let tasks = board.borrow_and_update().clone();
                    print_board(&tasks, globals, &*fmt);
                    if self.once {
                        break;
                    }
                }
            }
        }

        shutdown.cancel();
        if let Err(e) = engine_task.await {
            warn!(error = %e, "Sync engine task failed");
        }
        Ok(())
    }
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = term.recv() => {}
                }
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
