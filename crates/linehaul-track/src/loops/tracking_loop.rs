//! Periodic tracking loop.
//!
//! Runs a fleet-wide tracking pass on an interval until shutdown. The
//! orchestrator never fails a pass outright, so the loop only logs
//! outcomes.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time::interval;

use crate::tracker::TrackingOrchestrator;

/// Start the tracking loop.
pub async fn run_tracking_loop(
    orchestrator: Arc<TrackingOrchestrator>,
    poll_interval: Duration,
    mut shutdown: broadcast::Receiver<()>,
) {
    let mut ticker = interval(poll_interval);

    loop {
        tokio::select! {
            _ = shutdown.recv() => {
                tracing::info!("Tracking loop shutting down");
                break;
            }
            _ = ticker.tick() => {
                let outcome = orchestrator.process_all_companies().await;
                if outcome.errors.is_empty() {
                    tracing::info!(
                        "Tracking pass: {} companies, {} loads, {} updated",
                        outcome.companies,
                        outcome.total_processed,
                        outcome.total_updated
                    );
                } else {
                    tracing::warn!(
                        "Tracking pass: {} companies, {} loads, {} updated, {} error(s): {}",
                        outcome.companies,
                        outcome.total_processed,
                        outcome.total_updated,
                        outcome.errors.len(),
                        outcome.errors.join("; ")
                    );
                }
            }
        }
    }
}
