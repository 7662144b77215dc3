//! Periodic eviction of unredeemed commitments.

use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::handlers::ServiceState;

/// Sweeps commitments older than `ttl` every `interval` until `shutdown` is
/// cancelled.
pub async fn run(service: ServiceState, ttl: Duration, interval: Duration, shutdown: CancellationToken) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately.
    ticker.tick().await;

    loop {
        tokio::select! {
            () = shutdown.cancelled() => break,
            _ = ticker.tick() => {
                let evicted = service.sweep(ttl).await;
                if evicted > 0 {
                    tracing::debug!(evicted, "Swept expired commitments");
                }
            }
        }
    }

    tracing::debug!("Commitment sweeper stopped");
}
