//! High-frequency projector task.
//!
//! Ticks on a fixed period and asks the resolver to re-interpolate every
//! stored snapshot at the current wall clock. Independent of the refresh
//! scheduler: the two tasks communicate only through the stored snapshots,
//! and projection correctness does not depend on the tick cadence.

use std::sync::Arc;
use std::time::Duration;

use log::info;
use tokio_util::sync::CancellationToken;

use crate::metrics::snapshot::now_seconds;
use crate::metrics::Resolver;

pub struct Projector {
    resolver: Arc<Resolver>,
    tick: Duration,
}

impl Projector {
    pub fn new(resolver: Arc<Resolver>, tick: Duration) -> Self {
        Self { resolver, tick }
    }

    /// Runs until cancellation.
    pub async fn run(&self, cancellation_token: CancellationToken) {
        let mut interval = tokio::time::interval(self.tick);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = cancellation_token.cancelled() => {
                    info!("Projector shutting down...");
                    return;
                },
                _ = interval.tick() => {
                    self.resolver.project_tick(now_seconds()).await;
                },
            }
        }
    }
}
