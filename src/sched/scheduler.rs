//! Low-frequency refresh scheduler.
//!
//! Drives full metric re-resolution on a fixed interval, independent of the
//! projector tick. Resolution hits the network only where the fetch cache
//! has expired; between passes, tiles keep interpolating from stored
//! snapshots.

use std::sync::Arc;

use anyhow::Result;
use log::{error, info};
use tokio_cron_scheduler::{Job, JobScheduler};
use tokio_util::sync::CancellationToken;

use crate::config::SchedulerSettings;
use crate::metrics::{Resolver, SystemStatus};

pub struct RefreshScheduler {
    resolver: Arc<Resolver>,
    settings: Arc<SchedulerSettings>,
}

impl RefreshScheduler {
    pub fn new(resolver: Arc<Resolver>, settings: SchedulerSettings) -> Self {
        Self {
            resolver,
            settings: Arc::new(settings),
        }
    }

    /// Runs one immediate resolution pass, then repeats on the configured
    /// interval until cancellation.
    pub async fn run(&self, cancellation_token: CancellationToken) -> Result<()> {
        // Populate tiles right away instead of waiting out a full interval.
        self.resolver.resolve_all().await;
        log_pass_status(&self.resolver).await;

        let mut scheduler = JobScheduler::new().await?;
        self.register_refresh_job(&scheduler).await?;

        scheduler.start().await?;
        info!(
            "Refresh scheduler started (every {}s)",
            self.settings.refresh_interval_secs
        );

        cancellation_token.cancelled().await;
        info!("Refresh scheduler shutting down...");

        scheduler.shutdown().await?;
        Ok(())
    }

    async fn register_refresh_job(&self, scheduler: &JobScheduler) -> Result<()> {
        let resolver = self.resolver.clone();
        let interval = self.settings.refresh_interval_secs;

        let job = Job::new_repeated_async(
            std::time::Duration::from_secs(interval),
            move |_uuid, _lock| {
                let resolver = resolver.clone();
                Box::pin(async move {
                    resolver.resolve_all().await;
                    log_pass_status(&resolver).await;
                })
            },
        )?;

        scheduler.add(job).await?;
        info!("Registered metric refresh job (every {interval}s)");
        Ok(())
    }
}

async fn log_pass_status(resolver: &Resolver) {
    match resolver.status().await {
        SystemStatus::Live => info!("Resolution pass complete: fully live"),
        SystemStatus::Degraded => {
            error!("Resolution pass complete: degraded (at least one leaf failing)")
        },
    }
}
