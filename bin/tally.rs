use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use jemallocator::Jemalloc;
use log::{error, info, LevelFilter};
use simple_logger::SimpleLogger;
use tokio_util::sync::CancellationToken;

#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use tally::{
    default_metrics, FetchClient, HistoryStore, LogSink, MetricRegistry, Projector,
    RefreshScheduler, Resolver, Settings,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    SimpleLogger::new()
        .with_level(LevelFilter::Info)
        .init()
        .unwrap();

    // Load configuration (config.yaml is optional, every field defaults)
    let settings = Arc::new(Settings::new().context("Failed to load config.yaml")?);

    // Validate the metric DAG before any network activity
    let registry = Arc::new(
        MetricRegistry::new(default_metrics()).context("Invalid metric registration")?,
    );
    info!("Registered {} metrics", registry.len());

    // Optional historical seed data, served to chart consumers through the
    // resolver's outward API
    let history = match &settings.history_file {
        Some(path) => {
            let store = HistoryStore::load(path)
                .with_context(|| format!("Failed to load history file {path}"))?;
            info!("Loaded historical series for {} metrics", store.len());
            store
        },
        None => HistoryStore::empty(),
    };

    let fetch = Arc::new(FetchClient::new(
        settings.fetch.clone(),
        settings.endpoints.clone(),
    ));
    let resolver = Arc::new(
        Resolver::new(registry, fetch, Arc::new(LogSink)).with_history(Arc::new(history)),
    );

    let cancellation_token = CancellationToken::new();

    // Low-frequency refresh: full resolution passes on a fixed interval
    let scheduler = RefreshScheduler::new(resolver.clone(), settings.scheduler.clone());
    let scheduler_token = cancellation_token.child_token();
    let scheduler_handle = tokio::spawn(async move {
        if let Err(e) = scheduler.run(scheduler_token).await {
            error!("Refresh scheduler failed: {:#}", e);
        }
    });

    // High-frequency projector: re-interpolates stored snapshots every tick
    let projector = Projector::new(
        resolver.clone(),
        Duration::from_millis(settings.scheduler.projector_tick_ms),
    );
    let projector_token = cancellation_token.child_token();
    let projector_handle = tokio::spawn(async move {
        projector.run(projector_token).await;
    });

    info!("Dashboard engine running. Press Ctrl+C to stop.");

    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm_stream =
            signal(SignalKind::terminate()).context("Failed to install SIGTERM handler")?;
        let mut sighup_stream =
            signal(SignalKind::hangup()).context("Failed to install SIGHUP handler")?;

        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    info!("Received shutdown signal (Ctrl+C), exiting gracefully...");
                    break;
                },
                _ = sigterm_stream.recv() => {
                    info!("Received SIGTERM, exiting gracefully...");
                    break;
                },
                _ = sighup_stream.recv() => {
                    // Manual force-refresh: drop caches, re-resolve now
                    info!("Received SIGHUP, forcing refresh...");
                    resolver.force_refresh().await;
                },
            }
        }
    }

    #[cfg(not(unix))]
    {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Received shutdown signal (Ctrl+C), exiting gracefully...");
            },
        };
    }

    info!("Finishing all tasks...");
    cancellation_token.cancel();

    let _ = scheduler_handle.await;
    let _ = projector_handle.await;

    info!("All tasks stopped");
    Ok(())
}
