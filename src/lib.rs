pub mod config;
pub mod error;
pub mod fetch;
pub mod history;
pub mod metrics;
pub mod projector;
pub mod render;
pub mod sched;
pub mod sink;

pub use config::Settings;
pub use error::MetricError;
pub use fetch::{EndpointKey, FetchClient};
pub use history::{HistoryPoint, HistoryStore};
pub use metrics::{
    default_metrics, Combinator, MetricDefinition, MetricKind, MetricRegistry, MetricSnapshot,
    Resolver, SystemStatus,
};
pub use projector::Projector;
pub use render::RenderFormat;
pub use sched::RefreshScheduler;
pub use sink::{LogSink, MemorySink, RenderSink, SinkEvent};
