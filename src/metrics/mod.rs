//! The live-metric core: snapshots, normalizers, combinators, the registry,
//! and the dependency-driven resolver.
//!
//! - [`snapshot`] - [`MetricSnapshot`] and pure live projection
//! - [`normalize`] - raw upstream records to snapshots
//! - [`combine`] - pure derived-metric combinators
//! - [`registry`] - validated definitions and topological order
//! - [`resolver`] - per-tile state and resolution passes
//! - [`catalog`] - the standard dashboard tile set

pub mod catalog;
pub mod combine;
pub mod normalize;
pub mod registry;
pub mod resolver;
pub mod snapshot;

pub use catalog::default_metrics;
pub use combine::Combinator;
pub use registry::{LeafSpec, MetricDefinition, MetricKind, MetricRegistry, NormalizerKind};
pub use resolver::{Resolver, SystemStatus, TileState};
pub use snapshot::{now_seconds, project, MetricSnapshot};
