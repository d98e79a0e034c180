//! Dependency-driven metric resolution.
//!
//! The resolver owns one [`TileState`] per registered metric and walks the
//! registry's topological order on every pass: leaves fetch and normalize
//! (concurrently - they share only the fetch cache), derived metrics then
//! combine the freshly stored snapshots synchronously. Failures are
//! contained per metric: a failing leaf keeps its previous snapshot on
//! display and only blocks its own dependents for the pass.

use std::sync::Arc;

use futures::future::join_all;
use log::{debug, info};
use rustc_hash::FxHashMap;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::error::MetricError;
use crate::fetch::{EndpointKey, FetchClient};
use crate::history::{HistoryPoint, HistoryStore};
use crate::metrics::combine::Combinator;
use crate::metrics::normalize::{normalize_annual, normalize_discrete};
use crate::metrics::registry::{LeafSpec, MetricKind, MetricRegistry, NormalizerKind};
use crate::metrics::snapshot::{project, MetricSnapshot};
use crate::sink::RenderSink;

/// Mutable per-metric state, created at registration and updated in place on
/// every resolution cycle.
#[derive(Debug, Default)]
pub struct TileState {
    /// `None` until the first successful resolution. Replaced as a whole on
    /// success; preserved untouched on failure.
    pub snapshot: Option<MetricSnapshot>,
    /// Last string pushed to the render sink, used to suppress redundant
    /// updates.
    pub last_rendered_text: String,
    pub last_error: Option<String>,
    /// In-flight guard: a resolution already running for this metric is not
    /// duplicated by a concurrent pass.
    loading: bool,
}

/// Aggregate whole-system status, distinct from per-tile errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemStatus {
    /// Every leaf's latest resolution attempt succeeded.
    Live,
    /// At least one leaf's latest resolution attempt failed; stale snapshots
    /// may still be projecting.
    Degraded,
}

pub struct Resolver {
    registry: Arc<MetricRegistry>,
    fetch: Arc<FetchClient>,
    sink: Arc<dyn RenderSink>,
    tiles: RwLock<FxHashMap<String, TileState>>,
    /// Immutable seed series for chart consumers, empty unless loaded.
    history: Arc<HistoryStore>,
}

impl Resolver {
    pub fn new(
        registry: Arc<MetricRegistry>,
        fetch: Arc<FetchClient>,
        sink: Arc<dyn RenderSink>,
    ) -> Self {
        let tiles = registry
            .names()
            .map(|name| (name.to_string(), TileState::default()))
            .collect();

        Self {
            registry,
            fetch,
            sink,
            tiles: RwLock::new(tiles),
            history: Arc::new(HistoryStore::empty()),
        }
    }

    /// Attach pre-flattened historical series for chart consumers.
    pub fn with_history(mut self, history: Arc<HistoryStore>) -> Self {
        self.history = history;
        self
    }

    pub fn registry(&self) -> &MetricRegistry {
        &self.registry
    }

    /// Historical series for a metric, if seed data was loaded for it.
    pub fn history_series(&self, name: &str) -> Option<&[HistoryPoint]> {
        self.history.series(name)
    }

    /// One full resolution pass in dependency order.
    ///
    /// Safe to invoke concurrently with itself: a metric already loading is
    /// skipped, not queued. Never returns an error - leaf failures land in
    /// the corresponding [`TileState`].
    pub async fn resolve_all(&self) {
        // Leaf phase: claim every leaf not already in flight, then fetch
        // concurrently.
        let mut claimed = Vec::new();
        {
            let mut tiles = self.tiles.write().await;
            for def in self.registry.ordered().filter(|d| d.is_leaf()) {
                let Some(tile) = tiles.get_mut(&def.name) else {
                    continue;
                };
                if tile.loading {
                    debug!("`{}` already resolving, skipping", def.name);
                    continue;
                }
                tile.loading = true;
                if tile.snapshot.is_none() {
                    self.sink.set_loading(&def.name);
                }
                claimed.push(def);
            }
        }

        join_all(claimed.iter().map(|def| self.resolve_leaf(def.name.as_str(), &def.kind))).await;

        // Derived phase: every dependency has completed its attempt for this
        // pass (topological order covers derived-on-derived chains).
        for def in self.registry.ordered() {
            if let MetricKind::Derived {
                dependencies,
                combinator,
            } = &def.kind
            {
                self.resolve_derived(&def.name, dependencies, *combinator).await;
            }
        }
    }

    async fn resolve_leaf(&self, name: &str, kind: &MetricKind) {
        let MetricKind::Leaf(spec) = kind else {
            return;
        };

        let result = self.fetch_and_normalize(spec).await;

        let mut tiles = self.tiles.write().await;
        let Some(tile) = tiles.get_mut(name) else {
            return;
        };
        tile.loading = false;
        match result {
            Ok(snapshot) => {
                debug!("resolved `{name}`: {} @ {}", snapshot.base_value, snapshot.base_timestamp);
                tile.snapshot = Some(snapshot);
                tile.last_error = None;
            },
            Err(e) => {
                // Stale-but-valid beats blanking the display: the previous
                // snapshot keeps projecting while refreshes fail.
                let message = e.to_string();
                if tile.snapshot.is_none() {
                    self.sink.set_error(name, &message);
                }
                tile.last_error = Some(message);
            },
        }
    }

    async fn fetch_and_normalize(&self, spec: &LeafSpec) -> Result<MetricSnapshot, MetricError> {
        let body = self
            .fetch
            .fetch(spec.endpoint, &spec.path, &spec.params)
            .await?;
        let records = records_array(spec.endpoint, &body)?;

        match spec.normalizer {
            NormalizerKind::Discrete => {
                normalize_discrete(records, &spec.date_aliases, &spec.value_aliases, &spec.source)
            },
            NormalizerKind::AnnualGrowth => {
                normalize_annual(records, &spec.date_aliases, &spec.value_aliases, &spec.source)
            },
        }
    }

    async fn resolve_derived(&self, name: &str, dependencies: &[String], combinator: Combinator) {
        let mut tiles = self.tiles.write().await;

        // A derived tile with no data yet is loading, not errored, even while
        // its dependencies fail independently.
        if tiles.get(name).is_some_and(|t| t.snapshot.is_none()) {
            self.sink.set_loading(name);
        }

        let mut resolved = Vec::with_capacity(dependencies.len());
        for dep in dependencies {
            match tiles.get(dep).and_then(|t| t.snapshot.clone()) {
                Some(snapshot) => resolved.push(snapshot),
                None => {
                    // Upstream never resolved: leave prior state untouched
                    // rather than fabricating a zero snapshot.
                    debug!("skipping derived `{name}`: dependency `{dep}` unresolved");
                    return;
                },
            }
        }

        let refs: Vec<&MetricSnapshot> = resolved.iter().collect();
        let label = format!("derived from {}", dependencies.join(" and "));
        let snapshot = combinator.apply(&refs, label);

        if let Some(tile) = tiles.get_mut(name) {
            tile.snapshot = Some(snapshot);
            tile.last_error = None;
        }
    }

    /// One projector tick: re-render every tile at `now_seconds`, pushing to
    /// the sink only when the formatted text changed.
    pub async fn project_tick(&self, now_seconds: f64) {
        let mut tiles = self.tiles.write().await;
        for def in self.registry.ordered() {
            let Some(tile) = tiles.get_mut(&def.name) else {
                continue;
            };
            let Some(live) = project(tile.snapshot.as_ref(), now_seconds) else {
                // Unresolved tiles keep their loading/error affordance.
                continue;
            };
            let rendered = def.render.render(Some(live));
            if rendered != tile.last_rendered_text {
                let label = tile
                    .snapshot
                    .as_ref()
                    .map(|s| s.label.as_str())
                    .unwrap_or_default();
                self.sink.set_value(&def.name, &rendered, label);
                tile.last_rendered_text = rendered;
            }
        }
    }

    /// Clear fetch caches and the degraded flag, then re-resolve
    /// immediately. Stored snapshots stay visible throughout.
    pub async fn force_refresh(&self) {
        info!("force refresh: invalidating fetch caches");
        self.fetch.invalidate_all();
        self.fetch.clear_degraded();
        self.resolve_all().await;
    }

    pub async fn get_snapshot(&self, name: &str) -> Option<MetricSnapshot> {
        self.tiles.read().await.get(name)?.snapshot.clone()
    }

    pub async fn get_live_value(&self, name: &str, now_seconds: f64) -> Option<f64> {
        let tiles = self.tiles.read().await;
        project(tiles.get(name)?.snapshot.as_ref(), now_seconds)
    }

    pub async fn last_error(&self, name: &str) -> Option<String> {
        self.tiles.read().await.get(name)?.last_error.clone()
    }

    /// Whole-system status: degraded when the fetch client tripped its flag
    /// or any leaf's latest attempt failed.
    pub async fn status(&self) -> SystemStatus {
        if self.fetch.is_degraded() {
            return SystemStatus::Degraded;
        }
        let tiles = self.tiles.read().await;
        let any_leaf_failing = self
            .registry
            .ordered()
            .filter(|d| d.is_leaf())
            .any(|d| tiles.get(&d.name).is_some_and(|t| t.last_error.is_some()));
        if any_leaf_failing {
            SystemStatus::Degraded
        } else {
            SystemStatus::Live
        }
    }
}

/// Locate the records array inside an endpoint family's response envelope.
///
/// Treasury wraps records in `{"data": [...]}`; the World Bank returns
/// `[meta, [...records]]`.
fn records_array(endpoint: EndpointKey, body: &Value) -> Result<&[Value], MetricError> {
    let records = match endpoint {
        EndpointKey::Treasury => body.get("data").and_then(Value::as_array),
        EndpointKey::WorldBank => body.get(1).and_then(Value::as_array),
    };
    records
        .map(Vec::as_slice)
        .ok_or_else(|| MetricError::Api("response missing records array".to_string()))
}
