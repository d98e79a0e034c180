//! HTTP fetch client with a time-based response cache and retry/backoff.
//!
//! One client is shared by every leaf metric. Policy:
//! - Cache keyed by canonicalized URL (sorted params), TTL = staleness window
//! - Per-attempt timeout, counted as a network error
//! - Exponential backoff between retries, doubling from a base with a cap
//! - Retries append a cache-busting nonce so intermediate caches are bypassed
//! - Terminal failure raises the shared degraded flag; any success clears it
//!
//! The client never substitutes synthetic data - the caller owns fallback
//! policy.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use log::{debug, warn};
use moka::future::Cache;
use serde_json::Value;
use url::Url;

use crate::config::{EndpointSettings, FetchSettings};
use crate::error::MetricError;

/// Named upstream endpoint family. Base URLs come from [`EndpointSettings`],
/// so the whole family can be redirected at a proxy or a test server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointKey {
    /// Treasury Fiscal Data API (debt, MTS receipts/outlays).
    Treasury,
    /// World Bank API (population, GDP).
    WorldBank,
}

impl EndpointKey {
    fn base<'a>(&self, endpoints: &'a EndpointSettings) -> &'a str {
        match self {
            EndpointKey::Treasury => &endpoints.treasury_base,
            EndpointKey::WorldBank => &endpoints.worldbank_base,
        }
    }
}

pub struct FetchClient {
    http: reqwest::Client,
    cache: Cache<String, Arc<Value>>,
    settings: FetchSettings,
    endpoints: EndpointSettings,
    degraded: Arc<AtomicBool>,
}

impl FetchClient {
    pub fn new(settings: FetchSettings, endpoints: EndpointSettings) -> Self {
        let cache = Cache::builder()
            .max_capacity(64)
            .time_to_live(Duration::from_secs(settings.cache_timeout_secs.max(1)))
            .build();

        Self {
            http: reqwest::Client::new(),
            cache,
            settings,
            endpoints,
            degraded: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Shared degraded flag, observable by the scheduler. Set when any fetch
    /// exhausts its retries, cleared on the next success.
    pub fn degraded_flag(&self) -> Arc<AtomicBool> {
        self.degraded.clone()
    }

    pub fn is_degraded(&self) -> bool {
        self.degraded.load(Ordering::Relaxed)
    }

    pub fn clear_degraded(&self) {
        self.degraded.store(false, Ordering::Relaxed);
    }

    /// Drop every cached response. Used by force-refresh; stored metric
    /// snapshots are untouched.
    pub fn invalidate_all(&self) {
        self.cache.invalidate_all();
    }

    /// Fetch a JSON body, serving from cache within the staleness window.
    pub async fn fetch(
        &self,
        endpoint: EndpointKey,
        path: &str,
        params: &[(String, String)],
    ) -> Result<Arc<Value>, MetricError> {
        let key = self.cache_key(endpoint, path, params);

        if let Some(body) = self.cache.get(&key).await {
            debug!("cache hit for {key}");
            return Ok(body);
        }

        let attempts = self.settings.retries + 1;
        let mut delay = Duration::from_millis(self.settings.backoff_initial_ms);
        let backoff_cap = Duration::from_millis(self.settings.backoff_max_ms);

        for attempt in 0..attempts {
            // Retries bust browser/proxy caches with a nonce; the first
            // attempt keeps the canonical URL.
            let nonce = (attempt > 0).then(nanos_nonce);
            let url = self.build_url(endpoint, path, params, nonce)?;

            match self.attempt(url).await {
                Ok(body) => {
                    let body = Arc::new(body);
                    self.cache.insert(key, body.clone()).await;
                    self.degraded.store(false, Ordering::Relaxed);
                    return Ok(body);
                },
                Err(e) if e.is_retryable() && attempt + 1 < attempts => {
                    warn!(
                        "fetch attempt {}/{attempts} for {key} failed ({e}), retrying in {:?}",
                        attempt + 1,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    delay = (delay * 2).min(backoff_cap);
                },
                Err(e) => {
                    warn!("fetch for {key} failed terminally: {e}");
                    self.degraded.store(true, Ordering::Relaxed);
                    return Err(e);
                },
            }
        }

        unreachable!("retry loop always returns")
    }

    async fn attempt(&self, url: Url) -> Result<Value, MetricError> {
        let timeout = Duration::from_millis(self.settings.attempt_timeout_ms);

        let response = tokio::time::timeout(timeout, self.http.get(url).send())
            .await
            .map_err(|_| MetricError::Network(format!("timeout after {timeout:?}")))?
            .map_err(|e| MetricError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(MetricError::Api(format!("unexpected status {status}")));
        }

        tokio::time::timeout(timeout, response.json::<Value>())
            .await
            .map_err(|_| MetricError::Network(format!("body timeout after {timeout:?}")))?
            .map_err(|e| MetricError::Api(format!("malformed JSON body: {e}")))
    }

    /// Canonical cache key: endpoint base + path + params sorted by name, so
    /// parameter order in the definition does not fragment the cache.
    fn cache_key(&self, endpoint: EndpointKey, path: &str, params: &[(String, String)]) -> String {
        let mut sorted: Vec<&(String, String)> = params.iter().collect();
        sorted.sort();
        let query: Vec<String> = sorted.iter().map(|(k, v)| format!("{k}={v}")).collect();
        format!(
            "{}{}?{}",
            endpoint.base(&self.endpoints),
            path,
            query.join("&")
        )
    }

    fn build_url(
        &self,
        endpoint: EndpointKey,
        path: &str,
        params: &[(String, String)],
        nonce: Option<u128>,
    ) -> Result<Url, MetricError> {
        let base = endpoint.base(&self.endpoints);
        let mut url = Url::parse(&format!("{base}{path}"))
            .map_err(|e| MetricError::Configuration(format!("bad endpoint url {base}{path}: {e}")))?;

        {
            let mut pairs = url.query_pairs_mut();
            for (k, v) in params {
                pairs.append_pair(k, v);
            }
            if let Some(nonce) = nonce {
                pairs.append_pair("_nonce", &nonce.to_string());
            }
        }

        Ok(url)
    }
}

fn nanos_nonce() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0)
}
