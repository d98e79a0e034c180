use config::{Config, ConfigError, File};
use serde::Deserialize;

/// Fetch client configuration.
///
/// Controls the shared response cache and the retry/backoff policy applied
/// to every upstream request:
/// - Cache: time-based, keyed by canonicalized request URL
/// - Retry: exponential backoff with a cap, cache-busting nonce on retries
#[derive(Debug, Deserialize, Clone)]
pub struct FetchSettings {
    /// Staleness window for cached responses, in seconds.
    #[serde(default = "default_cache_timeout_secs")]
    pub cache_timeout_secs: u64,
    /// Per-attempt timeout, in milliseconds. A timed-out attempt counts as a
    /// network error and is retried.
    #[serde(default = "default_attempt_timeout_ms")]
    pub attempt_timeout_ms: u64,
    /// Number of retries after the first failed attempt.
    #[serde(default = "default_retries")]
    pub retries: u32,
    /// Initial backoff delay, doubled on each retry.
    #[serde(default = "default_backoff_initial_ms")]
    pub backoff_initial_ms: u64,
    /// Backoff delay cap.
    #[serde(default = "default_backoff_max_ms")]
    pub backoff_max_ms: u64,
}

fn default_cache_timeout_secs() -> u64 {
    120 // 2 minutes
}

fn default_attempt_timeout_ms() -> u64 {
    10_000
}

fn default_retries() -> u32 {
    2
}

fn default_backoff_initial_ms() -> u64 {
    250
}

fn default_backoff_max_ms() -> u64 {
    4_000
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            cache_timeout_secs: default_cache_timeout_secs(),
            attempt_timeout_ms: default_attempt_timeout_ms(),
            retries: default_retries(),
            backoff_initial_ms: default_backoff_initial_ms(),
            backoff_max_ms: default_backoff_max_ms(),
        }
    }
}

/// Scheduler configuration.
///
/// The refresh interval drives full metric re-resolution (network fetches);
/// the projector tick only re-interpolates already-stored snapshots.
#[derive(Debug, Deserialize, Clone)]
pub struct SchedulerSettings {
    /// Interval between full resolution passes, in seconds.
    #[serde(default = "default_refresh_interval_secs")]
    pub refresh_interval_secs: u64,
    /// Projector tick period, in milliseconds. Correctness does not depend on
    /// the cadence; this only bounds display smoothness.
    #[serde(default = "default_projector_tick_ms")]
    pub projector_tick_ms: u64,
}

fn default_refresh_interval_secs() -> u64 {
    300 // 5 minutes
}

fn default_projector_tick_ms() -> u64 {
    250
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            refresh_interval_secs: default_refresh_interval_secs(),
            projector_tick_ms: default_projector_tick_ms(),
        }
    }
}

/// Upstream endpoint base URLs.
///
/// Overridable so the fetch layer can be pointed at a same-origin CORS proxy
/// or a test server instead of the public APIs.
#[derive(Debug, Deserialize, Clone)]
pub struct EndpointSettings {
    /// Treasury Fiscal Data API base (debt, receipts, outlays).
    #[serde(default = "default_treasury_base")]
    pub treasury_base: String,
    /// World Bank API base (population, GDP).
    #[serde(default = "default_worldbank_base")]
    pub worldbank_base: String,
}

fn default_treasury_base() -> String {
    "https://api.fiscaldata.treasury.gov/services/api/fiscal_service".to_string()
}

fn default_worldbank_base() -> String {
    "https://api.worldbank.org/v2".to_string()
}

impl Default for EndpointSettings {
    fn default() -> Self {
        Self {
            treasury_base: default_treasury_base(),
            worldbank_base: default_worldbank_base(),
        }
    }
}

/// Root application configuration.
///
/// Loaded from `config.yaml` at startup when present; every field has a
/// working default so the file is optional.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Settings {
    #[serde(default)]
    pub fetch: FetchSettings,
    #[serde(default)]
    pub scheduler: SchedulerSettings,
    #[serde(default)]
    pub endpoints: EndpointSettings,
    /// Optional path to a pre-flattened historical series JSON file.
    #[serde(default)]
    pub history_file: Option<String>,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .add_source(File::with_name("config").required(false))
            .build()?;

        let settings: Settings = s.try_deserialize()?;

        Ok(settings)
    }
}
