//! Error taxonomy for metric resolution.
//!
//! Four failure classes with distinct handling policies:
//! - [`MetricError::Network`] / [`MetricError::Api`] - retried by the fetch client
//! - [`MetricError::InsufficientData`] - not retried (retrying will not produce more history)
//! - [`MetricError::Configuration`] - fatal at registration time

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MetricError {
    /// Transport-level failure reaching an upstream endpoint (connection refused,
    /// DNS, per-attempt timeout).
    #[error("network error: {0}")]
    Network(String),

    /// Endpoint reachable but returned a non-success status or an unparseable body.
    #[error("api error: {0}")]
    Api(String),

    /// Endpoint returned a well-formed but empty/too-short dataset.
    #[error("insufficient data: {0}")]
    InsufficientData(String),

    /// Invalid metric registration: dependency cycle, unknown dependency name,
    /// or wrong combinator arity. Raised before any network activity.
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl MetricError {
    /// Whether the fetch client should retry after this error.
    pub fn is_retryable(&self) -> bool {
        matches!(self, MetricError::Network(_) | MetricError::Api(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_and_api_errors_are_retryable() {
        assert!(MetricError::Network("timeout".into()).is_retryable());
        assert!(MetricError::Api("status 502".into()).is_retryable());
    }

    #[test]
    fn data_and_config_errors_are_not_retryable() {
        assert!(!MetricError::InsufficientData("empty dataset".into()).is_retryable());
        assert!(!MetricError::Configuration("cycle".into()).is_retryable());
    }
}
