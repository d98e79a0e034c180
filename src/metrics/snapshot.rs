//! The fundamental unit of metric state and its live projection.
//!
//! A [`MetricSnapshot`] pins the most recently resolved real-world value to
//! its observation time together with a signed linear extrapolation rate.
//! [`project`] turns a snapshot plus the current wall clock into the
//! continuously-interpolated present value, without touching the network.

use std::time::{SystemTime, UNIX_EPOCH};

/// Last-known real value, its observation time, and an extrapolation rate.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricSnapshot {
    /// The most recently resolved real-world value.
    pub base_value: f64,
    /// Seconds since epoch at which `base_value` was observed/valid.
    pub base_timestamp: f64,
    /// Signed linear extrapolation rate (value units per second) applicable
    /// after `base_timestamp`. `None` means static display.
    pub rate_per_second: Option<f64>,
    /// Human-readable provenance/freshness note, display only.
    pub label: String,
}

impl MetricSnapshot {
    /// Interpolated value at `now_seconds`. Missing rate returns the base
    /// value unchanged.
    pub fn project(&self, now_seconds: f64) -> f64 {
        match self.rate_per_second {
            Some(rate) => self.base_value + rate * (now_seconds - self.base_timestamp),
            None => self.base_value,
        }
    }
}

/// Live projection over an optional snapshot: a metric that never resolved
/// projects to `None`.
pub fn project(snapshot: Option<&MetricSnapshot>, now_seconds: f64) -> Option<f64> {
    snapshot.map(|s| s.project(now_seconds))
}

/// Current wall-clock time as fractional seconds since epoch.
pub fn now_seconds() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(base: f64, ts: f64, rate: Option<f64>) -> MetricSnapshot {
        MetricSnapshot {
            base_value: base,
            base_timestamp: ts,
            rate_per_second: rate,
            label: String::new(),
        }
    }

    #[test]
    fn projection_is_linear_in_elapsed_time() {
        let s = snapshot(1_000.0, 100.0, Some(2.5));
        assert_eq!(s.project(100.0), 1_000.0);
        assert_eq!(s.project(104.0), 1_010.0);
        assert_eq!(s.project(1_100.0), 3_500.0);
    }

    #[test]
    fn projection_handles_zero_and_negative_rates() {
        assert_eq!(snapshot(500.0, 0.0, Some(0.0)).project(1_000_000.0), 500.0);
        assert_eq!(snapshot(500.0, 0.0, Some(-1.0)).project(100.0), 400.0);
    }

    #[test]
    fn missing_rate_falls_back_to_static_value() {
        let s = snapshot(37_000_000_000_000.0, 0.0, None);
        assert_eq!(s.project(1e9), 37_000_000_000_000.0);
    }

    #[test]
    fn unresolved_metric_projects_to_none() {
        assert_eq!(project(None, 12345.0), None);
        let s = snapshot(1.0, 0.0, Some(1.0));
        assert_eq!(project(Some(&s), 2.0), Some(3.0));
    }
}
