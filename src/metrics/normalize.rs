//! Normalizers converting raw upstream records into [`MetricSnapshot`]s.
//!
//! Two canonical shapes, chosen per leaf definition:
//! - Discrete series (daily/monthly filings): linear rate from the two most
//!   recent records. Filings grow near-linearly between reports, so linear
//!   extrapolation is accurate over short refresh windows.
//! - Annual series (population, GDP): continuous compounding at the most
//!   recently observed annual growth rate. The underlying process is
//!   multiplicative growth sampled annually.
//!
//! Field access on raw records goes through an ordered alias list declared
//! on the leaf definition, first match wins.

use chrono::NaiveDate;
use serde_json::Value;

use crate::error::MetricError;
use crate::metrics::snapshot::MetricSnapshot;

const SECONDS_PER_YEAR: f64 = 365.0 * 24.0 * 3600.0;

/// First-match lookup of a field on a raw record via the declared alias list.
pub fn field<'a>(record: &'a Value, aliases: &[String]) -> Option<&'a Value> {
    aliases.iter().find_map(|alias| {
        let v = record.get(alias)?;
        if v.is_null() {
            None
        } else {
            Some(v)
        }
    })
}

/// Parse an amount that upstream may encode as a JSON number or a decimal
/// string (Treasury amounts are strings).
fn parse_amount(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// Parse a `YYYY-MM-DD` record date into epoch seconds (midnight UTC).
fn parse_record_date(value: &Value) -> Option<f64> {
    let s = value.as_str()?;
    let date = NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok()?;
    Some(date.and_hms_opt(0, 0, 0)?.and_utc().timestamp() as f64)
}

/// Parse a year field (`"2025"` or `"2025-01-01"`) and pin it to Jan 1 UTC.
fn parse_year_start(value: &Value) -> Option<(i32, f64)> {
    let s = value.as_str()?.trim();
    let year: i32 = s.get(..4)?.parse().ok()?;
    let start = NaiveDate::from_ymd_opt(year, 1, 1)?
        .and_hms_opt(0, 0, 0)?
        .and_utc()
        .timestamp() as f64;
    Some((year, start))
}

fn record_fields<'a>(
    record: &'a Value,
    date_aliases: &[String],
    value_aliases: &[String],
) -> Result<(&'a Value, f64), MetricError> {
    let date = field(record, date_aliases)
        .ok_or_else(|| MetricError::Api(format!("record missing date field {date_aliases:?}")))?;
    let value = field(record, value_aliases)
        .and_then(parse_amount)
        .ok_or_else(|| MetricError::Api(format!("record missing value field {value_aliases:?}")))?;
    Ok((date, value))
}

/// Discrete-series normalizer (debt, receipts, outlays).
///
/// `records` must be ordered newest-first. The most recent record becomes the
/// base; a second record, if present, yields the linear rate between the two
/// filings. A single record normalizes with rate 0 rather than failing.
pub fn normalize_discrete(
    records: &[Value],
    date_aliases: &[String],
    value_aliases: &[String],
    source: &str,
) -> Result<MetricSnapshot, MetricError> {
    let current = records
        .first()
        .ok_or_else(|| MetricError::InsufficientData(format!("{source}: empty dataset")))?;

    let (current_date, current_value) = record_fields(current, date_aliases, value_aliases)?;
    let current_ts = parse_record_date(current_date)
        .ok_or_else(|| MetricError::Api(format!("{source}: unparseable record date")))?;

    let rate = match records.get(1) {
        Some(previous) => {
            let (previous_date, previous_value) =
                record_fields(previous, date_aliases, value_aliases)?;
            let previous_ts = parse_record_date(previous_date)
                .ok_or_else(|| MetricError::Api(format!("{source}: unparseable record date")))?;
            Some((current_value - previous_value) / (current_ts - previous_ts).max(1.0))
        },
        None => Some(0.0),
    };

    Ok(MetricSnapshot {
        base_value: current_value,
        base_timestamp: current_ts,
        rate_per_second: rate,
        label: format!(
            "{source} as of {}",
            current_date.as_str().unwrap_or("unknown")
        ),
    })
}

/// Annual-growth normalizer (population, GDP).
///
/// `records` must be ordered newest-first; records with a null value (the
/// most recent year is often not yet published) are skipped. Needs at least
/// two valued records. The per-second rate assumes continuous compounding at
/// the most recently observed annual growth rate:
///
/// ```text
/// rate = ln(1 + (v0 - v1) / v1) / seconds_per_year * v0
/// ```
pub fn normalize_annual(
    records: &[Value],
    date_aliases: &[String],
    value_aliases: &[String],
    source: &str,
) -> Result<MetricSnapshot, MetricError> {
    let mut valued = records.iter().filter_map(|record| {
        let date = field(record, date_aliases)?;
        let value = field(record, value_aliases).and_then(parse_amount)?;
        Some((date, value))
    });

    let (current_date, current_value) = valued.next().ok_or_else(|| {
        MetricError::InsufficientData(format!("{source}: no valued annual records"))
    })?;
    let (_, previous_value) = valued.next().ok_or_else(|| {
        MetricError::InsufficientData(format!("{source}: fewer than two annual records"))
    })?;

    let (year, year_start) = parse_year_start(current_date)
        .ok_or_else(|| MetricError::Api(format!("{source}: unparseable year field")))?;

    let rate = if previous_value != 0.0 {
        let growth = (current_value - previous_value) / previous_value;
        (1.0 + growth).ln() / SECONDS_PER_YEAR * current_value
    } else {
        0.0
    };

    Ok(MetricSnapshot {
        base_value: current_value,
        base_timestamp: year_start,
        rate_per_second: Some(rate),
        label: format!("{source} ({year}, compounded)"),
    })
}
