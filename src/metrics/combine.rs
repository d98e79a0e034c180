//! Pure combinators deriving one [`MetricSnapshot`] from others.
//!
//! No I/O: a combinator is a pure function of its dependencies' stored
//! snapshots. Division by a zero denominator degrades to a zero snapshot
//! rather than raising, since dependencies carry their own error state.

use crate::metrics::snapshot::MetricSnapshot;

/// How a derived metric combines its (exactly two) dependency snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    /// `a - b` (deficit = outlays - receipts). Rates subtract.
    Subtract,
    /// `a / b` where the numerator dominates (debt per citizen). The
    /// denominator's own growth is a second-order term and is ignored.
    PerCapita,
    /// `a / b` with the full quotient rule for the rate (debt-to-GDP).
    Quotient,
}

impl Combinator {
    /// Number of dependencies this combinator consumes. Checked at
    /// registration time.
    pub fn arity(&self) -> usize {
        2
    }

    /// Apply the combinator to resolved dependency snapshots.
    ///
    /// Callers guarantee `deps.len() == self.arity()`; the registry rejects
    /// definitions that would violate this.
    pub fn apply(&self, deps: &[&MetricSnapshot], label: String) -> MetricSnapshot {
        let a = deps[0];
        let b = deps[1];
        let a_rate = a.rate_per_second.unwrap_or(0.0);
        let b_rate = b.rate_per_second.unwrap_or(0.0);
        let base_timestamp = a.base_timestamp.min(b.base_timestamp);

        let (base_value, rate) = match self {
            Combinator::Subtract => (a.base_value - b.base_value, a_rate - b_rate),
            Combinator::PerCapita => {
                if b.base_value == 0.0 {
                    (0.0, 0.0)
                } else {
                    (a.base_value / b.base_value, a_rate / b.base_value)
                }
            },
            Combinator::Quotient => {
                if b.base_value == 0.0 {
                    (0.0, 0.0)
                } else {
                    (
                        a.base_value / b.base_value,
                        (a_rate * b.base_value - a.base_value * b_rate)
                            / (b.base_value * b.base_value),
                    )
                }
            },
        };

        MetricSnapshot {
            base_value,
            base_timestamp,
            rate_per_second: Some(rate),
            label,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snap(base: f64, rate: f64, ts: f64) -> MetricSnapshot {
        MetricSnapshot {
            base_value: base,
            base_timestamp: ts,
            rate_per_second: Some(rate),
            label: String::new(),
        }
    }

    #[test]
    fn subtraction_combines_values_and_rates() {
        let outlays = snap(6_800_000_000_000.0, 200_000.0, 100.0);
        let receipts = snap(4_900_000_000_000.0, 150_000.0, 50.0);
        let deficit = Combinator::Subtract.apply(&[&outlays, &receipts], "deficit".into());

        assert_eq!(deficit.base_value, 1_900_000_000_000.0);
        assert_eq!(deficit.rate_per_second, Some(50_000.0));
        assert_eq!(deficit.base_timestamp, 50.0);
    }

    #[test]
    fn per_capita_divides_by_denominator_base() {
        let debt = snap(37_000_000_000_000.0, 100_000.0, 0.0);
        let population = snap(340_000_000.0, 2.0, 0.0);
        let per_citizen = Combinator::PerCapita.apply(&[&debt, &population], String::new());

        assert_eq!(per_citizen.base_value, 37_000_000_000_000.0 / 340_000_000.0);
        assert_eq!(per_citizen.rate_per_second, Some(100_000.0 / 340_000_000.0));
    }

    #[test]
    fn quotient_uses_full_quotient_rule() {
        let a = snap(10.0, 4.0, 0.0);
        let b = snap(2.0, 1.0, 0.0);
        let q = Combinator::Quotient.apply(&[&a, &b], String::new());

        assert_eq!(q.base_value, 5.0);
        // (4*2 - 10*1) / 2^2 = -0.5
        assert_eq!(q.rate_per_second, Some(-0.5));
    }

    #[test]
    fn zero_denominator_degrades_to_zero_snapshot() {
        let a = snap(10.0, 4.0, 0.0);
        let zero = snap(0.0, 1.0, 0.0);

        for combinator in [Combinator::PerCapita, Combinator::Quotient] {
            let out = combinator.apply(&[&a, &zero], String::new());
            assert_eq!(out.base_value, 0.0);
            assert_eq!(out.rate_per_second, Some(0.0));
        }
    }

    #[test]
    fn missing_rates_are_treated_as_static() {
        let a = MetricSnapshot {
            base_value: 5.0,
            base_timestamp: 0.0,
            rate_per_second: None,
            label: String::new(),
        };
        let b = snap(2.0, 0.0, 0.0);
        let out = Combinator::Subtract.apply(&[&a, &b], String::new());
        assert_eq!(out.base_value, 3.0);
        assert_eq!(out.rate_per_second, Some(0.0));
    }
}
