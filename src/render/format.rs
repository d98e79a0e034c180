//! Auto-scaling display formats for tile values.
//!
//! A [`RenderFormat`] is the pure formatting half of a metric definition:
//! live projected value in, display string out. A metric that never resolved
//! renders as an em-dash placeholder.

/// Display style for one tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderFormat {
    /// Full grouped dollars, no cents: `$37,454,537,246,248`.
    DollarsGrouped,
    /// Magnitude-scaled dollars: `$1.90 trillion`, `$482.53 billion`.
    DollarsCompact,
    /// Grouped whole dollars, for per-person figures: `$109,423`.
    DollarsWhole,
    /// Grouped count, no currency sign: `341,000,000`.
    Count,
    /// Ratio rendered as a percentage with one decimal: `121.4%`.
    Percent,
}

const PLACEHOLDER: &str = "\u{2014}";

impl RenderFormat {
    pub fn render(&self, value: Option<f64>) -> String {
        let Some(value) = value else {
            return PLACEHOLDER.to_string();
        };
        if !value.is_finite() {
            return PLACEHOLDER.to_string();
        }

        match self {
            RenderFormat::DollarsGrouped | RenderFormat::DollarsWhole => {
                signed(value, |abs| format!("${}", group_thousands(abs)))
            },
            RenderFormat::Count => signed(value, group_thousands),
            RenderFormat::DollarsCompact => signed(value, compact_dollars),
            RenderFormat::Percent => format!("{:.1}%", value * 100.0),
        }
    }
}

fn signed(value: f64, render_abs: impl Fn(f64) -> String) -> String {
    if value < 0.0 {
        format!("-{}", render_abs(-value))
    } else {
        render_abs(value)
    }
}

/// Group a non-negative value into thousands: `1234567.8` -> `1,234,568`.
fn group_thousands(value: f64) -> String {
    // Beyond integer-precise f64 range the digits are noise anyway.
    if value >= 9.0e17 {
        return format!("{value:.0}");
    }
    let digits = format!("{:.0}", value.round());
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

fn compact_dollars(value: f64) -> String {
    const SCALES: [(f64, &str); 4] = [
        (1.0e12, "trillion"),
        (1.0e9, "billion"),
        (1.0e6, "million"),
        (1.0e3, "thousand"),
    ];
    for (scale, unit) in SCALES {
        if value >= scale {
            return format!("${:.2} {unit}", value / scale);
        }
    }
    format!("${value:.2}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn grouped_dollars() {
        assert_eq!(
            RenderFormat::DollarsGrouped.render(Some(37_454_537_246_248.71)),
            "$37,454,537,246,249"
        );
        assert_eq!(RenderFormat::DollarsWhole.render(Some(109_423.4)), "$109,423");
        assert_eq!(RenderFormat::DollarsGrouped.render(Some(0.2)), "$0");
    }

    #[test]
    fn compact_dollars_scale_by_magnitude() {
        assert_eq!(
            RenderFormat::DollarsCompact.render(Some(1_900_000_000_000.0)),
            "$1.90 trillion"
        );
        assert_eq!(
            RenderFormat::DollarsCompact.render(Some(482_530_000_000.0)),
            "$482.53 billion"
        );
        assert_eq!(RenderFormat::DollarsCompact.render(Some(12.5)), "$12.50");
    }

    #[test]
    fn counts_and_percentages() {
        assert_eq!(RenderFormat::Count.render(Some(341_000_000.0)), "341,000,000");
        assert_eq!(RenderFormat::Percent.render(Some(1.2139)), "121.4%");
    }

    #[test]
    fn negative_values_keep_the_sign_outside_the_currency() {
        assert_eq!(RenderFormat::DollarsGrouped.render(Some(-1_234.0)), "-$1,234");
        assert_eq!(
            RenderFormat::DollarsCompact.render(Some(-2_000_000.0)),
            "-$2.00 million"
        );
    }

    #[test]
    fn unresolved_and_non_finite_render_as_placeholder() {
        assert_eq!(RenderFormat::DollarsGrouped.render(None), "\u{2014}");
        assert_eq!(RenderFormat::Percent.render(Some(f64::NAN)), "\u{2014}");
    }
}
