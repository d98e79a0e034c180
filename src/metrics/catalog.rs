//! The standard metric catalog.
//!
//! Declares the dashboard's tile set as data: five fetched leaves (debt,
//! receipts, outlays, population, GDP) and three derived metrics (deficit,
//! debt per citizen, debt-to-GDP). Field aliases cover the names upstream
//! has used across dataset revisions; the first match against a record wins.

use crate::fetch::EndpointKey;
use crate::metrics::combine::Combinator;
use crate::metrics::registry::{LeafSpec, MetricDefinition, MetricKind, NormalizerKind};
use crate::render::RenderFormat;

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn treasury_params(fields: &str, page_size: u32, filter: Option<&str>) -> Vec<(String, String)> {
    let mut params = vec![
        ("fields".to_string(), fields.to_string()),
        ("sort".to_string(), "-record_date".to_string()),
        ("page[size]".to_string(), page_size.to_string()),
        ("format".to_string(), "json".to_string()),
    ];
    if let Some(filter) = filter {
        params.push(("filter".to_string(), filter.to_string()));
    }
    params
}

fn world_bank_params() -> Vec<(String, String)> {
    vec![
        ("format".to_string(), "json".to_string()),
        // A few extra records; the newest year is often not yet published.
        ("per_page".to_string(), "5".to_string()),
    ]
}

/// The default registration set, dependency-complete and cycle-free.
pub fn default_metrics() -> Vec<MetricDefinition> {
    vec![
        MetricDefinition {
            name: "debt".to_string(),
            kind: MetricKind::Leaf(LeafSpec {
                endpoint: EndpointKey::Treasury,
                path: "/v2/accounting/od/debt_to_penny".to_string(),
                params: treasury_params("record_date,tot_pub_debt_out_amt", 2, None),
                date_aliases: strings(&["record_date"]),
                value_aliases: strings(&["tot_pub_debt_out_amt", "debt_outstanding_amt"]),
                normalizer: NormalizerKind::Discrete,
                source: "debt to the penny".to_string(),
            }),
            render: RenderFormat::DollarsGrouped,
        },
        MetricDefinition {
            name: "receipts".to_string(),
            kind: MetricKind::Leaf(LeafSpec {
                endpoint: EndpointKey::Treasury,
                path: "/v1/accounting/mts/mts_table_4".to_string(),
                params: treasury_params(
                    "record_date,current_fytd_net_rcpt_amt",
                    2,
                    Some("line_code_nbr:eq:830"),
                ),
                date_aliases: strings(&["record_date"]),
                value_aliases: strings(&[
                    "current_fytd_net_rcpt_amt",
                    "current_fytd_rcpt_amt",
                    "fytd_rcpt_amt",
                ]),
                normalizer: NormalizerKind::Discrete,
                source: "fiscal-year-to-date receipts".to_string(),
            }),
            render: RenderFormat::DollarsCompact,
        },
        MetricDefinition {
            name: "outlays".to_string(),
            kind: MetricKind::Leaf(LeafSpec {
                endpoint: EndpointKey::Treasury,
                path: "/v1/accounting/mts/mts_table_5".to_string(),
                params: treasury_params(
                    "record_date,current_fytd_net_outly_amt",
                    2,
                    Some("line_code_nbr:eq:5691"),
                ),
                date_aliases: strings(&["record_date"]),
                value_aliases: strings(&[
                    "current_fytd_net_outly_amt",
                    "current_fytd_outly_amt",
                    "fytd_outly_amt",
                ]),
                normalizer: NormalizerKind::Discrete,
                source: "fiscal-year-to-date outlays".to_string(),
            }),
            render: RenderFormat::DollarsCompact,
        },
        MetricDefinition {
            name: "population".to_string(),
            kind: MetricKind::Leaf(LeafSpec {
                endpoint: EndpointKey::WorldBank,
                path: "/country/US/indicator/SP.POP.TOTL".to_string(),
                params: world_bank_params(),
                date_aliases: strings(&["date"]),
                value_aliases: strings(&["value"]),
                normalizer: NormalizerKind::AnnualGrowth,
                source: "U.S. population".to_string(),
            }),
            render: RenderFormat::Count,
        },
        MetricDefinition {
            name: "gdp".to_string(),
            kind: MetricKind::Leaf(LeafSpec {
                endpoint: EndpointKey::WorldBank,
                path: "/country/US/indicator/NY.GDP.MKTP.CD".to_string(),
                params: world_bank_params(),
                date_aliases: strings(&["date"]),
                value_aliases: strings(&["value"]),
                normalizer: NormalizerKind::AnnualGrowth,
                source: "U.S. GDP".to_string(),
            }),
            render: RenderFormat::DollarsCompact,
        },
        MetricDefinition {
            name: "deficit".to_string(),
            kind: MetricKind::Derived {
                dependencies: strings(&["outlays", "receipts"]),
                combinator: Combinator::Subtract,
            },
            render: RenderFormat::DollarsCompact,
        },
        MetricDefinition {
            name: "debt-per-citizen".to_string(),
            kind: MetricKind::Derived {
                dependencies: strings(&["debt", "population"]),
                combinator: Combinator::PerCapita,
            },
            render: RenderFormat::DollarsWhole,
        },
        MetricDefinition {
            name: "debt-to-gdp".to_string(),
            kind: MetricKind::Derived {
                dependencies: strings(&["debt", "gdp"]),
                combinator: Combinator::Quotient,
            },
            render: RenderFormat::Percent,
        },
    ]
}
