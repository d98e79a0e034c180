//! Metric registry: static definitions, dependency validation, and the
//! cached topological resolution order.
//!
//! Definitions are registered once at startup and immutable thereafter. The
//! registry validates the dependency DAG up front - a cycle, an unknown
//! dependency name, or a wrong combinator arity is a fatal
//! [`MetricError::Configuration`] raised before any network activity.

use rustc_hash::FxHashMap;

use crate::error::MetricError;
use crate::fetch::EndpointKey;
use crate::metrics::combine::Combinator;
use crate::render::RenderFormat;

/// Which normalizer converts a leaf's raw records into a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NormalizerKind {
    /// Daily/monthly filings, linear rate between the two newest records.
    Discrete,
    /// Annual series, continuous compounding at the observed growth rate.
    AnnualGrowth,
}

/// Everything needed to fetch and normalize one leaf metric, declared as
/// data: endpoint, query, accepted field aliases (first match wins), and the
/// normalizer shape.
#[derive(Debug, Clone)]
pub struct LeafSpec {
    pub endpoint: EndpointKey,
    /// Path under the endpoint base, with a leading slash.
    pub path: String,
    pub params: Vec<(String, String)>,
    /// Ordered field aliases for the record date/year.
    pub date_aliases: Vec<String>,
    /// Ordered field aliases for the record amount.
    pub value_aliases: Vec<String>,
    pub normalizer: NormalizerKind,
    /// Short provenance note used in snapshot labels.
    pub source: String,
}

/// A metric is either fetched directly (leaf) or derived purely from other
/// metrics' snapshots.
#[derive(Debug, Clone)]
pub enum MetricKind {
    Leaf(LeafSpec),
    Derived {
        /// Names of other registered metrics, in combinator argument order.
        dependencies: Vec<String>,
        combinator: Combinator,
    },
}

/// Static registration record for one tile.
#[derive(Debug, Clone)]
pub struct MetricDefinition {
    /// Unique key.
    pub name: String,
    pub kind: MetricKind,
    pub render: RenderFormat,
}

impl MetricDefinition {
    pub fn dependencies(&self) -> &[String] {
        match &self.kind {
            MetricKind::Leaf(_) => &[],
            MetricKind::Derived { dependencies, .. } => dependencies,
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, MetricKind::Leaf(_))
    }
}

/// Validated set of metric definitions with a cached topological order
/// (dependencies before dependents).
#[derive(Debug)]
pub struct MetricRegistry {
    definitions: Vec<MetricDefinition>,
    index: FxHashMap<String, usize>,
    order: Vec<usize>,
}

impl MetricRegistry {
    pub fn new(definitions: Vec<MetricDefinition>) -> Result<Self, MetricError> {
        let mut index = FxHashMap::default();
        for (i, def) in definitions.iter().enumerate() {
            if index.insert(def.name.clone(), i).is_some() {
                return Err(MetricError::Configuration(format!(
                    "duplicate metric name `{}`",
                    def.name
                )));
            }
        }

        for def in &definitions {
            for dep in def.dependencies() {
                if !index.contains_key(dep) {
                    return Err(MetricError::Configuration(format!(
                        "metric `{}` depends on unregistered metric `{dep}`",
                        def.name
                    )));
                }
            }
            if let MetricKind::Derived {
                dependencies,
                combinator,
            } = &def.kind
            {
                if dependencies.len() != combinator.arity() {
                    return Err(MetricError::Configuration(format!(
                        "metric `{}` lists {} dependencies, combinator takes {}",
                        def.name,
                        dependencies.len(),
                        combinator.arity()
                    )));
                }
            }
        }

        let order = topological_order(&definitions, &index)?;

        Ok(Self {
            definitions,
            index,
            order,
        })
    }

    pub fn get(&self, name: &str) -> Option<&MetricDefinition> {
        self.index.get(name).map(|&i| &self.definitions[i])
    }

    /// Definitions in resolution order: every dependency precedes its
    /// dependents.
    pub fn ordered(&self) -> impl Iterator<Item = &MetricDefinition> {
        self.order.iter().map(|&i| &self.definitions[i])
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.definitions.iter().map(|d| d.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

/// Kahn's algorithm over the dependency edges. Leftover nodes mean a cycle.
fn topological_order(
    definitions: &[MetricDefinition],
    index: &FxHashMap<String, usize>,
) -> Result<Vec<usize>, MetricError> {
    let n = definitions.len();
    let mut in_degree = vec![0usize; n];
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); n];

    for (i, def) in definitions.iter().enumerate() {
        for dep in def.dependencies() {
            let d = index[dep];
            in_degree[i] += 1;
            dependents[d].push(i);
        }
    }

    let mut queue: Vec<usize> = (0..n).filter(|&i| in_degree[i] == 0).collect();
    let mut order = Vec::with_capacity(n);

    while let Some(i) = queue.pop() {
        order.push(i);
        for &dependent in &dependents[i] {
            in_degree[dependent] -= 1;
            if in_degree[dependent] == 0 {
                queue.push(dependent);
            }
        }
    }

    if order.len() != n {
        let cyclic: Vec<&str> = (0..n)
            .filter(|&i| in_degree[i] > 0)
            .map(|i| definitions[i].name.as_str())
            .collect();
        return Err(MetricError::Configuration(format!(
            "dependency cycle involving: {}",
            cyclic.join(", ")
        )));
    }

    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(name: &str) -> MetricDefinition {
        MetricDefinition {
            name: name.to_string(),
            kind: MetricKind::Leaf(LeafSpec {
                endpoint: EndpointKey::Treasury,
                path: "/test".to_string(),
                params: Vec::new(),
                date_aliases: vec!["record_date".to_string()],
                value_aliases: vec!["amt".to_string()],
                normalizer: NormalizerKind::Discrete,
                source: name.to_string(),
            }),
            render: RenderFormat::DollarsGrouped,
        }
    }

    fn derived(name: &str, deps: &[&str]) -> MetricDefinition {
        MetricDefinition {
            name: name.to_string(),
            kind: MetricKind::Derived {
                dependencies: deps.iter().map(|s| s.to_string()).collect(),
                combinator: Combinator::Subtract,
            },
            render: RenderFormat::DollarsCompact,
        }
    }

    #[test]
    fn orders_dependencies_before_dependents() {
        let registry = MetricRegistry::new(vec![
            derived("deficit", &["outlays", "receipts"]),
            leaf("outlays"),
            leaf("receipts"),
        ])
        .unwrap();

        let order: Vec<&str> = registry.ordered().map(|d| d.name.as_str()).collect();
        let pos = |name: &str| order.iter().position(|&n| n == name).unwrap();
        assert!(pos("outlays") < pos("deficit"));
        assert!(pos("receipts") < pos("deficit"));
    }

    #[test]
    fn cycle_is_a_configuration_error() {
        let err = MetricRegistry::new(vec![
            derived("a", &["b", "b"]),
            derived("b", &["a", "a"]),
        ])
        .unwrap_err();
        assert!(matches!(err, MetricError::Configuration(_)));
        assert!(err.to_string().contains("cycle"));
    }

    #[test]
    fn unknown_dependency_is_a_configuration_error() {
        let err = MetricRegistry::new(vec![
            leaf("outlays"),
            derived("deficit", &["outlays", "ghost"]),
        ])
        .unwrap_err();
        assert!(matches!(err, MetricError::Configuration(_)));
        assert!(err.to_string().contains("ghost"));
    }

    #[test]
    fn duplicate_name_is_a_configuration_error() {
        let err = MetricRegistry::new(vec![leaf("debt"), leaf("debt")]).unwrap_err();
        assert!(matches!(err, MetricError::Configuration(_)));
    }

    #[test]
    fn wrong_combinator_arity_is_a_configuration_error() {
        let err = MetricRegistry::new(vec![leaf("outlays"), derived("deficit", &["outlays"])])
            .unwrap_err();
        assert!(matches!(err, MetricError::Configuration(_)));
    }
}
