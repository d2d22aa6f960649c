//! Metrics setup and update for query execution.

use prometheus::core::{AtomicU64, GenericCounter};

#[derive(Debug, Clone)]
pub struct Metrics {
    pub query_total: GenericCounter<AtomicU64>,
    pub secondary_query_total: GenericCounter<AtomicU64>,
    pub load_state_hit_total: GenericCounter<AtomicU64>,
    pub cardinality_violation_total: GenericCounter<AtomicU64>,
}

impl Metrics {
    /// Set up counters used to produce Prometheus metrics
    pub fn initialize(metrics_registry: &mut prometheus::Registry) -> Result<Self, prometheus::Error> {
        let query_total = add_int_counter_metric(
            metrics_registry,
            "entity_query_total",
            "Total query plans executed.",
        )?;

        let secondary_query_total = add_int_counter_metric(
            metrics_registry,
            "entity_secondary_query_total",
            "Total query plans executed to resolve a nested field.",
        )?;

        let load_state_hit_total = add_int_counter_metric(
            metrics_registry,
            "entity_load_state_hit_total",
            "Total nested fields resolved from an association fetched with the parent.",
        )?;

        let cardinality_violation_total = add_int_counter_metric(
            metrics_registry,
            "entity_cardinality_violation_total",
            "Total singular nested fields whose query did not return exactly one instance.",
        )?;

        Ok(Self {
            query_total,
            secondary_query_total,
            load_state_hit_total,
            cardinality_violation_total,
        })
    }

    pub fn record_query(&self) {
        self.query_total.inc();
    }

    pub fn record_secondary_query(&self) {
        self.query_total.inc();
        self.secondary_query_total.inc();
    }

    pub fn record_load_state_hit(&self) {
        self.load_state_hit_total.inc();
    }

    pub fn record_cardinality_violation(&self) {
        self.cardinality_violation_total.inc();
    }
}

/// Create a new int counter metric and register it with the provided Prometheus Registry
fn add_int_counter_metric(
    metrics_registry: &mut prometheus::Registry,
    metric_name: &str,
    metric_description: &str,
) -> Result<GenericCounter<AtomicU64>, prometheus::Error> {
    let int_counter =
        prometheus::IntCounter::with_opts(prometheus::Opts::new(metric_name, metric_description))?;
    metrics_registry.register(Box::new(int_counter.clone()))?;
    Ok(int_counter)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_are_registered() {
        let mut registry = prometheus::Registry::new();
        let metrics = Metrics::initialize(&mut registry).unwrap();
        metrics.record_secondary_query();

        let names: Vec<String> = registry
            .gather()
            .iter()
            .map(|family| family.get_name().to_string())
            .collect();
        assert_eq!(
            names,
            vec![
                "entity_cardinality_violation_total",
                "entity_load_state_hit_total",
                "entity_query_total",
                "entity_secondary_query_total",
            ]
        );
        assert_eq!(metrics.query_total.get(), 1);
        assert_eq!(metrics.secondary_query_total.get(), 1);
    }

    #[test]
    fn registering_twice_fails() {
        let mut registry = prometheus::Registry::new();
        Metrics::initialize(&mut registry).unwrap();
        assert!(Metrics::initialize(&mut registry).is_err());
    }
}
