//! Mackerel graph definitions built from instrument names.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::TelemetryError;
use crate::metric_name::{bind, generalize, MetricName};

/// Namespace Mackerel reserves for host custom metrics.
pub const CUSTOM_PREFIX: &str = "custom";

/// Unit of an instrument, as reported by the instrumentation side.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Unit {
    #[default]
    Dimensionless,
    Bytes,
    Milliseconds,
    Other(String),
}

impl Unit {
    /// Interpret a UCUM unit code. An empty code means no unit was set.
    pub fn from_code(code: &str) -> Self {
        match code {
            "" | "1" => Unit::Dimensionless,
            "By" => Unit::Bytes,
            "ms" => Unit::Milliseconds,
            other => Unit::Other(other.to_string()),
        }
    }

    /// UCUM code of this unit.
    pub fn code(&self) -> &str {
        match self {
            Unit::Dimensionless => "1",
            Unit::Bytes => "By",
            Unit::Milliseconds => "ms",
            Unit::Other(code) => code,
        }
    }
}

impl From<String> for Unit {
    fn from(code: String) -> Self {
        Unit::from_code(&code)
    }
}

impl From<Unit> for String {
    fn from(unit: Unit) -> Self {
        unit.code().to_string()
    }
}

impl From<&opentelemetry::metrics::Unit> for Unit {
    fn from(unit: &opentelemetry::metrics::Unit) -> Self {
        Unit::from_code(unit.as_str())
    }
}

/// Number kind of the values an instrument records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumberKind {
    #[default]
    Int64,
    Float64,
}

/// Unit tag of a Mackerel graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GraphUnit {
    Float,
    Integer,
    Bytes,
}

/// Map an instrument unit onto a graph unit tag.
///
/// Units Mackerel has no tag for fall back to a plain number, `integer` or
/// `float` depending on the instrument's number kind.
pub fn graph_unit(unit: &Unit, kind: NumberKind) -> GraphUnit {
    match unit {
        Unit::Dimensionless | Unit::Milliseconds => GraphUnit::Float,
        Unit::Bytes => GraphUnit::Bytes,
        Unit::Other(_) => match kind {
            NumberKind::Int64 => GraphUnit::Integer,
            NumberKind::Float64 => GraphUnit::Float,
        },
    }
}

/// Naming overrides for a graph definition.
///
/// An empty string is treated the same as `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GraphDefOptions {
    /// Graph name, without the `custom.` namespace.
    pub display_name: Option<String>,
    /// Metric name pattern, without the `custom.` namespace.
    pub metric_name: Option<String>,
    pub unit: Option<Unit>,
    pub kind: NumberKind,
}

/// One metric of a graph definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphMetric {
    pub name: String,
}

/// Graph definition in the shape Mackerel's graph-defs API accepts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphDefinition {
    pub name: String,
    pub unit: GraphUnit,
    pub metrics: Vec<GraphMetric>,
}

impl GraphDefinition {
    /// Whether a metric named `name` is already part of this graph.
    pub fn contains_metric(&self, name: &str) -> bool {
        self.metrics.iter().any(|m| m.name == name)
    }
}

fn namespaced(name: &str) -> String {
    format!("{}.{}", CUSTOM_PREFIX, name)
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

/// Resolve (display name, metric name) for `instrument_name`.
fn resolve_names(
    instrument_name: &str,
    options: &GraphDefOptions,
) -> Result<(String, String), TelemetryError> {
    let (display_name, metric_name) =
        match (non_empty(&options.display_name), non_empty(&options.metric_name)) {
            (None, None) => {
                let metric_name = generalize(instrument_name);
                (metric_name.clone(), metric_name)
            }
            (Some(display_name), None) => {
                let metric_name = bind(display_name, instrument_name)?;
                (display_name.to_string(), metric_name)
            }
            (None, Some(metric_name)) => (metric_name.to_string(), metric_name.to_string()),
            (Some(display_name), Some(metric_name)) => {
                (display_name.to_string(), metric_name.to_string())
            }
        };

    if !MetricName::parse(&metric_name).matches(instrument_name) {
        return Err(TelemetryError::mismatch(metric_name, instrument_name));
    }
    Ok((display_name, metric_name))
}

/// Build the graph definition holding the single metric `instrument_name`.
///
/// `instrument_name` and the names in `options` are expected to be normalized
/// already. The resolved metric name must match `instrument_name`, otherwise
/// [`TelemetryError::NameMismatch`] is returned.
pub fn build_graph_definition(
    instrument_name: &str,
    options: &GraphDefOptions,
) -> Result<GraphDefinition, TelemetryError> {
    let (display_name, metric_name) =
        resolve_names(instrument_name, options).inspect_err(|e| {
            warn!(instrument = instrument_name, error = %e, "rejected graph definition");
        })?;

    let unit = graph_unit(&options.unit.clone().unwrap_or_default(), options.kind);
    debug!(
        instrument = instrument_name,
        graph = %display_name,
        metric = %metric_name,
        ?unit,
        "resolved graph definition"
    );

    Ok(GraphDefinition {
        name: namespaced(&display_name),
        unit,
        metrics: vec![GraphMetric {
            name: namespaced(&metric_name),
        }],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(display_name: Option<&str>, metric_name: Option<&str>) -> GraphDefOptions {
        GraphDefOptions {
            display_name: display_name.map(str::to_string),
            metric_name: metric_name.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn test_defaults_generalize_instrument_name() {
        let def = build_graph_definition("disk.sda.reads.delta", &GraphDefOptions::default())
            .unwrap();
        assert_eq!(def.name, "custom.disk.sda.reads.*");
        assert_eq!(def.metrics.len(), 1);
        assert_eq!(def.metrics[0].name, "custom.disk.sda.reads.*");
        assert_eq!(def.unit, GraphUnit::Float);
    }

    #[test]
    fn test_display_name_binds_onto_instrument_name() {
        let def =
            build_graph_definition("disk.sda.reads.delta", &options(Some("disk.*"), None)).unwrap();
        assert_eq!(def.name, "custom.disk.*");
        assert_eq!(def.metrics[0].name, "custom.disk.*.reads.delta");
    }

    #[test]
    fn test_display_name_mismatch() {
        let err = build_graph_definition("disk.sda.reads.delta", &options(Some("network.*"), None))
            .unwrap_err();
        assert!(err.is_name_mismatch());
    }

    #[test]
    fn test_display_name_longer_than_instrument() {
        let err = build_graph_definition("a.b", &options(Some("a.b.c"), None)).unwrap_err();
        assert!(err.is_name_mismatch());
    }

    #[test]
    fn test_metric_name_only() {
        let def = build_graph_definition("http.server.duration", &options(None, Some("http.*.*")))
            .unwrap();
        assert_eq!(def.name, "custom.http.*.*");
        assert_eq!(def.metrics[0].name, "custom.http.*.*");
    }

    #[test]
    fn test_both_names_given() {
        let def = build_graph_definition(
            "queue.jobs.pending",
            &options(Some("queue"), Some("queue.jobs.#")),
        )
        .unwrap();
        assert_eq!(def.name, "custom.queue");
        assert_eq!(def.metrics[0].name, "custom.queue.jobs.#");
    }

    #[test]
    fn test_given_metric_name_must_match() {
        let err = build_graph_definition("queue.jobs.pending", &options(Some("queue"), Some("queue.*")))
            .unwrap_err();
        assert!(matches!(err, TelemetryError::NameMismatch { ref pattern, .. } if pattern == "queue.*"));
    }

    #[test]
    fn test_empty_strings_count_as_unset() {
        let def = build_graph_definition("a.b", &options(Some(""), Some(""))).unwrap();
        assert_eq!(def.name, "custom.a.*");
    }

    #[test]
    fn test_trailing_id_kept() {
        let def = build_graph_definition("worker.#", &GraphDefOptions::default()).unwrap();
        assert_eq!(def.name, "custom.worker.#");
    }

    #[test]
    fn test_unit_mapping() {
        assert_eq!(graph_unit(&Unit::Dimensionless, NumberKind::Int64), GraphUnit::Float);
        assert_eq!(graph_unit(&Unit::Bytes, NumberKind::Float64), GraphUnit::Bytes);
        assert_eq!(graph_unit(&Unit::Milliseconds, NumberKind::Int64), GraphUnit::Float);
        assert_eq!(graph_unit(&Unit::Other("s".into()), NumberKind::Int64), GraphUnit::Integer);
        assert_eq!(graph_unit(&Unit::Other("s".into()), NumberKind::Float64), GraphUnit::Float);
    }

    #[test]
    fn test_unit_from_opentelemetry() {
        use opentelemetry::metrics::Unit as OtelUnit;
        assert_eq!(Unit::from(&OtelUnit::new("By")), Unit::Bytes);
        assert_eq!(Unit::from(&OtelUnit::new("ms")), Unit::Milliseconds);
        assert_eq!(Unit::from(&OtelUnit::new("")), Unit::Dimensionless);
        assert_eq!(Unit::from(&OtelUnit::new("{request}")), Unit::Other("{request}".into()));
    }

    #[test]
    fn test_unit_in_options() {
        let opts = GraphDefOptions {
            unit: Some(Unit::Bytes),
            ..Default::default()
        };
        let def = build_graph_definition("memory.heap", &opts).unwrap();
        assert_eq!(def.unit, GraphUnit::Bytes);
    }

    #[test]
    fn test_serialized_shape() {
        let def = build_graph_definition("disk.sda.reads.delta", &options(Some("disk.*"), None))
            .unwrap();
        let json = serde_json::to_value(&def).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "name": "custom.disk.*",
                "unit": "float",
                "metrics": [{ "name": "custom.disk.*.reads.delta" }],
            })
        );
    }
}
