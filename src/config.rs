use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing_subscriber::filter::LevelFilter;

use crate::error::TelemetryError;
use crate::graph_def::{GraphDefOptions, NumberKind, Unit};
use crate::metric_name::MetricName;
use crate::normalize::is_legal_char;

/// Per-instrument naming override.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphOverride {
    /// Pattern selecting the instruments this override applies to
    pub instrument: String,
    /// Graph name, without the `custom.` namespace
    pub display_name: Option<String>,
    /// Metric name pattern, without the `custom.` namespace
    pub metric_name: Option<String>,
    /// UCUM unit code overriding the instrument's own unit
    pub unit: Option<Unit>,
}

impl GraphOverride {
    /// Whether the `instrument` pattern matches `instrument_name`
    pub fn applies_to(&self, instrument_name: &str) -> bool {
        MetricName::parse(&self.instrument).matches(instrument_name)
    }

    /// First name field holding a character Mackerel does not accept.
    pub fn illegal_name(&self) -> Option<(&'static str, &str)> {
        [
            ("instrument", Some(self.instrument.as_str())),
            ("display_name", self.display_name.as_deref()),
            ("metric_name", self.metric_name.as_deref()),
        ]
        .into_iter()
        .find_map(|(field, name)| {
            name.filter(|n| !n.chars().all(is_legal_char))
                .map(|n| (field, n))
        })
    }

    /// Builder options for this override, falling back to the instrument's unit
    pub fn to_options(&self, unit: Option<Unit>, kind: NumberKind) -> GraphDefOptions {
        GraphDefOptions {
            display_name: self.display_name.clone(),
            metric_name: self.metric_name.clone(),
            unit: self.unit.clone().or(unit),
            kind,
        }
    }
}

/// Exporter configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExporterConfig {
    /// Service name for log attribution
    pub service_name: String,
    /// Unit used when neither the instrument nor an override sets one
    pub default_unit: Unit,
    /// Naming overrides, first match wins
    pub graphs: Vec<GraphOverride>,
    /// Default log level, overridden by `RUST_LOG`
    pub log_level: String,
    /// Emit logs as JSON lines
    pub json_logs: bool,
}

impl Default for ExporterConfig {
    fn default() -> Self {
        Self {
            service_name: "mackerel-telemetry".to_string(),
            default_unit: Unit::Dimensionless,
            graphs: Vec::new(),
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}

impl ExporterConfig {
    /// Parse and validate a JSON configuration
    pub fn from_json_str(json: &str) -> Result<Self, TelemetryError> {
        let config: ExporterConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON configuration file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, TelemetryError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Check the log level and every graph override
    pub fn validate(&self) -> Result<(), TelemetryError> {
        self.level_filter()?;
        for (i, graph) in self.graphs.iter().enumerate() {
            if graph.instrument.is_empty() {
                return Err(TelemetryError::ConfigError(format!(
                    "graphs[{}]: instrument pattern must not be empty",
                    i
                )));
            }
            if let Some((field, name)) = graph.illegal_name() {
                return Err(TelemetryError::ConfigError(format!(
                    "graphs[{}].{}: {:?} contains characters outside [0-9a-zA-Z._#*-]",
                    i, field, name
                )));
            }
        }
        Ok(())
    }

    /// Parsed `log_level`
    pub fn level_filter(&self) -> Result<LevelFilter, TelemetryError> {
        self.log_level.parse().map_err(|_| {
            TelemetryError::ConfigError(format!("invalid log level {:?}", self.log_level))
        })
    }

    /// First override whose instrument pattern matches `instrument_name`.
    pub fn override_for(&self, instrument_name: &str) -> Option<&GraphOverride> {
        self.graphs.iter().find(|g| g.applies_to(instrument_name))
    }
}
