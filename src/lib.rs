//! # mackerel-telemetry
//!
//! Naming and validation layer between OpenTelemetry-style instruments and
//! Mackerel graph definitions. Instrument names are dotted paths; Mackerel
//! graphs are keyed by dotted patterns whose `*` and `#` segments stand for one
//! arbitrary segment each. This crate normalizes names into Mackerel's
//! character set, matches, generalizes and binds patterns, builds validated
//! graph definitions, and tells agent-reported system metrics apart from
//! custom ones.

pub mod config;
pub mod error;
pub mod exporter;
pub mod graph_def;
pub mod logging;
pub mod metric_name;
pub mod metrics;
pub mod normalize;

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use tracing::{debug, info, warn};

pub use config::{ExporterConfig, GraphOverride};
pub use error::TelemetryError;
pub use graph_def::{
    build_graph_definition, graph_unit, GraphDefOptions, GraphDefinition, GraphMetric, GraphUnit,
    NumberKind, Unit,
};
pub use metric_name::{bind, generalize, matches, MetricName, Segment};
pub use metrics::{is_system_metric, is_system_metric_on, system_metrics, Platform, SystemMetric};
pub use normalize::normalize;

/// Outcome of registering an instrument.
#[derive(Debug, Clone, PartialEq)]
pub enum Registration {
    /// Reported by the Mackerel agent itself; no graph definition needed.
    System,
    /// First metric of a new graph.
    New(GraphDefinition),
    /// A metric added to a graph registered earlier. Carries the whole graph.
    Extended(GraphDefinition),
    /// Already registered.
    Known,
}

impl Registration {
    /// The graph definition to submit, if any.
    pub fn graph_definition(&self) -> Option<&GraphDefinition> {
        match self {
            Registration::New(def) | Registration::Extended(def) => Some(def),
            Registration::System | Registration::Known => None,
        }
    }
}

/// Registry of graph definitions for one exporter
pub struct MackerelTelemetry {
    config: ExporterConfig,
    state: Mutex<RegistryState>,
}

#[derive(Default)]
struct RegistryState {
    graphs: BTreeMap<String, GraphDefinition>,
    system_count: usize,
    rejected_count: usize,
}

/// Registry snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegistrySnapshot {
    pub service: String,
    pub graph_count: usize,
    pub system_count: usize,
    pub rejected_count: usize,
}

impl MackerelTelemetry {
    /// Create an empty registry
    pub fn new(config: ExporterConfig) -> Self {
        Self {
            config,
            state: Mutex::new(RegistryState::default()),
        }
    }

    /// Configuration this registry was created with
    pub fn config(&self) -> &ExporterConfig {
        &self.config
    }

    fn lock(&self) -> MutexGuard<'_, RegistryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn options_for(
        &self,
        name: &str,
        unit: Option<Unit>,
        kind: NumberKind,
    ) -> Result<GraphDefOptions, TelemetryError> {
        let mut options = match self.config.override_for(name) {
            Some(graph) => {
                if let Some((field, value)) = graph.illegal_name() {
                    return Err(TelemetryError::ConfigError(format!(
                        "override for {:?}: {} {:?} contains characters outside [0-9a-zA-Z._#*-]",
                        graph.instrument, field, value
                    )));
                }
                graph.to_options(unit, kind)
            }
            None => GraphDefOptions {
                unit,
                kind,
                ..Default::default()
            },
        };
        if options.unit.is_none() {
            options.unit = Some(self.config.default_unit.clone());
        }
        Ok(options)
    }

    fn reject(&self, error: TelemetryError) -> TelemetryError {
        self.lock().rejected_count += 1;
        error
    }

    /// Classify an instrument and record its graph definition.
    ///
    /// The name is normalized first. Naming errors, overrides with illegal
    /// names, and metrics whose unit differs from their graph's are counted
    /// as rejections and returned; the registry is left unchanged by them.
    pub fn register(
        &self,
        instrument_name: &str,
        unit: Option<Unit>,
        kind: NumberKind,
    ) -> Result<Registration, TelemetryError> {
        let name = normalize(instrument_name);
        if is_system_metric(&name) {
            debug!(instrument = %name, "skipping system metric");
            self.lock().system_count += 1;
            return Ok(Registration::System);
        }

        let def = self
            .options_for(&name, unit, kind)
            .and_then(|options| build_graph_definition(&name, &options))
            .map_err(|e| self.reject(e))?;

        let mut state = self.lock();
        match state.graphs.entry(def.name.clone()) {
            Entry::Vacant(entry) => {
                info!(graph = %def.name, instrument = %name, "registered graph definition");
                Ok(Registration::New(entry.insert(def).clone()))
            }
            Entry::Occupied(mut entry) => {
                let existing = entry.get_mut();
                if existing.unit != def.unit {
                    warn!(
                        graph = %existing.name,
                        instrument = %name,
                        existing = ?existing.unit,
                        requested = ?def.unit,
                        "graph unit conflict"
                    );
                    let error = TelemetryError::ConfigError(format!(
                        "graph {:?} has unit {:?}, instrument {:?} needs {:?}",
                        existing.name, existing.unit, name, def.unit
                    ));
                    state.rejected_count += 1;
                    return Err(error);
                }
                let mut extended = false;
                for metric in def.metrics {
                    if !existing.contains_metric(&metric.name) {
                        existing.metrics.push(metric);
                        extended = true;
                    }
                }
                if extended {
                    info!(graph = %existing.name, instrument = %name, "extended graph definition");
                    Ok(Registration::Extended(existing.clone()))
                } else {
                    Ok(Registration::Known)
                }
            }
        }
    }

    /// Registered graph definitions, ordered by graph name.
    pub fn graph_definitions(&self) -> Vec<GraphDefinition> {
        self.lock().graphs.values().cloned().collect()
    }

    /// Counts of graphs, system metrics and rejections so far
    pub fn snapshot(&self) -> RegistrySnapshot {
        let state = self.lock();
        RegistrySnapshot {
            service: self.config.service_name.clone(),
            graph_count: state.graphs.len(),
            system_count: state.system_count,
            rejected_count: state.rejected_count,
        }
    }
}
