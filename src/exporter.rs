//! Rendering of graph definitions into Mackerel's registration payload.

use crate::error::TelemetryError;
use crate::GraphDefinition;

/// Export format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Json,
    Pretty,
}

/// Renders the body of a `POST /api/v0/graph-defs/create` request.
#[derive(Debug, Clone, Default)]
pub struct Exporter {
    format: ExportFormat,
}

impl Exporter {
    /// Create a new exporter
    pub fn new(format: ExportFormat) -> Self {
        Self { format }
    }

    /// Serialize `definitions` as a JSON array
    pub fn render(&self, definitions: &[GraphDefinition]) -> Result<String, TelemetryError> {
        let body = match self.format {
            ExportFormat::Json => serde_json::to_string(definitions)?,
            ExportFormat::Pretty => serde_json::to_string_pretty(definitions)?,
        };
        tracing::debug!(count = definitions.len(), bytes = body.len(), "rendered graph definitions");
        Ok(body)
    }
}
