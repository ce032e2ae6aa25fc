use thiserror::Error;

#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("mismatched metric names: {pattern:?} does not match {name:?}")]
    NameMismatch { pattern: String, name: String },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl TelemetryError {
    pub(crate) fn mismatch(pattern: impl Into<String>, name: impl Into<String>) -> Self {
        TelemetryError::NameMismatch {
            pattern: pattern.into(),
            name: name.into(),
        }
    }

    /// Whether this error reports a naming defect rather than an I/O or config problem.
    pub fn is_name_mismatch(&self) -> bool {
        matches!(self, TelemetryError::NameMismatch { .. })
    }
}
