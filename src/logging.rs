//! `tracing` subscriber setup for exporters embedding this crate.

use tracing_subscriber::EnvFilter;

use crate::config::ExporterConfig;
use crate::error::TelemetryError;

fn filter(config: &ExporterConfig) -> Result<EnvFilter, TelemetryError> {
    Ok(EnvFilter::builder()
        .with_default_directive(config.level_filter()?.into())
        .from_env_lossy())
}

/// Install a stderr fmt subscriber configured from `config`.
///
/// `RUST_LOG` takes precedence over `config.log_level`. Returns `false` if a
/// global subscriber was already installed, in which case nothing changes.
pub fn init(config: &ExporterConfig) -> Result<bool, TelemetryError> {
    let filter = filter(config)?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    let installed = if config.json_logs {
        builder.json().try_init().is_ok()
    } else {
        builder.compact().try_init().is_ok()
    };
    if installed {
        tracing::debug!(service = %config.service_name, "logging initialized");
    }
    Ok(installed)
}
