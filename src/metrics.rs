//! Metrics Mackerel's own agent reports for a host.
//!
//! See <https://mackerel.io/docs/entry/spec/metrics>.

use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

use crate::metric_name::MetricName;
use crate::normalize::normalize;

/// Platform family of a host agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Linux,
    Windows,
}

/// A catalog entry and the platforms reporting it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemMetric {
    pub pattern: MetricName,
    pub platforms: &'static [Platform],
}

impl SystemMetric {
    /// Whether `platform` reports this metric.
    pub fn reported_on(&self, platform: Platform) -> bool {
        self.platforms.contains(&platform)
    }
}

const LINUX: &[Platform] = &[Platform::Linux];
const WINDOWS: &[Platform] = &[Platform::Windows];
const BOTH: &[Platform] = &[Platform::Linux, Platform::Windows];

const SYSTEM_METRICS: &[(&str, &[Platform])] = &[
    ("loadavg1", LINUX),
    ("loadavg5", LINUX),
    ("loadavg15", LINUX),
    ("processor_queue_length", WINDOWS),
    ("cpu.user.percentage", BOTH),
    ("cpu.iowait.percentage", LINUX),
    ("cpu.system.percentage", BOTH),
    ("cpu.idle.percentage", BOTH),
    ("cpu.nice.percentage", LINUX),
    ("cpu.irq.percentage", LINUX),
    ("cpu.softirq.percentage", LINUX),
    ("cpu.steal.percentage", LINUX),
    ("cpu.guest.percentage", LINUX),
    ("memory.used", BOTH),
    ("memory.available", LINUX),
    ("memory.total", BOTH),
    ("memory.free", BOTH),
    ("memory.buffers", LINUX),
    ("memory.cached", LINUX),
    ("memory.swap_used", LINUX),
    ("memory.swap_cached", LINUX),
    ("memory.swap_total", LINUX),
    ("memory.pagefile_free", WINDOWS),
    ("memory.pagefile_total", WINDOWS),
    ("disk.*.reads.delta", BOTH),
    ("disk.*.writes.delta", BOTH),
    ("interface.*.rxBytes.delta", BOTH),
    ("interface.*.txBytes.delta", BOTH),
    ("filesystem.*.size", BOTH),
    ("filesystem.*.used", BOTH),
];

static CATALOG: LazyLock<Vec<SystemMetric>> = LazyLock::new(|| {
    SYSTEM_METRICS
        .iter()
        .map(|&(pattern, platforms)| SystemMetric {
            pattern: MetricName::parse(pattern),
            platforms,
        })
        .collect()
});

/// All known system metrics.
pub fn system_metrics() -> &'static [SystemMetric] {
    &CATALOG
}

/// Whether `name` is reported by the Mackerel agent on any platform.
///
/// `name` is normalized before lookup.
pub fn is_system_metric(name: &str) -> bool {
    let name = normalize(name);
    CATALOG.iter().any(|m| m.pattern.matches(&name))
}

/// Whether `name` is reported by the Mackerel agent on `platform`.
pub fn is_system_metric_on(platform: Platform, name: &str) -> bool {
    let name = normalize(name);
    CATALOG
        .iter()
        .filter(|m| m.reported_on(platform))
        .any(|m| m.pattern.matches(&name))
}
