//! Configuration threaded through `init` and `deinit`.

use crate::metrics::{SharedMetricsRegistry, StatsLevel};

/// Global configuration seen by expression nodes during setup and teardown.
///
/// Cheap to clone; clones share the metrics registry.
#[derive(Clone, Debug, Default)]
pub struct ExprConfig {
    metrics: SharedMetricsRegistry,
}

impl ExprConfig {
    pub fn builder() -> ExprConfigBuilder {
        ExprConfigBuilder::new()
    }

    /// Registry that node counters are registered with.
    pub fn metrics(&self) -> &SharedMetricsRegistry {
        &self.metrics
    }

    pub fn stats_level(&self) -> StatsLevel {
        self.metrics.level()
    }
}

/// Builder for [`ExprConfig`].
///
/// Without an explicit registry, `build` creates a private one at the
/// configured stats level (`Level0` unless set).
#[derive(Default)]
pub struct ExprConfigBuilder {
    metrics: Option<SharedMetricsRegistry>,
    stats_level: StatsLevel,
}

impl ExprConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use an existing registry. Overrides `stats_level`.
    #[must_use]
    pub fn metrics(mut self, registry: SharedMetricsRegistry) -> Self {
        self.metrics = Some(registry);
        self
    }

    /// Stats level of the private registry created by `build`.
    #[must_use]
    pub fn stats_level(mut self, level: StatsLevel) -> Self {
        self.stats_level = level;
        self
    }

    pub fn build(self) -> ExprConfig {
        let metrics = self
            .metrics
            .unwrap_or_else(|| SharedMetricsRegistry::with_level(self.stats_level));
        ExprConfig { metrics }
    }
}
