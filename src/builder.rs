use crate::engine::{AllocationEngine, ConfigError, EngineConfig};
use crate::metrics::EngineMetrics;

/// Builder for `AllocationEngine`.
///
/// Provides a fluent API for configuring and creating an engine.
#[derive(Debug, Default)]
pub struct EngineBuilder {
    config: EngineConfig,
    metrics: Option<EngineMetrics>,
}

impl EngineBuilder {
    /// Creates a new builder with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Caps the number of cycles one detection pass may enumerate.
    pub fn max_cycles(mut self, limit: usize) -> Self {
        self.config.max_cycles = limit;
        self
    }

    /// Logs every detection pass, including ones that find nothing.
    pub fn log_detection(mut self, enabled: bool) -> Self {
        self.config.log_detection = enabled;
        self
    }

    /// Attaches a metrics sink. The caller keeps a clone to read from.
    pub fn with_metrics(mut self, metrics: EngineMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Modifies the configuration via a closure.
    pub fn configure<F>(mut self, f: F) -> Self
    where
        F: FnOnce(&mut EngineConfig),
    {
        f(&mut self.config);
        self
    }

    /// Builds the `AllocationEngine`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ZeroCycleLimit` if `max_cycles` is zero.
    pub fn build(self) -> Result<AllocationEngine, ConfigError> {
        if self.config.max_cycles == 0 {
            return Err(ConfigError::ZeroCycleLimit);
        }

        let mut engine = AllocationEngine::with_config(self.config);
        if let Some(metrics) = self.metrics {
            engine.set_metrics(metrics);
        }
        Ok(engine)
    }
}
