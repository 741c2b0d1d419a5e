//! Simulator configuration.
//!
//! Deliberately small and explicit: no environment variables, no files, no CLI
//! surface at this layer. A caller builds a [`SimulatorConfig`] in code and
//! hands it to [`crate::kernel::Simulator::run`].

/// Which network model a run should use.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum NetworkModelKind {
    /// Transfers complete instantaneously, regardless of size.
    Instant,
    /// Each worker has a fixed per-link bandwidth; transfers never share it.
    Simple { bandwidth: f64 },
    /// Bandwidth is fairly shared across all concurrently active transfers
    /// touching a worker, recomputed whenever the active set changes.
    MaxMinFair { bandwidth: f64 },
}

/// Configuration for a single simulation run.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimulatorConfig {
    /// Whether to record a trace journal ([`crate::trace::TraceEvent`]) during the run.
    pub trace: bool,
    /// The network model to simulate transfers with.
    pub network_model: NetworkModelKind,
    /// Whether `DlsScheduler` should use its extended selection rule.
    pub extended_selection: bool,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            trace: false,
            network_model: NetworkModelKind::Instant,
            extended_selection: false,
        }
    }
}

impl SimulatorConfig {
    /// Start building a configuration from defaults (no trace, instant network).
    #[must_use]
    pub fn builder() -> SimulatorConfigBuilder {
        SimulatorConfigBuilder::default()
    }
}

/// Fluent builder for [`SimulatorConfig`].
#[derive(Clone, Copy, Debug, Default)]
#[must_use]
pub struct SimulatorConfigBuilder {
    inner: OptionalConfig,
}

#[derive(Clone, Copy, Debug, Default)]
struct OptionalConfig {
    trace: bool,
    network_model: Option<NetworkModelKind>,
    extended_selection: bool,
}

impl SimulatorConfigBuilder {
    /// Enable the trace journal.
    pub fn with_trace(mut self, trace: bool) -> Self {
        self.inner.trace = trace;
        self
    }

    /// Select the network model to simulate with.
    pub fn with_network_model(mut self, model: NetworkModelKind) -> Self {
        self.inner.network_model = Some(model);
        self
    }

    /// Enable `DlsScheduler`'s extended selection rule.
    pub fn with_extended_selection(mut self, enabled: bool) -> Self {
        self.inner.extended_selection = enabled;
        self
    }

    /// Finish building the configuration.
    pub fn build(self) -> SimulatorConfig {
        SimulatorConfig {
            trace: self.inner.trace,
            network_model: self
                .inner
                .network_model
                .unwrap_or(NetworkModelKind::Instant),
            extended_selection: self.inner.extended_selection,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_instant_network_and_no_trace() {
        let cfg = SimulatorConfig::default();
        assert!(!cfg.trace);
        assert_eq!(cfg.network_model, NetworkModelKind::Instant);
    }

    #[test]
    fn builder_overrides_defaults() {
        let cfg = SimulatorConfig::builder()
            .with_trace(true)
            .with_network_model(NetworkModelKind::Simple { bandwidth: 100.0 })
            .with_extended_selection(true)
            .build();
        assert!(cfg.trace);
        assert!(cfg.extended_selection);
        assert_eq!(
            cfg.network_model,
            NetworkModelKind::Simple { bandwidth: 100.0 }
        );
    }
}
