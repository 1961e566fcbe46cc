//! Dispatcher configuration

use dxe_depex::{DepexPhase, EvaluatorConfig};

/// Dispatcher configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatcherConfig {
    /// Evaluator settings, including the phase
    pub evaluator: EvaluatorConfig,
    /// Upper bound on dispatch passes; `None` runs to the fixed point
    pub max_passes: Option<usize>,
    /// Log every driver left undispatched when `dispatch` returns
    pub report_undispatched: bool,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            evaluator: EvaluatorConfig::default(),
            max_passes: None,
            report_undispatched: true,
        }
    }
}

impl DispatcherConfig {
    /// Default configuration for a phase
    pub fn for_phase(phase: DepexPhase) -> Self {
        Self {
            evaluator: EvaluatorConfig::for_phase(phase),
            ..Self::default()
        }
    }

    /// Phase this dispatcher runs in
    pub fn phase(&self) -> DepexPhase {
        self.evaluator.phase
    }
}
