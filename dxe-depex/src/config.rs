//! Evaluator configuration

use crate::stack::DEPEX_STACK_SIZE_INCREMENT;

/// Boot phase an expression belongs to
///
/// PEI expressions share the Boolean grammar but have no scheduling
/// directives: SOR, BEFORE and AFTER are rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DepexPhase {
    /// Pre-EFI initialization
    Pei,
    /// Driver execution environment
    #[default]
    Dxe,
}

impl DepexPhase {
    /// Whether SOR, BEFORE and AFTER are meaningful in this phase
    pub fn supports_directives(self) -> bool {
        matches!(self, DepexPhase::Dxe)
    }
}

/// Evaluator configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvaluatorConfig {
    /// Phase whose grammar is enforced
    pub phase: DepexPhase,
    /// Entries the evaluation stack grows by
    pub stack_increment: usize,
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        Self {
            phase: DepexPhase::Dxe,
            stack_increment: DEPEX_STACK_SIZE_INCREMENT,
        }
    }
}

impl EvaluatorConfig {
    /// Default configuration for a phase
    pub fn for_phase(phase: DepexPhase) -> Self {
        Self {
            phase,
            ..Self::default()
        }
    }
}
