//! Dependency expression evaluator
//!
//! The evaluator is a postfix stack machine. It owns one [`DepexStack`] that it
//! reuses for every evaluation; the stack is reset before and after each run,
//! so its depth is zero whenever `evaluate` is not executing.
//!
//! Protocols found installed are recorded in the driver's own memo set and are
//! not looked up again on later passes. This relies on protocols never being
//! uninstalled while drivers are being dispatched.

use alloc::boxed::Box;
use core::fmt;

use dxe_api::guid::ARCH_PROTOCOLS;
use dxe_api::{all_protocols_installed, dxe_debug, dxe_trace, dxe_warn, Guid, ProtocolLookup};
use hashbrown::HashSet;

use crate::config::{DepexPhase, EvaluatorConfig};
use crate::error::DepexError;
use crate::opcode::Opcode;
use crate::schedule::DriverDepex;
use crate::stack::DepexStack;

/// Outcome of evaluating one driver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    /// The driver may run now
    Ready,
    /// Well formed, but not satisfied yet
    Pending,
    /// BEFORE/AFTER driver; placed by the dispatcher instead
    Ordered,
    /// The evaluation stack could not grow; retried on the next pass
    OutOfResources,
    /// Can never be satisfied
    Malformed(DepexError),
}

impl Readiness {
    /// Whether the driver may run now
    pub fn is_ready(&self) -> bool {
        matches!(self, Readiness::Ready)
    }

    /// Whether the expression is malformed
    pub fn is_malformed(&self) -> bool {
        matches!(self, Readiness::Malformed(_))
    }
}

impl fmt::Display for Readiness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Readiness::Ready => f.write_str("ready"),
            Readiness::Pending => f.write_str("pending"),
            Readiness::Ordered => f.write_str("ordered"),
            Readiness::OutOfResources => f.write_str("out of resources"),
            Readiness::Malformed(err) => write!(f, "malformed ({})", err),
        }
    }
}

/// Readiness check for drivers that declare no expression
pub type FoundationCheck = Box<dyn Fn(&dyn ProtocolLookup) -> bool>;

/// Decides whether drivers may run
pub struct Evaluator {
    config: EvaluatorConfig,
    stack: DepexStack,
    foundation: FoundationCheck,
}

impl Evaluator {
    /// Create an evaluator with the phase's default foundation check
    ///
    /// In DXE a driver without an expression waits for every architectural
    /// protocol. In PEI it is always ready.
    pub fn new(config: EvaluatorConfig) -> Self {
        let foundation: FoundationCheck = match config.phase {
            DepexPhase::Dxe => {
                Box::new(|registry: &dyn ProtocolLookup| {
                    all_protocols_installed(registry, &ARCH_PROTOCOLS)
                })
            }
            DepexPhase::Pei => Box::new(|_: &dyn ProtocolLookup| true),
        };
        Self::with_foundation_check(config, foundation)
    }

    /// Create an evaluator with a custom check for expression-less drivers
    pub fn with_foundation_check(config: EvaluatorConfig, foundation: FoundationCheck) -> Self {
        Self {
            config,
            stack: DepexStack::with_increment(config.stack_increment),
            foundation,
        }
    }

    /// Configuration in use
    pub fn config(&self) -> &EvaluatorConfig {
        &self.config
    }

    /// Evaluate a driver against the installed protocols
    ///
    /// BEFORE/AFTER drivers are `Ordered` regardless of their expression.
    /// Never panics and never reads past the declared expression size.
    pub fn evaluate(&mut self, driver: &mut DriverDepex, registry: &dyn ProtocolLookup) -> Readiness {
        if driver.flags().is_ordered() {
            return Readiness::Ordered;
        }

        let (expression, satisfied) = driver.evaluation_parts();
        let Some(expression) = expression else {
            return if (self.foundation)(registry) {
                Readiness::Ready
            } else {
                Readiness::Pending
            };
        };

        self.stack.reset();
        let outcome = self.execute(expression, satisfied, registry);
        self.stack.reset();

        let readiness = match outcome {
            Ok(true) => Readiness::Ready,
            Ok(false) => Readiness::Pending,
            Err(DepexError::OutOfResources) => {
                dxe_warn!("DEPEX stack exhausted, retrying next pass");
                Readiness::OutOfResources
            }
            Err(err) => {
                dxe_debug!("Malformed DEPEX: {}", err);
                Readiness::Malformed(err)
            }
        };
        dxe_trace!("DEPEX evaluated: {}", readiness);
        readiness
    }

    /// Whether the driver may run now
    pub fn is_schedulable(&mut self, driver: &mut DriverDepex, registry: &dyn ProtocolLookup) -> bool {
        self.evaluate(driver, registry).is_ready()
    }

    /// Current stack depth; zero between evaluations
    pub fn stack_depth(&self) -> usize {
        self.stack.len()
    }

    /// Allocated stack capacity in entries
    pub fn stack_capacity(&self) -> usize {
        self.stack.capacity()
    }

    fn execute(
        &mut self,
        expression: &[u8],
        satisfied: &mut HashSet<Guid>,
        registry: &dyn ProtocolLookup,
    ) -> Result<bool, DepexError> {
        let directives = self.config.phase.supports_directives();
        let mut offset = 0;

        loop {
            if offset >= expression.len() {
                return Err(DepexError::MissingEnd { offset });
            }

            let opcode = Opcode::decode(expression, offset)?;
            match opcode {
                _ if opcode.is_directive() && !directives => {
                    return Err(DepexError::UnsupportedInPhase {
                        offset,
                        opcode: opcode.byte(),
                    });
                }
                // Already consumed by preprocessing.
                Opcode::Sor if offset == 0 => {}
                Opcode::Sor | Opcode::Before(_) | Opcode::After(_) => {
                    return Err(DepexError::MisplacedDirective {
                        offset,
                        opcode: opcode.byte(),
                    });
                }
                Opcode::Push(protocol) => {
                    let installed = satisfied.contains(&protocol) || registry.is_installed(&protocol);
                    if installed {
                        satisfied.insert(protocol);
                    }
                    self.stack.push(installed)?;
                }
                Opcode::ReplaceTrue(_) | Opcode::True => self.stack.push(true)?,
                Opcode::False => self.stack.push(false)?,
                Opcode::And => {
                    let (lhs, rhs) = (self.pop(offset)?, self.pop(offset)?);
                    self.stack.push(lhs && rhs)?;
                }
                Opcode::Or => {
                    let (lhs, rhs) = (self.pop(offset)?, self.pop(offset)?);
                    self.stack.push(lhs || rhs)?;
                }
                Opcode::Not => {
                    let value = self.pop(offset)?;
                    self.stack.push(!value)?;
                }
                Opcode::End => return self.pop(offset),
            }

            offset += opcode.encoded_len();
        }
    }

    fn pop(&mut self, offset: usize) -> Result<bool, DepexError> {
        self.stack.pop().ok_or(DepexError::StackUnderflow { offset })
    }
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new(EvaluatorConfig::default())
    }
}

impl fmt::Debug for Evaluator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Evaluator")
            .field("config", &self.config)
            .field("stack", &self.stack)
            .finish_non_exhaustive()
    }
}
