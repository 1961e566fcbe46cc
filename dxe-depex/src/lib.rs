//! DXE Depex - Dependency expression evaluation for driver dispatch
//!
//! Every driver may carry a dependency expression: postfix bytecode over the
//! installed protocols that must hold before the driver is allowed to run.
//! This crate decodes those expressions, classifies drivers by their first
//! opcode and evaluates them against a protocol registry.
//!
//! # Architecture
//!
//! - **Opcode**: Opcode values and instruction decoding
//! - **Expression**: The `Depex` container, instruction iterator and builder
//! - **Schedule**: One-time preprocessing into scheduling flags
//! - **Stack**: Reusable evaluation stack
//! - **Evaluator**: The stack machine and the `Readiness` outcome
//! - **Error**: Malformed-expression and stack-growth diagnostics
//!
//! # Usage
//!
//! ```rust
//! use dxe_api::guid::CPU_ARCH_PROTOCOL;
//! use dxe_depex::{DepexBuilder, DepexPhase, DriverDepex, Evaluator, Readiness};
//! use dxe_protocol_db::ProtocolDatabase;
//! use std::sync::Arc;
//!
//! let db = ProtocolDatabase::new();
//! let mut evaluator = Evaluator::default();
//! let depex = DepexBuilder::new().push(CPU_ARCH_PROTOCOL).end().build();
//! let mut driver = DriverDepex::new(Some(depex), DepexPhase::Dxe);
//!
//! assert_eq!(evaluator.evaluate(&mut driver, &db), Readiness::Pending);
//! db.install_protocol_interface(None, CPU_ARCH_PROTOCOL, Arc::new(()))?;
//! assert_eq!(evaluator.evaluate(&mut driver, &db), Readiness::Ready);
//! # Ok::<(), dxe_api::Error>(())
//! ```

#![no_std]

#[cfg(feature = "std")]
extern crate std;

extern crate alloc;

pub mod config;
pub mod error;
pub mod evaluator;
pub mod expression;
pub mod opcode;
pub mod schedule;
pub mod stack;

// Re-export commonly used types
pub use config::{DepexPhase, EvaluatorConfig};
pub use error::DepexError;
pub use evaluator::{Evaluator, FoundationCheck, Readiness};
pub use expression::{Depex, DepexBuilder, Opcodes};
pub use opcode::Opcode;
pub use schedule::{preprocess, DriverDepex, ScheduleFlags};
pub use stack::{DepexStack, DEPEX_STACK_SIZE_INCREMENT};

#[cfg(feature = "std")]
impl std::error::Error for DepexError {}
