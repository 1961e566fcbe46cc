//! Evaluation failures
//!
//! None of these reach the dispatch loop as a hard failure. Every variant but
//! `OutOfResources` describes a malformed expression that can never run;
//! `OutOfResources` is a failed stack growth and is retried on the next pass.

use alloc::format;
use core::fmt;

use dxe_api::Error;

/// Why an expression could not be evaluated. Offsets are byte offsets into
/// the expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepexError {
    /// An instruction or its operand extends past the declared size
    Truncated {
        /// Offset of the incomplete instruction
        offset: usize,
    },
    /// The expression ended without an END opcode
    MissingEnd {
        /// Offset one past the last instruction
        offset: usize,
    },
    /// AND, OR, NOT or END found too few values on the stack
    StackUnderflow {
        /// Offset of the instruction that underflowed
        offset: usize,
    },
    /// Byte is not a known opcode
    InvalidOpcode {
        /// Offset of the byte
        offset: usize,
        /// The offending byte
        opcode: u8,
    },
    /// SOR, BEFORE or AFTER somewhere other than the start of the expression
    MisplacedDirective {
        /// Offset of the directive
        offset: usize,
        /// The directive's opcode byte
        opcode: u8,
    },
    /// Scheduling directive in an expression for a phase without scheduling
    UnsupportedInPhase {
        /// Offset of the directive
        offset: usize,
        /// The directive's opcode byte
        opcode: u8,
    },
    /// The evaluation stack could not grow
    OutOfResources,
}

impl DepexError {
    /// Offset the error was detected at, if it is tied to one
    pub fn offset(&self) -> Option<usize> {
        match *self {
            DepexError::Truncated { offset }
            | DepexError::MissingEnd { offset }
            | DepexError::StackUnderflow { offset }
            | DepexError::InvalidOpcode { offset, .. }
            | DepexError::MisplacedDirective { offset, .. }
            | DepexError::UnsupportedInPhase { offset, .. } => Some(offset),
            DepexError::OutOfResources => None,
        }
    }
}

impl fmt::Display for DepexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DepexError::Truncated { offset } => {
                write!(f, "instruction at {:#x} truncated by expression size", offset)
            }
            DepexError::MissingEnd { offset } => write!(f, "no END before {:#x}", offset),
            DepexError::StackUnderflow { offset } => write!(f, "stack underflow at {:#x}", offset),
            DepexError::InvalidOpcode { offset, opcode } => {
                write!(f, "invalid opcode {:#04x} at {:#x}", opcode, offset)
            }
            DepexError::MisplacedDirective { offset, opcode } => {
                write!(f, "directive {:#04x} not allowed at {:#x}", opcode, offset)
            }
            DepexError::UnsupportedInPhase { offset, opcode } => {
                write!(f, "directive {:#04x} at {:#x} unsupported in this phase", opcode, offset)
            }
            DepexError::OutOfResources => write!(f, "evaluation stack exhausted"),
        }
    }
}

impl From<DepexError> for Error {
    fn from(err: DepexError) -> Self {
        match err {
            DepexError::OutOfResources => Error::OutOfResources,
            DepexError::UnsupportedInPhase { .. } => Error::Unsupported(format!("{}", err)),
            _ => Error::InvalidParameter(format!("malformed dependency expression: {}", err)),
        }
    }
}
