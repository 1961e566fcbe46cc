//! Dependency expression opcodes
//!
//! Opcodes are single bytes. PUSH, BEFORE, AFTER and REPLACE_TRUE are followed
//! by a 16-byte GUID operand; every other opcode stands alone. The values are
//! fixed by the PI specification and must match what build tools emit.

use core::fmt;

use dxe_api::guid::guid_from_slice;
use dxe_api::{Guid, GUID_SIZE};

use crate::error::DepexError;

/// Schedule this driver immediately before the named driver
pub const BEFORE: u8 = 0x00;
/// Schedule this driver immediately after the named driver
pub const AFTER: u8 = 0x01;
/// Push whether a protocol is installed
pub const PUSH: u8 = 0x02;
/// Logical AND of the two top values
pub const AND: u8 = 0x03;
/// Logical OR of the two top values
pub const OR: u8 = 0x04;
/// Logical NOT of the top value
pub const NOT: u8 = 0x05;
/// Push true
pub const TRUE: u8 = 0x06;
/// Push false
pub const FALSE: u8 = 0x07;
/// Pop the result and stop
pub const END: u8 = 0x08;
/// Schedule on request
pub const SOR: u8 = 0x09;
/// PUSH already known to be satisfied; never emitted by build tools
pub const REPLACE_TRUE: u8 = 0xff;

/// A decoded instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    /// BEFORE with the referenced driver's file name
    Before(Guid),
    /// AFTER with the referenced driver's file name
    After(Guid),
    /// PUSH with the protocol to look up
    Push(Guid),
    /// AND
    And,
    /// OR
    Or,
    /// NOT
    Not,
    /// TRUE
    True,
    /// FALSE
    False,
    /// END
    End,
    /// SOR
    Sor,
    /// REPLACE_TRUE with the operand of the PUSH it replaced
    ReplaceTrue(Guid),
}

impl Opcode {
    /// Decode the instruction starting at `offset`
    ///
    /// Never reads outside `expression`: an opcode byte or operand that would
    /// cross the end is reported as [`DepexError::Truncated`].
    pub fn decode(expression: &[u8], offset: usize) -> Result<Self, DepexError> {
        let byte = *expression
            .get(offset)
            .ok_or(DepexError::Truncated { offset })?;

        let operand = || {
            let start = offset + 1;
            expression
                .get(start..start + GUID_SIZE)
                .and_then(guid_from_slice)
                .ok_or(DepexError::Truncated { offset })
        };

        let opcode = match byte {
            BEFORE => Opcode::Before(operand()?),
            AFTER => Opcode::After(operand()?),
            PUSH => Opcode::Push(operand()?),
            AND => Opcode::And,
            OR => Opcode::Or,
            NOT => Opcode::Not,
            TRUE => Opcode::True,
            FALSE => Opcode::False,
            END => Opcode::End,
            SOR => Opcode::Sor,
            REPLACE_TRUE => Opcode::ReplaceTrue(operand()?),
            opcode => return Err(DepexError::InvalidOpcode { offset, opcode }),
        };
        Ok(opcode)
    }

    /// The opcode byte
    pub fn byte(&self) -> u8 {
        match self {
            Opcode::Before(_) => BEFORE,
            Opcode::After(_) => AFTER,
            Opcode::Push(_) => PUSH,
            Opcode::And => AND,
            Opcode::Or => OR,
            Opcode::Not => NOT,
            Opcode::True => TRUE,
            Opcode::False => FALSE,
            Opcode::End => END,
            Opcode::Sor => SOR,
            Opcode::ReplaceTrue(_) => REPLACE_TRUE,
        }
    }

    /// Encoded length including the operand
    pub fn encoded_len(&self) -> usize {
        match self {
            Opcode::Before(_) | Opcode::After(_) | Opcode::Push(_) | Opcode::ReplaceTrue(_) => {
                1 + GUID_SIZE
            }
            _ => 1,
        }
    }

    /// Whether this is one of the scheduling directives (SOR, BEFORE, AFTER)
    pub fn is_directive(&self) -> bool {
        matches!(self, Opcode::Sor | Opcode::Before(_) | Opcode::After(_))
    }

    /// Mnemonic as it appears in dumps
    pub fn mnemonic(&self) -> &'static str {
        match self {
            Opcode::Before(_) => "BEFORE",
            Opcode::After(_) => "AFTER",
            Opcode::Push(_) => "PUSH",
            Opcode::And => "AND",
            Opcode::Or => "OR",
            Opcode::Not => "NOT",
            Opcode::True => "TRUE",
            Opcode::False => "FALSE",
            Opcode::End => "END",
            Opcode::Sor => "SOR",
            Opcode::ReplaceTrue(_) => "REPLACE_TRUE",
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Opcode::Before(guid)
            | Opcode::After(guid)
            | Opcode::Push(guid)
            | Opcode::ReplaceTrue(guid) => write!(f, "{} {}", self.mnemonic(), guid),
            _ => f.write_str(self.mnemonic()),
        }
    }
}
