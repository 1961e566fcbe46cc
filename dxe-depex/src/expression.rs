//! Dependency expression container, decoding iterator and builder

use alloc::vec::Vec;
use core::fmt;

use dxe_api::Guid;

use crate::error::DepexError;
use crate::opcode::{self, Opcode};

/// A driver's dependency expression
///
/// Holds the raw bytes as read from the driver's metadata plus the declared
/// expression size. Only the first `declared_size` bytes are ever looked at,
/// even if the buffer is longer.
#[derive(Clone, PartialEq, Eq)]
pub struct Depex {
    bytes: Vec<u8>,
    declared_size: usize,
}

impl Depex {
    /// Wrap an expression whose declared size is its full length
    pub fn new(bytes: Vec<u8>) -> Self {
        let declared_size = bytes.len();
        Self {
            bytes,
            declared_size,
        }
    }

    /// Wrap an expression with an explicit declared size
    ///
    /// A size larger than the buffer is clamped to the buffer length.
    pub fn with_declared_size(bytes: Vec<u8>, declared_size: usize) -> Self {
        let declared_size = declared_size.min(bytes.len());
        Self {
            bytes,
            declared_size,
        }
    }

    /// The bytes inside the declared size
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.declared_size]
    }

    /// Declared size in bytes
    pub fn declared_size(&self) -> usize {
        self.declared_size
    }

    /// Whether the declared size is zero
    pub fn is_empty(&self) -> bool {
        self.declared_size == 0
    }

    /// First opcode byte, if any
    pub fn first_opcode(&self) -> Option<u8> {
        self.as_bytes().first().copied()
    }

    /// Iterate over the decoded instructions with their offsets
    pub fn opcodes(&self) -> Opcodes<'_> {
        Opcodes {
            expression: self.as_bytes(),
            offset: 0,
            failed: false,
        }
    }
}

impl fmt::Debug for Depex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Depex")
            .field("declared_size", &self.declared_size)
            .field("bytes", &self.as_bytes())
            .finish()
    }
}

/// One instruction per line, prefixed with its offset. Decoding stops at the
/// first malformed instruction, which is printed as an error line.
impl fmt::Display for Depex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (offset, decoded) in self.opcodes() {
            match decoded {
                Ok(opcode) => writeln!(f, "  {:04x}: {}", offset, opcode)?,
                Err(err) => writeln!(f, "  {:04x}: <{}>", offset, err)?,
            }
        }
        Ok(())
    }
}

/// Iterator over `(offset, instruction)` pairs of an expression
///
/// Yields every instruction up to the declared size, including anything after
/// END. A decode failure is yielded once and ends the iteration.
pub struct Opcodes<'a> {
    expression: &'a [u8],
    offset: usize,
    failed: bool,
}

impl Iterator for Opcodes<'_> {
    type Item = (usize, Result<Opcode, DepexError>);

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.offset >= self.expression.len() {
            return None;
        }

        let offset = self.offset;
        match Opcode::decode(self.expression, offset) {
            Ok(opcode) => {
                self.offset += opcode.encoded_len();
                Some((offset, Ok(opcode)))
            }
            Err(err) => {
                self.failed = true;
                Some((offset, Err(err)))
            }
        }
    }
}

/// Builds well-formed expressions
///
/// ```rust
/// use dxe_api::guid::{CPU_ARCH_PROTOCOL, TIMER_ARCH_PROTOCOL};
/// use dxe_depex::DepexBuilder;
///
/// let depex = DepexBuilder::new()
///     .push(CPU_ARCH_PROTOCOL)
///     .push(TIMER_ARCH_PROTOCOL)
///     .and()
///     .end()
///     .build();
/// assert_eq!(depex.declared_size(), 17 + 17 + 1 + 1);
/// ```
#[derive(Debug, Default, Clone)]
pub struct DepexBuilder {
    bytes: Vec<u8>,
}

impl DepexBuilder {
    /// Start an empty expression
    pub fn new() -> Self {
        Self::default()
    }

    fn with_operand(mut self, opcode: u8, guid: Guid) -> Self {
        self.bytes.push(opcode);
        self.bytes.extend_from_slice(&guid.to_bytes());
        self
    }

    fn op(mut self, opcode: u8) -> Self {
        self.bytes.push(opcode);
        self
    }

    /// BEFORE `driver`
    pub fn before(self, driver: Guid) -> Self {
        self.with_operand(opcode::BEFORE, driver)
    }

    /// AFTER `driver`
    pub fn after(self, driver: Guid) -> Self {
        self.with_operand(opcode::AFTER, driver)
    }

    /// SOR
    pub fn sor(self) -> Self {
        self.op(opcode::SOR)
    }

    /// PUSH `protocol`
    pub fn push(self, protocol: Guid) -> Self {
        self.with_operand(opcode::PUSH, protocol)
    }

    /// AND
    pub fn and(self) -> Self {
        self.op(opcode::AND)
    }

    /// OR
    pub fn or(self) -> Self {
        self.op(opcode::OR)
    }

    /// NOT
    pub fn not(self) -> Self {
        self.op(opcode::NOT)
    }

    /// TRUE or FALSE
    pub fn literal(self, value: bool) -> Self {
        self.op(if value { opcode::TRUE } else { opcode::FALSE })
    }

    /// END
    pub fn end(self) -> Self {
        self.op(opcode::END)
    }

    /// Raw byte, for producing deliberately malformed expressions
    pub fn raw(self, byte: u8) -> Self {
        self.op(byte)
    }

    /// Encoded bytes
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Finished expression
    pub fn build(self) -> Depex {
        Depex::new(self.bytes)
    }
}
