//! Capability identifiers
//!
//! Every capability a driver can publish or depend on is named by a 128-bit
//! GUID. Dependency expressions carry them as raw 16-byte operands in the
//! in-memory UEFI layout, which is exactly the byte order of [`Guid::to_bytes`].

use static_assertions::const_assert_eq;
pub use uefi_raw::Guid;
use uefi_raw::guid;

/// Size in bytes of a GUID operand inside a dependency expression.
pub const GUID_SIZE: usize = core::mem::size_of::<Guid>();

const_assert_eq!(GUID_SIZE, 16);

/// Reads a GUID operand from `bytes`, which must hold exactly [`GUID_SIZE`] bytes.
pub fn guid_from_slice(bytes: &[u8]) -> Option<Guid> {
    let raw: [u8; GUID_SIZE] = bytes.try_into().ok()?;
    Some(Guid::from_bytes(raw))
}

/// Security Architectural Protocol.
pub const SECURITY_ARCH_PROTOCOL: Guid = guid!("a46423e3-4617-49f1-b9ff-d1bfa9115839");
/// CPU Architectural Protocol.
pub const CPU_ARCH_PROTOCOL: Guid = guid!("26baccb1-6f42-11d4-bce7-0080c73c8881");
/// Metronome Architectural Protocol.
pub const METRONOME_ARCH_PROTOCOL: Guid = guid!("26baccb2-6f42-11d4-bce7-0080c73c8881");
/// Timer Architectural Protocol.
pub const TIMER_ARCH_PROTOCOL: Guid = guid!("26baccb3-6f42-11d4-bce7-0080c73c8881");
/// Boot Device Selection Architectural Protocol.
pub const BDS_ARCH_PROTOCOL: Guid = guid!("665e3ff6-46cc-11d4-9a38-0090273fc14d");
/// Watchdog Timer Architectural Protocol.
pub const WATCHDOG_TIMER_ARCH_PROTOCOL: Guid = guid!("665e3ff5-46cc-11d4-9a38-0090273fc14d");
/// Runtime Architectural Protocol.
pub const RUNTIME_ARCH_PROTOCOL: Guid = guid!("b7dfb4e1-052f-449f-87be-9818fc91b733");
/// Variable Architectural Protocol.
pub const VARIABLE_ARCH_PROTOCOL: Guid = guid!("1e5668e2-8481-11d4-bcf1-0080c73c8881");
/// Variable Write Architectural Protocol.
pub const VARIABLE_WRITE_ARCH_PROTOCOL: Guid = guid!("6441f818-6362-4e44-b570-7dba31dd2453");
/// Capsule Architectural Protocol.
pub const CAPSULE_ARCH_PROTOCOL: Guid = guid!("5053697e-2cbc-4819-90d9-0580deee5754");
/// Monotonic Counter Architectural Protocol.
pub const MONOTONIC_COUNTER_ARCH_PROTOCOL: Guid = guid!("1da97072-bddc-4b30-99f1-72a0b56fff2a");
/// Reset Architectural Protocol.
pub const RESET_ARCH_PROTOCOL: Guid = guid!("27cfac88-46cc-11d4-9a38-0090273fc14d");
/// Real Time Clock Architectural Protocol.
pub const REAL_TIME_CLOCK_ARCH_PROTOCOL: Guid = guid!("27cfac87-46cc-11d4-9a38-0090273fc14d");

/// DXE IPL PPI, the last PPI PEI needs before handing off to DXE.
pub const DXE_IPL_PPI: Guid = guid!("0ae8ce5d-e448-4437-a8d7-ebf5f194f731");

/// The architectural protocols that must all be present before a driver
/// without a dependency expression may run.
pub const ARCH_PROTOCOLS: [Guid; 13] = [
    SECURITY_ARCH_PROTOCOL,
    CPU_ARCH_PROTOCOL,
    METRONOME_ARCH_PROTOCOL,
    TIMER_ARCH_PROTOCOL,
    BDS_ARCH_PROTOCOL,
    WATCHDOG_TIMER_ARCH_PROTOCOL,
    RUNTIME_ARCH_PROTOCOL,
    VARIABLE_ARCH_PROTOCOL,
    VARIABLE_WRITE_ARCH_PROTOCOL,
    CAPSULE_ARCH_PROTOCOL,
    MONOTONIC_COUNTER_ARCH_PROTOCOL,
    RESET_ARCH_PROTOCOL,
    REAL_TIME_CLOCK_ARCH_PROTOCOL,
];
