//! Capability lookup interface
//!
//! The dependency evaluator never talks to a concrete protocol database. It
//! only needs to know whether a capability is currently installed, so the
//! database is reached through [`ProtocolLookup`].

use crate::guid::Guid;

/// Read-only view of the capability registry.
///
/// Implementations must be monotonic for the lifetime of a dispatch phase:
/// once `is_installed` has returned `true` for a protocol it must keep doing
/// so. The evaluator caches positive answers per driver and never asks again.
pub trait ProtocolLookup {
    /// Returns `true` if at least one interface for `protocol` is installed.
    fn is_installed(&self, protocol: &Guid) -> bool;
}

impl<T: ProtocolLookup + ?Sized> ProtocolLookup for &T {
    fn is_installed(&self, protocol: &Guid) -> bool {
        (**self).is_installed(protocol)
    }
}

/// Returns `true` when every protocol in `protocols` is installed.
pub fn all_protocols_installed(lookup: &dyn ProtocolLookup, protocols: &[Guid]) -> bool {
    protocols.iter().all(|protocol| lookup.is_installed(protocol))
}
