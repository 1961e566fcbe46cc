//! Dispatch summaries and never-dispatched diagnostics

use alloc::string::String;
use core::fmt;

use dxe_api::{Error, Guid};
use dxe_depex::DepexError;

/// Counts for one `dispatch` call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    /// Passes over the discovered list
    pub passes: usize,
    /// Drivers whose entry point ran
    pub started: usize,
    /// Drivers whose entry point returned an error
    pub start_failures: usize,
    /// Drivers refused by security policy
    pub untrusted: usize,
    /// Drivers that failed to load for other reasons
    pub load_failures: usize,
}

/// Why a driver has not run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UndispatchedReason {
    /// Its expression is well formed but not satisfied
    Pending,
    /// The evaluation stack could not grow on the last pass
    OutOfResources,
    /// Its expression can never be satisfied
    Malformed(DepexError),
    /// BEFORE/AFTER a driver that has not been scheduled
    Ordered(Guid),
    /// SOR driver that nobody requested
    Unrequested,
    /// Refused by security policy and not trusted since
    Untrusted,
    /// Load failed
    LoadFailed(Error),
    /// On the scheduled queue when dispatch stopped
    Scheduled,
}

impl UndispatchedReason {
    /// Whether the driver could still run in a later dispatch
    pub fn may_resolve(&self) -> bool {
        !matches!(
            self,
            UndispatchedReason::Malformed(_) | UndispatchedReason::LoadFailed(_)
        )
    }
}

impl fmt::Display for UndispatchedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UndispatchedReason::Pending => f.write_str("dependencies not satisfied"),
            UndispatchedReason::OutOfResources => f.write_str("evaluation stack exhausted"),
            UndispatchedReason::Malformed(err) => write!(f, "malformed dependency expression: {}", err),
            UndispatchedReason::Ordered(target) => write!(f, "ordered against undispatched {}", target),
            UndispatchedReason::Unrequested => f.write_str("schedule on request, not requested"),
            UndispatchedReason::Untrusted => f.write_str("untrusted"),
            UndispatchedReason::LoadFailed(err) => write!(f, "load failed: {}", err),
            UndispatchedReason::Scheduled => f.write_str("scheduled but not started"),
        }
    }
}

/// A discovered driver that has not run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UndispatchedDriver {
    /// Display name
    pub name: String,
    /// File name GUID
    pub file_name: Guid,
    /// Why it has not run
    pub reason: UndispatchedReason,
}

impl fmt::Display for UndispatchedDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.name, self.file_name, self.reason)
    }
}
