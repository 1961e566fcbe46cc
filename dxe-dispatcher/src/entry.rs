//! Discovered driver records

use alloc::boxed::Box;
use alloc::string::String;
use core::fmt;

use dxe_api::{Error, Guid};
use dxe_depex::{DriverDepex, Readiness};

use crate::image::DriverImage;

/// Where a driver is in dispatch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriverState {
    /// Known, not yet on the scheduled queue
    Discovered,
    /// On the scheduled queue
    Scheduled,
    /// Load was refused by security policy; waits for `trust`
    Untrusted,
    /// Load failed for any other reason; never retried
    LoadFailed(Error),
    /// Entry point ran, successfully or not
    Started,
}

impl DriverState {
    /// Whether the driver has been taken out of dispatch for good
    pub fn is_initialized(&self) -> bool {
        matches!(self, DriverState::LoadFailed(_) | DriverState::Started)
    }
}

impl fmt::Display for DriverState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DriverState::Discovered => f.write_str("discovered"),
            DriverState::Scheduled => f.write_str("scheduled"),
            DriverState::Untrusted => f.write_str("untrusted"),
            DriverState::LoadFailed(err) => write!(f, "load failed ({})", err),
            DriverState::Started => f.write_str("started"),
        }
    }
}

/// One discovered driver
pub struct DriverEntry {
    pub(crate) name: String,
    pub(crate) file_name: Guid,
    pub(crate) depex: DriverDepex,
    pub(crate) image: Box<dyn DriverImage>,
    pub(crate) state: DriverState,
    pub(crate) last_readiness: Option<Readiness>,
    pub(crate) start_status: Option<Result<(), Error>>,
}

impl DriverEntry {
    pub(crate) fn new(
        name: String,
        file_name: Guid,
        depex: DriverDepex,
        image: Box<dyn DriverImage>,
    ) -> Self {
        Self {
            name,
            file_name,
            depex,
            image,
            state: DriverState::Discovered,
            last_readiness: None,
            start_status: None,
        }
    }

    /// Display name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// File name GUID; BEFORE/AFTER refer to drivers by it
    pub fn file_name(&self) -> Guid {
        self.file_name
    }

    /// Dependency state
    pub fn depex(&self) -> &DriverDepex {
        &self.depex
    }

    /// Dispatch state
    pub fn state(&self) -> &DriverState {
        &self.state
    }

    /// Outcome of the most recent evaluation, if it was ever evaluated
    pub fn last_readiness(&self) -> Option<Readiness> {
        self.last_readiness
    }

    /// What the entry point returned, once it has run
    pub fn start_status(&self) -> Option<&Result<(), Error>> {
        self.start_status.as_ref()
    }

    /// Whether BEFORE/AFTER processing may still pull this driver in
    pub(crate) fn is_waiting_on(&self, target: Guid) -> bool {
        self.state == DriverState::Discovered
            && self.depex.is_dependent()
            && self.depex.before_after() == Some(target)
    }
}

impl fmt::Debug for DriverEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DriverEntry")
            .field("name", &self.name)
            .field("file_name", &self.file_name)
            .field("depex", &self.depex)
            .field("state", &self.state)
            .field("last_readiness", &self.last_readiness)
            .finish_non_exhaustive()
    }
}
