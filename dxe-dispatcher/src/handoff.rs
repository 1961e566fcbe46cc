//! PEI to DXE handoff
//!
//! PEI dispatches its modules against the PPI database until nothing more can
//! run. Control only passes to DXE once the DXE IPL PPI has been installed;
//! without it there is nobody to load the DXE core and boot stops.

use alloc::vec::Vec;

use dxe_api::error::{self, Result};
use dxe_api::guid::DXE_IPL_PPI;
use dxe_api::{dxe_error, dxe_info, Error, ProtocolLookup};
use dxe_depex::DepexPhase;

use crate::dispatcher::Dispatcher;
use crate::report::{DispatchSummary, UndispatchedDriver};

/// Outcome of both boot phases
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BootReport {
    /// PEI dispatch counts; zero if no module ran
    pub pei: DispatchSummary,
    /// DXE dispatch counts
    pub dxe: DispatchSummary,
    /// PEI modules left behind
    pub pei_undispatched: Vec<UndispatchedDriver>,
    /// DXE drivers left behind
    pub dxe_undispatched: Vec<UndispatchedDriver>,
}

impl BootReport {
    /// Whether every discovered module and driver ran
    pub fn is_complete(&self) -> bool {
        self.pei_undispatched.is_empty() && self.dxe_undispatched.is_empty()
    }
}

/// Run PEI dispatch, hand off, then run DXE dispatch
///
/// The PEI dispatcher's database serves as the PPI database. Fails with
/// `InvalidParameter` if the dispatchers are configured for the wrong phases,
/// `NotFound` if PEI never installs the DXE IPL PPI, and otherwise with
/// whatever DXE dispatch returns.
pub fn run_boot_phases(pei: &mut Dispatcher<'_>, dxe: &mut Dispatcher<'_>) -> Result<BootReport> {
    validate_phases(pei, dxe)?;

    let pei_summary = match pei.dispatch() {
        Ok(summary) => summary,
        Err(Error::NotFound(_)) => DispatchSummary::default(),
        Err(err) => return Err(err),
    };

    if !pei.database().is_installed(&DXE_IPL_PPI) {
        dxe_error!("DXE IPL PPI not installed, cannot leave PEI");
        return Err(error::not_found("DXE IPL PPI"));
    }
    dxe_info!("Handing off from PEI to DXE");

    let dxe_summary = dxe.dispatch()?;

    Ok(BootReport {
        pei: pei_summary,
        dxe: dxe_summary,
        pei_undispatched: pei.undispatched(),
        dxe_undispatched: dxe.undispatched(),
    })
}

fn validate_phases(pei: &Dispatcher<'_>, dxe: &Dispatcher<'_>) -> Result<()> {
    if pei.config().phase() != DepexPhase::Pei {
        return Err(error::invalid_parameter("PEI dispatcher not configured for PEI"));
    }
    if dxe.config().phase() != DepexPhase::Dxe {
        return Err(error::invalid_parameter("DXE dispatcher not configured for DXE"));
    }
    Ok(())
}
