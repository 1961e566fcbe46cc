//! Driver scheduling classification
//!
//! Preprocessing looks at nothing but the first opcode of a driver's
//! expression and decides, once, how the dispatcher has to treat the driver:
//!
//! - SOR: `UNREQUESTED`, never auto-scheduled until promoted by a request
//! - anything else (or no expression at all): `DEPENDENT`
//! - BEFORE/AFTER additionally set `BEFORE`/`AFTER` and record the named
//!   driver; such drivers are placed by the dispatcher, not evaluated.

use bitflags::bitflags;
use dxe_api::{dxe_trace, Guid};
use hashbrown::HashSet;

use crate::config::DepexPhase;
use crate::expression::Depex;
use crate::opcode::{Opcode, AFTER, BEFORE, SOR};

bitflags! {
    /// Scheduling flags set by preprocessing
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ScheduleFlags: u8 {
        /// Boolean evaluation decides when the driver runs
        const DEPENDENT = 1 << 0;
        /// Schedule on request; waits for an explicit promotion
        const UNREQUESTED = 1 << 1;
        /// Runs immediately before the driver in `before_after`
        const BEFORE = 1 << 2;
        /// Runs immediately after the driver in `before_after`
        const AFTER = 1 << 3;
    }
}

impl ScheduleFlags {
    /// Whether BEFORE or AFTER is set
    pub fn is_ordered(self) -> bool {
        self.intersects(ScheduleFlags::BEFORE | ScheduleFlags::AFTER)
    }
}

/// Classify an expression by its first opcode
///
/// Returns the flags and, for BEFORE/AFTER, the referenced driver. A BEFORE or
/// AFTER whose operand does not fit inside the declared size is not treated as
/// a directive; the expression then falls through to `DEPENDENT` and fails
/// evaluation as truncated.
pub fn preprocess(expression: Option<&Depex>, phase: DepexPhase) -> (ScheduleFlags, Option<Guid>) {
    let Some(expression) = expression else {
        return (ScheduleFlags::DEPENDENT, None);
    };

    let first = expression.first_opcode();
    if !phase.supports_directives() {
        return (ScheduleFlags::DEPENDENT, None);
    }

    let mut flags = if first == Some(SOR) {
        ScheduleFlags::UNREQUESTED
    } else {
        ScheduleFlags::DEPENDENT
    };

    let mut before_after = None;
    if matches!(first, Some(BEFORE) | Some(AFTER)) {
        match Opcode::decode(expression.as_bytes(), 0) {
            Ok(Opcode::Before(driver)) => {
                flags |= ScheduleFlags::BEFORE;
                before_after = Some(driver);
            }
            Ok(Opcode::After(driver)) => {
                flags |= ScheduleFlags::AFTER;
                before_after = Some(driver);
            }
            _ => {}
        }
    }

    (flags, before_after)
}

/// The dependency state of one discovered driver
///
/// Owns the expression, the flags preprocessing assigned to it and the set of
/// protocols already seen installed while evaluating it. Preprocessing runs
/// exactly once, when the record is created.
#[derive(Debug, Clone)]
pub struct DriverDepex {
    expression: Option<Depex>,
    flags: ScheduleFlags,
    before_after: Option<Guid>,
    satisfied: HashSet<Guid>,
}

impl DriverDepex {
    /// Record for a driver, preprocessing its expression
    pub fn new(expression: Option<Depex>, phase: DepexPhase) -> Self {
        let (flags, before_after) = preprocess(expression.as_ref(), phase);
        dxe_trace!(
            "Preprocess DEPEX: flags={:?} before_after={:?}",
            flags,
            before_after
        );
        Self {
            expression,
            flags,
            before_after,
            satisfied: HashSet::new(),
        }
    }

    /// Record for a driver that declares no dependency expression
    pub fn without_expression() -> Self {
        Self::new(None, DepexPhase::Dxe)
    }

    /// The expression, if the driver has one
    pub fn expression(&self) -> Option<&Depex> {
        self.expression.as_ref()
    }

    /// Scheduling flags
    pub fn flags(&self) -> ScheduleFlags {
        self.flags
    }

    /// Whether Boolean evaluation applies
    pub fn is_dependent(&self) -> bool {
        self.flags.contains(ScheduleFlags::DEPENDENT)
    }

    /// Whether the driver waits for a schedule request
    pub fn is_unrequested(&self) -> bool {
        self.flags.contains(ScheduleFlags::UNREQUESTED)
    }

    /// Whether the driver is ordered BEFORE another
    pub fn is_before(&self) -> bool {
        self.flags.contains(ScheduleFlags::BEFORE)
    }

    /// Whether the driver is ordered AFTER another
    pub fn is_after(&self) -> bool {
        self.flags.contains(ScheduleFlags::AFTER)
    }

    /// The driver named by BEFORE/AFTER
    pub fn before_after(&self) -> Option<Guid> {
        self.before_after
    }

    /// Protocols found installed during earlier evaluations
    pub fn satisfied(&self) -> &HashSet<Guid> {
        &self.satisfied
    }

    /// Promote a schedule-on-request driver
    ///
    /// Clears `UNREQUESTED` and sets `DEPENDENT`. Returns `false`, changing
    /// nothing, if the driver was not waiting for a request.
    pub fn promote(&mut self) -> bool {
        if !self.is_unrequested() {
            return false;
        }
        self.flags.remove(ScheduleFlags::UNREQUESTED);
        self.flags.insert(ScheduleFlags::DEPENDENT);
        true
    }

    pub(crate) fn evaluation_parts(&mut self) -> (Option<&[u8]>, &mut HashSet<Guid>) {
        (
            self.expression.as_ref().map(Depex::as_bytes),
            &mut self.satisfied,
        )
    }
}
