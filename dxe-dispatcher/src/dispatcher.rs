//! Driver dispatch loop
//!
//! Drivers are discovered once, preprocessed once and then considered on
//! every pass until they run. A pass first starts everything on the scheduled
//! queue, in queue order, and then scans the discovered list for drivers whose
//! expressions have become satisfied. Dispatch stops at the first pass whose
//! scan schedules nothing.
//!
//! BEFORE/AFTER drivers are never scheduled on their own. When their target is
//! scheduled they are queued directly in front of or behind it.

use alloc::collections::VecDeque;
use alloc::format;
use alloc::string::ToString;
use alloc::vec::Vec;

use dxe_api::error::{self, Result};
use dxe_api::{dxe_debug, dxe_error, dxe_info, dxe_warn, Error, Guid};
use dxe_depex::{Depex, DriverDepex, Evaluator, FoundationCheck, Readiness};
use dxe_protocol_db::ProtocolDatabase;
use hashbrown::HashMap;

use crate::config::DispatcherConfig;
use crate::entry::{DriverEntry, DriverState};
use crate::image::DriverImage;
use crate::report::{DispatchSummary, UndispatchedDriver, UndispatchedReason};

/// Which side of its target an ordered driver goes on
#[derive(Clone, Copy)]
enum Side {
    Before,
    After,
}

/// Dependency-driven driver dispatcher
pub struct Dispatcher<'db> {
    config: DispatcherConfig,
    evaluator: Evaluator,
    db: &'db ProtocolDatabase,
    /// Discovered drivers, in discovery order
    drivers: Vec<DriverEntry>,
    /// Index into `drivers` by file name
    by_file_name: HashMap<Guid, usize>,
    /// Indices into `drivers`, in start order
    scheduled: VecDeque<usize>,
}

impl<'db> Dispatcher<'db> {
    /// Create a dispatcher over `db`
    pub fn new(db: &'db ProtocolDatabase, config: DispatcherConfig) -> Self {
        Self::with_evaluator(db, config, Evaluator::new(config.evaluator))
    }

    /// Create a dispatcher with a custom readiness check for drivers that
    /// declare no dependency expression
    pub fn with_foundation_check(
        db: &'db ProtocolDatabase,
        config: DispatcherConfig,
        foundation: FoundationCheck,
    ) -> Self {
        let evaluator = Evaluator::with_foundation_check(config.evaluator, foundation);
        Self::with_evaluator(db, config, evaluator)
    }

    fn with_evaluator(db: &'db ProtocolDatabase, config: DispatcherConfig, evaluator: Evaluator) -> Self {
        Self {
            config,
            evaluator,
            db,
            drivers: Vec::new(),
            by_file_name: HashMap::new(),
            scheduled: VecDeque::new(),
        }
    }

    /// Configuration in use
    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    /// The database drivers are evaluated against and install into
    pub fn database(&self) -> &'db ProtocolDatabase {
        self.db
    }

    /// Discovered drivers, in discovery order
    pub fn drivers(&self) -> &[DriverEntry] {
        &self.drivers
    }

    /// Look up a driver by file name
    pub fn driver(&self, file_name: &Guid) -> Option<&DriverEntry> {
        self.by_file_name
            .get(file_name)
            .and_then(|&index| self.drivers.get(index))
    }

    /// Add a discovered driver
    ///
    /// The dependency expression is preprocessed here, once. A file name that
    /// was already discovered is rejected with `AlreadyStarted`.
    pub fn add_driver<I>(
        &mut self,
        name: &str,
        file_name: Guid,
        depex: Option<Depex>,
        image: I,
    ) -> Result<()>
    where
        I: DriverImage + 'static,
    {
        if self.by_file_name.contains_key(&file_name) {
            return Err(error::already_started(&format!(
                "driver {} already discovered",
                file_name
            )));
        }

        let depex = DriverDepex::new(depex, self.config.phase());
        dxe_debug!("Discovered {} ({}) flags={:?}", name, file_name, depex.flags());

        self.by_file_name.insert(file_name, self.drivers.len());
        self.drivers.push(DriverEntry::new(
            name.to_string(),
            file_name,
            depex,
            alloc::boxed::Box::new(image),
        ));
        Ok(())
    }

    /// Run drivers until no more become ready
    ///
    /// Returns `NotFound` if no driver was started by this call and `Aborted`
    /// if `max_passes` is reached first.
    pub fn dispatch(&mut self) -> Result<DispatchSummary> {
        let mut summary = DispatchSummary::default();

        loop {
            if let Some(max) = self.config.max_passes {
                if summary.passes >= max {
                    dxe_error!("Dispatch aborted after {} passes", summary.passes);
                    self.finish();
                    return Err(error::aborted(&format!(
                        "dispatch did not settle within {} passes",
                        max
                    )));
                }
            }
            summary.passes += 1;

            self.start_scheduled(&mut summary);
            if !self.schedule_ready_drivers() {
                break;
            }
        }

        self.finish();
        if summary.started == 0 {
            return Err(error::not_found("no driver was dispatched"));
        }
        dxe_info!(
            "Dispatch complete: {} started in {} passes",
            summary.started,
            summary.passes
        );
        Ok(summary)
    }

    /// Promote a schedule-on-request driver so the next dispatch evaluates it
    ///
    /// `NotFound` if the driver is unknown or was not waiting for a request.
    pub fn schedule(&mut self, file_name: &Guid) -> Result<()> {
        let entry = self.entry_mut(file_name)?;
        if entry.state == DriverState::Discovered && entry.depex.promote() {
            dxe_info!("Schedule requested for {}", entry.name);
            return Ok(());
        }
        Err(error::not_found(&format!(
            "driver {} is not schedule on request",
            file_name
        )))
    }

    /// Move an untrusted driver back onto the scheduled queue
    ///
    /// `NotFound` if the driver is unknown or not untrusted.
    pub fn trust(&mut self, file_name: &Guid) -> Result<()> {
        let index = self.index_of(file_name)?;
        let entry = self.entry_at(index)?;
        if entry.state != DriverState::Untrusted {
            return Err(error::not_found(&format!("driver {} is not untrusted", file_name)));
        }
        dxe_info!("Trusting {}", entry.name);
        entry.state = DriverState::Scheduled;
        self.scheduled.push_back(index);
        Ok(())
    }

    /// Every discovered driver that has not run, with the reason
    pub fn undispatched(&self) -> Vec<UndispatchedDriver> {
        self.drivers
            .iter()
            .filter_map(|entry| {
                let reason = match &entry.state {
                    DriverState::Started => return None,
                    DriverState::Scheduled => UndispatchedReason::Scheduled,
                    DriverState::Untrusted => UndispatchedReason::Untrusted,
                    DriverState::LoadFailed(err) => UndispatchedReason::LoadFailed(err.clone()),
                    DriverState::Discovered => Self::discovered_reason(entry),
                };
                Some(UndispatchedDriver {
                    name: entry.name.clone(),
                    file_name: entry.file_name,
                    reason,
                })
            })
            .collect()
    }

    /// Log every undispatched driver and return them
    pub fn report(&self) -> Vec<UndispatchedDriver> {
        let undispatched = self.undispatched();
        for driver in &undispatched {
            dxe_warn!("Driver not dispatched: {}", driver);
        }
        undispatched
    }

    fn discovered_reason(entry: &DriverEntry) -> UndispatchedReason {
        if entry.depex.is_unrequested() {
            return UndispatchedReason::Unrequested;
        }
        if let Some(target) = entry.depex.before_after() {
            return UndispatchedReason::Ordered(target);
        }
        match entry.last_readiness {
            Some(Readiness::Malformed(err)) => UndispatchedReason::Malformed(err),
            Some(Readiness::OutOfResources) => UndispatchedReason::OutOfResources,
            _ => UndispatchedReason::Pending,
        }
    }

    fn finish(&self) {
        if self.config.report_undispatched {
            self.report();
        }
    }

    fn entry_at(&mut self, index: usize) -> Result<&mut DriverEntry> {
        self.drivers
            .get_mut(index)
            .ok_or_else(|| error::not_found("driver index out of range"))
    }

    fn index_of(&self, file_name: &Guid) -> Result<usize> {
        self.by_file_name
            .get(file_name)
            .copied()
            .ok_or_else(|| error::not_found(&format!("driver {} not found", file_name)))
    }

    fn entry_mut(&mut self, file_name: &Guid) -> Result<&mut DriverEntry> {
        let index = self.index_of(file_name)?;
        self.entry_at(index)
    }

    /// Load and start everything on the scheduled queue, in order
    fn start_scheduled(&mut self, summary: &mut DispatchSummary) {
        while let Some(index) = self.scheduled.pop_front() {
            let Some(entry) = self.drivers.get_mut(index) else {
                continue;
            };

            match entry.image.load() {
                Ok(()) => {}
                Err(Error::SecurityViolation(reason)) => {
                    dxe_warn!("{} untrusted: {}", entry.name, reason);
                    entry.state = DriverState::Untrusted;
                    summary.untrusted += 1;
                    continue;
                }
                Err(err) => {
                    dxe_warn!("{} failed to load: {}", entry.name, err);
                    entry.state = DriverState::LoadFailed(err);
                    summary.load_failures += 1;
                    continue;
                }
            }

            dxe_info!("Starting {} ({})", entry.name, entry.file_name);
            entry.state = DriverState::Started;
            let status = entry.image.start(self.db);
            if let Err(err) = &status {
                dxe_warn!("{} returned {}", entry.name, err);
                summary.start_failures += 1;
            }
            entry.start_status = Some(status);
            summary.started += 1;
        }
    }

    /// Evaluate every waiting driver; returns whether any was scheduled
    fn schedule_ready_drivers(&mut self) -> bool {
        let mut scheduled_any = false;

        for index in 0..self.drivers.len() {
            let Some(entry) = self.drivers.get_mut(index) else {
                continue;
            };
            // SOR drivers stay out until promoted.
            if entry.state != DriverState::Discovered || !entry.depex.is_dependent() {
                continue;
            }

            let readiness = self.evaluator.evaluate(&mut entry.depex, self.db);
            if let Readiness::Malformed(err) = readiness {
                if !entry.last_readiness.is_some_and(|last| last.is_malformed()) {
                    dxe_warn!("{} has a malformed DEPEX: {}", entry.name, err);
                }
            }
            entry.last_readiness = Some(readiness);
            if readiness.is_ready() {
                self.insert_on_scheduled_queue(index);
                scheduled_any = true;
            }
        }

        scheduled_any
    }

    /// Queue a driver, surrounded by the drivers ordered BEFORE and AFTER it
    fn insert_on_scheduled_queue(&mut self, index: usize) {
        let Some(entry) = self.drivers.get_mut(index) else {
            return;
        };
        entry.state = DriverState::Scheduled;
        let target = entry.file_name;

        for before in self.ordered_against(target, Side::Before) {
            self.insert_on_scheduled_queue(before);
        }

        dxe_debug!("Queued {}", target);
        self.scheduled.push_back(index);

        for after in self.ordered_against(target, Side::After) {
            self.insert_on_scheduled_queue(after);
        }
    }

    fn ordered_against(&self, target: Guid, side: Side) -> Vec<usize> {
        self.drivers
            .iter()
            .enumerate()
            .filter(|(_, entry)| match side {
                Side::Before => entry.depex.is_before(),
                Side::After => entry.depex.is_after(),
            })
            .filter(|(_, entry)| entry.is_waiting_on(target))
            .map(|(index, _)| index)
            .collect()
    }
}

impl core::fmt::Debug for Dispatcher<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("config", &self.config)
            .field("drivers", &self.drivers)
            .field("scheduled", &self.scheduled)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::rc::Rc;
    use alloc::string::String;
    use alloc::sync::Arc;
    use alloc::vec;
    use core::cell::RefCell;
    use dxe_api::guid;
    use dxe_depex::DepexBuilder;

    const A: Guid = guid!("0d1a3b2e-0001-4c0e-9d1e-5e0b1a2c3d01");
    const B: Guid = guid!("0d1a3b2e-0002-4c0e-9d1e-5e0b1a2c3d02");
    const C: Guid = guid!("0d1a3b2e-0003-4c0e-9d1e-5e0b1a2c3d03");
    const PROTO: Guid = guid!("7c4e1f20-9a5b-4d3c-8e2f-1b0a9c8d7e6f");

    type Log = Rc<RefCell<Vec<String>>>;

    fn recorder(log: &Log, name: &'static str) -> impl FnMut(&ProtocolDatabase) -> Result<()> + 'static {
        let log = Rc::clone(log);
        move |_: &ProtocolDatabase| {
            log.borrow_mut().push(String::from(name));
            Ok(())
        }
    }

    fn always_true() -> Option<Depex> {
        Some(DepexBuilder::new().literal(true).end().build())
    }

    fn config() -> DispatcherConfig {
        DispatcherConfig {
            report_undispatched: false,
            ..DispatcherConfig::default()
        }
    }

    #[test]
    fn test_dispatch_in_discovery_order() {
        let db = ProtocolDatabase::new();
        let log = Log::default();
        let mut dispatcher = Dispatcher::new(&db, config());
        dispatcher.add_driver("a", A, always_true(), recorder(&log, "a")).unwrap();
        dispatcher.add_driver("b", B, always_true(), recorder(&log, "b")).unwrap();

        let summary = dispatcher.dispatch().unwrap();
        assert_eq!(summary.started, 2);
        assert_eq!(*log.borrow(), vec!["a", "b"]);
        assert!(dispatcher.undispatched().is_empty());
    }

    #[test]
    fn test_duplicate_file_name_rejected() {
        let db = ProtocolDatabase::new();
        let log = Log::default();
        let mut dispatcher = Dispatcher::new(&db, config());
        dispatcher.add_driver("a", A, None, recorder(&log, "a")).unwrap();
        assert!(matches!(
            dispatcher.add_driver("a2", A, None, recorder(&log, "a2")),
            Err(Error::AlreadyStarted(_))
        ));
    }

    #[test]
    fn test_nothing_to_dispatch_is_not_found() {
        let db = ProtocolDatabase::new();
        let mut dispatcher = Dispatcher::new(&db, config());
        assert!(matches!(dispatcher.dispatch(), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_dependency_chain_across_passes() {
        let db = ProtocolDatabase::new();
        let log = Log::default();
        let mut dispatcher = Dispatcher::new(&db, config());

        dispatcher
            .add_driver(
                "consumer",
                A,
                Some(DepexBuilder::new().push(PROTO).end().build()),
                recorder(&log, "consumer"),
            )
            .unwrap();
        let producer_log = Rc::clone(&log);
        dispatcher
            .add_driver("producer", B, always_true(), move |db: &ProtocolDatabase| -> Result<()> {
                producer_log.borrow_mut().push(String::from("producer"));
                db.install_protocol_interface(None, PROTO, Arc::new(()))?;
                Ok(())
            })
            .unwrap();

        let summary = dispatcher.dispatch().unwrap();
        assert_eq!(*log.borrow(), vec!["producer", "consumer"]);
        assert_eq!(summary.passes, 3);
    }

    #[test]
    fn test_before_and_after_surround_target() {
        let db = ProtocolDatabase::new();
        let log = Log::default();
        let mut dispatcher = Dispatcher::new(&db, config());

        dispatcher
            .add_driver("after", C, Some(DepexBuilder::new().after(A).end().build()), recorder(&log, "after"))
            .unwrap();
        dispatcher
            .add_driver("before", B, Some(DepexBuilder::new().before(A).end().build()), recorder(&log, "before"))
            .unwrap();
        dispatcher.add_driver("target", A, always_true(), recorder(&log, "target")).unwrap();

        dispatcher.dispatch().unwrap();
        assert_eq!(*log.borrow(), vec!["before", "target", "after"]);
    }

    #[test]
    fn test_schedule_promotes_sor_driver() {
        let db = ProtocolDatabase::new();
        let log = Log::default();
        let mut dispatcher = Dispatcher::new(&db, config());
        dispatcher
            .add_driver(
                "sor",
                A,
                Some(DepexBuilder::new().sor().literal(true).end().build()),
                recorder(&log, "sor"),
            )
            .unwrap();

        assert!(matches!(dispatcher.dispatch(), Err(Error::NotFound(_))));
        assert_eq!(
            dispatcher.undispatched()[0].reason,
            UndispatchedReason::Unrequested
        );
        assert_eq!(dispatcher.driver(&A).and_then(DriverEntry::last_readiness), None);

        dispatcher.schedule(&A).unwrap();
        assert!(dispatcher.schedule(&A).is_err());
        dispatcher.dispatch().unwrap();
        assert_eq!(*log.borrow(), vec!["sor"]);
    }

    #[test]
    fn test_max_passes_aborts() {
        let db = ProtocolDatabase::new();
        let log = Log::default();
        let mut dispatcher = Dispatcher::new(
            &db,
            DispatcherConfig {
                max_passes: Some(1),
                ..config()
            },
        );
        dispatcher.add_driver("a", A, always_true(), recorder(&log, "a")).unwrap();

        assert!(matches!(dispatcher.dispatch(), Err(Error::Aborted(_))));
        assert_eq!(dispatcher.undispatched()[0].reason, UndispatchedReason::Scheduled);
        assert!(log.borrow().is_empty());
    }
}
