//! DXE Dispatcher - Dependency-driven driver dispatch
//!
//! This crate runs discovered drivers in an order their dependency expressions
//! allow, and sequences the PEI and DXE phases around it.
//!
//! # Architecture
//!
//! - **Dispatcher**: Discovered list, scheduled queue and the fixed-point loop
//! - **Entry**: Per-driver dispatch state
//! - **Image**: The `DriverImage` load/start interface
//! - **Report**: Dispatch counts and never-dispatched diagnostics
//! - **Handoff**: PEI dispatch, DXE IPL check, DXE dispatch
//! - **Config**: Runtime knobs
//!
//! # Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use dxe_api::{guid, Result};
//! use dxe_depex::DepexBuilder;
//! use dxe_dispatcher::{Dispatcher, DispatcherConfig};
//! use dxe_protocol_db::ProtocolDatabase;
//!
//! let db = ProtocolDatabase::new();
//! let mut dispatcher = Dispatcher::new(&db, DispatcherConfig::default());
//!
//! let serial = guid!("bb25cf6f-f1d4-11d2-9a0c-0090273fc1fd");
//! dispatcher.add_driver(
//!     "Terminal",
//!     guid!("9e863906-a40f-4875-977f-5b93ff237fc6"),
//!     Some(DepexBuilder::new().push(serial).end().build()),
//!     |_: &ProtocolDatabase| -> Result<()> { Ok(()) },
//! )?;
//! dispatcher.add_driver(
//!     "Serial",
//!     guid!("f1f3a405-5a6f-4a1b-8b1e-58e0c8ac2a9b"),
//!     Some(DepexBuilder::new().literal(true).end().build()),
//!     move |db: &ProtocolDatabase| -> Result<()> {
//!         db.install_protocol_interface(None, serial, Arc::new(()))?;
//!         Ok(())
//!     },
//! )?;
//!
//! let summary = dispatcher.dispatch()?;
//! assert_eq!(summary.started, 2);
//! # Ok::<(), dxe_api::Error>(())
//! ```

#![no_std]

#[cfg(feature = "std")]
extern crate std;

extern crate alloc;

pub mod config;
pub mod dispatcher;
pub mod entry;
pub mod handoff;
pub mod image;
pub mod report;

// Re-export commonly used types
pub use config::DispatcherConfig;
pub use dispatcher::Dispatcher;
pub use entry::{DriverEntry, DriverState};
pub use handoff::{run_boot_phases, BootReport};
pub use image::DriverImage;
pub use report::{DispatchSummary, UndispatchedDriver, UndispatchedReason};
