//! DXE Protocol Database
//!
//! This crate provides the capability registry drivers publish into and the
//! dispatcher consults. A capability is a protocol GUID bound to an interface
//! on a handle.
//!
//! # Architecture
//!
//! - **Database**: Handle and protocol bookkeeping, install and locate
//! - **Notify**: Callbacks fired when a protocol is newly installed
//!
//! Protocols are never uninstalled while dispatch is running. The dependency
//! evaluator relies on this to cache every capability it has seen installed.
//!
//! # Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use dxe_api::{guid, ProtocolLookup};
//! use dxe_protocol_db::ProtocolDatabase;
//!
//! let db = ProtocolDatabase::new();
//! let timer = guid!("26baccb3-6f42-11d4-bce7-0080c73c8881");
//! let handle = db.install_protocol_interface(None, timer, Arc::new(10u32))?;
//!
//! assert!(db.is_installed(&timer));
//! assert_eq!(db.locate_handles(&timer), vec![handle]);
//! # Ok::<(), dxe_api::Error>(())
//! ```

#![no_std]

extern crate alloc;

pub mod database;
pub mod notify;

pub use database::{Handle, Interface, ProtocolDatabase};
pub use notify::{NotifyFn, NotifyId};

use spin::Once;

/// Global protocol database
static PROTOCOL_DB: Once<ProtocolDatabase> = Once::new();

/// Initialize the global protocol database
///
/// Safe to call more than once; later calls return the existing instance.
pub fn init_protocol_db() -> &'static ProtocolDatabase {
    PROTOCOL_DB.call_once(ProtocolDatabase::new)
}

/// Get the global protocol database, initializing it on first use
pub fn protocol_db() -> &'static ProtocolDatabase {
    init_protocol_db()
}
