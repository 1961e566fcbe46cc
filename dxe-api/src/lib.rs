//! DXE API - Shared types and interfaces for the DXE driver dispatcher
//!
//! This crate provides the types shared by every component that takes part in
//! driver dispatch: the capability identifier type, the common error type, the
//! narrow lookup interface the dependency evaluator uses to query the protocol
//! database, and the logging macros used across the workspace.
//!
//! # Architecture
//!
//! - **Error**: Common error type and constructors
//! - **Guid**: 128-bit capability identifiers and well-known protocol GUIDs
//! - **Protocol**: The `ProtocolLookup` trait consumed by the evaluator
//! - **Logging**: Feature-gated logging macros
//!
//! # Usage
//!
//! ```rust
//! use dxe_api::{guid, Guid, ProtocolLookup};
//!
//! struct Installed(Guid);
//!
//! impl ProtocolLookup for Installed {
//!     fn is_installed(&self, protocol: &Guid) -> bool {
//!         self.0 == *protocol
//!     }
//! }
//!
//! let cpu = guid!("26baccb1-6f42-11d4-bce7-0080c73c8881");
//! assert!(Installed(cpu).is_installed(&cpu));
//! ```

#![no_std]

#[cfg(feature = "std")]
extern crate std;

extern crate alloc;

pub mod error;
pub mod guid;
pub mod logging;
pub mod protocol;

#[cfg(feature = "log")]
#[doc(hidden)]
pub use log as __log;

// Re-export commonly used types
pub use crate::error::{Error, Result};
pub use crate::guid::{Guid, GUID_SIZE};
pub use crate::protocol::{all_protocols_installed, ProtocolLookup};
pub use uefi_raw::guid;
