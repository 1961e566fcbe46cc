//! Error handling module for the DXE dispatcher

use alloc::string::{String, ToString};
use core::fmt;

/// Common error type used throughout the dispatcher workspace
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Invalid parameter
    InvalidParameter(String),
    /// Resource not found
    NotFound(String),
    /// Operation already in progress or already done
    AlreadyStarted(String),
    /// Image failed authentication
    SecurityViolation(String),
    /// Allocation failure
    OutOfResources,
    /// Image could not be loaded
    LoadError(String),
    /// Operation not supported in the current phase
    Unsupported(String),
    /// Operation aborted before completion
    Aborted(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidParameter(msg) => write!(f, "Invalid parameter: {}", msg),
            Error::NotFound(msg) => write!(f, "Not found: {}", msg),
            Error::AlreadyStarted(msg) => write!(f, "Already started: {}", msg),
            Error::SecurityViolation(msg) => write!(f, "Security violation: {}", msg),
            Error::OutOfResources => write!(f, "Out of resources"),
            Error::LoadError(msg) => write!(f, "Load error: {}", msg),
            Error::Unsupported(msg) => write!(f, "Unsupported: {}", msg),
            Error::Aborted(msg) => write!(f, "Aborted: {}", msg),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

/// Result type for operations that can fail
pub type Result<T> = core::result::Result<T, Error>;

/// Creates a new invalid parameter error
pub fn invalid_parameter(msg: &str) -> Error {
    Error::InvalidParameter(msg.to_string())
}

/// Creates a new not found error
pub fn not_found(msg: &str) -> Error {
    Error::NotFound(msg.to_string())
}

/// Creates a new already started error
pub fn already_started(msg: &str) -> Error {
    Error::AlreadyStarted(msg.to_string())
}

/// Creates a new security violation error
pub fn security_violation(msg: &str) -> Error {
    Error::SecurityViolation(msg.to_string())
}

/// Creates a new out of resources error
pub fn out_of_resources() -> Error {
    Error::OutOfResources
}

/// Creates a new load error
pub fn load_error(msg: &str) -> Error {
    Error::LoadError(msg.to_string())
}

/// Creates a new unsupported error
pub fn unsupported(msg: &str) -> Error {
    Error::Unsupported(msg.to_string())
}

/// Creates a new aborted error
pub fn aborted(msg: &str) -> Error {
    Error::Aborted(msg.to_string())
}
