//! Unified logging support for the dispatcher crates
//!
//! The macros below forward to the `log` crate when this crate is built with
//! the `log` feature. Without it they only type-check their arguments, so call
//! sites never need their own `#[cfg]` attributes and never trip unused
//! variable warnings.
//!
//! Downstream crates expose their own `log` feature that enables `dxe-api/log`.

/// Unified trace-level logging
#[cfg(feature = "log")]
#[macro_export]
macro_rules! dxe_trace {
    ($($arg:tt)*) => {
        $crate::__log::trace!($($arg)*)
    };
}

/// Unified trace-level logging
#[cfg(not(feature = "log"))]
#[macro_export]
macro_rules! dxe_trace {
    ($($arg:tt)*) => {{
        let _ = format_args!($($arg)*);
    }};
}

/// Unified debug-level logging
#[cfg(feature = "log")]
#[macro_export]
macro_rules! dxe_debug {
    ($($arg:tt)*) => {
        $crate::__log::debug!($($arg)*)
    };
}

/// Unified debug-level logging
#[cfg(not(feature = "log"))]
#[macro_export]
macro_rules! dxe_debug {
    ($($arg:tt)*) => {{
        let _ = format_args!($($arg)*);
    }};
}

/// Unified info-level logging
#[cfg(feature = "log")]
#[macro_export]
macro_rules! dxe_info {
    ($($arg:tt)*) => {
        $crate::__log::info!($($arg)*)
    };
}

/// Unified info-level logging
#[cfg(not(feature = "log"))]
#[macro_export]
macro_rules! dxe_info {
    ($($arg:tt)*) => {{
        let _ = format_args!($($arg)*);
    }};
}

/// Unified warn-level logging
#[cfg(feature = "log")]
#[macro_export]
macro_rules! dxe_warn {
    ($($arg:tt)*) => {
        $crate::__log::warn!($($arg)*)
    };
}

/// Unified warn-level logging
#[cfg(not(feature = "log"))]
#[macro_export]
macro_rules! dxe_warn {
    ($($arg:tt)*) => {{
        let _ = format_args!($($arg)*);
    }};
}

/// Unified error-level logging
#[cfg(feature = "log")]
#[macro_export]
macro_rules! dxe_error {
    ($($arg:tt)*) => {
        $crate::__log::error!($($arg)*)
    };
}

/// Unified error-level logging
#[cfg(not(feature = "log"))]
#[macro_export]
macro_rules! dxe_error {
    ($($arg:tt)*) => {{
        let _ = format_args!($($arg)*);
    }};
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_macros_accept_format_arguments() {
        let driver = "TimerDxe";
        let pass = 3;
        crate::dxe_trace!("evaluating {} in pass {}", driver, pass);
        crate::dxe_debug!("evaluating {driver}");
        crate::dxe_info!("started {}", driver);
        crate::dxe_warn!("{} not dispatched", driver);
        crate::dxe_error!("dispatch failed");
    }
}
