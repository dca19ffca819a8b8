//! Log macros that can be silenced per module.
//!
//! The capture loop prints a `\r` progress line to stdout; any log record
//! written to stderr in between tears that line. Modules that log from inside
//! the loop define a switch and go through these macros instead of `log::*`
//! directly:
//!
//! ```ignore
//! const ENABLE_LOGS: bool = true;
//!
//! use crate::{log_debug, log_info};
//!
//! log_info!("pipeline started");
//! ```
//!
//! The macros are exported at the crate root. A module that forgets to define
//! `ENABLE_LOGS` fails to compile.

/// `log::debug!` gated on the calling module's `ENABLE_LOGS`.
#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::debug!($($arg)*);
        }
    };
}

/// `log::info!` gated on the calling module's `ENABLE_LOGS`.
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::info!($($arg)*);
        }
    };
}

/// `log::warn!` gated on the calling module's `ENABLE_LOGS`.
#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::warn!($($arg)*);
        }
    };
}

/// `log::error!` gated on the calling module's `ENABLE_LOGS`.
#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::error!($($arg)*);
        }
    };
}

/// Installs the `env_logger` backend.
///
/// `RUST_LOG` wins when set; otherwise only warnings and errors are shown so
/// the progress line stays readable.
pub fn init() {
    let env = env_logger::Env::default().default_filter_or("warn");
    // A second init (e.g. from a test harness) is harmless.
    let _ = env_logger::Builder::from_env(env)
        .format_timestamp_millis()
        .try_init();
}
