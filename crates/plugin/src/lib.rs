//! urtadmin Plugin - FFI Layer
//!
//! This crate provides the C ABI boundary between the game server and the
//! admin core. It compiles to a cdylib (.so/.dll) and generates
//! `include/urtadmin.h` with cbindgen at build time.

pub mod ffi;

use tracing_subscriber::EnvFilter;

/// Environment variable holding a `tracing` filter directive
pub const LOG_ENV: &str = "URTADMIN_LOG";

/// Install the global fmt subscriber.
///
/// `URTADMIN_LOG` wins when set; otherwise `debug` selects the level.
/// Calling it again after a subscriber is installed does nothing.
pub fn init_logging(debug: bool) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(if debug { "debug" } else { "info" }));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
