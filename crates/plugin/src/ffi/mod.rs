//! C ABI surface
//!
//! - [`host`] - the server's callback table and the [`Host`](urtadmin_core::Host) built on it
//! - [`exports`] - functions the server calls

pub mod exports;
pub mod host;

pub use host::{FfiHost, HostCallbacks};
