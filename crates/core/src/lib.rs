//! urtadmin - Core Logic
//!
//! Identity resolution, admin levels and the reputation store behind a
//! Quake 3 engine server's `!command` chat administration.
//!
//! The crate is a plain library: everything the server provides goes through
//! the [`Host`] trait, so the whole admin layer runs in tests against a
//! [`RecordingHost`] and an in-memory database.
//!
//! # Layout
//!
//! - [`sessions`] - connected players, slot + generation references, handle resolution
//! - [`store`] - per-GUID reputation records in SQLite, behind a worker thread
//! - [`levels`] - required level per action
//! - [`auth`] - the level check in front of every action
//! - [`bans`] - ban evaluation, kicks and the alias guard
//! - [`commands`] - chat parsing, action registry and the built-in actions
//! - [`admin`] - [`AdminCore`], tying the above to the server lifecycle

// Allow the crate to refer to itself as `urtadmin_core` for proc macro compatibility
extern crate self as urtadmin_core;

pub mod admin;
pub mod auth;
pub mod bans;
pub mod clock;
pub mod commands;
pub mod config;
pub mod error;
pub mod host;
pub mod levels;
pub mod sessions;
pub mod store;
pub mod text;

// Re-export commonly used items
pub use admin::AdminCore;
pub use auth::{AuthorizationGate, Decision, Issuer};
pub use bans::{BanEnforcer, BanState};
pub use commands::{
    ActionContext, ActionKey, CommandInfo, CommandManager, CommandResult, Target,
};
pub use config::{ConfigError, ConfigResult, CoreConfig};
pub use error::{AdminError, AdminResult};
pub use host::{Host, HostCall, RecordingHost};
pub use levels::{CommandLevelEntry, CommandLevelTable};
pub use sessions::{ConnectionState, PlayerResolver, Session, SessionRef, SessionTable, Team};
pub use store::{
    RecordEvent, Registration, ReputationRecord, ReputationStore, StoreClient, StoreError,
    UpsertOutcome,
};

// Re-export macros
pub use urtadmin_macros::admin_action;
