//! Chat Command System
//!
//! Admin actions typed in chat as `!<action> <args>`.
//!
//! # Architecture
//!
//! ```text
//! chat line → CommandInfo::from_chat → CommandManager::dispatch
//!           → AuthorizationGate → action callback → Host
//! ```
//!
//! Lines that do not name a registered action are passed back as
//! [`CommandResult::Continue`] and reach chat untouched.
//!
//! # Example
//!
//! ```ignore
//! use urtadmin_core::commands::{ActionContext, CommandInfo, CommandManager, CommandResult};
//!
//! let mut manager = CommandManager::new();
//! manager.register("ping", "Respond with pong", 0, |ctx: &mut ActionContext<'_>, _: &CommandInfo| {
//!     ctx.reply("Pong!");
//!     CommandResult::Handled
//! });
//! ```

pub mod actions;
mod context;
mod info;
mod manager;

pub use actions::register_builtin_actions;
pub use context::{resolve_target, ActionContext, Target};
pub use info::{tokenize, ActionCallback, CommandInfo, CommandResult};
pub use manager::{ActionKey, CommandManager};
