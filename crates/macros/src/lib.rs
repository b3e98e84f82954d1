//! urtadmin Proc Macros
//!
//! This crate provides `#[admin_action]`, which turns a function into a chat
//! admin action and generates its registration helper.
//!
//! # Example
//!
//! ```ignore
//! use urtadmin_core::admin_action;
//! use urtadmin_core::commands::{ActionContext, CommandInfo, CommandResult};
//!
//! #[admin_action("kick", "Kick a player")]
//! fn kick(ctx: &mut ActionContext<'_>, info: &CommandInfo) -> CommandResult {
//!     ctx.execute(&format!("kick {}", info.arg(1)));
//!     CommandResult::Handled
//! }
//!
//! // With an explicit fallback level:
//! #[admin_action("fly", "Let a player fly", level = 4)]
//! fn fly(ctx: &mut ActionContext<'_>, info: &CommandInfo) -> CommandResult {
//!     CommandResult::Handled
//! }
//!
//! // Generated:
//! // - kick() - The action handler, unchanged
//! // - kick_register(&mut CommandManager) - Register the action
//! ```

mod admin_action;

use proc_macro::TokenStream;
use syn::{parse_macro_input, ItemFn};

/// Attribute macro for admin action registration
///
/// # Arguments
///
/// - First argument: Action name (e.g., `"kick"`)
/// - Second argument: Action description (e.g., `"Kick a player"`)
/// - Optional: `level = N` - Level required when the level table has no
///   entry for the action. Defaults to the built-in level for that name,
///   or 0 for names without one.
///
/// # Generated Code
///
/// - The original function
/// - `{name}_register(manager)` - Register the action, returning its key or
///   `None` when the name is taken
#[proc_macro_attribute]
pub fn admin_action(attr: TokenStream, item: TokenStream) -> TokenStream {
    let args = parse_macro_input!(attr as admin_action::AdminActionArgs);
    let func = parse_macro_input!(item as ItemFn);
    admin_action::generate_admin_action(args, func).into()
}
