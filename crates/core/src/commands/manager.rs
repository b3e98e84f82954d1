//! Command manager - registration and dispatch

use std::collections::HashMap;

use slotmap::{new_key_type, SlotMap};

use super::context::ActionContext;
use super::info::{ActionCallback, CommandInfo, CommandResult};
use crate::auth::{AuthorizationGate, Issuer};

new_key_type! {
    /// Handle for a registered action
    pub struct ActionKey;
}

/// Registered action information
struct ActionEntry {
    /// Action name as typed after the prefix (e.g., "kick")
    name: String,
    /// Level used when the level table has no entry for this action
    default_level: i32,
    callback: ActionCallback,
}

/// Registry of chat actions
pub struct CommandManager {
    /// Actions indexed by key
    actions: SlotMap<ActionKey, ActionEntry>,

    /// Lookup by name (case-insensitive, lowercase)
    by_name: HashMap<String, ActionKey>,
}

impl Default for CommandManager {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandManager {
    pub fn new() -> Self {
        Self {
            actions: SlotMap::with_key(),
            by_name: HashMap::new(),
        }
    }

    /// Register an action
    ///
    /// Returns `None` if an action with the same name already exists.
    pub fn register<F>(
        &mut self,
        name: &str,
        description: &str,
        default_level: i32,
        callback: F,
    ) -> Option<ActionKey>
    where
        F: Fn(&mut ActionContext<'_>, &CommandInfo) -> CommandResult + Send + Sync + 'static,
    {
        let name_lower = name.to_lowercase();

        if self.by_name.contains_key(&name_lower) {
            tracing::warn!("Action '{}' already registered", name);
            return None;
        }

        let key = self.actions.insert(ActionEntry {
            name: name_lower.clone(),
            default_level,
            callback: Box::new(callback),
        });
        self.by_name.insert(name_lower, key);

        tracing::debug!(default_level, "Registered action: {} ({})", name, description);
        Some(key)
    }

    pub fn find_by_name(&self, name: &str) -> Option<ActionKey> {
        self.by_name.get(&name.to_lowercase()).copied()
    }

    pub fn get_default_level(&self, key: ActionKey) -> Option<i32> {
        self.actions.get(key).map(|e| e.default_level)
    }

    /// Run the action named by `info` if the issuer is allowed to.
    ///
    /// Unknown names return `Continue` so the line reaches chat as usual.
    /// A denied action is still `Handled`; the gate has already told the
    /// server.
    pub fn dispatch(&self, ctx: &mut ActionContext<'_>, info: &CommandInfo) -> CommandResult {
        let Some(entry) = self
            .find_by_name(info.arg(0))
            .and_then(|key| self.actions.get(key))
        else {
            return CommandResult::Continue;
        };

        let gate = AuthorizationGate::new(ctx.levels, ctx.store, ctx.host);
        let decision = gate.authorize(&entry.name, entry.default_level, Issuer::from(&ctx.issuer));
        if !decision.is_admitted() {
            return CommandResult::Handled;
        }

        tracing::info!(
            action = %entry.name,
            slot = ctx.issuer.slot,
            args = %info.arg_string(),
            "Running admin action"
        );
        (entry.callback)(ctx, info)
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}
