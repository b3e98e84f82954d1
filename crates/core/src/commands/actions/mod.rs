//! Built-in chat actions
//!
//! Rich actions are written with `#[admin_action]`; plain console
//! pass-throughs are registered from a table in [`server`].

/// Unwrap an [`AdminResult`](crate::error::AdminResult) or report the error
/// to the issuer and end the action.
macro_rules! attempt {
    ($ctx:expr, $result:expr) => {
        match $result {
            Ok(value) => value,
            Err(e) => return $ctx.report(&$crate::error::AdminError::from(e)),
        }
    };
}

mod bans;
mod identity;
mod lookup;
mod moderation;
mod server;

pub(crate) use identity::apply_level;

use super::CommandManager;
use crate::error::AdminResult;
use crate::store::{RecordEvent, StoreClient, UpsertOutcome};

/// Register every built-in action, returning how many were added
pub fn register_builtin_actions(manager: &mut CommandManager) -> usize {
    let registrations = [
        identity::help_register(manager),
        identity::time_register(manager),
        identity::register_register(manager),
        identity::me_register(manager),
        identity::admins_register(manager),
        identity::list_register(manager),
        identity::playerinfo_register(manager),
        identity::setlevel_register(manager),
        bans::ban_register(manager),
        bans::tempban_register(manager),
        bans::unban_register(manager),
        bans::infoban_register(manager),
        lookup::lookup_register(manager),
        lookup::lookupip_register(manager),
        lookup::lookupban_register(manager),
        moderation::kick_register(manager),
        moderation::slap_register(manager),
        moderation::nuke_register(manager),
        moderation::kill_register(manager),
        moderation::mute_register(manager),
        moderation::warn_register(manager),
        moderation::rename_register(manager),
        moderation::force_register(manager),
        moderation::superslap_register(manager),
        moderation::bigtext_register(manager),
        moderation::privatebigtext_register(manager),
    ];

    let count = registrations.iter().flatten().count() + server::register_server_actions(manager);
    tracing::debug!(count, "Built-in actions registered");
    count
}

/// Write `event` for `guid`, applying it again when the write created the
/// record (a fresh record only carries the insert defaults).
pub(crate) fn store_event(
    store: &StoreClient,
    guid: &str,
    event: RecordEvent,
    now: i64,
) -> AdminResult<()> {
    if store.upsert(guid, event.clone(), now)? == UpsertOutcome::Inserted {
        store.upsert(guid, event, now)?;
    }
    Ok(())
}
