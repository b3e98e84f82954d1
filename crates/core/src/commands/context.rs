//! State handed to admin actions

use crate::config::CoreConfig;
use crate::error::{AdminError, AdminResult};
use crate::host::Host;
use crate::levels::CommandLevelTable;
use crate::sessions::{PlayerResolver, Session, SessionTable};
use crate::store::StoreClient;

/// A player an action applies to, online or only known to the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub guid: String,
    pub name: String,
    pub ip: String,
    /// Slot when the player is connected
    pub slot: Option<usize>,
    /// Store id when the target was named by `@id`
    pub id: Option<i32>,
}

/// Everything an action callback can reach
pub struct ActionContext<'a> {
    /// Snapshot of the issuing player's session
    pub issuer: Session,
    pub sessions: &'a mut SessionTable,
    pub levels: &'a CommandLevelTable,
    pub store: &'a StoreClient,
    pub host: &'a dyn Host,
    pub config: &'a CoreConfig,
}

impl<'a> ActionContext<'a> {
    /// Private chat line to the issuer
    pub fn reply(&self, message: &str) {
        self.host.send_to(self.issuer.slot, message);
    }

    pub fn broadcast(&self, message: &str) {
        self.host.broadcast(message);
    }

    pub fn execute(&self, command: &str) {
        tracing::debug!(issuer = self.issuer.slot, command, "Executing");
        self.host.execute(command);
    }

    pub fn now(&self) -> i64 {
        self.host.now()
    }

    /// Print a usage line to the issuer
    pub fn usage(&self, usage: &str) -> crate::commands::CommandResult {
        self.reply(&format!("^3Usage[PM]:^7 {}", usage));
        crate::commands::CommandResult::Handled
    }

    /// Tell the issuer why an action failed
    pub fn report(&self, error: &AdminError) -> crate::commands::CommandResult {
        match error {
            AdminError::NotFound(handle) if handle.starts_with('@') => {
                self.reply(&format!(
                    "^1Warning^3[PM]^1: ^7Player with id ^5{} ^7does not exist",
                    handle
                ));
            }
            AdminError::NotFound(handle) => {
                self.reply(&format!(
                    "^1Warning^3[PM]^1: ^7Player {} ^7is not on the server",
                    handle
                ));
            }
            AdminError::InvalidArgument(reason) => {
                self.reply(&format!("^1ERROR^3[PM]^1:^7 {}", reason));
            }
            AdminError::StoreUnavailable(e) => {
                tracing::error!(issuer = self.issuer.slot, "Store failure: {}", e);
                self.reply("^1Error^3[PM]^1: ^7Admin database unavailable, try again later");
            }
            AdminError::Config(e) => {
                tracing::error!("Config failure: {}", e);
                self.reply(&format!("^1Error^3[PM]^1: ^7{}", e));
            }
        }
        crate::commands::CommandResult::Handled
    }

    /// Stored level of the issuer, 0 without a record
    pub fn issuer_level(&self) -> AdminResult<i32> {
        if !self.issuer.has_guid() {
            return Ok(0);
        }
        Ok(self.store.level(&self.issuer.guid)?.unwrap_or(0))
    }

    /// Resolve a handle to a connected player
    pub fn find_player(&self, handle: &str) -> AdminResult<Session> {
        PlayerResolver::new(&*self.sessions)
            .resolve(handle)
            .cloned()
    }

    /// Resolve `@id` through the store, anything else to a connected player
    pub fn find_target(&self, handle: &str) -> AdminResult<Target> {
        resolve_target(&*self.sessions, self.store, handle)
    }
}

/// Resolve `@id` through the store, anything else to a connected player
pub fn resolve_target(
    sessions: &SessionTable,
    store: &StoreClient,
    handle: &str,
) -> AdminResult<Target> {
    let Some(id) = handle.strip_prefix('@') else {
        let session = PlayerResolver::new(sessions).resolve(handle)?;
        return Ok(Target {
            guid: session.guid.clone(),
            name: session.name.clone(),
            ip: session.ip.clone(),
            slot: Some(session.slot),
            id: None,
        });
    };

    let id: i32 = id
        .trim()
        .parse()
        .map_err(|_| AdminError::NotFound(handle.to_string()))?;
    let record = store
        .record_by_id(id)?
        .ok_or_else(|| AdminError::NotFound(format!("@{}", id)))?;
    let slot = sessions.by_guid(&record.guid).map(|s| s.slot);

    Ok(Target {
        guid: record.guid,
        name: record.name,
        ip: record.ip,
        slot,
        id: Some(id),
    })
}
