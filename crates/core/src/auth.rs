//! Admit or deny admin actions by stored level
//!
//! The required level comes from the level table, falling back to the
//! action's own default. The issuer's level is whatever the store holds for
//! their GUID, 0 when they have no record. A store failure denies.

use crate::host::Host;
use crate::levels::CommandLevelTable;
use crate::sessions::Session;
use crate::store::StoreClient;

/// Who is asking
#[derive(Debug, Clone, Copy)]
pub struct Issuer<'a> {
    pub slot: Option<usize>,
    pub name: &'a str,
    pub guid: &'a str,
}

impl<'a> From<&'a Session> for Issuer<'a> {
    fn from(session: &'a Session) -> Self {
        Self {
            slot: Some(session.slot),
            name: &session.name,
            guid: &session.guid,
        }
    }
}

/// Outcome of an authorization check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Admit,
    /// `actual` is `None` when the store could not be asked
    Deny { required: i32, actual: Option<i32> },
}

impl Decision {
    pub fn is_admitted(&self) -> bool {
        matches!(self, Self::Admit)
    }
}

/// Level check in front of every admin action
pub struct AuthorizationGate<'a> {
    levels: &'a CommandLevelTable,
    store: &'a StoreClient,
    host: &'a dyn Host,
}

impl<'a> AuthorizationGate<'a> {
    pub fn new(levels: &'a CommandLevelTable, store: &'a StoreClient, host: &'a dyn Host) -> Self {
        Self {
            levels,
            store,
            host,
        }
    }

    pub fn required_level(&self, action: &str, fallback: i32) -> i32 {
        self.levels.required_level(action).unwrap_or(fallback)
    }

    /// Stored level of `guid`, 0 for players without a record
    pub fn issuer_level(&self, guid: &str) -> crate::error::AdminResult<i32> {
        if guid.is_empty() {
            return Ok(0);
        }
        Ok(self.store.level(guid)?.unwrap_or(0))
    }

    /// Decide whether `issuer` may run `action`.
    ///
    /// A denial is broadcast to the whole server. A store failure is logged
    /// and reported to the issuer only.
    pub fn authorize(&self, action: &str, fallback: i32, issuer: Issuer<'_>) -> Decision {
        let required = self.required_level(action, fallback);

        let actual = match self.issuer_level(issuer.guid) {
            Ok(level) => level,
            Err(e) => {
                tracing::error!(action, guid = issuer.guid, "Authorization failed: {}", e);
                if let Some(slot) = issuer.slot {
                    self.host.send_to(
                        slot,
                        "^1Error^3[PM]^1: ^7Admin database unavailable, try again later",
                    );
                }
                return Decision::Deny {
                    required,
                    actual: None,
                };
            }
        };

        if actual < required {
            tracing::info!(action, guid = issuer.guid, required, actual, "Admin action denied");
            self.host.broadcast(&format!(
                "^1Warning: ^7{} ^7trying to use an admin command",
                issuer.name
            ));
            return Decision::Deny {
                required,
                actual: Some(actual),
            };
        }

        tracing::debug!(action, guid = issuer.guid, required, actual, "Admin action admitted");
        Decision::Admit
    }
}
