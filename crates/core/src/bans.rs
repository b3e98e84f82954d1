//! Ban evaluation and enforcement
//!
//! A record's `ban` column is `NULL` (no ban), `0` (permanent) or the Unix
//! time a temporary ban ends. A temporary ban that has run out is reported as
//! [`BanState::Inactive`] and left in the store; only an explicit unban
//! clears it.

use crate::clock::format_expiry;
use crate::error::AdminResult;
use crate::host::Host;
use crate::sessions::Session;
use crate::store::{RecordEvent, StoreClient};

/// Ban status derived from a record and the current time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BanState {
    None,
    Permanent,
    TemporaryActive { expires_at: i64 },
    /// Temporary ban whose expiry is in the past
    Inactive { expired_at: i64 },
}

impl BanState {
    pub fn evaluate(ban: Option<i64>, now: i64) -> Self {
        match ban {
            None => Self::None,
            Some(0) => Self::Permanent,
            Some(expires_at) if expires_at > now => Self::TemporaryActive { expires_at },
            Some(expired_at) => Self::Inactive { expired_at },
        }
    }

    /// Whether the player must be kept off the server
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Permanent | Self::TemporaryActive { .. })
    }
}

/// Applies ban state and alias ownership to connected players
pub struct BanEnforcer<'a> {
    host: &'a dyn Host,
    store: &'a StoreClient,
}

impl<'a> BanEnforcer<'a> {
    pub fn new(host: &'a dyn Host, store: &'a StoreClient) -> Self {
        Self { host, store }
    }

    /// Look up `session`'s ban and kick the player if it is active.
    ///
    /// Sessions without a GUID have no record and are never banned.
    pub fn check_and_enforce(&self, session: &Session) -> AdminResult<BanState> {
        if !session.has_guid() {
            return Ok(BanState::None);
        }

        let state = self
            .store
            .ban_state(&session.guid, self.host.now())?
            .unwrap_or(BanState::None);
        self.enforce(session, state);
        Ok(state)
    }

    /// Act on an already evaluated ban state
    pub fn enforce(&self, session: &Session, state: BanState) {
        match state {
            BanState::None => {}
            BanState::Permanent => {
                tracing::info!(slot = session.slot, guid = %session.guid, "Kicking banned player");
                self.announce_ban(session);
                self.kick(session);
            }
            BanState::TemporaryActive { expires_at } => {
                tracing::info!(slot = session.slot, guid = %session.guid, expires_at, "Kicking temp-banned player");
                self.announce_ban(session);
                self.host.broadcast(&format!(
                    "^1Warning: ^7TempBan expire: {}",
                    format_expiry(expires_at)
                ));
                self.kick(session);
            }
            BanState::Inactive { expired_at } => {
                tracing::debug!(
                    slot = session.slot,
                    guid = %session.guid,
                    expired_at,
                    "Expired temp ban left in place"
                );
            }
        }
    }

    /// Rename `session` to `placeholder` if another GUID owns its name as an alias.
    ///
    /// The new name is written to the player's record so lookups stop
    /// returning it under the alias. Returns whether the player was renamed.
    pub fn guard_alias(&self, session: &mut Session, placeholder: &str) -> AdminResult<bool> {
        let cleaned = session.clean_name();
        if cleaned.is_empty() || crate::text::eq_ignore_case(&cleaned, placeholder) {
            return Ok(false);
        }

        let owners = self.store.alias_owners(&cleaned)?;
        if owners.iter().all(|owner| *owner == session.guid) {
            return Ok(false);
        }

        tracing::info!(slot = session.slot, name = %cleaned, "Name belongs to another player");
        self.host.broadcast(&format!(
            "^1Warning: ^3The name '^7{}' ^3belongs to another player",
            session.name
        ));
        self.host.broadcast(&format!(
            "^1Warning: ^7{} ^3is renamed ^7{}",
            session.name, placeholder
        ));
        self.host
            .execute(&format!("rename {} {}", session.slot, placeholder));
        session.name = placeholder.to_string();
        if session.has_guid() {
            self.store.upsert(
                &session.guid,
                RecordEvent::UpdateUserinfo {
                    name: placeholder.to_string(),
                },
                self.host.now(),
            )?;
        }
        Ok(true)
    }

    fn announce_ban(&self, session: &Session) {
        self.host.broadcast(&format!(
            "^1Warning: ^7{} ^7is banned on this server",
            session.name
        ));
    }

    fn kick(&self, session: &Session) {
        self.host.execute(&format!("kick {}", session.slot));
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::host::RecordingHost;
    use crate::sessions::SessionTable;
    use crate::store::{Registration, ReputationStore};

    const NOW: i64 = 1_700_000_000;

    fn store() -> StoreClient {
        StoreClient::spawn(
            ReputationStore::open_in_memory().unwrap(),
            16,
            Duration::from_secs(2),
        )
        .unwrap()
    }

    fn session(slot: usize, name: &str, guid: &str) -> Session {
        let mut table = SessionTable::new(16);
        let r = table.connect(slot, name, guid, "1.1.1.1").unwrap();
        table.get(r).unwrap().clone()
    }

    fn ban(store: &StoreClient, guid: &str, expires_at: i64) {
        store
            .upsert(
                guid,
                RecordEvent::Ban {
                    ip: "1.1.1.1".to_string(),
                    expires_at,
                },
                NOW,
            )
            .unwrap();
    }

    #[test]
    fn test_evaluate() {
        assert_eq!(BanState::evaluate(None, NOW), BanState::None);
        assert_eq!(BanState::evaluate(Some(0), NOW), BanState::Permanent);
        assert_eq!(
            BanState::evaluate(Some(NOW + 60), NOW),
            BanState::TemporaryActive {
                expires_at: NOW + 60
            }
        );
        assert_eq!(
            BanState::evaluate(Some(NOW - 100), NOW),
            BanState::Inactive {
                expired_at: NOW - 100
            }
        );
        // Expiry at exactly now has run out
        assert!(!BanState::evaluate(Some(NOW), NOW).is_active());
    }

    #[test]
    fn test_permanent_ban_kicks() {
        let host = RecordingHost::new(NOW);
        let store = store();
        store.upsert("G1", RecordEvent::Unban, NOW).unwrap();
        ban(&store, "G1", 0);

        let enforcer = BanEnforcer::new(&host, &store);
        let state = enforcer.check_and_enforce(&session(4, "Cheater", "G1")).unwrap();

        assert_eq!(state, BanState::Permanent);
        assert_eq!(
            host.broadcasts(),
            vec!["^1Warning: ^7Cheater ^7is banned on this server"]
        );
        assert_eq!(host.executed(), vec!["kick 4"]);
    }

    #[test]
    fn test_temp_ban_reports_expiry() {
        let host = RecordingHost::new(NOW);
        let store = store();
        store.upsert("G1", RecordEvent::Unban, NOW).unwrap();
        ban(&store, "G1", NOW + 3600);

        let enforcer = BanEnforcer::new(&host, &store);
        enforcer.check_and_enforce(&session(2, "Cheater", "G1")).unwrap();

        let broadcasts = host.broadcasts();
        assert_eq!(broadcasts.len(), 2);
        assert_eq!(
            broadcasts[1],
            format!("^1Warning: ^7TempBan expire: {}", format_expiry(NOW + 3600))
        );
        assert_eq!(host.executed(), vec!["kick 2"]);
    }

    #[test]
    fn test_expired_ban_is_left_alone() {
        let host = RecordingHost::new(NOW);
        let store = store();
        store.upsert("G1", RecordEvent::Unban, NOW).unwrap();
        ban(&store, "G1", NOW - 100);

        let enforcer = BanEnforcer::new(&host, &store);
        let state = enforcer.check_and_enforce(&session(2, "Reformed", "G1")).unwrap();

        assert_eq!(
            state,
            BanState::Inactive {
                expired_at: NOW - 100
            }
        );
        assert!(host.calls().is_empty());
        // Not cleared
        assert_eq!(
            store.record("G1").unwrap().unwrap().ban,
            Some(NOW - 100)
        );
    }

    #[test]
    fn test_unknown_and_guidless_players_pass() {
        let host = RecordingHost::new(NOW);
        let store = store();
        let enforcer = BanEnforcer::new(&host, &store);

        assert_eq!(
            enforcer.check_and_enforce(&session(1, "New", "G9")).unwrap(),
            BanState::None
        );
        assert_eq!(
            enforcer.check_and_enforce(&session(1, "Bot", "")).unwrap(),
            BanState::None
        );
        assert!(host.calls().is_empty());
    }

    #[test]
    fn test_alias_collision_renames_to_placeholder() {
        let host = RecordingHost::new(NOW);
        let store = store();
        store
            .upsert(
                "OWNER",
                RecordEvent::Register(Registration {
                    name: "Alice".to_string(),
                    aka: Some("Alice".to_string()),
                    ip: "1.1.1.1".to_string(),
                    level: 1,
                }),
                NOW,
            )
            .unwrap();

        let enforcer = BanEnforcer::new(&host, &store);

        let mut owner = session(1, "Alice", "OWNER");
        assert!(!enforcer.guard_alias(&mut owner, "Newbie").unwrap());
        assert_eq!(owner.name, "Alice");

        store
            .upsert(
                "OTHER",
                RecordEvent::Connect {
                    name: "^1aLiCe".to_string(),
                    ip: "1.1.1.5".to_string(),
                },
                NOW,
            )
            .unwrap();
        let mut impostor = session(5, "^1aLiCe", "OTHER");
        assert!(enforcer.guard_alias(&mut impostor, "Newbie").unwrap());
        assert_eq!(store.record("OTHER").unwrap().unwrap().name, "Newbie");
        let found = store.find_by_name("alice").unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].guid, "OWNER");
        assert_eq!(impostor.name, "Newbie");
        assert_eq!(host.executed(), vec!["rename 5 Newbie"]);
        assert_eq!(
            host.broadcasts(),
            vec![
                "^1Warning: ^3The name '^7^1aLiCe' ^3belongs to another player",
                "^1Warning: ^7^1aLiCe ^3is renamed ^7Newbie",
            ]
        );
    }
}
