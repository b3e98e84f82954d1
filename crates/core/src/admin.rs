//! The admin layer as one object
//!
//! [`AdminCore`] owns the session table, level table, store client and the
//! registered actions. The server calls into it from its frame thread: the
//! lifecycle hooks on connect, userinfo change, disconnect and chat, and the
//! inbound queries used by console tooling.

use std::path::{Path, PathBuf};

use crate::auth::{AuthorizationGate, Decision, Issuer};
use crate::bans::{BanEnforcer, BanState};
use crate::commands::actions::apply_level;
use crate::commands::{
    register_builtin_actions, resolve_target, ActionContext, CommandInfo, CommandManager,
    CommandResult, Target,
};
use crate::config::CoreConfig;
use crate::error::{AdminError, AdminResult};
use crate::host::Host;
use crate::levels::{builtin_level, CommandLevelTable};
use crate::sessions::{ConnectionState, PlayerResolver, Session, SessionRef, SessionTable, Team};
use crate::store::{RecordEvent, ReputationRecord, StoreClient, UpsertOutcome};
use crate::text::{sanitize_name, strip_port};

/// Admin state for one game server
pub struct AdminCore {
    config: CoreConfig,
    base_dir: PathBuf,
    host: Box<dyn Host>,
    sessions: SessionTable,
    levels: CommandLevelTable,
    store: StoreClient,
    commands: CommandManager,
}

impl AdminCore {
    /// Load config, level table and database from `base_dir`.
    ///
    /// Missing config and level files are created with defaults.
    pub fn load(
        base_dir: impl Into<PathBuf>,
        max_clients: usize,
        host: Box<dyn Host>,
    ) -> AdminResult<Self> {
        let base_dir = base_dir.into();
        let config = CoreConfig::load_from(&base_dir)?;
        let levels = CommandLevelTable::load(config.command_levels_path(&base_dir))?;

        let database = config.database_path(&base_dir);
        let store = StoreClient::open(
            &database.to_string_lossy(),
            config.lookup_limit,
            config.store_queue_capacity,
            config.store_timeout(),
        )?;
        tracing::info!(database = %database.display(), max_clients, "Admin core loaded");

        Ok(Self::from_parts(
            config,
            base_dir,
            host,
            SessionTable::new(max_clients),
            levels,
            store,
        ))
    }

    /// Assemble a core from already built parts and register the built-in actions
    pub fn from_parts(
        config: CoreConfig,
        base_dir: PathBuf,
        host: Box<dyn Host>,
        sessions: SessionTable,
        levels: CommandLevelTable,
        store: StoreClient,
    ) -> Self {
        let mut commands = CommandManager::new();
        register_builtin_actions(&mut commands);

        Self {
            config,
            base_dir,
            host,
            sessions,
            levels,
            store,
            commands,
        }
    }

    // ---- Queries ----

    /// Resolve a free-form handle to a connected player
    pub fn resolve_player(&self, handle: &str) -> AdminResult<&Session> {
        PlayerResolver::new(&self.sessions).resolve(handle)
    }

    /// Decide whether the player with `issuer_guid` may run `action`.
    ///
    /// Actions unknown to the level table fall back to their registered
    /// default, then to the built-in level, then to 0.
    pub fn authorize(&self, action: &str, issuer_guid: &str) -> Decision {
        let fallback = self
            .commands
            .find_by_name(action)
            .and_then(|key| self.commands.get_default_level(key))
            .or_else(|| builtin_level(action))
            .unwrap_or(0);

        let online = self.sessions.by_guid(issuer_guid);
        let issuer = Issuer {
            slot: online.map(|s| s.slot),
            name: online.map_or(issuer_guid, |s| s.name.as_str()),
            guid: issuer_guid,
        };

        AuthorizationGate::new(&self.levels, &self.store, &*self.host)
            .authorize(action, fallback, issuer)
    }

    /// Write a state change for `guid`
    pub fn record_event(&self, guid: &str, event: RecordEvent) -> AdminResult<UpsertOutcome> {
        let intent = event.intent();
        let outcome = self.store.upsert(guid, event, self.host.now())?;
        tracing::debug!(guid, %intent, ?outcome, "Recorded event");
        Ok(outcome)
    }

    /// Current ban state of `guid`, `None` for unknown players
    pub fn check_ban(&self, guid: &str) -> AdminResult<BanState> {
        Ok(self
            .store
            .ban_state(guid, self.host.now())?
            .unwrap_or(BanState::None))
    }

    pub fn find_by_name(&self, fragment: &str) -> AdminResult<Vec<ReputationRecord>> {
        Ok(self.store.find_by_name(fragment)?)
    }

    pub fn find_by_ip(&self, ip: &str) -> AdminResult<Vec<ReputationRecord>> {
        Ok(self.store.find_by_ip(ip)?)
    }

    /// Record with store id `id`
    pub fn lookup_by_id(&self, id: i32) -> AdminResult<ReputationRecord> {
        self.store
            .record_by_id(id)?
            .ok_or_else(|| AdminError::NotFound(format!("@{}", id)))
    }

    // ---- Lifecycle ----

    /// A client finished connecting.
    ///
    /// Sanitizes the name, records the visit, kicks banned players and
    /// renames anyone wearing another player's alias. The session stays in
    /// the table even when the store fails.
    pub fn client_connected(
        &mut self,
        slot: usize,
        name: &str,
        guid: &str,
        ip: &str,
    ) -> AdminResult<SessionRef> {
        let sanitized = sanitize_name(name, &self.config.placeholder_name);
        let session_ref = self.sessions.connect(slot, &sanitized, guid, ip)?;
        if sanitized != name {
            tracing::debug!(slot, from = name, to = %sanitized, "Sanitized player name");
            self.host.execute(&format!("rename {} {}", slot, sanitized));
        }
        tracing::info!(slot, guid, name = %sanitized, "Client connected");

        if guid.is_empty() {
            return Ok(session_ref);
        }

        self.record_event(
            guid,
            RecordEvent::Connect {
                name: sanitized,
                ip: strip_port(ip).to_string(),
            },
        )?;
        self.enforce(session_ref, true)?;
        Ok(session_ref)
    }

    /// The client in `slot` changed name or team.
    ///
    /// The ban is checked on every change; the alias guard only runs when
    /// the name actually changed.
    pub fn userinfo_changed(
        &mut self,
        slot: usize,
        name: &str,
        team: Option<Team>,
    ) -> AdminResult<()> {
        let placeholder = &self.config.placeholder_name;
        let session = self
            .sessions
            .by_slot_mut(slot)
            .ok_or_else(|| AdminError::NotFound(slot.to_string()))?;

        if let Some(team) = team {
            session.team = team;
        }

        let sanitized = sanitize_name(name, placeholder);
        let renamed = sanitized != session.name;
        if renamed {
            tracing::debug!(slot, from = %session.name, to = %sanitized, "Name changed");
            session.name = sanitized.clone();
        }
        let session_ref = session.session_ref();
        let guid = session.guid.clone();

        if guid.is_empty() {
            return Ok(());
        }
        if renamed {
            self.record_event(&guid, RecordEvent::UpdateUserinfo { name: sanitized })?;
        }
        self.enforce(session_ref, renamed)
    }

    /// The engine moved `slot` to another connection state.
    ///
    /// `Free` closes the session; other states keep it in the table.
    pub fn client_state_changed(&mut self, slot: usize, state: ConnectionState) {
        tracing::debug!(slot, ?state, "Connection state changed");
        self.sessions.set_state(slot, state);
    }

    /// The client in `slot` left; returns the closed session
    pub fn client_disconnected(&mut self, slot: usize) -> Option<Session> {
        let session = self.sessions.disconnect(slot);
        if let Some(session) = &session {
            tracing::info!(slot, guid = %session.guid, "Client disconnected");
        }
        session
    }

    /// Handle a chat line from `slot`.
    ///
    /// Returns `Handled` when the line was an admin action and must not be
    /// shown in chat.
    pub fn chat_command(&mut self, slot: usize, text: &str) -> CommandResult {
        if !self.config.commands_enabled {
            return CommandResult::Continue;
        }
        let Some(info) = CommandInfo::from_chat(text, &self.config.chat_prefix) else {
            return CommandResult::Continue;
        };
        let Some(issuer) = self.sessions.by_slot(slot).cloned() else {
            tracing::debug!(slot, "Chat command from an empty slot");
            return CommandResult::Continue;
        };

        let mut ctx = ActionContext {
            issuer,
            sessions: &mut self.sessions,
            levels: &self.levels,
            store: &self.store,
            host: &*self.host,
            config: &self.config,
        };
        self.commands.dispatch(&mut ctx, &info)
    }

    /// Operator `setlevel` from the server console; no level check applies.
    pub fn console_setlevel(&mut self, handle: &str, level: i32) -> AdminResult<Target> {
        let target = resolve_target(&self.sessions, &self.store, handle)?;
        if target.guid.is_empty() {
            return Err(AdminError::InvalidArgument(format!(
                "{} has no GUID",
                target.name
            )));
        }
        apply_level(&self.store, &self.config, &target, level, self.host.now())?;

        if let Some(slot) = target.slot {
            self.host.send_to(
                slot,
                &format!(
                    "^2Server^3[PM]^2: ^7The console just put you at level (^1{}^7)",
                    level
                ),
            );
        }
        Ok(target)
    }

    /// Re-read the level table
    pub fn reload_levels(&mut self) -> AdminResult<()> {
        self.levels.reload()?;
        tracing::info!(entries = self.levels.entries().len(), "Command levels reloaded");
        Ok(())
    }

    /// Re-read `urtadmin.toml`.
    ///
    /// Database and level file locations only take effect on the next load.
    pub fn reload_config(&mut self) -> AdminResult<()> {
        self.config.reload_from(&self.base_dir)?;
        tracing::info!("Core config reloaded");
        Ok(())
    }

    /// Stop the store worker; later store calls fail with `StoreUnavailable`
    pub fn shutdown(&mut self) {
        self.store.shutdown();
        tracing::info!("Admin core shut down");
    }

    // ---- Accessors ----

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn sessions(&self) -> &SessionTable {
        &self.sessions
    }

    pub fn levels(&self) -> &CommandLevelTable {
        &self.levels
    }

    pub fn store(&self) -> &StoreClient {
        &self.store
    }

    pub fn commands(&self) -> &CommandManager {
        &self.commands
    }

    /// Register extra actions next to the built-in ones
    pub fn commands_mut(&mut self) -> &mut CommandManager {
        &mut self.commands
    }

    /// Check the ban of a live session, then guard its alias if it may stay
    fn enforce(&mut self, session_ref: SessionRef, guard_alias: bool) -> AdminResult<()> {
        let enforcer = BanEnforcer::new(&*self.host, &self.store);
        let Some(session) = self.sessions.get_mut(session_ref) else {
            return Ok(());
        };

        if enforcer.check_and_enforce(session)?.is_active() || !guard_alias {
            return Ok(());
        }
        enforcer.guard_alias(session, &self.config.placeholder_name)?;
        Ok(())
    }
}

impl std::fmt::Debug for AdminCore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminCore")
            .field("base_dir", &self.base_dir)
            .field("sessions", &self.sessions.len())
            .field("actions", &self.commands.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::host::RecordingHost;
    use crate::store::{Registration, ReputationStore};

    const NOW: i64 = 1_700_000_000;

    fn core() -> (AdminCore, RecordingHost) {
        let host = RecordingHost::new(NOW);
        let store = StoreClient::spawn(
            ReputationStore::open_in_memory().unwrap(),
            32,
            Duration::from_secs(2),
        )
        .unwrap();
        let core = AdminCore::from_parts(
            CoreConfig::default(),
            PathBuf::new(),
            Box::new(host.clone()),
            SessionTable::new(8),
            CommandLevelTable::builtin(),
            store,
        );
        (core, host)
    }

    fn promote(core: &AdminCore, guid: &str, name: &str, level: i32) {
        core.record_event(
            guid,
            RecordEvent::SetLevel(Registration {
                name: name.to_string(),
                aka: Some(name.to_string()),
                ip: "10.0.0.1".to_string(),
                level,
            }),
        )
        .unwrap();
    }

    #[test]
    fn test_connect_records_visit_and_strips_port() {
        let (mut core, _host) = core();
        core.client_connected(2, "Sniper", "G2", "10.0.0.2:27960")
            .unwrap();
        core.client_disconnected(2);
        core.client_connected(2, "Sniper", "G2", "10.0.0.2:27961")
            .unwrap();

        let record = core.store().record("G2").unwrap().unwrap();
        assert_eq!(record.connections, 2);
        assert_eq!(record.ip, "10.0.0.2");
        assert_eq!(core.sessions().by_slot(2).unwrap().ip, "10.0.0.2");
    }

    #[test]
    fn test_connect_sanitizes_name() {
        let (mut core, host) = core();
        core.client_connected(1, "Big Bad/Wolf", "G1", "10.0.0.1")
            .unwrap();

        assert_eq!(core.sessions().by_slot(1).unwrap().name, "BigBad*Wolf");
        assert_eq!(host.executed(), vec!["rename 1 BigBad*Wolf"]);
    }

    #[test]
    fn test_connect_name_cannot_smuggle_console_commands() {
        let (mut core, host) = core();
        core.client_connected(1, "a b;rcon_password pwned", "G1", "10.0.0.1")
            .unwrap();

        assert_eq!(host.executed(), vec!["rename 1 abrcon_passwordpwned"]);
        assert_eq!(
            core.store().record("G1").unwrap().unwrap().name,
            "abrcon_passwordpwned"
        );
    }

    #[test]
    fn test_banned_player_is_kicked_on_connect() {
        let (mut core, host) = core();
        core.record_event("G3", RecordEvent::Unban).unwrap();
        core.record_event(
            "G3",
            RecordEvent::Ban {
                ip: "10.0.0.3".to_string(),
                expires_at: 0,
            },
        )
        .unwrap();

        core.client_connected(3, "Cheater", "G3", "10.0.0.3").unwrap();
        assert_eq!(core.check_ban("G3").unwrap(), BanState::Permanent);
        assert_eq!(host.executed(), vec!["kick 3"]);
    }

    #[test]
    fn test_alias_owned_by_someone_else_is_renamed() {
        let (mut core, host) = core();
        promote(&core, "OWNER", "Legend", 3);

        core.client_connected(4, "^1Legend", "IMPOSTOR", "10.0.0.4")
            .unwrap();
        assert_eq!(core.sessions().by_slot(4).unwrap().name, "Newbie");
        assert_eq!(host.executed(), vec!["rename 4 Newbie"]);

        host.clear();
        core.client_connected(5, "Legend", "OWNER", "10.0.0.5").unwrap();
        assert!(host.executed().is_empty());
    }

    #[test]
    fn test_team_change_skips_alias_guard() {
        let (mut core, host) = core();
        core.client_connected(4, "Drifter", "G4", "10.0.0.4").unwrap();
        // The alias is claimed while the player keeps the name
        promote(&core, "OWNER", "Drifter", 3);
        host.clear();

        core.userinfo_changed(4, "Drifter", Some(Team::Blue)).unwrap();
        assert!(host.executed().is_empty());
        assert_eq!(core.sessions().by_slot(4).unwrap().name, "Drifter");

        core.userinfo_changed(4, "Other", None).unwrap();
        core.userinfo_changed(4, "Drifter", None).unwrap();
        assert_eq!(host.executed(), vec!["rename 4 Newbie"]);
        assert_eq!(core.sessions().by_slot(4).unwrap().name, "Newbie");
    }

    #[test]
    fn test_connection_state_changes() {
        let (mut core, _host) = core();
        core.client_connected(3, "Lagger", "G3", "10.0.0.3").unwrap();

        core.client_state_changed(3, ConnectionState::Zombie);
        assert_eq!(
            core.sessions().by_slot(3).unwrap().state,
            ConnectionState::Zombie
        );

        core.client_state_changed(3, ConnectionState::Free);
        assert!(core.sessions().by_slot(3).is_none());
        // Unknown slots are ignored
        core.client_state_changed(99, ConnectionState::Active);
    }

    #[test]
    fn test_userinfo_change_updates_name_and_team() {
        let (mut core, _host) = core();
        core.client_connected(1, "Old", "G1", "10.0.0.1").unwrap();
        core.userinfo_changed(1, "New", Some(Team::Red)).unwrap();

        let session = core.sessions().by_slot(1).unwrap();
        assert_eq!(session.name, "New");
        assert_eq!(session.team, Team::Red);
        assert_eq!(core.store().record("G1").unwrap().unwrap().name, "New");

        assert!(matches!(
            core.userinfo_changed(7, "Ghost", None),
            Err(AdminError::NotFound(_))
        ));
    }

    #[test]
    fn test_chat_command_dispatch() {
        let (mut core, host) = core();
        core.client_connected(0, "Boss", "ADMIN", "10.0.0.1").unwrap();
        promote(&core, "ADMIN", "Boss", 5);
        core.client_connected(1, "Camper", "G1", "10.0.0.2").unwrap();
        host.clear();

        assert_eq!(core.chat_command(0, "hello all"), CommandResult::Continue);
        assert_eq!(core.chat_command(0, "!dance"), CommandResult::Continue);
        assert_eq!(core.chat_command(0, "!kick camp"), CommandResult::Handled);
        assert_eq!(
            host.executed(),
            vec!["kick 1 \"you have been kicked by Boss\""]
        );
    }

    #[test]
    fn test_commands_can_be_switched_off() {
        let (mut core, host) = core();
        core.config.commands_enabled = false;
        core.client_connected(0, "Boss", "ADMIN", "10.0.0.1").unwrap();
        promote(&core, "ADMIN", "Boss", 5);
        host.clear();

        assert_eq!(core.chat_command(0, "!restart"), CommandResult::Continue);
        assert!(host.calls().is_empty());
    }

    #[test]
    fn test_authorize_by_guid() {
        let (mut core, host) = core();
        core.client_connected(0, "Mod", "MOD", "10.0.0.1").unwrap();
        promote(&core, "MOD", "Mod", 3);
        host.clear();

        assert_eq!(core.authorize("kick", "MOD"), Decision::Admit);
        assert_eq!(
            core.authorize("ban", "MOD"),
            Decision::Deny {
                required: 4,
                actual: Some(3)
            }
        );
        assert_eq!(
            host.broadcasts(),
            vec!["^1Warning: ^7Mod ^7trying to use an admin command"]
        );
    }

    #[test]
    fn test_console_setlevel() {
        let (mut core, host) = core();
        core.client_connected(2, "Rookie", "G2", "10.0.0.2").unwrap();
        host.clear();

        let target = core.console_setlevel("rook", 2).unwrap();
        assert_eq!(target.slot, Some(2));
        assert_eq!(core.store().level("G2").unwrap(), Some(2));
        assert_eq!(
            host.messages_to(2),
            vec!["^2Server^3[PM]^2: ^7The console just put you at level (^12^7)"]
        );

        let id = core.store().record("G2").unwrap().unwrap().id;
        core.client_disconnected(2);
        core.console_setlevel(&format!("@{}", id), 0).unwrap();
        let record = core.lookup_by_id(id).unwrap();
        assert_eq!(record.level, 0);
        assert_eq!(record.aka, None);

        assert!(matches!(
            core.console_setlevel(&format!("@{}", id), 9),
            Err(AdminError::InvalidArgument(_))
        ));
        assert!(matches!(
            core.lookup_by_id(999),
            Err(AdminError::NotFound(_))
        ));
    }

    #[test]
    fn test_queries_after_shutdown_report_store_unavailable() {
        let (mut core, _host) = core();
        core.shutdown();

        assert!(matches!(
            core.find_by_name("x"),
            Err(AdminError::StoreUnavailable(_))
        ));
        assert!(!core.authorize("kick", "G1").is_admitted());
    }

    #[test]
    fn test_load_creates_files() {
        let dir = tempfile::tempdir().unwrap();
        let host = RecordingHost::new(NOW);
        let mut core = AdminCore::load(dir.path(), 16, Box::new(host)).unwrap();

        assert!(dir.path().join("urtadmin.toml").exists());
        assert!(dir.path().join("commands.cfg").exists());
        assert_eq!(core.levels().required_level("kick"), Some(3));
        assert_eq!(core.sessions().max_clients(), 16);
        assert_eq!(core.commands().len(), crate::levels::DEFAULT_LEVELS.len());

        let mut edited = core.config().clone();
        edited.chat_prefix = "/".to_string();
        edited.save_to(dir.path()).unwrap();
        core.reload_config().unwrap();
        assert_eq!(core.config().chat_prefix, "/");
        assert_eq!(core.base_dir(), dir.path());
    }
}
