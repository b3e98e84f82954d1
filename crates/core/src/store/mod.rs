//! Durable per-GUID reputation records
//!
//! [`ReputationStore`] owns one SQLite connection and answers typed queries.
//! It is not shared directly: [`StoreClient`] moves it onto a worker thread so
//! a slow disk never stalls the server frame.

mod models;
mod schema;
mod worker;

use std::time::Duration;

use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::sql_query;
use diesel::sqlite::SqliteConnection;

pub use models::{Intent, RecordEvent, Registration, ReputationRecord, UpsertOutcome};
pub use worker::StoreClient;

use crate::bans::BanState;
use crate::text::clean_name;
use models::NewRecord;
use schema::clients;

/// Default number of rows a name lookup returns
pub const DEFAULT_LOOKUP_LIMIT: usize = 20;

/// Reputation store errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Could not open the database file
    #[error("Failed to open database: {0}")]
    Connection(#[from] diesel::ConnectionError),

    /// A query failed
    #[error("Query failed: {0}")]
    Query(#[from] diesel::result::Error),

    /// Records are keyed by GUID; an empty one cannot be stored
    #[error("Empty GUID")]
    EmptyGuid,

    /// Too many requests already waiting for the worker
    #[error("Store request queue is full")]
    QueueFull,

    /// The worker thread is gone
    #[error("Store worker is not running")]
    Disconnected,

    /// The worker did not answer in time
    #[error("Store request timed out after {0:?}")]
    Timeout(Duration),

    /// The worker thread could not be started
    #[error("Failed to start store worker: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// SQLite-backed reputation records
pub struct ReputationStore {
    conn: SqliteConnection,
    lookup_limit: usize,
}

impl std::fmt::Debug for ReputationStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReputationStore")
            .field("lookup_limit", &self.lookup_limit)
            .finish_non_exhaustive()
    }
}

impl ReputationStore {
    /// Open (or create) the database at `path` and make sure the schema exists
    pub fn open(path: &str) -> StoreResult<Self> {
        let conn = SqliteConnection::establish(path)?;
        let mut store = Self {
            conn,
            lookup_limit: DEFAULT_LOOKUP_LIMIT,
        };
        store.run_migrations()?;
        tracing::info!("Opened reputation store at {}", path);
        Ok(store)
    }

    /// Private database that disappears with the store
    pub fn open_in_memory() -> StoreResult<Self> {
        Self::open(":memory:")
    }

    pub fn with_lookup_limit(mut self, limit: usize) -> Self {
        self.lookup_limit = limit.max(1);
        self
    }

    fn run_migrations(&mut self) -> StoreResult<()> {
        self.conn.batch_execute("PRAGMA busy_timeout = 1000;")?;
        for statement in schema::MIGRATIONS {
            sql_query(*statement).execute(&mut self.conn)?;
        }
        tracing::debug!("Reputation schema created/verified");
        Ok(())
    }

    /// Create or update the record for `guid` according to `event`.
    pub fn upsert(
        &mut self,
        guid: &str,
        event: &RecordEvent,
        now: i64,
    ) -> StoreResult<UpsertOutcome> {
        if guid.is_empty() {
            return Err(StoreError::EmptyGuid);
        }

        let outcome = self.conn.transaction::<_, StoreError, _>(|conn| {
            let exists: bool = diesel::select(diesel::dsl::exists(
                clients::table.filter(clients::guid.eq(guid)),
            ))
            .get_result(conn)?;

            if !exists {
                let (name, aka, ip) = event.insert_fields();
                diesel::insert_into(clients::table)
                    .values(&NewRecord {
                        name,
                        aka,
                        ip,
                        guid,
                        level: 0,
                        connections: 1,
                        registered_at: now,
                        ban: None,
                    })
                    .execute(conn)?;
                return Ok(UpsertOutcome::Inserted);
            }

            let target = clients::table.filter(clients::guid.eq(guid));
            match event {
                RecordEvent::Register(reg) | RecordEvent::SetLevel(reg) => {
                    diesel::update(target)
                        .set((
                            clients::name.eq(&reg.name),
                            clients::aka.eq(reg.aka.as_deref()),
                            clients::ip.eq(&reg.ip),
                            clients::level.eq(reg.level),
                        ))
                        .execute(conn)?;
                }
                RecordEvent::Connect { name, ip } => {
                    diesel::update(target)
                        .set((
                            clients::name.eq(name),
                            clients::ip.eq(ip),
                            clients::connections.eq(clients::connections + 1),
                        ))
                        .execute(conn)?;
                }
                RecordEvent::Ban { ip, expires_at } => {
                    diesel::update(target)
                        .set((clients::ban.eq(Some(*expires_at)), clients::ip.eq(ip)))
                        .execute(conn)?;
                }
                RecordEvent::Unban => {
                    diesel::update(target)
                        .set(clients::ban.eq(None::<i64>))
                        .execute(conn)?;
                }
                RecordEvent::UpdateUserinfo { name } => {
                    diesel::update(target)
                        .set(clients::name.eq(name))
                        .execute(conn)?;
                }
            }
            Ok(UpsertOutcome::Updated)
        })?;

        tracing::debug!(guid, intent = %event.intent(), ?outcome, "Upserted reputation record");
        Ok(outcome)
    }

    /// Whole record for `guid`
    pub fn record(&mut self, guid: &str) -> StoreResult<Option<ReputationRecord>> {
        Ok(clients::table
            .filter(clients::guid.eq(guid))
            .select(ReputationRecord::as_select())
            .first(&mut self.conn)
            .optional()?)
    }

    /// Whole record for a store id
    pub fn record_by_id(&mut self, id: i32) -> StoreResult<Option<ReputationRecord>> {
        Ok(clients::table
            .filter(clients::id.eq(id))
            .select(ReputationRecord::as_select())
            .first(&mut self.conn)
            .optional()?)
    }

    pub fn level(&mut self, guid: &str) -> StoreResult<Option<i32>> {
        Ok(clients::table
            .filter(clients::guid.eq(guid))
            .select(clients::level)
            .first(&mut self.conn)
            .optional()?)
    }

    /// Outer `None` means no record, inner `None` no alias
    pub fn aka(&mut self, guid: &str) -> StoreResult<Option<Option<String>>> {
        Ok(clients::table
            .filter(clients::guid.eq(guid))
            .select(clients::aka)
            .first(&mut self.conn)
            .optional()?)
    }

    pub fn connections(&mut self, guid: &str) -> StoreResult<Option<i32>> {
        Ok(clients::table
            .filter(clients::guid.eq(guid))
            .select(clients::connections)
            .first(&mut self.conn)
            .optional()?)
    }

    pub fn registered_at(&mut self, guid: &str) -> StoreResult<Option<i64>> {
        Ok(clients::table
            .filter(clients::guid.eq(guid))
            .select(clients::registered_at)
            .first(&mut self.conn)
            .optional()?)
    }

    pub fn id(&mut self, guid: &str) -> StoreResult<Option<i32>> {
        Ok(clients::table
            .filter(clients::guid.eq(guid))
            .select(clients::id)
            .first(&mut self.conn)
            .optional()?)
    }

    /// Outer `None` means no record, inner `None` no ban
    pub fn ban(&mut self, guid: &str) -> StoreResult<Option<Option<i64>>> {
        Ok(clients::table
            .filter(clients::guid.eq(guid))
            .select(clients::ban)
            .first(&mut self.conn)
            .optional()?)
    }

    pub fn ip(&mut self, guid: &str) -> StoreResult<Option<String>> {
        Ok(clients::table
            .filter(clients::guid.eq(guid))
            .select(clients::ip)
            .first(&mut self.conn)
            .optional()?)
    }

    pub fn name(&mut self, guid: &str) -> StoreResult<Option<String>> {
        Ok(clients::table
            .filter(clients::guid.eq(guid))
            .select(clients::name)
            .first(&mut self.conn)
            .optional()?)
    }

    /// GUID owning store id `id`
    pub fn guid_by_id(&mut self, id: i32) -> StoreResult<Option<String>> {
        Ok(clients::table
            .filter(clients::id.eq(id))
            .select(clients::guid)
            .first(&mut self.conn)
            .optional()?)
    }

    /// Records whose cleaned name matches `fragment`, newest first.
    ///
    /// Exact matches win; substring matches are returned only when there is
    /// no exact one.
    pub fn find_by_name(&mut self, fragment: &str) -> StoreResult<Vec<ReputationRecord>> {
        self.search_by_name(fragment, |_| true)
    }

    /// Like [`find_by_name`](Self::find_by_name), restricted to active bans
    pub fn find_bans_by_name(
        &mut self,
        fragment: &str,
        now: i64,
    ) -> StoreResult<Vec<ReputationRecord>> {
        self.search_by_name(fragment, |record| record.ban_state(now).is_active())
    }

    /// Records last seen from `ip`, newest first
    pub fn find_by_ip(&mut self, ip: &str) -> StoreResult<Vec<ReputationRecord>> {
        let ip = crate::text::strip_port(ip);
        Ok(clients::table
            .filter(clients::ip.eq(ip))
            .order((clients::registered_at.desc(), clients::id.desc()))
            .limit(self.lookup_limit as i64)
            .select(ReputationRecord::as_select())
            .load(&mut self.conn)?)
    }

    /// GUIDs whose registered alias equals `name` once both are cleaned
    pub fn alias_owners(&mut self, name: &str) -> StoreResult<Vec<String>> {
        let wanted = clean_name(name);
        if wanted.is_empty() {
            return Ok(Vec::new());
        }

        let rows: Vec<(String, Option<String>)> = clients::table
            .filter(clients::aka.like(scattered_pattern(&wanted)).escape('\\'))
            .select((clients::guid, clients::aka))
            .load(&mut self.conn)?;

        Ok(rows
            .into_iter()
            .filter(|(_, aka)| {
                aka.as_deref()
                    .is_some_and(|aka| clean_name(aka).eq_ignore_ascii_case(&wanted))
            })
            .map(|(guid, _)| guid)
            .collect())
    }

    fn search_by_name<F>(&mut self, fragment: &str, keep: F) -> StoreResult<Vec<ReputationRecord>>
    where
        F: Fn(&ReputationRecord) -> bool,
    {
        let needle = clean_name(fragment).to_ascii_lowercase();
        if needle.is_empty() {
            return Ok(Vec::new());
        }

        let rows: Vec<ReputationRecord> = clients::table
            .filter(clients::name.like(scattered_pattern(&needle)).escape('\\'))
            .order((clients::registered_at.desc(), clients::id.desc()))
            .select(ReputationRecord::as_select())
            .load(&mut self.conn)?;

        let cleaned = |record: &ReputationRecord| clean_name(&record.name).to_ascii_lowercase();

        let exact: Vec<ReputationRecord> = rows
            .iter()
            .filter(|r| keep(*r) && cleaned(*r) == needle)
            .take(self.lookup_limit)
            .cloned()
            .collect();
        if !exact.is_empty() {
            return Ok(exact);
        }

        Ok(rows
            .into_iter()
            .filter(|r| keep(r) && cleaned(r).contains(needle.as_str()))
            .take(self.lookup_limit)
            .collect())
    }
}

/// `LIKE` pattern matching any text that contains the characters of
/// `cleaned` in order.
///
/// Colour codes may sit between any two characters of a stored name, so a
/// plain `%fragment%` would miss them. The pattern narrows the rows loaded;
/// callers still compare cleaned names exactly.
fn scattered_pattern(cleaned: &str) -> String {
    let mut pattern = String::with_capacity(cleaned.len() * 3 + 1);
    pattern.push('%');
    for c in cleaned.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
        pattern.push('%');
    }
    pattern
}

/// Ban state of `guid`'s record, `None` when there is no record
pub fn ban_state_of(
    store: &mut ReputationStore,
    guid: &str,
    now: i64,
) -> StoreResult<Option<BanState>> {
    Ok(store.ban(guid)?.map(|ban| BanState::evaluate(ban, now)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_700_000_000;

    fn store() -> ReputationStore {
        ReputationStore::open_in_memory().unwrap()
    }

    fn connect(name: &str, ip: &str) -> RecordEvent {
        RecordEvent::Connect {
            name: name.to_string(),
            ip: ip.to_string(),
        }
    }

    fn register(name: &str, level: i32) -> RecordEvent {
        RecordEvent::Register(Registration {
            name: name.to_string(),
            aka: Some(name.to_string()),
            ip: "10.0.0.1".to_string(),
            level,
        })
    }

    #[test]
    fn test_empty_guid_is_rejected() {
        let mut store = store();
        assert!(matches!(
            store.upsert("", &connect("a", "1.1.1.1"), NOW),
            Err(StoreError::EmptyGuid)
        ));
    }

    #[test]
    fn test_first_contact_inserts_defaults() {
        let mut store = store();
        let outcome = store.upsert("G1", &connect("Alice", "1.1.1.1"), NOW).unwrap();
        assert_eq!(outcome, UpsertOutcome::Inserted);

        let record = store.record("G1").unwrap().unwrap();
        assert_eq!(record.name, "Alice");
        assert_eq!(record.ip, "1.1.1.1");
        assert_eq!(record.level, 0);
        assert_eq!(record.connections, 1);
        assert_eq!(record.registered_at, NOW);
        assert_eq!(record.ban, None);
        assert_eq!(record.aka, None);
    }

    #[test]
    fn test_insert_without_name_uses_empty_string() {
        let mut store = store();
        store.upsert("G1", &RecordEvent::Unban, NOW).unwrap();
        assert_eq!(store.name("G1").unwrap(), Some(String::new()));
    }

    #[test]
    fn test_only_connect_increments_connections() {
        let mut store = store();
        store.upsert("G1", &connect("Alice", "1.1.1.1"), NOW).unwrap();
        store.upsert("G1", &register("Alice", 1), NOW).unwrap();
        assert_eq!(store.connections("G1").unwrap(), Some(1));

        let outcome = store.upsert("G1", &connect("Alice", "1.1.1.2"), NOW).unwrap();
        assert_eq!(outcome, UpsertOutcome::Updated);
        assert_eq!(store.connections("G1").unwrap(), Some(2));
        assert_eq!(store.ip("G1").unwrap().as_deref(), Some("1.1.1.2"));
    }

    #[test]
    fn test_register_updates_fields() {
        let mut store = store();
        store.upsert("G1", &connect("Alice", "1.1.1.1"), NOW).unwrap();
        store.upsert("G1", &register("X", 2), NOW).unwrap();

        assert_eq!(store.name("G1").unwrap().as_deref(), Some("X"));
        assert_eq!(store.level("G1").unwrap(), Some(2));
        assert_eq!(store.aka("G1").unwrap(), Some(Some("X".to_string())));
    }

    #[test]
    fn test_ban_and_unban() {
        let mut store = store();
        store.upsert("G1", &connect("Alice", "1.1.1.1"), NOW).unwrap();

        store
            .upsert(
                "G1",
                &RecordEvent::Ban {
                    ip: "1.1.1.9".to_string(),
                    expires_at: 0,
                },
                NOW,
            )
            .unwrap();
        assert_eq!(store.ban("G1").unwrap(), Some(Some(0)));
        assert_eq!(
            ban_state_of(&mut store, "G1", NOW).unwrap(),
            Some(BanState::Permanent)
        );

        store.upsert("G1", &RecordEvent::Unban, NOW).unwrap();
        assert_eq!(store.ban("G1").unwrap(), Some(None));
        assert_eq!(ban_state_of(&mut store, "G2", NOW).unwrap(), None);
    }

    #[test]
    fn test_accessors_return_none_without_record() {
        let mut store = store();
        assert_eq!(store.level("nobody").unwrap(), None);
        assert_eq!(store.id("nobody").unwrap(), None);
        assert_eq!(store.registered_at("nobody").unwrap(), None);
        assert!(store.record("nobody").unwrap().is_none());
        assert_eq!(store.guid_by_id(42).unwrap(), None);
    }

    #[test]
    fn test_guid_by_id_round_trip() {
        let mut store = store();
        store.upsert("G1", &connect("Alice", "1.1.1.1"), NOW).unwrap();
        let id = store.id("G1").unwrap().unwrap();
        assert_eq!(store.guid_by_id(id).unwrap().as_deref(), Some("G1"));
        assert_eq!(store.record_by_id(id).unwrap().unwrap().guid, "G1");
    }

    #[test]
    fn test_find_by_name_prefers_exact_then_newest() {
        let mut store = store();
        store.upsert("G1", &connect("Bob", "1.1.1.1"), NOW).unwrap();
        store.upsert("G2", &connect("Bobby", "1.1.1.2"), NOW + 10).unwrap();
        store.upsert("G3", &connect("^2bob", "1.1.1.3"), NOW + 20).unwrap();

        let exact = store.find_by_name("bob").unwrap();
        let guids: Vec<_> = exact.iter().map(|r| r.guid.as_str()).collect();
        assert_eq!(guids, vec!["G3", "G1"]);

        let fuzzy = store.find_by_name("bo").unwrap();
        let guids: Vec<_> = fuzzy.iter().map(|r| r.guid.as_str()).collect();
        assert_eq!(guids, vec!["G3", "G2", "G1"]);

        assert!(store.find_by_name("zed").unwrap().is_empty());
    }

    #[test]
    fn test_find_by_name_respects_limit() {
        let mut store = store().with_lookup_limit(2);
        for i in 0..5 {
            store
                .upsert(&format!("G{}", i), &connect(&format!("Player{}", i), "1.1.1.1"), NOW + i)
                .unwrap();
        }
        assert_eq!(store.find_by_name("player").unwrap().len(), 2);
        assert_eq!(store.find_by_ip("1.1.1.1").unwrap().len(), 2);
    }

    #[test]
    fn test_find_by_ip_strips_port() {
        let mut store = store();
        store.upsert("G1", &connect("Alice", "1.1.1.1"), NOW).unwrap();
        store.upsert("G2", &connect("Bob", "2.2.2.2"), NOW).unwrap();

        let found = store.find_by_ip("1.1.1.1:27960").unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].guid, "G1");
    }

    #[test]
    fn test_find_bans_by_name_skips_inactive() {
        let mut store = store();
        for (guid, ban) in [("G1", 0), ("G2", NOW + 3600), ("G3", NOW - 100)] {
            store.upsert(guid, &connect("Cheater", "1.1.1.1"), NOW).unwrap();
            store
                .upsert(
                    guid,
                    &RecordEvent::Ban {
                        ip: "1.1.1.1".to_string(),
                        expires_at: ban,
                    },
                    NOW,
                )
                .unwrap();
        }
        store.upsert("G4", &connect("Cheater", "1.1.1.1"), NOW).unwrap();

        let mut guids: Vec<_> = store
            .find_bans_by_name("cheater", NOW)
            .unwrap()
            .into_iter()
            .map(|r| r.guid)
            .collect();
        guids.sort();
        assert_eq!(guids, vec!["G1", "G2"]);
    }

    #[test]
    fn test_alias_owners() {
        let mut store = store();
        store.upsert("G1", &connect("Alice", "1.1.1.1"), NOW).unwrap();
        store.upsert("G1", &register("^1Ali^7ce", 1), NOW).unwrap();
        store.upsert("G2", &connect("Bob", "1.1.1.2"), NOW).unwrap();

        assert_eq!(store.alias_owners("ALICE").unwrap(), vec!["G1"]);
        assert!(store.alias_owners("Bob").unwrap().is_empty());
        assert!(store.alias_owners("").unwrap().is_empty());
    }

    #[test]
    fn test_scattered_pattern() {
        assert_eq!(scattered_pattern("ab"), "%a%b%");
        assert_eq!(scattered_pattern("5%_x"), "%5%\\%%\\_%x%");
        assert_eq!(scattered_pattern(""), "%");
    }

    #[test]
    fn test_name_queries_skip_unrelated_rows() {
        let mut store = store();
        store.upsert("G1", &connect("^1Dr^7agon", "1.1.1.1"), NOW).unwrap();
        store.upsert("G2", &connect("100%_sure", "1.1.1.2"), NOW).unwrap();
        store.upsert("G3", &connect("100xysure", "1.1.1.3"), NOW).unwrap();
        store.upsert("G3", &register("100xysure", 1), NOW).unwrap();

        let found = store.find_by_name("DRAG").unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].guid, "G1");

        // Wildcards in a name are matched literally
        let found = store.find_by_name("0%_s").unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].guid, "G2");
        assert!(store.alias_owners("100%_sure").unwrap().is_empty());
        assert_eq!(store.alias_owners("100XYSURE").unwrap(), vec!["G3"]);
    }

    #[test]
    fn test_file_store_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rep.db");
        let path = path.to_str().unwrap();

        {
            let mut store = ReputationStore::open(path).unwrap();
            store.upsert("G1", &connect("Alice", "1.1.1.1"), NOW).unwrap();
        }

        let mut store = ReputationStore::open(path).unwrap();
        assert_eq!(store.name("G1").unwrap().as_deref(), Some("Alice"));
    }
}
