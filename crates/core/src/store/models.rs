//! Rows and write intents of the reputation store

use diesel::prelude::*;

use super::schema::clients;
use crate::bans::BanState;

/// One row of the `clients` table
#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable)]
#[diesel(table_name = clients)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ReputationRecord {
    pub id: i32,
    /// Last name seen for this GUID
    pub name: String,
    /// Name registered as this player's alias
    pub aka: Option<String>,
    pub ip: String,
    pub guid: String,
    pub level: i32,
    pub connections: i32,
    /// Unix time of the first insert
    pub registered_at: i64,
    /// `None` no ban, `0` permanent, otherwise the expiry as Unix time
    pub ban: Option<i64>,
}

impl ReputationRecord {
    pub fn ban_state(&self, now: i64) -> BanState {
        BanState::evaluate(self.ban, now)
    }

    /// Alias for display, `"None"` when unset
    pub fn aka_or_none(&self) -> &str {
        self.aka.as_deref().unwrap_or("None")
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = clients)]
pub(crate) struct NewRecord<'a> {
    pub name: &'a str,
    pub aka: Option<&'a str>,
    pub ip: &'a str,
    pub guid: &'a str,
    pub level: i32,
    pub connections: i32,
    pub registered_at: i64,
    pub ban: Option<i64>,
}

/// Fields written by `register` and `setlevel`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub name: String,
    pub aka: Option<String>,
    pub ip: String,
    pub level: i32,
}

/// A write against one GUID's record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordEvent {
    Register(Registration),
    SetLevel(Registration),
    /// Player joined; bumps the connection counter
    Connect { name: String, ip: String },
    /// `expires_at == 0` is permanent
    Ban { ip: String, expires_at: i64 },
    Unban,
    UpdateUserinfo { name: String },
}

/// Kind of a [`RecordEvent`], for logging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Register,
    SetLevel,
    Connect,
    Ban,
    Unban,
    UpdateUserinfo,
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Register => "register",
            Self::SetLevel => "setlevel",
            Self::Connect => "connect",
            Self::Ban => "ban",
            Self::Unban => "unban",
            Self::UpdateUserinfo => "userinfo",
        };
        f.write_str(name)
    }
}

impl RecordEvent {
    pub fn intent(&self) -> Intent {
        match self {
            Self::Register(_) => Intent::Register,
            Self::SetLevel(_) => Intent::SetLevel,
            Self::Connect { .. } => Intent::Connect,
            Self::Ban { .. } => Intent::Ban,
            Self::Unban => Intent::Unban,
            Self::UpdateUserinfo { .. } => Intent::UpdateUserinfo,
        }
    }

    /// Name, alias and address used when this event creates the record
    pub(crate) fn insert_fields(&self) -> (&str, Option<&str>, &str) {
        match self {
            Self::Register(reg) | Self::SetLevel(reg) => {
                (reg.name.as_str(), reg.aka.as_deref(), reg.ip.as_str())
            }
            Self::Connect { name, ip } => (name.as_str(), None, ip.as_str()),
            Self::Ban { ip, .. } => ("", None, ip.as_str()),
            Self::Unban => ("", None, ""),
            Self::UpdateUserinfo { name } => (name.as_str(), None, ""),
        }
    }
}

/// Whether an upsert created or changed a record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Updated,
}
