// Diesel schema for the reputation database
use diesel::table;

table! {
    clients (id) {
        id -> Integer,
        name -> Text,
        aka -> Nullable<Text>,
        ip -> Text,
        guid -> Text,
        level -> Integer,
        connections -> Integer,
        registered_at -> BigInt,
        ban -> Nullable<BigInt>,
    }
}

/// Statements run on every open; each is idempotent
pub(crate) const MIGRATIONS: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS clients (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        aka TEXT,
        ip TEXT NOT NULL,
        guid TEXT NOT NULL UNIQUE,
        level INTEGER NOT NULL DEFAULT 0,
        connections INTEGER NOT NULL DEFAULT 0,
        registered_at BIGINT NOT NULL,
        ban BIGINT
    )",
    "CREATE INDEX IF NOT EXISTS idx_clients_ip ON clients(ip)",
    "CREATE INDEX IF NOT EXISTS idx_clients_registered_at ON clients(registered_at)",
];
