//! SQL schema for the babylog SQLite store.
//!
//! Executed once at connection startup. There is no migration support; the
//! statements are idempotent thanks to `CREATE TABLE IF NOT EXISTS`.

pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- Records are strictly append-only.
-- No UPDATE or DELETE is ever issued against this table.
CREATE TABLE IF NOT EXISTS records (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id    TEXT NOT NULL,
    kind       TEXT NOT NULL,          -- 'sleep' | 'awake' | 'feeding'
    note       TEXT NOT NULL DEFAULT '',
    timestamp  TEXT NOT NULL           -- fixed-width RFC 3339 UTC, microseconds
);

-- INSERT OR REPLACE keeps one row per application id and per token.
CREATE TABLE IF NOT EXISTS user_mappings (
    application_id TEXT PRIMARY KEY,
    user_token     TEXT NOT NULL UNIQUE,
    created_at     TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS records_user_time_idx ON records(user_id, timestamp);
CREATE INDEX IF NOT EXISTS records_user_kind_idx ON records(user_id, kind);

PRAGMA user_version = 1;
";
