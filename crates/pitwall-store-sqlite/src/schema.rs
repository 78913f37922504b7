//! SQL schema for the pitwall SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA busy_timeout = 2000;

CREATE TABLE IF NOT EXISTS subjects (
    subject_key TEXT PRIMARY KEY,   -- 'race:<date>:<name>' | 'proposition:<id>'
    title       TEXT NOT NULL,
    description TEXT,
    status      TEXT NOT NULL DEFAULT 'active'
                CHECK (status IN ('active', 'closed', 'resolved')),
    expires_at  TEXT,               -- ISO 8601 UTC or NULL
    created_at  TEXT NOT NULL
);

-- One row per voter per subject. A changed vote updates the row in place.
-- No foreign key: race subjects may be voted on without registration.
CREATE TABLE IF NOT EXISTS votes (
    subject_key TEXT    NOT NULL,
    identity    TEXT    NOT NULL,
    direction   INTEGER NOT NULL CHECK (direction IN (0, 1)),  -- 1 = yes
    created_at  TEXT    NOT NULL,
    updated_at  TEXT    NOT NULL,
    PRIMARY KEY (subject_key, identity)
);

CREATE VIEW IF NOT EXISTS vote_summary AS
SELECT subject_key,
       SUM(direction)     AS yes_votes,
       SUM(1 - direction) AS no_votes,
       COUNT(*)           AS total_votes
FROM votes
GROUP BY subject_key;

PRAGMA user_version = 1;
";
