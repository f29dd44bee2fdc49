//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the Gig-Crawler database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- One row per listing ever seen; url is the natural key across platforms
CREATE TABLE IF NOT EXISTS listings (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    platform TEXT NOT NULL,
    source_id TEXT,
    title TEXT NOT NULL,
    description TEXT,
    budget_min REAL,
    budget_max REAL,
    currency TEXT NOT NULL,
    posted_date TEXT NOT NULL,
    deadline TEXT,
    skills TEXT NOT NULL DEFAULT '[]',
    url TEXT NOT NULL UNIQUE,
    status TEXT NOT NULL,
    work_type TEXT NOT NULL,
    payment_type TEXT NOT NULL,
    metadata TEXT NOT NULL DEFAULT '{}',
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    CHECK (budget_min IS NULL OR budget_max IS NULL OR budget_min <= budget_max)
);

CREATE INDEX IF NOT EXISTS idx_listings_platform ON listings(platform);
CREATE INDEX IF NOT EXISTS idx_listings_source ON listings(platform, source_id);
CREATE INDEX IF NOT EXISTS idx_listings_posted ON listings(posted_date);
"#;

/// Initializes the database schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    conn.pragma_update(None, "user_version", SCHEMA_VERSION)?;
    Ok(())
}

/// Current schema version, recorded in `PRAGMA user_version`
pub const SCHEMA_VERSION: u32 = 1;
