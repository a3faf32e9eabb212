//! Database migration system
//!
//! Tracks schema versions and applies migrations in order.

use rusqlite::Connection;
use tracing::{info, instrument};

use crate::error::Result;

/// A database migration
pub struct Migration {
    /// Version number (must be sequential starting from 1)
    pub version: u32,
    /// Description of what this migration does
    pub description: &'static str,
    /// SQL to run for this migration
    pub sql: &'static str,
}

/// All migrations in order
const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        description: "Initial schema",
        sql: r#"
            -- Contest configuration per guild
            CREATE TABLE IF NOT EXISTS contests (
                id TEXT PRIMARY KEY,
                guild_id TEXT NOT NULL,
                title TEXT NOT NULL,
                description TEXT,
                start_at TEXT NOT NULL,
                end_at TEXT NOT NULL,
                required_hours INTEGER NOT NULL,
                max_daily_hours REAL NOT NULL,
                afternoon_start TEXT NOT NULL,
                afternoon_end TEXT NOT NULL,
                night_start TEXT NOT NULL,
                night_end TEXT NOT NULL,
                afternoon_winners INTEGER NOT NULL,
                night_vip_winners INTEGER NOT NULL,
                active INTEGER NOT NULL DEFAULT 1,
                created_at TEXT NOT NULL,
                created_by TEXT
            );

            -- Append-only ledger of per-session hours
            CREATE TABLE IF NOT EXISTS hours_records (
                id TEXT PRIMARY KEY,
                contest_id TEXT NOT NULL,
                participant_id TEXT NOT NULL,
                display_name TEXT NOT NULL,
                session_id TEXT NOT NULL,
                record_date TEXT NOT NULL,
                duration_hours REAL NOT NULL,
                total_hours REAL NOT NULL,
                afternoon_hours REAL NOT NULL DEFAULT 0,
                night_hours REAL NOT NULL DEFAULT 0,
                primary_period TEXT NOT NULL,
                valid INTEGER NOT NULL DEFAULT 1,
                created_at TEXT NOT NULL,
                FOREIGN KEY (contest_id) REFERENCES contests(id) ON DELETE CASCADE,
                UNIQUE(contest_id, participant_id, session_id)
            );

            -- Materialized per-participant totals
            CREATE TABLE IF NOT EXISTS participants (
                id TEXT PRIMARY KEY,
                contest_id TEXT NOT NULL,
                participant_id TEXT NOT NULL,
                display_name TEXT NOT NULL,
                total_afternoon_hours REAL NOT NULL DEFAULT 0,
                total_night_hours REAL NOT NULL DEFAULT 0,
                total_hours REAL NOT NULL DEFAULT 0,
                eligible INTEGER NOT NULL DEFAULT 0,
                afternoon_eligible INTEGER NOT NULL DEFAULT 0,
                night_eligible INTEGER NOT NULL DEFAULT 0,
                afternoon_winner INTEGER NOT NULL DEFAULT 0,
                night_vip_winner INTEGER NOT NULL DEFAULT 0,
                last_updated TEXT NOT NULL,
                FOREIGN KEY (contest_id) REFERENCES contests(id) ON DELETE CASCADE,
                UNIQUE(contest_id, participant_id)
            );
        "#,
    },
    Migration {
        version: 2,
        description: "Add indexes for query performance",
        sql: r#"
            -- Active-contest lookup per guild
            CREATE INDEX IF NOT EXISTS idx_contests_guild_active ON contests(guild_id, active);

            -- Ledger sums per participant and per date
            CREATE INDEX IF NOT EXISTS idx_hours_contest_participant
                ON hours_records(contest_id, participant_id);
            CREATE INDEX IF NOT EXISTS idx_hours_participant_date
                ON hours_records(contest_id, participant_id, record_date);

            -- Eligibility pools
            CREATE INDEX IF NOT EXISTS idx_participants_contest ON participants(contest_id);
            CREATE INDEX IF NOT EXISTS idx_participants_eligible
                ON participants(contest_id, eligible);
        "#,
    },
];

/// Initialize the migrations table
fn init_migrations_table(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            description TEXT NOT NULL,
            applied_at TEXT NOT NULL
        )",
        [],
    )?;
    Ok(())
}

/// Get the current schema version
fn get_current_version(conn: &Connection) -> Result<u32> {
    let version: Option<u32> = conn
        .query_row("SELECT MAX(version) FROM schema_migrations", [], |row| {
            row.get(0)
        })
        .unwrap_or(None);
    Ok(version.unwrap_or(0))
}

/// Record that a migration was applied
fn record_migration(conn: &Connection, migration: &Migration) -> Result<()> {
    conn.execute(
        "INSERT INTO schema_migrations (version, description, applied_at) VALUES (?1, ?2, ?3)",
        rusqlite::params![
            migration.version,
            migration.description,
            chrono::Utc::now().to_rfc3339()
        ],
    )?;
    Ok(())
}

/// Run all pending migrations
#[instrument(skip(conn))]
pub fn run_migrations(conn: &Connection) -> Result<()> {
    init_migrations_table(conn)?;

    let current_version = get_current_version(conn)?;

    for migration in MIGRATIONS {
        if migration.version > current_version {
            info!(
                version = migration.version,
                description = migration.description,
                "Applying migration"
            );

            conn.execute_batch(migration.sql)?;
            record_migration(conn, migration)?;
        }
    }

    let new_version = get_current_version(conn)?;
    if new_version > current_version {
        info!(
            from = current_version,
            to = new_version,
            "Database schema updated"
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Get the latest migration version (test helper)
    fn latest_version() -> u32 {
        MIGRATIONS.last().map(|m| m.version).unwrap_or(0)
    }

    #[test]
    fn test_migrations_run() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();

        let version = get_current_version(&conn).unwrap();
        assert_eq!(version, latest_version());
    }

    #[test]
    fn test_migrations_idempotent() {
        let conn = Connection::open_in_memory().unwrap();

        // Run twice
        run_migrations(&conn).unwrap();
        run_migrations(&conn).unwrap();

        let version = get_current_version(&conn).unwrap();
        assert_eq!(version, latest_version());
    }

    #[test]
    fn test_migrations_sequential() {
        for (i, migration) in MIGRATIONS.iter().enumerate() {
            assert_eq!(
                migration.version as usize,
                i + 1,
                "Migration {} should have version {}",
                migration.description,
                i + 1
            );
        }
    }
}
