// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Opening the marketplace database.
//!
//! Every connection gets foreign key enforcement and the embedded schema
//! migrations. File databases also switch to WAL journaling and wait on
//! locks instead of failing immediately. Identifiers are generated by the
//! application, so nothing here reads rowids back.

use diesel::prelude::*;
use diesel::sql_types::Integer;
use diesel::{Connection, RunQueryDsl, SqliteConnection};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use tracing::{debug, info};

use crate::error::PersistenceError;

/// Schema migrations embedded at compile time.
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Milliseconds a file database waits on a lock held by another connection.
const BUSY_TIMEOUT_MS: u32 = 5_000;

/// Where the database lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageMode {
    /// Shared-cache in-memory database, gone when the last connection closes.
    Memory,
    /// Database file on disk.
    File,
}

#[derive(QueryableByName)]
struct ForeignKeysRow {
    #[diesel(sql_type = Integer)]
    foreign_keys: i32,
}

/// Runs a PRAGMA statement. Diesel has no DSL for them.
fn pragma(conn: &mut SqliteConnection, statement: &str) -> Result<(), PersistenceError> {
    debug!(statement, "Applying PRAGMA");
    diesel::sql_query(format!("PRAGMA {statement}"))
        .execute(conn)
        .map_err(|e| PersistenceError::QueryFailed(e.to_string()))?;
    Ok(())
}

/// Fails unless the connection enforces foreign keys.
///
/// # Errors
///
/// Returns `ForeignKeyEnforcementNotEnabled` when enforcement is off.
pub fn verify_foreign_key_enforcement(conn: &mut SqliteConnection) -> Result<(), PersistenceError> {
    let row: ForeignKeysRow = diesel::sql_query("PRAGMA foreign_keys").get_result(conn)?;
    if row.foreign_keys == 0 {
        return Err(PersistenceError::ForeignKeyEnforcementNotEnabled);
    }
    Ok(())
}

/// Opens the database at `database_url` and brings its schema up to date.
///
/// # Errors
///
/// Returns an error if the connection cannot be established, a PRAGMA
/// fails, a migration fails, or foreign keys end up unenforced.
pub fn open(database_url: &str, mode: StorageMode) -> Result<SqliteConnection, PersistenceError> {
    info!(database_url, ?mode, "Opening marketplace database");

    let mut conn: SqliteConnection = SqliteConnection::establish(database_url)
        .map_err(|e| PersistenceError::DatabaseConnectionFailed(e.to_string()))?;

    pragma(&mut conn, "foreign_keys = ON")?;
    if mode == StorageMode::File {
        pragma(&mut conn, "journal_mode = WAL")?;
        pragma(&mut conn, &format!("busy_timeout = {BUSY_TIMEOUT_MS}"))?;
    }

    let applied: usize = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(|e| PersistenceError::MigrationFailed(e.to_string()))?
        .len();
    info!(applied, "Schema migrations applied");

    verify_foreign_key_enforcement(&mut conn)?;
    Ok(conn)
}
