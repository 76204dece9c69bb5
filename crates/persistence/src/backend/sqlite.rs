// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! `SQLite` connection setup.
//!
//! Opening a connection applies the connection pragmas and then the
//! embedded migrations. Raw SQL is confined to this file.

use diesel::connection::SimpleConnection;
use diesel::dsl::sql;
use diesel::prelude::*;
use diesel::sql_types::{BigInt, Integer};
use diesel::{Connection, RunQueryDsl, SqliteConnection};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use tracing::{debug, info};

use crate::error::PersistenceError;

/// How long a connection waits on a locked database before failing.
///
/// Ballot submission takes the write lock up front, so concurrent writers
/// on other connections queue behind it for up to this long.
const BUSY_TIMEOUT_MS: u32 = 5_000;

/// Embedded `SQLite` migrations.
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Journal mode applied when a connection is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Journal {
    /// `SQLite`'s default rollback journal. Used for in-memory databases.
    Rollback,
    /// Write-ahead log, so readers do not block the single writer.
    Wal,
}

#[derive(QueryableByName)]
struct ForeignKeysPragma {
    #[diesel(sql_type = Integer)]
    foreign_keys: i32,
}

/// Returns `last_insert_rowid()` for the connection.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn get_last_insert_rowid(conn: &mut SqliteConnection) -> Result<i64, PersistenceError> {
    Ok(diesel::select(sql::<BigInt>("last_insert_rowid()")).get_result(conn)?)
}

/// Fails unless `PRAGMA foreign_keys` is on for the connection.
///
/// # Errors
///
/// Returns `PersistenceError::ForeignKeyEnforcementNotEnabled` when it is off.
pub fn verify_foreign_key_enforcement(conn: &mut SqliteConnection) -> Result<(), PersistenceError> {
    let pragma: ForeignKeysPragma = diesel::sql_query("PRAGMA foreign_keys").get_result(conn)?;
    if pragma.foreign_keys == 0 {
        return Err(PersistenceError::ForeignKeyEnforcementNotEnabled);
    }
    debug!("SQLite foreign key enforcement is enabled");
    Ok(())
}

/// Opens a connection, applies pragmas, and runs pending migrations.
///
/// `database_url` is either a file path or a `file:` URI.
///
/// # Errors
///
/// Returns an error if the connection cannot be opened, a pragma fails,
/// or a migration fails.
pub fn open_connection(
    database_url: &str,
    journal: Journal,
) -> Result<SqliteConnection, PersistenceError> {
    info!(database_url, ?journal, "Opening SQLite database");

    let mut conn: SqliteConnection = SqliteConnection::establish(database_url)
        .map_err(|e| PersistenceError::DatabaseConnectionFailed(e.to_string()))?;

    let mut pragmas: String =
        format!("PRAGMA foreign_keys = ON; PRAGMA busy_timeout = {BUSY_TIMEOUT_MS};");
    if journal == Journal::Wal {
        pragmas.push_str(" PRAGMA journal_mode = WAL;");
    }
    conn.batch_execute(&pragmas)
        .map_err(|e| PersistenceError::QueryFailed(e.to_string()))?;

    let applied = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(|e| PersistenceError::MigrationFailed(e.to_string()))?;
    info!(applied = applied.len(), "Migrations applied");

    verify_foreign_key_enforcement(&mut conn)?;
    Ok(conn)
}
