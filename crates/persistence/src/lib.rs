// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Persistence layer for the organization voting system.
//!
//! This crate stores organizations, departments, members, votes,
//! candidates, ballots, and slogans in `SQLite` through Diesel.
//!
//! ## Transactions
//!
//! Every write that touches more than one row runs in a single transaction.
//! Writes that must be validated against current state (ballot admission,
//! department commands, candidate changes) load that state inside an
//! immediate transaction and re-run the core validation there. A request
//! that fails mid-transaction leaves no partial writes behind.
//!
//! ## Storage Format
//!
//! - Timestamps are UTC RFC 3339 text, so text order is time order.
//! - Booleans are stored as `0`/`1` integers.
//! - Ballot statistics are stored as a JSON document.
//!
//! ## Testing Philosophy
//!
//! - Tests run against isolated shared-cache in-memory databases
//! - Each `new_in_memory()` call receives its own database
//! - Concurrency tests use a temporary database file with one connection
//!   per thread

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(clippy::multiple_crate_versions)]

use diesel::SqliteConnection;
use orgvote::{DepartmentCommand, OrganizationContext, VoteChanges, VoteDraft, VoteSnapshot};
use orgvote_domain::{
    Ballot, Department, MemberRole, Membership, Organization, Slogan, User, Vote,
};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use time::OffsetDateTime;

mod backend;
mod data_models;
mod diesel_schema;
mod error;
mod mutations;
mod queries;

#[cfg(test)]
mod tests;

pub use data_models::{DepartmentOutcome, MembershipChange, MembershipData, VoterData};
pub use error::PersistenceError;

use backend::PersistenceBackend;
use backend::sqlite::{Journal, open_connection};

/// Atomic counter for generating unique in-memory database names.
///
/// Each call to `new_in_memory()` receives a unique sequential ID.
static DB_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Type alias for the `SQLite` persistence adapter.
pub type SqlitePersistence = Persistence;

/// Persistence adapter over a single `SQLite` connection.
pub struct Persistence {
    conn: SqliteConnection,
}

impl Persistence {
    /// Opens a private in-memory database.
    ///
    /// Every call gets its own shared-cache database name, so adapters
    /// created in the same process never see each other's rows.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be initialized.
    pub fn new_in_memory() -> Result<Self, PersistenceError> {
        let db_id: u64 = DB_COUNTER.fetch_add(1, Ordering::SeqCst);
        let url: String = format!("file:orgvote_mem_{db_id}?mode=memory&cache=shared");
        let conn: SqliteConnection = open_connection(&url, Journal::Rollback)?;
        Ok(Self { conn })
    }

    /// Opens, or creates, a database file in WAL mode.
    ///
    /// Several adapters may open the same file; writers serialize on the
    /// database lock.
    ///
    /// # Errors
    ///
    /// Returns an error if the path is not UTF-8 or the database cannot be
    /// opened or migrated.
    pub fn new_with_file<P: AsRef<Path>>(path: P) -> Result<Self, PersistenceError> {
        let path: &str = path.as_ref().to_str().ok_or_else(|| {
            PersistenceError::InitializationError(String::from("Database path is not UTF-8"))
        })?;
        let conn: SqliteConnection = open_connection(path, Journal::Wal)?;
        Ok(Self { conn })
    }

    /// Verifies that foreign key enforcement is enabled.
    ///
    /// # Errors
    ///
    /// Returns an error if foreign key enforcement is not enabled.
    pub fn verify_foreign_key_enforcement(&mut self) -> Result<(), PersistenceError> {
        self.conn.verify_foreign_key_enforcement()
    }

    // ========================================================================
    // Users & Memberships
    // ========================================================================

    /// Creates a user with a bcrypt-hashed password.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError::UniqueViolation` if the email is taken.
    pub fn create_user(
        &mut self,
        name: &str,
        email: &str,
        password: &str,
        now: OffsetDateTime,
    ) -> Result<i64, PersistenceError> {
        mutations::users::create_user(&mut self.conn, name, email, password, now)
    }

    /// Creates a user and their optional first membership in one
    /// transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the organization does not exist or the email is
    /// taken.
    pub fn register_user(
        &mut self,
        name: &str,
        email: &str,
        password: &str,
        organization_id: Option<i64>,
        now: OffsetDateTime,
    ) -> Result<i64, PersistenceError> {
        mutations::users::register_user(&mut self.conn, name, email, password, organization_id, now)
    }

    /// Retrieves a user by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn get_user(&mut self, user_id: i64) -> Result<Option<User>, PersistenceError> {
        queries::users::get_user(&mut self.conn, user_id)
    }

    /// Retrieves a user by normalized email.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn get_user_by_email(&mut self, email: &str) -> Result<Option<User>, PersistenceError> {
        queries::users::get_user_by_email(&mut self.conn, email)
    }

    /// Retrieves the users with the given IDs, ordered by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn get_users(&mut self, user_ids: &[i64]) -> Result<Vec<User>, PersistenceError> {
        queries::users::get_users(&mut self.conn, user_ids)
    }

    /// Retrieves a user's membership in an organization.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn get_membership(
        &mut self,
        organization_id: i64,
        user_id: i64,
    ) -> Result<Option<Membership>, PersistenceError> {
        queries::users::get_membership(&mut self.conn, organization_id, user_id)
    }

    /// Lists every membership row of an organization.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn list_organization_memberships(
        &mut self,
        organization_id: i64,
    ) -> Result<Vec<Membership>, PersistenceError> {
        queries::users::list_organization_memberships(&mut self.conn, organization_id)
    }

    /// Adds a user to an organization. Existing memberships are kept as is.
    ///
    /// # Errors
    ///
    /// Returns an error if the database write fails.
    pub fn add_organization_member(
        &mut self,
        organization_id: i64,
        user_id: i64,
        role: MemberRole,
        now: OffsetDateTime,
    ) -> Result<MembershipChange, PersistenceError> {
        mutations::users::add_organization_member(&mut self.conn, organization_id, user_id, role, now)
    }

    /// Adds a user to a department. Existing assignments are kept as is.
    ///
    /// # Errors
    ///
    /// Returns an error if the database write fails.
    pub fn add_department_member(
        &mut self,
        department_id: i64,
        user_id: i64,
    ) -> Result<MembershipChange, PersistenceError> {
        mutations::users::add_department_member(&mut self.conn, department_id, user_id)
    }

    /// Lists the departments of an organization a user belongs to.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn list_user_department_ids(
        &mut self,
        organization_id: i64,
        user_id: i64,
    ) -> Result<Vec<i64>, PersistenceError> {
        queries::users::list_user_department_ids(&mut self.conn, organization_id, user_id)
    }

    /// Lists non-admin members of an organization with their departments.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn list_voters(&mut self, organization_id: i64) -> Result<Vec<VoterData>, PersistenceError> {
        queries::users::list_voters(&mut self.conn, organization_id)
    }

    /// Renames a voter and replaces their departments within an organization.
    ///
    /// # Errors
    ///
    /// Returns an error if the user is not a member or a department belongs
    /// to another organization.
    pub fn update_voter(
        &mut self,
        organization_id: i64,
        user_id: i64,
        name: &str,
        department_ids: &[i64],
    ) -> Result<(), PersistenceError> {
        mutations::users::update_voter(&mut self.conn, organization_id, user_id, name, department_ids)
    }

    /// Removes a user from an organization and its departments.
    ///
    /// # Errors
    ///
    /// Returns an error if the user is not a member.
    pub fn remove_voter(&mut self, organization_id: i64, user_id: i64) -> Result<(), PersistenceError> {
        mutations::users::remove_voter(&mut self.conn, organization_id, user_id)
    }

    // ========================================================================
    // Organizations
    // ========================================================================

    /// Creates an organization with its creator as admin.
    ///
    /// # Errors
    ///
    /// Returns an error if the database write fails.
    pub fn create_organization(
        &mut self,
        name: &str,
        creator_id: i64,
        now: OffsetDateTime,
    ) -> Result<i64, PersistenceError> {
        mutations::organizations::create_organization(&mut self.conn, name, creator_id, now)
    }

    /// Retrieves an organization by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn get_organization(
        &mut self,
        organization_id: i64,
    ) -> Result<Option<Organization>, PersistenceError> {
        queries::organizations::get_organization(&mut self.conn, organization_id)
    }

    /// Lists organizations created by a user, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn list_organizations_by_creator(
        &mut self,
        creator_id: i64,
    ) -> Result<Vec<Organization>, PersistenceError> {
        queries::organizations::list_organizations_by_creator(&mut self.conn, creator_id)
    }

    /// Lists organizations a user belongs to or created, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn list_memberships(&mut self, user_id: i64) -> Result<Vec<MembershipData>, PersistenceError> {
        queries::organizations::list_memberships(&mut self.conn, user_id)
    }

    /// Loads the members and department tree of an organization.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError::NotFound` if the organization does not exist.
    pub fn load_organization_context(
        &mut self,
        organization_id: i64,
    ) -> Result<OrganizationContext, PersistenceError> {
        queries::organizations::load_organization_context(&mut self.conn, organization_id)
    }

    /// Deletes an organization and everything it owns.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError::NotFound` if the organization does not exist.
    pub fn delete_organization(&mut self, organization_id: i64) -> Result<(), PersistenceError> {
        mutations::organizations::delete_organization(&mut self.conn, organization_id)
    }

    // ========================================================================
    // Departments
    // ========================================================================

    /// Lists the departments of an organization.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn list_departments(
        &mut self,
        organization_id: i64,
    ) -> Result<Vec<Department>, PersistenceError> {
        queries::departments::list_departments(&mut self.conn, organization_id)
    }

    /// Retrieves a department by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn get_department(
        &mut self,
        department_id: i64,
    ) -> Result<Option<Department>, PersistenceError> {
        queries::departments::get_department(&mut self.conn, department_id)
    }

    /// Applies a department command.
    ///
    /// # Errors
    ///
    /// Returns an error if the command is rejected or the write fails.
    pub fn apply_department_command(
        &mut self,
        organization_id: i64,
        command: DepartmentCommand,
        now: OffsetDateTime,
    ) -> Result<DepartmentOutcome, PersistenceError> {
        mutations::departments::apply_department_command(&mut self.conn, organization_id, command, now)
    }

    // ========================================================================
    // Votes
    // ========================================================================

    /// Creates a vote with its candidates.
    ///
    /// # Errors
    ///
    /// Returns an error if the draft is rejected or the write fails.
    pub fn create_vote(
        &mut self,
        organization_id: i64,
        draft: VoteDraft,
        now: OffsetDateTime,
    ) -> Result<i64, PersistenceError> {
        mutations::votes::create_vote(&mut self.conn, organization_id, draft, now)
    }

    /// Applies a partial update to a vote.
    ///
    /// # Errors
    ///
    /// Returns an error if the changes are rejected or the write fails.
    pub fn update_vote(&mut self, vote_id: i64, changes: VoteChanges) -> Result<(), PersistenceError> {
        mutations::votes::update_vote(&mut self.conn, vote_id, changes)
    }

    /// Deletes a vote with its ballots, slogans, and candidates.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError::NotFound` if the vote does not exist.
    pub fn delete_vote(&mut self, vote_id: i64) -> Result<(), PersistenceError> {
        mutations::votes::delete_vote(&mut self.conn, vote_id)
    }

    /// Retrieves a vote by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn get_vote(&mut self, vote_id: i64) -> Result<Option<Vote>, PersistenceError> {
        queries::votes::get_vote(&mut self.conn, vote_id)
    }

    /// Loads a vote with its candidates and ballots.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn get_vote_snapshot(&mut self, vote_id: i64) -> Result<Option<VoteSnapshot>, PersistenceError> {
        queries::votes::get_vote_snapshot(&mut self.conn, vote_id)
    }

    /// Lists the votes of an organization, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn list_vote_snapshots(
        &mut self,
        organization_id: i64,
    ) -> Result<Vec<VoteSnapshot>, PersistenceError> {
        queries::votes::list_vote_snapshots(&mut self.conn, organization_id)
    }

    /// Lists the slogans of a vote.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn list_slogans(&mut self, vote_id: i64) -> Result<Vec<Slogan>, PersistenceError> {
        queries::votes::list_slogans(&mut self.conn, vote_id)
    }

    /// Sets, replaces, or clears a candidate's slogan.
    ///
    /// # Errors
    ///
    /// Returns an error if the database write fails.
    pub fn set_slogan(&mut self, vote_id: i64, user_id: i64, text: &str) -> Result<(), PersistenceError> {
        mutations::votes::set_slogan(&mut self.conn, vote_id, user_id, text)
    }

    // ========================================================================
    // Ballots
    // ========================================================================

    /// Records a ballot and recomputes the winner flags of the vote.
    ///
    /// # Errors
    ///
    /// Returns an error if the ballot is rejected or the write fails.
    pub fn submit_ballot(
        &mut self,
        vote_id: i64,
        voter_id: i64,
        candidate_id: i64,
        now: OffsetDateTime,
    ) -> Result<Ballot, PersistenceError> {
        mutations::ballots::submit_ballot(&mut self.conn, vote_id, voter_id, candidate_id, now)
    }
}
