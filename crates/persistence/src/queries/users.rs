// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! User and membership queries.

use std::collections::HashMap;

use diesel::prelude::*;
use diesel::SqliteConnection;
use num_traits::ToPrimitive;
use orgvote_domain::{MemberRole, Membership, User};
use tracing::debug;

use crate::data_models::VoterData;
use crate::diesel_schema::{department_members, departments, organization_members, users};
use crate::error::PersistenceError;

/// Diesel Queryable struct for user rows.
#[derive(Queryable, Selectable)]
#[diesel(table_name = users)]
struct UserRow {
    user_id: i64,
    name: String,
    email: String,
    vote_participation_count: i32,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            user_id: row.user_id,
            name: row.name,
            email: row.email,
            vote_participation_count: row.vote_participation_count.to_u32().unwrap_or(0),
        }
    }
}

/// Diesel Queryable struct for organization membership rows.
#[derive(Queryable, Selectable)]
#[diesel(table_name = organization_members)]
struct MembershipRow {
    organization_id: i64,
    user_id: i64,
    role: String,
}

impl TryFrom<MembershipRow> for Membership {
    type Error = PersistenceError;

    fn try_from(row: MembershipRow) -> Result<Self, Self::Error> {
        Ok(Self {
            organization_id: row.organization_id,
            user_id: row.user_id,
            role: MemberRole::parse(&row.role)
                .map_err(|e| PersistenceError::CorruptRecord(e.to_string()))?,
        })
    }
}

/// Retrieves a user by ID.
///
/// # Errors
///
/// Returns an error if the database query fails.
/// Returns `Ok(None)` if the user does not exist.
pub fn get_user(conn: &mut SqliteConnection, user_id: i64) -> Result<Option<User>, PersistenceError> {
    debug!(user_id, "Looking up user");

    let row: Option<UserRow> = users::table
        .filter(users::user_id.eq(user_id))
        .select(UserRow::as_select())
        .first(conn)
        .optional()?;

    Ok(row.map(User::from))
}

/// Retrieves a user by normalized email.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn get_user_by_email(
    conn: &mut SqliteConnection,
    email: &str,
) -> Result<Option<User>, PersistenceError> {
    let row: Option<UserRow> = users::table
        .filter(users::email.eq(email))
        .select(UserRow::as_select())
        .first(conn)
        .optional()?;

    Ok(row.map(User::from))
}

/// Retrieves the users with the given IDs, ordered by ID.
///
/// Unknown IDs are skipped.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn get_users(conn: &mut SqliteConnection, user_ids: &[i64]) -> Result<Vec<User>, PersistenceError> {
    if user_ids.is_empty() {
        return Ok(Vec::new());
    }

    let rows: Vec<UserRow> = users::table
        .filter(users::user_id.eq_any(user_ids))
        .order(users::user_id.asc())
        .select(UserRow::as_select())
        .load(conn)?;

    Ok(rows.into_iter().map(User::from).collect())
}

/// Retrieves a user's membership in an organization.
///
/// # Errors
///
/// Returns an error if the database query fails or the stored role is
/// unknown.
pub fn get_membership(
    conn: &mut SqliteConnection,
    organization_id: i64,
    user_id: i64,
) -> Result<Option<Membership>, PersistenceError> {
    let row: Option<MembershipRow> = organization_members::table
        .filter(organization_members::organization_id.eq(organization_id))
        .filter(organization_members::user_id.eq(user_id))
        .select(MembershipRow::as_select())
        .first(conn)
        .optional()?;

    row.map(Membership::try_from).transpose()
}

/// Lists every membership row of an organization.
///
/// # Errors
///
/// Returns an error if the database query fails or a stored role is
/// unknown.
pub fn list_organization_memberships(
    conn: &mut SqliteConnection,
    organization_id: i64,
) -> Result<Vec<Membership>, PersistenceError> {
    let rows: Vec<MembershipRow> = organization_members::table
        .filter(organization_members::organization_id.eq(organization_id))
        .order(organization_members::membership_id.asc())
        .select(MembershipRow::as_select())
        .load(conn)?;

    rows.into_iter().map(Membership::try_from).collect()
}

/// Lists the membership rows of a user across organizations.
///
/// # Errors
///
/// Returns an error if the database query fails or a stored role is
/// unknown.
pub fn list_user_memberships(
    conn: &mut SqliteConnection,
    user_id: i64,
) -> Result<Vec<Membership>, PersistenceError> {
    let rows: Vec<MembershipRow> = organization_members::table
        .filter(organization_members::user_id.eq(user_id))
        .select(MembershipRow::as_select())
        .load(conn)?;

    rows.into_iter().map(Membership::try_from).collect()
}

/// Lists the departments of an organization that a user belongs to.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn list_user_department_ids(
    conn: &mut SqliteConnection,
    organization_id: i64,
    user_id: i64,
) -> Result<Vec<i64>, PersistenceError> {
    let organization_departments: Vec<i64> = departments::table
        .filter(departments::organization_id.eq(organization_id))
        .select(departments::department_id)
        .load(conn)?;

    let ids: Vec<i64> = department_members::table
        .filter(department_members::user_id.eq(user_id))
        .filter(department_members::department_id.eq_any(&organization_departments))
        .order(department_members::department_id.asc())
        .select(department_members::department_id)
        .load(conn)?;

    Ok(ids)
}

/// Lists non-admin members of an organization with their departments.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn list_voters(
    conn: &mut SqliteConnection,
    organization_id: i64,
) -> Result<Vec<VoterData>, PersistenceError> {
    let voter_ids: Vec<i64> = organization_members::table
        .filter(organization_members::organization_id.eq(organization_id))
        .filter(organization_members::role.ne(MemberRole::Admin.as_str()))
        .select(organization_members::user_id)
        .load(conn)?;

    let voters: Vec<User> = get_users(conn, &voter_ids)?;

    let organization_departments: Vec<i64> = departments::table
        .filter(departments::organization_id.eq(organization_id))
        .select(departments::department_id)
        .load(conn)?;

    let assignments: Vec<(i64, i64)> = department_members::table
        .filter(department_members::user_id.eq_any(&voter_ids))
        .filter(department_members::department_id.eq_any(&organization_departments))
        .order(department_members::department_id.asc())
        .select((department_members::user_id, department_members::department_id))
        .load(conn)?;

    let mut by_user: HashMap<i64, Vec<i64>> = HashMap::new();
    for (user_id, department_id) in assignments {
        by_user.entry(user_id).or_default().push(department_id);
    }

    debug!(organization_id, count = voters.len(), "Listed voters");

    Ok(voters
        .into_iter()
        .map(|user| VoterData {
            department_ids: by_user.remove(&user.user_id).unwrap_or_default(),
            user,
        })
        .collect())
}
