// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! User, membership, and voter mutations.

use diesel::prelude::*;
use diesel::SqliteConnection;
use num_traits::ToPrimitive;
use orgvote::CoreError;
use orgvote_domain::{MemberRole, format_timestamp};
use time::OffsetDateTime;
use tracing::{debug, info};

use crate::backend::PersistenceBackend;
use crate::data_models::MembershipChange;
use crate::diesel_schema::{
    department_members, departments, organization_members, slogans, users, vote_candidates,
    vote_results, votes,
};
use crate::error::PersistenceError;
use crate::queries;

/// bcrypt work factor for stored password hashes.
const PASSWORD_HASH_COST: u32 = 10;

/// Creates a new user.
///
/// The email is stored as given; callers normalize it first.
///
/// # Arguments
///
/// * `conn` - The database connection
/// * `name` - The display name
/// * `email` - The normalized email address
/// * `password` - The plain-text password (will be hashed)
/// * `now` - The creation time
///
/// # Errors
///
/// Returns `PersistenceError::UniqueViolation` if the email is taken.
pub fn create_user(
    conn: &mut SqliteConnection,
    name: &str,
    email: &str,
    password: &str,
    now: OffsetDateTime,
) -> Result<i64, PersistenceError> {
    info!(email, "Creating user");

    let password_hash: String = bcrypt::hash(password, PASSWORD_HASH_COST)
        .map_err(|e| PersistenceError::Other(format!("Failed to hash password: {e}")))?;
    let created_at: String = format_timestamp(now)?;

    diesel::insert_into(users::table)
        .values((
            users::name.eq(name),
            users::email.eq(email),
            users::password_hash.eq(&password_hash),
            users::vote_participation_count.eq(0),
            users::created_at.eq(&created_at),
        ))
        .execute(conn)?;

    let user_id: i64 = conn.get_last_insert_rowid()?;

    info!(user_id, "User created");

    Ok(user_id)
}

/// Creates a user and, when an organization is given, adds them to it as a
/// member. Both writes commit together.
///
/// # Errors
///
/// Returns `PersistenceError::NotFound` if the organization does not
/// exist, or `PersistenceError::UniqueViolation` if the email is taken.
/// Nothing is written in either case.
pub fn register_user(
    conn: &mut SqliteConnection,
    name: &str,
    email: &str,
    password: &str,
    organization_id: Option<i64>,
    now: OffsetDateTime,
) -> Result<i64, PersistenceError> {
    conn.transaction::<_, PersistenceError, _>(|conn| {
        let Some(organization_id) = organization_id else {
            return create_user(conn, name, email, password, now);
        };

        if queries::organizations::get_organization(conn, organization_id)?.is_none() {
            return Err(PersistenceError::NotFound(format!(
                "Organization {organization_id}"
            )));
        }

        let user_id: i64 = create_user(conn, name, email, password, now)?;
        add_organization_member(conn, organization_id, user_id, MemberRole::Member, now)?;
        Ok(user_id)
    })
}

/// Adds a user to an organization with the given role.
///
/// # Errors
///
/// Returns an error if the database write fails.
pub fn add_organization_member(
    conn: &mut SqliteConnection,
    organization_id: i64,
    user_id: i64,
    role: MemberRole,
    now: OffsetDateTime,
) -> Result<MembershipChange, PersistenceError> {
    let created_at: String = format_timestamp(now)?;

    let inserted: usize = diesel::insert_or_ignore_into(organization_members::table)
        .values((
            organization_members::organization_id.eq(organization_id),
            organization_members::user_id.eq(user_id),
            organization_members::role.eq(role.as_str()),
            organization_members::created_at.eq(&created_at),
        ))
        .execute(conn)?;

    if inserted == 0 {
        debug!(organization_id, user_id, "User already a member");
        return Ok(MembershipChange::AlreadyMember);
    }

    info!(organization_id, user_id, role = role.as_str(), "Member added");
    Ok(MembershipChange::Added)
}

/// Adds a user to a department. Existing assignments are left untouched.
///
/// # Errors
///
/// Returns an error if the database write fails.
pub fn add_department_member(
    conn: &mut SqliteConnection,
    department_id: i64,
    user_id: i64,
) -> Result<MembershipChange, PersistenceError> {
    let inserted: usize = diesel::insert_or_ignore_into(department_members::table)
        .values((
            department_members::department_id.eq(department_id),
            department_members::user_id.eq(user_id),
        ))
        .execute(conn)?;

    Ok(if inserted == 0 {
        MembershipChange::AlreadyMember
    } else {
        MembershipChange::Added
    })
}

/// Renames a voter and replaces their department assignments within one
/// organization.
///
/// Assignments in other organizations are not touched.
///
/// # Errors
///
/// Returns `PersistenceError::NotFound` if the user is not a member, or
/// `PersistenceError::TransitionRejected` if a department belongs to
/// another organization.
pub fn update_voter(
    conn: &mut SqliteConnection,
    organization_id: i64,
    user_id: i64,
    name: &str,
    department_ids: &[i64],
) -> Result<(), PersistenceError> {
    conn.transaction::<_, PersistenceError, _>(|conn| {
        if queries::users::get_membership(conn, organization_id, user_id)?.is_none() {
            return Err(PersistenceError::NotFound(format!(
                "User {user_id} in organization {organization_id}"
            )));
        }

        let organization_departments: Vec<i64> = departments::table
            .filter(departments::organization_id.eq(organization_id))
            .select(departments::department_id)
            .load(conn)?;

        if let Some(foreign) = department_ids
            .iter()
            .find(|id| !organization_departments.contains(id))
        {
            return Err(PersistenceError::TransitionRejected(
                CoreError::DepartmentOutsideOrganization {
                    department_id: *foreign,
                    organization_id,
                },
            ));
        }

        diesel::update(users::table.filter(users::user_id.eq(user_id)))
            .set(users::name.eq(name))
            .execute(conn)?;

        diesel::delete(
            department_members::table
                .filter(department_members::user_id.eq(user_id))
                .filter(department_members::department_id.eq_any(&organization_departments)),
        )
        .execute(conn)?;

        for department_id in department_ids {
            add_department_member(conn, *department_id, user_id)?;
        }

        info!(
            organization_id,
            user_id,
            departments = department_ids.len(),
            "Voter updated"
        );
        Ok(())
    })
}

/// Removes a user from an organization and from its departments.
///
/// Candidacies in the organization's votes go with the membership, along
/// with any slogans. A member who has already received ballots in one of
/// those votes cannot be removed.
///
/// # Errors
///
/// Returns `PersistenceError::NotFound` if the user is not a member, or
/// `PersistenceError::TransitionRejected` with
/// `CoreError::CandidateHasBallots` if a candidacy has ballots.
pub fn remove_voter(
    conn: &mut SqliteConnection,
    organization_id: i64,
    user_id: i64,
) -> Result<(), PersistenceError> {
    conn.transaction::<_, PersistenceError, _>(|conn| {
        let organization_departments: Vec<i64> = departments::table
            .filter(departments::organization_id.eq(organization_id))
            .select(departments::department_id)
            .load(conn)?;

        diesel::delete(
            department_members::table
                .filter(department_members::user_id.eq(user_id))
                .filter(department_members::department_id.eq_any(&organization_departments)),
        )
        .execute(conn)?;

        let removed: usize = diesel::delete(
            organization_members::table
                .filter(organization_members::organization_id.eq(organization_id))
                .filter(organization_members::user_id.eq(user_id)),
        )
        .execute(conn)?;

        if removed == 0 {
            return Err(PersistenceError::NotFound(format!(
                "User {user_id} in organization {organization_id}"
            )));
        }

        let withdrawn: usize = withdraw_candidacies(conn, organization_id, user_id)?;

        info!(organization_id, user_id, withdrawn, "Voter removed");
        Ok(())
    })
}

/// Deletes a user's candidate rows and slogans in an organization's votes.
/// Runs inside the caller's transaction.
fn withdraw_candidacies(
    conn: &mut SqliteConnection,
    organization_id: i64,
    user_id: i64,
) -> Result<usize, PersistenceError> {
    let vote_ids: Vec<i64> = votes::table
        .filter(votes::organization_id.eq(organization_id))
        .select(votes::vote_id)
        .load(conn)?;

    let candidate_ids: Vec<i64> = vote_candidates::table
        .filter(vote_candidates::user_id.eq(user_id))
        .filter(vote_candidates::vote_id.eq_any(&vote_ids))
        .select(vote_candidates::candidate_id)
        .load(conn)?;

    let balloted: Vec<i64> = vote_results::table
        .filter(vote_results::candidate_id.eq_any(&candidate_ids))
        .select(vote_results::vote_id)
        .load(conn)?;

    if let Some(vote_id) = balloted.first().copied() {
        let ballots: u32 = balloted
            .iter()
            .filter(|id| **id == vote_id)
            .count()
            .to_u32()
            .ok_or_else(|| PersistenceError::Other(String::from("Ballot count overflow")))?;
        debug!(organization_id, user_id, vote_id, ballots, "Candidate has ballots");
        return Err(PersistenceError::TransitionRejected(
            CoreError::CandidateHasBallots {
                vote_id,
                user_id,
                ballots,
            },
        ));
    }

    diesel::delete(
        slogans::table
            .filter(slogans::user_id.eq(user_id))
            .filter(slogans::vote_id.eq_any(&vote_ids)),
    )
    .execute(conn)?;

    let withdrawn: usize = diesel::delete(
        vote_candidates::table.filter(vote_candidates::candidate_id.eq_any(&candidate_ids)),
    )
    .execute(conn)?;

    Ok(withdrawn)
}
