// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Organization mutations.

use diesel::prelude::*;
use diesel::SqliteConnection;
use orgvote_domain::{MemberRole, format_timestamp};
use time::OffsetDateTime;
use tracing::info;

use super::users::add_organization_member;
use super::votes::delete_vote_rows;
use crate::backend::PersistenceBackend;
use crate::diesel_schema::{organizations, votes};
use crate::error::PersistenceError;

/// Creates an organization and registers its creator as an admin.
///
/// # Arguments
///
/// * `conn` - The database connection
/// * `name` - The validated organization name
/// * `creator_id` - The creating user
/// * `now` - The creation time
///
/// # Errors
///
/// Returns an error if either insert fails. Nothing is written in that case.
pub fn create_organization(
    conn: &mut SqliteConnection,
    name: &str,
    creator_id: i64,
    now: OffsetDateTime,
) -> Result<i64, PersistenceError> {
    let created_at: String = format_timestamp(now)?;

    conn.transaction::<_, PersistenceError, _>(|conn| {
        diesel::insert_into(organizations::table)
            .values((
                organizations::name.eq(name),
                organizations::creator_id.eq(creator_id),
                organizations::created_at.eq(&created_at),
            ))
            .execute(conn)?;

        let organization_id: i64 = conn.get_last_insert_rowid()?;

        add_organization_member(conn, organization_id, creator_id, MemberRole::Admin, now)?;

        info!(organization_id, creator_id, "Organization created");
        Ok(organization_id)
    })
}

/// Deletes an organization with all of its votes, departments, and
/// memberships.
///
/// Ballots are removed before candidates; the remaining dependent rows
/// cascade.
///
/// # Errors
///
/// Returns `PersistenceError::NotFound` if the organization does not exist.
pub fn delete_organization(
    conn: &mut SqliteConnection,
    organization_id: i64,
) -> Result<(), PersistenceError> {
    conn.transaction::<_, PersistenceError, _>(|conn| {
        let vote_ids: Vec<i64> = votes::table
            .filter(votes::organization_id.eq(organization_id))
            .select(votes::vote_id)
            .load(conn)?;

        delete_vote_rows(conn, &vote_ids)?;

        let removed: usize = diesel::delete(
            organizations::table.filter(organizations::organization_id.eq(organization_id)),
        )
        .execute(conn)?;

        if removed == 0 {
            return Err(PersistenceError::NotFound(format!(
                "Organization {organization_id}"
            )));
        }

        info!(organization_id, votes = vote_ids.len(), "Organization deleted");
        Ok(())
    })
}
