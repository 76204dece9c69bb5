// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Organization queries.

use std::collections::{HashMap, HashSet};

use diesel::prelude::*;
use diesel::SqliteConnection;
use orgvote::OrganizationContext;
use orgvote_domain::{DepartmentTree, MemberRole, Organization};

use super::decode_timestamp;
use crate::data_models::MembershipData;
use crate::diesel_schema::{organization_members, organizations};
use crate::error::PersistenceError;
use crate::queries::{departments, users};

/// Diesel Queryable struct for organization rows.
#[derive(Queryable, Selectable)]
#[diesel(table_name = organizations)]
struct OrganizationRow {
    organization_id: i64,
    name: String,
    creator_id: i64,
    created_at: String,
}

impl TryFrom<OrganizationRow> for Organization {
    type Error = PersistenceError;

    fn try_from(row: OrganizationRow) -> Result<Self, Self::Error> {
        Ok(Self {
            organization_id: row.organization_id,
            name: row.name,
            creator_id: row.creator_id,
            created_at: decode_timestamp(&row.created_at)?,
        })
    }
}

/// Retrieves an organization by ID.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn get_organization(
    conn: &mut SqliteConnection,
    organization_id: i64,
) -> Result<Option<Organization>, PersistenceError> {
    let row: Option<OrganizationRow> = organizations::table
        .filter(organizations::organization_id.eq(organization_id))
        .select(OrganizationRow::as_select())
        .first(conn)
        .optional()?;

    row.map(Organization::try_from).transpose()
}

/// Lists organizations created by a user, newest first.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn list_organizations_by_creator(
    conn: &mut SqliteConnection,
    creator_id: i64,
) -> Result<Vec<Organization>, PersistenceError> {
    let rows: Vec<OrganizationRow> = organizations::table
        .filter(organizations::creator_id.eq(creator_id))
        .order((
            organizations::created_at.desc(),
            organizations::organization_id.desc(),
        ))
        .select(OrganizationRow::as_select())
        .load(conn)?;

    rows.into_iter().map(Organization::try_from).collect()
}

/// Lists organizations a user belongs to or created, newest first.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn list_memberships(
    conn: &mut SqliteConnection,
    user_id: i64,
) -> Result<Vec<MembershipData>, PersistenceError> {
    let roles: HashMap<i64, MemberRole> = users::list_user_memberships(conn, user_id)?
        .into_iter()
        .map(|m| (m.organization_id, m.role))
        .collect();

    let member_of: Vec<i64> = roles.keys().copied().collect();

    let rows: Vec<OrganizationRow> = organizations::table
        .filter(
            organizations::organization_id
                .eq_any(&member_of)
                .or(organizations::creator_id.eq(user_id)),
        )
        .order((
            organizations::created_at.desc(),
            organizations::organization_id.desc(),
        ))
        .select(OrganizationRow::as_select())
        .load(conn)?;

    rows.into_iter()
        .map(|row| {
            let organization: Organization = Organization::try_from(row)?;
            let role: MemberRole = roles
                .get(&organization.organization_id)
                .copied()
                .unwrap_or(MemberRole::Admin);
            Ok(MembershipData { organization, role })
        })
        .collect()
}

/// Returns whether an organization exists.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn organization_exists(
    conn: &mut SqliteConnection,
    organization_id: i64,
) -> Result<bool, PersistenceError> {
    let count: i64 = organizations::table
        .filter(organizations::organization_id.eq(organization_id))
        .count()
        .get_result(conn)?;
    Ok(count > 0)
}

/// Loads the members and department tree an organization's commands are
/// validated against.
///
/// # Errors
///
/// Returns `PersistenceError::NotFound` if the organization does not exist.
pub fn load_organization_context(
    conn: &mut SqliteConnection,
    organization_id: i64,
) -> Result<OrganizationContext, PersistenceError> {
    if !organization_exists(conn, organization_id)? {
        return Err(PersistenceError::NotFound(format!(
            "Organization {organization_id}"
        )));
    }

    let member_ids: HashSet<i64> = organization_members::table
        .filter(organization_members::organization_id.eq(organization_id))
        .select(organization_members::user_id)
        .load::<i64>(conn)?
        .into_iter()
        .collect();

    let tree: DepartmentTree =
        DepartmentTree::new(departments::list_departments(conn, organization_id)?);

    Ok(OrganizationContext::new(organization_id, member_ids, tree))
}
