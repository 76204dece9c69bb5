// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Department mutations.

use diesel::prelude::*;
use diesel::SqliteConnection;
use orgvote::{DepartmentCommand, DepartmentTransition, OrganizationContext};
use orgvote_domain::format_timestamp;
use time::OffsetDateTime;
use tracing::info;

use super::votes::delete_vote_rows;
use crate::backend::PersistenceBackend;
use crate::data_models::DepartmentOutcome;
use crate::diesel_schema::{department_members, departments};
use crate::error::PersistenceError;
use crate::queries;

/// Applies a department command to an organization.
///
/// The command is validated against the department tree loaded inside a
/// write-locking transaction. Deletion removes votes scoped to any removed
/// department, then the departments deepest first.
///
/// # Arguments
///
/// * `conn` - The database connection
/// * `organization_id` - The organization owning the departments
/// * `command` - The command to apply
/// * `now` - Creation time for new departments
///
/// # Errors
///
/// Returns `PersistenceError::NotFound` if the organization does not exist,
/// or `PersistenceError::TransitionRejected` if the command is invalid.
pub fn apply_department_command(
    conn: &mut SqliteConnection,
    organization_id: i64,
    command: DepartmentCommand,
    now: OffsetDateTime,
) -> Result<DepartmentOutcome, PersistenceError> {
    let created_at: String = format_timestamp(now)?;

    conn.immediate_transaction::<_, PersistenceError, _>(|conn| {
        let context: OrganizationContext =
            queries::organizations::load_organization_context(conn, organization_id)?;

        match orgvote::apply_department_command(&context, command)? {
            DepartmentTransition::Create {
                organization_id,
                name,
                parent_id,
            } => {
                diesel::insert_into(departments::table)
                    .values((
                        departments::organization_id.eq(organization_id),
                        departments::name.eq(&name),
                        departments::parent_id.eq(parent_id),
                        departments::created_at.eq(&created_at),
                    ))
                    .execute(conn)?;

                let department_id: i64 = conn.get_last_insert_rowid()?;
                info!(department_id, organization_id, ?parent_id, "Department created");
                Ok(DepartmentOutcome::Created(department_id))
            }
            DepartmentTransition::Update {
                department_id,
                name,
                parent_id,
            } => {
                diesel::update(departments::table.filter(departments::department_id.eq(department_id)))
                    .set((
                        departments::name.eq(&name),
                        departments::parent_id.eq(parent_id),
                    ))
                    .execute(conn)?;

                info!(department_id, ?parent_id, "Department updated");
                Ok(DepartmentOutcome::Updated(department_id))
            }
            DepartmentTransition::Delete {
                department_id,
                order,
            } => {
                let vote_ids: Vec<i64> =
                    queries::votes::list_vote_ids_for_departments(conn, &order)?;
                delete_vote_rows(conn, &vote_ids)?;

                diesel::delete(
                    department_members::table
                        .filter(department_members::department_id.eq_any(&order)),
                )
                .execute(conn)?;

                for id in &order {
                    diesel::delete(departments::table.filter(departments::department_id.eq(*id)))
                        .execute(conn)?;
                }

                info!(
                    department_id,
                    removed = order.len(),
                    votes = vote_ids.len(),
                    "Department deleted"
                );
                Ok(DepartmentOutcome::Deleted(order))
            }
        }
    })
}
