// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Department queries.

use diesel::prelude::*;
use diesel::SqliteConnection;
use orgvote_domain::Department;
use tracing::debug;

use crate::diesel_schema::departments;
use crate::error::PersistenceError;

/// Diesel Queryable struct for department rows.
#[derive(Queryable, Selectable)]
#[diesel(table_name = departments)]
struct DepartmentRow {
    department_id: i64,
    organization_id: i64,
    name: String,
    parent_id: Option<i64>,
}

impl From<DepartmentRow> for Department {
    fn from(row: DepartmentRow) -> Self {
        Self {
            department_id: row.department_id,
            organization_id: row.organization_id,
            name: row.name,
            parent_id: row.parent_id,
        }
    }
}

/// Lists all departments of an organization in insertion order.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn list_departments(
    conn: &mut SqliteConnection,
    organization_id: i64,
) -> Result<Vec<Department>, PersistenceError> {
    let rows: Vec<DepartmentRow> = departments::table
        .filter(departments::organization_id.eq(organization_id))
        .order(departments::department_id.asc())
        .select(DepartmentRow::as_select())
        .load(conn)?;

    debug!(organization_id, count = rows.len(), "Loaded departments");

    Ok(rows.into_iter().map(Department::from).collect())
}

/// Retrieves a department by ID.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn get_department(
    conn: &mut SqliteConnection,
    department_id: i64,
) -> Result<Option<Department>, PersistenceError> {
    let row: Option<DepartmentRow> = departments::table
        .filter(departments::department_id.eq(department_id))
        .select(DepartmentRow::as_select())
        .first(conn)
        .optional()?;

    Ok(row.map(Department::from))
}
