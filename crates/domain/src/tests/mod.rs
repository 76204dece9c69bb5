// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![allow(clippy::unwrap_used, clippy::expect_used)]

mod schedule;
mod tally;
mod validation;

use crate::Department;

pub fn department(id: i64, name: &str, parent_id: Option<i64>) -> Department {
    Department {
        department_id: id,
        organization_id: 1,
        name: name.to_string(),
        parent_id,
    }
}
