// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Backend initialization tests.

use crate::SqlitePersistence;
use crate::tests::{NOW, create_test_persistence, create_test_user};

#[test]
fn test_persistence_initialization() {
    let result = SqlitePersistence::new_in_memory();
    assert!(result.is_ok());
}

#[test]
fn test_foreign_key_enforcement_is_enabled() {
    let mut persistence = create_test_persistence();
    assert!(persistence.verify_foreign_key_enforcement().is_ok());
}

#[test]
fn test_multiple_in_memory_instances_are_isolated() {
    let mut db1 = create_test_persistence();
    let mut db2 = create_test_persistence();

    let user_id: i64 = create_test_user(&mut db1, "Alice");

    assert!(db1.get_user(user_id).unwrap().is_some());
    assert!(db2.get_user(user_id).unwrap().is_none());
}

#[test]
fn test_organization_insert_requires_existing_creator() {
    let mut persistence = create_test_persistence();

    let result = persistence.create_organization("Ghost Org", 4242, NOW);

    assert!(result.is_err(), "Foreign key on creator_id must reject unknown users");
}
