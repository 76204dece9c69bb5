// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![allow(clippy::expect_used, clippy::unwrap_used)]

mod initialization_tests;

use orgvote::{DepartmentCommand, VoteDraft};
use orgvote_domain::{MemberRole, VoteType};
use time::{Duration, OffsetDateTime, macros::datetime};

use crate::{DepartmentOutcome, SqlitePersistence};

pub const NOW: OffsetDateTime = datetime!(2026-05-04 12:00 UTC);

/// The "Acme" organization used across tests.
///
/// Departments: `Eng` with child `Backend`. Alice and Bob stand as
/// candidates, Carol and Dave vote.
pub struct Acme {
    pub organization_id: i64,
    pub admin: i64,
    pub alice: i64,
    pub bob: i64,
    pub carol: i64,
    pub dave: i64,
    pub eng: i64,
    pub backend: i64,
}

pub fn create_test_persistence() -> SqlitePersistence {
    SqlitePersistence::new_in_memory().expect("Failed to create in-memory persistence")
}

pub fn create_test_user(persistence: &mut SqlitePersistence, name: &str) -> i64 {
    let email: String = format!("{}@example.com", name.to_lowercase());
    persistence
        .create_user(name, &email, "password123", NOW)
        .expect("Failed to create user")
}

pub fn create_department(
    persistence: &mut SqlitePersistence,
    organization_id: i64,
    name: &str,
    parent_id: Option<i64>,
) -> i64 {
    let outcome: DepartmentOutcome = persistence
        .apply_department_command(
            organization_id,
            DepartmentCommand::Create {
                name: name.to_string(),
                parent_id,
            },
            NOW,
        )
        .expect("Failed to create department");
    match outcome {
        DepartmentOutcome::Created(id) => id,
        other => panic!("Expected Created, got {other:?}"),
    }
}

pub fn setup_acme(persistence: &mut SqlitePersistence) -> Acme {
    let admin: i64 = create_test_user(persistence, "Admin");
    let organization_id: i64 = persistence
        .create_organization("Acme", admin, NOW)
        .expect("Failed to create organization");

    let alice: i64 = create_test_user(persistence, "Alice");
    let bob: i64 = create_test_user(persistence, "Bob");
    let carol: i64 = create_test_user(persistence, "Carol");
    let dave: i64 = create_test_user(persistence, "Dave");
    for user_id in [alice, bob, carol, dave] {
        persistence
            .add_organization_member(organization_id, user_id, MemberRole::Member, NOW)
            .expect("Failed to add member");
    }

    let eng: i64 = create_department(persistence, organization_id, "Eng", None);
    let backend: i64 = create_department(persistence, organization_id, "Backend", Some(eng));

    Acme {
        organization_id,
        admin,
        alice,
        bob,
        carol,
        dave,
        eng,
        backend,
    }
}

/// A "Team Lead" draft open from one hour before `NOW` to one hour after.
pub fn team_lead_draft(acme: &Acme) -> VoteDraft {
    VoteDraft {
        name: String::from("Team Lead"),
        description: String::from("Pick the next team lead"),
        department_id: None,
        candidate_user_ids: vec![acme.alice, acme.bob],
        start: Some(NOW - Duration::hours(1)),
        end: Some(NOW + Duration::hours(1)),
        is_anonymous: false,
        vote_type: VoteType::SingleChoice,
    }
}

/// Returns the `VoteCandidate` id registered for a user.
pub fn candidate_id_for(persistence: &mut SqlitePersistence, vote_id: i64, user_id: i64) -> i64 {
    persistence
        .get_vote_snapshot(vote_id)
        .unwrap()
        .unwrap()
        .candidate_for_user(user_id)
        .map(|c| c.candidate_id)
        .expect("User is not a candidate")
}
