// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Test helper functions and fixtures.

use orgvote_domain::VoteType;
use orgvote_persistence::SqlitePersistence;
use time::OffsetDateTime;
use time::macros::datetime;

use crate::{
    CreateDepartmentRequest, CreateOrganizationRequest, CreateVoteRequest, RegisterMemberRequest,
    VerifiedIdentity, VoteInfo, create_department, create_organization, create_vote,
    register_member,
};

pub const NOW: OffsetDateTime = datetime!(2026-05-04 12:00 UTC);

/// The "Acme" fixture: an admin, four members, one outsider, and the
/// departments `Eng` and `Eng - Backend`.
pub struct Acme {
    pub persistence: SqlitePersistence,
    pub organization_id: i64,
    pub admin: VerifiedIdentity,
    pub alice: VerifiedIdentity,
    pub bob: VerifiedIdentity,
    pub carol: VerifiedIdentity,
    pub dave: VerifiedIdentity,
    pub outsider: VerifiedIdentity,
    pub eng: i64,
    pub backend: i64,
}

pub fn setup_test_persistence() -> SqlitePersistence {
    SqlitePersistence::new_in_memory().expect("Failed to create in-memory persistence")
}

pub fn register_request(name: &str, organization_id: Option<i64>) -> RegisterMemberRequest {
    RegisterMemberRequest {
        name: name.to_string(),
        email: format!("{}@example.com", name.to_lowercase()),
        password: String::from("Sunflower42"),
        organization_id,
    }
}

pub fn register(
    persistence: &mut SqlitePersistence,
    name: &str,
    organization_id: Option<i64>,
) -> VerifiedIdentity {
    let response = register_member(persistence, &register_request(name, organization_id), NOW)
        .expect("Failed to register member");
    VerifiedIdentity::new(response.user_id, &format!("{name}@example.com"))
}

pub fn setup_acme() -> Acme {
    let mut persistence = setup_test_persistence();

    let admin = register(&mut persistence, "Admin", None);
    let organization = create_organization(
        &mut persistence,
        &admin,
        &CreateOrganizationRequest {
            name: String::from("Acme"),
        },
        NOW,
    )
    .expect("Failed to create organization");
    let organization_id: i64 = organization.organization_id;

    let alice = register(&mut persistence, "Alice", Some(organization_id));
    let bob = register(&mut persistence, "Bob", Some(organization_id));
    let carol = register(&mut persistence, "Carol", Some(organization_id));
    let dave = register(&mut persistence, "Dave", Some(organization_id));
    let outsider = register(&mut persistence, "Mallory", None);

    let eng: i64 = create_department(
        &mut persistence,
        &admin,
        CreateDepartmentRequest {
            organization_id,
            name: String::from("Eng"),
            parent_id: None,
        },
        NOW,
    )
    .expect("Failed to create Eng")
    .department_id;
    let backend: i64 = create_department(
        &mut persistence,
        &admin,
        CreateDepartmentRequest {
            organization_id,
            name: String::from("Backend"),
            parent_id: Some(eng),
        },
        NOW,
    )
    .expect("Failed to create Backend")
    .department_id;

    Acme {
        persistence,
        organization_id,
        admin,
        alice,
        bob,
        carol,
        dave,
        outsider,
        eng,
        backend,
    }
}

/// "Team Lead": Alice against Bob, open from an hour ago to an hour ahead.
pub fn team_lead_request(acme: &Acme) -> CreateVoteRequest {
    CreateVoteRequest {
        organization_id: acme.organization_id,
        name: String::from("Team Lead"),
        description: String::from("Pick the next team lead"),
        department_id: None,
        candidates: vec![acme.alice.user_id, acme.bob.user_id],
        start_time: Some(String::from("2026-05-04T11:00:00Z")),
        end_time: Some(String::from("2026-05-04T13:00:00Z")),
        is_anonymous: false,
        vote_type: VoteType::SingleChoice,
    }
}

pub fn create_team_lead(acme: &mut Acme) -> VoteInfo {
    let request = team_lead_request(acme);
    create_vote(&mut acme.persistence, &acme.admin, request, NOW).expect("Failed to create vote")
}

/// Returns the `VoteCandidate` id of a user in a vote.
pub fn candidate_id(vote: &VoteInfo, user: &VerifiedIdentity) -> i64 {
    vote.candidates
        .iter()
        .find(|c| c.user_id == user.user_id)
        .expect("User is not a candidate")
        .candidate_id
}
