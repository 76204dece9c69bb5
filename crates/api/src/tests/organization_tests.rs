// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use orgvote_domain::MemberRole;
use time::Duration;

use crate::{
    ApiError, CreateOrganizationRequest, create_organization, delete_organization,
    list_created_organizations, list_memberships,
};

use super::helpers::{NOW, create_team_lead, register, setup_acme, setup_test_persistence};

fn named(name: &str) -> CreateOrganizationRequest {
    CreateOrganizationRequest {
        name: name.to_string(),
    }
}

#[test]
fn test_create_organization_makes_creator_admin() {
    let mut persistence = setup_test_persistence();
    let founder = register(&mut persistence, "Founder", None);

    let organization = create_organization(&mut persistence, &founder, &named("  Globex "), NOW).unwrap();

    assert_eq!(organization.name, "Globex");
    assert_eq!(organization.creator_id, founder.user_id);
    assert_eq!(organization.created_at, "2026-05-04T12:00:00Z");
    let membership = persistence
        .get_membership(organization.organization_id, founder.user_id)
        .unwrap()
        .unwrap();
    assert_eq!(membership.role, MemberRole::Admin);
}

#[test]
fn test_create_organization_rejects_blank_name() {
    let mut persistence = setup_test_persistence();
    let founder = register(&mut persistence, "Founder", None);

    let result = create_organization(&mut persistence, &founder, &named("   "), NOW);

    assert!(matches!(result, Err(ApiError::InvalidInput { .. })));
}

#[test]
fn test_list_created_and_memberships() {
    let mut acme = setup_acme();
    create_organization(
        &mut acme.persistence,
        &acme.carol,
        &named("Carol's Club"),
        NOW + Duration::minutes(5),
    )
    .unwrap();

    let created = list_created_organizations(&mut acme.persistence, &acme.carol).unwrap();
    let memberships = list_memberships(&mut acme.persistence, &acme.carol).unwrap();

    assert_eq!(created.organizations.len(), 1);
    assert_eq!(created.organizations[0].name, "Carol's Club");

    let summary: Vec<(&str, MemberRole)> = memberships
        .memberships
        .iter()
        .map(|m| (m.organization.name.as_str(), m.role))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("Carol's Club", MemberRole::Admin),
            ("Acme", MemberRole::Member)
        ]
    );
}

#[test]
fn test_only_creator_deletes_organization() {
    let mut acme = setup_acme();
    create_team_lead(&mut acme);

    let by_member = delete_organization(&mut acme.persistence, &acme.carol, acme.organization_id);
    assert_eq!(by_member.unwrap_err().kind(), "forbidden");

    delete_organization(&mut acme.persistence, &acme.admin, acme.organization_id).unwrap();

    assert!(acme
        .persistence
        .get_organization(acme.organization_id)
        .unwrap()
        .is_none());
    assert!(acme
        .persistence
        .list_vote_snapshots(acme.organization_id)
        .unwrap()
        .is_empty());

    let again = delete_organization(&mut acme.persistence, &acme.admin, acme.organization_id);
    assert_eq!(again.unwrap_err().kind(), "not_found");
}
