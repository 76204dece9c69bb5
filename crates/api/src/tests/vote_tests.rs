// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Vote lifecycle through the API.

use time::Duration;

use crate::{
    ApiError, CreateVoteRequest, SetSloganRequest, SubmitBallotRequest, UpdateVoteRequest,
    create_vote, delete_vote, get_vote, list_votes, set_slogan, submit_ballot, update_vote,
};

use super::helpers::{NOW, candidate_id, create_team_lead, setup_acme, team_lead_request};

#[test]
fn test_create_vote_reports_candidates_and_state() {
    let mut acme = setup_acme();

    let vote = create_team_lead(&mut acme);

    assert_eq!(vote.name, "Team Lead");
    assert_eq!(vote.state, "OPEN");
    assert!(vote.is_active);
    assert!(!vote.has_voted);
    assert_eq!(vote.start_time, "2026-05-04T11:00:00Z");
    assert_eq!(vote.end_time.as_deref(), Some("2026-05-04T13:00:00Z"));
    let names: Vec<&str> = vote.candidates.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["Alice", "Bob"]);
    assert!(vote.candidates.iter().all(|c| c.votes == 0 && !c.is_winner));
}

#[test]
fn test_create_vote_defaults_start_to_now_and_stays_open_ended() {
    let mut acme = setup_acme();
    let request = CreateVoteRequest {
        start_time: None,
        end_time: None,
        ..team_lead_request(&acme)
    };

    let vote = create_vote(&mut acme.persistence, &acme.admin, request, NOW).unwrap();

    assert_eq!(vote.start_time, "2026-05-04T12:00:00Z");
    assert_eq!(vote.end_time, None);
    assert!(vote.is_active);
}

#[test]
fn test_duplicate_candidate_is_rejected() {
    let mut acme = setup_acme();
    let request = CreateVoteRequest {
        candidates: vec![acme.alice.user_id, acme.alice.user_id],
        ..team_lead_request(&acme)
    };

    let err = create_vote(&mut acme.persistence, &acme.admin, request, NOW).unwrap_err();

    assert_eq!(
        err,
        ApiError::InvalidInput {
            field: String::from("candidates"),
            message: String::from("A candidate can only be added once to a vote"),
        }
    );
}

#[test]
fn test_create_vote_rejections() {
    let mut acme = setup_acme();
    let base = team_lead_request(&acme);

    let cases = [
        CreateVoteRequest {
            candidates: Vec::new(),
            ..base.clone()
        },
        CreateVoteRequest {
            candidates: vec![acme.alice.user_id, acme.outsider.user_id],
            ..base.clone()
        },
        CreateVoteRequest {
            end_time: Some(String::from("2026-05-04T10:00:00Z")),
            ..base.clone()
        },
        CreateVoteRequest {
            start_time: Some(String::from("yesterday")),
            ..base.clone()
        },
        CreateVoteRequest {
            department_id: Some(9_999),
            ..base.clone()
        },
        CreateVoteRequest {
            name: String::from(" "),
            ..base
        },
    ];

    for request in cases {
        let err = create_vote(&mut acme.persistence, &acme.admin, request.clone(), NOW).unwrap_err();
        assert_eq!(err.kind(), "invalid_argument", "{request:?} gave {err}");
    }
    assert!(acme
        .persistence
        .list_vote_snapshots(acme.organization_id)
        .unwrap()
        .is_empty());
}

#[test]
fn test_list_votes_newest_first_with_live_state() {
    let mut acme = setup_acme();
    let first = create_team_lead(&mut acme);
    let later = CreateVoteRequest {
        name: String::from("Offsite"),
        start_time: Some(String::from("2026-05-05T09:00:00Z")),
        end_time: None,
        ..team_lead_request(&acme)
    };
    let second = create_vote(
        &mut acme.persistence,
        &acme.admin,
        later,
        NOW + Duration::minutes(1),
    )
    .unwrap();

    let listed = list_votes(&mut acme.persistence, &acme.dave, acme.organization_id, NOW + Duration::hours(2)).unwrap();

    let summary: Vec<(i64, &str)> = listed
        .votes
        .iter()
        .map(|v| (v.vote_id, v.state.as_str()))
        .collect();
    assert_eq!(
        summary,
        vec![(second.vote_id, "PENDING"), (first.vote_id, "CLOSED")]
    );
}

#[test]
fn test_get_vote_requires_membership() {
    let mut acme = setup_acme();
    let vote = create_team_lead(&mut acme);

    let as_member = get_vote(&mut acme.persistence, &acme.carol, vote.vote_id, NOW);
    let as_outsider = get_vote(&mut acme.persistence, &acme.outsider, vote.vote_id, NOW);
    let missing = get_vote(&mut acme.persistence, &acme.carol, 4_040, NOW);

    assert!(as_member.is_ok());
    assert_eq!(as_outsider.unwrap_err().kind(), "forbidden");
    assert_eq!(missing.unwrap_err().kind(), "not_found");
}

#[test]
fn test_update_vote_partial_fields() {
    let mut acme = setup_acme();
    let vote = create_team_lead(&mut acme);

    let updated = update_vote(
        &mut acme.persistence,
        &acme.admin,
        vote.vote_id,
        UpdateVoteRequest {
            name: Some(String::from("Tech Lead")),
            end_time: Some(None),
            is_anonymous: Some(true),
            ..UpdateVoteRequest::default()
        },
        NOW,
    )
    .unwrap();

    assert_eq!(updated.name, "Tech Lead");
    assert_eq!(updated.description, vote.description);
    assert_eq!(updated.start_time, vote.start_time);
    assert_eq!(updated.end_time, None);
    assert!(updated.is_anonymous);
}

#[test]
fn test_update_candidates_keeps_ids_and_protects_ballots() {
    let mut acme = setup_acme();
    let vote = create_team_lead(&mut acme);
    let alice: i64 = candidate_id(&vote, &acme.alice);
    submit_ballot(
        &mut acme.persistence,
        &acme.carol,
        vote.vote_id,
        SubmitBallotRequest {
            candidate_id: alice,
        },
        NOW,
    )
    .unwrap();

    let swapped = update_vote(
        &mut acme.persistence,
        &acme.admin,
        vote.vote_id,
        UpdateVoteRequest {
            candidates: Some(vec![acme.alice.user_id, acme.dave.user_id]),
            ..UpdateVoteRequest::default()
        },
        NOW,
    )
    .unwrap();
    assert_eq!(candidate_id(&swapped, &acme.alice), alice);
    assert_eq!(swapped.total_votes, 1);
    let users: Vec<i64> = swapped.candidates.iter().map(|c| c.user_id).collect();
    assert_eq!(users, vec![acme.alice.user_id, acme.dave.user_id]);

    let dropping_alice = update_vote(
        &mut acme.persistence,
        &acme.admin,
        vote.vote_id,
        UpdateVoteRequest {
            candidates: Some(vec![acme.dave.user_id]),
            ..UpdateVoteRequest::default()
        },
        NOW,
    );
    assert_eq!(dropping_alice.unwrap_err().kind(), "conflict");
}

#[test]
fn test_update_vote_requires_admin() {
    let mut acme = setup_acme();
    let vote = create_team_lead(&mut acme);

    let result = update_vote(
        &mut acme.persistence,
        &acme.carol,
        vote.vote_id,
        UpdateVoteRequest::default(),
        NOW,
    );

    assert_eq!(result.unwrap_err().kind(), "forbidden");
}

#[test]
fn test_delete_vote_checks_organization() {
    let mut acme = setup_acme();
    let vote = create_team_lead(&mut acme);

    let wrong = delete_vote(&mut acme.persistence, &acme.admin, vote.vote_id, acme.organization_id + 1);
    assert_eq!(wrong.unwrap_err().kind(), "not_found");

    delete_vote(&mut acme.persistence, &acme.admin, vote.vote_id, acme.organization_id).unwrap();
    assert!(acme.persistence.get_vote(vote.vote_id).unwrap().is_none());
}

#[test]
fn test_slogans_are_for_candidates_only() {
    let mut acme = setup_acme();
    let vote = create_team_lead(&mut acme);

    let set = set_slogan(
        &mut acme.persistence,
        &acme.alice,
        vote.vote_id,
        &SetSloganRequest {
            text: String::from("  Ship it  "),
        },
    )
    .unwrap();
    assert_eq!(set.slogan.as_deref(), Some("Ship it"));

    let refused = set_slogan(
        &mut acme.persistence,
        &acme.carol,
        vote.vote_id,
        &SetSloganRequest {
            text: String::from("Me too"),
        },
    );
    assert_eq!(refused.unwrap_err().kind(), "forbidden");

    let shown = get_vote(&mut acme.persistence, &acme.carol, vote.vote_id, NOW).unwrap();
    let slogans: Vec<Option<&str>> = shown.candidates.iter().map(|c| c.slogan.as_deref()).collect();
    assert_eq!(slogans, vec![Some("Ship it"), None]);

    let cleared = set_slogan(
        &mut acme.persistence,
        &acme.alice,
        vote.vote_id,
        &SetSloganRequest {
            text: String::new(),
        },
    )
    .unwrap();
    assert_eq!(cleared.slogan, None);
}
