// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use super::*;
use axum::{
    body::Body,
    http::{Request, StatusCode as HttpStatusCode},
};
use serde_json::{Value, json};
use time::Duration;
use tower::ServiceExt;

use crate::identity::{USER_EMAIL_HEADER, USER_ID_HEADER};

/// A caller as forwarded by the authentication layer.
#[derive(Debug, Clone)]
struct Caller {
    user_id: i64,
    email: String,
}

fn create_test_app_state() -> AppState {
    let persistence: SqlitePersistence =
        SqlitePersistence::new_in_memory().expect("Failed to create in-memory persistence");
    AppState {
        persistence: Arc::new(Mutex::new(persistence)),
        live: LiveEventBroadcaster::new(),
        app_url: Url::parse("http://localhost:3000").unwrap(),
        sender: Arc::new(LogInvitationSender),
    }
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    caller: Option<&Caller>,
    body: Option<Value>,
) -> (HttpStatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(caller) = caller {
        builder = builder
            .header(USER_ID_HEADER, caller.user_id.to_string())
            .header(USER_EMAIL_HEADER, caller.email.as_str());
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: Value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

async fn register(app: &Router, name: &str, organization_id: Option<i64>) -> Caller {
    let email = format!("{}@example.com", name.to_lowercase());
    let (status, body) = send(
        app,
        "POST",
        "/register",
        None,
        Some(json!({
            "name": name,
            "email": email,
            "password": "Sunflower42",
            "organization_id": organization_id,
        })),
    )
    .await;
    assert_eq!(status, HttpStatusCode::OK, "{body}");
    Caller {
        user_id: body["user_id"].as_i64().unwrap(),
        email,
    }
}

struct Acme {
    app: Router,
    state: AppState,
    organization_id: i64,
    admin: Caller,
    alice: Caller,
    bob: Caller,
    carol: Caller,
    outsider: Caller,
}

async fn setup_acme() -> Acme {
    let state = create_test_app_state();
    let app = build_router(state.clone());

    let admin = register(&app, "Admin", None).await;
    let (status, body) = send(
        &app,
        "POST",
        "/organizations",
        Some(&admin),
        Some(json!({"name": "Acme"})),
    )
    .await;
    assert_eq!(status, HttpStatusCode::OK, "{body}");
    let organization_id = body["organization_id"].as_i64().unwrap();

    let alice = register(&app, "Alice", Some(organization_id)).await;
    let bob = register(&app, "Bob", Some(organization_id)).await;
    let carol = register(&app, "Carol", Some(organization_id)).await;
    let outsider = register(&app, "Mallory", None).await;

    Acme {
        app,
        state,
        organization_id,
        admin,
        alice,
        bob,
        carol,
        outsider,
    }
}

async fn create_team_lead(acme: &Acme) -> Value {
    let end = orgvote_domain::format_timestamp(OffsetDateTime::now_utc() + Duration::hours(1))
        .unwrap();
    let (status, body) = send(
        &acme.app,
        "POST",
        "/votes",
        Some(&acme.admin),
        Some(json!({
            "organization_id": acme.organization_id,
            "name": "Team Lead",
            "candidates": [acme.alice.user_id, acme.bob.user_id],
            "end_time": end,
        })),
    )
    .await;
    assert_eq!(status, HttpStatusCode::OK, "{body}");
    body
}

fn candidate_id(vote: &Value, user: &Caller) -> i64 {
    vote["candidates"]
        .as_array()
        .unwrap()
        .iter()
        .find(|c| c["user_id"].as_i64() == Some(user.user_id))
        .and_then(|c| c["candidate_id"].as_i64())
        .unwrap()
}

#[tokio::test]
async fn test_missing_or_malformed_identity_is_unauthenticated() {
    let app = build_router(create_test_app_state());
    let malformed = Caller {
        user_id: 1,
        email: String::new(),
    };

    let (missing_status, missing_body) = send(&app, "GET", "/memberships", None, None).await;
    let (blank_status, _) = send(&app, "GET", "/memberships", Some(&malformed), None).await;

    assert_eq!(missing_status, HttpStatusCode::UNAUTHORIZED);
    assert_eq!(missing_body["error"], json!(true));
    assert_eq!(missing_body["kind"], json!("unauthenticated"));
    assert_eq!(blank_status, HttpStatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_team_lead_vote_over_http() {
    let acme = setup_acme().await;
    let mut events = acme.state.live.subscribe();
    let vote = create_team_lead(&acme).await;
    let vote_id = vote["vote_id"].as_i64().unwrap();
    let alice = candidate_id(&vote, &acme.alice);
    let ballots = format!("/votes/{vote_id}/ballots");

    assert_eq!(vote["state"], json!("OPEN"));
    assert_eq!(
        events.try_recv().unwrap(),
        LiveEvent::VoteCreated {
            organization_id: acme.organization_id,
            vote_id,
        }
    );

    let (status, ballot) = send(
        &acme.app,
        "POST",
        &ballots,
        Some(&acme.carol),
        Some(json!({"candidate_id": alice})),
    )
    .await;
    assert_eq!(status, HttpStatusCode::OK, "{ballot}");
    assert_eq!(ballot["is_winner"], json!(true));
    assert_eq!(ballot["total_votes"], json!(1));
    assert_eq!(ballot["statistics"]["voter_id"], json!(acme.carol.user_id));
    assert_eq!(
        events.try_recv().unwrap(),
        LiveEvent::BallotCast {
            organization_id: acme.organization_id,
            vote_id,
            total_votes: 1,
        }
    );

    let (again_status, again) = send(
        &acme.app,
        "POST",
        &ballots,
        Some(&acme.carol),
        Some(json!({"candidate_id": alice})),
    )
    .await;
    assert_eq!(again_status, HttpStatusCode::CONFLICT);
    assert_eq!(again["kind"], json!("already_voted"));

    let (results_status, results) = send(
        &acme.app,
        "GET",
        &format!("/votes/{vote_id}/results"),
        Some(&acme.bob),
        None,
    )
    .await;
    assert_eq!(results_status, HttpStatusCode::OK);
    assert_eq!(results["total_votes"], json!(1));
    assert_eq!(results["candidates"][0]["is_winner"], json!(true));
    assert_eq!(results["candidates"][1]["slogan"], json!(orgvote_api::NO_SLOGAN));
}

#[tokio::test]
async fn test_ballot_rejections_map_to_status_codes() {
    let acme = setup_acme().await;
    let vote = create_team_lead(&acme).await;
    let vote_id = vote["vote_id"].as_i64().unwrap();
    let alice = candidate_id(&vote, &acme.alice);
    let ballots = format!("/votes/{vote_id}/ballots");

    let (invalid_status, invalid) = send(
        &acme.app,
        "POST",
        &ballots,
        Some(&acme.carol),
        Some(json!({"candidate_id": 9_999})),
    )
    .await;
    let (outsider_status, outsider) = send(
        &acme.app,
        "POST",
        &ballots,
        Some(&acme.outsider),
        Some(json!({"candidate_id": alice})),
    )
    .await;
    let (missing_status, missing) = send(
        &acme.app,
        "POST",
        "/votes/4040/ballots",
        Some(&acme.carol),
        Some(json!({"candidate_id": alice})),
    )
    .await;

    assert_eq!(invalid_status, HttpStatusCode::BAD_REQUEST);
    assert_eq!(invalid["kind"], json!("invalid_candidate"));
    assert_eq!(outsider_status, HttpStatusCode::FORBIDDEN);
    assert_eq!(outsider["kind"], json!("forbidden"));
    assert_eq!(missing_status, HttpStatusCode::NOT_FOUND);
    assert_eq!(missing["kind"], json!("not_found"));
}

#[tokio::test]
async fn test_closed_vote_rejects_ballots() {
    let acme = setup_acme().await;
    let now = OffsetDateTime::now_utc();
    let (status, vote) = send(
        &acme.app,
        "POST",
        "/votes",
        Some(&acme.admin),
        Some(json!({
            "organization_id": acme.organization_id,
            "name": "Next Quarter",
            "candidates": [acme.alice.user_id],
            "start_time": orgvote_domain::format_timestamp(now + Duration::days(1)).unwrap(),
        })),
    )
    .await;
    assert_eq!(status, HttpStatusCode::OK, "{vote}");
    assert_eq!(vote["state"], json!("PENDING"));

    let (ballot_status, ballot) = send(
        &acme.app,
        "POST",
        &format!("/votes/{}/ballots", vote["vote_id"]),
        Some(&acme.carol),
        Some(json!({"candidate_id": candidate_id(&vote, &acme.alice)})),
    )
    .await;

    assert_eq!(ballot_status, HttpStatusCode::BAD_REQUEST);
    assert_eq!(ballot["kind"], json!("vote_closed"));
}

#[tokio::test]
async fn test_department_tree_over_http() {
    let acme = setup_acme().await;
    let (_, eng) = send(
        &acme.app,
        "POST",
        "/departments",
        Some(&acme.admin),
        Some(json!({"organization_id": acme.organization_id, "name": "Eng"})),
    )
    .await;
    let eng_id = eng["department_id"].as_i64().unwrap();
    let (_, backend) = send(
        &acme.app,
        "POST",
        "/departments",
        Some(&acme.admin),
        Some(json!({
            "organization_id": acme.organization_id,
            "name": "Backend",
            "parent_id": eng_id,
        })),
    )
    .await;
    assert_eq!(backend["full_path"], json!("Eng - Backend"));

    let (cycle_status, cycle) = send(
        &acme.app,
        "PUT",
        &format!("/departments/{eng_id}"),
        Some(&acme.admin),
        Some(json!({
            "organization_id": acme.organization_id,
            "parent_id": backend["department_id"],
        })),
    )
    .await;
    assert_eq!(cycle_status, HttpStatusCode::BAD_REQUEST);
    assert_eq!(cycle["kind"], json!("invalid_argument"));

    let (member_status, _) = send(
        &acme.app,
        "POST",
        "/departments",
        Some(&acme.carol),
        Some(json!({"organization_id": acme.organization_id, "name": "Ops"})),
    )
    .await;
    assert_eq!(member_status, HttpStatusCode::FORBIDDEN);

    let (delete_status, deleted) = send(
        &acme.app,
        "DELETE",
        &format!("/departments/{eng_id}"),
        Some(&acme.admin),
        Some(json!({"organization_id": acme.organization_id, "child_ids": []})),
    )
    .await;
    assert_eq!(delete_status, HttpStatusCode::OK);
    assert_eq!(deleted["deleted_ids"].as_array().unwrap().len(), 2);

    let (_, listed) = send(
        &acme.app,
        "GET",
        &format!("/departments?organization_id={}", acme.organization_id),
        Some(&acme.carol),
        None,
    )
    .await;
    assert_eq!(listed["departments"], json!([]));
}

#[tokio::test]
async fn test_delete_vote_checks_organization() {
    let acme = setup_acme().await;
    let vote = create_team_lead(&acme).await;
    let vote_id = vote["vote_id"].as_i64().unwrap();

    let (wrong_status, _) = send(
        &acme.app,
        "DELETE",
        &format!("/votes/{vote_id}?organization_id={}", acme.organization_id + 1),
        Some(&acme.admin),
        None,
    )
    .await;
    let (status, _) = send(
        &acme.app,
        "DELETE",
        &format!("/votes/{vote_id}?organization_id={}", acme.organization_id),
        Some(&acme.admin),
        None,
    )
    .await;
    let (gone_status, _) = send(
        &acme.app,
        "GET",
        &format!("/votes/{vote_id}"),
        Some(&acme.admin),
        None,
    )
    .await;

    assert_eq!(wrong_status, HttpStatusCode::NOT_FOUND);
    assert_eq!(status, HttpStatusCode::OK);
    assert_eq!(gone_status, HttpStatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_validate_email_and_duplicate_registration() {
    let acme = setup_acme().await;

    let (_, taken) = send(
        &acme.app,
        "POST",
        "/validate-email",
        None,
        Some(json!({"email": "ALICE@example.com"})),
    )
    .await;
    let (_, free) = send(
        &acme.app,
        "POST",
        "/validate-email",
        None,
        Some(json!({"email": "erin@example.com"})),
    )
    .await;
    let (duplicate_status, duplicate) = send(
        &acme.app,
        "POST",
        "/register",
        None,
        Some(json!({
            "name": "Alice",
            "email": "alice@example.com",
            "password": "Sunflower42",
        })),
    )
    .await;

    assert_eq!(taken["is_valid"], json!(false));
    assert_eq!(taken["message"], json!("Email already registered"));
    assert_eq!(free["is_valid"], json!(true));
    assert_eq!(duplicate_status, HttpStatusCode::CONFLICT);
    assert_eq!(duplicate["message"], json!("Email already exists"));
}

#[tokio::test]
async fn test_invitations_and_memberships() {
    let acme = setup_acme().await;

    let (status, response) = send(
        &acme.app,
        "POST",
        &format!("/organizations/{}/invitations", acme.organization_id),
        Some(&acme.admin),
        Some(json!({
            "emails": ["mallory@example.com", "erin@example.com"],
            "names": ["Mallory", "Erin"],
        })),
    )
    .await;
    assert_eq!(status, HttpStatusCode::OK, "{response}");
    assert_eq!(response["results"][0]["target"], json!("sign-in"));
    assert_eq!(response["results"][1]["target"], json!("sign-up"));
    assert_eq!(response["failed_count"], json!(0));

    let (_, memberships) = send(&acme.app, "GET", "/memberships", Some(&acme.alice), None).await;
    assert_eq!(memberships["memberships"][0]["role"], json!("MEMBER"));

    let (_, voters) = send(
        &acme.app,
        "GET",
        &format!("/organizations/{}/voters", acme.organization_id),
        Some(&acme.admin),
        None,
    )
    .await;
    assert_eq!(voters["voters"].as_array().unwrap().len(), 3);
}
