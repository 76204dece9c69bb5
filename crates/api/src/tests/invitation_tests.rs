// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Invitation links and batch delivery.

use std::sync::Mutex;

use url::Url;

use crate::{
    ApiError, Invitation, InvitationError, InvitationSender, LogInvitationSender, RedirectTarget,
    SendInvitationsRequest, invitation_link, send_invitations,
};

use super::helpers::setup_acme;

/// Records deliveries and fails for addresses in `reject`.
#[derive(Default)]
struct RecordingSender {
    sent: Mutex<Vec<Invitation>>,
    reject: Vec<String>,
}

impl InvitationSender for RecordingSender {
    fn send(&self, invitation: &Invitation) -> Result<(), InvitationError> {
        if self.reject.contains(&invitation.email) {
            return Err(InvitationError::DeliveryFailed {
                email: invitation.email.clone(),
                reason: String::from("mailbox unavailable"),
            });
        }
        self.sent.lock().unwrap().push(invitation.clone());
        Ok(())
    }
}

fn app_url() -> Url {
    Url::parse("https://vote.example.com/").unwrap()
}

fn request(emails: &[&str], names: &[&str], department_id: Option<i64>) -> SendInvitationsRequest {
    SendInvitationsRequest {
        emails: emails.iter().map(ToString::to_string).collect(),
        names: names.iter().map(ToString::to_string).collect(),
        department_id,
    }
}

#[test]
fn test_link_is_query_encoded() {
    let link = invitation_link(
        &app_url(),
        RedirectTarget::SignUp,
        "erin+vote@example.com",
        "Erin O'Neil",
        3,
        Some(7),
    )
    .unwrap();

    assert_eq!(
        link.as_str(),
        "https://vote.example.com/sign-up?email=erin%2Bvote%40example.com&name=Erin+O%27Neil&organizationId=3&departmentId=7"
    );
}

#[test]
fn test_link_keeps_base_path() {
    let base = Url::parse("https://example.com/voting").unwrap();

    let link = invitation_link(&base, RedirectTarget::SignIn, "a@example.com", "A", 1, None).unwrap();

    assert_eq!(
        link.as_str(),
        "https://example.com/voting/sign-in?email=a%40example.com&name=A&organizationId=1"
    );
}

#[test]
fn test_link_rejects_non_base_url() {
    let base = Url::parse("mailto:admin@example.com").unwrap();

    let result = invitation_link(&base, RedirectTarget::SignIn, "a@example.com", "A", 1, None);

    assert!(matches!(result, Err(InvitationError::InvalidBaseUrl(_))));
}

#[test]
fn test_registered_users_sign_in_and_join_department() {
    let mut acme = setup_acme();
    let sender = RecordingSender::default();

    let response = send_invitations(
        &mut acme.persistence,
        &acme.admin,
        acme.organization_id,
        &request(
            &["Carol@example.com", "erin@example.com"],
            &["Carol", "Erin"],
            Some(acme.backend),
        ),
        &app_url(),
        &sender,
    )
    .unwrap();

    let targets: Vec<&str> = response.results.iter().map(|r| r.target.as_str()).collect();
    assert_eq!(targets, vec!["sign-in", "sign-up"]);
    assert!(!response.partial_success);
    assert_eq!(response.failed_count, 0);

    let sent = sender.sent.lock().unwrap();
    assert_eq!(sent[0].subject, "Sign in to join Acme");
    assert!(sent[0].body.contains("Acme in the Backend department"));
    assert_eq!(sent[1].subject, "Complete your registration");

    let departments = acme
        .persistence
        .list_user_department_ids(acme.organization_id, acme.carol.user_id)
        .unwrap();
    assert_eq!(departments, vec![acme.backend]);
}

#[test]
fn test_partial_and_total_failure() {
    let mut acme = setup_acme();
    let sender = RecordingSender {
        reject: vec![String::from("erin@example.com")],
        ..RecordingSender::default()
    };

    let partial = send_invitations(
        &mut acme.persistence,
        &acme.admin,
        acme.organization_id,
        &request(&["erin@example.com", "finn@example.com"], &["Erin", "Finn"], None),
        &app_url(),
        &sender,
    )
    .unwrap();
    assert!(partial.partial_success);
    assert_eq!(partial.failed_count, 1);
    assert!(partial.results[0].error.is_some());

    let total = send_invitations(
        &mut acme.persistence,
        &acme.admin,
        acme.organization_id,
        &request(&["erin@example.com"], &["Erin"], None),
        &app_url(),
        &sender,
    );
    assert_eq!(total.unwrap_err().kind(), "internal");
}

#[test]
fn test_invitation_request_validation() {
    let mut acme = setup_acme();
    let sender = LogInvitationSender;

    let mismatched = send_invitations(
        &mut acme.persistence,
        &acme.admin,
        acme.organization_id,
        &request(&["erin@example.com", "finn@example.com"], &["Erin"], None),
        &app_url(),
        &sender,
    );
    let empty = send_invitations(
        &mut acme.persistence,
        &acme.admin,
        acme.organization_id,
        &request(&[], &[], None),
        &app_url(),
        &sender,
    );
    let foreign_department = send_invitations(
        &mut acme.persistence,
        &acme.admin,
        acme.organization_id,
        &request(&["erin@example.com"], &["Erin"], Some(9_999)),
        &app_url(),
        &sender,
    );
    let by_member = send_invitations(
        &mut acme.persistence,
        &acme.carol,
        acme.organization_id,
        &request(&["erin@example.com"], &["Erin"], None),
        &app_url(),
        &sender,
    );

    assert!(matches!(mismatched, Err(ApiError::InvalidInput { .. })));
    assert!(matches!(empty, Err(ApiError::InvalidInput { .. })));
    assert_eq!(foreign_department.unwrap_err().kind(), "not_found");
    assert_eq!(by_member.unwrap_err().kind(), "forbidden");
}
