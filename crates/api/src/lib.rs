// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! API boundary for organization voting.
//!
//! This crate owns the client contract: request and response DTOs, the
//! membership gate, translation of lower-layer errors into `ApiError`,
//! and the handlers that tie the core rules to persistence. It has no
//! HTTP knowledge; the server crate maps it onto routes.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(clippy::multiple_crate_versions)]

mod auth;
mod error;
mod handlers;
mod invitations;
mod password_policy;
mod request_response;

#[cfg(test)]
mod tests;

pub use auth::{AuthenticationService, AuthorizationService, VerifiedIdentity};
pub use error::{
    ApiError, AuthError, translate_core_error, translate_domain_error,
    translate_persistence_error,
};
pub use handlers::{
    NO_SLOGAN, create_department, create_organization, create_vote, delete_department,
    delete_organization, delete_vote, get_results, get_vote, list_created_organizations,
    list_departments, list_memberships, list_voters, list_votes, register_member, remove_voter,
    send_invitations, set_slogan, submit_ballot, update_department, update_vote, update_voter,
    validate_email,
};
pub use invitations::{
    Invitation, InvitationContext, InvitationError, InvitationSender, LogInvitationSender,
    RedirectTarget, build_invitation, invitation_link,
};
pub use password_policy::{PasswordPolicy, PasswordPolicyError};
pub use request_response::{
    BallotResponse, CandidateInfo, CandidateResult, CreateDepartmentRequest,
    CreateOrganizationRequest, CreateVoteRequest, DeleteDepartmentRequest,
    DeleteDepartmentResponse, DepartmentInfo, InvitationResult, ListDepartmentsResponse,
    ListMembershipsResponse, ListOrganizationsResponse, ListVotersResponse, ListVotesResponse,
    MembershipInfo, OrganizationInfo, RegisterMemberRequest, RegisterMemberResponse,
    SendInvitationsRequest, SendInvitationsResponse, SetSloganRequest, SetSloganResponse,
    SubmitBallotRequest, UpdateDepartmentRequest, UpdateVoteRequest, UpdateVoterRequest,
    ValidateEmailRequest, ValidateEmailResponse, VoteInfo, VoteResultsResponse, VoterInfo,
};
