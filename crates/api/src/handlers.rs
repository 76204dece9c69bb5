// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! API handler functions for state-changing and read-only operations.
//!
//! Handlers receive the persistence layer, the verified identity where the
//! operation needs one, the request DTO, and `now` where time matters.
//! Core rules run here once for an early rejection and again inside the
//! storage transaction, which is the authoritative check.

use std::collections::HashMap;

use orgvote::{
    DepartmentCommand, FieldUpdate, OrganizationContext, VoteChanges, VoteDraft, VoteSnapshot,
    admit_ballot, apply_department_command, plan_vote, revise_vote,
};
use orgvote_domain::{
    Ballot, BallotStatistics, Department, DepartmentTree, MemberRole, Organization, Slogan, Tally,
    User, Vote, format_timestamp, normalize_email, parse_timestamp,
    validate_email as validate_email_format, validate_name,
};
use orgvote_persistence::{
    DepartmentOutcome, MembershipChange, MembershipData, SqlitePersistence, VoterData,
};
use time::OffsetDateTime;
use tracing::{debug, error, info, warn};
use url::Url;

use crate::auth::{AuthenticationService, AuthorizationService, VerifiedIdentity, load_organization};
use crate::error::{
    ApiError, AuthError, translate_core_error, translate_domain_error, translate_persistence_error,
};
use crate::invitations::{Invitation, InvitationContext, InvitationSender, build_invitation};
use crate::password_policy::PasswordPolicy;
use crate::request_response::{
    BallotResponse, CandidateInfo, CandidateResult, CreateDepartmentRequest,
    CreateOrganizationRequest, CreateVoteRequest, DeleteDepartmentRequest,
    DeleteDepartmentResponse, DepartmentInfo, InvitationResult, ListDepartmentsResponse,
    ListMembershipsResponse, ListOrganizationsResponse, ListVotersResponse, ListVotesResponse,
    MembershipInfo, OrganizationInfo, RegisterMemberRequest, RegisterMemberResponse,
    SendInvitationsRequest, SendInvitationsResponse, SetSloganRequest, SetSloganResponse,
    SubmitBallotRequest, UpdateDepartmentRequest, UpdateVoteRequest, UpdateVoterRequest,
    ValidateEmailRequest, ValidateEmailResponse, VoteInfo, VoteResultsResponse, VoterInfo,
};

/// Shown in results for candidates without a slogan.
pub const NO_SLOGAN: &str = "No slogan provided";

// ============================================================================
// Shared helpers
// ============================================================================

fn format_time(value: OffsetDateTime) -> Result<String, ApiError> {
    format_timestamp(value).map_err(translate_domain_error)
}

fn parse_time(field: &str, value: &str) -> Result<OffsetDateTime, ApiError> {
    parse_timestamp(value).map_err(|e| ApiError::invalid_input(field, e.to_string()))
}

fn parse_optional_time(
    field: &str,
    value: Option<&str>,
) -> Result<Option<OffsetDateTime>, ApiError> {
    value.map(|v| parse_time(field, v)).transpose()
}

fn organization_info(organization: &Organization) -> Result<OrganizationInfo, ApiError> {
    Ok(OrganizationInfo {
        organization_id: organization.organization_id,
        name: organization.name.clone(),
        creator_id: organization.creator_id,
        created_at: format_time(organization.created_at)?,
    })
}

fn load_context(
    persistence: &mut SqlitePersistence,
    organization_id: i64,
) -> Result<OrganizationContext, ApiError> {
    persistence
        .load_organization_context(organization_id)
        .map_err(translate_persistence_error)
}

fn load_snapshot(
    persistence: &mut SqlitePersistence,
    vote_id: i64,
) -> Result<VoteSnapshot, ApiError> {
    persistence
        .get_vote_snapshot(vote_id)
        .map_err(translate_persistence_error)?
        .ok_or_else(|| ApiError::not_found("Vote", format!("Vote {vote_id} does not exist")))
}

/// Loads the users standing as candidates, keyed by user id.
fn candidate_users(
    persistence: &mut SqlitePersistence,
    snapshot: &VoteSnapshot,
) -> Result<HashMap<i64, User>, ApiError> {
    let user_ids: Vec<i64> = snapshot.candidates.iter().map(|c| c.user_id).collect();
    let users: Vec<User> = persistence
        .get_users(&user_ids)
        .map_err(translate_persistence_error)?;
    Ok(users.into_iter().map(|u| (u.user_id, u)).collect())
}

fn slogans_by_user(
    persistence: &mut SqlitePersistence,
    vote_id: i64,
) -> Result<HashMap<i64, String>, ApiError> {
    let slogans: Vec<Slogan> = persistence
        .list_slogans(vote_id)
        .map_err(translate_persistence_error)?;
    Ok(slogans.into_iter().map(|s| (s.user_id, s.text)).collect())
}

/// Builds the client view of a vote.
///
/// Candidates whose user no longer exists are left out, and ballots for
/// unknown candidates are not counted.
fn vote_info(
    persistence: &mut SqlitePersistence,
    snapshot: &VoteSnapshot,
    viewer_id: i64,
    now: OffsetDateTime,
) -> Result<VoteInfo, ApiError> {
    let vote: &Vote = &snapshot.vote;
    let users: HashMap<i64, User> = candidate_users(persistence, snapshot)?;
    let mut slogans: HashMap<i64, String> = slogans_by_user(persistence, vote.vote_id)?;
    let tally: Tally = snapshot.tally();

    let candidates: Vec<CandidateInfo> = snapshot
        .candidates
        .iter()
        .filter_map(|candidate| {
            let Some(user) = users.get(&candidate.user_id) else {
                warn!(
                    vote_id = vote.vote_id,
                    user_id = candidate.user_id,
                    "Skipping candidate without a user"
                );
                return None;
            };
            Some(CandidateInfo {
                candidate_id: candidate.candidate_id,
                user_id: user.user_id,
                name: user.name.clone(),
                email: user.email.clone(),
                slogan: slogans.remove(&candidate.user_id),
                votes: tally.votes_for(candidate.candidate_id),
                is_winner: tally.is_winner(candidate.candidate_id),
            })
        })
        .collect();

    Ok(VoteInfo {
        vote_id: vote.vote_id,
        organization_id: vote.organization_id,
        department_id: vote.department_id,
        name: vote.name.clone(),
        description: vote.description.clone(),
        start_time: format_time(vote.schedule.start())?,
        end_time: vote.schedule.end().map(format_time).transpose()?,
        is_anonymous: vote.is_anonymous,
        vote_type: vote.vote_type,
        state: vote.schedule.state_at(now).as_str().to_string(),
        is_active: vote.schedule.is_active_at(now),
        has_voted: snapshot.has_voted(viewer_id),
        total_votes: tally.total_votes(),
        candidates,
        created_at: format_time(vote.created_at)?,
    })
}

fn department_infos(
    persistence: &mut SqlitePersistence,
    organization_id: i64,
) -> Result<Vec<DepartmentInfo>, ApiError> {
    let departments: Vec<Department> = persistence
        .list_departments(organization_id)
        .map_err(translate_persistence_error)?;

    Ok(DepartmentTree::new(departments)
        .with_full_paths()
        .into_iter()
        .map(|path| DepartmentInfo {
            department_id: path.department.department_id,
            organization_id: path.department.organization_id,
            name: path.department.name,
            parent_id: path.department.parent_id,
            full_path: path.full_path,
        })
        .collect())
}

fn department_info(
    persistence: &mut SqlitePersistence,
    organization_id: i64,
    department_id: i64,
) -> Result<DepartmentInfo, ApiError> {
    department_infos(persistence, organization_id)?
        .into_iter()
        .find(|d| d.department_id == department_id)
        .ok_or_else(|| {
            ApiError::not_found(
                "Department",
                format!("Department {department_id} does not exist"),
            )
        })
}

fn voter_info(voter: VoterData) -> VoterInfo {
    VoterInfo {
        user_id: voter.user.user_id,
        name: voter.user.name,
        email: voter.user.email,
        vote_participation_count: voter.user.vote_participation_count,
        department_ids: voter.department_ids,
    }
}

/// Logs a rejected rule check and translates it.
fn rejected(operation: &str, err: orgvote::CoreError) -> ApiError {
    warn!(operation, error = %err, "Request rejected");
    translate_core_error(err)
}

// ============================================================================
// Members
// ============================================================================

/// Registers a member, optionally into an organization.
///
/// An email that is already registered is not registered again. With an
/// organization given, the existing user joins it as a MEMBER instead.
/// New users must satisfy the password policy.
///
/// # Arguments
///
/// * `persistence` - The persistence layer
/// * `request` - The registration request
/// * `now` - The current time
///
/// # Errors
///
/// Returns an error if:
/// - The name, email, or password is invalid
/// - The organization does not exist
/// - The email is registered and no organization is given
/// - The existing user is already in the organization
pub fn register_member(
    persistence: &mut SqlitePersistence,
    request: &RegisterMemberRequest,
    now: OffsetDateTime,
) -> Result<RegisterMemberResponse, ApiError> {
    validate_name(&request.name).map_err(translate_domain_error)?;
    validate_email_format(&request.email).map_err(translate_domain_error)?;
    let email: String = normalize_email(&request.email);
    let name: &str = request.name.trim();

    if let Some(organization_id) = request.organization_id {
        load_organization(persistence, organization_id)?;
    }

    let existing: Option<User> = persistence
        .get_user_by_email(&email)
        .map_err(translate_persistence_error)?;

    if let Some(user) = existing {
        let Some(organization_id) = request.organization_id else {
            warn!(email, "Registration rejected: email exists");
            return Err(ApiError::Conflict {
                rule: String::from("email_unique"),
                message: String::from("Email already exists"),
            });
        };

        let change: MembershipChange = persistence
            .add_organization_member(organization_id, user.user_id, MemberRole::Member, now)
            .map_err(translate_persistence_error)?;

        if change == MembershipChange::AlreadyMember {
            return Err(ApiError::Conflict {
                rule: String::from("membership_unique"),
                message: String::from("User already in organization"),
            });
        }

        info!(user_id = user.user_id, organization_id, "Existing user joined organization");
        return Ok(RegisterMemberResponse {
            user_id: user.user_id,
            organization_id: Some(organization_id),
            created: false,
            message: format!("Added {} to organization {organization_id}", user.name),
        });
    }

    PasswordPolicy::default().validate(&request.password, &email, name)?;

    let user_id: i64 = persistence
        .register_user(name, &email, &request.password, request.organization_id, now)
        .map_err(translate_persistence_error)?;

    info!(user_id, organization_id = ?request.organization_id, "Member registered");

    Ok(RegisterMemberResponse {
        user_id,
        organization_id: request.organization_id,
        created: true,
        message: format!("Registered {name}"),
    })
}

/// Checks whether an email could be registered.
///
/// # Errors
///
/// Returns an error only if the lookup fails.
pub fn validate_email(
    persistence: &mut SqlitePersistence,
    request: &ValidateEmailRequest,
) -> Result<ValidateEmailResponse, ApiError> {
    if validate_email_format(&request.email).is_err() {
        return Ok(ValidateEmailResponse {
            is_valid: false,
            message: Some(String::from("Invalid email format")),
        });
    }

    let taken: bool = persistence
        .get_user_by_email(&normalize_email(&request.email))
        .map_err(translate_persistence_error)?
        .is_some();

    Ok(if taken {
        ValidateEmailResponse {
            is_valid: false,
            message: Some(String::from("Email already registered")),
        }
    } else {
        ValidateEmailResponse {
            is_valid: true,
            message: None,
        }
    })
}

/// Lists the non-admin members of an organization.
///
/// # Errors
///
/// Returns an error if the caller is not an admin of the organization.
pub fn list_voters(
    persistence: &mut SqlitePersistence,
    identity: &VerifiedIdentity,
    organization_id: i64,
) -> Result<ListVotersResponse, ApiError> {
    AuthorizationService::authorize_admin(persistence, identity, organization_id, "list_voters")?;

    let voters: Vec<VoterData> = persistence
        .list_voters(organization_id)
        .map_err(translate_persistence_error)?;

    Ok(ListVotersResponse {
        organization_id,
        voters: voters.into_iter().map(voter_info).collect(),
    })
}

/// Renames a voter and replaces their department memberships.
///
/// # Errors
///
/// Returns an error if the caller is not an admin, the name is blank, the
/// user is not a member, or a department belongs to another organization.
pub fn update_voter(
    persistence: &mut SqlitePersistence,
    identity: &VerifiedIdentity,
    organization_id: i64,
    user_id: i64,
    request: UpdateVoterRequest,
) -> Result<VoterInfo, ApiError> {
    AuthorizationService::authorize_admin(persistence, identity, organization_id, "update_voter")?;
    validate_name(&request.name).map_err(translate_domain_error)?;

    let mut department_ids: Vec<i64> = request.department_ids;
    department_ids.sort_unstable();
    department_ids.dedup();

    persistence
        .update_voter(organization_id, user_id, request.name.trim(), &department_ids)
        .map_err(translate_persistence_error)?;

    let user: User = persistence
        .get_user(user_id)
        .map_err(translate_persistence_error)?
        .ok_or_else(|| ApiError::not_found("User", format!("User {user_id} does not exist")))?;
    let department_ids: Vec<i64> = persistence
        .list_user_department_ids(organization_id, user_id)
        .map_err(translate_persistence_error)?;

    Ok(voter_info(VoterData {
        user,
        department_ids,
    }))
}

/// Removes a member from an organization and its departments.
///
/// # Errors
///
/// Returns an error if the caller is not an admin, the target is the
/// organization's creator, or the user is not a member.
pub fn remove_voter(
    persistence: &mut SqlitePersistence,
    identity: &VerifiedIdentity,
    organization_id: i64,
    user_id: i64,
) -> Result<(), ApiError> {
    AuthorizationService::authorize_admin(persistence, identity, organization_id, "remove_voter")?;

    let organization: Organization = load_organization(persistence, organization_id)?;
    if organization.creator_id == user_id {
        return Err(ApiError::Conflict {
            rule: String::from("creator_membership"),
            message: String::from("The organization's creator cannot be removed"),
        });
    }

    persistence
        .remove_voter(organization_id, user_id)
        .map_err(translate_persistence_error)
}

/// Sends invitations into an organization.
///
/// Registered recipients are sent to sign in and, when a department is
/// given, added to it right away. Everyone else is sent to sign up.
/// Delivery failures are reported per recipient.
///
/// # Arguments
///
/// * `persistence` - The persistence layer
/// * `identity` - The verified identity (must be an admin)
/// * `organization_id` - The inviting organization
/// * `request` - Recipients and optional department
/// * `app_url` - Base URL for invitation links
/// * `sender` - The delivery collaborator
///
/// # Errors
///
/// Returns an error if:
/// - The caller is not an admin
/// - The recipient lists are empty, differ in length, or hold a bad email
/// - The department is not part of the organization
/// - Every delivery fails
pub fn send_invitations(
    persistence: &mut SqlitePersistence,
    identity: &VerifiedIdentity,
    organization_id: i64,
    request: &SendInvitationsRequest,
    app_url: &Url,
    sender: &dyn InvitationSender,
) -> Result<SendInvitationsResponse, ApiError> {
    AuthorizationService::authorize_admin(
        persistence,
        identity,
        organization_id,
        "send_invitations",
    )?;

    if request.emails.is_empty() || request.names.is_empty() {
        return Err(ApiError::invalid_input("emails", "Missing required fields"));
    }
    if request.emails.len() != request.names.len() {
        return Err(ApiError::invalid_input(
            "names",
            format!(
                "Expected {} names, got {}",
                request.emails.len(),
                request.names.len()
            ),
        ));
    }
    for email in &request.emails {
        validate_email_format(email).map_err(translate_domain_error)?;
    }

    let organization: Organization = load_organization(persistence, organization_id)?;
    let department: Option<Department> = match request.department_id {
        Some(department_id) => Some(
            persistence
                .get_department(department_id)
                .map_err(translate_persistence_error)?
                .filter(|d| d.organization_id == organization_id)
                .ok_or_else(|| {
                    ApiError::not_found(
                        "Department",
                        format!("Department {department_id} does not exist"),
                    )
                })?,
        ),
        None => None,
    };

    let context: InvitationContext<'_> = InvitationContext {
        app_url,
        organization_id,
        organization_name: &organization.name,
        department: department
            .as_ref()
            .map(|d| (d.department_id, d.name.as_str())),
    };

    let mut results: Vec<InvitationResult> = Vec::with_capacity(request.emails.len());
    for (email, name) in request.emails.iter().zip(&request.names) {
        let email: String = normalize_email(email);
        let registered: Option<User> = persistence
            .get_user_by_email(&email)
            .map_err(translate_persistence_error)?;
        let invitation: Invitation = build_invitation(&context, &email, name.trim(), registered.is_some())?;

        let delivered: Result<(), String> = sender
            .send(&invitation)
            .map_err(|e| e.to_string())
            .and_then(|()| match (&registered, &department) {
                (Some(user), Some(department)) => persistence
                    .add_department_member(department.department_id, user.user_id)
                    .map(|_| ())
                    .map_err(|e| {
                        error!(error = %e, email, "Failed to add invitee to department");
                        String::from("Failed to add user to department")
                    }),
                _ => Ok(()),
            });

        results.push(InvitationResult {
            email,
            success: delivered.is_ok(),
            target: invitation.target.path().to_string(),
            error: delivered.err(),
        });
    }

    let failed_count: usize = results.iter().filter(|r| !r.success).count();
    if failed_count == results.len() {
        error!(organization_id, failed_count, "All invitations failed");
        return Err(ApiError::Internal {
            message: String::from("All invitations failed to send"),
        });
    }

    info!(organization_id, sent = results.len() - failed_count, failed_count, "Invitations sent");

    Ok(SendInvitationsResponse {
        partial_success: failed_count > 0,
        failed_count,
        results,
    })
}

// ============================================================================
// Organizations
// ============================================================================

/// Creates an organization with the caller as its first ADMIN.
///
/// # Errors
///
/// Returns an error if the identity is not a registered user or the name
/// is blank.
pub fn create_organization(
    persistence: &mut SqlitePersistence,
    identity: &VerifiedIdentity,
    request: &CreateOrganizationRequest,
    now: OffsetDateTime,
) -> Result<OrganizationInfo, ApiError> {
    let user: User = AuthenticationService::load_user(persistence, identity)?;
    validate_name(&request.name).map_err(translate_domain_error)?;

    let organization_id: i64 = persistence
        .create_organization(request.name.trim(), user.user_id, now)
        .map_err(translate_persistence_error)?;

    let organization: Organization = load_organization(persistence, organization_id)?;
    organization_info(&organization)
}

/// Lists the organizations the caller created.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn list_created_organizations(
    persistence: &mut SqlitePersistence,
    identity: &VerifiedIdentity,
) -> Result<ListOrganizationsResponse, ApiError> {
    let organizations: Vec<Organization> = persistence
        .list_organizations_by_creator(identity.user_id)
        .map_err(translate_persistence_error)?;

    Ok(ListOrganizationsResponse {
        organizations: organizations
            .iter()
            .map(organization_info)
            .collect::<Result<_, _>>()?,
    })
}

/// Lists the organizations the caller belongs to or created.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn list_memberships(
    persistence: &mut SqlitePersistence,
    identity: &VerifiedIdentity,
) -> Result<ListMembershipsResponse, ApiError> {
    let memberships: Vec<MembershipData> = persistence
        .list_memberships(identity.user_id)
        .map_err(translate_persistence_error)?;

    Ok(ListMembershipsResponse {
        memberships: memberships
            .iter()
            .map(|m| {
                Ok(MembershipInfo {
                    organization: organization_info(&m.organization)?,
                    role: m.role,
                })
            })
            .collect::<Result<_, ApiError>>()?,
    })
}

/// Deletes an organization with everything it owns.
///
/// # Errors
///
/// Returns an error if the organization does not exist or the caller did
/// not create it.
pub fn delete_organization(
    persistence: &mut SqlitePersistence,
    identity: &VerifiedIdentity,
    organization_id: i64,
) -> Result<(), ApiError> {
    let organization: Organization = load_organization(persistence, organization_id)?;
    AuthorizationService::authorize_creator(identity, &organization, "delete_organization")?;

    persistence
        .delete_organization(organization_id)
        .map_err(translate_persistence_error)
}

// ============================================================================
// Departments
// ============================================================================

/// Runs a department command through the rules, then through storage.
fn run_department_command(
    persistence: &mut SqlitePersistence,
    organization_id: i64,
    command: DepartmentCommand,
    now: OffsetDateTime,
) -> Result<DepartmentOutcome, ApiError> {
    let context: OrganizationContext = load_context(persistence, organization_id)?;
    apply_department_command(&context, command.clone())
        .map_err(|e| rejected("department_command", e))?;

    persistence
        .apply_department_command(organization_id, command, now)
        .map_err(translate_persistence_error)
}

/// Creates a department, optionally under a parent.
///
/// # Errors
///
/// Returns an error if the caller is not an admin, the name is blank, or
/// the parent is not part of the organization.
pub fn create_department(
    persistence: &mut SqlitePersistence,
    identity: &VerifiedIdentity,
    request: CreateDepartmentRequest,
    now: OffsetDateTime,
) -> Result<DepartmentInfo, ApiError> {
    let organization_id: i64 = request.organization_id;
    AuthorizationService::authorize_admin(
        persistence,
        identity,
        organization_id,
        "create_department",
    )?;

    let command: DepartmentCommand = DepartmentCommand::Create {
        name: request.name,
        parent_id: request.parent_id,
    };

    match run_department_command(persistence, organization_id, command, now)? {
        DepartmentOutcome::Created(department_id) => {
            department_info(persistence, organization_id, department_id)
        }
        other => Err(ApiError::Internal {
            message: format!("Unexpected department outcome {other:?}"),
        }),
    }
}

/// Lists an organization's departments with their full paths.
///
/// # Errors
///
/// Returns an error if the caller is not a member.
pub fn list_departments(
    persistence: &mut SqlitePersistence,
    identity: &VerifiedIdentity,
    organization_id: i64,
) -> Result<ListDepartmentsResponse, ApiError> {
    AuthorizationService::authorize_member(
        persistence,
        identity,
        organization_id,
        "list_departments",
    )?;

    Ok(ListDepartmentsResponse {
        organization_id,
        departments: department_infos(persistence, organization_id)?,
    })
}

/// Renames and/or moves a department.
///
/// # Errors
///
/// Returns an error if the caller is not an admin, the department is not
/// in the organization, or the move would create a cycle.
pub fn update_department(
    persistence: &mut SqlitePersistence,
    identity: &VerifiedIdentity,
    department_id: i64,
    request: UpdateDepartmentRequest,
    now: OffsetDateTime,
) -> Result<DepartmentInfo, ApiError> {
    let organization_id: i64 = request.organization_id;
    AuthorizationService::authorize_admin(
        persistence,
        identity,
        organization_id,
        "update_department",
    )?;

    let parent: FieldUpdate<i64> = match request.parent_id {
        None => FieldUpdate::Keep,
        Some(None) => FieldUpdate::Clear,
        Some(Some(parent_id)) => FieldUpdate::Set(parent_id),
    };
    let command: DepartmentCommand = DepartmentCommand::Update {
        department_id,
        name: request.name,
        parent,
    };

    run_department_command(persistence, organization_id, command, now)?;
    department_info(persistence, organization_id, department_id)
}

/// Deletes a department and every descendant.
///
/// The descendant set is computed from storage. The client's `child_ids`
/// are only compared against it.
///
/// # Errors
///
/// Returns an error if the caller is not an admin or the department is not
/// in the organization.
pub fn delete_department(
    persistence: &mut SqlitePersistence,
    identity: &VerifiedIdentity,
    department_id: i64,
    request: &DeleteDepartmentRequest,
    now: OffsetDateTime,
) -> Result<DeleteDepartmentResponse, ApiError> {
    let organization_id: i64 = request.organization_id;
    AuthorizationService::authorize_admin(
        persistence,
        identity,
        organization_id,
        "delete_department",
    )?;

    let command: DepartmentCommand = DepartmentCommand::Delete { department_id };
    let outcome: DepartmentOutcome = run_department_command(persistence, organization_id, command, now)?;

    let DepartmentOutcome::Deleted(deleted_ids) = outcome else {
        return Err(ApiError::Internal {
            message: format!("Unexpected department outcome {outcome:?}"),
        });
    };

    let mut claimed: Vec<i64> = request.child_ids.clone();
    claimed.sort_unstable();
    let mut actual: Vec<i64> = deleted_ids
        .iter()
        .copied()
        .filter(|id| *id != department_id)
        .collect();
    actual.sort_unstable();
    if claimed != actual {
        debug!(
            department_id,
            ?claimed,
            ?actual,
            "Client descendant list differs from stored tree"
        );
    }

    Ok(DeleteDepartmentResponse { deleted_ids })
}

// ============================================================================
// Votes
// ============================================================================

/// Creates a vote with its candidates.
///
/// # Errors
///
/// Returns an error if:
/// - The caller is not an admin
/// - The name is blank or a timestamp is malformed
/// - The candidate list is empty, repeats a user, or names a non-member
/// - The department is not part of the organization
/// - The end time is not after the start time
pub fn create_vote(
    persistence: &mut SqlitePersistence,
    identity: &VerifiedIdentity,
    request: CreateVoteRequest,
    now: OffsetDateTime,
) -> Result<VoteInfo, ApiError> {
    let organization_id: i64 = request.organization_id;
    AuthorizationService::authorize_admin(persistence, identity, organization_id, "create_vote")?;

    let draft: VoteDraft = VoteDraft {
        name: request.name,
        description: request.description,
        department_id: request.department_id,
        candidate_user_ids: request.candidates,
        start: parse_optional_time("start_time", request.start_time.as_deref())?,
        end: parse_optional_time("end_time", request.end_time.as_deref())?,
        is_anonymous: request.is_anonymous,
        vote_type: request.vote_type,
    };

    let context: OrganizationContext = load_context(persistence, organization_id)?;
    plan_vote(&context, draft.clone(), now).map_err(|e| rejected("create_vote", e))?;

    let vote_id: i64 = persistence
        .create_vote(organization_id, draft, now)
        .map_err(translate_persistence_error)?;

    let snapshot: VoteSnapshot = load_snapshot(persistence, vote_id)?;
    vote_info(persistence, &snapshot, identity.user_id, now)
}

/// Lists an organization's votes, newest first.
///
/// State and `is_active` are derived from `now`.
///
/// # Errors
///
/// Returns an error if the caller is not a member.
pub fn list_votes(
    persistence: &mut SqlitePersistence,
    identity: &VerifiedIdentity,
    organization_id: i64,
    now: OffsetDateTime,
) -> Result<ListVotesResponse, ApiError> {
    AuthorizationService::authorize_member(persistence, identity, organization_id, "list_votes")?;

    let snapshots: Vec<VoteSnapshot> = persistence
        .list_vote_snapshots(organization_id)
        .map_err(translate_persistence_error)?;

    let votes: Vec<VoteInfo> = snapshots
        .iter()
        .map(|snapshot| vote_info(persistence, snapshot, identity.user_id, now))
        .collect::<Result<_, _>>()?;

    Ok(ListVotesResponse {
        organization_id,
        votes,
    })
}

/// Retrieves one vote.
///
/// # Errors
///
/// Returns an error if the vote does not exist or the caller is not a
/// member of its organization.
pub fn get_vote(
    persistence: &mut SqlitePersistence,
    identity: &VerifiedIdentity,
    vote_id: i64,
    now: OffsetDateTime,
) -> Result<VoteInfo, ApiError> {
    let snapshot: VoteSnapshot = load_snapshot(persistence, vote_id)?;
    AuthorizationService::authorize_member(
        persistence,
        identity,
        snapshot.vote.organization_id,
        "get_vote",
    )?;

    vote_info(persistence, &snapshot, identity.user_id, now)
}

/// Applies a partial update to a vote.
///
/// A new candidate list keeps the rows of candidates that stay, adds the
/// new ones, and refuses to drop any candidate that already has ballots.
///
/// # Errors
///
/// Returns an error if the vote does not exist, the caller is not an
/// admin, or the changes break a vote rule.
pub fn update_vote(
    persistence: &mut SqlitePersistence,
    identity: &VerifiedIdentity,
    vote_id: i64,
    request: UpdateVoteRequest,
    now: OffsetDateTime,
) -> Result<VoteInfo, ApiError> {
    let snapshot: VoteSnapshot = load_snapshot(persistence, vote_id)?;
    let organization_id: i64 = snapshot.vote.organization_id;
    AuthorizationService::authorize_admin(persistence, identity, organization_id, "update_vote")?;

    let changes: VoteChanges = VoteChanges {
        name: request.name,
        description: request.description,
        department: match request.department_id {
            None => FieldUpdate::Keep,
            Some(None) => FieldUpdate::Clear,
            Some(Some(department_id)) => FieldUpdate::Set(department_id),
        },
        start: parse_optional_time("start_time", request.start_time.as_deref())?,
        end: match request.end_time {
            None => FieldUpdate::Keep,
            Some(None) => FieldUpdate::Clear,
            Some(Some(end)) => FieldUpdate::Set(parse_time("end_time", &end)?),
        },
        is_anonymous: request.is_anonymous,
        vote_type: request.vote_type,
        candidate_user_ids: request.candidates,
    };

    let context: OrganizationContext = load_context(persistence, organization_id)?;
    revise_vote(&context, &snapshot, changes.clone()).map_err(|e| rejected("update_vote", e))?;

    persistence
        .update_vote(vote_id, changes)
        .map_err(translate_persistence_error)?;

    let updated: VoteSnapshot = load_snapshot(persistence, vote_id)?;
    vote_info(persistence, &updated, identity.user_id, now)
}

/// Deletes a vote with its candidates, ballots, and slogans.
///
/// # Errors
///
/// Returns an error if the vote does not exist in the given organization
/// or the caller is not an admin.
pub fn delete_vote(
    persistence: &mut SqlitePersistence,
    identity: &VerifiedIdentity,
    vote_id: i64,
    organization_id: i64,
) -> Result<(), ApiError> {
    let vote: Vote = persistence
        .get_vote(vote_id)
        .map_err(translate_persistence_error)?
        .filter(|v| v.organization_id == organization_id)
        .ok_or_else(|| {
            ApiError::not_found(
                "Vote",
                format!("Vote {vote_id} does not exist in organization {organization_id}"),
            )
        })?;

    AuthorizationService::authorize_admin(
        persistence,
        identity,
        vote.organization_id,
        "delete_vote",
    )?;

    persistence
        .delete_vote(vote_id)
        .map_err(translate_persistence_error)
}

// ============================================================================
// Ballots
// ============================================================================

/// Records the caller's ballot.
///
/// # Arguments
///
/// * `persistence` - The persistence layer
/// * `identity` - The verified voter
/// * `vote_id` - The vote
/// * `request` - The chosen candidate
/// * `now` - The submission time
///
/// # Errors
///
/// Returns an error if:
/// - The identity is not a registered user
/// - The vote does not exist
/// - The caller is not a member of the vote's organization
/// - The vote is not open (`vote_closed`)
/// - The candidate is not part of the vote (`invalid_candidate`)
/// - The caller already voted (`already_voted`)
pub fn submit_ballot(
    persistence: &mut SqlitePersistence,
    identity: &VerifiedIdentity,
    vote_id: i64,
    request: SubmitBallotRequest,
    now: OffsetDateTime,
) -> Result<BallotResponse, ApiError> {
    let voter: User = AuthenticationService::load_user(persistence, identity)?;
    let snapshot: VoteSnapshot = load_snapshot(persistence, vote_id)?;
    AuthorizationService::authorize_member(
        persistence,
        identity,
        snapshot.vote.organization_id,
        "submit_ballot",
    )?;

    admit_ballot(&snapshot, voter.user_id, request.candidate_id, now)
        .map_err(|e| rejected("submit_ballot", e))?;

    let ballot: Ballot = persistence
        .submit_ballot(vote_id, voter.user_id, request.candidate_id, now)
        .map_err(translate_persistence_error)?;

    let total_votes: u32 = load_snapshot(persistence, vote_id)?.tally().total_votes();

    Ok(BallotResponse {
        ballot_id: ballot.ballot_id,
        vote_id: ballot.vote_id,
        candidate_id: ballot.candidate_id,
        vote_count: ballot.vote_count,
        is_winner: ballot.is_winner,
        statistics: ballot.statistics,
        total_votes,
    })
}

/// Aggregates a vote's results per candidate.
///
/// # Errors
///
/// Returns an error if the vote does not exist or the caller is not a
/// member of its organization.
pub fn get_results(
    persistence: &mut SqlitePersistence,
    identity: &VerifiedIdentity,
    vote_id: i64,
    now: OffsetDateTime,
) -> Result<VoteResultsResponse, ApiError> {
    let snapshot: VoteSnapshot = load_snapshot(persistence, vote_id)?;
    AuthorizationService::authorize_member(
        persistence,
        identity,
        snapshot.vote.organization_id,
        "get_results",
    )?;

    let users: HashMap<i64, User> = candidate_users(persistence, &snapshot)?;
    let mut slogans: HashMap<i64, String> = slogans_by_user(persistence, vote_id)?;
    let tally: Tally = snapshot.tally();

    let candidates: Vec<CandidateResult> = snapshot
        .candidates
        .iter()
        .filter_map(|candidate| {
            let user: &User = users.get(&candidate.user_id)?;
            Some(CandidateResult {
                id: candidate.candidate_id,
                name: user.name.clone(),
                slogan: slogans
                    .remove(&candidate.user_id)
                    .unwrap_or_else(|| String::from(NO_SLOGAN)),
                votes: tally.votes_for(candidate.candidate_id),
                is_winner: tally.is_winner(candidate.candidate_id),
                statistics: snapshot
                    .ballots
                    .iter()
                    .filter(|b| b.candidate_id == candidate.candidate_id)
                    .map(|b| published_statistics(&snapshot.vote, b))
                    .collect(),
            })
        })
        .collect();

    Ok(VoteResultsResponse {
        vote_id,
        vote_name: snapshot.vote.name.clone(),
        total_votes: tally.total_votes(),
        candidates,
        end_date: snapshot.vote.schedule.end().map(format_time).transpose()?,
        is_active: snapshot.vote.schedule.is_active_at(now),
    })
}

/// Stored statistics as shown in results. Anonymous votes never reveal
/// the voter, whatever the row recorded.
fn published_statistics(vote: &Vote, ballot: &Ballot) -> BallotStatistics {
    BallotStatistics {
        voted_at: ballot.statistics.voted_at.clone(),
        voter_id: if vote.is_anonymous {
            None
        } else {
            ballot.statistics.voter_id
        },
    }
}

/// Sets, replaces, or clears the caller's slogan in a vote.
///
/// # Errors
///
/// Returns an error if the vote does not exist, the caller is not a
/// member, or the caller is not one of the vote's candidates.
pub fn set_slogan(
    persistence: &mut SqlitePersistence,
    identity: &VerifiedIdentity,
    vote_id: i64,
    request: &SetSloganRequest,
) -> Result<SetSloganResponse, ApiError> {
    let snapshot: VoteSnapshot = load_snapshot(persistence, vote_id)?;
    AuthorizationService::authorize_member(
        persistence,
        identity,
        snapshot.vote.organization_id,
        "set_slogan",
    )?;

    if snapshot.candidate_for_user(identity.user_id).is_none() {
        return Err(AuthError::Unauthorized {
            action: String::from("set_slogan"),
            required_role: String::from("candidate"),
        }
        .into());
    }

    persistence
        .set_slogan(vote_id, identity.user_id, &request.text)
        .map_err(translate_persistence_error)?;

    let text: &str = request.text.trim();
    Ok(SetSloganResponse {
        vote_id,
        user_id: identity.user_id,
        slogan: (!text.is_empty()).then(|| text.to_string()),
    })
}
