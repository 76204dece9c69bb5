// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! API request and response data transfer objects.
//!
//! Timestamps cross the boundary as RFC 3339 strings and are parsed by
//! the handlers. Fields that distinguish "absent" from "null" use
//! `Option<Option<T>>`.

use orgvote_domain::{BallotStatistics, MemberRole, VoteType};
use serde::{Deserialize, Deserializer};

/// Deserializes a present field, including an explicit `null`, as `Some`.
///
/// Used with `#[serde(default)]` so that an absent field stays `None`.
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

// ============================================================================
// Members
// ============================================================================

/// API request to register a member.
///
/// When `organization_id` is given, the member joins that organization.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
pub struct RegisterMemberRequest {
    /// Display name.
    pub name: String,
    /// Email address.
    pub email: String,
    /// Plain-text password.
    pub password: String,
    /// Organization to join.
    #[serde(default)]
    pub organization_id: Option<i64>,
}

/// API response for a successful registration.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RegisterMemberResponse {
    /// The registered user.
    pub user_id: i64,
    /// The organization joined, if any.
    pub organization_id: Option<i64>,
    /// Whether a new user record was created.
    pub created: bool,
    /// A success message.
    pub message: String,
}

/// API request to check an email before registration.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
pub struct ValidateEmailRequest {
    /// The email to check.
    pub email: String,
}

/// API response for an email check.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ValidateEmailResponse {
    /// Whether the email can be registered.
    pub is_valid: bool,
    /// Why the email cannot be registered.
    pub message: Option<String>,
}

/// A non-admin member of an organization.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct VoterInfo {
    /// The user.
    pub user_id: i64,
    /// Display name.
    pub name: String,
    /// Email address.
    pub email: String,
    /// Lifetime number of ballots cast.
    pub vote_participation_count: u32,
    /// Departments of this organization the voter belongs to.
    pub department_ids: Vec<i64>,
}

/// API response listing voters.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ListVotersResponse {
    /// The organization.
    pub organization_id: i64,
    /// Voters ordered by user id.
    pub voters: Vec<VoterInfo>,
}

/// API request to rename a voter and replace their departments.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
pub struct UpdateVoterRequest {
    /// New display name.
    pub name: String,
    /// Complete department list within the organization.
    #[serde(default)]
    pub department_ids: Vec<i64>,
}

/// API request to invite people into an organization.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
pub struct SendInvitationsRequest {
    /// Recipient addresses.
    pub emails: Vec<String>,
    /// Recipient names, parallel to `emails`.
    pub names: Vec<String>,
    /// Department to join.
    #[serde(default)]
    pub department_id: Option<i64>,
}

/// Outcome of one invitation.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct InvitationResult {
    /// Recipient address.
    pub email: String,
    /// Whether the invitation was delivered.
    pub success: bool,
    /// `sign-in` or `sign-up`.
    pub target: String,
    /// Why delivery failed.
    pub error: Option<String>,
}

/// API response for an invitation batch.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SendInvitationsResponse {
    /// Per-recipient outcomes, in request order.
    pub results: Vec<InvitationResult>,
    /// Whether some, but not all, deliveries failed.
    pub partial_success: bool,
    /// Number of failed deliveries.
    pub failed_count: usize,
}

// ============================================================================
// Organizations
// ============================================================================

/// API request to create an organization.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
pub struct CreateOrganizationRequest {
    /// Display name.
    pub name: String,
}

/// An organization.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct OrganizationInfo {
    /// The organization.
    pub organization_id: i64,
    /// Display name.
    pub name: String,
    /// The creating user.
    pub creator_id: i64,
    /// Creation time, RFC 3339.
    pub created_at: String,
}

/// API response listing organizations.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ListOrganizationsResponse {
    /// Organizations, newest first.
    pub organizations: Vec<OrganizationInfo>,
}

/// An organization with the caller's role in it.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct MembershipInfo {
    /// The organization.
    pub organization: OrganizationInfo,
    /// The caller's role.
    pub role: MemberRole,
}

/// API response listing the caller's memberships.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ListMembershipsResponse {
    /// Memberships, newest organization first.
    pub memberships: Vec<MembershipInfo>,
}

// ============================================================================
// Departments
// ============================================================================

/// API request to create a department.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
pub struct CreateDepartmentRequest {
    /// Owning organization.
    pub organization_id: i64,
    /// Display name.
    pub name: String,
    /// Parent department; a root when absent.
    #[serde(default)]
    pub parent_id: Option<i64>,
}

/// API request to rename or move a department.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
pub struct UpdateDepartmentRequest {
    /// Owning organization.
    pub organization_id: i64,
    /// New name.
    #[serde(default)]
    pub name: Option<String>,
    /// Absent keeps the parent, `null` makes a root.
    #[serde(default, deserialize_with = "double_option")]
    pub parent_id: Option<Option<i64>>,
}

/// API request to delete a department subtree.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
pub struct DeleteDepartmentRequest {
    /// Owning organization.
    pub organization_id: i64,
    /// Descendants the client believes exist. Advisory only.
    #[serde(default)]
    pub child_ids: Vec<i64>,
}

/// A department with its derived full path.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct DepartmentInfo {
    /// The department.
    pub department_id: i64,
    /// Owning organization.
    pub organization_id: i64,
    /// Display name.
    pub name: String,
    /// Parent department.
    pub parent_id: Option<i64>,
    /// Root-to-self name chain.
    pub full_path: String,
}

/// API response listing departments.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ListDepartmentsResponse {
    /// The organization.
    pub organization_id: i64,
    /// Departments sorted by full path.
    pub departments: Vec<DepartmentInfo>,
}

/// API response for a subtree deletion.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct DeleteDepartmentResponse {
    /// Deleted departments, deepest first.
    pub deleted_ids: Vec<i64>,
}

// ============================================================================
// Votes
// ============================================================================

/// API request to create a vote.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
pub struct CreateVoteRequest {
    /// Owning organization.
    pub organization_id: i64,
    /// Display name.
    pub name: String,
    /// Free-text description.
    #[serde(default)]
    pub description: String,
    /// Optional department scope.
    #[serde(default)]
    pub department_id: Option<i64>,
    /// Candidate user ids.
    pub candidates: Vec<i64>,
    /// Start of the window, RFC 3339. Defaults to now.
    #[serde(default)]
    pub start_time: Option<String>,
    /// End of the window, RFC 3339. Open-ended when absent.
    #[serde(default)]
    pub end_time: Option<String>,
    /// Whether ballot statistics omit the voter.
    #[serde(default)]
    pub is_anonymous: bool,
    /// Declared vote kind.
    #[serde(default)]
    pub vote_type: VoteType,
}

/// API request to change a vote.
///
/// Absent fields are left unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Default, serde::Deserialize)]
pub struct UpdateVoteRequest {
    /// New name.
    #[serde(default)]
    pub name: Option<String>,
    /// New description.
    #[serde(default)]
    pub description: Option<String>,
    /// Absent keeps the scope, `null` clears it.
    #[serde(default, deserialize_with = "double_option")]
    pub department_id: Option<Option<i64>>,
    /// Replacement candidate user ids.
    #[serde(default)]
    pub candidates: Option<Vec<i64>>,
    /// New start, RFC 3339.
    #[serde(default)]
    pub start_time: Option<String>,
    /// Absent keeps the end, `null` makes the vote open-ended.
    #[serde(default, deserialize_with = "double_option")]
    pub end_time: Option<Option<String>>,
    /// New anonymity flag.
    #[serde(default)]
    pub is_anonymous: Option<bool>,
    /// New vote kind.
    #[serde(default)]
    pub vote_type: Option<VoteType>,
}

/// A candidate as shown with a vote.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CandidateInfo {
    /// The `VoteCandidate` id ballots refer to.
    pub candidate_id: i64,
    /// The candidate's user id.
    pub user_id: i64,
    /// Display name.
    pub name: String,
    /// Email address.
    pub email: String,
    /// Campaign statement.
    pub slogan: Option<String>,
    /// Ballots counted for this candidate.
    pub votes: u32,
    /// Whether this candidate currently leads.
    pub is_winner: bool,
}

/// A vote with its candidates and derived state.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct VoteInfo {
    /// The vote.
    pub vote_id: i64,
    /// Owning organization.
    pub organization_id: i64,
    /// Department scope.
    pub department_id: Option<i64>,
    /// Display name.
    pub name: String,
    /// Free-text description.
    pub description: String,
    /// Start of the window, RFC 3339.
    pub start_time: String,
    /// End of the window, RFC 3339.
    pub end_time: Option<String>,
    /// Whether ballot statistics omit the voter.
    pub is_anonymous: bool,
    /// Declared vote kind.
    pub vote_type: VoteType,
    /// `PENDING`, `OPEN` or `CLOSED` at response time.
    pub state: String,
    /// Whether ballots are accepted at response time.
    pub is_active: bool,
    /// Whether the caller has already voted.
    pub has_voted: bool,
    /// Total ballots recorded.
    pub total_votes: u32,
    /// Candidates in display order.
    pub candidates: Vec<CandidateInfo>,
    /// Creation time, RFC 3339.
    pub created_at: String,
}

/// API response listing votes.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ListVotesResponse {
    /// The organization.
    pub organization_id: i64,
    /// Votes, newest first.
    pub votes: Vec<VoteInfo>,
}

/// API request to submit a ballot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize)]
pub struct SubmitBallotRequest {
    /// The chosen `VoteCandidate` id.
    pub candidate_id: i64,
}

/// API response for a recorded ballot.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct BallotResponse {
    /// The ballot.
    pub ballot_id: i64,
    /// The vote.
    pub vote_id: i64,
    /// The chosen candidate.
    pub candidate_id: i64,
    /// Always 1.
    pub vote_count: u32,
    /// Whether the chosen candidate leads after this ballot.
    pub is_winner: bool,
    /// Stored statistics.
    pub statistics: BallotStatistics,
    /// Total ballots recorded after this one.
    pub total_votes: u32,
}

/// One candidate in a result view.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CandidateResult {
    /// The `VoteCandidate` id.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Campaign statement, or a placeholder.
    pub slogan: String,
    /// Ballots counted for this candidate.
    pub votes: u32,
    /// Whether this candidate has the maximum count.
    pub is_winner: bool,
    /// Statistics of each ballot for this candidate.
    pub statistics: Vec<BallotStatistics>,
}

/// Aggregated results of a vote.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct VoteResultsResponse {
    /// The vote.
    pub vote_id: i64,
    /// Display name.
    pub vote_name: String,
    /// Sum of all counted ballots.
    pub total_votes: u32,
    /// Candidates in display order.
    pub candidates: Vec<CandidateResult>,
    /// End of the window, RFC 3339.
    pub end_date: Option<String>,
    /// Whether ballots are accepted at response time.
    pub is_active: bool,
}

/// API request to set the caller's slogan for a vote.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
pub struct SetSloganRequest {
    /// The statement; empty clears it.
    pub text: String,
}

/// API response for a slogan change.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SetSloganResponse {
    /// The vote.
    pub vote_id: i64,
    /// The candidate's user id.
    pub user_id: i64,
    /// The stored statement, `None` when cleared.
    pub slogan: Option<String>,
}
