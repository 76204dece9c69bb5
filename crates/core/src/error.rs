// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use orgvote_domain::{DomainError, VoteState};

/// Errors that can occur during state transitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// A domain rule was violated.
    DomainViolation(DomainError),
    /// A ballot was submitted while the vote was not open.
    VoteClosed {
        /// The vote.
        vote_id: i64,
        /// The state the vote was in.
        state: VoteState,
    },
    /// The chosen candidate is not registered in the vote.
    InvalidCandidate {
        /// The vote.
        vote_id: i64,
        /// The rejected candidate id.
        candidate_id: i64,
    },
    /// The voter already has a ballot in the vote.
    AlreadyVoted {
        /// The vote.
        vote_id: i64,
        /// The voter.
        voter_id: i64,
    },
    /// A candidate user is not a member of the vote's organization.
    CandidateNotMember {
        /// The user.
        user_id: i64,
        /// The organization.
        organization_id: i64,
    },
    /// The vote's department scope is not part of its organization.
    DepartmentOutsideOrganization {
        /// The department.
        department_id: i64,
        /// The organization.
        organization_id: i64,
    },
    /// A candidate with recorded ballots cannot be removed from a vote.
    CandidateHasBallots {
        /// The vote.
        vote_id: i64,
        /// The candidate's user id.
        user_id: i64,
        /// Number of ballots recorded for the candidate.
        ballots: u32,
    },
    /// The anonymity setting cannot change once ballots are recorded.
    AnonymityLocked {
        /// The vote.
        vote_id: i64,
        /// Number of ballots recorded in the vote.
        ballots: usize,
    },
    /// An internal invariant failed.
    Internal(String),
}

impl std::fmt::Display for CoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DomainViolation(err) => write!(f, "Domain violation: {err}"),
            Self::VoteClosed { vote_id, state } => write!(
                f,
                "Vote {vote_id} is not accepting ballots (state: {})",
                state.as_str()
            ),
            Self::InvalidCandidate {
                vote_id,
                candidate_id,
            } => write!(
                f,
                "Candidate {candidate_id} is not registered in vote {vote_id}"
            ),
            Self::AlreadyVoted { vote_id, voter_id } => {
                write!(f, "User {voter_id} has already voted in vote {vote_id}")
            }
            Self::CandidateNotMember {
                user_id,
                organization_id,
            } => write!(
                f,
                "User {user_id} is not a member of organization {organization_id}"
            ),
            Self::DepartmentOutsideOrganization {
                department_id,
                organization_id,
            } => write!(
                f,
                "Department {department_id} does not belong to organization {organization_id}"
            ),
            Self::CandidateHasBallots {
                vote_id,
                user_id,
                ballots,
            } => write!(
                f,
                "Candidate {user_id} has {ballots} ballot(s) in vote {vote_id} and cannot be removed"
            ),
            Self::AnonymityLocked { vote_id, ballots } => write!(
                f,
                "Vote {vote_id} has {ballots} ballot(s); its anonymity can no longer change"
            ),
            Self::Internal(msg) => write!(f, "Internal error: {msg}"),
        }
    }
}

impl std::error::Error for CoreError {}

impl From<DomainError> for CoreError {
    fn from(err: DomainError) -> Self {
        Self::DomainViolation(err)
    }
}
