// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Error types for the API layer.

use orgvote::CoreError;
use orgvote_domain::DomainError;
use orgvote_persistence::PersistenceError;
use tracing::error;

use crate::invitations::InvitationError;
use crate::password_policy::PasswordPolicyError;

/// Authentication and authorization errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// No usable identity was supplied.
    AuthenticationFailed {
        /// The reason authentication failed.
        reason: String,
    },
    /// The identity lacks the membership the action requires.
    Unauthorized {
        /// The action that was attempted.
        action: String,
        /// The role required for this action.
        required_role: String,
    },
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AuthenticationFailed { reason } => {
                write!(f, "Authentication failed: {reason}")
            }
            Self::Unauthorized {
                action,
                required_role,
            } => {
                write!(f, "Unauthorized: '{action}' requires {required_role} role")
            }
        }
    }
}

impl std::error::Error for AuthError {}

/// API-level errors.
///
/// These are distinct from domain/core errors and represent the API contract.
/// Every variant maps to one stable `kind()` string clients can branch on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Invalid input was provided.
    InvalidInput {
        /// The field that was invalid.
        field: String,
        /// A human-readable description of the error.
        message: String,
    },
    /// Authentication failed.
    AuthenticationFailed {
        /// The reason authentication failed.
        reason: String,
    },
    /// Authorization failed - the identity does not have permission.
    Unauthorized {
        /// The action that was attempted.
        action: String,
        /// The role required for this action.
        required_role: String,
    },
    /// A requested resource was not found.
    ResourceNotFound {
        /// The type of resource that was not found.
        resource_type: String,
        /// A human-readable description of what was not found.
        message: String,
    },
    /// The request conflicts with existing state.
    Conflict {
        /// The rule that was violated.
        rule: String,
        /// A human-readable description of the conflict.
        message: String,
    },
    /// A ballot was submitted outside the vote's window.
    VoteClosed {
        /// The vote.
        vote_id: i64,
        /// A human-readable description.
        message: String,
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
    },
    /// An internal error occurred.
    Internal {
        /// A description of the internal error.
        message: String,
    },
}

impl ApiError {
    /// Returns the stable error kind clients branch on.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::InvalidInput { .. } => "invalid_argument",
            Self::AuthenticationFailed { .. } => "unauthenticated",
            Self::Unauthorized { .. } => "forbidden",
            Self::ResourceNotFound { .. } => "not_found",
            Self::Conflict { .. } => "conflict",
            Self::VoteClosed { .. } => "vote_closed",
            Self::InvalidCandidate { .. } => "invalid_candidate",
            Self::AlreadyVoted { .. } => "already_voted",
            Self::Internal { .. } => "internal",
        }
    }

    /// Shorthand for an `InvalidInput` error.
    pub(crate) fn invalid_input(field: &str, message: impl Into<String>) -> Self {
        Self::InvalidInput {
            field: field.to_string(),
            message: message.into(),
        }
    }

    /// Shorthand for a `ResourceNotFound` error.
    pub(crate) fn not_found(resource_type: &str, message: impl Into<String>) -> Self {
        Self::ResourceNotFound {
            resource_type: resource_type.to_string(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidInput { field, message } => {
                write!(f, "Invalid input for field '{field}': {message}")
            }
            Self::AuthenticationFailed { reason } => {
                write!(f, "Authentication failed: {reason}")
            }
            Self::Unauthorized {
                action,
                required_role,
            } => {
                write!(f, "Unauthorized: '{action}' requires {required_role} role")
            }
            Self::ResourceNotFound {
                resource_type,
                message,
            } => {
                write!(f, "{resource_type} not found: {message}")
            }
            Self::Conflict { message, .. } => write!(f, "{message}"),
            Self::VoteClosed { message, .. } => write!(f, "{message}"),
            Self::InvalidCandidate {
                vote_id,
                candidate_id,
            } => {
                write!(f, "Candidate {candidate_id} is not part of vote {vote_id}")
            }
            Self::AlreadyVoted { vote_id } => {
                write!(f, "You have already voted in vote {vote_id}")
            }
            Self::Internal { message } => {
                write!(f, "Internal error: {message}")
            }
        }
    }
}

impl std::error::Error for ApiError {}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::AuthenticationFailed { reason } => Self::AuthenticationFailed { reason },
            AuthError::Unauthorized {
                action,
                required_role,
            } => Self::Unauthorized {
                action,
                required_role,
            },
        }
    }
}

impl From<PasswordPolicyError> for ApiError {
    fn from(err: PasswordPolicyError) -> Self {
        Self::InvalidInput {
            field: String::from("password"),
            message: err.to_string(),
        }
    }
}

impl From<InvitationError> for ApiError {
    fn from(err: InvitationError) -> Self {
        error!(error = %err, "Invitation failed");
        Self::Internal {
            message: String::from("Failed to send invitations"),
        }
    }
}

/// Translates a domain error into an API error.
///
/// This translation is explicit and ensures domain errors are not leaked directly.
#[must_use]
pub fn translate_domain_error(err: DomainError) -> ApiError {
    match err {
        DomainError::InvalidName(msg) => ApiError::invalid_input("name", msg),
        DomainError::InvalidEmail(msg) => ApiError::invalid_input("email", msg),
        DomainError::EmptyCandidateList => {
            ApiError::invalid_input("candidates", "A vote requires at least one candidate")
        }
        DomainError::DuplicateCandidate { .. } => ApiError::invalid_input(
            "candidates",
            "A candidate can only be added once to a vote",
        ),
        DomainError::InvalidSchedule { .. } => {
            ApiError::invalid_input("end_time", "End time must be after start time")
        }
        DomainError::InvalidVoteType(value) => {
            ApiError::invalid_input("vote_type", format!("Unknown vote type '{value}'"))
        }
        DomainError::InvalidRole(value) => {
            ApiError::invalid_input("role", format!("Unknown member role '{value}'"))
        }
        DomainError::InvalidTimestamp { value, reason } => ApiError::invalid_input(
            "timestamp",
            format!("Failed to parse timestamp '{value}': {reason}"),
        ),
        DomainError::DepartmentNotFound(id) => {
            ApiError::not_found("Department", format!("Department {id} does not exist"))
        }
        DomainError::DepartmentCycle { .. } => {
            ApiError::invalid_input("parent_id", "Department move would create a cycle")
        }
        DomainError::ParentOutsideOrganization {
            parent_id,
            organization_id,
        } => ApiError::invalid_input(
            "parent_id",
            format!("Department {parent_id} does not belong to organization {organization_id}"),
        ),
    }
}

/// Translates a core error into an API error.
///
/// This translation is explicit and ensures core errors are not leaked directly.
#[must_use]
pub fn translate_core_error(err: CoreError) -> ApiError {
    match err {
        CoreError::DomainViolation(domain_err) => translate_domain_error(domain_err),
        CoreError::VoteClosed { vote_id, state } => ApiError::VoteClosed {
            vote_id,
            message: format!("Vote {vote_id} is not accepting ballots ({})", state.as_str()),
        },
        CoreError::InvalidCandidate {
            vote_id,
            candidate_id,
        } => ApiError::InvalidCandidate {
            vote_id,
            candidate_id,
        },
        CoreError::AlreadyVoted { vote_id, .. } => ApiError::AlreadyVoted { vote_id },
        CoreError::CandidateNotMember {
            user_id,
            organization_id,
        } => ApiError::invalid_input(
            "candidates",
            format!("User {user_id} is not a member of organization {organization_id}"),
        ),
        CoreError::DepartmentOutsideOrganization {
            department_id,
            organization_id,
        } => ApiError::invalid_input(
            "department_id",
            format!("Department {department_id} does not belong to organization {organization_id}"),
        ),
        CoreError::CandidateHasBallots {
            user_id, ballots, ..
        } => ApiError::Conflict {
            rule: String::from("candidate_has_ballots"),
            message: format!(
                "Candidate {user_id} already has {ballots} ballot(s) and cannot be removed"
            ),
        },
        CoreError::AnonymityLocked { vote_id, ballots } => ApiError::Conflict {
            rule: String::from("anonymity_locked"),
            message: format!(
                "Vote {vote_id} already has {ballots} ballot(s); anonymity can no longer change"
            ),
        },
        CoreError::Internal(msg) => {
            error!(message = %msg, "Core invariant failed");
            ApiError::Internal {
                message: String::from("An internal error occurred"),
            }
        }
    }
}

/// Translates a persistence error into an API error.
///
/// Rejections raised while re-validating inside a transaction are
/// translated like their core counterparts. Storage failures are logged
/// and reported without their text.
#[must_use]
pub fn translate_persistence_error(err: PersistenceError) -> ApiError {
    match err {
        PersistenceError::TransitionRejected(core_err) => translate_core_error(core_err),
        PersistenceError::NotFound(what) => {
            ApiError::not_found("Resource", format!("{what} does not exist"))
        }
        PersistenceError::UniqueViolation(detail) => ApiError::Conflict {
            rule: String::from("unique"),
            message: format!("Record already exists ({detail})"),
        },
        other => {
            error!(error = %other, "Persistence failure");
            ApiError::Internal {
                message: String::from("A storage error occurred"),
            }
        }
    }
}
