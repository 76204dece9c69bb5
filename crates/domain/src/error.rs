// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use time::OffsetDateTime;

/// Errors that can occur during domain validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A name is empty or invalid.
    InvalidName(String),
    /// An email address is malformed.
    InvalidEmail(String),
    /// A vote was defined without any candidates.
    EmptyCandidateList,
    /// The same user was listed more than once as a candidate in one vote.
    DuplicateCandidate {
        /// The user listed twice.
        user_id: i64,
    },
    /// The vote schedule ends at or before it starts.
    InvalidSchedule {
        /// The requested start time.
        start: OffsetDateTime,
        /// The requested end time.
        end: OffsetDateTime,
    },
    /// A vote type string is not recognized.
    InvalidVoteType(String),
    /// A member role string is not recognized.
    InvalidRole(String),
    /// A timestamp could not be parsed or formatted.
    InvalidTimestamp {
        /// The offending value.
        value: String,
        /// The reason the value was rejected.
        reason: String,
    },
    /// The department does not exist in the organization's tree.
    DepartmentNotFound(i64),
    /// Moving the department under the given parent would form a cycle.
    DepartmentCycle {
        /// The department being moved.
        department_id: i64,
        /// The requested parent.
        parent_id: i64,
    },
    /// The requested parent department belongs to another organization.
    ParentOutsideOrganization {
        /// The requested parent.
        parent_id: i64,
        /// The organization the child belongs to.
        organization_id: i64,
    },
}

impl std::fmt::Display for DomainError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidName(msg) => write!(f, "Invalid name: {msg}"),
            Self::InvalidEmail(msg) => write!(f, "Invalid email: {msg}"),
            Self::EmptyCandidateList => write!(f, "A vote requires at least one candidate"),
            Self::DuplicateCandidate { user_id } => write!(
                f,
                "A candidate can only be added once to a vote (user {user_id})"
            ),
            Self::InvalidSchedule { start, end } => {
                write!(f, "Vote end time {end} must be after start time {start}")
            }
            Self::InvalidVoteType(value) => write!(f, "Unknown vote type: {value}"),
            Self::InvalidRole(value) => write!(f, "Unknown member role: {value}"),
            Self::InvalidTimestamp { value, reason } => {
                write!(f, "Invalid timestamp '{value}': {reason}")
            }
            Self::DepartmentNotFound(id) => write!(f, "Department {id} does not exist"),
            Self::DepartmentCycle {
                department_id,
                parent_id,
            } => write!(
                f,
                "Moving department {department_id} under {parent_id} would create a cycle"
            ),
            Self::ParentOutsideOrganization {
                parent_id,
                organization_id,
            } => write!(
                f,
                "Parent department {parent_id} does not belong to organization {organization_id}"
            ),
        }
    }
}

impl std::error::Error for DomainError {}
