// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::error::DomainError;
use crate::schedule::VoteSchedule;

/// A tenant boundary owning departments, members, and votes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Organization {
    /// Storage identifier.
    pub organization_id: i64,
    /// Display name.
    pub name: String,
    /// The user who created the organization.
    pub creator_id: i64,
    /// Creation time (UTC).
    pub created_at: OffsetDateTime,
}

/// Role a user holds inside one organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MemberRole {
    /// Manages departments, voters, and votes.
    Admin,
    /// Participates in votes.
    Member,
}

impl MemberRole {
    /// Returns the stored representation of the role.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "ADMIN",
            Self::Member => "MEMBER",
        }
    }

    /// Parses a stored role string.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidRole` for unknown values.
    pub fn parse(value: &str) -> Result<Self, DomainError> {
        match value {
            "ADMIN" => Ok(Self::Admin),
            "MEMBER" => Ok(Self::Member),
            other => Err(DomainError::InvalidRole(other.to_string())),
        }
    }
}

impl std::fmt::Display for MemberRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A registered user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    /// Storage identifier.
    pub user_id: i64,
    /// Display name.
    pub name: String,
    /// Unique, normalized email address.
    pub email: String,
    /// Number of ballots this user has ever cast.
    pub vote_participation_count: u32,
}

/// A user's membership row for one organization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Membership {
    /// The organization.
    pub organization_id: i64,
    /// The member.
    pub user_id: i64,
    /// The member's role.
    pub role: MemberRole,
}

/// A named node in an organization's department tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Department {
    /// Storage identifier.
    pub department_id: i64,
    /// Owning organization.
    pub organization_id: i64,
    /// Display name.
    pub name: String,
    /// Parent department, `None` for a root.
    pub parent_id: Option<i64>,
}

/// The declared kind of a vote.
///
/// Only single-choice semantics are enforced when ballots are tallied; the
/// other kinds are stored and reported as declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VoteType {
    /// Yes or no.
    YesNo,
    /// Exactly one candidate.
    #[default]
    SingleChoice,
    /// Several candidates.
    MultipleChoice,
    /// Candidates ordered by rank.
    RankedChoice,
    /// Preferential ballot.
    Preferential,
}

impl VoteType {
    /// Returns the stored representation of the vote type.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::YesNo => "YES_NO",
            Self::SingleChoice => "SINGLE_CHOICE",
            Self::MultipleChoice => "MULTIPLE_CHOICE",
            Self::RankedChoice => "RANKED_CHOICE",
            Self::Preferential => "PREFERENTIAL",
        }
    }

    /// Parses a stored vote type string.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidVoteType` for unknown values.
    pub fn parse(value: &str) -> Result<Self, DomainError> {
        match value {
            "YES_NO" => Ok(Self::YesNo),
            "SINGLE_CHOICE" => Ok(Self::SingleChoice),
            "MULTIPLE_CHOICE" => Ok(Self::MultipleChoice),
            "RANKED_CHOICE" => Ok(Self::RankedChoice),
            "PREFERENTIAL" => Ok(Self::Preferential),
            other => Err(DomainError::InvalidVoteType(other.to_string())),
        }
    }
}

/// A scheduled election among candidates drawn from organization members.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vote {
    /// Storage identifier.
    pub vote_id: i64,
    /// Owning organization.
    pub organization_id: i64,
    /// Optional department scope.
    pub department_id: Option<i64>,
    /// Display name.
    pub name: String,
    /// Free-text description.
    pub description: String,
    /// Start and optional end of the ballot window.
    pub schedule: VoteSchedule,
    /// Whether ballot statistics omit the voter.
    pub is_anonymous: bool,
    /// Declared vote kind.
    pub vote_type: VoteType,
    /// Creation time (UTC).
    pub created_at: OffsetDateTime,
}

/// A member registered as an option within one vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoteCandidate {
    /// Storage identifier; ballots reference this id.
    pub candidate_id: i64,
    /// The vote.
    pub vote_id: i64,
    /// The member standing as candidate.
    pub user_id: i64,
}

/// Opaque payload recorded with each ballot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BallotStatistics {
    /// Submission time, RFC 3339.
    pub voted_at: String,
    /// The voter, absent for anonymous votes.
    pub voter_id: Option<i64>,
}

/// One voter's recorded choice in one vote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ballot {
    /// Storage identifier.
    pub ballot_id: i64,
    /// The vote.
    pub vote_id: i64,
    /// The chosen `VoteCandidate` id.
    pub candidate_id: i64,
    /// The voter. Always stored, even for anonymous votes.
    pub voter_id: i64,
    /// Always 1.
    pub vote_count: u32,
    /// Whether the chosen candidate currently leads.
    pub is_winner: bool,
    /// Submission statistics.
    pub statistics: BallotStatistics,
}

/// A candidate's campaign statement for one vote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slogan {
    /// The vote.
    pub vote_id: i64,
    /// The candidate's user id.
    pub user_id: i64,
    /// The statement text.
    pub text: String,
}
