// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use std::collections::HashSet;

use orgvote_domain::{
    Ballot, BallotStatistics, DepartmentTree, Tally, Vote, VoteCandidate, VoteSchedule, VoteType,
    tally,
};
use time::OffsetDateTime;

/// The parts of an organization a command is validated against.
#[derive(Debug, Clone)]
pub struct OrganizationContext {
    /// The organization.
    pub organization_id: i64,
    /// User ids holding any membership row in the organization.
    pub member_ids: HashSet<i64>,
    /// The organization's department tree.
    pub departments: DepartmentTree,
}

impl OrganizationContext {
    /// Creates a context.
    #[must_use]
    pub const fn new(
        organization_id: i64,
        member_ids: HashSet<i64>,
        departments: DepartmentTree,
    ) -> Self {
        Self {
            organization_id,
            member_ids,
            departments,
        }
    }

    /// Returns whether the user is a member of the organization.
    #[must_use]
    pub fn is_member(&self, user_id: i64) -> bool {
        self.member_ids.contains(&user_id)
    }
}

/// A vote together with its candidates and recorded ballots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoteSnapshot {
    /// The vote.
    pub vote: Vote,
    /// Registered candidates, in display order.
    pub candidates: Vec<VoteCandidate>,
    /// Recorded ballots.
    pub ballots: Vec<Ballot>,
}

impl VoteSnapshot {
    /// Returns the candidate with the given `VoteCandidate` id.
    #[must_use]
    pub fn candidate(&self, candidate_id: i64) -> Option<&VoteCandidate> {
        self.candidates
            .iter()
            .find(|c| c.candidate_id == candidate_id)
    }

    /// Returns the candidate row for a user.
    #[must_use]
    pub fn candidate_for_user(&self, user_id: i64) -> Option<&VoteCandidate> {
        self.candidates.iter().find(|c| c.user_id == user_id)
    }

    /// Returns whether the voter already has a ballot.
    #[must_use]
    pub fn has_voted(&self, voter_id: i64) -> bool {
        self.ballots.iter().any(|b| b.voter_id == voter_id)
    }

    /// Returns the number of ballots cast for a candidate.
    #[must_use]
    pub fn ballots_for(&self, candidate_id: i64) -> u32 {
        self.ballots
            .iter()
            .filter(|b| b.candidate_id == candidate_id)
            .fold(0_u32, |acc, b| acc.saturating_add(b.vote_count))
    }

    /// Aggregates the recorded ballots per candidate.
    #[must_use]
    pub fn tally(&self) -> Tally {
        let candidate_ids: Vec<i64> = self.candidates.iter().map(|c| c.candidate_id).collect();
        tally(
            &candidate_ids,
            self.ballots.iter().map(|b| (b.candidate_id, b.vote_count)),
        )
    }
}

/// The write a department command resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DepartmentTransition {
    /// Insert a new department.
    Create {
        /// The organization.
        organization_id: i64,
        /// Trimmed name.
        name: String,
        /// Parent, `None` for a root.
        parent_id: Option<i64>,
    },
    /// Replace name and parent of an existing department.
    Update {
        /// The department.
        department_id: i64,
        /// Resulting name.
        name: String,
        /// Resulting parent.
        parent_id: Option<i64>,
    },
    /// Delete departments in the given order.
    Delete {
        /// The department the command targeted.
        department_id: i64,
        /// Descendants deepest first, then the target.
        order: Vec<i64>,
    },
}

/// A validated vote ready to be inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewVote {
    /// The organization.
    pub organization_id: i64,
    /// Optional department scope.
    pub department_id: Option<i64>,
    /// Trimmed name.
    pub name: String,
    /// Description.
    pub description: String,
    /// Validated ballot window.
    pub schedule: VoteSchedule,
    /// Anonymity flag.
    pub is_anonymous: bool,
    /// Declared vote kind.
    pub vote_type: VoteType,
    /// Candidate user ids, in display order.
    pub candidate_user_ids: Vec<i64>,
    /// Creation time.
    pub created_at: OffsetDateTime,
}

/// A validated revision of an existing vote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoteRevision {
    /// The vote.
    pub vote_id: i64,
    /// Resulting name.
    pub name: String,
    /// Resulting description.
    pub description: String,
    /// Resulting department scope.
    pub department_id: Option<i64>,
    /// Resulting schedule.
    pub schedule: VoteSchedule,
    /// Resulting anonymity flag.
    pub is_anonymous: bool,
    /// Resulting vote kind.
    pub vote_type: VoteType,
    /// Users to register as new candidates, in display order.
    pub candidates_to_add: Vec<i64>,
    /// Candidate rows to delete. None of them has ballots.
    pub candidates_to_remove: Vec<VoteCandidate>,
}

/// A ballot that passed admission and may be recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BallotAdmission {
    /// The vote.
    pub vote_id: i64,
    /// The chosen `VoteCandidate` id.
    pub candidate_id: i64,
    /// The voter.
    pub voter_id: i64,
    /// Statistics payload to store.
    pub statistics: BallotStatistics,
}
