// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use std::collections::HashSet;

use orgvote_domain::{
    Ballot, BallotStatistics, Department, DepartmentTree, Vote, VoteCandidate, VoteSchedule,
    VoteType,
};
use time::{Duration, OffsetDateTime, macros::datetime};

use crate::{OrganizationContext, VoteDraft, VoteSnapshot};

pub const ORG_ID: i64 = 1;
pub const ALICE: i64 = 10;
pub const BOB: i64 = 11;
pub const CAROL: i64 = 12;
pub const DAVE: i64 = 13;
pub const OUTSIDER: i64 = 99;

pub const NOW: OffsetDateTime = datetime!(2026-05-04 12:00 UTC);

pub fn create_test_context() -> OrganizationContext {
    let departments: DepartmentTree = DepartmentTree::new(vec![
        Department {
            department_id: 100,
            organization_id: ORG_ID,
            name: String::from("Eng"),
            parent_id: None,
        },
        Department {
            department_id: 101,
            organization_id: ORG_ID,
            name: String::from("Backend"),
            parent_id: Some(100),
        },
        Department {
            department_id: 102,
            organization_id: ORG_ID,
            name: String::from("Storage"),
            parent_id: Some(101),
        },
    ]);
    let members: HashSet<i64> = [ALICE, BOB, CAROL, DAVE].into_iter().collect();
    OrganizationContext::new(ORG_ID, members, departments)
}

pub fn create_test_draft() -> VoteDraft {
    VoteDraft {
        name: String::from("Team Lead"),
        description: String::from("Pick the next team lead"),
        department_id: None,
        candidate_user_ids: vec![ALICE, BOB],
        start: None,
        end: None,
        is_anonymous: false,
        vote_type: VoteType::SingleChoice,
    }
}

/// A Team Lead vote open from one hour before `NOW` to one hour after,
/// with Alice as candidate 1 and Bob as candidate 2.
pub fn create_test_snapshot() -> VoteSnapshot {
    VoteSnapshot {
        vote: Vote {
            vote_id: 7,
            organization_id: ORG_ID,
            department_id: None,
            name: String::from("Team Lead"),
            description: String::new(),
            schedule: VoteSchedule::new(NOW - Duration::hours(1), Some(NOW + Duration::hours(1)))
                .unwrap(),
            is_anonymous: false,
            vote_type: VoteType::SingleChoice,
            created_at: NOW - Duration::days(1),
        },
        candidates: vec![
            VoteCandidate {
                candidate_id: 1,
                vote_id: 7,
                user_id: ALICE,
            },
            VoteCandidate {
                candidate_id: 2,
                vote_id: 7,
                user_id: BOB,
            },
        ],
        ballots: Vec::new(),
    }
}

pub fn ballot(ballot_id: i64, candidate_id: i64, voter_id: i64) -> Ballot {
    Ballot {
        ballot_id,
        vote_id: 7,
        candidate_id,
        voter_id,
        vote_count: 1,
        is_winner: false,
        statistics: BallotStatistics {
            voted_at: String::from("2026-05-04T11:30:00Z"),
            voter_id: Some(voter_id),
        },
    }
}
