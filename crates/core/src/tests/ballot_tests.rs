// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use orgvote_domain::{VoteSchedule, VoteState};
use time::Duration;

use super::helpers::{CAROL, DAVE, NOW, ballot, create_test_snapshot};
use crate::{CoreError, admit_ballot};

#[test]
fn test_admit_ballot_in_open_window() {
    let snapshot = create_test_snapshot();
    let admission = admit_ballot(&snapshot, CAROL, 1, NOW).unwrap();

    assert_eq!(admission.vote_id, 7);
    assert_eq!(admission.candidate_id, 1);
    assert_eq!(admission.voter_id, CAROL);
    assert_eq!(admission.statistics.voter_id, Some(CAROL));
    assert_eq!(admission.statistics.voted_at, "2026-05-04T12:00:00Z");
}

#[test]
fn test_anonymous_vote_omits_voter_from_statistics() {
    let mut snapshot = create_test_snapshot();
    snapshot.vote.is_anonymous = true;

    let admission = admit_ballot(&snapshot, CAROL, 2, NOW).unwrap();
    assert_eq!(admission.statistics.voter_id, None);
    assert_eq!(admission.voter_id, CAROL);
}

#[test]
fn test_ballot_before_start_is_rejected() {
    let snapshot = create_test_snapshot();
    let before = snapshot.vote.schedule.start() - Duration::seconds(1);
    assert_eq!(
        admit_ballot(&snapshot, CAROL, 1, before),
        Err(CoreError::VoteClosed {
            vote_id: 7,
            state: VoteState::Pending
        })
    );
}

#[test]
fn test_ballot_at_end_is_rejected() {
    let snapshot = create_test_snapshot();
    let end = snapshot.vote.schedule.end().unwrap();
    assert_eq!(
        admit_ballot(&snapshot, CAROL, 1, end),
        Err(CoreError::VoteClosed {
            vote_id: 7,
            state: VoteState::Closed
        })
    );
}

#[test]
fn test_ballot_at_start_is_accepted() {
    let snapshot = create_test_snapshot();
    let start = snapshot.vote.schedule.start();
    assert!(admit_ballot(&snapshot, CAROL, 1, start).is_ok());
}

#[test]
fn test_open_ended_vote_accepts_late_ballots() {
    let mut snapshot = create_test_snapshot();
    snapshot.vote.schedule = VoteSchedule::new(NOW - Duration::hours(1), None).unwrap();
    assert!(admit_ballot(&snapshot, CAROL, 1, NOW + Duration::days(400)).is_ok());
}

#[test]
fn test_unknown_candidate_is_rejected() {
    let snapshot = create_test_snapshot();
    assert_eq!(
        admit_ballot(&snapshot, CAROL, 3, NOW),
        Err(CoreError::InvalidCandidate {
            vote_id: 7,
            candidate_id: 3
        })
    );
}

#[test]
fn test_closed_check_precedes_candidate_check() {
    let snapshot = create_test_snapshot();
    let late = NOW + Duration::hours(5);
    assert!(matches!(
        admit_ballot(&snapshot, CAROL, 3, late),
        Err(CoreError::VoteClosed { .. })
    ));
}

#[test]
fn test_second_ballot_is_rejected() {
    let mut snapshot = create_test_snapshot();
    snapshot.ballots.push(ballot(1, 1, CAROL));

    assert_eq!(
        admit_ballot(&snapshot, CAROL, 2, NOW),
        Err(CoreError::AlreadyVoted {
            vote_id: 7,
            voter_id: CAROL
        })
    );
    assert!(admit_ballot(&snapshot, DAVE, 2, NOW).is_ok());
}

#[test]
fn test_snapshot_tally_marks_tied_leaders() {
    let mut snapshot = create_test_snapshot();
    snapshot.ballots.push(ballot(1, 1, CAROL));
    snapshot.ballots.push(ballot(2, 2, DAVE));

    let tally = snapshot.tally();
    assert_eq!(tally.winners(), vec![1, 2]);
    assert_eq!(tally.total_votes(), 2);
}
