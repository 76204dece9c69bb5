// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::{Tally, tally};

#[test]
fn test_no_ballots_means_no_winners() {
    let result: Tally = tally(&[10, 11], Vec::new());
    assert!(result.winners().is_empty());
    assert_eq!(result.total_votes(), 0);
    assert_eq!(result.max_votes(), 0);
}

#[test]
fn test_single_leader_wins() {
    let result: Tally = tally(&[10, 11], vec![(10, 1), (10, 1), (11, 1)]);
    assert_eq!(result.winners(), vec![10]);
    assert_eq!(result.votes_for(10), 2);
    assert_eq!(result.votes_for(11), 1);
    assert_eq!(result.total_votes(), 3);
}

#[test]
fn test_tie_produces_multiple_winners() {
    let result: Tally = tally(&[10, 11, 12], vec![(10, 1), (11, 1)]);
    assert_eq!(result.winners(), vec![10, 11]);
    assert!(!result.is_winner(12));
}

#[test]
fn test_counts_are_aggregated_per_candidate() {
    // Three single ballots for one candidate beat two for another even
    // though every ballot row carries the same count.
    let result: Tally = tally(&[1, 2], vec![(1, 1), (2, 1), (1, 1), (2, 1), (1, 1)]);
    assert_eq!(result.winners(), vec![1]);
    assert_eq!(result.max_votes(), 3);
}

#[test]
fn test_ballots_for_unknown_candidates_are_ignored() {
    let result: Tally = tally(&[1], vec![(1, 1), (99, 1), (99, 1)]);
    assert_eq!(result.winners(), vec![1]);
    assert_eq!(result.total_votes(), 1);
    assert_eq!(result.votes_for(99), 0);
}

#[test]
fn test_candidates_keep_input_order() {
    let result: Tally = tally(&[3, 1, 2], vec![(2, 1)]);
    let ids: Vec<i64> = result.candidates().iter().map(|c| c.candidate_id).collect();
    assert_eq!(ids, vec![3, 1, 2]);
}
