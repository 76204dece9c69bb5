// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Per-candidate ballot aggregation and winner selection.

use std::collections::HashMap;

/// Aggregated ballots for one candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CandidateTally {
    /// The `VoteCandidate` id.
    pub candidate_id: i64,
    /// Sum of ballot counts for this candidate.
    pub votes: u32,
    /// Whether this candidate has the maximum count.
    pub is_winner: bool,
}

/// The tally of one vote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tally {
    candidates: Vec<CandidateTally>,
    total_votes: u32,
    max_votes: u32,
}

impl Tally {
    /// Returns per-candidate results in candidate order.
    #[must_use]
    pub fn candidates(&self) -> &[CandidateTally] {
        &self.candidates
    }

    /// Returns the sum of all counted ballots.
    #[must_use]
    pub const fn total_votes(&self) -> u32 {
        self.total_votes
    }

    /// Returns the highest per-candidate count.
    #[must_use]
    pub const fn max_votes(&self) -> u32 {
        self.max_votes
    }

    /// Returns the ids of all winning candidates.
    #[must_use]
    pub fn winners(&self) -> Vec<i64> {
        self.candidates
            .iter()
            .filter(|c| c.is_winner)
            .map(|c| c.candidate_id)
            .collect()
    }

    /// Returns whether the given candidate is a winner.
    #[must_use]
    pub fn is_winner(&self, candidate_id: i64) -> bool {
        self.candidates
            .iter()
            .any(|c| c.candidate_id == candidate_id && c.is_winner)
    }

    /// Returns the count for the given candidate, zero if unknown.
    #[must_use]
    pub fn votes_for(&self, candidate_id: i64) -> u32 {
        self.candidates
            .iter()
            .find(|c| c.candidate_id == candidate_id)
            .map_or(0, |c| c.votes)
    }
}

/// Aggregates ballots per candidate and marks the leaders.
///
/// Ballots naming a candidate outside `candidate_ids` are ignored. Every
/// candidate that reaches the maximum count is a winner, so ties produce
/// several winners. With no counted ballots there are no winners.
///
/// # Arguments
///
/// * `candidate_ids` - The vote's candidate ids, in display order
/// * `ballots` - `(candidate_id, vote_count)` pairs
#[must_use]
pub fn tally<I>(candidate_ids: &[i64], ballots: I) -> Tally
where
    I: IntoIterator<Item = (i64, u32)>,
{
    let mut counts: HashMap<i64, u32> = candidate_ids.iter().map(|id| (*id, 0)).collect();

    for (candidate_id, vote_count) in ballots {
        if let Some(count) = counts.get_mut(&candidate_id) {
            *count = count.saturating_add(vote_count);
        }
    }

    let max_votes: u32 = counts.values().copied().max().unwrap_or(0);
    let total_votes: u32 = counts.values().fold(0_u32, |acc, v| acc.saturating_add(*v));

    let candidates: Vec<CandidateTally> = candidate_ids
        .iter()
        .map(|id| {
            let votes: u32 = counts.get(id).copied().unwrap_or(0);
            CandidateTally {
                candidate_id: *id,
                votes,
                is_winner: max_votes > 0 && votes == max_votes,
            }
        })
        .collect();

    Tally {
        candidates,
        total_votes,
        max_votes,
    }
}
