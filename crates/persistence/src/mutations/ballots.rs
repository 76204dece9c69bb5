// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Ballot submission.
//!
//! A ballot is admitted against a snapshot loaded inside an immediate
//! transaction, which takes the database write lock before the snapshot is
//! read. Two submissions for the same voter are therefore serialized and
//! the second one sees the first ballot. The unique `(vote_id, user_id)`
//! index backs this up at the storage level.

use diesel::prelude::*;
use diesel::SqliteConnection;
use orgvote::{BallotAdmission, CoreError, VoteSnapshot, admit_ballot};
use orgvote_domain::{Ballot, Tally, format_timestamp};
use time::OffsetDateTime;
use tracing::{info, warn};

use crate::backend::PersistenceBackend;
use crate::diesel_schema::{users, vote_results};
use crate::error::PersistenceError;
use crate::queries;

/// Records a ballot and recomputes the winner flags of the vote.
///
/// # Arguments
///
/// * `conn` - The database connection
/// * `vote_id` - The vote
/// * `voter_id` - The voter
/// * `candidate_id` - The chosen `VoteCandidate` id
/// * `now` - Submission time
///
/// # Errors
///
/// Returns `PersistenceError::NotFound` if the vote does not exist, or
/// `PersistenceError::TransitionRejected` carrying `VoteClosed`,
/// `InvalidCandidate`, or `AlreadyVoted`. Nothing is written on error.
pub fn submit_ballot(
    conn: &mut SqliteConnection,
    vote_id: i64,
    voter_id: i64,
    candidate_id: i64,
    now: OffsetDateTime,
) -> Result<Ballot, PersistenceError> {
    let created_at: String = format_timestamp(now)?;

    conn.immediate_transaction::<_, PersistenceError, _>(|conn| {
        let snapshot: VoteSnapshot = queries::votes::get_vote_snapshot(conn, vote_id)?
            .ok_or_else(|| PersistenceError::NotFound(format!("Vote {vote_id}")))?;

        let admission: BallotAdmission = admit_ballot(&snapshot, voter_id, candidate_id, now)?;
        let statistics_json: String = serde_json::to_string(&admission.statistics)?;

        let inserted = diesel::insert_into(vote_results::table)
            .values((
                vote_results::vote_id.eq(admission.vote_id),
                vote_results::candidate_id.eq(admission.candidate_id),
                vote_results::user_id.eq(admission.voter_id),
                vote_results::vote_count.eq(1),
                vote_results::is_winner.eq(0),
                vote_results::statistics_json.eq(&statistics_json),
                vote_results::created_at.eq(&created_at),
            ))
            .execute(conn);

        match inserted {
            Ok(_) => {}
            Err(diesel::result::Error::DatabaseError(
                diesel::result::DatabaseErrorKind::UniqueViolation,
                _,
            )) => {
                warn!(vote_id, voter_id, "Duplicate ballot rejected by unique index");
                return Err(PersistenceError::TransitionRejected(
                    CoreError::AlreadyVoted { vote_id, voter_id },
                ));
            }
            Err(e) => return Err(e.into()),
        }

        let ballot_id: i64 = conn.get_last_insert_rowid()?;

        diesel::update(users::table.filter(users::user_id.eq(voter_id)))
            .set(users::vote_participation_count.eq(users::vote_participation_count + 1))
            .execute(conn)?;

        let tally: Tally = recompute_winners(conn, vote_id)?;

        info!(
            vote_id,
            ballot_id,
            candidate_id,
            total = tally.total_votes(),
            "Ballot recorded"
        );

        Ok(Ballot {
            ballot_id,
            vote_id,
            candidate_id: admission.candidate_id,
            voter_id,
            vote_count: 1,
            is_winner: tally.is_winner(admission.candidate_id),
            statistics: admission.statistics,
        })
    })
}

/// Rewrites the stored winner flags of a vote from its current ballots.
fn recompute_winners(conn: &mut SqliteConnection, vote_id: i64) -> Result<Tally, PersistenceError> {
    let snapshot: VoteSnapshot = queries::votes::get_vote_snapshot(conn, vote_id)?
        .ok_or_else(|| PersistenceError::NotFound(format!("Vote {vote_id}")))?;
    let tally: Tally = snapshot.tally();
    let winners: Vec<i64> = tally.winners();

    diesel::update(vote_results::table.filter(vote_results::vote_id.eq(vote_id)))
        .set(vote_results::is_winner.eq(0))
        .execute(conn)?;

    if !winners.is_empty() {
        diesel::update(
            vote_results::table
                .filter(vote_results::vote_id.eq(vote_id))
                .filter(vote_results::candidate_id.eq_any(&winners)),
        )
        .set(vote_results::is_winner.eq(1))
        .execute(conn)?;
    }

    Ok(tally)
}
