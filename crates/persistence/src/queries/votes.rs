// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Vote, candidate, ballot, and slogan queries.

use std::collections::HashMap;

use diesel::prelude::*;
use diesel::SqliteConnection;
use num_traits::ToPrimitive;
use orgvote::VoteSnapshot;
use orgvote_domain::{
    Ballot, BallotStatistics, Slogan, Vote, VoteCandidate, VoteSchedule, VoteType,
};
use tracing::debug;

use super::{decode_flag, decode_timestamp};
use crate::diesel_schema::{slogans, vote_candidates, vote_results, votes};
use crate::error::PersistenceError;

/// Diesel Queryable struct for vote rows.
#[derive(Queryable, Selectable)]
#[diesel(table_name = votes)]
struct VoteRow {
    vote_id: i64,
    organization_id: i64,
    department_id: Option<i64>,
    name: String,
    description: String,
    start_time: String,
    end_time: Option<String>,
    is_anonymous: i32,
    vote_type: String,
    created_at: String,
}

impl TryFrom<VoteRow> for Vote {
    type Error = PersistenceError;

    fn try_from(row: VoteRow) -> Result<Self, Self::Error> {
        let start = decode_timestamp(&row.start_time)?;
        let end = row.end_time.as_deref().map(decode_timestamp).transpose()?;
        let schedule = VoteSchedule::new(start, end)
            .map_err(|e| PersistenceError::CorruptRecord(e.to_string()))?;
        let vote_type = VoteType::parse(&row.vote_type)
            .map_err(|e| PersistenceError::CorruptRecord(e.to_string()))?;

        Ok(Self {
            vote_id: row.vote_id,
            organization_id: row.organization_id,
            department_id: row.department_id,
            name: row.name,
            description: row.description,
            schedule,
            is_anonymous: decode_flag(row.is_anonymous),
            vote_type,
            created_at: decode_timestamp(&row.created_at)?,
        })
    }
}

#[derive(Queryable, Selectable)]
#[diesel(table_name = vote_candidates)]
struct CandidateRow {
    candidate_id: i64,
    vote_id: i64,
    user_id: i64,
}

impl From<CandidateRow> for VoteCandidate {
    fn from(row: CandidateRow) -> Self {
        Self {
            candidate_id: row.candidate_id,
            vote_id: row.vote_id,
            user_id: row.user_id,
        }
    }
}

/// Diesel Queryable struct for ballot rows.
///
/// `user_id` is the voter, not the candidate.
#[derive(Queryable, Selectable)]
#[diesel(table_name = vote_results)]
struct ResultRow {
    result_id: i64,
    vote_id: i64,
    candidate_id: i64,
    user_id: i64,
    vote_count: i32,
    is_winner: i32,
    statistics_json: String,
}

impl TryFrom<ResultRow> for Ballot {
    type Error = PersistenceError;

    fn try_from(row: ResultRow) -> Result<Self, Self::Error> {
        let statistics: BallotStatistics = serde_json::from_str(&row.statistics_json)?;
        Ok(Self {
            ballot_id: row.result_id,
            vote_id: row.vote_id,
            candidate_id: row.candidate_id,
            voter_id: row.user_id,
            vote_count: row.vote_count.to_u32().unwrap_or(0),
            is_winner: decode_flag(row.is_winner),
            statistics,
        })
    }
}

#[derive(Queryable, Selectable)]
#[diesel(table_name = slogans)]
struct SloganRow {
    vote_id: i64,
    user_id: i64,
    slogan: String,
}

/// Retrieves a vote by ID.
///
/// # Errors
///
/// Returns an error if the database query fails or the row is corrupt.
pub fn get_vote(conn: &mut SqliteConnection, vote_id: i64) -> Result<Option<Vote>, PersistenceError> {
    let row: Option<VoteRow> = votes::table
        .filter(votes::vote_id.eq(vote_id))
        .select(VoteRow::as_select())
        .first(conn)
        .optional()?;

    row.map(Vote::try_from).transpose()
}

/// Lists the candidates of a vote in registration order.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn list_candidates(
    conn: &mut SqliteConnection,
    vote_id: i64,
) -> Result<Vec<VoteCandidate>, PersistenceError> {
    let rows: Vec<CandidateRow> = vote_candidates::table
        .filter(vote_candidates::vote_id.eq(vote_id))
        .order(vote_candidates::candidate_id.asc())
        .select(CandidateRow::as_select())
        .load(conn)?;

    Ok(rows.into_iter().map(VoteCandidate::from).collect())
}

/// Lists the ballots recorded for a vote in submission order.
///
/// # Errors
///
/// Returns an error if the database query fails or a statistics payload
/// cannot be decoded.
pub fn list_ballots(conn: &mut SqliteConnection, vote_id: i64) -> Result<Vec<Ballot>, PersistenceError> {
    let rows: Vec<ResultRow> = vote_results::table
        .filter(vote_results::vote_id.eq(vote_id))
        .order(vote_results::result_id.asc())
        .select(ResultRow::as_select())
        .load(conn)?;

    rows.into_iter().map(Ballot::try_from).collect()
}

/// Loads a vote with its candidates and ballots.
///
/// # Errors
///
/// Returns an error if the database query fails or a row is corrupt.
/// Returns `Ok(None)` if the vote does not exist.
pub fn get_vote_snapshot(
    conn: &mut SqliteConnection,
    vote_id: i64,
) -> Result<Option<VoteSnapshot>, PersistenceError> {
    let Some(vote) = get_vote(conn, vote_id)? else {
        return Ok(None);
    };

    let candidates: Vec<VoteCandidate> = list_candidates(conn, vote_id)?;
    let ballots: Vec<Ballot> = list_ballots(conn, vote_id)?;

    debug!(
        vote_id,
        candidates = candidates.len(),
        ballots = ballots.len(),
        "Loaded vote snapshot"
    );

    Ok(Some(VoteSnapshot {
        vote,
        candidates,
        ballots,
    }))
}

/// Lists every vote of an organization with candidates and ballots,
/// newest first.
///
/// # Errors
///
/// Returns an error if the database query fails or a row is corrupt.
pub fn list_vote_snapshots(
    conn: &mut SqliteConnection,
    organization_id: i64,
) -> Result<Vec<VoteSnapshot>, PersistenceError> {
    let vote_rows: Vec<VoteRow> = votes::table
        .filter(votes::organization_id.eq(organization_id))
        .order((votes::created_at.desc(), votes::vote_id.desc()))
        .select(VoteRow::as_select())
        .load(conn)?;

    let vote_ids: Vec<i64> = vote_rows.iter().map(|v| v.vote_id).collect();

    let candidate_rows: Vec<CandidateRow> = vote_candidates::table
        .filter(vote_candidates::vote_id.eq_any(&vote_ids))
        .order(vote_candidates::candidate_id.asc())
        .select(CandidateRow::as_select())
        .load(conn)?;

    let result_rows: Vec<ResultRow> = vote_results::table
        .filter(vote_results::vote_id.eq_any(&vote_ids))
        .order(vote_results::result_id.asc())
        .select(ResultRow::as_select())
        .load(conn)?;

    let mut candidates: HashMap<i64, Vec<VoteCandidate>> = HashMap::new();
    for row in candidate_rows {
        candidates
            .entry(row.vote_id)
            .or_default()
            .push(VoteCandidate::from(row));
    }

    let mut ballots: HashMap<i64, Vec<Ballot>> = HashMap::new();
    for row in result_rows {
        let ballot: Ballot = Ballot::try_from(row)?;
        ballots.entry(ballot.vote_id).or_default().push(ballot);
    }

    vote_rows
        .into_iter()
        .map(|row| {
            let vote: Vote = Vote::try_from(row)?;
            Ok(VoteSnapshot {
                candidates: candidates.remove(&vote.vote_id).unwrap_or_default(),
                ballots: ballots.remove(&vote.vote_id).unwrap_or_default(),
                vote,
            })
        })
        .collect()
}

/// Lists the IDs of votes scoped to any of the given departments.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn list_vote_ids_for_departments(
    conn: &mut SqliteConnection,
    department_ids: &[i64],
) -> Result<Vec<i64>, PersistenceError> {
    if department_ids.is_empty() {
        return Ok(Vec::new());
    }

    Ok(votes::table
        .filter(votes::department_id.eq_any(department_ids))
        .select(votes::vote_id)
        .load(conn)?)
}

/// Lists the slogans recorded for a vote.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn list_slogans(conn: &mut SqliteConnection, vote_id: i64) -> Result<Vec<Slogan>, PersistenceError> {
    let rows: Vec<SloganRow> = slogans::table
        .filter(slogans::vote_id.eq(vote_id))
        .order(slogans::user_id.asc())
        .select(SloganRow::as_select())
        .load(conn)?;

    Ok(rows
        .into_iter()
        .map(|row| Slogan {
            vote_id: row.vote_id,
            user_id: row.user_id,
            text: row.slogan,
        })
        .collect())
}
