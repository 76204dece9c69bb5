// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Vote, candidate, and slogan mutations.
//!
//! Every write re-runs the core planning functions on state loaded inside
//! the transaction, so a change that passed an earlier check against stale
//! state is still rejected.

use diesel::prelude::*;
use diesel::SqliteConnection;
use orgvote::{
    NewVote, OrganizationContext, VoteChanges, VoteDraft, VoteRevision, VoteSnapshot, plan_vote,
    revise_vote,
};
use orgvote_domain::format_timestamp;
use time::OffsetDateTime;
use tracing::{debug, info};

use crate::backend::PersistenceBackend;
use crate::diesel_schema::{slogans, vote_candidates, vote_results, votes};
use crate::error::PersistenceError;
use crate::queries;

/// Deletes votes and every row that depends on them.
///
/// Ballots go first because they reference candidate rows without a
/// cascade, then slogans, candidates, and the votes themselves.
pub(crate) fn delete_vote_rows(
    conn: &mut SqliteConnection,
    vote_ids: &[i64],
) -> Result<(), PersistenceError> {
    if vote_ids.is_empty() {
        return Ok(());
    }

    let ballots: usize =
        diesel::delete(vote_results::table.filter(vote_results::vote_id.eq_any(vote_ids)))
            .execute(conn)?;
    diesel::delete(slogans::table.filter(slogans::vote_id.eq_any(vote_ids))).execute(conn)?;
    diesel::delete(vote_candidates::table.filter(vote_candidates::vote_id.eq_any(vote_ids)))
        .execute(conn)?;
    diesel::delete(votes::table.filter(votes::vote_id.eq_any(vote_ids))).execute(conn)?;

    debug!(votes = vote_ids.len(), ballots, "Deleted vote rows");
    Ok(())
}

fn insert_candidates(
    conn: &mut SqliteConnection,
    vote_id: i64,
    user_ids: &[i64],
) -> Result<(), PersistenceError> {
    for user_id in user_ids {
        diesel::insert_into(vote_candidates::table)
            .values((
                vote_candidates::vote_id.eq(vote_id),
                vote_candidates::user_id.eq(*user_id),
            ))
            .execute(conn)?;
    }
    Ok(())
}

fn encode_end(end: Option<OffsetDateTime>) -> Result<Option<String>, PersistenceError> {
    Ok(end.map(format_timestamp).transpose()?)
}

/// Creates a vote together with its candidates.
///
/// # Arguments
///
/// * `conn` - The database connection
/// * `organization_id` - The owning organization
/// * `draft` - The requested vote
/// * `now` - Creation time, also the default start
///
/// # Errors
///
/// Returns `PersistenceError::TransitionRejected` if the draft is invalid
/// for the organization, or `PersistenceError::NotFound` if the
/// organization does not exist.
pub fn create_vote(
    conn: &mut SqliteConnection,
    organization_id: i64,
    draft: VoteDraft,
    now: OffsetDateTime,
) -> Result<i64, PersistenceError> {
    conn.transaction::<_, PersistenceError, _>(|conn| {
        let context: OrganizationContext =
            queries::organizations::load_organization_context(conn, organization_id)?;
        let new_vote: NewVote = plan_vote(&context, draft, now)?;

        let start_time: String = format_timestamp(new_vote.schedule.start())?;
        let end_time: Option<String> = encode_end(new_vote.schedule.end())?;
        let created_at: String = format_timestamp(new_vote.created_at)?;

        diesel::insert_into(votes::table)
            .values((
                votes::organization_id.eq(new_vote.organization_id),
                votes::department_id.eq(new_vote.department_id),
                votes::name.eq(&new_vote.name),
                votes::description.eq(&new_vote.description),
                votes::start_time.eq(&start_time),
                votes::end_time.eq(end_time.as_deref()),
                votes::is_anonymous.eq(i32::from(new_vote.is_anonymous)),
                votes::vote_type.eq(new_vote.vote_type.as_str()),
                votes::created_at.eq(&created_at),
            ))
            .execute(conn)?;

        let vote_id: i64 = conn.get_last_insert_rowid()?;

        insert_candidates(conn, vote_id, &new_vote.candidate_user_ids)?;

        info!(
            vote_id,
            organization_id,
            candidates = new_vote.candidate_user_ids.len(),
            "Vote created"
        );
        Ok(vote_id)
    })
}

/// Applies a partial update to a vote.
///
/// A supplied candidate list is diffed against the registered one: kept
/// candidates retain their ids, new ones are inserted, and removed ones
/// are deleted only if nobody voted for them.
///
/// # Errors
///
/// Returns `PersistenceError::NotFound` if the vote does not exist, or
/// `PersistenceError::TransitionRejected` if the changes are invalid.
pub fn update_vote(
    conn: &mut SqliteConnection,
    vote_id: i64,
    changes: VoteChanges,
) -> Result<(), PersistenceError> {
    conn.immediate_transaction::<_, PersistenceError, _>(|conn| {
        let snapshot: VoteSnapshot = queries::votes::get_vote_snapshot(conn, vote_id)?
            .ok_or_else(|| PersistenceError::NotFound(format!("Vote {vote_id}")))?;
        let context: OrganizationContext = queries::organizations::load_organization_context(
            conn,
            snapshot.vote.organization_id,
        )?;
        let revision: VoteRevision = revise_vote(&context, &snapshot, changes)?;

        let start_time: String = format_timestamp(revision.schedule.start())?;
        let end_time: Option<String> = encode_end(revision.schedule.end())?;

        diesel::update(votes::table.filter(votes::vote_id.eq(vote_id)))
            .set((
                votes::name.eq(&revision.name),
                votes::description.eq(&revision.description),
                votes::department_id.eq(revision.department_id),
                votes::start_time.eq(&start_time),
                votes::end_time.eq(end_time.as_deref()),
                votes::is_anonymous.eq(i32::from(revision.is_anonymous)),
                votes::vote_type.eq(revision.vote_type.as_str()),
            ))
            .execute(conn)?;

        let removed: Vec<i64> = revision
            .candidates_to_remove
            .iter()
            .map(|c| c.candidate_id)
            .collect();
        let removed_users: Vec<i64> = revision
            .candidates_to_remove
            .iter()
            .map(|c| c.user_id)
            .collect();

        if !removed.is_empty() {
            diesel::delete(
                slogans::table
                    .filter(slogans::vote_id.eq(vote_id))
                    .filter(slogans::user_id.eq_any(&removed_users)),
            )
            .execute(conn)?;
            diesel::delete(
                vote_candidates::table.filter(vote_candidates::candidate_id.eq_any(&removed)),
            )
            .execute(conn)?;
        }

        insert_candidates(conn, vote_id, &revision.candidates_to_add)?;

        info!(
            vote_id,
            added = revision.candidates_to_add.len(),
            removed = removed.len(),
            "Vote updated"
        );
        Ok(())
    })
}

/// Deletes a vote with its ballots, slogans, and candidates.
///
/// # Errors
///
/// Returns `PersistenceError::NotFound` if the vote does not exist.
pub fn delete_vote(conn: &mut SqliteConnection, vote_id: i64) -> Result<(), PersistenceError> {
    conn.transaction::<_, PersistenceError, _>(|conn| {
        if queries::votes::get_vote(conn, vote_id)?.is_none() {
            return Err(PersistenceError::NotFound(format!("Vote {vote_id}")));
        }

        delete_vote_rows(conn, &[vote_id])?;

        info!(vote_id, "Vote deleted");
        Ok(())
    })
}

/// Sets, replaces, or clears a candidate's slogan.
///
/// Empty or whitespace-only text clears the slogan.
///
/// # Errors
///
/// Returns an error if the database write fails.
pub fn set_slogan(
    conn: &mut SqliteConnection,
    vote_id: i64,
    user_id: i64,
    text: &str,
) -> Result<(), PersistenceError> {
    let text: &str = text.trim();

    conn.transaction::<_, PersistenceError, _>(|conn| {
        diesel::delete(
            slogans::table
                .filter(slogans::vote_id.eq(vote_id))
                .filter(slogans::user_id.eq(user_id)),
        )
        .execute(conn)?;

        if text.is_empty() {
            debug!(vote_id, user_id, "Slogan cleared");
            return Ok(());
        }

        diesel::insert_into(slogans::table)
            .values((
                slogans::vote_id.eq(vote_id),
                slogans::user_id.eq(user_id),
                slogans::slogan.eq(text),
            ))
            .execute(conn)?;

        debug!(vote_id, user_id, "Slogan set");
        Ok(())
    })
}
