// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use std::collections::HashSet;

use orgvote_domain::{
    BallotStatistics, DomainError, VoteCandidate, VoteSchedule, VoteState, format_timestamp,
    validate_distinct_candidates, validate_name,
};
use time::OffsetDateTime;
use tracing::debug;

use crate::command::{DepartmentCommand, VoteChanges, VoteDraft};
use crate::error::CoreError;
use crate::state::{
    BallotAdmission, DepartmentTransition, NewVote, OrganizationContext, VoteRevision,
    VoteSnapshot,
};

/// Applies a department command to an organization's tree.
///
/// # Arguments
///
/// * `context` - The organization's members and department tree
/// * `command` - The command to apply
///
/// # Returns
///
/// The write to perform.
///
/// # Errors
///
/// Returns an error if:
/// - A name is blank
/// - The target department is not in the organization
/// - The requested parent is not in the organization
/// - The move would place a department under itself or a descendant
pub fn apply_department_command(
    context: &OrganizationContext,
    command: DepartmentCommand,
) -> Result<DepartmentTransition, CoreError> {
    let tree = &context.departments;

    match command {
        DepartmentCommand::Create { name, parent_id } => {
            validate_name(&name)?;
            if let Some(parent_id) = parent_id {
                ensure_parent_in_organization(context, parent_id)?;
            }
            Ok(DepartmentTransition::Create {
                organization_id: context.organization_id,
                name: name.trim().to_string(),
                parent_id,
            })
        }
        DepartmentCommand::Update {
            department_id,
            name,
            parent,
        } => {
            let existing = tree
                .get(department_id)
                .ok_or(DomainError::DepartmentNotFound(department_id))?;

            let name: String = match name {
                Some(name) => {
                    validate_name(&name)?;
                    name.trim().to_string()
                }
                None => existing.name.clone(),
            };

            let parent_id: Option<i64> = parent.resolve(existing.parent_id);
            if let Some(parent_id) = parent_id {
                ensure_parent_in_organization(context, parent_id)?;
                if tree.would_create_cycle(department_id, parent_id) {
                    return Err(CoreError::DomainViolation(DomainError::DepartmentCycle {
                        department_id,
                        parent_id,
                    }));
                }
            }

            Ok(DepartmentTransition::Update {
                department_id,
                name,
                parent_id,
            })
        }
        DepartmentCommand::Delete { department_id } => {
            let order: Vec<i64> = tree.deletion_order(department_id)?;
            debug!(department_id, count = order.len(), "Planned department deletion");
            Ok(DepartmentTransition::Delete {
                department_id,
                order,
            })
        }
    }
}

fn ensure_parent_in_organization(
    context: &OrganizationContext,
    parent_id: i64,
) -> Result<(), CoreError> {
    if context.departments.contains(parent_id) {
        Ok(())
    } else {
        Err(CoreError::DomainViolation(
            DomainError::ParentOutsideOrganization {
                parent_id,
                organization_id: context.organization_id,
            },
        ))
    }
}

fn ensure_department_scope(
    context: &OrganizationContext,
    department_id: Option<i64>,
) -> Result<(), CoreError> {
    match department_id {
        Some(department_id) if !context.departments.contains(department_id) => {
            Err(CoreError::DepartmentOutsideOrganization {
                department_id,
                organization_id: context.organization_id,
            })
        }
        _ => Ok(()),
    }
}

fn ensure_candidates_are_members(
    context: &OrganizationContext,
    user_ids: &[i64],
) -> Result<(), CoreError> {
    if let Some(user_id) = user_ids.iter().find(|id| !context.is_member(**id)) {
        return Err(CoreError::CandidateNotMember {
            user_id: *user_id,
            organization_id: context.organization_id,
        });
    }
    Ok(())
}

/// Validates a vote definition and fills in its defaults.
///
/// The start time defaults to `now` and a missing end time makes the vote
/// open-ended.
///
/// # Errors
///
/// Returns an error if:
/// - The name is blank
/// - The candidate list is empty, repeats a user, or names a non-member
/// - The department scope is outside the organization
/// - The end time is not after the start time
pub fn plan_vote(
    context: &OrganizationContext,
    draft: VoteDraft,
    now: OffsetDateTime,
) -> Result<NewVote, CoreError> {
    validate_name(&draft.name)?;
    validate_distinct_candidates(&draft.candidate_user_ids)?;
    ensure_candidates_are_members(context, &draft.candidate_user_ids)?;
    ensure_department_scope(context, draft.department_id)?;

    let start: OffsetDateTime = draft.start.unwrap_or(now);
    let schedule: VoteSchedule = VoteSchedule::new(start, draft.end)?;

    Ok(NewVote {
        organization_id: context.organization_id,
        department_id: draft.department_id,
        name: draft.name.trim().to_string(),
        description: draft.description,
        schedule,
        is_anonymous: draft.is_anonymous,
        vote_type: draft.vote_type,
        candidate_user_ids: draft.candidate_user_ids,
        created_at: now,
    })
}

/// Validates a partial vote update against the stored vote.
///
/// A replacement candidate list is diffed against the registered
/// candidates. Candidates present in both keep their rows, so ballots
/// referencing them stay valid. Removing a candidate that already has
/// ballots is rejected.
///
/// # Errors
///
/// Returns an error for the same reasons as `plan_vote`,
/// `CoreError::CandidateHasBallots` if a removed candidate has ballots, and
/// `CoreError::AnonymityLocked` if `is_anonymous` changes after ballots
/// were recorded.
pub fn revise_vote(
    context: &OrganizationContext,
    snapshot: &VoteSnapshot,
    changes: VoteChanges,
) -> Result<VoteRevision, CoreError> {
    let vote = &snapshot.vote;

    let name: String = match changes.name {
        Some(name) => {
            validate_name(&name)?;
            name.trim().to_string()
        }
        None => vote.name.clone(),
    };

    let department_id: Option<i64> = changes.department.resolve(vote.department_id);
    ensure_department_scope(context, department_id)?;

    let start: OffsetDateTime = changes.start.unwrap_or_else(|| vote.schedule.start());
    let end: Option<OffsetDateTime> = changes.end.resolve(vote.schedule.end());
    let schedule: VoteSchedule = VoteSchedule::new(start, end)?;

    let is_anonymous: bool = changes.is_anonymous.unwrap_or(vote.is_anonymous);
    if is_anonymous != vote.is_anonymous && !snapshot.ballots.is_empty() {
        debug!(vote_id = vote.vote_id, "Rejected anonymity change on a vote with ballots");
        return Err(CoreError::AnonymityLocked {
            vote_id: vote.vote_id,
            ballots: snapshot.ballots.len(),
        });
    }

    let (candidates_to_add, candidates_to_remove) = match changes.candidate_user_ids {
        Some(user_ids) => diff_candidates(context, snapshot, &user_ids)?,
        None => (Vec::new(), Vec::new()),
    };

    Ok(VoteRevision {
        vote_id: vote.vote_id,
        name,
        description: changes
            .description
            .unwrap_or_else(|| vote.description.clone()),
        department_id,
        schedule,
        is_anonymous,
        vote_type: changes.vote_type.unwrap_or(vote.vote_type),
        candidates_to_add,
        candidates_to_remove,
    })
}

fn diff_candidates(
    context: &OrganizationContext,
    snapshot: &VoteSnapshot,
    user_ids: &[i64],
) -> Result<(Vec<i64>, Vec<VoteCandidate>), CoreError> {
    validate_distinct_candidates(user_ids)?;

    let requested: HashSet<i64> = user_ids.iter().copied().collect();
    let existing: HashSet<i64> = snapshot.candidates.iter().map(|c| c.user_id).collect();

    let mut to_remove: Vec<VoteCandidate> = Vec::new();
    for candidate in &snapshot.candidates {
        if requested.contains(&candidate.user_id) {
            continue;
        }
        let ballots: u32 = snapshot.ballots_for(candidate.candidate_id);
        if ballots > 0 {
            return Err(CoreError::CandidateHasBallots {
                vote_id: snapshot.vote.vote_id,
                user_id: candidate.user_id,
                ballots,
            });
        }
        to_remove.push(*candidate);
    }

    let to_add: Vec<i64> = user_ids
        .iter()
        .copied()
        .filter(|id| !existing.contains(id))
        .collect();
    ensure_candidates_are_members(context, &to_add)?;

    Ok((to_add, to_remove))
}

/// Decides whether a ballot may be recorded.
///
/// Checks run in order: the vote must be open at `now`, the candidate must
/// be registered in the vote, and the voter must not have a ballot yet.
/// The function is pure; callers run it once before their transaction for
/// a fast rejection and again inside it on freshly loaded state.
///
/// # Arguments
///
/// * `snapshot` - The vote with candidates and ballots
/// * `voter_id` - The voter
/// * `candidate_id` - The chosen `VoteCandidate` id
/// * `now` - The submission time
///
/// # Errors
///
/// Returns `VoteClosed`, `InvalidCandidate`, or `AlreadyVoted`.
pub fn admit_ballot(
    snapshot: &VoteSnapshot,
    voter_id: i64,
    candidate_id: i64,
    now: OffsetDateTime,
) -> Result<BallotAdmission, CoreError> {
    let vote_id: i64 = snapshot.vote.vote_id;

    let state: VoteState = snapshot.vote.schedule.state_at(now);
    if state != VoteState::Open {
        return Err(CoreError::VoteClosed { vote_id, state });
    }

    if snapshot.candidate(candidate_id).is_none() {
        return Err(CoreError::InvalidCandidate {
            vote_id,
            candidate_id,
        });
    }

    if snapshot.has_voted(voter_id) {
        return Err(CoreError::AlreadyVoted { vote_id, voter_id });
    }

    let statistics: BallotStatistics = BallotStatistics {
        voted_at: format_timestamp(now)?,
        voter_id: if snapshot.vote.is_anonymous {
            None
        } else {
            Some(voter_id)
        },
    };

    Ok(BallotAdmission {
        vote_id,
        candidate_id,
        voter_id,
        statistics,
    })
}
