// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use orgvote_domain::VoteType;
use time::OffsetDateTime;

/// A partial update to an optional field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FieldUpdate<T> {
    /// Leave the stored value unchanged.
    #[default]
    Keep,
    /// Clear the stored value.
    Clear,
    /// Replace the stored value.
    Set(T),
}

impl<T: Copy> FieldUpdate<T> {
    /// Resolves the update against the current value.
    #[must_use]
    pub fn resolve(self, current: Option<T>) -> Option<T> {
        match self {
            Self::Keep => current,
            Self::Clear => None,
            Self::Set(value) => Some(value),
        }
    }
}

/// A command against an organization's department tree.
///
/// Commands are data only. They are applied against an
/// `OrganizationContext` with `apply_department_command`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DepartmentCommand {
    /// Create a department, optionally under a parent.
    Create {
        /// Display name.
        name: String,
        /// Parent department, `None` for a root.
        parent_id: Option<i64>,
    },
    /// Rename and/or move a department.
    Update {
        /// The department to change.
        department_id: i64,
        /// New name, if renaming.
        name: Option<String>,
        /// Parent change.
        parent: FieldUpdate<i64>,
    },
    /// Delete a department and every descendant.
    Delete {
        /// The department to remove.
        department_id: i64,
    },
}

/// The fields of a vote to be created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoteDraft {
    /// Display name.
    pub name: String,
    /// Free-text description.
    pub description: String,
    /// Optional department scope.
    pub department_id: Option<i64>,
    /// Candidate user ids, in display order.
    pub candidate_user_ids: Vec<i64>,
    /// Start of the window; defaults to `now`.
    pub start: Option<OffsetDateTime>,
    /// End of the window; `None` is open-ended.
    pub end: Option<OffsetDateTime>,
    /// Whether ballot statistics omit the voter.
    pub is_anonymous: bool,
    /// Declared vote kind.
    pub vote_type: VoteType,
}

/// A partial update of an existing vote.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VoteChanges {
    /// New name.
    pub name: Option<String>,
    /// New description.
    pub description: Option<String>,
    /// Department scope change.
    pub department: FieldUpdate<i64>,
    /// New start time.
    pub start: Option<OffsetDateTime>,
    /// End time change; `Clear` makes the vote open-ended.
    pub end: FieldUpdate<OffsetDateTime>,
    /// New anonymity flag.
    pub is_anonymous: Option<bool>,
    /// New vote kind.
    pub vote_type: Option<VoteType>,
    /// Replacement candidate list.
    pub candidate_user_ids: Option<Vec<i64>>,
}
