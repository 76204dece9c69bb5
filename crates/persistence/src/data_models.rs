// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use orgvote_domain::{MemberRole, Organization, User};

/// An organization as seen by one of its members.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MembershipData {
    /// The organization.
    pub organization: Organization,
    /// The member's role; creators without a membership row read as `Admin`.
    pub role: MemberRole,
}

/// A non-admin member with their department assignments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoterData {
    /// The user.
    pub user: User,
    /// Departments of the organization the user belongs to.
    pub department_ids: Vec<i64>,
}

/// The stored effect of a department command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DepartmentOutcome {
    /// A department was inserted.
    Created(i64),
    /// A department was renamed or moved.
    Updated(i64),
    /// Departments were removed, deepest first.
    Deleted(Vec<i64>),
}

/// Outcome of adding a user to an organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MembershipChange {
    /// A new membership row was inserted.
    Added,
    /// The user was already a member.
    AlreadyMember,
}
