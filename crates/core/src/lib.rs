// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Pure state-transition logic for organization voting.
//!
//! Every function in this crate takes a snapshot of the relevant stored
//! state plus a command, and returns either a transition describing the
//! writes to perform or a `CoreError`. Nothing here touches storage or
//! reads the clock; callers pass `now` explicitly so that the same rules
//! can be evaluated before a transaction and again inside it.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::unwrap_used,
    clippy::expect_used
)]

mod apply;
mod command;
mod error;
mod state;

#[cfg(test)]
mod tests;

pub use apply::{admit_ballot, apply_department_command, plan_vote, revise_vote};
pub use command::{DepartmentCommand, FieldUpdate, VoteChanges, VoteDraft};
pub use error::CoreError;
pub use state::{
    BallotAdmission, DepartmentTransition, NewVote, OrganizationContext, VoteRevision,
    VoteSnapshot,
};
