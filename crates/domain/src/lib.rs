// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Domain types and rules for organization voting.
//!
//! This crate has no storage or transport knowledge. It defines the
//! entities (organizations, departments, members, votes, ballots), the
//! validation rules applied to them, the department hierarchy walker,
//! the time-driven vote state machine, and the per-candidate tally.

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

mod department_tree;
mod error;
mod schedule;
mod tally;
mod timestamp;
mod types;
mod validation;

#[cfg(test)]
mod tests;

pub use department_tree::{DepartmentPath, DepartmentTree, PATH_SEPARATOR};
pub use error::DomainError;
pub use schedule::{VoteSchedule, VoteState};
pub use tally::{CandidateTally, Tally, tally};
pub use timestamp::{format_timestamp, parse_timestamp};
pub use types::{
    Ballot, BallotStatistics, Department, MemberRole, Membership, Organization, Slogan, User,
    Vote, VoteCandidate, VoteType,
};
pub use validation::{
    normalize_email, validate_distinct_candidates, validate_email, validate_name,
};
