// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Mutation modules.
//!
//! This module contains all state-changing operations for the persistence layer.
//! Mutations use Diesel DSL, with `last_insert_rowid()` taken from the
//! `backend` module.
//!
//! ## Module Organization
//!
//! - `users`: Users, organization memberships, department memberships, voters
//! - `organizations`: Organization creation and deletion
//! - `departments`: Department commands
//! - `votes`: Vote creation, revision, deletion, slogans
//! - `ballots`: Ballot submission and winner recomputation
//!
//! Multi-row writes run in a single transaction. Writes whose validity
//! depends on rows another request may change concurrently (ballots,
//! department trees, candidate sets) use an immediate transaction so the
//! write lock is held while the state is re-validated.

pub mod ballots;
pub mod departments;
pub mod organizations;
pub mod users;
pub mod votes;
