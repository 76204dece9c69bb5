// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Query modules for persistence layer.
//!
//! This module contains all read-only queries.
//!
//! ## Module Organization
//!
//! - `users`: Users, organization memberships, department memberships
//! - `organizations`: Organizations and the organization context
//! - `departments`: Department rows
//! - `votes`: Votes, candidates, ballots, slogans
//!
//! Row structs stay private to their module and are converted to domain
//! types before leaving it. Conversion failures surface as
//! `PersistenceError::CorruptRecord`.

pub mod departments;
pub mod organizations;
pub mod users;
pub mod votes;

use orgvote_domain::parse_timestamp;
use time::OffsetDateTime;

use crate::error::PersistenceError;

/// Decodes a stored RFC 3339 timestamp.
pub(crate) fn decode_timestamp(value: &str) -> Result<OffsetDateTime, PersistenceError> {
    parse_timestamp(value).map_err(|e| PersistenceError::CorruptRecord(e.to_string()))
}

/// Decodes a stored integer flag.
pub(crate) const fn decode_flag(value: i32) -> bool {
    value != 0
}
