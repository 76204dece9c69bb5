// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Vote schedule and the time-derived vote state machine.
//!
//! A vote has no stored status. Its state is a pure function of the
//! schedule and the current time:
//!
//! - `Pending` while `now < start`
//! - `Open` while `start <= now` and either no end is set or `now < end`
//! - `Closed` once `now >= end`

use time::OffsetDateTime;

use crate::error::DomainError;

/// The derived state of a vote at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VoteState {
    /// The ballot window has not started.
    Pending,
    /// Ballots are accepted.
    Open,
    /// The ballot window has ended.
    Closed,
}

impl VoteState {
    /// Returns the wire label for the state.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Open => "OPEN",
            Self::Closed => "CLOSED",
        }
    }
}

/// The ballot window of a vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoteSchedule {
    start: OffsetDateTime,
    end: Option<OffsetDateTime>,
}

impl VoteSchedule {
    /// Creates a schedule.
    ///
    /// # Arguments
    ///
    /// * `start` - When ballots start being accepted
    /// * `end` - When ballots stop being accepted, `None` for open-ended
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidSchedule` if `end` is not after `start`.
    pub fn new(start: OffsetDateTime, end: Option<OffsetDateTime>) -> Result<Self, DomainError> {
        if let Some(end) = end
            && end <= start
        {
            return Err(DomainError::InvalidSchedule { start, end });
        }
        Ok(Self { start, end })
    }

    /// Returns the start of the window.
    #[must_use]
    pub const fn start(&self) -> OffsetDateTime {
        self.start
    }

    /// Returns the end of the window, if any.
    #[must_use]
    pub const fn end(&self) -> Option<OffsetDateTime> {
        self.end
    }

    /// Returns the state of the vote at `now`.
    #[must_use]
    pub fn state_at(&self, now: OffsetDateTime) -> VoteState {
        if now < self.start {
            VoteState::Pending
        } else if self.end.is_some_and(|end| now >= end) {
            VoteState::Closed
        } else {
            VoteState::Open
        }
    }

    /// Returns whether ballots are accepted at `now`.
    #[must_use]
    pub fn is_active_at(&self, now: OffsetDateTime) -> bool {
        self.state_at(now) == VoteState::Open
    }
}
