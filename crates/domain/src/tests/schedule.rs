// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use time::{Duration, OffsetDateTime, macros::datetime};

use crate::{DomainError, VoteSchedule, VoteState};

const START: OffsetDateTime = datetime!(2026-03-01 09:00 UTC);
const END: OffsetDateTime = datetime!(2026-03-01 17:00 UTC);

#[test]
fn test_schedule_rejects_end_before_start() {
    let result = VoteSchedule::new(END, Some(START));
    assert_eq!(
        result,
        Err(DomainError::InvalidSchedule {
            start: END,
            end: START
        })
    );
}

#[test]
fn test_schedule_rejects_zero_length_window() {
    assert!(VoteSchedule::new(START, Some(START)).is_err());
}

#[test]
fn test_state_is_pending_before_start() {
    let schedule: VoteSchedule = VoteSchedule::new(START, Some(END)).unwrap();
    assert_eq!(
        schedule.state_at(START - Duration::seconds(1)),
        VoteState::Pending
    );
}

#[test]
fn test_state_is_open_from_start_inclusive() {
    let schedule: VoteSchedule = VoteSchedule::new(START, Some(END)).unwrap();
    assert_eq!(schedule.state_at(START), VoteState::Open);
    assert_eq!(
        schedule.state_at(END - Duration::seconds(1)),
        VoteState::Open
    );
}

#[test]
fn test_state_is_closed_at_end_exclusive() {
    let schedule: VoteSchedule = VoteSchedule::new(START, Some(END)).unwrap();
    assert_eq!(schedule.state_at(END), VoteState::Closed);
    assert!(!schedule.is_active_at(END));
}

#[test]
fn test_open_ended_schedule_never_closes() {
    let schedule: VoteSchedule = VoteSchedule::new(START, None).unwrap();
    assert!(schedule.is_active_at(START + Duration::days(3650)));
    assert!(!schedule.is_active_at(START - Duration::minutes(1)));
}

#[test]
fn test_state_labels() {
    assert_eq!(VoteState::Pending.as_str(), "PENDING");
    assert_eq!(VoteState::Open.as_str(), "OPEN");
    assert_eq!(VoteState::Closed.as_str(), "CLOSED");
}
