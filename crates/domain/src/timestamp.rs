// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use time::format_description::well_known::Rfc3339;
use time::{OffsetDateTime, UtcOffset};

use crate::error::DomainError;

/// Parses an RFC 3339 timestamp and normalizes it to UTC.
///
/// # Errors
///
/// Returns `DomainError::InvalidTimestamp` if the value is not RFC 3339.
pub fn parse_timestamp(value: &str) -> Result<OffsetDateTime, DomainError> {
    OffsetDateTime::parse(value, &Rfc3339)
        .map(|parsed| parsed.to_offset(UtcOffset::UTC))
        .map_err(|e| DomainError::InvalidTimestamp {
            value: value.to_string(),
            reason: e.to_string(),
        })
}

/// Formats a timestamp as RFC 3339 in UTC.
///
/// Stored timestamps always go through this function so that their text
/// order matches their chronological order.
///
/// # Errors
///
/// Returns `DomainError::InvalidTimestamp` if the value cannot be
/// represented in RFC 3339.
pub fn format_timestamp(value: OffsetDateTime) -> Result<String, DomainError> {
    value
        .to_offset(UtcOffset::UTC)
        .format(&Rfc3339)
        .map_err(|e| DomainError::InvalidTimestamp {
            value: value.to_string(),
            reason: e.to_string(),
        })
}
