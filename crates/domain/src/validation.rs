// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use std::collections::HashSet;

use crate::error::DomainError;

/// Validates that a name is not blank.
///
/// # Errors
///
/// Returns `DomainError::InvalidName` if the name is empty or whitespace.
pub fn validate_name(name: &str) -> Result<(), DomainError> {
    if name.trim().is_empty() {
        return Err(DomainError::InvalidName(String::from(
            "Name cannot be empty",
        )));
    }
    Ok(())
}

/// Lowercases and trims an email address.
#[must_use]
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Validates the shape of an email address.
///
/// Accepts `local@domain.tld` with a non-empty local part, a single `@`,
/// no whitespace, and a domain containing an inner dot.
///
/// # Errors
///
/// Returns `DomainError::InvalidEmail` describing the first problem found.
pub fn validate_email(email: &str) -> Result<(), DomainError> {
    let email: &str = email.trim();

    if email.is_empty() {
        return Err(DomainError::InvalidEmail(String::from(
            "Email cannot be empty",
        )));
    }
    if email.chars().any(char::is_whitespace) {
        return Err(DomainError::InvalidEmail(String::from(
            "Email cannot contain whitespace",
        )));
    }

    let Some((local, domain)) = email.split_once('@') else {
        return Err(DomainError::InvalidEmail(String::from(
            "Email must contain '@'",
        )));
    };

    if local.is_empty() || domain.contains('@') {
        return Err(DomainError::InvalidEmail(String::from(
            "Email must have exactly one '@' with a local part before it",
        )));
    }

    let dotted_inside: bool = domain
        .find('.')
        .is_some_and(|pos| pos > 0 && pos + 1 < domain.len())
        && !domain.ends_with('.')
        && !domain.contains("..");

    if !dotted_inside {
        return Err(DomainError::InvalidEmail(format!(
            "Email domain '{domain}' is not valid"
        )));
    }

    Ok(())
}

/// Validates a vote's candidate list.
///
/// # Errors
///
/// Returns `DomainError::EmptyCandidateList` for an empty list and
/// `DomainError::DuplicateCandidate` for the first repeated user.
pub fn validate_distinct_candidates(user_ids: &[i64]) -> Result<(), DomainError> {
    if user_ids.is_empty() {
        return Err(DomainError::EmptyCandidateList);
    }

    let mut seen: HashSet<i64> = HashSet::with_capacity(user_ids.len());
    for user_id in user_ids {
        if !seen.insert(*user_id) {
            return Err(DomainError::DuplicateCandidate { user_id: *user_id });
        }
    }
    Ok(())
}
