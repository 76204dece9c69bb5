// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Registration password rules.
//!
//! Checked only when a new user is created. Existing users joining another
//! organization keep the password they registered with.

use thiserror::Error;

/// Why a registration password was refused.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PasswordPolicyError {
    #[error("Password must be at least {min_length} characters long")]
    TooShort { min_length: usize },

    #[error(
        "Password must mix at least {required} kinds of characters (letters, digits, symbols, case); found {found}"
    )]
    TooFewCharacterKinds { required: usize, found: usize },

    /// The password is the member's own email, mailbox name, or display name.
    #[error("Password must not be the member's {field}")]
    SameAsIdentity { field: &'static str },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum CharKind {
    Upper,
    Lower,
    Digit,
    Symbol,
}

impl CharKind {
    fn of(c: char) -> Option<Self> {
        if c.is_whitespace() {
            None
        } else if c.is_uppercase() {
            Some(Self::Upper)
        } else if c.is_lowercase() {
            Some(Self::Lower)
        } else if c.is_numeric() {
            Some(Self::Digit)
        } else {
            Some(Self::Symbol)
        }
    }
}

/// Length and mix requirements for new passwords.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordPolicy {
    /// Minimum length, counted in characters rather than bytes.
    pub min_length: usize,
    /// Minimum number of distinct character kinds.
    pub min_kinds: usize,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            min_length: 8,
            min_kinds: 2,
        }
    }
}

impl PasswordPolicy {
    /// Checks a password for a member about to be created.
    ///
    /// Comparisons against `email` and `name` ignore case and surrounding
    /// whitespace.
    ///
    /// # Errors
    ///
    /// Returns the first rule the password breaks.
    pub fn validate(&self, password: &str, email: &str, name: &str) -> Result<(), PasswordPolicyError> {
        if password.chars().count() < self.min_length {
            return Err(PasswordPolicyError::TooShort {
                min_length: self.min_length,
            });
        }

        let found: usize = kinds_present(password);
        if found < self.min_kinds {
            return Err(PasswordPolicyError::TooFewCharacterKinds {
                required: self.min_kinds,
                found,
            });
        }

        let candidate: String = password.to_lowercase();
        let email: String = email.trim().to_lowercase();
        let mailbox: &str = email.split_once('@').map_or(email.as_str(), |(local, _)| local);

        if candidate == email || candidate == mailbox {
            return Err(PasswordPolicyError::SameAsIdentity { field: "email" });
        }
        if candidate == name.trim().to_lowercase() {
            return Err(PasswordPolicyError::SameAsIdentity { field: "name" });
        }

        Ok(())
    }
}

fn kinds_present(password: &str) -> usize {
    let mut kinds: Vec<CharKind> = password.chars().filter_map(CharKind::of).collect();
    kinds.sort_unstable();
    kinds.dedup();
    kinds.len()
}
