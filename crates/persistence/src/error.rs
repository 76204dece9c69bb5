// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use diesel::result::DatabaseErrorKind;
use orgvote::CoreError;
use orgvote_domain::DomainError;

/// Storage failures and write rejections.
///
/// `TransitionRejected` carries the rule that failed when a write was
/// re-validated inside its transaction; every other variant is a storage
/// problem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistenceError {
    /// Diesel reported an error with no more specific mapping.
    DatabaseError(String),
    DatabaseConnectionFailed(String),
    MigrationFailed(String),
    /// A raw pragma statement failed.
    QueryFailed(String),
    /// Ballot statistics could not be encoded or decoded.
    SerializationError(String),
    InitializationError(String),
    ForeignKeyEnforcementNotEnabled,
    /// A unique index rejected the write.
    UniqueViolation(String),
    /// A stored row could not be turned back into a domain value.
    CorruptRecord(String),
    TransitionRejected(CoreError),
    /// A row the operation depends on does not exist.
    NotFound(String),
    Other(String),
}

impl std::fmt::Display for PersistenceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DatabaseError(msg) => write!(f, "Database error: {msg}"),
            Self::DatabaseConnectionFailed(msg) => write!(f, "Cannot open database: {msg}"),
            Self::MigrationFailed(msg) => write!(f, "Schema migration failed: {msg}"),
            Self::QueryFailed(msg) => write!(f, "Pragma failed: {msg}"),
            Self::SerializationError(msg) => write!(f, "Ballot statistics encoding failed: {msg}"),
            Self::InitializationError(msg) => write!(f, "Cannot initialize storage: {msg}"),
            Self::ForeignKeyEnforcementNotEnabled => {
                write!(f, "SQLite foreign keys are not enforced on this connection")
            }
            Self::UniqueViolation(msg) => write!(f, "Unique constraint violated: {msg}"),
            Self::CorruptRecord(msg) => write!(f, "Corrupt record: {msg}"),
            Self::TransitionRejected(err) => write!(f, "Transition rejected: {err}"),
            Self::NotFound(msg) => write!(f, "{msg} not found"),
            Self::Other(msg) => f.write_str(msg),
        }
    }
}

impl std::error::Error for PersistenceError {}

impl From<diesel::result::Error> for PersistenceError {
    fn from(err: diesel::result::Error) -> Self {
        match err {
            diesel::result::Error::NotFound => Self::NotFound(String::from("Row")),
            diesel::result::Error::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
                Self::UniqueViolation(info.message().to_string())
            }
            _ => Self::DatabaseError(err.to_string()),
        }
    }
}

impl From<diesel::ConnectionError> for PersistenceError {
    fn from(err: diesel::ConnectionError) -> Self {
        Self::DatabaseConnectionFailed(err.to_string())
    }
}

impl From<serde_json::Error> for PersistenceError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationError(err.to_string())
    }
}

impl From<CoreError> for PersistenceError {
    fn from(err: CoreError) -> Self {
        Self::TransitionRejected(err)
    }
}

impl From<DomainError> for PersistenceError {
    fn from(err: DomainError) -> Self {
        Self::TransitionRejected(CoreError::DomainViolation(err))
    }
}
