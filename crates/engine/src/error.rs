//! The module contains the errors the stores and the engine can throw.
//!
//! Storage failures are classified as soon as they leave sea-orm: a
//! [`DbErr`] carrying a driver-level constraint failure becomes one of the
//! typed variants below, keeping the violated constraint's name. Anything
//! the classifier does not recognise stays a [`Database`] error.
//!
//!  [`Database`]: EngineError::Database
use sea_orm::{
    DbErr, RuntimeErr,
    sqlx::{self, error::ErrorKind},
};
use thiserror::Error;
use uuid::Uuid;

/// Message prefix SQLite uses when a named `CHECK` constraint rejects a row.
const SQLITE_CHECK_FAILED: &str = "CHECK constraint failed:";

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("\"{0}\" already present!")]
    ExistingKey(String),
    #[error("check constraint \"{constraint}\" violated")]
    CheckViolation { constraint: String },
    #[error("foreign key violation: {0}")]
    ForeignKeyViolation(String),
    #[error("not null violation: {0}")]
    NotNullViolation(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("invalid status transition: {0}")]
    InvalidTransition(String),
    #[error("deadline exceeded: {0}")]
    DeadlineExceeded(String),
    /// The finalize step of a workflow could not write the record's outcome.
    #[error("failed to finalize transaction {id}: {source}")]
    Finalize {
        id: Uuid,
        #[source]
        source: Box<EngineError>,
    },
    #[error(transparent)]
    Database(DbErr),
}

impl EngineError {
    /// Name of the violated check constraint, if this is a check violation.
    pub fn constraint(&self) -> Option<&str> {
        match self {
            Self::CheckViolation { constraint } => Some(constraint.as_str()),
            _ => None,
        }
    }
}

impl From<DbErr> for EngineError {
    fn from(err: DbErr) -> Self {
        let classified = database_error(&err).map(|db_err| {
            (
                db_err.kind(),
                constraint_name(db_err),
                db_err.message().to_string(),
            )
        });

        match classified {
            Some((ErrorKind::UniqueViolation, name, message)) => {
                Self::ExistingKey(name.unwrap_or(message))
            }
            Some((ErrorKind::ForeignKeyViolation, name, message)) => {
                Self::ForeignKeyViolation(name.unwrap_or(message))
            }
            Some((ErrorKind::NotNullViolation, name, message)) => {
                Self::NotNullViolation(name.unwrap_or(message))
            }
            Some((ErrorKind::CheckViolation, name, message)) => Self::CheckViolation {
                constraint: name.unwrap_or(message),
            },
            _ => match err {
                DbErr::RecordNotFound(what) => Self::KeyNotFound(what),
                DbErr::RecordNotUpdated => Self::KeyNotFound("record not updated".to_string()),
                other => Self::Database(other),
            },
        }
    }
}

/// Digs the driver error out of a sea-orm error, if there is one.
fn database_error(err: &DbErr) -> Option<&(dyn sqlx::error::DatabaseError + 'static)> {
    match err {
        DbErr::Exec(RuntimeErr::SqlxError(sqlx::Error::Database(db_err)))
        | DbErr::Query(RuntimeErr::SqlxError(sqlx::Error::Database(db_err)))
        | DbErr::Conn(RuntimeErr::SqlxError(sqlx::Error::Database(db_err))) => {
            Some(db_err.as_ref())
        }
        _ => None,
    }
}

/// Constraint identity reported by the driver.
///
/// Postgres fills `constraint()` directly; SQLite only appends the name of a
/// named `CHECK` constraint to its failure report.
fn constraint_name(err: &dyn sqlx::error::DatabaseError) -> Option<String> {
    if let Some(name) = err.constraint() {
        return Some(name.to_string());
    }
    err.message()
        .strip_prefix(SQLITE_CHECK_FAILED)
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(ToString::to_string)
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::ExistingKey(a), Self::ExistingKey(b)) => a == b,
            (Self::CheckViolation { constraint: a }, Self::CheckViolation { constraint: b }) => {
                a == b
            }
            (Self::ForeignKeyViolation(a), Self::ForeignKeyViolation(b)) => a == b,
            (Self::NotNullViolation(a), Self::NotNullViolation(b)) => a == b,
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::InvalidTransition(a), Self::InvalidTransition(b)) => a == b,
            (Self::DeadlineExceeded(a), Self::DeadlineExceeded(b)) => a == b,
            (
                Self::Finalize {
                    id: a,
                    source: source_a,
                },
                Self::Finalize {
                    id: b,
                    source: source_b,
                },
            ) => a == b && source_a == source_b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
