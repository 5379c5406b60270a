//! Repository layer abstractions and SQLite implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts.
//! - Isolate SQLite query details from service orchestration.
//! - Map row counts onto the store error taxonomy.
//!
//! # Invariants
//! - Zero affected rows where one was expected is `NotFound`.
//! - More affected rows than a contract allows is `InvariantViolation`,
//!   logged at error level.
//! - Driver failures surface unchanged as `Db`.

use crate::db::DbError;
use crate::model::category::InvalidCategoryError;
use crate::model::note::NoteId;
use crate::model::user::EmailAddress;
use chrono::{DateTime, Utc};
use log::error;
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod category_repo;
pub mod note_repo;
pub mod publication_repo;
pub mod user_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Record addressed by a failed lookup or mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordRef {
    Note(NoteId),
    NoteCategory(NoteId),
    UserEmail(EmailAddress),
}

impl Display for RecordRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Note(id) => write!(f, "note {id}"),
            Self::NoteCategory(id) => write!(f, "category of note {id}"),
            Self::UserEmail(email) => write!(f, "user with email {email}"),
        }
    }
}

/// Store error taxonomy shared by every repository.
#[derive(Debug)]
pub enum RepoError {
    /// Zero rows returned/affected where one was expected.
    NotFound(RecordRef),
    /// More rows affected than the operation allows. Always a bug.
    InvariantViolation {
        operation: &'static str,
        rows_affected: usize,
    },
    InvalidCategory(InvalidCategoryError),
    /// Unknown email and wrong password are deliberately indistinguishable.
    CredentialsNotAuthorized,
    /// Password hashing backend failure.
    CredentialHash(String),
    Db(DbError),
    /// Persisted row cannot be converted into the read model.
    InvalidData(String),
    /// Connection was not migrated before repository construction.
    MissingRequiredTable(&'static str),
}

impl RepoError {
    /// Stable classification used by logs and outer layers.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::InvariantViolation { .. } => "invariant_violation",
            Self::InvalidCategory(_) => "invalid_category",
            Self::CredentialsNotAuthorized => "credentials_not_authorized",
            Self::CredentialHash(_) => "credential_hash_failed",
            Self::Db(_) => "storage_error",
            Self::InvalidData(_) => "invalid_data",
            Self::MissingRequiredTable(_) => "storage_uninitialized",
        }
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(record) => write!(f, "{record} not found"),
            Self::InvariantViolation {
                operation,
                rows_affected,
            } => write!(
                f,
                "invariant violation: {operation} affected {rows_affected} rows"
            ),
            Self::InvalidCategory(err) => write!(f, "{err}"),
            Self::CredentialsNotAuthorized => write!(f, "credentials not authorized"),
            Self::CredentialHash(message) => write!(f, "credential hashing failed: {message}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
            Self::MissingRequiredTable(table) => {
                write!(f, "note store requires table `{table}`")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidCategory(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<InvalidCategoryError> for RepoError {
    fn from(value: InvalidCategoryError) -> Self {
        Self::InvalidCategory(value)
    }
}

/// Checks a single-row mutation result.
pub(crate) fn expect_one_row(
    rows_affected: usize,
    operation: &'static str,
    target: RecordRef,
) -> RepoResult<()> {
    match rows_affected {
        0 => Err(RepoError::NotFound(target)),
        1 => Ok(()),
        _ => {
            error!(
                "event={operation} module=repo status=error error_code=invariant_violation target=\"{target}\" rows_affected={rows_affected}"
            );
            Err(RepoError::InvariantViolation {
                operation,
                rows_affected,
            })
        }
    }
}

pub(crate) fn ensure_tables(conn: &Connection, tables: &[&'static str]) -> RepoResult<()> {
    for &table in tables {
        let exists: i64 = conn.query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table],
            |row| row.get(0),
        )?;
        if exists != 1 {
            return Err(RepoError::MissingRequiredTable(table));
        }
    }
    Ok(())
}

pub(crate) fn to_epoch_ms(time: DateTime<Utc>) -> i64 {
    time.timestamp_millis()
}

pub(crate) fn from_epoch_ms(value: i64, column: &str) -> RepoResult<DateTime<Utc>> {
    DateTime::from_timestamp_millis(value)
        .ok_or_else(|| RepoError::InvalidData(format!("`{column}` out of range: {value}")))
}

#[cfg(test)]
mod tests {
    use super::{expect_one_row, RecordRef, RepoError};
    use crate::model::note::NoteId;

    #[test]
    fn row_count_maps_onto_taxonomy() {
        assert!(expect_one_row(1, "note_delete", RecordRef::Note(NoteId(1))).is_ok());

        let missing = expect_one_row(0, "note_delete", RecordRef::Note(NoteId(1))).unwrap_err();
        assert_eq!(missing.code(), "not_found");

        let too_many = expect_one_row(2, "note_delete", RecordRef::Note(NoteId(1))).unwrap_err();
        assert!(matches!(
            too_many,
            RepoError::InvariantViolation {
                operation: "note_delete",
                rows_affected: 2
            }
        ));
    }

    #[test]
    fn error_codes_are_distinct() {
        let errors = [
            RepoError::NotFound(RecordRef::Note(NoteId(1))),
            RepoError::InvariantViolation {
                operation: "x",
                rows_affected: 2,
            },
            RepoError::InvalidCategory(crate::model::category::InvalidCategoryError(
                "x".to_string(),
            )),
            RepoError::CredentialsNotAuthorized,
            RepoError::CredentialHash("x".to_string()),
            RepoError::Db(crate::db::DbError::SchemaTooNew {
                found: 9,
                supported: 2,
            }),
            RepoError::InvalidData("x".to_string()),
            RepoError::MissingRequiredTable("note"),
        ];
        let mut codes: Vec<_> = errors.iter().map(RepoError::code).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
    }
}
