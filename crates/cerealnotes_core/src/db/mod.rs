//! Note store bootstrap.
//!
//! A usable connection is one that went through [`open_db`] or
//! [`open_db_in_memory`]: foreign keys on, busy timeout set, schema at
//! [`migrations::latest_version`]. Repositories refuse anything else.
//!
//! Deleting a user or note relies on `foreign_keys = ON`; without it the
//! publication and category link rows would be left dangling.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

/// Failure while opening or migrating the note store.
#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    /// The file was written by a newer build; refusing to touch it.
    SchemaTooNew { found: u32, supported: u32 },
}

impl DbError {
    /// Stable classification for logs and the CLI.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Sqlite(_) => "storage_error",
            Self::SchemaTooNew { .. } => "schema_too_new",
        }
    }
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::SchemaTooNew { found, supported } => write!(
                f,
                "note store is at schema v{found}, this build only knows up to v{supported}"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::SchemaTooNew { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
