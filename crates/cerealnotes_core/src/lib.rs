//! Core domain logic for CerealNotes.
//! This crate is the single source of truth for note ownership and the
//! publication/visibility model.

pub mod config;
pub mod credentials;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod session;

pub use config::{ConfigError, CoreConfig};
pub use logging::{default_log_level, init_logging, logging_status, LogTarget, LoggingConfig};
pub use model::category::{InvalidCategoryError, NoteCategory};
pub use model::note::{NewNote, Note, NoteId, NotesById};
pub use model::publication::{
    IssueNumber, NewPublication, PublicationId, PublishReceipt, PublishedIssues,
};
pub use model::user::{EmailAddress, User, UserId, UserValidationError, UsersById};
pub use repo::category_repo::{CategoryRepository, SqliteCategoryRepository};
pub use repo::note_repo::{NoteRepository, SqliteNoteRepository};
pub use repo::publication_repo::{PublicationRepository, SqlitePublicationRepository};
pub use repo::user_repo::{SqliteUserRepository, UserRepository};
pub use repo::{RecordRef, RepoError, RepoResult};
pub use service::account_service::{AccountService, AccountServiceError};
pub use service::note_service::{NoteService, NoteServiceError, NoteServiceResult};
pub use service::publication_service::PublicationService;
pub use session::{Credentials, SessionVerifier};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
