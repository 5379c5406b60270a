//! Note use-case service.
//!
//! # Responsibility
//! - Stamp and store new notes for their author.
//! - Enforce owner-only mutation and frozen content of published notes.
//! - Parse category tokens coming from outer layers.
//!
//! # Invariants
//! - Only the author may edit, delete or (re)categorize a note.
//! - Published note content is immutable; deletion stays allowed.
//! - Reading a note or its category requires no ownership.

use crate::model::category::{InvalidCategoryError, NoteCategory};
use crate::model::note::{NewNote, Note, NoteId, NotesById};
use crate::model::user::UserId;
use crate::repo::category_repo::CategoryRepository;
use crate::repo::note_repo::NoteRepository;
use crate::repo::{RecordRef, RepoError};
use log::warn;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for note use-cases.
#[derive(Debug)]
pub enum NoteServiceError {
    /// Content is empty after trimming.
    EmptyContent,
    NoteNotFound(NoteId),
    /// Caller is not the author of the target note.
    NotNoteOwner { note_id: NoteId, user_id: UserId },
    /// Target note is frozen by a publication.
    NotePublished(NoteId),
    InvalidCategory(InvalidCategoryError),
    Repo(RepoError),
}

impl NoteServiceError {
    /// Stable classification used by logs and outer layers.
    pub fn code(&self) -> &'static str {
        match self {
            Self::EmptyContent => "empty_content",
            Self::NoteNotFound(_) => "not_found",
            Self::NotNoteOwner { .. } => "not_note_owner",
            Self::NotePublished(_) => "note_published",
            Self::InvalidCategory(_) => "invalid_category",
            Self::Repo(err) => err.code(),
        }
    }
}

impl Display for NoteServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyContent => write!(f, "note content cannot be empty"),
            Self::NoteNotFound(note_id) => write!(f, "note not found: {note_id}"),
            Self::NotNoteOwner { note_id, user_id } => {
                write!(f, "user {user_id} does not own note {note_id}")
            }
            Self::NotePublished(note_id) => {
                write!(f, "note {note_id} is published and can no longer be edited")
            }
            Self::InvalidCategory(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for NoteServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidCategory(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for NoteServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(RecordRef::Note(note_id)) => Self::NoteNotFound(note_id),
            RepoError::InvalidCategory(err) => Self::InvalidCategory(err),
            other => Self::Repo(other),
        }
    }
}

impl From<InvalidCategoryError> for NoteServiceError {
    fn from(value: InvalidCategoryError) -> Self {
        Self::InvalidCategory(value)
    }
}

pub type NoteServiceResult<T> = Result<T, NoteServiceError>;

/// Note service facade over note and category repositories.
pub struct NoteService<N: NoteRepository, C: CategoryRepository> {
    notes: N,
    categories: C,
}

impl<N: NoteRepository, C: CategoryRepository> NoteService<N, C> {
    pub fn new(notes: N, categories: C) -> Self {
        Self { notes, categories }
    }

    /// Creates a note authored by `author_id`, stamped with the current time.
    pub fn create_note(
        &self,
        author_id: UserId,
        content: impl Into<String>,
    ) -> NoteServiceResult<Note> {
        let content = content.into();
        if content.trim().is_empty() {
            return Err(NoteServiceError::EmptyContent);
        }
        let draft = NewNote::now(author_id, content);
        let note_id = self.notes.store_new_note(&draft)?;
        Ok(draft.into_note(note_id))
    }

    pub fn get_note(&self, note_id: NoteId) -> NoteServiceResult<Note> {
        Ok(self.notes.get_note_by_id(note_id)?)
    }

    /// Every note the user wrote, published or not.
    pub fn notes_of(&self, user_id: UserId) -> NoteServiceResult<NotesById> {
        Ok(self.notes.get_users_notes(user_id)?)
    }

    /// Notes that the user's next publish would freeze.
    pub fn unpublished_notes_of(&self, user_id: UserId) -> NoteServiceResult<NotesById> {
        Ok(self.notes.get_my_unpublished_notes(user_id)?)
    }

    /// Replaces the content of an unpublished note owned by `caller`.
    pub fn update_note(
        &self,
        caller: UserId,
        note_id: NoteId,
        content: impl Into<String>,
    ) -> NoteServiceResult<Note> {
        let content = content.into();
        if content.trim().is_empty() {
            return Err(NoteServiceError::EmptyContent);
        }
        let mut note = self.owned_note(caller, note_id)?;
        if !self.notes.update_unpublished_note_content(note_id, &content)? {
            warn!(
                "event=note_update module=service status=error error_code=note_published note_id={note_id}"
            );
            return Err(NoteServiceError::NotePublished(note_id));
        }
        note.content = content;
        Ok(note)
    }

    /// Deletes a note owned by `caller`, published or not.
    pub fn delete_note(&self, caller: UserId, note_id: NoteId) -> NoteServiceResult<()> {
        self.owned_note(caller, note_id)?;
        self.notes.delete_note_by_id(note_id)?;
        Ok(())
    }

    /// Parses `token` and assigns it to a note owned by `caller`.
    pub fn set_category(
        &self,
        caller: UserId,
        note_id: NoteId,
        token: &str,
    ) -> NoteServiceResult<NoteCategory> {
        let category: NoteCategory = token.parse()?;
        self.owned_note(caller, note_id)?;
        self.categories.assign_category(note_id, category)?;
        Ok(category)
    }

    /// Returns `None` when the note has no category.
    pub fn category_of(&self, note_id: NoteId) -> NoteServiceResult<Option<NoteCategory>> {
        match self.categories.get_category(note_id) {
            Ok(category) => Ok(Some(category)),
            Err(RepoError::NotFound(RecordRef::NoteCategory(_))) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    pub fn clear_category(&self, caller: UserId, note_id: NoteId) -> NoteServiceResult<()> {
        self.owned_note(caller, note_id)?;
        self.categories.delete_category(note_id)?;
        Ok(())
    }

    fn owned_note(&self, caller: UserId, note_id: NoteId) -> NoteServiceResult<Note> {
        let note = self.notes.get_note_by_id(note_id)?;
        if note.author_id != caller {
            warn!(
                "event=note_access module=service status=error error_code=not_note_owner note_id={note_id} user_id={caller}"
            );
            return Err(NoteServiceError::NotNoteOwner {
                note_id,
                user_id: caller,
            });
        }
        Ok(note)
    }
}
