//! Note domain model.
//!
//! # Responsibility
//! - Define the note record and the draft used to create one.
//! - Provide the `NotesById` mapping and its JSON wire shape.
//!
//! # Invariants
//! - `author_id` never changes after creation.
//! - The JSON value of a note carries `authorId`, `content` and
//!   `creationTime`; the id lives in the enclosing object key.

use crate::model::user::UserId;
use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::ops::Deref;

/// Store-assigned note identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NoteId(pub i64);

impl Display for NoteId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Persisted note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    #[serde(skip)]
    pub id: NoteId,
    pub author_id: UserId,
    pub content: String,
    /// Millisecond precision; that is what the store keeps.
    pub creation_time: DateTime<Utc>,
}

/// Input for `StoreNewNote`; the store assigns the id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNote {
    pub author_id: UserId,
    pub content: String,
    pub creation_time: DateTime<Utc>,
}

impl NewNote {
    /// Creates a draft stamped with the current time.
    pub fn now(author_id: UserId, content: impl Into<String>) -> Self {
        Self {
            author_id,
            content: content.into(),
            creation_time: Utc::now().trunc_subsecs(3),
        }
    }

    /// Attaches the store-assigned id.
    pub fn into_note(self, id: NoteId) -> Note {
        Note {
            id,
            author_id: self.author_id,
            content: self.content,
            creation_time: self.creation_time,
        }
    }
}

/// Notes keyed by id, ordered by id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct NotesById(BTreeMap<NoteId, Note>);

impl NotesById {
    pub fn insert(&mut self, note: Note) -> Option<Note> {
        self.0.insert(note.id, note)
    }

    pub fn ids(&self) -> impl Iterator<Item = NoteId> + '_ {
        self.0.keys().copied()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

impl Deref for NotesById {
    type Target = BTreeMap<NoteId, Note>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromIterator<Note> for NotesById {
    fn from_iter<I: IntoIterator<Item = Note>>(iter: I) -> Self {
        Self(iter.into_iter().map(|note| (note.id, note)).collect())
    }
}

impl IntoIterator for NotesById {
    type Item = (NoteId, Note);
    type IntoIter = std::collections::btree_map::IntoIter<NoteId, Note>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
