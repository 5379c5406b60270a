//! Note category assignment repository.
//!
//! # Responsibility
//! - Keep the one-to-one `note → category` mapping.
//!
//! # Invariants
//! - `note_id` is unique in `note_to_category_relationship`; assignment is
//!   an upsert that keeps no history.
//! - Stored tokens are parsed strictly on read.

use crate::model::category::NoteCategory;
use crate::model::note::NoteId;
use crate::repo::{ensure_tables, expect_one_row, RecordRef, RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension};

/// Repository interface for category assignment.
pub trait CategoryRepository {
    /// Inserts or replaces the category of `note_id`.
    fn assign_category(&self, note_id: NoteId, category: NoteCategory) -> RepoResult<()>;
    fn get_category(&self, note_id: NoteId) -> RepoResult<NoteCategory>;
    fn delete_category(&self, note_id: NoteId) -> RepoResult<()>;
}

/// SQLite-backed category repository.
pub struct SqliteCategoryRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCategoryRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_tables(conn, &["note_to_category_relationship"])?;
        Ok(Self { conn })
    }
}

impl CategoryRepository for SqliteCategoryRepository<'_> {
    fn assign_category(&self, note_id: NoteId, category: NoteCategory) -> RepoResult<()> {
        let changed = self.conn.execute(
            "INSERT INTO note_to_category_relationship (note_id, category)
             VALUES (?1, ?2)
             ON CONFLICT (note_id) DO UPDATE SET category = excluded.category;",
            params![note_id.0, category.as_str()],
        )?;
        expect_one_row(changed, "category_assign", RecordRef::NoteCategory(note_id))
    }

    fn get_category(&self, note_id: NoteId) -> RepoResult<NoteCategory> {
        let token: String = self
            .conn
            .query_row(
                "SELECT category FROM note_to_category_relationship WHERE note_id = ?1;",
                [note_id.0],
                |row| row.get(0),
            )
            .optional()?
            .ok_or(RepoError::NotFound(RecordRef::NoteCategory(note_id)))?;
        Ok(token.parse()?)
    }

    fn delete_category(&self, note_id: NoteId) -> RepoResult<()> {
        let changed = self.conn.execute(
            "DELETE FROM note_to_category_relationship WHERE note_id = ?1;",
            [note_id.0],
        )?;
        expect_one_row(changed, "category_delete", RecordRef::NoteCategory(note_id))
    }
}
