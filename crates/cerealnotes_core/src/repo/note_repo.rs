//! Note repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide note CRUD on top of the `note` table.
//! - Derive published/unpublished state from link rows.
//!
//! # Invariants
//! - "Unpublished" means no `note_to_publication_relationship` row exists;
//!   it is computed with an anti-join in a single query, never stored.
//! - `update_note_content` does not consult publication state.
//!   `update_unpublished_note_content` checks it in the same statement as
//!   the write, so a concurrent publish cannot slip in between.

use crate::model::note::{NewNote, Note, NoteId, NotesById};
use crate::model::user::UserId;
use crate::repo::{
    ensure_tables, expect_one_row, from_epoch_ms, to_epoch_ms, RecordRef, RepoError, RepoResult,
};
use log::info;
use rusqlite::{params, Connection, OptionalExtension, Row};

const NOTE_SELECT_SQL: &str = "SELECT
    note.id AS id,
    note.author_id AS author_id,
    note.content AS content,
    note.creation_time AS creation_time
FROM note";

/// Repository interface for note operations.
pub trait NoteRepository {
    /// Inserts a note and returns its freshly assigned id.
    fn store_new_note(&self, note: &NewNote) -> RepoResult<NoteId>;
    /// All notes authored by `user_id`, published or not.
    fn get_users_notes(&self, user_id: UserId) -> RepoResult<NotesById>;
    /// Notes authored by `user_id` that no publication has frozen yet.
    fn get_my_unpublished_notes(&self, user_id: UserId) -> RepoResult<NotesById>;
    fn get_note_by_id(&self, note_id: NoteId) -> RepoResult<Note>;
    fn update_note_content(&self, note_id: NoteId, content: &str) -> RepoResult<()>;
    /// Rewrites content only while no publication holds the note.
    ///
    /// Returns `Ok(false)` when the note exists but is published.
    fn update_unpublished_note_content(&self, note_id: NoteId, content: &str)
        -> RepoResult<bool>;
    fn delete_note_by_id(&self, note_id: NoteId) -> RepoResult<()>;
    fn is_note_published(&self, note_id: NoteId) -> RepoResult<bool>;
}

/// SQLite-backed note repository.
pub struct SqliteNoteRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteNoteRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_tables(conn, &["note", "note_to_publication_relationship"])?;
        Ok(Self { conn })
    }

    fn query_notes(&self, sql: &str, user_id: UserId) -> RepoResult<NotesById> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query([user_id.0])?;
        let mut notes = NotesById::default();
        while let Some(row) = rows.next()? {
            notes.insert(parse_note_row(row)?);
        }
        Ok(notes)
    }
}

impl NoteRepository for SqliteNoteRepository<'_> {
    fn store_new_note(&self, note: &NewNote) -> RepoResult<NoteId> {
        self.conn.execute(
            "INSERT INTO note (author_id, content, creation_time)
             VALUES (?1, ?2, ?3);",
            params![
                note.author_id.0,
                note.content.as_str(),
                to_epoch_ms(note.creation_time),
            ],
        )?;
        let note_id = NoteId(self.conn.last_insert_rowid());
        info!(
            "event=note_store module=repo status=ok note_id={note_id} author_id={}",
            note.author_id
        );
        Ok(note_id)
    }

    fn get_users_notes(&self, user_id: UserId) -> RepoResult<NotesById> {
        self.query_notes(
            &format!("{NOTE_SELECT_SQL} WHERE note.author_id = ?1 ORDER BY note.id ASC;"),
            user_id,
        )
    }

    fn get_my_unpublished_notes(&self, user_id: UserId) -> RepoResult<NotesById> {
        self.query_notes(
            &format!(
                "{NOTE_SELECT_SQL}
                 LEFT OUTER JOIN note_to_publication_relationship ntp
                    ON ntp.note_id = note.id
                 WHERE note.author_id = ?1
                   AND ntp.note_id IS NULL
                 ORDER BY note.id ASC;"
            ),
            user_id,
        )
    }

    fn get_note_by_id(&self, note_id: NoteId) -> RepoResult<Note> {
        let mut stmt = self
            .conn
            .prepare(&format!("{NOTE_SELECT_SQL} WHERE note.id = ?1;"))?;
        let mut rows = stmt.query([note_id.0])?;
        match rows.next()? {
            Some(row) => parse_note_row(row),
            None => Err(RepoError::NotFound(RecordRef::Note(note_id))),
        }
    }

    fn update_note_content(&self, note_id: NoteId, content: &str) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE note SET content = ?2 WHERE id = ?1;",
            params![note_id.0, content],
        )?;
        expect_one_row(changed, "note_update", RecordRef::Note(note_id))
    }

    fn update_unpublished_note_content(
        &self,
        note_id: NoteId,
        content: &str,
    ) -> RepoResult<bool> {
        let changed = self.conn.execute(
            "UPDATE note SET content = ?2
             WHERE id = ?1
               AND NOT EXISTS (
                   SELECT 1
                   FROM note_to_publication_relationship
                   WHERE note_id = ?1
               );",
            params![note_id.0, content],
        )?;
        if changed != 0 {
            expect_one_row(changed, "note_update", RecordRef::Note(note_id))?;
            return Ok(true);
        }

        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM note WHERE id = ?1);",
            [note_id.0],
            |row| row.get(0),
        )?;
        if exists == 0 {
            return Err(RepoError::NotFound(RecordRef::Note(note_id)));
        }
        Ok(false)
    }

    fn delete_note_by_id(&self, note_id: NoteId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM note WHERE id = ?1;", [note_id.0])?;
        expect_one_row(changed, "note_delete", RecordRef::Note(note_id))?;
        info!("event=note_delete module=repo status=ok note_id={note_id}");
        Ok(())
    }

    fn is_note_published(&self, note_id: NoteId) -> RepoResult<bool> {
        let publication_id: Option<i64> = self
            .conn
            .query_row(
                "SELECT publication_id
                 FROM note_to_publication_relationship
                 WHERE note_id = ?1;",
                [note_id.0],
                |row| row.get(0),
            )
            .optional()?;
        Ok(publication_id.is_some())
    }
}

pub(crate) fn parse_note_row(row: &Row<'_>) -> RepoResult<Note> {
    Ok(Note {
        id: NoteId(row.get("id")?),
        author_id: UserId(row.get("author_id")?),
        content: row.get("content")?,
        creation_time: from_epoch_ms(row.get("creation_time")?, "note.creation_time")?,
    })
}
