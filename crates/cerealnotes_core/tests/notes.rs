use cerealnotes_core::db::{open_db, open_db_in_memory};
use cerealnotes_core::{
    AccountService, NewNote, Note, NoteId, NoteRepository, NoteService, NoteServiceError,
    NotesById, PublicationRepository, RecordRef, RepoError, RepoResult, SqliteCategoryRepository,
    SqliteNoteRepository, SqlitePublicationRepository, SqliteUserRepository, UserId,
};
use rusqlite::Connection;
use std::cell::Cell;

#[test]
fn stored_note_roundtrips_through_unpublished_listing() {
    let conn = open_db_in_memory().unwrap();
    let user_id = sign_up(&conn, "bob");
    let repo = SqliteNoteRepository::try_new(&conn).unwrap();

    let draft = NewNote::now(user_id, "I'm a note");
    let id = repo.store_new_note(&draft).unwrap();
    assert!(id.0 > 0, "note id was not a valid index: {id}");

    let unpublished = repo.get_my_unpublished_notes(user_id).unwrap();
    let retrieved = unpublished.get(&id).expect("expected note id missing");
    assert_eq!(retrieved.author_id, user_id);
    assert_eq!(retrieved.content, "I'm a note");
    assert_eq!(retrieved.creation_time, draft.creation_time);

    repo.update_note_content(id, "some new coolness").unwrap();
    let updated = repo.get_note_by_id(id).unwrap();
    assert_eq!(updated.content, "some new coolness");
    assert_eq!(updated.author_id, user_id);

    repo.delete_note_by_id(id).unwrap();
}

#[test]
fn storing_note_for_unknown_author_is_a_storage_error() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteNoteRepository::try_new(&conn).unwrap();

    let err = repo
        .store_new_note(&NewNote::now(UserId(404), "orphan"))
        .unwrap_err();
    assert_eq!(err.code(), "storage_error");
}

#[test]
fn users_notes_only_include_that_author() {
    let conn = open_db_in_memory().unwrap();
    let alice = sign_up(&conn, "alice");
    let bob = sign_up(&conn, "bob");
    let repo = SqliteNoteRepository::try_new(&conn).unwrap();

    let a1 = repo.store_new_note(&NewNote::now(alice, "a1")).unwrap();
    let a2 = repo.store_new_note(&NewNote::now(alice, "a2")).unwrap();
    repo.store_new_note(&NewNote::now(bob, "b1")).unwrap();

    let notes = repo.get_users_notes(alice).unwrap();
    assert_eq!(notes.ids().collect::<Vec<_>>(), vec![a1, a2]);
}

#[test]
fn unpublished_listing_excludes_published_notes_but_users_notes_keep_them() {
    let conn = open_db_in_memory().unwrap();
    let user_id = sign_up(&conn, "bob");
    let notes = SqliteNoteRepository::try_new(&conn).unwrap();
    let publications = SqlitePublicationRepository::try_new(&conn).unwrap();

    let published = notes.store_new_note(&NewNote::now(user_id, "old")).unwrap();
    publications.publish_notes(user_id).unwrap();
    let pending = notes.store_new_note(&NewNote::now(user_id, "new")).unwrap();

    let unpublished = notes.get_my_unpublished_notes(user_id).unwrap();
    assert_eq!(unpublished.ids().collect::<Vec<_>>(), vec![pending]);
    assert!(notes.is_note_published(published).unwrap());
    assert!(!notes.is_note_published(pending).unwrap());
    assert_eq!(notes.get_users_notes(user_id).unwrap().len(), 2);
}

#[test]
fn missing_note_operations_fail_with_not_found() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteNoteRepository::try_new(&conn).unwrap();
    let missing = NoteId(77);

    for err in [
        repo.get_note_by_id(missing).unwrap_err(),
        repo.update_note_content(missing, "x").unwrap_err(),
        repo.delete_note_by_id(missing).unwrap_err(),
    ] {
        assert!(matches!(err, RepoError::NotFound(RecordRef::Note(id)) if id == missing));
    }
}

#[test]
fn delete_is_exactly_once() {
    let conn = open_db_in_memory().unwrap();
    let user_id = sign_up(&conn, "bob");
    let repo = SqliteNoteRepository::try_new(&conn).unwrap();
    let id = repo.store_new_note(&NewNote::now(user_id, "gone")).unwrap();

    repo.delete_note_by_id(id).unwrap();
    let err = repo.delete_note_by_id(id).unwrap_err();
    assert_eq!(err.code(), "not_found");
}

#[test]
fn service_create_rejects_blank_content() {
    let conn = open_db_in_memory().unwrap();
    let user_id = sign_up(&conn, "bob");
    let service = note_service(&conn);

    let err = service.create_note(user_id, "  \n ").unwrap_err();
    assert!(matches!(err, NoteServiceError::EmptyContent));
}

#[test]
fn only_the_author_can_edit_or_delete() {
    let conn = open_db_in_memory().unwrap();
    let owner = sign_up(&conn, "owner");
    let intruder = sign_up(&conn, "intruder");
    let service = note_service(&conn);
    let note = service.create_note(owner, "mine").unwrap();

    let edit = service.update_note(intruder, note.id, "yours").unwrap_err();
    assert!(matches!(
        edit,
        NoteServiceError::NotNoteOwner { note_id, user_id } if note_id == note.id && user_id == intruder
    ));
    let delete = service.delete_note(intruder, note.id).unwrap_err();
    assert_eq!(delete.code(), "not_note_owner");

    let edited = service.update_note(owner, note.id, "still mine").unwrap();
    assert_eq!(edited.content, "still mine");
    assert_eq!(service.get_note(note.id).unwrap().content, "still mine");
}

#[test]
fn published_notes_are_frozen_but_deletable_by_owner() {
    let conn = open_db_in_memory().unwrap();
    let owner = sign_up(&conn, "owner");
    let service = note_service(&conn);
    let publications = SqlitePublicationRepository::try_new(&conn).unwrap();
    let note = service.create_note(owner, "frozen").unwrap();
    publications.publish_notes(owner).unwrap();

    let err = service.update_note(owner, note.id, "thawed").unwrap_err();
    assert!(matches!(err, NoteServiceError::NotePublished(id) if id == note.id));
    assert_eq!(service.get_note(note.id).unwrap().content, "frozen");

    service.delete_note(owner, note.id).unwrap();
    assert!(matches!(
        service.get_note(note.id),
        Err(NoteServiceError::NoteNotFound(id)) if id == note.id
    ));
}

#[test]
fn deleting_a_user_cascades_to_notes() {
    let conn = open_db_in_memory().unwrap();
    let user_id = sign_up(&conn, "bob");
    let service = note_service(&conn);
    let note = service.create_note(user_id, "bye").unwrap();

    conn.execute("DELETE FROM app_user WHERE id = ?1;", [user_id.0])
        .unwrap();
    assert!(matches!(
        service.get_note(note.id),
        Err(NoteServiceError::NoteNotFound(_))
    ));
}

#[test]
fn notes_json_matches_wire_shape() {
    let conn = open_db_in_memory().unwrap();
    let user_id = sign_up(&conn, "bob");
    let service = note_service(&conn);
    let note = service.create_note(user_id, "wire").unwrap();

    let json = service.notes_of(user_id).unwrap().to_json().unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    let entry = &value[note.id.to_string()];
    assert_eq!(entry["authorId"], user_id.0);
    assert_eq!(entry["content"], "wire");
    assert!(entry["creationTime"].is_string());
}

#[test]
fn conditional_update_refuses_published_notes() {
    let conn = open_db_in_memory().unwrap();
    let user_id = sign_up(&conn, "bob");
    let notes = SqliteNoteRepository::try_new(&conn).unwrap();
    let publications = SqlitePublicationRepository::try_new(&conn).unwrap();
    let draft = notes.store_new_note(&NewNote::now(user_id, "draft")).unwrap();

    assert!(notes
        .update_unpublished_note_content(draft, "revised")
        .unwrap());
    assert_eq!(notes.get_note_by_id(draft).unwrap().content, "revised");

    publications.publish_notes(user_id).unwrap();
    assert!(!notes
        .update_unpublished_note_content(draft, "too late")
        .unwrap());
    assert_eq!(notes.get_note_by_id(draft).unwrap().content, "revised");

    let missing = notes
        .update_unpublished_note_content(NoteId(draft.0 + 1), "nobody")
        .unwrap_err();
    assert!(matches!(missing, RepoError::NotFound(RecordRef::Note(_))));
}

#[test]
fn publish_from_another_connection_freezes_note_for_editor() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("shared.db");
    let editor_conn = open_db(&path).unwrap();
    let publisher_conn = open_db(&path).unwrap();
    let owner = sign_up(&editor_conn, "owner");
    let service = note_service(&editor_conn);
    let note = service.create_note(owner, "before").unwrap();

    SqlitePublicationRepository::try_new(&publisher_conn)
        .unwrap()
        .publish_notes(owner)
        .unwrap();

    let err = service.update_note(owner, note.id, "after").unwrap_err();
    assert!(matches!(err, NoteServiceError::NotePublished(id) if id == note.id));
    assert_eq!(service.get_note(note.id).unwrap().content, "before");
}

#[test]
fn publish_landing_after_ownership_check_still_blocks_edit() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("race.db");
    let editor_conn = open_db(&path).unwrap();
    let publisher_conn = open_db(&path).unwrap();
    let owner = sign_up(&editor_conn, "owner");
    let note_id = SqliteNoteRepository::try_new(&editor_conn)
        .unwrap()
        .store_new_note(&NewNote::now(owner, "before"))
        .unwrap();

    let notes = PublishAfterRead {
        inner: SqliteNoteRepository::try_new(&editor_conn).unwrap(),
        publisher: SqlitePublicationRepository::try_new(&publisher_conn).unwrap(),
        author: owner,
        published: Cell::new(false),
    };
    let service = NoteService::new(
        notes,
        SqliteCategoryRepository::try_new(&editor_conn).unwrap(),
    );

    let err = service.update_note(owner, note_id, "edited after freeze").unwrap_err();
    assert!(matches!(err, NoteServiceError::NotePublished(id) if id == note_id));

    let stored = SqliteNoteRepository::try_new(&publisher_conn)
        .unwrap()
        .get_note_by_id(note_id)
        .unwrap();
    assert_eq!(stored.content, "before");
}

/// Publishes the author's notes from another connection right after the
/// first note read, i.e. between the ownership check and the write.
struct PublishAfterRead<'conn> {
    inner: SqliteNoteRepository<'conn>,
    publisher: SqlitePublicationRepository<'conn>,
    author: UserId,
    published: Cell<bool>,
}

impl NoteRepository for PublishAfterRead<'_> {
    fn store_new_note(&self, note: &NewNote) -> RepoResult<NoteId> {
        self.inner.store_new_note(note)
    }

    fn get_users_notes(&self, user_id: UserId) -> RepoResult<NotesById> {
        self.inner.get_users_notes(user_id)
    }

    fn get_my_unpublished_notes(&self, user_id: UserId) -> RepoResult<NotesById> {
        self.inner.get_my_unpublished_notes(user_id)
    }

    fn get_note_by_id(&self, note_id: NoteId) -> RepoResult<Note> {
        let note = self.inner.get_note_by_id(note_id)?;
        if !self.published.replace(true) {
            self.publisher.publish_notes(self.author)?;
        }
        Ok(note)
    }

    fn update_note_content(&self, note_id: NoteId, content: &str) -> RepoResult<()> {
        self.inner.update_note_content(note_id, content)
    }

    fn update_unpublished_note_content(
        &self,
        note_id: NoteId,
        content: &str,
    ) -> RepoResult<bool> {
        self.inner.update_unpublished_note_content(note_id, content)
    }

    fn delete_note_by_id(&self, note_id: NoteId) -> RepoResult<()> {
        self.inner.delete_note_by_id(note_id)
    }

    fn is_note_published(&self, note_id: NoteId) -> RepoResult<bool> {
        self.inner.is_note_published(note_id)
    }
}

fn note_service(
    conn: &Connection,
) -> NoteService<SqliteNoteRepository<'_>, SqliteCategoryRepository<'_>> {
    NoteService::new(
        SqliteNoteRepository::try_new(conn).unwrap(),
        SqliteCategoryRepository::try_new(conn).unwrap(),
    )
}

fn sign_up(conn: &Connection, name: &str) -> UserId {
    AccountService::new(SqliteUserRepository::try_new(conn).unwrap())
        .sign_up(name, &format!("{name}@example.com"), "aPassword")
        .unwrap()
}
