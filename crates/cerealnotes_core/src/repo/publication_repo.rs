//! Publication repository: publishing and issue visibility.
//!
//! # Responsibility
//! - Freeze a user's unpublished notes into a new publication atomically.
//! - Rank publications per author and answer which issues a user can see.
//!
//! # Invariants
//! - `publish_notes` runs in one `BEGIN IMMEDIATE` transaction: the
//!   publication row and every link row commit together or not at all, and
//!   the set of unpublished notes cannot change while it runs.
//! - Issue numbers are `ROW_NUMBER()` over each author's publications ordered
//!   by `creation_time ASC, id ASC`, so ties on time fall back to insertion
//!   order and ranks stay dense.
//! - A new publication never gets a `creation_time` earlier than its
//!   author's latest one, so it always holds the highest issue number.
//! - Visibility threshold is the viewer's own publication count; a viewer
//!   with none sees nothing.

use crate::model::publication::{
    IssueNumber, NewPublication, PublicationId, PublishReceipt, PublishedIssues,
};
use crate::model::user::UserId;
use crate::repo::note_repo::parse_note_row;
use crate::repo::{ensure_tables, from_epoch_ms, to_epoch_ms, RepoResult};
use log::{debug, info};
use rusqlite::{params, Connection, Transaction, TransactionBehavior};
use std::time::Instant;

const RANKED_VISIBLE_NOTES_SQL: &str = "WITH ranked_publication AS (
    SELECT
        id,
        ROW_NUMBER() OVER (
            PARTITION BY author_id
            ORDER BY creation_time ASC, id ASC
        ) AS issue_number
    FROM publication
)
SELECT
    rp.issue_number AS issue_number,
    note.id AS id,
    note.author_id AS author_id,
    note.content AS content,
    note.creation_time AS creation_time
FROM ranked_publication rp
LEFT OUTER JOIN note_to_publication_relationship ntp
    ON ntp.publication_id = rp.id
LEFT OUTER JOIN note
    ON note.id = ntp.note_id
WHERE rp.issue_number <= ?1
ORDER BY rp.issue_number ASC, note.id ASC;";

/// Repository interface for publication operations.
pub trait PublicationRepository {
    /// Inserts a bare publication record without linking any note.
    fn store_new_publication(&self, publication: &NewPublication) -> RepoResult<PublicationId>;
    /// Creates a publication for `user_id` and links every currently
    /// unpublished note of that user to it. Zero notes is allowed.
    fn publish_notes(&self, user_id: UserId) -> RepoResult<PublishReceipt>;
    /// How many times `user_id` has published.
    fn count_publications(&self, user_id: UserId) -> RepoResult<i64>;
    /// Notes grouped by issue number, for every issue number up to the
    /// viewer's own publication count, across all authors.
    fn get_all_published_notes_visible_by(&self, user_id: UserId)
        -> RepoResult<PublishedIssues>;
}

/// SQLite-backed publication repository.
pub struct SqlitePublicationRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqlitePublicationRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_tables(
            conn,
            &["note", "publication", "note_to_publication_relationship"],
        )?;
        Ok(Self { conn })
    }
}

impl PublicationRepository for SqlitePublicationRepository<'_> {
    fn store_new_publication(&self, publication: &NewPublication) -> RepoResult<PublicationId> {
        insert_publication(self.conn, publication)
    }

    fn publish_notes(&self, user_id: UserId) -> RepoResult<PublishReceipt> {
        let started_at = Instant::now();
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;

        let mut publication = NewPublication::now(user_id);
        let latest: Option<i64> = tx.query_row(
            "SELECT MAX(creation_time) FROM publication WHERE author_id = ?1;",
            [user_id.0],
            |row| row.get(0),
        )?;
        if let Some(latest) = latest {
            if latest > to_epoch_ms(publication.creation_time) {
                publication.creation_time = from_epoch_ms(latest, "publication.creation_time")?;
            }
        }

        let publication_id = insert_publication(&tx, &publication)?;
        let note_count = tx.execute(
            "INSERT INTO note_to_publication_relationship (note_id, publication_id)
             SELECT note.id, ?2
             FROM note
             LEFT OUTER JOIN note_to_publication_relationship ntp
                ON ntp.note_id = note.id
             WHERE note.author_id = ?1
               AND ntp.note_id IS NULL;",
            params![user_id.0, publication_id.0],
        )?;
        let issue_number = IssueNumber(count_publications_in(&tx, user_id)?);
        tx.commit()?;

        info!(
            "event=publish_notes module=repo status=ok user_id={user_id} publication_id={publication_id} issue_number={issue_number} note_count={note_count} duration_ms={}",
            started_at.elapsed().as_millis()
        );
        Ok(PublishReceipt {
            publication_id,
            issue_number,
            note_count,
        })
    }

    fn count_publications(&self, user_id: UserId) -> RepoResult<i64> {
        count_publications_in(self.conn, user_id)
    }

    fn get_all_published_notes_visible_by(
        &self,
        user_id: UserId,
    ) -> RepoResult<PublishedIssues> {
        // One read transaction so the threshold and the ranking see the
        // same snapshot.
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Deferred)?;

        let threshold = count_publications_in(&tx, user_id)?;
        let mut issues = PublishedIssues::default();
        if threshold == 0 {
            tx.commit()?;
            debug!("event=visible_issues module=repo status=ok user_id={user_id} threshold=0");
            return Ok(issues);
        }

        {
            let mut stmt = tx.prepare(RANKED_VISIBLE_NOTES_SQL)?;
            let mut rows = stmt.query([threshold])?;
            while let Some(row) = rows.next()? {
                let issue = issues.issue_mut(IssueNumber(row.get("issue_number")?));
                let note_id: Option<i64> = row.get("id")?;
                if note_id.is_some() {
                    issue.insert(parse_note_row(row)?);
                }
            }
        }
        tx.commit()?;

        debug!(
            "event=visible_issues module=repo status=ok user_id={user_id} threshold={threshold} issue_count={}",
            issues.len()
        );
        Ok(issues)
    }
}

fn insert_publication(
    conn: &Connection,
    publication: &NewPublication,
) -> RepoResult<PublicationId> {
    conn.execute(
        "INSERT INTO publication (author_id, creation_time) VALUES (?1, ?2);",
        params![
            publication.author_id.0,
            to_epoch_ms(publication.creation_time)
        ],
    )?;
    Ok(PublicationId(conn.last_insert_rowid()))
}

fn count_publications_in(conn: &Connection, user_id: UserId) -> RepoResult<i64> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM publication WHERE author_id = ?1;",
        [user_id.0],
        |row| row.get(0),
    )?;
    Ok(count)
}
