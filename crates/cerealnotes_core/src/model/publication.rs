//! Publication and issue model.
//!
//! # Responsibility
//! - Define publication records and the derived issue number.
//! - Provide the `PublishedIssues` read model for visibility queries.
//!
//! # Invariants
//! - A publication has no content; notes are attached via link rows.
//! - Issue numbers are per-author ranks starting at 1, never stored.

use crate::model::note::NotesById;
use crate::model::user::UserId;
use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::ops::Deref;

/// Store-assigned publication identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PublicationId(pub i64);

impl Display for PublicationId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Rank of a publication among its author's publications, 1 = earliest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IssueNumber(pub i64);

impl Display for IssueNumber {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Input for `StoreNewPublication`; the store assigns the id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPublication {
    pub author_id: UserId,
    pub creation_time: DateTime<Utc>,
}

impl NewPublication {
    /// Creates a draft stamped with the current time.
    pub fn now(author_id: UserId) -> Self {
        Self {
            author_id,
            creation_time: Utc::now().trunc_subsecs(3),
        }
    }
}

/// Outcome of one publish action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishReceipt {
    pub publication_id: PublicationId,
    /// Issue number the new publication holds for its author.
    pub issue_number: IssueNumber,
    /// Notes frozen by this publication; zero is allowed.
    pub note_count: usize,
}

/// Visible issues keyed by issue number.
///
/// An issue present with an empty map means at least one publication holds
/// that rank but none of them froze any (still existing) note.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PublishedIssues(BTreeMap<IssueNumber, NotesById>);

impl PublishedIssues {
    pub fn issue(&self, number: IssueNumber) -> Option<&NotesById> {
        self.0.get(&number)
    }

    pub(crate) fn issue_mut(&mut self, number: IssueNumber) -> &mut NotesById {
        self.0.entry(number).or_default()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

impl Deref for PublishedIssues {
    type Target = BTreeMap<IssueNumber, NotesById>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
