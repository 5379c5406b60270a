//! Publication use-case service.
//!
//! # Responsibility
//! - Provide publish and issue-visibility entry points for callers.
//! - Delegate ranking and atomicity to the publication repository.

use crate::model::publication::{PublishReceipt, PublishedIssues};
use crate::model::user::UserId;
use crate::repo::publication_repo::PublicationRepository;
use crate::repo::RepoResult;

/// Use-case service wrapper for publication operations.
pub struct PublicationService<R: PublicationRepository> {
    repo: R,
}

impl<R: PublicationRepository> PublicationService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Freezes every unpublished note of `user_id` into a new issue.
    ///
    /// Publishing with nothing pending still creates an empty issue.
    pub fn publish(&self, user_id: UserId) -> RepoResult<PublishReceipt> {
        self.repo.publish_notes(user_id)
    }

    /// Issues visible to `user_id`, from every author.
    pub fn visible_issues(&self, user_id: UserId) -> RepoResult<PublishedIssues> {
        self.repo.get_all_published_notes_visible_by(user_id)
    }

    pub fn issue_count(&self, user_id: UserId) -> RepoResult<i64> {
        self.repo.count_publications(user_id)
    }
}
