//! Domain model for users, notes, categories and publications.
//!
//! # Responsibility
//! - Define canonical data structures used by repositories and services.
//! - Own the wire shapes (JSON maps keyed by stringified ids).
//!
//! # Invariants
//! - Ids are store-assigned, strictly positive and never reused.
//! - Publication state is never stored on a note; it is derived from
//!   `note_to_publication_relationship` rows.

pub mod category;
pub mod note;
pub mod publication;
pub mod user;
