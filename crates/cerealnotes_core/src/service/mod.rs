//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Hold access policy (ownership, frozen content) above the store.

pub mod account_service;
pub mod note_service;
pub mod publication_service;
