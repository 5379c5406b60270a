//! Session identity seam.
//!
//! Token issuance and transport live outside this crate. Callers hand the
//! core a verifier; whatever user id it yields is trusted as the acting user.

use crate::model::user::UserId;

/// Login credentials as received from the outer layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Resolves request credentials to the acting user.
pub trait SessionVerifier {
    /// Returns `None` when the credentials are not authorized.
    fn verify(&self, credentials: &Credentials) -> Option<UserId>;
}
