//! Password hashing and verification using Argon2id.
//!
//! Hashes are PHC strings, so salt and parameters travel with the hash.

use crate::repo::{RepoError, RepoResult};
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use once_cell::sync::OnceCell;

/// Hash checked when no account matches, so both failure paths run Argon2.
pub(crate) static DUMMY_PASSWORD_HASH: OnceCell<String> = OnceCell::new();
const DUMMY_PASSWORD: &str = "cerealnotes-no-such-account";

pub fn hash_password(password: &str) -> RepoResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| RepoError::CredentialHash(err.to_string()))
}

/// Returns whether `password` matches the stored PHC `hash`.
///
/// A malformed stored hash is corrupt data, not a mismatch.
pub fn verify_password(password: &str, hash: &str) -> RepoResult<bool> {
    let parsed = PasswordHash::new(hash)
        .map_err(|err| RepoError::InvalidData(format!("malformed password hash: {err}")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// Verifies against `stored_hash`, or against a throwaway hash when there is
/// none. The throwaway path always yields `false`.
pub fn verify_password_or_dummy(password: &str, stored_hash: Option<&str>) -> RepoResult<bool> {
    match stored_hash {
        Some(hash) => verify_password(password, hash),
        None => {
            let dummy = DUMMY_PASSWORD_HASH.get_or_try_init(|| hash_password(DUMMY_PASSWORD))?;
            let _ = verify_password(password, dummy)?;
            Ok(false)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{
        hash_password, verify_password, verify_password_or_dummy, DUMMY_PASSWORD,
        DUMMY_PASSWORD_HASH,
    };
    use crate::repo::RepoError;

    #[test]
    fn hash_verifies_only_the_hashed_password() {
        let hash = hash_password("worldsBestPassword").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("worldsBestPassword", &hash).unwrap());
        assert!(!verify_password("worldsWorstPassword", &hash).unwrap());
    }

    #[test]
    fn same_password_gets_distinct_salts() {
        assert_ne!(hash_password("same").unwrap(), hash_password("same").unwrap());
    }

    #[test]
    fn malformed_hash_is_invalid_data() {
        let err = verify_password("pw", "plaintext").unwrap_err();
        assert!(matches!(err, RepoError::InvalidData(_)));
    }

    #[test]
    fn missing_hash_runs_dummy_verification_and_fails() {
        assert!(!verify_password_or_dummy("anything", None).unwrap());
        let dummy = DUMMY_PASSWORD_HASH.get().expect("dummy hash initialized");
        assert!(dummy.starts_with("$argon2id$"));

        // Even the dummy's own password never authenticates.
        assert!(!verify_password_or_dummy(DUMMY_PASSWORD, None).unwrap());
    }

    #[test]
    fn stored_hash_is_used_when_present() {
        let hash = hash_password("pw").unwrap();
        assert!(verify_password_or_dummy("pw", Some(&hash)).unwrap());
        assert!(!verify_password_or_dummy("nope", Some(&hash)).unwrap());
    }
}
