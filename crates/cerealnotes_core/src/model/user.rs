//! User identity model.
//!
//! # Responsibility
//! - Define user ids, normalized email addresses and the user read model.
//! - Validate sign-up input before it reaches storage.
//!
//! # Invariants
//! - `EmailAddress` values are always trimmed and lowercased.
//! - Credential hashes are never serialized.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::ops::Deref;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+$").expect("valid email regex"));

/// Store-assigned user identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl Display for UserId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Validation failures for identity input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserValidationError {
    InvalidEmailAddress(String),
    EmptyDisplayName,
    EmptyPassword,
}

impl Display for UserValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidEmailAddress(value) => write!(f, "invalid email address: `{value}`"),
            Self::EmptyDisplayName => write!(f, "display name cannot be empty"),
            Self::EmptyPassword => write!(f, "password cannot be empty"),
        }
    }
}

impl Error for UserValidationError {}

/// Normalized email address used as the login identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Parses and normalizes raw user input.
    ///
    /// Accepts exactly one `@` with non-empty, whitespace-free sides.
    pub fn parse(raw: &str) -> Result<Self, UserValidationError> {
        let normalized = raw.trim().to_lowercase();
        if !EMAIL_RE.is_match(&normalized) {
            return Err(UserValidationError::InvalidEmailAddress(raw.to_string()));
        }
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for EmailAddress {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// User read model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(skip)]
    pub id: UserId,
    pub display_name: String,
    pub email_address: EmailAddress,
    /// Argon2 PHC string.
    #[serde(skip)]
    pub password_hash: String,
}

/// Users keyed by id; serializes as an object keyed by stringified id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct UsersById(BTreeMap<UserId, User>);

impl UsersById {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

impl Deref for UsersById {
    type Target = BTreeMap<UserId, User>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromIterator<User> for UsersById {
    fn from_iter<I: IntoIterator<Item = User>>(iter: I) -> Self {
        Self(iter.into_iter().map(|user| (user.id, user)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::{EmailAddress, User, UserId, UserValidationError, UsersById};

    #[test]
    fn email_is_trimmed_and_lowercased() {
        let email = EmailAddress::parse("  Bob@Example.COM ").unwrap();
        assert_eq!(email.as_str(), "bob@example.com");
    }

    #[test]
    fn email_without_single_at_is_rejected() {
        for raw in ["", "bob", "bob@", "@example.com", "a@b@c", "bo b@example.com"] {
            assert!(
                matches!(
                    EmailAddress::parse(raw),
                    Err(UserValidationError::InvalidEmailAddress(_))
                ),
                "`{raw}` should be rejected"
            );
        }
    }

    #[test]
    fn users_json_hides_credentials_and_stringifies_ids() {
        let users: UsersById = [User {
            id: UserId(3),
            display_name: "bob".to_string(),
            email_address: EmailAddress::parse("bob@example.com").unwrap(),
            password_hash: "$argon2id$secret".to_string(),
        }]
        .into_iter()
        .collect();

        let value: serde_json::Value = serde_json::from_str(&users.to_json().unwrap()).unwrap();
        assert_eq!(value["3"]["displayName"], "bob");
        assert_eq!(value["3"]["emailAddress"], "bob@example.com");
        assert!(value["3"].get("passwordHash").is_none());
    }
}
