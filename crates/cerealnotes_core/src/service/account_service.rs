//! Account use-case service.
//!
//! # Responsibility
//! - Validate and normalize sign-up input.
//! - Resolve credentials to a user id for the session layer.
//!
//! # Invariants
//! - Malformed email, unknown email and wrong password all fail with the
//!   same `CredentialsNotAuthorized` error.

use crate::model::user::{EmailAddress, UserId, UserValidationError, UsersById};
use crate::repo::user_repo::UserRepository;
use crate::repo::{RepoError, RepoResult};
use crate::session::{Credentials, SessionVerifier};
use log::debug;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for account use-cases.
#[derive(Debug)]
pub enum AccountServiceError {
    Validation(UserValidationError),
    CredentialsNotAuthorized,
    Repo(RepoError),
}

impl AccountServiceError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "invalid_input",
            Self::CredentialsNotAuthorized => "credentials_not_authorized",
            Self::Repo(err) => err.code(),
        }
    }
}

impl Display for AccountServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::CredentialsNotAuthorized => write!(f, "credentials not authorized"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for AccountServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::CredentialsNotAuthorized => None,
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<RepoError> for AccountServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::CredentialsNotAuthorized => Self::CredentialsNotAuthorized,
            other => Self::Repo(other),
        }
    }
}

impl From<UserValidationError> for AccountServiceError {
    fn from(value: UserValidationError) -> Self {
        Self::Validation(value)
    }
}

/// Account service facade over a user repository.
pub struct AccountService<R: UserRepository> {
    repo: R,
}

impl<R: UserRepository> AccountService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Registers a user and returns the assigned id.
    pub fn sign_up(
        &self,
        display_name: &str,
        email: &str,
        password: &str,
    ) -> Result<UserId, AccountServiceError> {
        let display_name = display_name.trim();
        if display_name.is_empty() {
            return Err(UserValidationError::EmptyDisplayName.into());
        }
        if password.is_empty() {
            return Err(UserValidationError::EmptyPassword.into());
        }
        let email = EmailAddress::parse(email)?;
        Ok(self.repo.store_new_user(display_name, &email, password)?)
    }

    /// Checks credentials and returns the matching user id.
    pub fn authenticate(&self, email: &str, password: &str) -> Result<UserId, AccountServiceError> {
        let email =
            EmailAddress::parse(email).map_err(|_| AccountServiceError::CredentialsNotAuthorized)?;
        self.repo.authenticate_user_credentials(&email, password)?;
        Ok(self.repo.get_id_for_user_with_email_address(&email)?)
    }

    pub fn user_id_for_email(&self, email: &str) -> Result<UserId, AccountServiceError> {
        let email = EmailAddress::parse(email)?;
        Ok(self.repo.get_id_for_user_with_email_address(&email)?)
    }

    pub fn users_by_id(&self) -> RepoResult<UsersById> {
        self.repo.get_all_users_by_id()
    }
}

impl<R: UserRepository> SessionVerifier for AccountService<R> {
    fn verify(&self, credentials: &Credentials) -> Option<UserId> {
        match self.authenticate(&credentials.email, &credentials.password) {
            Ok(user_id) => Some(user_id),
            Err(err) => {
                debug!(
                    "event=session_verify module=service status=error error_code={}",
                    err.code()
                );
                None
            }
        }
    }
}
