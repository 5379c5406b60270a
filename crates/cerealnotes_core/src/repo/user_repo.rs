//! Identity repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist users with Argon2 credential hashes.
//! - Check credentials without revealing which half was wrong.
//!
//! # Invariants
//! - Email addresses are stored normalized and are unique.
//! - Plaintext passwords never reach SQL.
//! - Unknown emails still pay for one Argon2 verification.

use crate::credentials::{hash_password, verify_password_or_dummy};
use crate::model::user::{EmailAddress, User, UserId, UsersById};
use crate::repo::{ensure_tables, RecordRef, RepoError, RepoResult};
use log::{info, warn};
use rusqlite::{params, Connection, OptionalExtension, Row};

/// Repository interface for account management.
pub trait UserRepository {
    /// Stores a new user, hashing `password`; returns the assigned id.
    fn store_new_user(
        &self,
        display_name: &str,
        email: &EmailAddress,
        password: &str,
    ) -> RepoResult<UserId>;
    /// Fails with `CredentialsNotAuthorized` on unknown email or wrong password.
    fn authenticate_user_credentials(&self, email: &EmailAddress, password: &str)
        -> RepoResult<()>;
    fn get_id_for_user_with_email_address(&self, email: &EmailAddress) -> RepoResult<UserId>;
    fn get_all_users_by_id(&self) -> RepoResult<UsersById>;
}

/// SQLite-backed identity repository.
pub struct SqliteUserRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteUserRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_tables(conn, &["app_user"])?;
        Ok(Self { conn })
    }
}

impl UserRepository for SqliteUserRepository<'_> {
    fn store_new_user(
        &self,
        display_name: &str,
        email: &EmailAddress,
        password: &str,
    ) -> RepoResult<UserId> {
        let password_hash = hash_password(password)?;
        self.conn.execute(
            "INSERT INTO app_user (display_name, email_address, password_hash)
             VALUES (?1, ?2, ?3);",
            params![display_name, email.as_str(), password_hash],
        )?;
        let user_id = UserId(self.conn.last_insert_rowid());
        info!("event=user_store module=repo status=ok user_id={user_id}");
        Ok(user_id)
    }

    fn authenticate_user_credentials(
        &self,
        email: &EmailAddress,
        password: &str,
    ) -> RepoResult<()> {
        let stored_hash: Option<String> = self
            .conn
            .query_row(
                "SELECT password_hash FROM app_user WHERE email_address = ?1;",
                [email.as_str()],
                |row| row.get(0),
            )
            .optional()?;

        let authorized = verify_password_or_dummy(password, stored_hash.as_deref())?;

        if !authorized {
            warn!("event=user_authenticate module=repo status=error error_code=credentials_not_authorized");
            return Err(RepoError::CredentialsNotAuthorized);
        }
        Ok(())
    }

    fn get_id_for_user_with_email_address(&self, email: &EmailAddress) -> RepoResult<UserId> {
        self.conn
            .query_row(
                "SELECT id FROM app_user WHERE email_address = ?1;",
                [email.as_str()],
                |row| row.get(0).map(UserId),
            )
            .optional()?
            .ok_or_else(|| RepoError::NotFound(RecordRef::UserEmail(email.clone())))
    }

    fn get_all_users_by_id(&self) -> RepoResult<UsersById> {
        let mut stmt = self.conn.prepare(
            "SELECT id, display_name, email_address, password_hash
             FROM app_user
             ORDER BY id ASC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut users = Vec::new();
        while let Some(row) = rows.next()? {
            users.push(parse_user_row(row)?);
        }
        Ok(users.into_iter().collect())
    }
}

fn parse_user_row(row: &Row<'_>) -> RepoResult<User> {
    let raw_email: String = row.get("email_address")?;
    let email_address = EmailAddress::parse(&raw_email).map_err(|err| {
        RepoError::InvalidData(format!("app_user.email_address: {err}"))
    })?;
    Ok(User {
        id: UserId(row.get("id")?),
        display_name: row.get("display_name")?,
        email_address,
        password_hash: row.get("password_hash")?,
    })
}
