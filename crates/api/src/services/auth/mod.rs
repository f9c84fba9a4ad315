//! Authentication service.
//!
//! Password registration plus opaque token login. A token is 20 random bytes,
//! hex-encoded, handed to the client once. Only its SHA-256 digest is stored,
//! so a leaked database does not yield usable tokens.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use rand::Rng;
use sha2::{Digest, Sha256};
use tracing::instrument;

use little_lemon_core::Username;

use crate::db::{RepositoryError, Store};
use crate::models::{Identity, NewUser, User};

/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Maximum email length.
const MAX_EMAIL_LENGTH: usize = 254;

/// Random bytes per token (40 hex characters).
const TOKEN_BYTES: usize = 20;

/// Authentication service.
///
/// Handles user registration and the token lifecycle.
pub struct AuthService<'a> {
    store: &'a dyn Store,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    /// Register a new user with a password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidUsername` or `AuthError::InvalidEmail` for
    /// malformed input, `AuthError::WeakPassword` if the password is too
    /// short, and `AuthError::UserAlreadyExists` if the username is taken.
    #[instrument(skip(self, password, email))]
    pub async fn register(
        &self,
        username: &str,
        password: &str,
        email: Option<&str>,
    ) -> Result<User, AuthError> {
        let username = Username::parse(username)?;
        let email = email.map(parse_email).transpose()?.flatten();
        validate_password(password)?;
        let password_hash = hash_password(password)?;

        let user = self
            .store
            .create_user(&NewUser {
                username,
                email,
                password_hash,
            })
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })?;

        tracing::info!(user_id = %user.id, "user registered");
        Ok(user)
    }

    /// Check a username and password and issue a new token.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the username or password is
    /// wrong.
    #[instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &str) -> Result<String, AuthError> {
        let username = Username::parse(username).map_err(|_| AuthError::InvalidCredentials)?;

        let (user, password_hash) = self
            .store
            .get_password_hash(&username)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &password_hash)?;

        let token = generate_token();
        self.store.store_token(user.id, &token_digest(&token)).await?;

        tracing::info!(user_id = %user.id, "token issued");
        Ok(token)
    }

    /// Revoke a token.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` if the token was not live.
    #[instrument(skip_all)]
    pub async fn logout(&self, token: &str) -> Result<(), AuthError> {
        if self.store.revoke_token(&token_digest(token)).await? {
            Ok(())
        } else {
            Err(AuthError::InvalidToken)
        }
    }

    /// Resolve a token to the identity it was issued to.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` if the token is unknown.
    pub async fn identify(&self, token: &str) -> Result<Identity, AuthError> {
        self.store
            .identify_token(&token_digest(token))
            .await?
            .ok_or(AuthError::InvalidToken)
    }
}

/// Generate a fresh token key.
fn generate_token() -> String {
    let mut key = [0u8; TOKEN_BYTES];
    rand::rng().fill(&mut key);
    hex::encode(key)
}

/// Digest under which a token is stored.
#[must_use]
pub fn token_digest(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

/// Normalize an optional email. Blank input means no email.
fn parse_email(email: &str) -> Result<Option<String>, AuthError> {
    let email = email.trim();
    if email.is_empty() {
        return Ok(None);
    }

    let valid = email.len() <= MAX_EMAIL_LENGTH
        && !email.chars().any(char::is_whitespace)
        && email
            .split_once('@')
            .is_some_and(|(local, domain)| {
                !local.is_empty() && domain.contains('.') && !domain.contains('@')
            });
    if !valid {
        return Err(AuthError::InvalidEmail);
    }

    Ok(Some(email.to_owned()))
}

/// Validate password meets requirements.
///
/// # Errors
///
/// Returns `AuthError::WeakPassword` if the password is too short.
pub fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }

    Ok(())
}

/// Hash a password using Argon2id.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}
