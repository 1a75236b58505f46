//! Password-backed user entity and its credential operations.
//!
//! The stored password hash is derived from `private_id || password`, so a
//! leaked hash cannot be replayed against another tenant's records. Tokens
//! are signed over that hash; changing the password rotates the token.

use std::fmt;

use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use super::password::validate_password_pair;
use super::{Credentialed, EntityStatus, Identity, SigningSecret};
use crate::crypto::{hasher, signer, Token};
use crate::error::AuthError;

/// A user record as persisted by the storage collaborator.
#[derive(Clone, Serialize, Deserialize)]
pub struct User {
    pub identity: Identity,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub status: EntityStatus,
    pub password_hash: String,
    pub token: Token,
    pub modified_at: DateTime<Utc>,
}

// Keep hashes out of logs and error chains.
impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("public_id", &self.identity.public_id)
            .field("email", &self.email)
            .field("status", &self.status)
            .field("password_hash", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

/// Payload for creating a new user.
#[derive(Debug, Deserialize)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: SecretString,
    pub password_confirm: SecretString,
}

/// Payload for a partial user update. `public_id` must match the record.
#[derive(Debug, Deserialize)]
pub struct UserUpdate {
    pub public_id: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
}

/// Payload authenticating by email and password.
#[derive(Debug, Deserialize)]
pub struct UserLogin {
    pub email: String,
    pub password: SecretString,
}

/// Payload authenticating by public ID and bearer token.
#[derive(Debug, Deserialize)]
pub struct UserTokenAuth {
    pub public_id: String,
    pub token: String,
}

/// Payload changing a user's password.
#[derive(Debug, Deserialize)]
pub struct UserPasswordChange {
    pub public_id: String,
    pub password: SecretString,
    pub password_confirm: SecretString,
}

/// Public projection of a user, the sole shape crossing the trust boundary.
///
/// Produced by [`User::to_public`]; there is deliberately no way back from a
/// projection to a full record, so stripped fields can never leak in again.
#[derive(Debug, Clone, Serialize)]
pub struct PublicUser {
    pub public_id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub token: Token,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<DateTime<Utc>>,
}

impl User {
    /// Create a fully credentialed user from the payload.
    ///
    /// Validates the password pair, mints a fresh identity, hashes the
    /// salted password, and signs the first token.
    ///
    /// # Errors
    /// [`AuthError::PasswordMismatch`] or [`AuthError::InvalidPassword`] on
    /// payload problems, [`AuthError::Hashing`] on primitive failure.
    pub fn create(new_user: &NewUser) -> Result<Self, AuthError> {
        validate_password_pair(
            new_user.password.expose_secret(),
            new_user.password_confirm.expose_secret(),
        )?;

        let now = Utc::now();
        let identity = Identity::generate(now);
        let password_hash = hasher::hash_secret(
            password_material(&identity.private_id, new_user.password.expose_secret()).as_bytes(),
        )?;

        let mut user = Self {
            identity,
            email: new_user.email.clone(),
            first_name: new_user.first_name.clone(),
            last_name: new_user.last_name.clone(),
            status: EntityStatus::Active,
            password_hash,
            token: Token::unset(),
            modified_at: now,
        };
        user.refresh_token()?;

        Ok(user)
    }

    /// Verify a password against the stored hash.
    ///
    /// # Errors
    /// Always the generic [`AuthError::InvalidCredentials`], whether the
    /// password mismatches or the record is missing credential fields.
    pub fn authenticate_by_password(&self, password: &str) -> Result<(), AuthError> {
        if !self.is_credential_loaded() {
            return Err(AuthError::InvalidCredentials);
        }

        let material = password_material(&self.identity.private_id, password);
        if hasher::verify_secret(material.as_bytes(), &self.password_hash) {
            Ok(())
        } else {
            Err(AuthError::InvalidCredentials)
        }
    }

    /// Verify a presented bearer token. Empty tokens are rejected up front.
    ///
    /// # Errors
    /// Always the generic [`AuthError::InvalidCredentials`].
    pub fn authenticate_by_token(&self, token: &str) -> Result<(), AuthError> {
        if token.is_empty() || !self.is_credential_loaded() {
            return Err(AuthError::InvalidCredentials);
        }

        if signer::verify_for(self, token) {
            Ok(())
        } else {
            Err(AuthError::InvalidCredentials)
        }
    }

    /// Replace the password, re-sign the token, and bump `modified_at`.
    ///
    /// # Errors
    /// Fails like [`User::create`] on payload problems, or with the generic
    /// credential error when the record's credentials are not loaded.
    pub fn change_password(
        &mut self,
        password: &SecretString,
        confirm: &SecretString,
    ) -> Result<(), AuthError> {
        if !self.is_credential_loaded() {
            return Err(AuthError::InvalidCredentials);
        }
        validate_password_pair(password.expose_secret(), confirm.expose_secret())?;

        self.password_hash = hasher::hash_secret(
            password_material(&self.identity.private_id, password.expose_secret()).as_bytes(),
        )?;
        self.modified_at = Utc::now();
        self.refresh_token()
    }

    /// Apply a partial update. Identity and credential fields are untouched.
    ///
    /// # Errors
    /// The generic credential error when the public ID does not match or the
    /// record's credentials are not loaded.
    pub fn update(&mut self, update: &UserUpdate) -> Result<(), AuthError> {
        if !self.is_credential_loaded() || update.public_id != self.identity.public_id {
            return Err(AuthError::InvalidCredentials);
        }

        if let Some(first_name) = &update.first_name {
            self.first_name.clone_from(first_name);
        }
        if let Some(last_name) = &update.last_name {
            self.last_name.clone_from(last_name);
        }
        if let Some(email) = &update.email {
            self.email.clone_from(email);
        }
        self.modified_at = Utc::now();

        Ok(())
    }

    /// Project the record into its public view.
    ///
    /// Private ID, status, and password hash never appear; timestamps only
    /// when `include_meta` is set.
    #[must_use]
    pub fn to_public(&self, include_meta: bool) -> PublicUser {
        PublicUser {
            public_id: self.identity.public_id.clone(),
            email: self.email.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            token: self.token.clone(),
            created_at: include_meta.then_some(self.identity.created_at),
            modified_at: include_meta.then_some(self.modified_at),
        }
    }

    /// All credential fields populated and the record active.
    #[must_use]
    pub fn is_credential_loaded(&self) -> bool {
        self.identity.is_complete()
            && !self.password_hash.is_empty()
            && !self.token.is_empty()
            && !self.email.is_empty()
            && self.status == EntityStatus::Active
    }

    fn refresh_token(&mut self) -> Result<(), AuthError> {
        self.token = signer::token_for(self)?;
        Ok(())
    }
}

impl Credentialed for User {
    fn identity(&self) -> &Identity {
        &self.identity
    }

    fn signing_secret(&self) -> SigningSecret {
        SigningSecret::PasswordHash(self.password_hash.clone())
    }
}

fn password_material(private_id: &str, password: &str) -> String {
    format!("{private_id}{password}")
}
