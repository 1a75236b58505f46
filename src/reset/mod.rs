//! Self-service password-reset workflow.
//!
//! Per identity the lifecycle is `NoRequest -> Pending -> {Expired,
//! Fulfilled} -> NoRequest`. At most one pending request may exist at any
//! instant; the storage layer's atomic insert enforces this even when two
//! requests race, and the resulting conflict surfaces as
//! [`AuthError::PendingResetExists`]. Expiry is detected lazily and expired
//! rows are purged on the next access.

use std::sync::Arc;

use base64ct::{Base64UrlUnpadded, Encoding};
use chrono::{DateTime, Duration, Utc};
use rand::{rngs::OsRng, RngCore};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::entity::PublicUser;
use crate::error::{AuthError, StorageError};
use crate::storage::Storage;

const RESET_TOKEN_BYTES: usize = 32;

/// An outstanding password-reset request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PasswordResetRequest {
    pub id: Uuid,
    pub public_id: String,
    pub reset_token: String,
    pub expires_at: DateTime<Utc>,
}

impl PasswordResetRequest {
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Payload consuming a reset request.
#[derive(Debug, Deserialize)]
pub struct ResetFulfillment {
    pub public_id: String,
    pub reset_token: String,
    pub password: SecretString,
    pub password_confirm: SecretString,
}

/// Workflow tuning. The default TTL matches the maximum token lifetime.
#[derive(Debug, Clone, Copy)]
pub struct ResetConfig {
    pub ttl: Duration,
}

impl Default for ResetConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::hours(24),
        }
    }
}

/// Storage-backed password-reset workflow.
pub struct PasswordResetService {
    storage: Arc<dyn Storage>,
    config: ResetConfig,
}

impl PasswordResetService {
    #[must_use]
    pub fn new(storage: Arc<dyn Storage>, config: ResetConfig) -> Self {
        Self { storage, config }
    }

    /// Open a reset request for the identity and return it (the token is
    /// handed to the user out of band; transport is not this crate's
    /// concern).
    ///
    /// An unexpired pending request fails the call with no side effects.
    /// An expired one is purged first, then the new request is created.
    ///
    /// # Errors
    /// [`AuthError::InvalidCredentials`] for an unknown identity (no
    /// account-existence oracle), [`AuthError::PendingResetExists`] while a
    /// request is outstanding, storage errors verbatim.
    #[instrument(skip(self))]
    pub async fn request_reset(&self, public_id: &str) -> Result<PasswordResetRequest, AuthError> {
        let user = match self.storage.user_by_public_id(public_id).await {
            Ok(user) => user,
            Err(StorageError::NotFound) => return Err(AuthError::InvalidCredentials),
            Err(err) => return Err(err.into()),
        };

        let now = Utc::now();
        match self.storage.pending_reset(public_id).await {
            Ok(pending) if !pending.is_expired(now) => {
                debug!(public_id, "reset already pending");
                return Err(AuthError::PendingResetExists);
            }
            Ok(pending) => {
                debug!(public_id, "purging expired reset request");
                self.storage.delete_pending_reset(pending.id).await?;
            }
            Err(StorageError::NotFound) => {}
            Err(err) => return Err(err.into()),
        }

        let request = PasswordResetRequest {
            id: Uuid::new_v4(),
            public_id: user.identity.public_id.clone(),
            reset_token: generate_reset_token()?,
            expires_at: now + self.config.ttl,
        };

        // The check above is advisory only; the insert is the arbiter when
        // two requests race.
        match self.storage.save_pending_reset(&request).await {
            Ok(()) => {
                debug!(public_id, expires_at = %request.expires_at, "reset request created");
                Ok(request)
            }
            Err(StorageError::Conflict) => Err(AuthError::PendingResetExists),
            Err(err) => Err(err.into()),
        }
    }

    /// Consume a reset request and change the user's password.
    ///
    /// On success no pending request remains for the identity, the password
    /// hash is replaced, and a fresh bearer token is issued. An expired
    /// request is purged as a side effect of the failed attempt.
    ///
    /// # Errors
    /// Validation errors first; [`AuthError::ResetNotFound`] when no request
    /// matches the identity and token; [`AuthError::ResetExpired`] past the
    /// TTL; credential/storage errors from the password change itself.
    #[instrument(skip(self, fulfillment), fields(public_id = %fulfillment.public_id))]
    pub async fn fulfill_reset(
        &self,
        fulfillment: &ResetFulfillment,
    ) -> Result<PublicUser, AuthError> {
        crate::entity::validate_password_pair(
            fulfillment.password.expose_secret(),
            fulfillment.password_confirm.expose_secret(),
        )?;

        let pending = match self.storage.pending_reset(&fulfillment.public_id).await {
            Ok(pending) => pending,
            Err(StorageError::NotFound) => return Err(AuthError::ResetNotFound),
            Err(err) => return Err(err.into()),
        };
        if pending.reset_token != fulfillment.reset_token {
            return Err(AuthError::ResetNotFound);
        }

        let now = Utc::now();
        if pending.is_expired(now) {
            self.storage.delete_pending_reset(pending.id).await?;
            debug!("expired reset request purged on fulfill");
            return Err(AuthError::ResetExpired);
        }

        let mut user = match self
            .storage
            .user_by_public_id(&fulfillment.public_id)
            .await
        {
            Ok(user) => user,
            Err(StorageError::NotFound) => return Err(AuthError::InvalidCredentials),
            Err(err) => return Err(err.into()),
        };

        user.change_password(&fulfillment.password, &fulfillment.password_confirm)?;
        self.storage.save_user(&user).await?;

        // Consume the request, then sweep anything else past its expiry.
        self.storage.delete_pending_reset(pending.id).await?;
        self.storage.delete_expired_resets(now).await?;

        debug!("reset fulfilled, token rotated");
        Ok(user.to_public(false))
    }
}

fn generate_reset_token() -> Result<String, AuthError> {
    let mut bytes = [0u8; RESET_TOKEN_BYTES];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|err| AuthError::Hashing(format!("failed to generate reset token: {err}")))?;
    Ok(Base64UrlUnpadded::encode_string(&bytes))
}
