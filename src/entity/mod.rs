//! Credentialed entities and the material that binds them to tokens.

pub mod company;
pub mod password;
pub mod user;

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AuthError;

pub use company::{Company, CompanyTokenAuth, CompanyUpdate, NewCompany, PublicCompany};
pub use password::{validate_password, validate_password_pair};
pub use user::{
    NewUser, PublicUser, User, UserLogin, UserPasswordChange, UserTokenAuth, UserUpdate,
};

/// The immutable public/private ID pair naming an account.
///
/// All three fields feed the token-signing salt; changing any of them
/// invalidates every previously issued token for the identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
    pub public_id: String,
    pub private_id: String,
    pub created_at: DateTime<Utc>,
}

impl Identity {
    /// Mint a fresh identity with distinct random IDs.
    pub(crate) fn generate(created_at: DateTime<Utc>) -> Self {
        Self {
            public_id: Uuid::new_v4().to_string(),
            private_id: Uuid::new_v4().to_string(),
            created_at,
        }
    }

    /// Both IDs present and mutually distinct.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.public_id.is_empty()
            && !self.private_id.is_empty()
            && self.public_id != self.private_id
    }
}

/// Lifecycle status of a credentialed entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityStatus {
    Inactive,
    Active,
    Disabled,
    Destroyed,
}

/// Signing material for token issuance.
///
/// Password-backed entities sign over their stored password hash, so a
/// password change rotates the token. Tenant-key-backed entities sign over
/// the private ID itself.
#[derive(Clone)]
pub enum SigningSecret {
    PasswordHash(String),
    TenantKey(String),
}

impl SigningSecret {
    /// Raw bytes fed into the MAC.
    ///
    /// # Errors
    /// Returns the generic credential error when the material is empty,
    /// which means the entity was never fully credentialed.
    pub fn material(&self) -> Result<&[u8], AuthError> {
        let bytes = match self {
            Self::PasswordHash(hash) => hash.as_bytes(),
            Self::TenantKey(key) => key.as_bytes(),
        };
        if bytes.is_empty() {
            return Err(AuthError::InvalidCredentials);
        }
        Ok(bytes)
    }
}

impl fmt::Debug for SigningSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let variant = match self {
            Self::PasswordHash(_) => "PasswordHash",
            Self::TenantKey(_) => "TenantKey",
        };
        f.debug_tuple(variant).field(&"[REDACTED]").finish()
    }
}

/// Capability shared by entities that can be issued bearer tokens.
pub trait Credentialed {
    fn identity(&self) -> &Identity;
    fn signing_secret(&self) -> SigningSecret;
}
