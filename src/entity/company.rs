//! Tenant-key-backed company entity.
//!
//! Companies carry no password; their bearer token is signed over the
//! private ID itself, so the token is stable for the life of the identity.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{Credentialed, EntityStatus, Identity, SigningSecret};
use crate::crypto::{signer, Token};
use crate::error::AuthError;

/// A company (tenant) record as persisted by the storage collaborator.
#[derive(Clone, Serialize, Deserialize)]
pub struct Company {
    pub identity: Identity,
    pub name: String,
    pub status: EntityStatus,
    pub config: Map<String, Value>,
    pub token: Token,
    pub modified_at: DateTime<Utc>,
}

impl fmt::Debug for Company {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Company")
            .field("public_id", &self.identity.public_id)
            .field("name", &self.name)
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

/// Payload for creating a new company.
#[derive(Debug, Deserialize)]
pub struct NewCompany {
    pub name: String,
    #[serde(default)]
    pub config: Map<String, Value>,
}

/// Payload for a partial company update. `public_id` must match the record.
#[derive(Debug, Deserialize)]
pub struct CompanyUpdate {
    pub public_id: String,
    pub name: Option<String>,
    pub config: Option<Map<String, Value>>,
}

/// Payload authenticating a company by public ID and token.
#[derive(Debug, Deserialize)]
pub struct CompanyTokenAuth {
    pub public_id: String,
    pub token: String,
}

/// Public projection of a company.
#[derive(Debug, Clone, Serialize)]
pub struct PublicCompany {
    pub public_id: String,
    pub name: String,
    pub token: Token,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<DateTime<Utc>>,
}

impl Company {
    /// Create a fully credentialed company from the payload.
    ///
    /// # Errors
    /// [`AuthError::Hashing`] if the signing primitive fails.
    pub fn create(new_company: &NewCompany) -> Result<Self, AuthError> {
        let now = Utc::now();
        let mut company = Self {
            identity: Identity::generate(now),
            name: new_company.name.clone(),
            status: EntityStatus::Active,
            config: new_company.config.clone(),
            token: Token::unset(),
            modified_at: now,
        };
        company.token = signer::token_for(&company)?;

        Ok(company)
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

    /// Apply a partial update. Identity and token are untouched.
    ///
    /// # Errors
    /// The generic credential error when the public ID does not match or the
    /// record's credentials are not loaded.
    pub fn update(&mut self, update: &CompanyUpdate) -> Result<(), AuthError> {
        if !self.is_credential_loaded() || update.public_id != self.identity.public_id {
            return Err(AuthError::InvalidCredentials);
        }

        if let Some(name) = &update.name {
            self.name.clone_from(name);
        }
        if let Some(config) = &update.config {
            self.config.clone_from(config);
        }
        self.modified_at = Utc::now();

        Ok(())
    }

    /// Project the record into its public view.
    #[must_use]
    pub fn to_public(&self, include_meta: bool) -> PublicCompany {
        PublicCompany {
            public_id: self.identity.public_id.clone(),
            name: self.name.clone(),
            token: self.token.clone(),
            config: include_meta.then(|| self.config.clone()),
            created_at: include_meta.then_some(self.identity.created_at),
            modified_at: include_meta.then_some(self.modified_at),
        }
    }

    #[must_use]
    pub fn is_credential_loaded(&self) -> bool {
        self.identity.is_complete()
            && !self.token.is_empty()
            && self.status == EntityStatus::Active
    }
}

impl Credentialed for Company {
    fn identity(&self) -> &Identity {
        &self.identity
    }

    fn signing_secret(&self) -> SigningSecret {
        SigningSecret::TenantKey(self.identity.private_id.clone())
    }
}
