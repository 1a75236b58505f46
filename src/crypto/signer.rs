//! Identity-bound bearer token signing.
//!
//! Tokens are HMAC-SHA256 digests keyed by a deterministic per-identity salt
//! (`public_id:private_id:created_at`), taken over the entity's signing
//! secret, then base64-encoded. The salt binding is the multi-tenant
//! isolation mechanism: identical secrets under different identities never
//! produce interchangeable tokens.

use std::fmt;

use base64ct::{Base64, Encoding};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::entity::{Credentialed, Identity, SigningSecret};
use crate::error::AuthError;

type HmacSha256 = Hmac<Sha256>;

/// Fixed salt timestamp format; any change invalidates every issued token.
const SALT_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6fZ";

/// An issued bearer token. Opaque to callers; the internal structure is
/// never part of the contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Token(String);

impl Token {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Placeholder used while assembling a record before the first signing.
    pub(crate) fn unset() -> Self {
        Self(String::new())
    }
}

impl From<String> for Token {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Derive the deterministic signing salt for an identity.
///
/// # Errors
/// Returns the generic credential error if either ID is unset, which guards
/// against signing a not-yet-persisted entity.
pub fn salt(identity: &Identity) -> Result<Vec<u8>, AuthError> {
    if identity.public_id.is_empty() || identity.private_id.is_empty() {
        return Err(AuthError::InvalidCredentials);
    }

    let stamp = identity.created_at.format(SALT_TIME_FORMAT);
    Ok(format!("{}:{}:{stamp}", identity.public_id, identity.private_id).into_bytes())
}

/// Sign a token for the identity over the given secret material.
///
/// # Errors
/// Fails with the generic credential error if the identity or secret is
/// incomplete; [`AuthError::Hashing`] if the MAC backend rejects the key.
pub fn sign(identity: &Identity, secret: &SigningSecret) -> Result<Token, AuthError> {
    let key = salt(identity)?;
    let mut mac = HmacSha256::new_from_slice(&key)
        .map_err(|err| AuthError::Hashing(err.to_string()))?;
    mac.update(secret.material()?);

    Ok(Token(Base64::encode_string(&mac.finalize().into_bytes())))
}

/// Verify a presented token against a freshly computed signature.
///
/// Never errors: empty input, base64 decode failure, an incomplete identity,
/// or a digest mismatch all yield `false`. Comparison is constant-time.
#[must_use]
pub fn verify(identity: &Identity, secret: &SigningSecret, presented: &str) -> bool {
    if presented.is_empty() {
        return false;
    }
    let Ok(decoded) = Base64::decode_vec(presented) else {
        return false;
    };
    let Ok(key) = salt(identity) else {
        return false;
    };
    let Ok(material) = secret.material() else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(&key) else {
        return false;
    };
    mac.update(material);
    mac.verify_slice(&decoded).is_ok()
}

/// Sign a token for any credentialed entity.
///
/// # Errors
/// See [`sign`].
pub fn token_for<E: Credentialed>(entity: &E) -> Result<Token, AuthError> {
    sign(entity.identity(), &entity.signing_secret())
}

/// Verify a presented token for any credentialed entity.
#[must_use]
pub fn verify_for<E: Credentialed>(entity: &E, presented: &str) -> bool {
    verify(entity.identity(), &entity.signing_secret(), presented)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn identity() -> Identity {
        Identity::generate(Utc::now())
    }

    #[test]
    fn sign_then_verify_round_trips() {
        let id = identity();
        let secret = SigningSecret::TenantKey(id.private_id.clone());
        let token = sign(&id, &secret).unwrap();
        assert!(verify(&id, &secret, token.as_str()));
    }

    #[test]
    fn identical_secrets_do_not_cross_validate() {
        let first = identity();
        let second = identity();
        let secret = SigningSecret::PasswordHash("shared-hash".to_string());

        let token = sign(&first, &secret).unwrap();
        assert!(verify(&first, &secret, token.as_str()));
        assert!(!verify(&second, &secret, token.as_str()));
    }

    #[test]
    fn cloned_created_at_with_different_private_id_fails() {
        let original = identity();
        let clone = Identity {
            public_id: original.public_id.clone(),
            private_id: uuid::Uuid::new_v4().to_string(),
            created_at: original.created_at,
        };
        let secret = SigningSecret::PasswordHash("shared-hash".to_string());

        let token = sign(&original, &secret).unwrap();
        assert!(!verify(&clone, &secret, token.as_str()));
    }

    #[test]
    fn changing_any_salt_input_invalidates_tokens() {
        let id = identity();
        let secret = SigningSecret::PasswordHash("hash".to_string());
        let token = sign(&id, &secret).unwrap();

        let mut shifted = id.clone();
        shifted.created_at = id.created_at + Duration::seconds(1);
        assert!(!verify(&shifted, &secret, token.as_str()));

        let mut renamed = id.clone();
        renamed.public_id = uuid::Uuid::new_v4().to_string();
        assert!(!verify(&renamed, &secret, token.as_str()));
    }

    #[test]
    fn verify_rejects_empty_and_undecodable_input() {
        let id = identity();
        let secret = SigningSecret::TenantKey(id.private_id.clone());
        assert!(!verify(&id, &secret, ""));
        assert!(!verify(&id, &secret, "%%% not base64 %%%"));
    }

    #[test]
    fn incomplete_identity_cannot_sign() {
        let mut id = identity();
        id.private_id.clear();
        let secret = SigningSecret::TenantKey("key".to_string());
        assert!(matches!(
            sign(&id, &secret),
            Err(AuthError::InvalidCredentials)
        ));
    }
}
