//! Typed errors for credential and reset operations.
//!
//! Credential failures deliberately collapse into one generic message so a
//! caller can never tell a bad password from a missing account or an unloaded
//! record. Reset-state errors keep distinct messages; they carry no secret
//! material.

use thiserror::Error;

/// Errors surfaced by credential models, services, and the reset workflow.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Password fails the shape policy (length or character classes).
    #[error("invalid password")]
    InvalidPassword,

    /// Password and confirmation do not match.
    #[error("passwords do not match")]
    PasswordMismatch,

    /// The single generic credential failure. Covers bad passwords, bad
    /// tokens, unknown accounts, and records with missing credential fields.
    #[error("invalid authentication credentials")]
    InvalidCredentials,

    /// An unexpired reset request already exists for the identity.
    #[error("a password reset is already pending")]
    PendingResetExists,

    /// No matching reset request exists for the identity.
    #[error("password reset not found")]
    ResetNotFound,

    /// The matching reset request has passed its expiry.
    #[error("password reset expired")]
    ResetExpired,

    /// Hashing or entropy primitive failure. Fatal for the operation,
    /// never retried.
    #[error("hashing failure: {0}")]
    Hashing(String),

    /// Opaque storage failure, propagated verbatim.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors returned by [`Storage`](crate::storage::Storage) implementations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// No record matched the lookup.
    #[error("record not found")]
    NotFound,

    /// A uniqueness constraint rejected the write.
    #[error("conflicting record already exists")]
    Conflict,

    /// Any other backend failure, kept opaque.
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}
