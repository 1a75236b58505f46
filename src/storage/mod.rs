//! Storage collaborator interface.
//!
//! The core performs no I/O of its own; every load and save goes through
//! this trait. Backend errors are propagated verbatim and never retried
//! here. Implementations must provide read-your-writes consistency and an
//! atomic insert for pending reset requests (uniqueness on the identity's
//! public ID), which is what makes the single-pending-reset invariant hold
//! under concurrent callers.

pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::entity::{Company, User};
use crate::reset::PasswordResetRequest;

pub use crate::error::StorageError;
pub use memory::MemoryStorage;

#[async_trait]
pub trait Storage: Send + Sync {
    /// # Errors
    /// [`StorageError::NotFound`] when no user matches.
    async fn user_by_public_id(&self, public_id: &str) -> Result<User, StorageError>;

    /// # Errors
    /// [`StorageError::NotFound`] when no user matches.
    async fn user_by_email(&self, email: &str) -> Result<User, StorageError>;

    /// Insert or replace a user record keyed by its public ID.
    ///
    /// # Errors
    /// Backend failures only.
    async fn save_user(&self, user: &User) -> Result<(), StorageError>;

    /// # Errors
    /// [`StorageError::NotFound`] when no user matches.
    async fn delete_user(&self, public_id: &str) -> Result<(), StorageError>;

    /// # Errors
    /// [`StorageError::NotFound`] when no company matches.
    async fn company_by_public_id(&self, public_id: &str) -> Result<Company, StorageError>;

    /// Insert or replace a company record keyed by its public ID.
    ///
    /// # Errors
    /// Backend failures only.
    async fn save_company(&self, company: &Company) -> Result<(), StorageError>;

    /// # Errors
    /// [`StorageError::NotFound`] when no company matches.
    async fn delete_company(&self, public_id: &str) -> Result<(), StorageError>;

    /// Load the pending reset request for an identity, expired or not.
    ///
    /// # Errors
    /// [`StorageError::NotFound`] when none exists.
    async fn pending_reset(&self, public_id: &str) -> Result<PasswordResetRequest, StorageError>;

    /// Atomically insert a pending reset request.
    ///
    /// # Errors
    /// [`StorageError::Conflict`] when a request already exists for the
    /// identity; the caller maps this to the pending-reset error.
    async fn save_pending_reset(&self, request: &PasswordResetRequest)
        -> Result<(), StorageError>;

    /// Delete a reset request by its ID. Deleting a missing request is not
    /// an error.
    async fn delete_pending_reset(&self, id: Uuid) -> Result<(), StorageError>;

    /// Delete every reset request whose expiry is at or before `before`.
    async fn delete_expired_resets(&self, before: DateTime<Utc>) -> Result<(), StorageError>;
}
