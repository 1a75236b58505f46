//! In-memory [`Storage`] implementation.
//!
//! Backs the test suite and embedded callers. The pending-reset table is a
//! map keyed by public ID mutated under one lock, so insert-if-absent is
//! atomic and the uniqueness constraint holds under concurrent requests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{Storage, StorageError};
use crate::entity::{Company, User};
use crate::reset::PasswordResetRequest;

#[derive(Default)]
pub struct MemoryStorage {
    users: Mutex<HashMap<String, User>>,
    companies: Mutex<HashMap<String, Company>>,
    resets: Mutex<HashMap<String, PasswordResetRequest>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn users(&self) -> std::sync::MutexGuard<'_, HashMap<String, User>> {
        self.users.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn companies(&self) -> std::sync::MutexGuard<'_, HashMap<String, Company>> {
        self.companies
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn resets(&self) -> std::sync::MutexGuard<'_, HashMap<String, PasswordResetRequest>> {
        self.resets
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn user_by_public_id(&self, public_id: &str) -> Result<User, StorageError> {
        self.users()
            .get(public_id)
            .cloned()
            .ok_or(StorageError::NotFound)
    }

    async fn user_by_email(&self, email: &str) -> Result<User, StorageError> {
        self.users()
            .values()
            .find(|user| user.email == email)
            .cloned()
            .ok_or(StorageError::NotFound)
    }

    async fn save_user(&self, user: &User) -> Result<(), StorageError> {
        self.users()
            .insert(user.identity.public_id.clone(), user.clone());
        Ok(())
    }

    async fn delete_user(&self, public_id: &str) -> Result<(), StorageError> {
        self.users()
            .remove(public_id)
            .map(|_| ())
            .ok_or(StorageError::NotFound)
    }

    async fn company_by_public_id(&self, public_id: &str) -> Result<Company, StorageError> {
        self.companies()
            .get(public_id)
            .cloned()
            .ok_or(StorageError::NotFound)
    }

    async fn save_company(&self, company: &Company) -> Result<(), StorageError> {
        self.companies()
            .insert(company.identity.public_id.clone(), company.clone());
        Ok(())
    }

    async fn delete_company(&self, public_id: &str) -> Result<(), StorageError> {
        self.companies()
            .remove(public_id)
            .map(|_| ())
            .ok_or(StorageError::NotFound)
    }

    async fn pending_reset(&self, public_id: &str) -> Result<PasswordResetRequest, StorageError> {
        self.resets()
            .get(public_id)
            .cloned()
            .ok_or(StorageError::NotFound)
    }

    async fn save_pending_reset(
        &self,
        request: &PasswordResetRequest,
    ) -> Result<(), StorageError> {
        match self.resets().entry(request.public_id.clone()) {
            std::collections::hash_map::Entry::Occupied(_) => Err(StorageError::Conflict),
            std::collections::hash_map::Entry::Vacant(slot) => {
                slot.insert(request.clone());
                Ok(())
            }
        }
    }

    async fn delete_pending_reset(&self, id: Uuid) -> Result<(), StorageError> {
        self.resets().retain(|_, request| request.id != id);
        Ok(())
    }

    async fn delete_expired_resets(&self, before: DateTime<Utc>) -> Result<(), StorageError> {
        self.resets()
            .retain(|_, request| request.expires_at > before);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn request(public_id: &str, expires_at: DateTime<Utc>) -> PasswordResetRequest {
        PasswordResetRequest {
            id: Uuid::new_v4(),
            public_id: public_id.to_string(),
            reset_token: "token".to_string(),
            expires_at,
        }
    }

    #[tokio::test]
    async fn pending_reset_insert_is_unique_per_identity() {
        let storage = MemoryStorage::new();
        let first = request("alice", Utc::now() + Duration::hours(24));
        let second = request("alice", Utc::now() + Duration::hours(24));

        storage.save_pending_reset(&first).await.unwrap();
        assert!(matches!(
            storage.save_pending_reset(&second).await,
            Err(StorageError::Conflict)
        ));

        // A different identity is unaffected.
        storage
            .save_pending_reset(&request("bob", Utc::now() + Duration::hours(24)))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn delete_expired_sweeps_only_past_expiries() {
        let storage = MemoryStorage::new();
        let now = Utc::now();
        let expired = request("alice", now - Duration::minutes(1));
        let live = request("bob", now + Duration::hours(1));

        storage.save_pending_reset(&expired).await.unwrap();
        storage.save_pending_reset(&live).await.unwrap();
        storage.delete_expired_resets(now).await.unwrap();

        assert!(matches!(
            storage.pending_reset("alice").await,
            Err(StorageError::NotFound)
        ));
        assert!(storage.pending_reset("bob").await.is_ok());
    }

    #[tokio::test]
    async fn delete_pending_reset_by_id_is_idempotent() {
        let storage = MemoryStorage::new();
        let req = request("alice", Utc::now() + Duration::hours(1));
        storage.save_pending_reset(&req).await.unwrap();

        storage.delete_pending_reset(req.id).await.unwrap();
        storage.delete_pending_reset(req.id).await.unwrap();
        assert!(matches!(
            storage.pending_reset("alice").await,
            Err(StorageError::NotFound)
        ));
    }
}
