//! Password-reset lifecycle: single-flight guarantee, TTL expiry, and
//! fulfillment over the in-memory storage backend.

use std::sync::Arc;

use chrono::{Duration, Utc};
use uuid::Uuid;

use akredi::{
    AuthError, MemoryStorage, NewUser, PasswordResetRequest, PasswordResetService, ResetConfig,
    ResetFulfillment, Storage, StorageError, UserLogin, UserService,
};

struct Harness {
    storage: Arc<MemoryStorage>,
    users: UserService,
    resets: PasswordResetService,
}

fn harness() -> Harness {
    let storage = Arc::new(MemoryStorage::new());
    Harness {
        storage: storage.clone(),
        users: UserService::new(storage.clone()),
        resets: PasswordResetService::new(storage, ResetConfig::default()),
    }
}

async fn seed_user(harness: &Harness, email: &str) -> String {
    harness
        .users
        .create(&NewUser {
            first_name: "Josh".to_string(),
            last_name: "Zheng".to_string(),
            email: email.to_string(),
            password: "Ab3#defg".to_string().into(),
            password_confirm: "Ab3#defg".to_string().into(),
        })
        .await
        .unwrap()
        .public_id
}

#[tokio::test]
async fn request_then_fulfill_changes_the_password() {
    let harness = harness();
    let public_id = seed_user(&harness, "zheng@example.com").await;

    let request = harness.resets.request_reset(&public_id).await.unwrap();
    assert!(request.expires_at > Utc::now());

    harness
        .resets
        .fulfill_reset(&ResetFulfillment {
            public_id: public_id.clone(),
            reset_token: request.reset_token,
            password: "Cd4$efgh".to_string().into(),
            password_confirm: "Cd4$efgh".to_string().into(),
        })
        .await
        .unwrap();

    // Consumed: nothing pending, and the new password logs in.
    assert!(matches!(
        harness.storage.pending_reset(&public_id).await,
        Err(StorageError::NotFound)
    ));
    harness
        .users
        .login(&UserLogin {
            email: "zheng@example.com".to_string(),
            password: "Cd4$efgh".to_string().into(),
        })
        .await
        .unwrap();
}

#[tokio::test]
async fn second_request_fails_while_one_is_pending() {
    let harness = harness();
    let public_id = seed_user(&harness, "zheng@example.com").await;

    let first = harness.resets.request_reset(&public_id).await.unwrap();
    let err = harness.resets.request_reset(&public_id).await.unwrap_err();
    assert!(matches!(err, AuthError::PendingResetExists));

    // The original request is untouched.
    let pending = harness.storage.pending_reset(&public_id).await.unwrap();
    assert_eq!(pending.id, first.id);
}

#[tokio::test]
async fn concurrent_requests_leave_exactly_one_pending() {
    let harness = harness();
    let public_id = seed_user(&harness, "zheng@example.com").await;
    let resets = Arc::new(harness.resets);

    let mut handles = Vec::new();
    for _ in 0..8 {
        let resets = resets.clone();
        let public_id = public_id.clone();
        handles.push(tokio::spawn(
            async move { resets.request_reset(&public_id).await },
        ));
    }

    let mut created = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => created += 1,
            Err(AuthError::PendingResetExists) => {}
            Err(err) => panic!("unexpected error: {err}"),
        }
    }

    assert_eq!(created, 1);
    assert!(harness.storage.pending_reset(&public_id).await.is_ok());
}

#[tokio::test]
async fn expired_request_is_purged_and_replaced_on_new_request() {
    let harness = harness();
    let public_id = seed_user(&harness, "zheng@example.com").await;

    let expired = PasswordResetRequest {
        id: Uuid::new_v4(),
        public_id: public_id.clone(),
        reset_token: "stale".to_string(),
        expires_at: Utc::now() - Duration::minutes(1),
    };
    harness.storage.save_pending_reset(&expired).await.unwrap();

    let fresh = harness.resets.request_reset(&public_id).await.unwrap();
    assert_ne!(fresh.id, expired.id);

    let pending = harness.storage.pending_reset(&public_id).await.unwrap();
    assert_eq!(pending.id, fresh.id);
}

#[tokio::test]
async fn fulfilling_an_expired_request_fails_and_purges_it() {
    let harness = harness();
    let public_id = seed_user(&harness, "zheng@example.com").await;

    let expired = PasswordResetRequest {
        id: Uuid::new_v4(),
        public_id: public_id.clone(),
        reset_token: "stale".to_string(),
        expires_at: Utc::now() - Duration::minutes(1),
    };
    harness.storage.save_pending_reset(&expired).await.unwrap();

    let err = harness
        .resets
        .fulfill_reset(&ResetFulfillment {
            public_id: public_id.clone(),
            reset_token: "stale".to_string(),
            password: "Cd4$efgh".to_string().into(),
            password_confirm: "Cd4$efgh".to_string().into(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::ResetExpired));

    // No pending request remains, and the old password still works.
    assert!(matches!(
        harness.storage.pending_reset(&public_id).await,
        Err(StorageError::NotFound)
    ));
    harness
        .users
        .login(&UserLogin {
            email: "zheng@example.com".to_string(),
            password: "Ab3#defg".to_string().into(),
        })
        .await
        .unwrap();
}

#[tokio::test]
async fn wrong_or_missing_token_reports_reset_not_found() {
    let harness = harness();
    let public_id = seed_user(&harness, "zheng@example.com").await;

    // No request open at all.
    let err = harness
        .resets
        .fulfill_reset(&ResetFulfillment {
            public_id: public_id.clone(),
            reset_token: "anything".to_string(),
            password: "Cd4$efgh".to_string().into(),
            password_confirm: "Cd4$efgh".to_string().into(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::ResetNotFound));

    // Open one, then present the wrong token; the request survives.
    let request = harness.resets.request_reset(&public_id).await.unwrap();
    let err = harness
        .resets
        .fulfill_reset(&ResetFulfillment {
            public_id: public_id.clone(),
            reset_token: "not-the-token".to_string(),
            password: "Cd4$efgh".to_string().into(),
            password_confirm: "Cd4$efgh".to_string().into(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::ResetNotFound));
    assert_eq!(
        harness.storage.pending_reset(&public_id).await.unwrap().id,
        request.id
    );
}

#[tokio::test]
async fn validation_runs_before_any_reset_state_is_touched() {
    let harness = harness();
    let public_id = seed_user(&harness, "zheng@example.com").await;
    let request = harness.resets.request_reset(&public_id).await.unwrap();

    let err = harness
        .resets
        .fulfill_reset(&ResetFulfillment {
            public_id: public_id.clone(),
            reset_token: request.reset_token.clone(),
            password: "short".to_string().into(),
            password_confirm: "short".to_string().into(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::InvalidPassword));

    // The pending request is still consumable afterwards.
    harness
        .resets
        .fulfill_reset(&ResetFulfillment {
            public_id,
            reset_token: request.reset_token,
            password: "Cd4$efgh".to_string().into(),
            password_confirm: "Cd4$efgh".to_string().into(),
        })
        .await
        .unwrap();
}

#[tokio::test]
async fn unknown_identity_gets_the_generic_credential_error() {
    let harness = harness();
    let err = harness
        .resets
        .request_reset("no-such-identity")
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::InvalidCredentials));
}
