//! # Akredi (Credential & Password-Reset Core)
//!
//! `akredi` issues and verifies bearer tokens and passwords for two kinds of
//! credentialed accounts — password-backed users and tenant-key-backed
//! companies — and runs a time-bounded self-service password-reset workflow.
//!
//! ## Token binding
//!
//! Every token is an HMAC keyed by a deterministic per-identity salt
//! (`public_id:private_id:created_at`) over the entity's signing secret:
//! the stored password hash for users, the private ID for companies. The
//! salt binding is the multi-tenant isolation mechanism — identical secrets
//! under different identities never cross-validate, and changing any salt
//! input or the password invalidates every previously issued token.
//!
//! ## Trust boundary
//!
//! - Credential failures surface as one generic error; callers can never
//!   distinguish a missing account from a wrong password or token.
//! - The only projection across the boundary is `to_public`, a pure
//!   function into distinct `PublicUser` / `PublicCompany` types; private
//!   IDs, statuses, and hashes cannot leak back in.
//!
//! ## Reset workflow
//!
//! At most one pending reset request exists per identity. The check before
//! creation is advisory; the storage layer's atomic insert (uniqueness on
//! the public ID) is the arbiter under concurrency, and its conflict maps
//! to the pending-reset error. Requests expire after a TTL (default 24 h)
//! and are purged lazily on the next access.
//!
//! ## I/O model
//!
//! The core is synchronous and stateless in-process; all persistence goes
//! through the injected [`storage::Storage`] collaborator, whose errors are
//! propagated verbatim and never retried here. `tracing` events are emitted
//! but no subscriber is installed.

pub mod crypto;
pub mod entity;
pub mod error;
pub mod reset;
pub mod service;
pub mod storage;

pub use crypto::Token;
pub use entity::{
    Company, CompanyTokenAuth, CompanyUpdate, Credentialed, EntityStatus, Identity, NewCompany,
    NewUser, PublicCompany, PublicUser, SigningSecret, User, UserLogin, UserPasswordChange,
    UserTokenAuth, UserUpdate,
};
pub use error::{AuthError, StorageError};
pub use reset::{PasswordResetRequest, PasswordResetService, ResetConfig, ResetFulfillment};
pub use service::{CompanyService, UserService};
pub use storage::{MemoryStorage, Storage};
