//! Caller-facing operations over credentialed entities.
//!
//! Typed payloads in, public projections out. Every credential or lookup
//! failure collapses into the single generic invalid-credentials error so
//! callers cannot probe for account existence or failure cause. Storage is
//! injected explicitly; these services hold no other state.

use std::sync::Arc;

use secrecy::ExposeSecret;
use tracing::{debug, instrument};

use crate::entity::{
    Company, CompanyTokenAuth, CompanyUpdate, NewCompany, NewUser, PublicCompany, PublicUser,
    User, UserLogin, UserPasswordChange, UserTokenAuth, UserUpdate,
};
use crate::error::{AuthError, StorageError};
use crate::storage::Storage;

/// CRUD and authentication operations for user entities.
pub struct UserService {
    storage: Arc<dyn Storage>,
}

impl UserService {
    #[must_use]
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// Create and persist a new user, returning the public projection with
    /// metadata so the caller sees the issued token and timestamps.
    ///
    /// # Errors
    /// Validation errors from the payload, hashing failures, storage errors
    /// verbatim.
    #[instrument(skip(self, new_user), fields(email = %new_user.email))]
    pub async fn create(&self, new_user: &NewUser) -> Result<PublicUser, AuthError> {
        let user = User::create(new_user)?;
        self.storage.save_user(&user).await?;
        debug!(public_id = %user.identity.public_id, "user created");

        Ok(user.to_public(true))
    }

    /// Apply a partial update to an existing user.
    ///
    /// # Errors
    /// The generic credential error for an unknown or mismatched public ID.
    #[instrument(skip(self, update), fields(public_id = %update.public_id))]
    pub async fn update(&self, update: &UserUpdate) -> Result<PublicUser, AuthError> {
        let mut user = self.load_user(&update.public_id).await?;
        user.update(update)?;
        self.storage.save_user(&user).await?;

        Ok(user.to_public(true))
    }

    /// Remove a user record.
    ///
    /// # Errors
    /// The generic credential error for an unknown public ID.
    #[instrument(skip(self))]
    pub async fn destroy(&self, public_id: &str) -> Result<PublicUser, AuthError> {
        let user = self.load_user(public_id).await?;
        self.storage.delete_user(public_id).await?;
        debug!(public_id, "user destroyed");

        Ok(user.to_public(false))
    }

    /// Authenticate by email and password.
    ///
    /// # Errors
    /// The generic credential error, whether the account is missing or the
    /// password wrong.
    #[instrument(skip(self, login), fields(email = %login.email))]
    pub async fn login(&self, login: &UserLogin) -> Result<PublicUser, AuthError> {
        let user = match self.storage.user_by_email(&login.email).await {
            Ok(user) => user,
            Err(StorageError::NotFound) => return Err(AuthError::InvalidCredentials),
            Err(err) => return Err(err.into()),
        };
        user.authenticate_by_password(login.password.expose_secret())?;

        Ok(user.to_public(false))
    }

    /// Authenticate by public ID and bearer token.
    ///
    /// # Errors
    /// The generic credential error on any failure.
    #[instrument(skip(self, auth), fields(public_id = %auth.public_id))]
    pub async fn authenticate(&self, auth: &UserTokenAuth) -> Result<PublicUser, AuthError> {
        let user = self.load_user(&auth.public_id).await?;
        user.authenticate_by_token(&auth.token)?;

        Ok(user.to_public(false))
    }

    /// Change a user's password and persist the re-signed credential.
    ///
    /// # Errors
    /// Validation errors from the payload, the generic credential error for
    /// an unknown account, storage errors verbatim.
    #[instrument(skip(self, change), fields(public_id = %change.public_id))]
    pub async fn change_password(
        &self,
        change: &UserPasswordChange,
    ) -> Result<PublicUser, AuthError> {
        let mut user = self.load_user(&change.public_id).await?;
        user.change_password(&change.password, &change.password_confirm)?;
        self.storage.save_user(&user).await?;
        debug!(public_id = %change.public_id, "password changed, token rotated");

        Ok(user.to_public(false))
    }

    async fn load_user(&self, public_id: &str) -> Result<User, AuthError> {
        match self.storage.user_by_public_id(public_id).await {
            Ok(user) => Ok(user),
            Err(StorageError::NotFound) => Err(AuthError::InvalidCredentials),
            Err(err) => Err(err.into()),
        }
    }
}

/// CRUD and authentication operations for company (tenant) entities.
pub struct CompanyService {
    storage: Arc<dyn Storage>,
}

impl CompanyService {
    #[must_use]
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// Create and persist a new company.
    ///
    /// # Errors
    /// Hashing failures, storage errors verbatim.
    #[instrument(skip(self, new_company), fields(name = %new_company.name))]
    pub async fn create(&self, new_company: &NewCompany) -> Result<PublicCompany, AuthError> {
        let company = Company::create(new_company)?;
        self.storage.save_company(&company).await?;
        debug!(public_id = %company.identity.public_id, "company created");

        Ok(company.to_public(true))
    }

    /// Apply a partial update to an existing company.
    ///
    /// # Errors
    /// The generic credential error for an unknown or mismatched public ID.
    #[instrument(skip(self, update), fields(public_id = %update.public_id))]
    pub async fn update(&self, update: &CompanyUpdate) -> Result<PublicCompany, AuthError> {
        let mut company = self.load_company(&update.public_id).await?;
        company.update(update)?;
        self.storage.save_company(&company).await?;

        Ok(company.to_public(true))
    }

    /// Authenticate by public ID and bearer token.
    ///
    /// # Errors
    /// The generic credential error on any failure.
    #[instrument(skip(self, auth), fields(public_id = %auth.public_id))]
    pub async fn authenticate(&self, auth: &CompanyTokenAuth) -> Result<PublicCompany, AuthError> {
        let company = self.load_company(&auth.public_id).await?;
        company.authenticate_by_token(&auth.token)?;

        Ok(company.to_public(false))
    }

    /// Remove a company record.
    ///
    /// # Errors
    /// The generic credential error for an unknown public ID.
    #[instrument(skip(self))]
    pub async fn destroy(&self, public_id: &str) -> Result<PublicCompany, AuthError> {
        let company = self.load_company(public_id).await?;
        self.storage.delete_company(public_id).await?;
        debug!(public_id, "company destroyed");

        Ok(company.to_public(false))
    }

    async fn load_company(&self, public_id: &str) -> Result<Company, AuthError> {
        match self.storage.company_by_public_id(public_id).await {
            Ok(company) => Ok(company),
            Err(StorageError::NotFound) => Err(AuthError::InvalidCredentials),
            Err(err) => Err(err.into()),
        }
    }
}
