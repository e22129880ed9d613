use axum::async_trait;
use thiserror::Error;
use uuid::Uuid;

use super::model::{NewUser, ProfileUpdate, User};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("email already registered")]
    EmailTaken,

    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

/// Persistence for user records. Methods returning `Option` yield `None`
/// when no record matches the given id.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    /// Must fail with [`StoreError::EmailTaken`] when the email exists,
    /// atomically with respect to concurrent inserts.
    async fn create(&self, user: NewUser) -> Result<User, StoreError>;

    /// Writes the profile fields and marks the profile as set up.
    async fn update_profile(
        &self,
        id: Uuid,
        update: ProfileUpdate,
    ) -> Result<Option<User>, StoreError>;

    /// Replaces the avatar path in one step and returns the one it replaced.
    /// `None` means no such user; `Some(None)` means no avatar was set.
    async fn swap_image(
        &self,
        id: Uuid,
        image: Option<&str>,
    ) -> Result<Option<Option<String>>, StoreError>;
}
