//! In-process user store for tests.

use std::collections::HashMap;

use axum::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::model::{NewUser, ProfileUpdate, User};
use super::store::{StoreError, UserStore};

#[derive(Default)]
pub struct MemoryUserStore {
    users: RwLock<HashMap<Uuid, User>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops a record behind the service's back.
    pub async fn remove(&self, id: Uuid) {
        self.users.write().await.remove(&id);
    }

    pub async fn count(&self) -> usize {
        self.users.read().await.len()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn create(&self, user: NewUser) -> Result<User, StoreError> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.email == user.email) {
            return Err(StoreError::EmailTaken);
        }
        let record = User {
            id: user.id,
            email: user.email,
            password_hash: user.password_hash,
            first_name: None,
            last_name: None,
            color: None,
            image: None,
            profile_setup: false,
        };
        users.insert(record.id, record.clone());
        Ok(record)
    }

    async fn update_profile(
        &self,
        id: Uuid,
        update: ProfileUpdate,
    ) -> Result<Option<User>, StoreError> {
        let mut users = self.users.write().await;
        Ok(users.get_mut(&id).map(|u| {
            u.first_name = Some(update.first_name);
            u.last_name = Some(update.last_name);
            if let Some(color) = update.color {
                u.color = Some(color);
            }
            u.profile_setup = true;
            u.clone()
        }))
    }

    async fn swap_image(
        &self,
        id: Uuid,
        image: Option<&str>,
    ) -> Result<Option<Option<String>>, StoreError> {
        let mut users = self.users.write().await;
        Ok(users
            .get_mut(&id)
            .map(|u| std::mem::replace(&mut u.image, image.map(str::to_string))))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[tokio::test]
    async fn concurrent_duplicate_signups_yield_one_record() {
        let store = Arc::new(MemoryUserStore::new());
        let a = NewUser::new("dup@x.com", "pw").await.unwrap();
        let b = NewUser::new("dup@x.com", "pw").await.unwrap();

        let (ra, rb) = tokio::join!(store.create(a), store.create(b));
        let ok = [ra.is_ok(), rb.is_ok()].iter().filter(|v| **v).count();
        assert_eq!(ok, 1);
        assert!(matches!(
            ra.err().or(rb.err()),
            Some(StoreError::EmailTaken)
        ));
        assert_eq!(store.count().await, 1);
    }

    #[tokio::test]
    async fn update_profile_without_color_keeps_existing() {
        let store = MemoryUserStore::new();
        let user = store
            .create(NewUser::new("c@x.com", "pw").await.unwrap())
            .await
            .unwrap();

        let update = ProfileUpdate {
            first_name: "A".into(),
            last_name: "B".into(),
            color: Some(3),
        };
        store.update_profile(user.id, update).await.unwrap();

        let update = ProfileUpdate {
            first_name: "C".into(),
            last_name: "D".into(),
            color: None,
        };
        let updated = store.update_profile(user.id, update).await.unwrap().unwrap();
        assert_eq!(updated.color, Some(3));
        assert_eq!(updated.first_name.as_deref(), Some("C"));
        assert!(updated.profile_setup);
    }

    #[tokio::test]
    async fn missing_user_updates_return_none() {
        let store = MemoryUserStore::new();
        let res = store.swap_image(Uuid::new_v4(), Some("x.png")).await.unwrap();
        assert!(res.is_none());
    }

    #[tokio::test]
    async fn swap_image_hands_back_each_previous_value_once() {
        let store = MemoryUserStore::new();
        let user = store
            .create(NewUser::new("s@x.com", "pw").await.unwrap())
            .await
            .unwrap();

        assert_eq!(store.swap_image(user.id, Some("a.png")).await.unwrap(), Some(None));
        assert_eq!(
            store.swap_image(user.id, Some("b.png")).await.unwrap(),
            Some(Some("a.png".to_string()))
        );
        assert_eq!(
            store.swap_image(user.id, None).await.unwrap(),
            Some(Some("b.png".to_string()))
        );
        let stored = store.find_by_id(user.id).await.unwrap().unwrap();
        assert!(stored.image.is_none());
    }
}
