use anyhow::Context;
use axum::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::model::{NewUser, ProfileUpdate, User};
use super::store::{StoreError, UserStore};

const USER_COLUMNS: &str =
    "id, email, password_hash, first_name, last_name, color, image, profile_setup";

const UNIQUE_VIOLATION: &str = "23505";

#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.db)
        .await
        .context("find user by email")?;
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("find user by id")?;
        Ok(user)
    }

    async fn create(&self, user: NewUser) -> Result<User, StoreError> {
        let res = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (id, email, password_hash)
            VALUES ($1, $2, $3)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.password_hash)
        .fetch_one(&self.db)
        .await;

        match res {
            Ok(u) => Ok(u),
            Err(sqlx::Error::Database(db_err))
                if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) =>
            {
                Err(StoreError::EmailTaken)
            }
            Err(e) => Err(anyhow::Error::new(e).context("insert user").into()),
        }
    }

    async fn update_profile(
        &self,
        id: Uuid,
        update: ProfileUpdate,
    ) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
               SET first_name = $2,
                   last_name = $3,
                   color = COALESCE($4, color),
                   profile_setup = TRUE
             WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&update.first_name)
        .bind(&update.last_name)
        .bind(update.color)
        .fetch_optional(&self.db)
        .await
        .context("update profile")?;
        Ok(user)
    }

    async fn swap_image(
        &self,
        id: Uuid,
        image: Option<&str>,
    ) -> Result<Option<Option<String>>, StoreError> {
        let previous = sqlx::query_scalar::<_, Option<String>>(
            r#"
            UPDATE users AS u
               SET image = $2
              FROM (SELECT id, image FROM users WHERE id = $1 FOR UPDATE) AS old
             WHERE u.id = old.id
            RETURNING old.image
            "#,
        )
        .bind(id)
        .bind(image)
        .fetch_optional(&self.db)
        .await
        .context("swap profile image")?;
        Ok(previous)
    }
}
