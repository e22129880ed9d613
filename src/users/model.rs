use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::auth::password::hash_password_blocking;

/// Number of avatar placeholder colors the client knows about.
pub const PALETTE_SIZE: i32 = 4;

/// User record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String, // argon2 PHC string, never exposed
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub color: Option<i32>,
    pub image: Option<String>,
    pub profile_setup: bool,
}

/// A user about to be inserted. The password is hashed on construction.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
}

impl NewUser {
    pub async fn new(email: &str, password: &str) -> anyhow::Result<Self> {
        Ok(Self {
            id: Uuid::new_v4(),
            email: email.to_string(),
            password_hash: hash_password_blocking(password.to_string()).await?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct ProfileUpdate {
    pub first_name: String,
    pub last_name: String,
    /// `None` keeps the stored color.
    pub color: Option<i32>,
}
