use serde::{de, Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::users::User;

/// Request body for signup and login. Fields are optional so that a
/// missing field is reported as a bad request by the handler.
#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

impl CredentialsRequest {
    /// Both fields, if present and non-empty.
    pub fn fields(&self) -> Option<(&str, &str)> {
        let email = self.email.as_deref().filter(|s| !s.is_empty())?;
        let password = self.password.as_deref().filter(|s| !s.is_empty())?;
        Some((email, password))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_color")]
    pub color: Option<i32>,
}

/// Accepts both `2` and `"2"`.
fn lenient_color<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Color {
        Number(i32),
        Text(String),
    }

    match Option::<Color>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Color::Number(n)) => Ok(Some(n)),
        Some(Color::Text(s)) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| de::Error::custom(format!("invalid color {s:?}"))),
    }
}

/// `{"user": ...}` envelope used by every user-returning endpoint.
#[derive(Debug, Serialize)]
pub struct UserEnvelope<T> {
    pub user: T,
}

impl<T> UserEnvelope<T> {
    pub fn new(user: T) -> Self {
        Self { user }
    }
}

/// Returned right after signup.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupUser {
    pub id: Uuid,
    pub email: String,
    pub profile_setup: bool,
}

impl From<User> for SignupUser {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            email: u.email,
            profile_setup: u.profile_setup,
        }
    }
}

/// Everything about a user that is safe to send to clients.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUser {
    pub id: Uuid,
    pub email: String,
    pub profile_setup: bool,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub image: Option<String>,
    pub color: Option<i32>,
}

impl From<User> for ProfileUser {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            email: u.email,
            profile_setup: u.profile_setup,
            first_name: u.first_name,
            last_name: u.last_name,
            image: u.image,
            color: u.color,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ImageUser {
    pub image: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub msg: String,
}
