use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use tracing::warn;
use uuid::Uuid;

use super::{cookie::extract_cookie, jwt::JwtKeys};
use crate::{error::ApiError, state::AppState};

/// Identity of the caller, taken from a verified session cookie.
#[derive(Debug, Clone)]
pub struct Session {
    pub user_id: Uuid,
    pub email: String,
}

#[async_trait]
impl FromRequestParts<AppState> for Session {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_cookie(&parts.headers, &state.config.cookie.name)
            .ok_or(ApiError::Unauthenticated)?;

        let keys = JwtKeys::from_ref(state);
        let claims = keys.verify(&token).map_err(|e| {
            warn!(error = %e, "rejected session token");
            ApiError::Forbidden
        })?;

        Ok(Session {
            user_id: claims.sub,
            email: claims.email,
        })
    }
}
