use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, FromRef, Multipart, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{delete, get, post, put},
    Json, Router,
};
use lazy_static::lazy_static;
use regex::Regex;
use time::OffsetDateTime;
use tracing::{info, instrument, warn};

use super::{
    cookie::session_cookie,
    dto::{
        CredentialsRequest, ImageUser, MessageResponse, ProfileUser, SignupUser,
        UpdateProfileRequest, UserEnvelope,
    },
    extractors::Session,
    jwt::JwtKeys,
    password::verify_password_blocking,
};
use crate::{
    error::{ApiError, ApiResult},
    state::AppState,
    storage::avatar_key,
    users::{NewUser, ProfileUpdate, User, PALETTE_SIZE},
};

/// Multipart field carrying the avatar upload.
pub const AVATAR_FIELD: &str = "profile-image";
const MAX_AVATAR_BYTES: usize = 10 * 1024 * 1024;

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
}

pub fn profile_routes() -> Router<AppState> {
    Router::new()
        .route("/user-info", get(user_info))
        .route("/update-profile", put(update_profile))
        .route(
            "/add-profile-image",
            put(add_profile_image).layer(DefaultBodyLimit::max(MAX_AVATAR_BYTES)),
        )
        .route("/remove-profile-image", delete(remove_profile_image))
}

fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn session_cookie_for(state: &AppState, user: &User) -> ApiResult<String> {
    let keys = JwtKeys::from_ref(state);
    let token = keys.issue(&user.email, user.id)?;
    Ok(session_cookie(&state.config.cookie, &token, keys.ttl.as_secs()))
}

#[instrument(skip(state, body))]
pub async fn signup(
    State(state): State<AppState>,
    body: Result<Json<CredentialsRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(payload) = body?;
    let (email, password) = payload
        .fields()
        .ok_or_else(|| ApiError::bad_request("All fields are required"))?;

    if !is_valid_email(email) {
        warn!(email, "invalid email");
        return Err(ApiError::bad_request("Invalid email"));
    }

    if state.users.find_by_email(email).await?.is_some() {
        warn!(email, "email already registered");
        return Err(ApiError::Conflict("User already exists".into()));
    }

    // a concurrent signup can still win the race; the store reports it as EmailTaken
    let user = state.users.create(NewUser::new(email, password).await?).await?;
    let cookie = session_cookie_for(&state, &user)?;

    info!(user_id = %user.id, email = %user.email, "user signed up");
    Ok((
        StatusCode::CREATED,
        [(header::SET_COOKIE, cookie)],
        Json(UserEnvelope::new(SignupUser::from(user))),
    ))
}

#[instrument(skip(state, body))]
pub async fn login(
    State(state): State<AppState>,
    body: Result<Json<CredentialsRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(payload) = body?;
    let (email, password) = payload
        .fields()
        .ok_or_else(|| ApiError::bad_request("All fields are required"))?;

    let Some(user) = state.users.find_by_email(email).await? else {
        warn!(email, "login unknown email");
        return Err(ApiError::not_found("User not exists"));
    };

    if !verify_password_blocking(password.to_string(), user.password_hash.clone()).await? {
        warn!(user_id = %user.id, "login invalid password");
        return Err(ApiError::bad_request("Password is incorrect"));
    }

    let cookie = session_cookie_for(&state, &user)?;

    info!(user_id = %user.id, "user logged in");
    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(UserEnvelope::new(ProfileUser::from(user))),
    ))
}

#[instrument(skip(state, session), fields(user_id = %session.user_id, email = %session.email))]
pub async fn user_info(
    State(state): State<AppState>,
    session: Session,
) -> ApiResult<Json<UserEnvelope<ProfileUser>>> {
    let user = state
        .users
        .find_by_id(session.user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    Ok(Json(UserEnvelope::new(user.into())))
}

#[instrument(skip(state, session, body), fields(user_id = %session.user_id))]
pub async fn update_profile(
    State(state): State<AppState>,
    session: Session,
    body: Result<Json<UpdateProfileRequest>, JsonRejection>,
) -> ApiResult<Json<UserEnvelope<ProfileUser>>> {
    let Json(payload) = body?;
    let non_empty = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
    let (Some(first_name), Some(last_name)) =
        (non_empty(payload.first_name), non_empty(payload.last_name))
    else {
        return Err(ApiError::bad_request(
            "First name and last name are required",
        ));
    };

    if let Some(color) = payload.color {
        if !(0..PALETTE_SIZE).contains(&color) {
            return Err(ApiError::bad_request(format!(
                "Color must be between 0 and {}",
                PALETTE_SIZE - 1
            )));
        }
    }

    let update = ProfileUpdate {
        first_name,
        last_name,
        color: payload.color,
    };
    let user = state
        .users
        .update_profile(session.user_id, update)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    info!("profile updated");
    Ok(Json(UserEnvelope::new(user.into())))
}

#[instrument(skip(state, session, multipart), fields(user_id = %session.user_id))]
pub async fn add_profile_image(
    State(state): State<AppState>,
    session: Session,
    mut multipart: Multipart,
) -> ApiResult<Json<UserEnvelope<ImageUser>>> {
    let mut upload = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(AVATAR_FIELD) {
            continue;
        }
        let file_name = field.file_name().map(str::to_string);
        let body = field.bytes().await?;
        upload = Some((file_name, body));
        break;
    }

    let uploaded_at = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
    let (key, body) = upload
        .and_then(|(name, body)| Some((avatar_key(uploaded_at, name.as_deref()?)?, body)))
        .ok_or_else(|| ApiError::bad_request("File is required"))?;

    if state.users.find_by_id(session.user_id).await?.is_none() {
        return Err(ApiError::not_found("User not found"));
    }

    // file first, then the record, so the record never points at a missing file
    state.storage.put_object(&key, body).await?;
    let image = state.storage.public_path(&key);

    // the swap hands each replaced path to exactly one request
    let previous = match state.users.swap_image(session.user_id, Some(&image)).await {
        Ok(Some(previous)) => previous,
        Ok(None) => {
            discard_object(&state, &key).await;
            return Err(ApiError::not_found("User not found"));
        }
        Err(e) => {
            discard_object(&state, &key).await;
            return Err(e.into());
        }
    };

    if let Some(old_key) = previous
        .as_deref()
        .filter(|old| *old != image)
        .and_then(|old| state.storage.key_from_public_path(old))
    {
        discard_object(&state, old_key).await;
    }

    info!(image = %image, "profile image added");
    Ok(Json(UserEnvelope::new(ImageUser { image })))
}

#[instrument(skip(state, session), fields(user_id = %session.user_id))]
pub async fn remove_profile_image(
    State(state): State<AppState>,
    session: Session,
) -> ApiResult<Json<MessageResponse>> {
    let user = state
        .users
        .find_by_id(session.user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    if let Some(image) = user.image.as_deref() {
        match state.storage.key_from_public_path(image) {
            Some(key) => state.storage.delete_object(key).await?,
            None => warn!(image, "image outside uploads dir, clearing reference only"),
        }
        let previous = state
            .users
            .swap_image(user.id, None)
            .await?
            .ok_or_else(|| ApiError::not_found("User not found"))?;
        // an upload may have landed between the read and the swap
        if let Some(other_key) = previous
            .as_deref()
            .filter(|p| *p != image)
            .and_then(|p| state.storage.key_from_public_path(p))
        {
            discard_object(&state, other_key).await;
        }
        info!("profile image removed");
    }

    Ok(Json(MessageResponse {
        msg: "Profile image removed successfully".into(),
    }))
}

/// Best-effort removal of an object that is no longer referenced.
async fn discard_object(state: &AppState, key: &str) {
    if let Err(e) = state.storage.delete_object(key).await {
        warn!(error = %e, key, "failed to discard avatar file");
    }
}

#[cfg(test)]
mod tests {
    use super::is_valid_email;

    #[test]
    fn email_shape() {
        assert!(is_valid_email("a@x.com"));
        assert!(is_valid_email("First.Last+tag@Example.org"));
        assert!(!is_valid_email("a@x"));
        assert!(!is_valid_email("no-at.com"));
        assert!(!is_valid_email("a b@x.com"));
    }
}
