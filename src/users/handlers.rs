use axum::extract::rejection::JsonRejection;
use axum::http::{header, HeaderMap, StatusCode};
use axum::extract::State;
use axum::Json;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{instrument, warn};
use url::Url;

use crate::auth::jwt::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;
use crate::users::dto::{
    EmptyResponse, MyUserResponse, PatchMyUserRequest, ResetPasswordRequest,
    SendPasswordRecoveryEmailRequest, SignUpRequest, SignUpResponse, UpdatePasswordRequest,
};
use crate::users::service::{self, PatchUserInput, SignUpInput};

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Reset links are built against the host the client actually called.
fn base_url(headers: &HeaderMap) -> String {
    let scheme = headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("http");
    let host = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("localhost");
    format!("{scheme}://{host}")
}

#[instrument(skip(state, payload))]
pub async fn sign_up(
    State(state): State<AppState>,
    payload: Result<Json<SignUpRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<SignUpResponse>), ApiError> {
    let Json(payload) = payload.map_err(|_| ApiError::InvalidRequestBody)?;

    if !is_valid_email(&payload.email) {
        warn!("sign-up with invalid email");
        return Err(ApiError::InvalidRequestBody);
    }

    let user_id = service::sign_up(
        &state,
        SignUpInput {
            email: payload.email,
            password: payload.password,
            name: payload.name,
            nickname: payload.nickname,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(SignUpResponse { user_id })))
}

#[instrument(skip(state, headers, payload))]
pub async fn send_password_recovery_email(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<SendPasswordRecoveryEmailRequest>, JsonRejection>,
) -> Result<Json<EmptyResponse>, ApiError> {
    let Json(payload) = payload.map_err(|_| ApiError::InvalidRequestBody)?;

    if !is_valid_email(&payload.email) {
        warn!("password recovery with invalid email");
        return Err(ApiError::InvalidRequestBody);
    }

    service::send_password_recovery_email(&state, &base_url(&headers), &payload.email).await?;
    Ok(Json(EmptyResponse {}))
}

#[instrument(skip(state, payload))]
pub async fn reset_password(
    State(state): State<AppState>,
    payload: Result<Json<ResetPasswordRequest>, JsonRejection>,
) -> Result<Json<EmptyResponse>, ApiError> {
    let Json(payload) = payload.map_err(|_| ApiError::InvalidRequestBody)?;
    service::reset_password(&state, &payload.password, &payload.flow_id).await?;
    Ok(Json(EmptyResponse {}))
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<MyUserResponse>, ApiError> {
    let user = service::get_my_user(&state, user_id).await?;
    Ok(Json(MyUserResponse {
        user_id: user.id,
        email: user.email,
        name: user.name,
        nickname: user.nickname,
        profile_image_url: user.profile_image_url,
        bio: user.bio,
        website: user.website,
    }))
}

#[instrument(skip(state, payload))]
pub async fn patch_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    payload: Result<Json<PatchMyUserRequest>, JsonRejection>,
) -> Result<Json<EmptyResponse>, ApiError> {
    let Json(payload) = payload.map_err(|_| ApiError::InvalidRequestBody)?;

    if let Some(website) = payload.website.as_deref() {
        if Url::parse(website).is_err() {
            warn!(user_id, "patch with invalid website url");
            return Err(ApiError::InvalidRequestBody);
        }
    }

    service::patch_user(
        &state,
        user_id,
        PatchUserInput {
            name: payload.name,
            nickname: payload.nickname,
            bio: payload.bio,
            website: payload.website,
        },
    )
    .await?;
    Ok(Json(EmptyResponse {}))
}

#[instrument(skip(state, payload))]
pub async fn update_password(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    payload: Result<Json<UpdatePasswordRequest>, JsonRejection>,
) -> Result<Json<EmptyResponse>, ApiError> {
    let Json(payload) = payload.map_err(|_| ApiError::InvalidRequestBody)?;
    service::update_password(&state, user_id, &payload.curr_password, &payload.new_password)
        .await?;
    Ok(Json(EmptyResponse {}))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_regex_accepts_plausible_addresses() {
        assert!(is_valid_email("user@example.com"));
        assert!(is_valid_email("first.last+tag@sub.example.co"));
    }

    #[test]
    fn email_regex_rejects_malformed_addresses() {
        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email("user@nodot"));
        assert!(!is_valid_email("spaces in@example.com"));
        assert!(!is_valid_email("@example.com"));
    }

    #[test]
    fn base_url_prefers_forwarded_proto() {
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, "api.example.com".parse().unwrap());
        assert_eq!(base_url(&headers), "http://api.example.com");

        headers.insert("x-forwarded-proto", "https".parse().unwrap());
        assert_eq!(base_url(&headers), "https://api.example.com");
    }
}
