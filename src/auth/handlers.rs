use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRef, Request, State};
use axum::Json;
use tracing::{error, info, instrument, warn};

use crate::auth::dto::{SignInRequest, TokenResponse};
use crate::auth::jwt::{request_token, JwtKeys};
use crate::auth::password::verify_password;
use crate::crypto::hash_email;
use crate::error::ApiError;
use crate::state::AppState;
use crate::users::repo::RepoError;
use crate::users::repo_types::User;

#[instrument(skip(state, payload))]
pub async fn sign_in(
    State(state): State<AppState>,
    payload: Result<Json<SignInRequest>, JsonRejection>,
) -> Result<Json<TokenResponse>, ApiError> {
    let Json(payload) = payload.map_err(|_| ApiError::InvalidRequestBody)?;

    let user = match User::find_by_email_hash(&state.db, &hash_email(&payload.email)).await {
        Ok(user) => user,
        Err(RepoError::NotFound) => {
            warn!("sign-in with unknown email");
            return Err(ApiError::InvalidCredentials);
        }
        Err(e) => return Err(e.into()),
    };

    if !verify_password(&payload.password, &user.password_hash) {
        warn!(user_id = user.id, "sign-in with invalid password");
        return Err(ApiError::InvalidCredentials);
    }

    let keys = JwtKeys::from_ref(&state);
    let signed = keys.sign(user.id).map_err(|e| {
        error!(error = %e, "jwt sign failed");
        ApiError::SigningToken
    })?;

    info!(user_id = user.id, "user signed in");
    Ok(Json(TokenResponse {
        token: signed.token,
        expires_at: signed.expires_at,
    }))
}

/// Issues a fresh token for a still-refreshable one. The incoming token may
/// be expired; it must be inside the max-refresh window anchored at its
/// first issuance.
#[instrument(skip(state, req))]
pub async fn refresh(
    State(state): State<AppState>,
    req: Request,
) -> Result<Json<TokenResponse>, ApiError> {
    let (parts, _) = req.into_parts();
    let token = request_token(&parts).ok_or(ApiError::MissingToken)?;

    let keys = JwtKeys::from_ref(&state);
    let claims = keys.verify_for_refresh(&token).map_err(|e| {
        warn!(error = %e, "token refresh rejected");
        ApiError::InvalidToken
    })?;

    let signed = keys.sign_refreshed(claims.sub, claims.orig_iat).map_err(|e| {
        error!(error = %e, "jwt sign failed");
        ApiError::SigningToken
    })?;

    info!(user_id = claims.sub, "token refreshed");
    Ok(Json(TokenResponse {
        token: signed.token,
        expires_at: signed.expires_at,
    }))
}
