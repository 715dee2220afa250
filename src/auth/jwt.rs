use std::time::Duration;

use axum::async_trait;
use axum::extract::{FromRef, FromRequestParts};
use axum::http::header::{AUTHORIZATION, COOKIE};
use axum::http::request::Parts;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::{debug, warn};

use crate::config::JwtConfig;
use crate::error::ApiError;
use crate::state::AppState;

/// JWT payload. `sub` is the numeric user ID; `orig_iat` is the issuance
/// time of the first token in a refresh chain and anchors the refresh
/// window across refreshes.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i64,
    pub iat: usize,
    pub exp: usize,
    pub orig_iat: usize,
}

#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    pub ttl: Duration,
    pub max_refresh: Duration,
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        let JwtConfig {
            secret,
            ttl_minutes,
            max_refresh_minutes,
        } = state.config.jwt.clone();
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::from_secs((ttl_minutes as u64) * 60),
            max_refresh: Duration::from_secs((max_refresh_minutes as u64) * 60),
        }
    }
}

pub struct SignedToken {
    pub token: String,
    pub expires_at: OffsetDateTime,
}

impl JwtKeys {
    fn sign_with_orig(&self, user_id: i64, orig_iat: usize) -> anyhow::Result<SignedToken> {
        let now = OffsetDateTime::now_utc();
        let expires_at = now + TimeDuration::seconds(self.ttl.as_secs() as i64);
        let claims = Claims {
            sub: user_id,
            iat: now.unix_timestamp() as usize,
            exp: expires_at.unix_timestamp() as usize,
            orig_iat,
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        debug!(user_id, "jwt signed");
        Ok(SignedToken { token, expires_at })
    }

    pub fn sign(&self, user_id: i64) -> anyhow::Result<SignedToken> {
        let now = OffsetDateTime::now_utc().unix_timestamp() as usize;
        self.sign_with_orig(user_id, now)
    }

    pub fn sign_refreshed(&self, user_id: i64, orig_iat: usize) -> anyhow::Result<SignedToken> {
        self.sign_with_orig(user_id, orig_iat)
    }

    pub fn verify(&self, token: &str) -> anyhow::Result<Claims> {
        let validation = Validation::new(Algorithm::HS256);
        let data = decode::<Claims>(token, &self.decoding, &validation)?;
        Ok(data.claims)
    }

    /// Signature is checked but expiry is not; the refresh window is
    /// enforced against `orig_iat` instead.
    pub fn verify_for_refresh(&self, token: &str) -> anyhow::Result<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        let claims = decode::<Claims>(token, &self.decoding, &validation)?.claims;
        let deadline = claims.orig_iat as i64 + self.max_refresh.as_secs() as i64;
        if OffsetDateTime::now_utc().unix_timestamp() > deadline {
            anyhow::bail!("refresh window elapsed");
        }
        Ok(claims)
    }
}

/// Extracts and validates the request token, yielding the user ID.
pub struct AuthUser(pub i64);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = JwtKeys::from_ref(state);
        let token = request_token(parts).ok_or(ApiError::MissingToken)?;
        let claims = keys.verify(&token).map_err(|_| {
            warn!("invalid or expired token");
            ApiError::InvalidToken
        })?;
        Ok(AuthUser(claims.sub))
    }
}

/// Token lookup chain: Authorization bearer header, `token` query
/// parameter, `jwt` cookie.
pub fn request_token(parts: &Parts) -> Option<String> {
    if let Some(header) = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
    {
        if let Some(token) = header
            .strip_prefix("Bearer ")
            .or_else(|| header.strip_prefix("bearer "))
        {
            return Some(token.to_string());
        }
    }

    if let Some(query) = parts.uri.query() {
        for pair in query.split('&') {
            if let Some(("token", value)) = pair.split_once('=') {
                if !value.is_empty() {
                    return Some(value.to_string());
                }
            }
        }
    }

    parts
        .headers
        .get(COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|cookies| {
            cookies
                .split(';')
                .map(str::trim)
                .find_map(|c| c.strip_prefix("jwt=").map(str::to_string))
        })
}
