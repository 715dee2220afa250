use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::users::repo::RepoError;

/// Every failure a handler can surface, tagged by kind. HTTP status comes
/// from the pure [`ApiError::status`] mapping, never from the error value
/// itself.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("invalid request body")]
    InvalidRequestBody,

    #[error("email already exists")]
    EmailAlreadyExists,
    #[error("nickname already exists")]
    NicknameAlreadyExists,
    #[error("user not found")]
    UserNotFound,

    #[error("password must be at least 8 characters long")]
    PasswordTooShort,
    #[error("password must contain at least one uppercase letter")]
    PasswordNoUppercase,
    #[error("password must contain at least one lowercase letter")]
    PasswordNoLowercase,
    #[error("password must contain at least one number")]
    PasswordNoNumber,
    #[error("password must contain at least one special character")]
    PasswordNoSpecialChar,

    #[error("password reset flow not found")]
    PasswordResetFlowNotFound,
    #[error("password reset flow expired")]
    PasswordResetFlowExpired,
    #[error("password not matched")]
    PasswordNotMatched,

    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("missing auth token")]
    MissingToken,
    #[error("invalid or expired token")]
    InvalidToken,

    #[error("failed to hash password")]
    HashingPassword,
    #[error("failed to encrypt email")]
    EncryptingEmail,
    #[error("failed to decrypt email")]
    DecryptingEmail,
    #[error("failed to sign token")]
    SigningToken,
    #[error("failed to search spotify")]
    SearchingSpotify,

    #[error(transparent)]
    Repo(#[from] RepoError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        use ApiError::*;
        match self {
            InvalidRequestBody
            | EmailAlreadyExists
            | NicknameAlreadyExists
            | UserNotFound
            | PasswordTooShort
            | PasswordNoUppercase
            | PasswordNoLowercase
            | PasswordNoNumber
            | PasswordNoSpecialChar
            | PasswordResetFlowNotFound
            | PasswordResetFlowExpired
            | PasswordNotMatched => StatusCode::BAD_REQUEST,

            InvalidCredentials | MissingToken | InvalidToken => StatusCode::UNAUTHORIZED,

            HashingPassword | EncryptingEmail | DecryptingEmail | SigningToken
            | SearchingSpotify | Repo(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        (status, Json(ErrorBody { error: self.to_string() })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_and_state_errors_are_bad_request() {
        assert_eq!(ApiError::EmailAlreadyExists.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::PasswordTooShort.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::PasswordResetFlowExpired.status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ApiError::PasswordNotMatched.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn auth_errors_are_unauthorized() {
        assert_eq!(ApiError::InvalidCredentials.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::MissingToken.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::InvalidToken.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn infrastructure_errors_are_internal() {
        assert_eq!(
            ApiError::HashingPassword.status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::SearchingSpotify.status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::Repo(RepoError::Find).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn messages_match_the_wire_contract() {
        assert_eq!(ApiError::EmailAlreadyExists.to_string(), "email already exists");
        assert_eq!(
            ApiError::PasswordNoSpecialChar.to_string(),
            "password must contain at least one special character"
        );
        assert_eq!(
            ApiError::Repo(RepoError::NotFound).to_string(),
            "record not found"
        );
    }
}
