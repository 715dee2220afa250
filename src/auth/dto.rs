use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Request body for sign-in.
#[derive(Debug, Deserialize)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

/// Response for sign-in and refresh.
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn token_response_uses_rfc3339() {
        let response = TokenResponse {
            token: "abc".into(),
            expires_at: datetime!(2024-06-01 12:00:00 UTC),
        };
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"expires_at\":\"2024-06-01T12:00:00Z\""));
    }
}
