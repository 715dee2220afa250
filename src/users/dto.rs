use serde::{Deserialize, Serialize};

/// Request body for sign-up.
#[derive(Debug, Deserialize)]
pub struct SignUpRequest {
    pub email: String,
    pub password: String,
    pub name: String,
    pub nickname: String,
}

#[derive(Debug, Serialize)]
pub struct SignUpResponse {
    pub user_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct SendPasswordRecoveryEmailRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub password: String,
    pub flow_id: String,
}

/// The authenticated user's own record, email decrypted.
#[derive(Debug, Serialize)]
pub struct MyUserResponse {
    pub user_id: i64,
    pub email: String,
    pub name: String,
    pub nickname: String,
    pub profile_image_url: String,
    pub bio: String,
    pub website: String,
}

/// Only supplied fields are applied.
#[derive(Debug, Deserialize)]
pub struct PatchMyUserRequest {
    pub name: Option<String>,
    pub nickname: Option<String>,
    pub bio: Option<String>,
    pub website: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePasswordRequest {
    pub curr_password: String,
    pub new_password: String,
}

/// Bodyless 200s still return a JSON object.
#[derive(Debug, Serialize)]
pub struct EmptyResponse {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_response_serializes_to_empty_object() {
        assert_eq!(serde_json::to_string(&EmptyResponse {}).unwrap(), "{}");
    }

    #[test]
    fn patch_request_fields_are_optional() {
        let patch: PatchMyUserRequest = serde_json::from_str(r#"{"bio":"hi"}"#).unwrap();
        assert_eq!(patch.bio.as_deref(), Some("hi"));
        assert!(patch.name.is_none());
        assert!(patch.nickname.is_none());
        assert!(patch.website.is_none());
    }

    #[test]
    fn my_user_response_shape() {
        let response = MyUserResponse {
            user_id: 1,
            email: "user@example.com".into(),
            name: "John Doe".into(),
            nickname: "johndoe".into(),
            profile_image_url: String::new(),
            bio: String::new(),
            website: String::new(),
        };
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"user_id\":1"));
        assert!(json.contains("user@example.com"));
    }
}
