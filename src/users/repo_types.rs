use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;

/// User record. The address itself is stored only as AES-GCM ciphertext;
/// `email_hash` is the deterministic digest used for equality lookups.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub email_hash: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub name: String,
    pub nickname: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
    pub deleted_at: Option<OffsetDateTime>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserProfile {
    pub id: i64,
    pub user_id: i64,
    pub profile_image_url: String,
    pub bio: String,
    pub website: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// One-time password-reset ticket. Expiry is enforced by comparison in the
/// service layer, not by the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PasswordResetFlow {
    pub id: i64,
    pub user_id: i64,
    pub flow_id: String,
    pub expires_at: OffsetDateTime,
    pub created_at: OffsetDateTime,
}
