use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::{error, info};
use uuid::Uuid;

use crate::auth::password::{hash_password, verify_password};
use crate::crypto::hash_email;
use crate::email::{EmailMessage, EmailTemplate};
use crate::error::ApiError;
use crate::state::AppState;
use crate::users::repo::{NewUser, RepoError};
use crate::users::repo_types::{PasswordResetFlow, User, UserProfile};

const PASSWORD_RESET_TTL: TimeDuration = TimeDuration::hours(2);

pub struct SignUpInput {
    pub email: String,
    pub password: String,
    pub name: String,
    pub nickname: String,
}

pub struct MyUser {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub nickname: String,
    pub profile_image_url: String,
    pub bio: String,
    pub website: String,
}

pub struct PatchUserInput {
    pub name: Option<String>,
    pub nickname: Option<String>,
    pub bio: Option<String>,
    pub website: Option<String>,
}

pub async fn sign_up(state: &AppState, input: SignUpInput) -> Result<i64, ApiError> {
    let email_hash = hash_email(&input.email);
    match User::find_by_email_hash(&state.db, &email_hash).await {
        Ok(_) => return Err(ApiError::EmailAlreadyExists),
        Err(RepoError::NotFound) => {}
        Err(e) => return Err(e.into()),
    }
    match User::find_by_nickname(&state.db, &input.nickname).await {
        Ok(_) => return Err(ApiError::NicknameAlreadyExists),
        Err(RepoError::NotFound) => {}
        Err(e) => return Err(e.into()),
    }

    validate_password(&input.password)?;

    let password_hash = hash_password(&input.password).map_err(|_| ApiError::HashingPassword)?;
    let email = state.encryptor.encrypt(&input.email).map_err(|e| {
        error!(error = %e, "email encryption failed");
        ApiError::EncryptingEmail
    })?;

    let user = User::create_with_profile(
        &state.db,
        NewUser {
            email,
            email_hash,
            password_hash,
            name: input.name.clone(),
            nickname: input.nickname,
        },
    )
    .await?;

    // Delivery is queued; the sign-up response never waits on SMTP.
    let _ = state.mail.enqueue(EmailMessage {
        to: input.email,
        template: EmailTemplate::Welcome { name: input.name },
    });

    info!(user_id = user.id, "user signed up");
    Ok(user.id)
}

pub async fn send_password_recovery_email(
    state: &AppState,
    base_url: &str,
    email: &str,
) -> Result<(), ApiError> {
    let user = match User::find_by_email_hash(&state.db, &hash_email(email)).await {
        Ok(user) => user,
        Err(RepoError::NotFound) => return Err(ApiError::UserNotFound),
        Err(e) => return Err(e.into()),
    };

    let flow_id = generate_flow_id();
    let expires_at = OffsetDateTime::now_utc() + PASSWORD_RESET_TTL;
    let flow = PasswordResetFlow::create(&state.db, user.id, &flow_id, expires_at).await?;

    let reset_link = format!("{base_url}/password/recovery?flow_id={}", flow.flow_id);
    let _ = state.mail.enqueue(EmailMessage {
        to: email.to_string(),
        template: EmailTemplate::PasswordReset {
            name: user.name,
            reset_link,
        },
    });

    info!(user_id = user.id, "password recovery email queued");
    Ok(())
}

pub async fn reset_password(state: &AppState, password: &str, flow_id: &str) -> Result<(), ApiError> {
    let flow = match PasswordResetFlow::find_by_flow_id(&state.db, flow_id).await {
        Ok(flow) => flow,
        Err(RepoError::NotFound) => return Err(ApiError::PasswordResetFlowNotFound),
        Err(e) => return Err(e.into()),
    };
    if OffsetDateTime::now_utc() > flow.expires_at {
        return Err(ApiError::PasswordResetFlowExpired);
    }

    validate_password(password)?;

    let password_hash = hash_password(password).map_err(|_| ApiError::HashingPassword)?;
    User::reset_password_with_flow(&state.db, flow.user_id, &password_hash, &flow.flow_id).await?;

    info!(user_id = flow.user_id, "password reset completed");
    Ok(())
}

pub async fn get_my_user(state: &AppState, user_id: i64) -> Result<MyUser, ApiError> {
    let user = match User::find_by_id(&state.db, user_id).await {
        Ok(user) => user,
        Err(RepoError::NotFound) => return Err(ApiError::UserNotFound),
        Err(e) => return Err(e.into()),
    };

    let (profile_image_url, bio, website) =
        match UserProfile::find_by_user_id(&state.db, user_id).await {
            Ok(profile) => (profile.profile_image_url, profile.bio, profile.website),
            Err(RepoError::NotFound) => (String::new(), String::new(), String::new()),
            Err(e) => return Err(e.into()),
        };

    let email = state.encryptor.decrypt(&user.email).map_err(|e| {
        error!(error = %e, user_id, "email decryption failed");
        ApiError::DecryptingEmail
    })?;

    Ok(MyUser {
        id: user.id,
        email,
        name: user.name,
        nickname: user.nickname,
        profile_image_url,
        bio,
        website,
    })
}

pub async fn patch_user(
    state: &AppState,
    user_id: i64,
    patch: PatchUserInput,
) -> Result<(), ApiError> {
    let user = match User::find_by_id(&state.db, user_id).await {
        Ok(user) => user,
        Err(RepoError::NotFound) => return Err(ApiError::UserNotFound),
        Err(e) => return Err(e.into()),
    };

    // Check-then-act window on the nickname; the unique index still
    // backstops a race as a generic update failure.
    if let Some(nickname) = patch.nickname.as_deref() {
        if nickname != user.nickname {
            match User::find_by_nickname(&state.db, nickname).await {
                Ok(_) => return Err(ApiError::NicknameAlreadyExists),
                Err(RepoError::NotFound) => {}
                Err(e) => return Err(e.into()),
            }
        }
    }

    if patch.name.is_some() || patch.nickname.is_some() {
        User::update_identity(
            &state.db,
            user_id,
            patch.name.as_deref(),
            patch.nickname.as_deref(),
        )
        .await?;
    }
    if patch.bio.is_some() || patch.website.is_some() {
        UserProfile::update_fields(
            &state.db,
            user_id,
            patch.bio.as_deref(),
            patch.website.as_deref(),
        )
        .await?;
    }

    info!(user_id, "user patched");
    Ok(())
}

pub async fn update_password(
    state: &AppState,
    user_id: i64,
    curr_password: &str,
    new_password: &str,
) -> Result<(), ApiError> {
    let user = match User::find_by_id(&state.db, user_id).await {
        Ok(user) => user,
        Err(RepoError::NotFound) => return Err(ApiError::UserNotFound),
        Err(e) => return Err(e.into()),
    };

    if !verify_password(curr_password, &user.password_hash) {
        return Err(ApiError::PasswordNotMatched);
    }

    validate_password(new_password)?;

    let password_hash = hash_password(new_password).map_err(|_| ApiError::HashingPassword)?;
    User::update_password(&state.db, user_id, &password_hash).await?;

    info!(user_id, "password updated");
    Ok(())
}

/// Policy: length first, then one uppercase, one lowercase, one digit, one
/// special character. All classes are collected in a single pass and the
/// rules reported in that fixed order.
pub fn validate_password(password: &str) -> Result<(), ApiError> {
    if password.chars().count() < 8 {
        return Err(ApiError::PasswordTooShort);
    }

    let mut has_uppercase = false;
    let mut has_lowercase = false;
    let mut has_number = false;
    let mut has_special = false;
    for c in password.chars() {
        if c.is_uppercase() {
            has_uppercase = true;
        } else if c.is_lowercase() {
            has_lowercase = true;
        } else if c.is_numeric() {
            has_number = true;
        } else if !c.is_whitespace() {
            has_special = true;
        }
    }

    if !has_uppercase {
        return Err(ApiError::PasswordNoUppercase);
    }
    if !has_lowercase {
        return Err(ApiError::PasswordNoLowercase);
    }
    if !has_number {
        return Err(ApiError::PasswordNoNumber);
    }
    if !has_special {
        return Err(ApiError::PasswordNoSpecialChar);
    }
    Ok(())
}

fn generate_flow_id() -> String {
    format!(
        "{}:{}",
        Uuid::new_v4(),
        OffsetDateTime::now_utc().unix_timestamp()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_password_fails_first() {
        // also short on every other rule; length must win
        assert!(matches!(
            validate_password("a1!"),
            Err(ApiError::PasswordTooShort)
        ));
    }

    #[test]
    fn missing_classes_reported_in_order() {
        assert!(matches!(
            validate_password("lowercase1!"),
            Err(ApiError::PasswordNoUppercase)
        ));
        assert!(matches!(
            validate_password("UPPERCASE1!"),
            Err(ApiError::PasswordNoLowercase)
        ));
        assert!(matches!(
            validate_password("Password!"),
            Err(ApiError::PasswordNoNumber)
        ));
        assert!(matches!(
            validate_password("Password123"),
            Err(ApiError::PasswordNoSpecialChar)
        ));
    }

    #[test]
    fn uppercase_outranks_the_other_missing_classes() {
        // missing everything but lowercase: uppercase is reported first
        assert!(matches!(
            validate_password("lowercase"),
            Err(ApiError::PasswordNoUppercase)
        ));
    }

    #[test]
    fn valid_password_passes() {
        assert!(validate_password("Password123!").is_ok());
        assert!(validate_password("Ab1!Ab1!").is_ok());
    }

    #[test]
    fn flow_id_is_uuid_colon_unix_seconds() {
        let flow_id = generate_flow_id();
        let (uuid_part, ts_part) = flow_id.split_once(':').expect("has separator");
        assert!(Uuid::parse_str(uuid_part).is_ok());
        let ts: i64 = ts_part.parse().expect("timestamp parses");
        let now = OffsetDateTime::now_utc().unix_timestamp();
        assert!((now - ts).abs() < 5);
    }

    #[test]
    fn flow_ids_are_unique() {
        assert_ne!(generate_flow_id(), generate_flow_id());
    }
}
