use sqlx::PgPool;
use time::OffsetDateTime;

use crate::users::repo_types::{PasswordResetFlow, User, UserProfile};

/// Flat sentinels for the repo layer. The driver error is logged and then
/// discarded; callers branch on the kind alone. A uniqueness violation is
/// indistinguishable from any other create/update failure, so uniqueness
/// is pre-checked at the service layer.
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error("failed to create record")]
    Create,
    #[error("failed to find record")]
    Find,
    #[error("failed to update record")]
    Update,
    #[error("failed to delete record")]
    Delete,
    #[error("record not found")]
    NotFound,
}

fn log_err(e: sqlx::Error, sentinel: RepoError) -> RepoError {
    tracing::error!(error = %e, "query failed");
    sentinel
}

fn on_find(e: sqlx::Error) -> RepoError {
    match e {
        sqlx::Error::RowNotFound => RepoError::NotFound,
        e => log_err(e, RepoError::Find),
    }
}

pub struct NewUser {
    pub email: String,
    pub email_hash: String,
    pub password_hash: String,
    pub name: String,
    pub nickname: String,
}

const USER_COLUMNS: &str =
    "id, email, email_hash, password_hash, name, nickname, created_at, updated_at, deleted_at";

impl User {
    /// Inserts the user and an empty profile in one transaction.
    pub async fn create_with_profile(db: &PgPool, new: NewUser) -> Result<User, RepoError> {
        let mut tx = db.begin().await.map_err(|e| log_err(e, RepoError::Create))?;

        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (email, email_hash, password_hash, name, nickname)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&new.email)
        .bind(&new.email_hash)
        .bind(&new.password_hash)
        .bind(&new.name)
        .bind(&new.nickname)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| log_err(e, RepoError::Create))?;

        sqlx::query("INSERT INTO user_profiles (user_id) VALUES ($1)")
            .bind(user.id)
            .execute(&mut *tx)
            .await
            .map_err(|e| log_err(e, RepoError::Create))?;

        tx.commit().await.map_err(|e| log_err(e, RepoError::Create))?;
        Ok(user)
    }

    pub async fn find_by_id(db: &PgPool, id: i64) -> Result<User, RepoError> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1 AND deleted_at IS NULL"
        ))
        .bind(id)
        .fetch_one(db)
        .await
        .map_err(on_find)
    }

    pub async fn find_by_email_hash(db: &PgPool, email_hash: &str) -> Result<User, RepoError> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email_hash = $1 AND deleted_at IS NULL"
        ))
        .bind(email_hash)
        .fetch_one(db)
        .await
        .map_err(on_find)
    }

    pub async fn find_by_nickname(db: &PgPool, nickname: &str) -> Result<User, RepoError> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE nickname = $1 AND deleted_at IS NULL"
        ))
        .bind(nickname)
        .fetch_one(db)
        .await
        .map_err(on_find)
    }

    /// Applies only the supplied identity fields.
    pub async fn update_identity(
        db: &PgPool,
        id: i64,
        name: Option<&str>,
        nickname: Option<&str>,
    ) -> Result<(), RepoError> {
        sqlx::query(
            r#"
            UPDATE users
            SET name = COALESCE($2, name),
                nickname = COALESCE($3, nickname),
                updated_at = now()
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(nickname)
        .execute(db)
        .await
        .map_err(|e| log_err(e, RepoError::Update))?;
        Ok(())
    }

    pub async fn update_password(
        db: &PgPool,
        id: i64,
        password_hash: &str,
    ) -> Result<(), RepoError> {
        sqlx::query(
            "UPDATE users SET password_hash = $2, updated_at = now() \
             WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .bind(password_hash)
        .execute(db)
        .await
        .map_err(|e| log_err(e, RepoError::Update))?;
        Ok(())
    }

    /// One transaction: a crash between the password update and the flow
    /// delete must not leave a consumed flow usable a second time.
    pub async fn reset_password_with_flow(
        db: &PgPool,
        user_id: i64,
        password_hash: &str,
        flow_id: &str,
    ) -> Result<(), RepoError> {
        let mut tx = db.begin().await.map_err(|e| log_err(e, RepoError::Update))?;

        sqlx::query(
            "UPDATE users SET password_hash = $2, updated_at = now() \
             WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(user_id)
        .bind(password_hash)
        .execute(&mut *tx)
        .await
        .map_err(|e| log_err(e, RepoError::Update))?;

        sqlx::query("DELETE FROM password_reset_flows WHERE flow_id = $1")
            .bind(flow_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| log_err(e, RepoError::Delete))?;

        tx.commit().await.map_err(|e| log_err(e, RepoError::Update))?;
        Ok(())
    }
}

impl UserProfile {
    pub async fn find_by_user_id(db: &PgPool, user_id: i64) -> Result<UserProfile, RepoError> {
        sqlx::query_as::<_, UserProfile>(
            "SELECT id, user_id, profile_image_url, bio, website, created_at, updated_at \
             FROM user_profiles WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_one(db)
        .await
        .map_err(on_find)
    }

    pub async fn update_fields(
        db: &PgPool,
        user_id: i64,
        bio: Option<&str>,
        website: Option<&str>,
    ) -> Result<(), RepoError> {
        sqlx::query(
            r#"
            UPDATE user_profiles
            SET bio = COALESCE($2, bio),
                website = COALESCE($3, website),
                updated_at = now()
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .bind(bio)
        .bind(website)
        .execute(db)
        .await
        .map_err(|e| log_err(e, RepoError::Update))?;
        Ok(())
    }
}

impl PasswordResetFlow {
    pub async fn create(
        db: &PgPool,
        user_id: i64,
        flow_id: &str,
        expires_at: OffsetDateTime,
    ) -> Result<PasswordResetFlow, RepoError> {
        sqlx::query_as::<_, PasswordResetFlow>(
            r#"
            INSERT INTO password_reset_flows (user_id, flow_id, expires_at)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, flow_id, expires_at, created_at
            "#,
        )
        .bind(user_id)
        .bind(flow_id)
        .bind(expires_at)
        .fetch_one(db)
        .await
        .map_err(|e| log_err(e, RepoError::Create))
    }

    pub async fn find_by_flow_id(db: &PgPool, flow_id: &str) -> Result<PasswordResetFlow, RepoError> {
        sqlx::query_as::<_, PasswordResetFlow>(
            "SELECT id, user_id, flow_id, expires_at, created_at \
             FROM password_reset_flows WHERE flow_id = $1",
        )
        .bind(flow_id)
        .fetch_one(db)
        .await
        .map_err(on_find)
    }
}
