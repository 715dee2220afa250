use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct DbConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub max_lifetime_minutes: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub ttl_minutes: i64,
    pub max_refresh_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from_address: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpotifyConfig {
    pub client_id: String,
    pub client_secret: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub db: DbConfig,
    pub jwt: JwtConfig,
    pub smtp: SmtpConfig,
    pub spotify: SpotifyConfig,
    /// Base64-encoded 32-byte key for the email column encryptor.
    pub email_encryption_key: String,
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let db = DbConfig {
            url: std::env::var("DATABASE_URL")?,
            max_connections: env_or("DB_MAX_CONNECTIONS", 100),
            min_connections: env_or("DB_MIN_CONNECTIONS", 10),
            max_lifetime_minutes: env_or("DB_MAX_LIFETIME_MINUTES", 30),
        };
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            ttl_minutes: env_or("JWT_TTL_MINUTES", 60),
            max_refresh_minutes: env_or("JWT_MAX_REFRESH_MINUTES", 60),
        };
        let smtp = SmtpConfig {
            host: std::env::var("SMTP_HOST")?,
            port: env_or("SMTP_PORT", 587),
            username: std::env::var("SMTP_USERNAME")?,
            password: std::env::var("SMTP_PASSWORD")?,
            from_address: std::env::var("SMTP_FROM_ADDRESS")?,
        };
        let spotify = SpotifyConfig {
            client_id: std::env::var("SPOTIFY_CLIENT_ID")?,
            client_secret: std::env::var("SPOTIFY_CLIENT_SECRET")?,
        };
        Ok(Self {
            db,
            jwt,
            smtp,
            spotify,
            email_encryption_key: std::env::var("EMAIL_ENCRYPTION_KEY")?,
        })
    }
}
