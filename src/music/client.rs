use async_trait::async_trait;
use serde::Deserialize;
use time::{Duration as TimeDuration, OffsetDateTime};
use tokio::sync::RwLock;
use tracing::debug;

use crate::config::SpotifyConfig;

const TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
const SEARCH_URL: &str = "https://api.spotify.com/v1/search";
// refresh the cached token a little before Spotify expires it
const TOKEN_EXPIRY_MARGIN: TimeDuration = TimeDuration::seconds(30);

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("token request failed: {0}")]
    Token(String),
    #[error("catalog request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("catalog search returned status {0}")]
    Status(u16),
}

#[derive(Debug, Clone)]
pub struct CatalogArtist {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct CatalogTrack {
    pub id: String,
    pub name: String,
    pub artists: Vec<CatalogArtist>,
}

#[derive(Debug, Clone)]
pub struct TrackPage {
    pub tracks: Vec<CatalogTrack>,
    pub total: i64,
}

/// Seam between the search use case and the external catalog.
#[async_trait]
pub trait CatalogClient: Send + Sync {
    async fn search_tracks(
        &self,
        keyword: &str,
        limit: u32,
        offset: u32,
    ) -> Result<TrackPage, CatalogError>;
}

pub struct SpotifyCatalog {
    http: reqwest::Client,
    client_id: String,
    client_secret: String,
    token: RwLock<Option<CachedToken>>,
}

struct CachedToken {
    access_token: String,
    expires_at: OffsetDateTime,
}

#[derive(Deserialize)]
struct TokenBody {
    access_token: String,
    expires_in: i64,
}

#[derive(Deserialize)]
struct SearchBody {
    tracks: TracksBody,
}

#[derive(Deserialize)]
struct TracksBody {
    items: Vec<TrackItem>,
    total: i64,
}

#[derive(Deserialize)]
struct TrackItem {
    id: String,
    name: String,
    artists: Vec<ArtistItem>,
}

#[derive(Deserialize)]
struct ArtistItem {
    id: String,
    name: String,
}

impl SpotifyCatalog {
    pub fn new(cfg: SpotifyConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            client_id: cfg.client_id,
            client_secret: cfg.client_secret,
            token: RwLock::new(None),
        }
    }

    async fn access_token(&self) -> Result<String, CatalogError> {
        {
            let guard = self.token.read().await;
            if let Some(cached) = guard.as_ref() {
                if cached.expires_at - TOKEN_EXPIRY_MARGIN > OffsetDateTime::now_utc() {
                    return Ok(cached.access_token.clone());
                }
            }
        }

        let response = self
            .http
            .post(TOKEN_URL)
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(CatalogError::Token(format!(
                "status {}",
                response.status().as_u16()
            )));
        }
        let body: TokenBody = response.json().await?;

        let expires_at = OffsetDateTime::now_utc() + TimeDuration::seconds(body.expires_in);
        debug!("spotify token refreshed");
        *self.token.write().await = Some(CachedToken {
            access_token: body.access_token.clone(),
            expires_at,
        });
        Ok(body.access_token)
    }
}

#[async_trait]
impl CatalogClient for SpotifyCatalog {
    async fn search_tracks(
        &self,
        keyword: &str,
        limit: u32,
        offset: u32,
    ) -> Result<TrackPage, CatalogError> {
        let token = self.access_token().await?;
        let response = self
            .http
            .get(SEARCH_URL)
            .bearer_auth(token)
            .query(&[("q", keyword), ("type", "track")])
            .query(&[("limit", limit), ("offset", offset)])
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(CatalogError::Status(response.status().as_u16()));
        }
        let body: SearchBody = response.json().await?;

        let tracks = body
            .tracks
            .items
            .into_iter()
            .map(|t| CatalogTrack {
                id: t.id,
                name: t.name,
                artists: t
                    .artists
                    .into_iter()
                    .map(|a| CatalogArtist {
                        id: a.id,
                        name: a.name,
                    })
                    .collect(),
            })
            .collect();
        Ok(TrackPage {
            tracks,
            total: body.tracks.total,
        })
    }
}
