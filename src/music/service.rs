use tracing::error;

use crate::error::ApiError;
use crate::music::client::TrackPage;
use crate::state::AppState;

pub const DEFAULT_SEARCH_LIMIT: u32 = 20;

/// Proxies the search to the catalog client. Every client failure, token,
/// network or status, collapses into the one search sentinel.
pub async fn search_tracks(
    state: &AppState,
    keyword: &str,
    limit: Option<u32>,
    offset: Option<u32>,
) -> Result<TrackPage, ApiError> {
    state
        .catalog
        .search_tracks(
            keyword,
            limit.unwrap_or(DEFAULT_SEARCH_LIMIT),
            offset.unwrap_or(0),
        )
        .await
        .map_err(|e| {
            error!(error = %e, keyword, "spotify search failed");
            ApiError::SearchingSpotify
        })
}
