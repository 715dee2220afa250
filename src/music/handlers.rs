use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::Json;
use tracing::instrument;

use crate::auth::jwt::AuthUser;
use crate::error::ApiError;
use crate::music::dto::{Artist, SearchTracksParams, SearchTracksResponse, Track};
use crate::music::service;
use crate::state::AppState;

#[instrument(skip(state, params))]
pub async fn search_tracks(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    params: Result<Query<SearchTracksParams>, QueryRejection>,
) -> Result<Json<SearchTracksResponse>, ApiError> {
    let Query(params) = params.map_err(|_| ApiError::InvalidRequestBody)?;

    let page = service::search_tracks(&state, &params.keyword, params.limit, params.offset).await?;

    let tracks = page
        .tracks
        .into_iter()
        .map(|t| Track {
            id: t.id,
            name: t.name,
            artists: t
                .artists
                .into_iter()
                .map(|a| Artist {
                    id: a.id,
                    name: a.name,
                })
                .collect(),
        })
        .collect();
    Ok(Json(SearchTracksResponse {
        tracks,
        total: page.total,
    }))
}
