use crate::state::AppState;
use axum::routing::get;
use axum::Router;

pub mod client;
mod dto;
pub mod handlers;
pub mod service;

pub fn router() -> Router<AppState> {
    Router::new().route("/music/tracks", get(handlers::search_tracks))
}
