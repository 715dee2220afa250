use crate::state::AppState;
use axum::routing::{get, post, put};
use axum::Router;

mod dto;
pub mod handlers;
pub mod repo;
pub mod repo_types;
pub mod service;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users", post(handlers::sign_up))
        .route(
            "/users/password/recovery",
            post(handlers::send_password_recovery_email),
        )
        .route("/users/password/reset", post(handlers::reset_password))
        .route("/users/me", get(handlers::get_me).patch(handlers::patch_me))
        .route("/users/me/password", put(handlers::update_password))
}
