pub mod auth;
pub mod form;
pub mod media;
pub mod tweets;
pub mod users;
pub mod videos;

use axum::{Router, routing::get};
use std::sync::Arc;

use crate::AppState;

async fn health() -> &'static str {
    "ok"
}

/// Build all routes for the API
pub fn build_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health))
        .merge(auth::routes())
        .merge(media::routes())
        .merge(tweets::routes())
        .merge(users::routes())
        .merge(videos::routes())
}
