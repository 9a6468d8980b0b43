use axum::Router;
use tower_http::cors::{Any, CorsLayer};

use crate::routes::{cron, health, sentiment};
use crate::state::AppState;

pub fn create_app(state: AppState) -> Router {
    // The dashboard frontend is served from a different origin.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([http::Method::GET, http::Method::POST])
        .allow_headers(Any);

    Router::<AppState>::new()
        .nest("/health", health::router())
        .nest("/api/sentiment", sentiment::router())
        .nest("/api/cron", cron::router())
        .layer(cors)
        .with_state(state)
}
