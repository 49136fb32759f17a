use axum::Router;
use tower_http::trace::TraceLayer;

use crate::routes::{health, jobs};
use crate::state::AppState;

pub fn create_app(state: AppState) -> Router {
    Router::<AppState>::new()
        .nest("/health", health::router())
        .nest("/api/jobs", jobs::router())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
