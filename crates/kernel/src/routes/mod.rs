//! HTTP route handlers.

pub mod category;
pub mod dataset;
pub mod health;
pub mod helpers;
pub mod tag;
pub mod transaction;

use axum::Router;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// The complete API router.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(health::router())
        .merge(category::router())
        .merge(transaction::router())
        .merge(dataset::router())
        .merge(tag::router())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
