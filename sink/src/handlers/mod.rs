pub mod health;
pub mod queue;

use axum::{
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Routes through which the queue transport pushes batches.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/queue/batch", post(queue::consume_batch))
        .route("/health", get(health::health))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state)
}
