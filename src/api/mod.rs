//! HTTP surface for the backlog

pub mod error;
pub mod extract;
pub mod handlers;

use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::backlog::Backlog;

pub use error::{ApiError, ApiResult, ErrorBody};
pub use extract::{CurrentOwner, OWNER_HEADER};
pub use handlers::ReorderRequest;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub backlog: Backlog,
}

impl AppState {
    pub fn new(backlog: Backlog) -> Self {
        Self { backlog }
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/health", get(handlers::health))
        .nest("/api/backlog", backlog_routes())
}

fn backlog_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list).post(handlers::create))
        // Registered before /{id} so the literal segment wins
        .route("/reorder", put(handlers::reorder))
        .route(
            "/{id}",
            get(handlers::get_by_id)
                .put(handlers::update)
                .delete(handlers::delete),
        )
        .route("/{id}/complete", post(handlers::complete))
        .route("/{id}/uncomplete", post(handlers::uncomplete))
}

/// Builds the application with middleware and state attached
pub fn build_app(state: AppState) -> Router {
    router()
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
