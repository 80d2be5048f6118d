use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::api;
use crate::search::indexer::Indexer;
use crate::search::query::SearchContext;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub search: SearchContext,
    pub indexer: Arc<Indexer>,
    pub service_token: String,
    /// Master switch for ask-search typo correction.
    pub typo_correction: bool,
}

/// Build the HTTP router over the given state.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/v1/filterable-pages",
            get(api::search::filterable_pages_handler),
        )
        .route("/api/v1/ask/search", get(api::search::ask_search_handler))
        .route("/api/v1/index/events", post(api::events::index_event_handler))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
