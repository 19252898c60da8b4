use std::sync::Arc;

use axum::{
    http::StatusCode,
    middleware as axum_middleware,
    routing::{get, patch, post, put},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    db::{CatalogStore, LibraryStore},
    middleware::request_id::{request_id_middleware, request_span},
};

pub mod books;
pub mod catalog;
pub mod notes;
pub mod quotes;
pub mod recommendations;
pub mod shelf;

/// Shared application state: the store handles every handler works through
#[derive(Clone)]
pub struct AppState {
    pub library: Arc<dyn LibraryStore>,
    pub catalog: Arc<dyn CatalogStore>,
}

impl AppState {
    pub fn new(library: Arc<dyn LibraryStore>, catalog: Arc<dyn CatalogStore>) -> Self {
        Self { library, catalog }
    }
}

/// Creates the application router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", api_routes())
        // Layer order matters: the request-id layer sits outside tracing so
        // the span can pick the id out of the request extensions
        .layer(TraceLayer::new_for_http().make_span_with(request_span))
        .layer(axum_middleware::from_fn(request_id_middleware))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// API routes under /api/v1
fn api_routes() -> Router<AppState> {
    Router::new()
        // Legacy per-user books
        .route(
            "/books/user/:user_id",
            get(books::list_for_user).post(books::create),
        )
        .route("/books/user/:user_id/search", get(books::search))
        .route("/books/user/:user_id/status", get(books::by_status))
        .route(
            "/books/:book_id",
            get(books::get_one).put(books::update).delete(books::remove),
        )
        .route("/books/:book_id/progress", patch(books::update_progress))
        // Shared catalog
        .route("/catalog", get(catalog::list))
        .route("/catalog/genres", get(catalog::genres))
        .route("/catalog/top-rated", get(catalog::top_rated))
        .route("/catalog/search", get(catalog::search))
        .route("/catalog/:id", get(catalog::get_one))
        // Shelf
        .route("/shelf/user/:user_id", get(shelf::list_for_user))
        .route("/shelf/user/:user_id/add/:catalog_book_id", post(shelf::add))
        .route(
            "/shelf/:entry_id",
            put(shelf::update).delete(shelf::remove),
        )
        // Notes and quotes
        .route(
            "/notes/book/:book_id",
            get(notes::for_book).post(notes::add),
        )
        .route("/notes/search", get(notes::search))
        .route("/notes/:note_id", put(notes::update).delete(notes::remove))
        .route(
            "/quotes/book/:book_id",
            get(quotes::for_book).post(quotes::add),
        )
        .route("/quotes/search", get(quotes::search))
        .route(
            "/quotes/:quote_id",
            put(quotes::update).delete(quotes::remove),
        )
        // Recommendations
        .route("/recommendations/:user_id", get(recommendations::recommend))
        .route(
            "/recommendations/:user_id/:book_id/feedback",
            post(recommendations::submit_feedback),
        )
}

/// Health check endpoint
async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}
