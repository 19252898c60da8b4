use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use crate::{
    error::{AppError, AppResult},
    models::Quote,
};

use super::AppState;

#[derive(Debug, Deserialize)]
pub struct QuoteRequest {
    pub user_id: i64,
    pub text: String,
    pub page: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct QuoteUpdateRequest {
    pub text: String,
    pub page: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    q: String,
    book_id: Option<i64>,
}

/// Handler for listing a book's quotes
pub async fn for_book(
    State(state): State<AppState>,
    Path(book_id): Path<i64>,
) -> AppResult<Json<Vec<Quote>>> {
    let quotes = state.library.quotes_for_book(book_id).await?;
    Ok(Json(quotes))
}

/// Handler for saving a quote from a book
pub async fn add(
    State(state): State<AppState>,
    Path(book_id): Path<i64>,
    Json(request): Json<QuoteRequest>,
) -> AppResult<(StatusCode, Json<Quote>)> {
    if request.text.trim().is_empty() {
        return Err(AppError::InvalidInput(
            "Quote text must not be empty".to_string(),
        ));
    }
    if !state.library.book_exists(book_id).await? {
        return Err(AppError::NotFound("Book not found".to_string()));
    }

    let quote = state
        .library
        .insert_quote(book_id, request.user_id, request.text, request.page)
        .await?;
    Ok((StatusCode::CREATED, Json(quote)))
}

/// Handler for editing a quote
pub async fn update(
    State(state): State<AppState>,
    Path(quote_id): Path<i64>,
    Json(request): Json<QuoteUpdateRequest>,
) -> AppResult<Json<Quote>> {
    let quote = state
        .library
        .update_quote(quote_id, request.text, request.page)
        .await?
        .ok_or_else(|| AppError::NotFound("Quote not found".to_string()))?;
    Ok(Json(quote))
}

/// Handler for deleting a quote
pub async fn remove(
    State(state): State<AppState>,
    Path(quote_id): Path<i64>,
) -> AppResult<StatusCode> {
    if state.library.delete_quote(quote_id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound("Quote not found".to_string()))
    }
}

/// Handler for quote search, optionally scoped to one book
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> AppResult<Json<Vec<Quote>>> {
    let quotes = state
        .library
        .search_quotes(&params.q, params.book_id)
        .await?;
    Ok(Json(quotes))
}
