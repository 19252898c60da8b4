use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use crate::{
    error::{AppError, AppResult},
    models::{Book, NewBook, ReadStatus},
};

use super::AppState;

/// Payload for creating or replacing a book
///
/// Status arrives as free text and is parsed leniently, matching what older
/// clients already send.
#[derive(Debug, Deserialize)]
pub struct BookRequest {
    pub title: String,
    pub author: String,
    pub genre: Option<String>,
    pub total_pages: i32,
    #[serde(default)]
    pub pages_read: i32,
    pub status: String,
    pub rating: Option<i32>,
    pub cover_url: Option<String>,
}

impl BookRequest {
    fn into_new_book(self) -> AppResult<NewBook> {
        if self.title.trim().is_empty() {
            return Err(AppError::InvalidInput("Title must not be empty".to_string()));
        }
        if let Some(rating) = self.rating {
            if !(1..=5).contains(&rating) {
                return Err(AppError::InvalidInput(
                    "Rating must be between 1 and 5".to_string(),
                ));
            }
        }

        Ok(NewBook {
            title: self.title,
            author: self.author,
            genre: self.genre,
            total_pages: self.total_pages,
            pages_read: self.pages_read,
            status: ReadStatus::parse_lenient(&self.status),
            rating: self.rating,
            cover_url: self.cover_url,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    q: String,
}

#[derive(Debug, Deserialize)]
pub struct StatusQuery {
    status: String,
}

#[derive(Debug, Deserialize)]
pub struct ProgressQuery {
    pages_read: i32,
}

/// Handler for listing a user's books
pub async fn list_for_user(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> AppResult<Json<Vec<Book>>> {
    let books = state.library.books_for_user(user_id).await?;
    Ok(Json(books))
}

/// Handler for adding a book to a user's library
pub async fn create(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    Json(request): Json<BookRequest>,
) -> AppResult<(StatusCode, Json<Book>)> {
    let book = state
        .library
        .insert_book(user_id, request.into_new_book()?)
        .await?;
    Ok((StatusCode::CREATED, Json(book)))
}

/// Handler for fetching a single book
pub async fn get_one(
    State(state): State<AppState>,
    Path(book_id): Path<i64>,
) -> AppResult<Json<Book>> {
    let book = state
        .library
        .book(book_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Book not found".to_string()))?;
    Ok(Json(book))
}

/// Handler for replacing a book's fields
pub async fn update(
    State(state): State<AppState>,
    Path(book_id): Path<i64>,
    Json(request): Json<BookRequest>,
) -> AppResult<Json<Book>> {
    let book = state
        .library
        .update_book(book_id, request.into_new_book()?)
        .await?
        .ok_or_else(|| AppError::NotFound("Book not found".to_string()))?;
    Ok(Json(book))
}

/// Handler for deleting a book
pub async fn remove(
    State(state): State<AppState>,
    Path(book_id): Path<i64>,
) -> AppResult<StatusCode> {
    if state.library.delete_book(book_id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound("Book not found".to_string()))
    }
}

/// Handler for recording reading progress
pub async fn update_progress(
    State(state): State<AppState>,
    Path(book_id): Path<i64>,
    Query(params): Query<ProgressQuery>,
) -> AppResult<Json<Book>> {
    if params.pages_read < 0 {
        return Err(AppError::InvalidInput(
            "Pages read must not be negative".to_string(),
        ));
    }
    let book = state
        .library
        .update_progress(book_id, params.pages_read)
        .await?
        .ok_or_else(|| AppError::NotFound("Book not found".to_string()))?;
    Ok(Json(book))
}

/// Handler for searching a user's books by title or author
pub async fn search(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    Query(params): Query<SearchQuery>,
) -> AppResult<Json<Vec<Book>>> {
    let books = state.library.search_books(user_id, &params.q).await?;
    Ok(Json(books))
}

/// Handler for filtering a user's books by reading status
pub async fn by_status(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    Query(params): Query<StatusQuery>,
) -> AppResult<Json<Vec<Book>>> {
    let status = ReadStatus::parse_lenient(&params.status);
    let books = state.library.books_by_status(user_id, status).await?;
    Ok(Json(books))
}
