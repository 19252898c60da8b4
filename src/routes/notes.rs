use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use crate::{
    error::{AppError, AppResult},
    models::Note,
};

use super::AppState;

#[derive(Debug, Deserialize)]
pub struct NoteRequest {
    pub user_id: i64,
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct NoteUpdateRequest {
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    q: String,
    book_id: Option<i64>,
}

/// Handler for listing a book's notes
pub async fn for_book(
    State(state): State<AppState>,
    Path(book_id): Path<i64>,
) -> AppResult<Json<Vec<Note>>> {
    let notes = state.library.notes_for_book(book_id).await?;
    Ok(Json(notes))
}

/// Handler for attaching a note to a book
pub async fn add(
    State(state): State<AppState>,
    Path(book_id): Path<i64>,
    Json(request): Json<NoteRequest>,
) -> AppResult<(StatusCode, Json<Note>)> {
    if request.content.trim().is_empty() {
        return Err(AppError::InvalidInput(
            "Note content must not be empty".to_string(),
        ));
    }
    if !state.library.book_exists(book_id).await? {
        return Err(AppError::NotFound("Book not found".to_string()));
    }

    let note = state
        .library
        .insert_note(book_id, request.user_id, request.content)
        .await?;
    Ok((StatusCode::CREATED, Json(note)))
}

/// Handler for editing a note
pub async fn update(
    State(state): State<AppState>,
    Path(note_id): Path<i64>,
    Json(request): Json<NoteUpdateRequest>,
) -> AppResult<Json<Note>> {
    let note = state
        .library
        .update_note(note_id, request.content)
        .await?
        .ok_or_else(|| AppError::NotFound("Note not found".to_string()))?;
    Ok(Json(note))
}

/// Handler for deleting a note
pub async fn remove(
    State(state): State<AppState>,
    Path(note_id): Path<i64>,
) -> AppResult<StatusCode> {
    if state.library.delete_note(note_id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound("Note not found".to_string()))
    }
}

/// Handler for full-text note search, optionally scoped to one book
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> AppResult<Json<Vec<Note>>> {
    let notes = state.library.search_notes(&params.q, params.book_id).await?;
    Ok(Json(notes))
}
