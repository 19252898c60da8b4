use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use crate::{
    error::{AppError, AppResult},
    models::{ReadStatus, ShelfEntry, ShelfUpdate},
};

use super::AppState;

/// Payload for adding a catalog title to a shelf; defaults to the wish list
#[derive(Debug, Default, Deserialize)]
pub struct AddToShelfRequest {
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ShelfUpdateRequest {
    pub status: Option<String>,
    pub pages_read: Option<i32>,
    pub rating: Option<i32>,
}

impl ShelfUpdateRequest {
    fn into_update(self) -> AppResult<ShelfUpdate> {
        if let Some(rating) = self.rating {
            if !(1..=5).contains(&rating) {
                return Err(AppError::InvalidInput(
                    "Rating must be between 1 and 5".to_string(),
                ));
            }
        }
        Ok(ShelfUpdate {
            status: self.status.as_deref().map(ReadStatus::parse_lenient),
            pages_read: self.pages_read,
            rating: self.rating,
        })
    }
}

/// Handler for listing a user's shelf
pub async fn list_for_user(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> AppResult<Json<Vec<ShelfEntry>>> {
    let entries = state.library.shelf_for_user(user_id).await?;
    Ok(Json(entries))
}

/// Handler for putting a catalog title on a user's shelf
pub async fn add(
    State(state): State<AppState>,
    Path((user_id, catalog_book_id)): Path<(i64, i64)>,
    request: Option<Json<AddToShelfRequest>>,
) -> AppResult<(StatusCode, Json<ShelfEntry>)> {
    if !state.catalog.title_exists(catalog_book_id).await? {
        return Err(AppError::NotFound("Catalog book not found".to_string()));
    }

    let status = request
        .and_then(|Json(r)| r.status)
        .map(|s| ReadStatus::parse_lenient(&s))
        .unwrap_or(ReadStatus::WantToRead);

    let entry = state
        .library
        .add_to_shelf(user_id, catalog_book_id, status)
        .await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

/// Handler for updating a shelf entry's status, progress or rating
pub async fn update(
    State(state): State<AppState>,
    Path(entry_id): Path<i64>,
    Json(request): Json<ShelfUpdateRequest>,
) -> AppResult<Json<ShelfEntry>> {
    let entry = state
        .library
        .update_shelf_entry(entry_id, request.into_update()?)
        .await?
        .ok_or_else(|| AppError::NotFound("Shelf entry not found".to_string()))?;
    Ok(Json(entry))
}

/// Handler for taking a title off the shelf
pub async fn remove(
    State(state): State<AppState>,
    Path(entry_id): Path<i64>,
) -> AppResult<StatusCode> {
    if state.library.remove_shelf_entry(entry_id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound("Shelf entry not found".to_string()))
    }
}
