use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;

use crate::{
    error::{AppError, AppResult},
    models::CatalogTitle,
};

use super::AppState;

/// Default rating floor for the public top-rated listing
const DEFAULT_TOP_RATED_MIN: f64 = 4.5;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    genre: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TopRatedQuery {
    min: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    q: String,
    genre: Option<String>,
}

/// Handler for browsing the catalog, optionally by genre
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<ListQuery>,
) -> AppResult<Json<Vec<CatalogTitle>>> {
    let titles = state.catalog.titles(params.genre.as_deref()).await?;
    Ok(Json(titles))
}

/// Handler for fetching one catalog title
pub async fn get_one(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<CatalogTitle>> {
    let title = state
        .catalog
        .title(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Catalog book not found".to_string()))?;
    Ok(Json(title))
}

/// Handler for listing the genres present in the catalog
pub async fn genres(State(state): State<AppState>) -> AppResult<Json<Vec<String>>> {
    let genres = state.catalog.genres().await?;
    Ok(Json(genres))
}

/// Handler for the top-rated listing
pub async fn top_rated(
    State(state): State<AppState>,
    Query(params): Query<TopRatedQuery>,
) -> AppResult<Json<Vec<CatalogTitle>>> {
    let min = params.min.unwrap_or(DEFAULT_TOP_RATED_MIN);
    let titles = state.catalog.top_rated(min).await?;
    Ok(Json(titles))
}

/// Handler for catalog search by title or author
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> AppResult<Json<Vec<CatalogTitle>>> {
    let titles = state
        .catalog
        .search(&params.q, params.genre.as_deref())
        .await?;
    Ok(Json(titles))
}
