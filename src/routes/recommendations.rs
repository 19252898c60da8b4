use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::Deserialize;

use crate::{
    error::AppResult,
    middleware::request_id::RequestId,
    models::{FeedbackRecord, RecommendationItem},
    services::{CatalogRecommender, LibraryRecommender},
};

use super::AppState;

/// Which candidate pool to recommend from
///
/// `catalog` is the default and the richer engine; `library` is the older
/// variant that only looks at the user's own unfinished books.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    #[default]
    Catalog,
    Library,
}

#[derive(Debug, Deserialize)]
pub struct RecommendationQuery {
    #[serde(default)]
    refresh: bool,
    #[serde(default)]
    source: Source,
}

#[derive(Debug, Deserialize)]
pub struct SourceQuery {
    #[serde(default)]
    source: Source,
}

#[derive(Debug, Deserialize)]
pub struct FeedbackRequest {
    feedback: String,
}

/// Handler for the recommendations endpoint
pub async fn recommend(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Path(user_id): Path<i64>,
    Query(params): Query<RecommendationQuery>,
) -> AppResult<Json<Vec<RecommendationItem>>> {
    tracing::info!(
        request_id = %request_id,
        user_id,
        refresh = params.refresh,
        source = ?params.source,
        "Computing recommendations"
    );

    let items = match params.source {
        Source::Library => {
            LibraryRecommender::new(state.library.clone(), state.catalog.clone())
                .recommend(user_id, params.refresh)
                .await?
        }
        Source::Catalog => {
            CatalogRecommender::new(state.library.clone(), state.catalog.clone())
                .recommend(user_id, params.refresh)
                .await?
        }
    };

    tracing::info!(
        request_id = %request_id,
        count = items.len(),
        "Recommendations computed"
    );

    Ok(Json(items))
}

/// Handler for thumbs-up/down feedback on a recommendation
pub async fn submit_feedback(
    State(state): State<AppState>,
    Path((user_id, book_id)): Path<(i64, i64)>,
    Query(params): Query<SourceQuery>,
    Json(request): Json<FeedbackRequest>,
) -> AppResult<Json<FeedbackRecord>> {
    let record = match params.source {
        Source::Library => {
            LibraryRecommender::new(state.library.clone(), state.catalog.clone())
                .submit_feedback(user_id, book_id, &request.feedback)
                .await?
        }
        Source::Catalog => {
            CatalogRecommender::new(state.library.clone(), state.catalog.clone())
                .submit_feedback(user_id, book_id, &request.feedback)
                .await?
        }
    };

    Ok(Json(record))
}
