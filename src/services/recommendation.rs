use std::collections::HashSet;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::{
    db::{CatalogStore, LibraryStore},
    error::{AppError, AppResult},
    models::{CatalogTitle, FeedbackRecord, RecommendationItem, Strategy},
};

use super::profile::{ReadingHistoryItem, TasteProfile};

/// Hard cap on the size of one recommendation response
pub const MAX_RESULTS: usize = 10;

/// How many of the user's heaviest genres the genre strategy considers
const TOP_GENRES: usize = 3;
/// Candidates taken per genre by the genre strategy
const GENRE_STRATEGY_LIMIT: usize = 4;
/// Candidates taken per loved genre by the rating strategy
const RATING_STRATEGY_LIMIT: usize = 3;

const GENRE_MIN_RATING: f64 = 4.0;
const RATING_MIN_RATING: f64 = 4.3;
const FALLBACK_MIN_RATING: f64 = 4.5;

/// Recommends catalog titles the user has not shelved yet
///
/// Strategies run in priority order over the same running selection, so the
/// first strategy to pick a title owns its reason ("first writer wins").
#[derive(Clone)]
pub struct CatalogRecommender {
    library: Arc<dyn LibraryStore>,
    catalog: Arc<dyn CatalogStore>,
}

impl CatalogRecommender {
    pub fn new(library: Arc<dyn LibraryStore>, catalog: Arc<dyn CatalogStore>) -> Self {
        Self { library, catalog }
    }

    pub async fn recommend(
        &self,
        user_id: i64,
        refresh: bool,
    ) -> AppResult<Vec<RecommendationItem>> {
        let mut rng = StdRng::from_entropy();
        self.recommend_with_rng(user_id, refresh, &mut rng).await
    }

    /// Same pipeline with a caller-provided RNG, so tests can pin the shuffle
    pub async fn recommend_with_rng<R: Rng + ?Sized>(
        &self,
        user_id: i64,
        refresh: bool,
        rng: &mut R,
    ) -> AppResult<Vec<RecommendationItem>> {
        let books = self.library.books_for_user(user_id).await?;
        let shelf = self.library.shelf_for_user(user_id).await?;

        let owned: HashSet<i64> = shelf.iter().map(|e| e.catalog_book_id).collect();
        let profile = TasteProfile::build(
            books
                .iter()
                .map(ReadingHistoryItem::from_book)
                .chain(shelf.iter().map(ReadingHistoryItem::from_shelf)),
        );

        tracing::debug!(
            user_id,
            genres = profile.genre_weights.len(),
            loved = profile.loved_genres.len(),
            owned = owned.len(),
            "Built taste profile"
        );

        let mut picks = Picks::new(owned);

        // Genre strategy: the heaviest genres in the user's history
        for top_genre in profile.top_genres(TOP_GENRES) {
            if picks.is_full() {
                break;
            }
            let candidates = self
                .catalog
                .top_rated_by_genre(&top_genre, GENRE_MIN_RATING)
                .await?;
            picks.select(
                &candidates,
                GENRE_STRATEGY_LIMIT,
                |_| format!("Popular in {} (your favorite genre)", top_genre),
                Strategy::Genre,
            );
        }

        // Rating strategy: genres of highly rated books, repeats included.
        // A repeat is harmless since selection is a no-op on ids already taken.
        for loved_genre in &profile.loved_genres {
            if picks.is_full() {
                break;
            }
            let candidates = self
                .catalog
                .top_rated_by_genre(loved_genre, RATING_MIN_RATING)
                .await?;
            picks.select(
                &candidates,
                RATING_STRATEGY_LIMIT,
                |_| format!("Because you loved books in {}", loved_genre),
                Strategy::Rating,
            );
        }

        // Fallback for users with no genre signal at all
        if picks.is_empty() {
            let candidates = self.catalog.top_rated(FALLBACK_MIN_RATING).await?;
            picks.select(
                &candidates,
                MAX_RESULTS,
                |_| "Highly rated across all readers".to_string(),
                Strategy::Popular,
            );
        }

        let mut result = picks.into_items();
        if refresh && result.len() > 1 {
            result.shuffle(rng);
        }

        Ok(result)
    }

    /// Records a thumbs-up/down signal against a catalog title
    ///
    /// Every submission appends a fresh row; nothing is deduplicated or
    /// aggregated here.
    pub async fn submit_feedback(
        &self,
        user_id: i64,
        catalog_book_id: i64,
        raw_feedback: &str,
    ) -> AppResult<FeedbackRecord> {
        let kind = crate::models::FeedbackKind::parse(raw_feedback).ok_or_else(|| {
            AppError::InvalidInput("Feedback must be 'UP' or 'DOWN'".to_string())
        })?;

        if !self.catalog.title_exists(catalog_book_id).await? {
            return Err(AppError::NotFound("Catalog book not found".to_string()));
        }

        self.catalog
            .save_feedback(user_id, catalog_book_id, kind)
            .await
    }
}

/// Running selection shared by every strategy: excludes owned titles,
/// deduplicates across strategies and enforces the overall cap
struct Picks {
    owned: HashSet<i64>,
    seen: HashSet<i64>,
    items: Vec<RecommendationItem>,
}

impl Picks {
    fn new(owned: HashSet<i64>) -> Self {
        Self {
            owned,
            seen: HashSet::new(),
            items: Vec::new(),
        }
    }

    /// Takes up to `limit` new candidates in source order
    fn select(
        &mut self,
        candidates: &[CatalogTitle],
        limit: usize,
        reason: impl Fn(&CatalogTitle) -> String,
        strategy: Strategy,
    ) {
        let mut taken = 0;
        for title in candidates {
            if self.is_full() || taken >= limit {
                break;
            }
            if self.owned.contains(&title.id) || !self.seen.insert(title.id) {
                continue;
            }
            self.items.push(catalog_recommendation(
                title,
                reason(title),
                strategy,
            ));
            taken += 1;
        }
    }

    fn is_full(&self) -> bool {
        self.items.len() >= MAX_RESULTS
    }

    fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn into_items(self) -> Vec<RecommendationItem> {
        self.items
    }
}

fn catalog_recommendation(
    title: &CatalogTitle,
    reason: String,
    strategy: Strategy,
) -> RecommendationItem {
    RecommendationItem {
        book_id: title.id,
        title: title.title.clone(),
        author: title.author.clone(),
        genre: Some(title.genre.clone()),
        description: Some(title.description.clone()),
        rating: title.average_rating.map(|r| r as i32),
        cover_url: title.cover_url.clone(),
        // Catalog titles carry no per-user state
        status: None,
        total_pages: title.total_pages,
        pages_read: 0,
        reason,
        strategy,
    }
}
