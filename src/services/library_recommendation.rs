use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::{
    db::{CatalogStore, LibraryStore},
    error::{AppError, AppResult},
    models::{Book, FeedbackRecord, ReadStatus, RecommendationItem, Strategy},
};

use super::genre;
use super::recommendation::MAX_RESULTS;

/// How many of the user's most-finished genres drive the genre strategy
const TOP_GENRES: usize = 2;
/// Minimum star rating for a finished book to seed the rating strategy
const LOVED_RATING: i32 = 4;

/// Recommends from the user's own library: books added but never finished
///
/// The older of the two engines; it predates the shared catalog, so the
/// candidate pool is the user's unfinished books rather than catalog titles.
/// The feedback table is shared with the catalog engine.
#[derive(Clone)]
pub struct LibraryRecommender {
    library: Arc<dyn LibraryStore>,
    catalog: Arc<dyn CatalogStore>,
}

impl LibraryRecommender {
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
        if books.is_empty() {
            return Ok(Vec::new());
        }

        // Only finishing a book counts as signal here; candidates are
        // everything not yet finished
        let finished: Vec<&Book> = books
            .iter()
            .filter(|b| b.status == ReadStatus::Read)
            .collect();

        let mut genre_counts: BTreeMap<String, u32> = BTreeMap::new();
        for book in &finished {
            if let Some(g) = normalized_genre(book) {
                *genre_counts.entry(g).or_insert(0) += 1;
            }
        }

        let mut seen: HashSet<i64> = HashSet::new();
        let mut items: Vec<RecommendationItem> = Vec::new();

        // Genre strategy: unfinished books in the user's most-finished genres,
        // best rated first
        for top_genre in top_genres(&genre_counts, TOP_GENRES) {
            for book in candidates_in_genre(&books, &top_genre, None) {
                if items.len() >= MAX_RESULTS {
                    break;
                }
                if seen.insert(book.id) {
                    items.push(library_recommendation(
                        book,
                        format!("Top genre: {}", top_genre),
                        Strategy::Genre,
                    ));
                }
            }
        }

        // Rating strategy: for every loved finished book, surface unfinished
        // books in the same genre, crediting the loved title in the reason
        for favorite in finished
            .iter()
            .filter(|b| b.rating.unwrap_or(0) >= LOVED_RATING)
        {
            let Some(favorite_genre) = normalized_genre(favorite) else {
                continue;
            };
            for book in candidates_in_genre(&books, &favorite_genre, Some(favorite.id)) {
                if items.len() >= MAX_RESULTS {
                    break;
                }
                if seen.insert(book.id) {
                    items.push(library_recommendation(
                        book,
                        format!(
                            "Because you rated \"{}\" {} stars",
                            favorite.title,
                            favorite.rating.unwrap_or(0)
                        ),
                        Strategy::Rating,
                    ));
                }
            }
        }

        // Fallback: anything unfinished, best rated first
        if items.is_empty() {
            let mut unfinished: Vec<&Book> = books
                .iter()
                .filter(|b| b.status != ReadStatus::Read)
                .collect();
            unfinished.sort_by(|a, b| b.rating.unwrap_or(0).cmp(&a.rating.unwrap_or(0)));
            for book in unfinished {
                if items.len() >= MAX_RESULTS {
                    break;
                }
                if seen.insert(book.id) {
                    items.push(library_recommendation(
                        book,
                        "Unread in your library".to_string(),
                        Strategy::Fallback,
                    ));
                }
            }
        }

        if refresh && items.len() > 1 {
            items.shuffle(rng);
        }

        Ok(items)
    }

    /// Records feedback against a legacy book
    pub async fn submit_feedback(
        &self,
        user_id: i64,
        book_id: i64,
        raw_feedback: &str,
    ) -> AppResult<FeedbackRecord> {
        let kind = crate::models::FeedbackKind::parse(raw_feedback).ok_or_else(|| {
            AppError::InvalidInput("Feedback must be 'UP' or 'DOWN'".to_string())
        })?;

        if !self.library.book_exists(book_id).await? {
            return Err(AppError::NotFound("Book not found".to_string()));
        }

        self.catalog.save_feedback(user_id, book_id, kind).await
    }
}

fn normalized_genre(book: &Book) -> Option<String> {
    book.genre.as_deref().and_then(genre::normalize)
}

/// Genres by finished count, heaviest first; ties resolve alphabetically
fn top_genres(counts: &BTreeMap<String, u32>, limit: usize) -> Vec<String> {
    let mut ranked: Vec<(&String, &u32)> = counts.iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(a.1));
    ranked
        .into_iter()
        .take(limit)
        .map(|(g, _)| g.clone())
        .collect()
}

/// Unfinished books in a genre, best rated first; ties keep library order
fn candidates_in_genre<'a>(
    books: &'a [Book],
    wanted: &str,
    exclude_id: Option<i64>,
) -> Vec<&'a Book> {
    let mut candidates: Vec<&Book> = books
        .iter()
        .filter(|b| b.status != ReadStatus::Read)
        .filter(|b| exclude_id != Some(b.id))
        .filter(|b| normalized_genre(b).as_deref() == Some(wanted))
        .collect();
    candidates.sort_by(|a, b| b.rating.unwrap_or(0).cmp(&a.rating.unwrap_or(0)));
    candidates
}

fn library_recommendation(book: &Book, reason: String, strategy: Strategy) -> RecommendationItem {
    RecommendationItem {
        book_id: book.id,
        title: book.title.clone(),
        author: book.author.clone(),
        genre: book.genre.clone(),
        description: None,
        rating: book.rating,
        cover_url: book.cover_url.clone(),
        status: Some(book.status),
        total_pages: Some(book.total_pages),
        pages_read: book.pages_read,
        reason,
        strategy,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::store::{MockCatalogStore, MockLibraryStore};

    fn book(id: i64, genre: &str, status: ReadStatus, rating: Option<i32>) -> Book {
        Book {
            id,
            user_id: 1,
            title: format!("Book {id}"),
            author: "Author".to_string(),
            genre: Some(genre.to_string()),
            total_pages: 200,
            pages_read: 0,
            status,
            rating,
            cover_url: None,
        }
    }

    fn recommender(books: Vec<Book>) -> LibraryRecommender {
        let mut library = MockLibraryStore::new();
        library
            .expect_books_for_user()
            .returning(move |_| Ok(books.clone()));
        LibraryRecommender::new(Arc::new(library), Arc::new(MockCatalogStore::new()))
    }

    #[tokio::test]
    async fn test_empty_library_yields_nothing() {
        let result = recommender(vec![]).recommend(1, false).await.unwrap();
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn test_unfinished_books_in_top_genre_come_first() {
        let result = recommender(vec![
            book(1, "Fantasy", ReadStatus::Read, Some(3)),
            book(2, "Fantasy", ReadStatus::Read, Some(3)),
            book(3, "Fantasy", ReadStatus::WantToRead, Some(2)),
            book(4, "Fantasy", ReadStatus::Reading, Some(5)),
            book(5, "Horror", ReadStatus::WantToRead, None),
        ])
        .recommend(1, false)
        .await
        .unwrap();

        // Fantasy is the only finished genre; its candidates sort by rating
        let ids: Vec<i64> = result.iter().map(|r| r.book_id).collect();
        assert_eq!(ids, vec![4, 3]);
        assert!(result.iter().all(|r| r.strategy == Strategy::Genre));
        assert_eq!(result[0].reason, "Top genre: Fantasy");
    }

    #[tokio::test]
    async fn test_rating_strategy_credits_the_loved_title() {
        let result = recommender(vec![
            book(1, "Mystery", ReadStatus::Read, Some(5)),
            book(2, "Sci-Fi", ReadStatus::Read, None),
            book(3, "Sci-Fi", ReadStatus::Read, None),
            book(4, "Mystery", ReadStatus::WantToRead, None),
            book(5, "Romance", ReadStatus::Read, None),
            book(6, "Romance", ReadStatus::Read, None),
        ])
        .recommend(1, false)
        .await
        .unwrap();

        // Romance and Sci-Fi win the finished counts but have no unfinished
        // candidates; the loved Mystery read carries the pick instead
        let rated: Vec<&RecommendationItem> = result
            .iter()
            .filter(|r| r.strategy == Strategy::Rating)
            .collect();
        assert_eq!(rated.len(), 1);
        assert_eq!(rated[0].book_id, 4);
        assert_eq!(rated[0].reason, "Because you rated \"Book 1\" 5 stars");
    }

    #[tokio::test]
    async fn test_fallback_offers_unread_by_rating() {
        let result = recommender(vec![
            book(1, "Fantasy", ReadStatus::WantToRead, Some(2)),
            book(2, "Horror", ReadStatus::WantToRead, Some(4)),
        ])
        .recommend(1, false)
        .await
        .unwrap();

        let ids: Vec<i64> = result.iter().map(|r| r.book_id).collect();
        assert_eq!(ids, vec![2, 1]);
        assert!(result.iter().all(|r| r.strategy == Strategy::Fallback));
        assert!(result.iter().all(|r| r.reason == "Unread in your library"));
    }

    #[tokio::test]
    async fn test_feedback_validates_against_the_library() {
        let mut library = MockLibraryStore::new();
        library.expect_book_exists().returning(|_| Ok(false));
        let recommender =
            LibraryRecommender::new(Arc::new(library), Arc::new(MockCatalogStore::new()));

        let err = recommender.submit_feedback(1, 9, "UP").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
