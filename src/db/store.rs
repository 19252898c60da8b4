/// Data-access abstraction
///
/// Two stores split along ownership lines: `LibraryStore` is everything scoped
/// to a single user (legacy books, shelf entries, notes, quotes), while
/// `CatalogStore` is the shared title pool plus recommendation feedback.
/// Handlers and the recommenders only see these traits; Postgres and the
/// in-memory test store both implement them.
use crate::{
    error::AppResult,
    models::{
        Book, CatalogTitle, FeedbackKind, FeedbackRecord, NewBook, Note, Quote, ReadStatus,
        ShelfEntry, ShelfUpdate,
    },
};

#[cfg(test)]
use mockall::automock;

/// Per-user reading data: legacy books, shelf entries, notes and quotes
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait LibraryStore: Send + Sync {
    async fn books_for_user(&self, user_id: i64) -> AppResult<Vec<Book>>;

    async fn book(&self, book_id: i64) -> AppResult<Option<Book>>;

    async fn insert_book(&self, user_id: i64, book: NewBook) -> AppResult<Book>;

    /// Replaces every mutable field; returns `None` when the id is unknown
    async fn update_book(&self, book_id: i64, book: NewBook) -> AppResult<Option<Book>>;

    async fn delete_book(&self, book_id: i64) -> AppResult<bool>;

    async fn update_progress(&self, book_id: i64, pages_read: i32) -> AppResult<Option<Book>>;

    /// Case-insensitive match against title and author
    async fn search_books(&self, user_id: i64, query: &str) -> AppResult<Vec<Book>>;

    async fn books_by_status(&self, user_id: i64, status: ReadStatus) -> AppResult<Vec<Book>>;

    async fn book_exists(&self, book_id: i64) -> AppResult<bool>;

    /// Shelf entries with the linked catalog genre attached
    async fn shelf_for_user(&self, user_id: i64) -> AppResult<Vec<ShelfEntry>>;

    /// Fails with `InvalidInput` when the title is already on the shelf;
    /// a shelf holds one entry per (user, catalog title)
    async fn add_to_shelf(
        &self,
        user_id: i64,
        catalog_book_id: i64,
        status: ReadStatus,
    ) -> AppResult<ShelfEntry>;

    /// Applies the provided fields; status transitions stamp started/finished
    /// dates the first time they happen
    async fn update_shelf_entry(
        &self,
        entry_id: i64,
        update: ShelfUpdate,
    ) -> AppResult<Option<ShelfEntry>>;

    async fn remove_shelf_entry(&self, entry_id: i64) -> AppResult<bool>;

    async fn notes_for_book(&self, book_id: i64) -> AppResult<Vec<Note>>;

    async fn insert_note(&self, book_id: i64, user_id: i64, content: String) -> AppResult<Note>;

    async fn update_note(&self, note_id: i64, content: String) -> AppResult<Option<Note>>;

    async fn delete_note(&self, note_id: i64) -> AppResult<bool>;

    async fn search_notes(&self, query: &str, book_id: Option<i64>) -> AppResult<Vec<Note>>;

    async fn quotes_for_book(&self, book_id: i64) -> AppResult<Vec<Quote>>;

    async fn insert_quote(
        &self,
        book_id: i64,
        user_id: i64,
        text: String,
        page: Option<i32>,
    ) -> AppResult<Quote>;

    async fn update_quote(
        &self,
        quote_id: i64,
        text: String,
        page: Option<i32>,
    ) -> AppResult<Option<Quote>>;

    async fn delete_quote(&self, quote_id: i64) -> AppResult<bool>;

    async fn search_quotes(&self, query: &str, book_id: Option<i64>) -> AppResult<Vec<Quote>>;
}

/// The shared title pool and the feedback channel against it
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait CatalogStore: Send + Sync {
    /// All titles, optionally filtered to one genre (case-insensitive)
    async fn titles<'a>(&self, genre: Option<&'a str>) -> AppResult<Vec<CatalogTitle>>;

    async fn title(&self, id: i64) -> AppResult<Option<CatalogTitle>>;

    async fn title_exists(&self, id: i64) -> AppResult<bool>;

    /// Distinct genres present in the catalog, sorted
    async fn genres(&self) -> AppResult<Vec<String>>;

    /// Case-insensitive match against title and author, optionally scoped to a genre
    async fn search<'a>(&self, query: &str, genre: Option<&'a str>) -> AppResult<Vec<CatalogTitle>>;

    /// Titles rated at or above `min_rating`, descending average rating,
    /// ties broken by id ascending
    async fn top_rated(&self, min_rating: f64) -> AppResult<Vec<CatalogTitle>>;

    /// Same ordering contract as `top_rated`, restricted to one genre
    /// (case-insensitive match on the stored genre label)
    async fn top_rated_by_genre(
        &self,
        genre: &str,
        min_rating: f64,
    ) -> AppResult<Vec<CatalogTitle>>;

    /// Appends a timestamped feedback row; repeated submissions append again
    async fn save_feedback(
        &self,
        user_id: i64,
        book_id: i64,
        feedback: FeedbackKind,
    ) -> AppResult<FeedbackRecord>;
}
