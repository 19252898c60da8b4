use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::RwLock;

use crate::{
    error::{AppError, AppResult},
    models::{
        Book, CatalogTitle, FeedbackKind, FeedbackRecord, NewBook, Note, Quote, ReadStatus,
        ShelfEntry, ShelfUpdate,
    },
};

use super::store::{CatalogStore, LibraryStore};

/// In-memory implementation of both stores
///
/// Backs the integration tests and database-free local runs. `BTreeMap`
/// keys keep listings in id order, matching the relational store's
/// `ORDER BY id` contract.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Inner>>,
}

#[derive(Default)]
struct Inner {
    next_id: i64,
    books: BTreeMap<i64, Book>,
    shelf: BTreeMap<i64, ShelfEntry>,
    catalog: BTreeMap<i64, CatalogTitle>,
    notes: BTreeMap<i64, Note>,
    quotes: BTreeMap<i64, Quote>,
    feedback: Vec<FeedbackRecord>,
}

impl Inner {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn catalog_genre(&self, catalog_book_id: i64) -> Option<String> {
        self.catalog.get(&catalog_book_id).map(|t| t.genre.clone())
    }
}

fn by_rating_then_id(a: &CatalogTitle, b: &CatalogTitle) -> Ordering {
    let a_rating = a.average_rating.unwrap_or(0.0);
    let b_rating = b.average_rating.unwrap_or(0.0);
    b_rating
        .partial_cmp(&a_rating)
        .unwrap_or(Ordering::Equal)
        .then(a.id.cmp(&b.id))
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a catalog title, assigning a fresh id; the catalog is
    /// read-only through the API, so tests and local seeding go through here
    pub async fn seed_title(&self, mut title: CatalogTitle) -> CatalogTitle {
        let mut inner = self.inner.write().await;
        title.id = inner.next_id();
        inner.catalog.insert(title.id, title.clone());
        title
    }

    /// Number of stored feedback rows (test observability)
    pub async fn feedback_count(&self) -> usize {
        self.inner.read().await.feedback.len()
    }
}

#[async_trait::async_trait]
impl LibraryStore for MemoryStore {
    async fn books_for_user(&self, user_id: i64) -> AppResult<Vec<Book>> {
        let inner = self.inner.read().await;
        Ok(inner
            .books
            .values()
            .filter(|b| b.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn book(&self, book_id: i64) -> AppResult<Option<Book>> {
        Ok(self.inner.read().await.books.get(&book_id).cloned())
    }

    async fn insert_book(&self, user_id: i64, book: NewBook) -> AppResult<Book> {
        let mut inner = self.inner.write().await;
        let id = inner.next_id();
        let book = Book {
            id,
            user_id,
            title: book.title,
            author: book.author,
            genre: book.genre,
            total_pages: book.total_pages,
            pages_read: book.pages_read,
            status: book.status,
            rating: book.rating,
            cover_url: book.cover_url,
        };
        inner.books.insert(id, book.clone());
        Ok(book)
    }

    async fn update_book(&self, book_id: i64, book: NewBook) -> AppResult<Option<Book>> {
        let mut inner = self.inner.write().await;
        let Some(existing) = inner.books.get_mut(&book_id) else {
            return Ok(None);
        };
        existing.title = book.title;
        existing.author = book.author;
        existing.genre = book.genre;
        existing.total_pages = book.total_pages;
        existing.pages_read = book.pages_read;
        existing.status = book.status;
        existing.rating = book.rating;
        existing.cover_url = book.cover_url;
        Ok(Some(existing.clone()))
    }

    async fn delete_book(&self, book_id: i64) -> AppResult<bool> {
        let mut inner = self.inner.write().await;
        inner.notes.retain(|_, n| n.book_id != book_id);
        inner.quotes.retain(|_, q| q.book_id != book_id);
        Ok(inner.books.remove(&book_id).is_some())
    }

    async fn update_progress(&self, book_id: i64, pages_read: i32) -> AppResult<Option<Book>> {
        let mut inner = self.inner.write().await;
        let Some(book) = inner.books.get_mut(&book_id) else {
            return Ok(None);
        };
        book.pages_read = pages_read;
        Ok(Some(book.clone()))
    }

    async fn search_books(&self, user_id: i64, query: &str) -> AppResult<Vec<Book>> {
        let needle = query.to_lowercase();
        let inner = self.inner.read().await;
        Ok(inner
            .books
            .values()
            .filter(|b| {
                b.user_id == user_id
                    && (b.title.to_lowercase().contains(&needle)
                        || b.author.to_lowercase().contains(&needle))
            })
            .cloned()
            .collect())
    }

    async fn books_by_status(&self, user_id: i64, status: ReadStatus) -> AppResult<Vec<Book>> {
        let inner = self.inner.read().await;
        Ok(inner
            .books
            .values()
            .filter(|b| b.user_id == user_id && b.status == status)
            .cloned()
            .collect())
    }

    async fn book_exists(&self, book_id: i64) -> AppResult<bool> {
        Ok(self.inner.read().await.books.contains_key(&book_id))
    }

    async fn shelf_for_user(&self, user_id: i64) -> AppResult<Vec<ShelfEntry>> {
        let inner = self.inner.read().await;
        Ok(inner
            .shelf
            .values()
            .filter(|e| e.user_id == user_id)
            .map(|e| {
                let mut entry = e.clone();
                entry.genre = inner.catalog_genre(e.catalog_book_id);
                entry
            })
            .collect())
    }

    async fn add_to_shelf(
        &self,
        user_id: i64,
        catalog_book_id: i64,
        status: ReadStatus,
    ) -> AppResult<ShelfEntry> {
        let mut inner = self.inner.write().await;
        let duplicate = inner
            .shelf
            .values()
            .any(|e| e.user_id == user_id && e.catalog_book_id == catalog_book_id);
        if duplicate {
            return Err(AppError::InvalidInput(
                "Book is already on your shelf".to_string(),
            ));
        }

        let now = Utc::now();
        let id = inner.next_id();
        let entry = ShelfEntry {
            id,
            user_id,
            catalog_book_id,
            status,
            pages_read: 0,
            rating: None,
            genre: inner.catalog_genre(catalog_book_id),
            added_date: now,
            started_date: status.is_read_or_reading().then_some(now),
            finished_date: (status == ReadStatus::Read).then_some(now),
        };
        inner.shelf.insert(id, entry.clone());
        Ok(entry)
    }

    async fn update_shelf_entry(
        &self,
        entry_id: i64,
        update: ShelfUpdate,
    ) -> AppResult<Option<ShelfEntry>> {
        let mut inner = self.inner.write().await;
        let genre = inner
            .shelf
            .get(&entry_id)
            .and_then(|e| inner.catalog_genre(e.catalog_book_id));
        let Some(entry) = inner.shelf.get_mut(&entry_id) else {
            return Ok(None);
        };

        if let Some(status) = update.status {
            entry.status = status;
        }
        if let Some(pages_read) = update.pages_read {
            entry.pages_read = pages_read;
        }
        if update.rating.is_some() {
            entry.rating = update.rating;
        }

        let now = Utc::now();
        if entry.status.is_read_or_reading() && entry.started_date.is_none() {
            entry.started_date = Some(now);
        }
        if entry.status == ReadStatus::Read && entry.finished_date.is_none() {
            entry.finished_date = Some(now);
        }

        let mut result = entry.clone();
        result.genre = genre;
        Ok(Some(result))
    }

    async fn remove_shelf_entry(&self, entry_id: i64) -> AppResult<bool> {
        Ok(self.inner.write().await.shelf.remove(&entry_id).is_some())
    }

    async fn notes_for_book(&self, book_id: i64) -> AppResult<Vec<Note>> {
        let inner = self.inner.read().await;
        Ok(inner
            .notes
            .values()
            .filter(|n| n.book_id == book_id)
            .cloned()
            .collect())
    }

    async fn insert_note(&self, book_id: i64, user_id: i64, content: String) -> AppResult<Note> {
        let mut inner = self.inner.write().await;
        let id = inner.next_id();
        let note = Note {
            id,
            book_id,
            user_id,
            content,
            created_at: Utc::now(),
        };
        inner.notes.insert(id, note.clone());
        Ok(note)
    }

    async fn update_note(&self, note_id: i64, content: String) -> AppResult<Option<Note>> {
        let mut inner = self.inner.write().await;
        let Some(note) = inner.notes.get_mut(&note_id) else {
            return Ok(None);
        };
        note.content = content;
        Ok(Some(note.clone()))
    }

    async fn delete_note(&self, note_id: i64) -> AppResult<bool> {
        Ok(self.inner.write().await.notes.remove(&note_id).is_some())
    }

    async fn search_notes(&self, query: &str, book_id: Option<i64>) -> AppResult<Vec<Note>> {
        let needle = query.to_lowercase();
        let inner = self.inner.read().await;
        Ok(inner
            .notes
            .values()
            .filter(|n| book_id.map_or(true, |id| n.book_id == id))
            .filter(|n| n.content.to_lowercase().contains(&needle))
            .cloned()
            .collect())
    }

    async fn quotes_for_book(&self, book_id: i64) -> AppResult<Vec<Quote>> {
        let inner = self.inner.read().await;
        Ok(inner
            .quotes
            .values()
            .filter(|q| q.book_id == book_id)
            .cloned()
            .collect())
    }

    async fn insert_quote(
        &self,
        book_id: i64,
        user_id: i64,
        text: String,
        page: Option<i32>,
    ) -> AppResult<Quote> {
        let mut inner = self.inner.write().await;
        let id = inner.next_id();
        let quote = Quote {
            id,
            book_id,
            user_id,
            text,
            page,
            created_at: Utc::now(),
        };
        inner.quotes.insert(id, quote.clone());
        Ok(quote)
    }

    async fn update_quote(
        &self,
        quote_id: i64,
        text: String,
        page: Option<i32>,
    ) -> AppResult<Option<Quote>> {
        let mut inner = self.inner.write().await;
        let Some(quote) = inner.quotes.get_mut(&quote_id) else {
            return Ok(None);
        };
        quote.text = text;
        quote.page = page;
        Ok(Some(quote.clone()))
    }

    async fn delete_quote(&self, quote_id: i64) -> AppResult<bool> {
        Ok(self.inner.write().await.quotes.remove(&quote_id).is_some())
    }

    async fn search_quotes(&self, query: &str, book_id: Option<i64>) -> AppResult<Vec<Quote>> {
        let needle = query.to_lowercase();
        let inner = self.inner.read().await;
        Ok(inner
            .quotes
            .values()
            .filter(|q| book_id.map_or(true, |id| q.book_id == id))
            .filter(|q| q.text.to_lowercase().contains(&needle))
            .cloned()
            .collect())
    }
}

#[async_trait::async_trait]
impl CatalogStore for MemoryStore {
    async fn titles<'a>(&self, genre: Option<&'a str>) -> AppResult<Vec<CatalogTitle>> {
        let inner = self.inner.read().await;
        let mut titles: Vec<CatalogTitle> = inner
            .catalog
            .values()
            .filter(|t| genre.map_or(true, |g| t.genre.eq_ignore_ascii_case(g)))
            .cloned()
            .collect();
        titles.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(titles)
    }

    async fn title(&self, id: i64) -> AppResult<Option<CatalogTitle>> {
        Ok(self.inner.read().await.catalog.get(&id).cloned())
    }

    async fn title_exists(&self, id: i64) -> AppResult<bool> {
        Ok(self.inner.read().await.catalog.contains_key(&id))
    }

    async fn genres(&self) -> AppResult<Vec<String>> {
        let inner = self.inner.read().await;
        let genres: BTreeSet<String> =
            inner.catalog.values().map(|t| t.genre.clone()).collect();
        Ok(genres.into_iter().collect())
    }

    async fn search<'a>(&self, query: &str, genre: Option<&'a str>) -> AppResult<Vec<CatalogTitle>> {
        let needle = query.to_lowercase();
        let inner = self.inner.read().await;
        let mut titles: Vec<CatalogTitle> = inner
            .catalog
            .values()
            .filter(|t| genre.map_or(true, |g| t.genre.eq_ignore_ascii_case(g)))
            .filter(|t| {
                t.title.to_lowercase().contains(&needle)
                    || t.author.to_lowercase().contains(&needle)
            })
            .cloned()
            .collect();
        titles.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(titles)
    }

    async fn top_rated(&self, min_rating: f64) -> AppResult<Vec<CatalogTitle>> {
        let inner = self.inner.read().await;
        let mut titles: Vec<CatalogTitle> = inner
            .catalog
            .values()
            .filter(|t| t.average_rating.is_some_and(|r| r >= min_rating))
            .cloned()
            .collect();
        titles.sort_by(by_rating_then_id);
        Ok(titles)
    }

    async fn top_rated_by_genre(
        &self,
        genre: &str,
        min_rating: f64,
    ) -> AppResult<Vec<CatalogTitle>> {
        let inner = self.inner.read().await;
        let mut titles: Vec<CatalogTitle> = inner
            .catalog
            .values()
            .filter(|t| t.genre.eq_ignore_ascii_case(genre))
            .filter(|t| t.average_rating.is_some_and(|r| r >= min_rating))
            .cloned()
            .collect();
        titles.sort_by(by_rating_then_id);
        Ok(titles)
    }

    async fn save_feedback(
        &self,
        user_id: i64,
        book_id: i64,
        feedback: FeedbackKind,
    ) -> AppResult<FeedbackRecord> {
        let mut inner = self.inner.write().await;
        let id = inner.next_id();
        let record = FeedbackRecord {
            id,
            user_id,
            book_id,
            feedback,
            created_at: Utc::now(),
        };
        inner.feedback.push(record.clone());
        Ok(record)
    }
}
