use chrono::{DateTime, Utc};
use sqlx::{postgres::PgPoolOptions, FromRow, PgPool};

use crate::{
    error::{AppError, AppResult},
    models::{
        Book, CatalogTitle, FeedbackKind, FeedbackRecord, NewBook, Note, Quote, ReadStatus,
        ShelfEntry, ShelfUpdate,
    },
};

use super::cache::{CacheKey, CatalogCache};
use super::store::{CatalogStore, LibraryStore};

/// Creates a PostgreSQL connection pool
///
/// Establishes a pool of database connections for efficient reuse.
/// The pool automatically manages connection lifecycle and limits.
pub async fn create_pool(database_url: &str) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await?;

    Ok(pool)
}

/// Relational implementation of both stores
///
/// Statuses are stored as text and parsed leniently on the way out, so rows
/// written by earlier versions of the system never break a read.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
    cache: Option<CatalogCache>,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool, cache: None }
    }

    /// Attaches a Redis cache for top-rated catalog queries
    pub fn with_cache(pool: PgPool, cache: CatalogCache) -> Self {
        Self {
            pool,
            cache: Some(cache),
        }
    }

    async fn shelf_entry_row(&self, entry_id: i64) -> AppResult<Option<ShelfRow>> {
        let row = sqlx::query_as::<_, ShelfRow>(
            "SELECT se.id, se.user_id, se.catalog_book_id, se.status, se.pages_read, \
                    se.rating, ct.genre AS genre, se.added_date, se.started_date, se.finished_date \
             FROM shelf_entries se \
             JOIN catalog_titles ct ON ct.id = se.catalog_book_id \
             WHERE se.id = $1",
        )
        .bind(entry_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }
}

// Row types mirror the table layout; statuses stay raw strings here and are
// parsed when converting into domain models.

#[derive(FromRow)]
struct BookRow {
    id: i64,
    user_id: i64,
    title: String,
    author: String,
    genre: Option<String>,
    total_pages: i32,
    pages_read: i32,
    status: String,
    rating: Option<i32>,
    cover_url: Option<String>,
}

impl From<BookRow> for Book {
    fn from(row: BookRow) -> Self {
        Book {
            id: row.id,
            user_id: row.user_id,
            title: row.title,
            author: row.author,
            genre: row.genre,
            total_pages: row.total_pages,
            pages_read: row.pages_read,
            status: ReadStatus::parse_lenient(&row.status),
            rating: row.rating,
            cover_url: row.cover_url,
        }
    }
}

#[derive(FromRow)]
struct ShelfRow {
    id: i64,
    user_id: i64,
    catalog_book_id: i64,
    status: String,
    pages_read: i32,
    rating: Option<i32>,
    genre: Option<String>,
    added_date: DateTime<Utc>,
    started_date: Option<DateTime<Utc>>,
    finished_date: Option<DateTime<Utc>>,
}

impl From<ShelfRow> for ShelfEntry {
    fn from(row: ShelfRow) -> Self {
        ShelfEntry {
            id: row.id,
            user_id: row.user_id,
            catalog_book_id: row.catalog_book_id,
            status: ReadStatus::parse_lenient(&row.status),
            pages_read: row.pages_read,
            rating: row.rating,
            genre: row.genre,
            added_date: row.added_date,
            started_date: row.started_date,
            finished_date: row.finished_date,
        }
    }
}

#[derive(FromRow)]
struct CatalogRow {
    id: i64,
    title: String,
    author: String,
    genre: String,
    description: String,
    cover_url: Option<String>,
    average_rating: Option<f64>,
    total_pages: Option<i32>,
    isbn: Option<String>,
    published_year: Option<i32>,
}

impl From<CatalogRow> for CatalogTitle {
    fn from(row: CatalogRow) -> Self {
        CatalogTitle {
            id: row.id,
            title: row.title,
            author: row.author,
            genre: row.genre,
            description: row.description,
            cover_url: row.cover_url,
            average_rating: row.average_rating,
            total_pages: row.total_pages,
            isbn: row.isbn,
            published_year: row.published_year,
        }
    }
}

#[derive(FromRow)]
struct NoteRow {
    id: i64,
    book_id: i64,
    user_id: i64,
    content: String,
    created_at: DateTime<Utc>,
}

impl From<NoteRow> for Note {
    fn from(row: NoteRow) -> Self {
        Note {
            id: row.id,
            book_id: row.book_id,
            user_id: row.user_id,
            content: row.content,
            created_at: row.created_at,
        }
    }
}

#[derive(FromRow)]
struct QuoteRow {
    id: i64,
    book_id: i64,
    user_id: i64,
    text: String,
    page: Option<i32>,
    created_at: DateTime<Utc>,
}

impl From<QuoteRow> for Quote {
    fn from(row: QuoteRow) -> Self {
        Quote {
            id: row.id,
            book_id: row.book_id,
            user_id: row.user_id,
            text: row.text,
            page: row.page,
            created_at: row.created_at,
        }
    }
}

const BOOK_COLUMNS: &str =
    "id, user_id, title, author, genre, total_pages, pages_read, status, rating, cover_url";

const CATALOG_COLUMNS: &str = "id, title, author, genre, description, cover_url, \
                               average_rating, total_pages, isbn, published_year";

#[async_trait::async_trait]
impl LibraryStore for PostgresStore {
    async fn books_for_user(&self, user_id: i64) -> AppResult<Vec<Book>> {
        let rows = sqlx::query_as::<_, BookRow>(&format!(
            "SELECT {BOOK_COLUMNS} FROM books WHERE user_id = $1 ORDER BY id"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Book::from).collect())
    }

    async fn book(&self, book_id: i64) -> AppResult<Option<Book>> {
        let row = sqlx::query_as::<_, BookRow>(&format!(
            "SELECT {BOOK_COLUMNS} FROM books WHERE id = $1"
        ))
        .bind(book_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Book::from))
    }

    async fn insert_book(&self, user_id: i64, book: NewBook) -> AppResult<Book> {
        let row = sqlx::query_as::<_, BookRow>(&format!(
            "INSERT INTO books (user_id, title, author, genre, total_pages, pages_read, status, rating, cover_url) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING {BOOK_COLUMNS}"
        ))
        .bind(user_id)
        .bind(&book.title)
        .bind(&book.author)
        .bind(&book.genre)
        .bind(book.total_pages)
        .bind(book.pages_read)
        .bind(book.status.as_str())
        .bind(book.rating)
        .bind(&book.cover_url)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn update_book(&self, book_id: i64, book: NewBook) -> AppResult<Option<Book>> {
        let row = sqlx::query_as::<_, BookRow>(&format!(
            "UPDATE books SET title = $2, author = $3, genre = $4, total_pages = $5, \
                    pages_read = $6, status = $7, rating = $8, cover_url = $9 \
             WHERE id = $1 \
             RETURNING {BOOK_COLUMNS}"
        ))
        .bind(book_id)
        .bind(&book.title)
        .bind(&book.author)
        .bind(&book.genre)
        .bind(book.total_pages)
        .bind(book.pages_read)
        .bind(book.status.as_str())
        .bind(book.rating)
        .bind(&book.cover_url)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Book::from))
    }

    async fn delete_book(&self, book_id: i64) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(book_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn update_progress(&self, book_id: i64, pages_read: i32) -> AppResult<Option<Book>> {
        let row = sqlx::query_as::<_, BookRow>(&format!(
            "UPDATE books SET pages_read = $2 WHERE id = $1 RETURNING {BOOK_COLUMNS}"
        ))
        .bind(book_id)
        .bind(pages_read)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Book::from))
    }

    async fn search_books(&self, user_id: i64, query: &str) -> AppResult<Vec<Book>> {
        let pattern = format!("%{}%", query);
        let rows = sqlx::query_as::<_, BookRow>(&format!(
            "SELECT {BOOK_COLUMNS} FROM books \
             WHERE user_id = $1 AND (title ILIKE $2 OR author ILIKE $2) \
             ORDER BY id"
        ))
        .bind(user_id)
        .bind(pattern)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Book::from).collect())
    }

    async fn books_by_status(&self, user_id: i64, status: ReadStatus) -> AppResult<Vec<Book>> {
        let rows = sqlx::query_as::<_, BookRow>(&format!(
            "SELECT {BOOK_COLUMNS} FROM books \
             WHERE user_id = $1 AND UPPER(status) = $2 \
             ORDER BY id"
        ))
        .bind(user_id)
        .bind(status.as_str())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Book::from).collect())
    }

    async fn book_exists(&self, book_id: i64) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM books WHERE id = $1)")
            .bind(book_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(exists)
    }

    async fn shelf_for_user(&self, user_id: i64) -> AppResult<Vec<ShelfEntry>> {
        let rows = sqlx::query_as::<_, ShelfRow>(
            "SELECT se.id, se.user_id, se.catalog_book_id, se.status, se.pages_read, \
                    se.rating, ct.genre AS genre, se.added_date, se.started_date, se.finished_date \
             FROM shelf_entries se \
             JOIN catalog_titles ct ON ct.id = se.catalog_book_id \
             WHERE se.user_id = $1 \
             ORDER BY se.id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(ShelfEntry::from).collect())
    }

    async fn add_to_shelf(
        &self,
        user_id: i64,
        catalog_book_id: i64,
        status: ReadStatus,
    ) -> AppResult<ShelfEntry> {
        let already_shelved: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM shelf_entries WHERE user_id = $1 AND catalog_book_id = $2)",
        )
        .bind(user_id)
        .bind(catalog_book_id)
        .fetch_one(&self.pool)
        .await?;

        if already_shelved {
            return Err(AppError::InvalidInput(
                "Book is already on your shelf".to_string(),
            ));
        }

        let now = Utc::now();
        let started = status.is_read_or_reading().then_some(now);
        let finished = (status == ReadStatus::Read).then_some(now);

        let entry_id: i64 = sqlx::query_scalar(
            "INSERT INTO shelf_entries (user_id, catalog_book_id, status, pages_read, added_date, started_date, finished_date) \
             VALUES ($1, $2, $3, 0, $4, $5, $6) \
             RETURNING id",
        )
        .bind(user_id)
        .bind(catalog_book_id)
        .bind(status.as_str())
        .bind(now)
        .bind(started)
        .bind(finished)
        .fetch_one(&self.pool)
        .await?;

        let row = self.shelf_entry_row(entry_id).await?.ok_or_else(|| {
            AppError::Internal("Shelf entry vanished after insert".to_string())
        })?;

        Ok(row.into())
    }

    async fn update_shelf_entry(
        &self,
        entry_id: i64,
        update: ShelfUpdate,
    ) -> AppResult<Option<ShelfEntry>> {
        let Some(row) = self.shelf_entry_row(entry_id).await? else {
            return Ok(None);
        };
        let current: ShelfEntry = row.into();

        let status = update.status.unwrap_or(current.status);
        let pages_read = update.pages_read.unwrap_or(current.pages_read);
        let rating = update.rating.or(current.rating);

        // First transition into a state stamps its date; later edits keep it
        let now = Utc::now();
        let started = current
            .started_date
            .or_else(|| status.is_read_or_reading().then_some(now));
        let finished = current
            .finished_date
            .or_else(|| (status == ReadStatus::Read).then_some(now));

        sqlx::query(
            "UPDATE shelf_entries SET status = $2, pages_read = $3, rating = $4, \
                    started_date = $5, finished_date = $6 \
             WHERE id = $1",
        )
        .bind(entry_id)
        .bind(status.as_str())
        .bind(pages_read)
        .bind(rating)
        .bind(started)
        .bind(finished)
        .execute(&self.pool)
        .await?;

        Ok(self.shelf_entry_row(entry_id).await?.map(ShelfEntry::from))
    }

    async fn remove_shelf_entry(&self, entry_id: i64) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM shelf_entries WHERE id = $1")
            .bind(entry_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn notes_for_book(&self, book_id: i64) -> AppResult<Vec<Note>> {
        let rows = sqlx::query_as::<_, NoteRow>(
            "SELECT id, book_id, user_id, content, created_at FROM notes \
             WHERE book_id = $1 ORDER BY created_at",
        )
        .bind(book_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Note::from).collect())
    }

    async fn insert_note(&self, book_id: i64, user_id: i64, content: String) -> AppResult<Note> {
        let row = sqlx::query_as::<_, NoteRow>(
            "INSERT INTO notes (book_id, user_id, content, created_at) \
             VALUES ($1, $2, $3, $4) \
             RETURNING id, book_id, user_id, content, created_at",
        )
        .bind(book_id)
        .bind(user_id)
        .bind(content)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn update_note(&self, note_id: i64, content: String) -> AppResult<Option<Note>> {
        let row = sqlx::query_as::<_, NoteRow>(
            "UPDATE notes SET content = $2 WHERE id = $1 \
             RETURNING id, book_id, user_id, content, created_at",
        )
        .bind(note_id)
        .bind(content)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Note::from))
    }

    async fn delete_note(&self, note_id: i64) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM notes WHERE id = $1")
            .bind(note_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn search_notes(&self, query: &str, book_id: Option<i64>) -> AppResult<Vec<Note>> {
        let pattern = format!("%{}%", query);
        let rows = sqlx::query_as::<_, NoteRow>(
            "SELECT id, book_id, user_id, content, created_at FROM notes \
             WHERE content ILIKE $1 AND ($2::BIGINT IS NULL OR book_id = $2) \
             ORDER BY created_at",
        )
        .bind(pattern)
        .bind(book_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Note::from).collect())
    }

    async fn quotes_for_book(&self, book_id: i64) -> AppResult<Vec<Quote>> {
        let rows = sqlx::query_as::<_, QuoteRow>(
            "SELECT id, book_id, user_id, text, page, created_at FROM quotes \
             WHERE book_id = $1 ORDER BY created_at",
        )
        .bind(book_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Quote::from).collect())
    }

    async fn insert_quote(
        &self,
        book_id: i64,
        user_id: i64,
        text: String,
        page: Option<i32>,
    ) -> AppResult<Quote> {
        let row = sqlx::query_as::<_, QuoteRow>(
            "INSERT INTO quotes (book_id, user_id, text, page, created_at) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING id, book_id, user_id, text, page, created_at",
        )
        .bind(book_id)
        .bind(user_id)
        .bind(text)
        .bind(page)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn update_quote(
        &self,
        quote_id: i64,
        text: String,
        page: Option<i32>,
    ) -> AppResult<Option<Quote>> {
        let row = sqlx::query_as::<_, QuoteRow>(
            "UPDATE quotes SET text = $2, page = $3 WHERE id = $1 \
             RETURNING id, book_id, user_id, text, page, created_at",
        )
        .bind(quote_id)
        .bind(text)
        .bind(page)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Quote::from))
    }

    async fn delete_quote(&self, quote_id: i64) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM quotes WHERE id = $1")
            .bind(quote_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn search_quotes(&self, query: &str, book_id: Option<i64>) -> AppResult<Vec<Quote>> {
        let pattern = format!("%{}%", query);
        let rows = sqlx::query_as::<_, QuoteRow>(
            "SELECT id, book_id, user_id, text, page, created_at FROM quotes \
             WHERE text ILIKE $1 AND ($2::BIGINT IS NULL OR book_id = $2) \
             ORDER BY created_at",
        )
        .bind(pattern)
        .bind(book_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Quote::from).collect())
    }
}

#[async_trait::async_trait]
impl CatalogStore for PostgresStore {
    async fn titles<'a>(&self, genre: Option<&'a str>) -> AppResult<Vec<CatalogTitle>> {
        let rows = sqlx::query_as::<_, CatalogRow>(&format!(
            "SELECT {CATALOG_COLUMNS} FROM catalog_titles \
             WHERE ($1::TEXT IS NULL OR LOWER(genre) = LOWER($1)) \
             ORDER BY title"
        ))
        .bind(genre)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(CatalogTitle::from).collect())
    }

    async fn title(&self, id: i64) -> AppResult<Option<CatalogTitle>> {
        let row = sqlx::query_as::<_, CatalogRow>(&format!(
            "SELECT {CATALOG_COLUMNS} FROM catalog_titles WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(CatalogTitle::from))
    }

    async fn title_exists(&self, id: i64) -> AppResult<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM catalog_titles WHERE id = $1)")
                .bind(id)
                .fetch_one(&self.pool)
                .await?;

        Ok(exists)
    }

    async fn genres(&self) -> AppResult<Vec<String>> {
        let genres: Vec<String> =
            sqlx::query_scalar("SELECT DISTINCT genre FROM catalog_titles ORDER BY genre")
                .fetch_all(&self.pool)
                .await?;

        Ok(genres)
    }

    async fn search<'a>(&self, query: &str, genre: Option<&'a str>) -> AppResult<Vec<CatalogTitle>> {
        let pattern = format!("%{}%", query);
        let rows = sqlx::query_as::<_, CatalogRow>(&format!(
            "SELECT {CATALOG_COLUMNS} FROM catalog_titles \
             WHERE (title ILIKE $1 OR author ILIKE $1) \
               AND ($2::TEXT IS NULL OR LOWER(genre) = LOWER($2)) \
             ORDER BY title"
        ))
        .bind(pattern)
        .bind(genre)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(CatalogTitle::from).collect())
    }

    async fn top_rated(&self, min_rating: f64) -> AppResult<Vec<CatalogTitle>> {
        let key = CacheKey::TopRated(min_rating);
        if let Some(cache) = &self.cache {
            if let Some(titles) = cache.get(&key).await {
                return Ok(titles);
            }
        }

        let rows = sqlx::query_as::<_, CatalogRow>(&format!(
            "SELECT {CATALOG_COLUMNS} FROM catalog_titles \
             WHERE average_rating >= $1 \
             ORDER BY average_rating DESC, id"
        ))
        .bind(min_rating)
        .fetch_all(&self.pool)
        .await?;

        let titles: Vec<CatalogTitle> = rows.into_iter().map(CatalogTitle::from).collect();
        if let Some(cache) = &self.cache {
            cache.put(&key, &titles).await;
        }

        Ok(titles)
    }

    async fn top_rated_by_genre(
        &self,
        genre: &str,
        min_rating: f64,
    ) -> AppResult<Vec<CatalogTitle>> {
        let key = CacheKey::TopRatedByGenre(genre.to_string(), min_rating);
        if let Some(cache) = &self.cache {
            if let Some(titles) = cache.get(&key).await {
                return Ok(titles);
            }
        }

        let rows = sqlx::query_as::<_, CatalogRow>(&format!(
            "SELECT {CATALOG_COLUMNS} FROM catalog_titles \
             WHERE LOWER(genre) = LOWER($1) AND average_rating >= $2 \
             ORDER BY average_rating DESC, id"
        ))
        .bind(genre)
        .bind(min_rating)
        .fetch_all(&self.pool)
        .await?;

        let titles: Vec<CatalogTitle> = rows.into_iter().map(CatalogTitle::from).collect();
        if let Some(cache) = &self.cache {
            cache.put(&key, &titles).await;
        }

        Ok(titles)
    }

    async fn save_feedback(
        &self,
        user_id: i64,
        book_id: i64,
        feedback: FeedbackKind,
    ) -> AppResult<FeedbackRecord> {
        let created_at = Utc::now();
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO recommendation_feedback (user_id, book_id, feedback, created_at) \
             VALUES ($1, $2, $3, $4) \
             RETURNING id",
        )
        .bind(user_id)
        .bind(book_id)
        .bind(feedback.as_str())
        .bind(created_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(FeedbackRecord {
            id,
            user_id,
            book_id,
            feedback,
            created_at,
        })
    }
}
