use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ReadStatus;

/// A title in the shared, multi-user catalog
///
/// Immutable through this API; the aggregate rating is maintained by whatever
/// seeds the catalog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogTitle {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub genre: String,
    pub description: String,
    pub cover_url: Option<String>,
    /// Aggregated rating across all readers (e.g., 4.3)
    pub average_rating: Option<f64>,
    pub total_pages: Option<i32>,
    pub isbn: Option<String>,
    pub published_year: Option<i32>,
}

/// A user's personal relationship to one catalog title
///
/// Unique per (user, catalog title). `genre` is carried over from the linked
/// catalog title when the entry is read back.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ShelfEntry {
    pub id: i64,
    pub user_id: i64,
    pub catalog_book_id: i64,
    pub status: ReadStatus,
    pub pages_read: i32,
    /// User's personal rating, 1-5
    pub rating: Option<i32>,
    pub genre: Option<String>,
    pub added_date: DateTime<Utc>,
    pub started_date: Option<DateTime<Utc>>,
    pub finished_date: Option<DateTime<Utc>>,
}

/// Partial update for a shelf entry; absent fields are left untouched
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShelfUpdate {
    pub status: Option<ReadStatus>,
    pub pages_read: Option<i32>,
    pub rating: Option<i32>,
}
