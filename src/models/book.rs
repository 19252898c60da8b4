use serde::{Deserialize, Serialize};

/// Where a book sits in the user's reading lifecycle
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReadStatus {
    Read,
    Reading,
    WantToRead,
}

impl ReadStatus {
    /// Parses a stored status string, tolerating case and surrounding whitespace.
    ///
    /// Anything unrecognized maps to `WantToRead`, so every consumer that only
    /// distinguishes "read or reading" treats junk values as neither.
    pub fn parse_lenient(raw: &str) -> Self {
        match raw.trim().to_uppercase().as_str() {
            "READ" => ReadStatus::Read,
            "READING" => ReadStatus::Reading,
            _ => ReadStatus::WantToRead,
        }
    }

    /// Whether the book has been started (finished counts as started)
    pub fn is_read_or_reading(&self) -> bool {
        matches!(self, ReadStatus::Read | ReadStatus::Reading)
    }

    /// Canonical wire/storage form
    pub fn as_str(&self) -> &'static str {
        match self {
            ReadStatus::Read => "READ",
            ReadStatus::Reading => "READING",
            ReadStatus::WantToRead => "WANT_TO_READ",
        }
    }
}

/// A legacy, fully user-owned book record with its own genre/rating/status,
/// not linked to any shared catalog title
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Book {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub author: String,
    pub genre: Option<String>,
    pub total_pages: i32,
    pub pages_read: i32,
    pub status: ReadStatus,
    /// 1-5 stars, optional
    pub rating: Option<i32>,
    pub cover_url: Option<String>,
}

/// Fields accepted when creating or replacing a book
#[derive(Debug, Clone, PartialEq)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub genre: Option<String>,
    pub total_pages: i32,
    pub pages_read: i32,
    pub status: ReadStatus,
    pub rating: Option<i32>,
    pub cover_url: Option<String>,
}
