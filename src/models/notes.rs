use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Free-form note attached to one of the user's books
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Note {
    pub id: i64,
    pub book_id: i64,
    pub user_id: i64,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Saved passage from one of the user's books
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Quote {
    pub id: i64,
    pub book_id: i64,
    pub user_id: i64,
    pub text: String,
    pub page: Option<i32>,
    pub created_at: DateTime<Utc>,
}
