use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ReadStatus;

/// The reasoning path that produced a recommendation
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Strategy {
    Genre,
    Rating,
    Popular,
    Fallback,
}

/// One recommended title, with the human-readable reason it was picked
///
/// Not persisted; assembled fresh on every request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecommendationItem {
    pub book_id: i64,
    pub title: String,
    pub author: String,
    pub genre: Option<String>,
    pub description: Option<String>,
    pub rating: Option<i32>,
    pub cover_url: Option<String>,
    pub status: Option<ReadStatus>,
    pub total_pages: Option<i32>,
    pub pages_read: i32,
    pub reason: String,
    pub strategy: Strategy,
}

/// A thumbs-up/down signal on a recommended title
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum FeedbackKind {
    Up,
    Down,
}

impl FeedbackKind {
    /// Parses raw client input: trimmed and uppercased, it must equal exactly
    /// `UP` or `DOWN`.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_uppercase().as_str() {
            "UP" => Some(FeedbackKind::Up),
            "DOWN" => Some(FeedbackKind::Down),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FeedbackKind::Up => "UP",
            FeedbackKind::Down => "DOWN",
        }
    }
}

/// Persisted feedback row; written once, never updated
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeedbackRecord {
    pub id: i64,
    pub user_id: i64,
    pub book_id: i64,
    pub feedback: FeedbackKind,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feedback_parse_normalizes_case_and_whitespace() {
        assert_eq!(FeedbackKind::parse(" up "), Some(FeedbackKind::Up));
        assert_eq!(FeedbackKind::parse("DOWN"), Some(FeedbackKind::Down));
    }

    #[test]
    fn test_feedback_parse_rejects_everything_else() {
        assert_eq!(FeedbackKind::parse("maybe"), None);
        assert_eq!(FeedbackKind::parse(""), None);
        assert_eq!(FeedbackKind::parse("up down"), None);
    }

    #[test]
    fn test_strategy_serialization() {
        let json = serde_json::to_string(&Strategy::Genre).unwrap();
        assert_eq!(json, "\"GENRE\"");
        let json = serde_json::to_string(&Strategy::Popular).unwrap();
        assert_eq!(json, "\"POPULAR\"");
    }
}
