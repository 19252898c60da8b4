use std::collections::BTreeMap;

use crate::models::{Book, ReadStatus, ShelfEntry};

use super::genre;

/// Frequency weight of a started (READ/READING) history item
const STARTED_WEIGHT: u32 = 3;
/// Frequency weight of an unstarted shelf entry
const WISHLIST_WEIGHT: u32 = 1;
/// Minimum star rating for a book to count as loved
const LOVED_RATING: i32 = 4;

/// One unit of reading history, whichever store it came from
///
/// The two adapters flatten legacy books and shelf entries into this shape so
/// the profiler folds over a single sequence. The frequency weight is fixed at
/// the source boundary, which is also where the two models deliberately
/// diverge: an unstarted legacy book contributes nothing, while an unstarted
/// shelf entry still counts for 1.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadingHistoryItem {
    /// Normalized genre; `None` when the source record carries no signal
    pub genre: Option<String>,
    pub status: ReadStatus,
    pub rating: Option<i32>,
    pub frequency_weight: u32,
}

impl ReadingHistoryItem {
    pub fn from_book(book: &Book) -> Self {
        let started = book.status.is_read_or_reading();
        ReadingHistoryItem {
            genre: book.genre.as_deref().and_then(genre::normalize),
            status: book.status,
            rating: book.rating,
            frequency_weight: if started { STARTED_WEIGHT } else { 0 },
        }
    }

    pub fn from_shelf(entry: &ShelfEntry) -> Self {
        let started = entry.status.is_read_or_reading();
        ReadingHistoryItem {
            genre: entry.genre.as_deref().and_then(genre::normalize),
            status: entry.status,
            rating: entry.rating,
            frequency_weight: if started {
                STARTED_WEIGHT
            } else {
                WISHLIST_WEIGHT
            },
        }
    }

    fn is_loved(&self) -> bool {
        self.status.is_read_or_reading() && self.rating.unwrap_or(0) >= LOVED_RATING
    }
}

/// Weighted genre preferences distilled from a user's combined reading history
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TasteProfile {
    /// Genre -> accumulated frequency weight. A `BTreeMap` so iteration order
    /// is defined, which keeps the top-genre ranking deterministic.
    pub genre_weights: BTreeMap<String, u32>,
    /// Genres of loved books, in history order. Repeats are kept on purpose:
    /// a genre loved three times gets three passes downstream.
    pub loved_genres: Vec<String>,
}

impl TasteProfile {
    pub fn build(items: impl IntoIterator<Item = ReadingHistoryItem>) -> Self {
        let mut profile = TasteProfile::default();
        for item in items {
            let Some(ref item_genre) = item.genre else {
                continue;
            };
            if item.is_loved() {
                profile.loved_genres.push(item_genre.clone());
            }
            if item.frequency_weight > 0 {
                *profile.genre_weights.entry(item_genre.clone()).or_insert(0) += item.frequency_weight;
            }
        }
        profile
    }

    /// The `limit` heaviest genres, descending by weight; equal weights
    /// resolve alphabetically (the map iterates sorted, the sort is stable)
    pub fn top_genres(&self, limit: usize) -> Vec<String> {
        let mut ranked: Vec<(&String, &u32)> = self.genre_weights.iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(a.1));
        ranked
            .into_iter()
            .take(limit)
            .map(|(g, _)| g.clone())
            .collect()
    }

    /// True when the history produced no genre signal at all
    pub fn is_empty(&self) -> bool {
        self.genre_weights.is_empty() && self.loved_genres.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn legacy(genre: Option<&str>, status: ReadStatus, rating: Option<i32>) -> ReadingHistoryItem {
        ReadingHistoryItem::from_book(&Book {
            id: 0,
            user_id: 1,
            title: "t".to_string(),
            author: "a".to_string(),
            genre: genre.map(String::from),
            total_pages: 100,
            pages_read: 0,
            status,
            rating,
            cover_url: None,
        })
    }

    fn shelf(genre: Option<&str>, status: ReadStatus, rating: Option<i32>) -> ReadingHistoryItem {
        ReadingHistoryItem::from_shelf(&ShelfEntry {
            id: 0,
            user_id: 1,
            catalog_book_id: 7,
            status,
            pages_read: 0,
            rating,
            genre: genre.map(String::from),
            added_date: chrono::Utc::now(),
            started_date: None,
            finished_date: None,
        })
    }

    #[test]
    fn test_started_legacy_books_weigh_three() {
        let profile = TasteProfile::build(vec![
            legacy(Some("Fantasy"), ReadStatus::Read, None),
            legacy(Some("fantasy"), ReadStatus::Reading, None),
        ]);
        assert_eq!(profile.genre_weights.get("Fantasy"), Some(&6));
    }

    #[test]
    fn test_unstarted_legacy_book_contributes_nothing() {
        let profile = TasteProfile::build(vec![legacy(
            Some("Horror"),
            ReadStatus::WantToRead,
            Some(5),
        )]);
        assert!(profile.genre_weights.is_empty());
        assert!(profile.loved_genres.is_empty());
    }

    #[test]
    fn test_unstarted_shelf_entry_still_counts_once() {
        let profile = TasteProfile::build(vec![shelf(Some("Horror"), ReadStatus::WantToRead, None)]);
        assert_eq!(profile.genre_weights.get("Horror"), Some(&1));
    }

    #[test]
    fn test_loved_genres_keep_repeats_in_order() {
        let profile = TasteProfile::build(vec![
            legacy(Some("Fantasy"), ReadStatus::Read, Some(5)),
            shelf(Some("Sci-Fi"), ReadStatus::Read, Some(4)),
            legacy(Some("Fantasy"), ReadStatus::Reading, Some(4)),
            legacy(Some("Fantasy"), ReadStatus::Read, Some(3)),
        ]);
        assert_eq!(profile.loved_genres, vec!["Fantasy", "Sci-Fi", "Fantasy"]);
    }

    #[test]
    fn test_blank_genres_are_skipped() {
        let profile = TasteProfile::build(vec![
            legacy(None, ReadStatus::Read, Some(5)),
            legacy(Some("  "), ReadStatus::Read, Some(5)),
        ]);
        assert!(profile.is_empty());
    }

    #[test]
    fn test_top_genres_orders_by_weight_then_name() {
        let profile = TasteProfile::build(vec![
            legacy(Some("Romance"), ReadStatus::Read, None),
            legacy(Some("Fantasy"), ReadStatus::Read, None),
            shelf(Some("Horror"), ReadStatus::WantToRead, None),
            shelf(Some("Biography"), ReadStatus::WantToRead, None),
        ]);
        // Fantasy and Romance tie at 3, Biography and Horror tie at 1
        assert_eq!(
            profile.top_genres(3),
            vec!["Fantasy", "Romance", "Biography"]
        );
    }

    #[test]
    fn test_genres_normalize_before_weighing() {
        let profile = TasteProfile::build(vec![
            legacy(Some("pscology"), ReadStatus::Read, None),
            shelf(Some("Psychological"), ReadStatus::Reading, None),
        ]);
        assert_eq!(profile.genre_weights.get("Mystery"), Some(&6));
    }
}
