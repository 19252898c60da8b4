pub mod book;
pub mod catalog;
pub mod notes;
pub mod recommendation;

pub use book::{Book, NewBook, ReadStatus};
pub use catalog::{CatalogTitle, ShelfEntry, ShelfUpdate};
pub use notes::{Note, Quote};
pub use recommendation::{FeedbackKind, FeedbackRecord, RecommendationItem, Strategy};
