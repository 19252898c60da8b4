use std::collections::HashSet;
use std::sync::Arc;

use axum_test::TestServer;
use serde_json::json;

use readstack_api::db::MemoryStore;
use readstack_api::models::CatalogTitle;
use readstack_api::routes::{create_router, AppState};

fn create_test_server() -> (TestServer, MemoryStore) {
    let store = MemoryStore::new();
    let state = AppState::new(Arc::new(store.clone()), Arc::new(store.clone()));
    let app = create_router(state);
    (TestServer::new(app).unwrap(), store)
}

fn catalog_title(title: &str, genre: &str, rating: f64) -> CatalogTitle {
    CatalogTitle {
        id: 0,
        title: title.to_string(),
        author: "Author".to_string(),
        genre: genre.to_string(),
        description: "A book".to_string(),
        cover_url: None,
        average_rating: Some(rating),
        total_pages: Some(300),
        isbn: None,
        published_year: Some(2001),
    }
}

#[tokio::test]
async fn test_health_check() {
    let (server, _) = create_test_server();
    let response = server.get("/health").await;
    response.assert_status_ok();
}

#[tokio::test]
async fn test_book_crud_flow() {
    let (server, _) = create_test_server();

    // Create a book
    let response = server
        .post("/api/v1/books/user/1")
        .json(&json!({
            "title": "Dune",
            "author": "Frank Herbert",
            "genre": "Sci-Fi",
            "total_pages": 412,
            "status": "READING"
        }))
        .await;
    response.assert_status(axum::http::StatusCode::CREATED);
    let created: serde_json::Value = response.json();
    assert_eq!(created["title"], "Dune");
    assert_eq!(created["status"], "READING");
    let book_id = created["id"].as_i64().unwrap();

    // List the user's books
    let response = server.get("/api/v1/books/user/1").await;
    response.assert_status_ok();
    let books: Vec<serde_json::Value> = response.json();
    assert_eq!(books.len(), 1);

    // Record progress
    let response = server
        .patch(&format!("/api/v1/books/{book_id}/progress"))
        .add_query_param("pages_read", 120)
        .await;
    response.assert_status_ok();
    let updated: serde_json::Value = response.json();
    assert_eq!(updated["pages_read"], 120);

    // Finish it with a rating
    let response = server
        .put(&format!("/api/v1/books/{book_id}"))
        .json(&json!({
            "title": "Dune",
            "author": "Frank Herbert",
            "genre": "Sci-Fi",
            "total_pages": 412,
            "pages_read": 412,
            "status": "READ",
            "rating": 5
        }))
        .await;
    response.assert_status_ok();
    let finished: serde_json::Value = response.json();
    assert_eq!(finished["status"], "READ");
    assert_eq!(finished["rating"], 5);

    // Delete it
    let response = server.delete(&format!("/api/v1/books/{book_id}")).await;
    response.assert_status(axum::http::StatusCode::NO_CONTENT);
    let response = server.get(&format!("/api/v1/books/{book_id}")).await;
    response.assert_status(axum::http::StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_book_validation() {
    let (server, _) = create_test_server();

    let response = server
        .post("/api/v1/books/user/1")
        .json(&json!({
            "title": "Dune",
            "author": "Frank Herbert",
            "total_pages": 412,
            "status": "READ",
            "rating": 9
        }))
        .await;
    response.assert_status(axum::http::StatusCode::BAD_REQUEST);

    let response = server
        .post("/api/v1/books/user/1")
        .json(&json!({
            "title": "   ",
            "author": "Nobody",
            "total_pages": 1,
            "status": "READ"
        }))
        .await;
    response.assert_status(axum::http::StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_catalog_browsing() {
    let (server, store) = create_test_server();
    store.seed_title(catalog_title("Dune", "Sci-Fi", 4.5)).await;
    store
        .seed_title(catalog_title("The Hobbit", "Fantasy", 4.7))
        .await;
    store
        .seed_title(catalog_title("Mediocre", "Fantasy", 3.2))
        .await;

    let response = server.get("/api/v1/catalog").await;
    response.assert_status_ok();
    let titles: Vec<serde_json::Value> = response.json();
    assert_eq!(titles.len(), 3);

    let response = server
        .get("/api/v1/catalog")
        .add_query_param("genre", "fantasy")
        .await;
    let titles: Vec<serde_json::Value> = response.json();
    assert_eq!(titles.len(), 2);

    let response = server.get("/api/v1/catalog/genres").await;
    let genres: Vec<String> = response.json();
    assert_eq!(genres, vec!["Fantasy", "Sci-Fi"]);

    let response = server
        .get("/api/v1/catalog/top-rated")
        .add_query_param("min", 4.6)
        .await;
    let titles: Vec<serde_json::Value> = response.json();
    assert_eq!(titles.len(), 1);
    assert_eq!(titles[0]["title"], "The Hobbit");

    let response = server
        .get("/api/v1/catalog/search")
        .add_query_param("q", "hobbit")
        .await;
    let titles: Vec<serde_json::Value> = response.json();
    assert_eq!(titles.len(), 1);
}

#[tokio::test]
async fn test_shelf_flow() {
    let (server, store) = create_test_server();
    let title = store.seed_title(catalog_title("Dune", "Sci-Fi", 4.5)).await;

    // Adding an unknown catalog id fails
    let response = server.post("/api/v1/shelf/user/1/add/9999").await;
    response.assert_status(axum::http::StatusCode::NOT_FOUND);

    // Add to the shelf, wish list by default
    let response = server
        .post(&format!("/api/v1/shelf/user/1/add/{}", title.id))
        .await;
    response.assert_status(axum::http::StatusCode::CREATED);
    let entry: serde_json::Value = response.json();
    assert_eq!(entry["status"], "WANT_TO_READ");
    assert_eq!(entry["genre"], "Sci-Fi");
    let entry_id = entry["id"].as_i64().unwrap();

    // A shelf holds one entry per title
    let response = server
        .post(&format!("/api/v1/shelf/user/1/add/{}", title.id))
        .await;
    response.assert_status(axum::http::StatusCode::BAD_REQUEST);

    // Start and finish the book
    let response = server
        .put(&format!("/api/v1/shelf/{entry_id}"))
        .json(&json!({ "status": "READ", "pages_read": 412, "rating": 5 }))
        .await;
    response.assert_status_ok();
    let updated: serde_json::Value = response.json();
    assert_eq!(updated["status"], "READ");
    assert!(updated["finished_date"].is_string());

    // Remove it
    let response = server.delete(&format!("/api/v1/shelf/{entry_id}")).await;
    response.assert_status(axum::http::StatusCode::NO_CONTENT);
    let response = server.get("/api/v1/shelf/user/1").await;
    let entries: Vec<serde_json::Value> = response.json();
    assert!(entries.is_empty());
}

#[tokio::test]
async fn test_notes_and_quotes_flow() {
    let (server, _) = create_test_server();

    let response = server
        .post("/api/v1/books/user/1")
        .json(&json!({
            "title": "Dune",
            "author": "Frank Herbert",
            "total_pages": 412,
            "status": "READING"
        }))
        .await;
    let book: serde_json::Value = response.json();
    let book_id = book["id"].as_i64().unwrap();

    // Notes
    let response = server
        .post(&format!("/api/v1/notes/book/{book_id}"))
        .json(&json!({ "user_id": 1, "content": "The spice must flow" }))
        .await;
    response.assert_status(axum::http::StatusCode::CREATED);
    let note: serde_json::Value = response.json();
    let note_id = note["id"].as_i64().unwrap();

    let response = server
        .get("/api/v1/notes/search")
        .add_query_param("q", "spice")
        .await;
    let notes: Vec<serde_json::Value> = response.json();
    assert_eq!(notes.len(), 1);

    let response = server
        .put(&format!("/api/v1/notes/{note_id}"))
        .json(&json!({ "content": "Fear is the mind-killer" }))
        .await;
    response.assert_status_ok();

    // Quotes
    let response = server
        .post(&format!("/api/v1/quotes/book/{book_id}"))
        .json(&json!({ "user_id": 1, "text": "I must not fear.", "page": 8 }))
        .await;
    response.assert_status(axum::http::StatusCode::CREATED);

    // Notes against a missing book fail
    let response = server
        .post("/api/v1/notes/book/424242")
        .json(&json!({ "user_id": 1, "content": "orphan" }))
        .await;
    response.assert_status(axum::http::StatusCode::NOT_FOUND);
}

/// Seeds a Fantasy-heavy reader and a catalog where only Fantasy titles
/// clear the genre-strategy rating floor
async fn seed_fantasy_reader(server: &TestServer, store: &MemoryStore) -> Vec<i64> {
    for i in 0..3 {
        server
            .post("/api/v1/books/user/1")
            .json(&json!({
                "title": format!("Fantasy {i}"),
                "author": "Author",
                "genre": "Fantasy",
                "total_pages": 300,
                "status": "READ",
                "rating": 5
            }))
            .await
            .assert_status(axum::http::StatusCode::CREATED);
    }
    server
        .post("/api/v1/books/user/1")
        .json(&json!({
            "title": "Scary",
            "author": "Author",
            "genre": "Horror",
            "total_pages": 300,
            "status": "WANT_TO_READ"
        }))
        .await
        .assert_status(axum::http::StatusCode::CREATED);

    let mut fantasy_ids = Vec::new();
    for (i, rating) in [4.0, 4.1, 4.2, 4.1, 4.0].iter().enumerate() {
        let title = store
            .seed_title(catalog_title(&format!("Catalog Fantasy {i}"), "Fantasy", *rating))
            .await;
        fantasy_ids.push(title.id);
    }
    store
        .seed_title(catalog_title("Weak Horror", "Horror", 3.5))
        .await;

    fantasy_ids
}

#[tokio::test]
async fn test_recommendations_follow_the_dominant_genre() {
    let (server, store) = create_test_server();
    let fantasy_ids = seed_fantasy_reader(&server, &store).await;

    let response = server.get("/api/v1/recommendations/1").await;
    response.assert_status_ok();
    let items: Vec<serde_json::Value> = response.json();

    // Fantasy weighs 9 against Horror's nothing; the unstarted legacy Horror
    // book contributes no weight at all
    assert_eq!(items.len(), 4);
    for item in &items {
        assert_eq!(item["strategy"], "GENRE");
        assert!(item["reason"].as_str().unwrap().contains("Fantasy"));
        assert!(fantasy_ids.contains(&item["book_id"].as_i64().unwrap()));
    }

    let ids: HashSet<i64> = items.iter().map(|i| i["book_id"].as_i64().unwrap()).collect();
    assert_eq!(ids.len(), items.len(), "no duplicates in one response");
}

#[tokio::test]
async fn test_recommendations_skip_shelved_titles() {
    let (server, store) = create_test_server();
    let fantasy_ids = seed_fantasy_reader(&server, &store).await;

    // Shelve the strongest candidate
    server
        .post(&format!("/api/v1/shelf/user/1/add/{}", fantasy_ids[2]))
        .await
        .assert_status(axum::http::StatusCode::CREATED);

    let response = server.get("/api/v1/recommendations/1").await;
    let items: Vec<serde_json::Value> = response.json();

    assert!(items
        .iter()
        .all(|i| i["book_id"].as_i64().unwrap() != fantasy_ids[2]));
}

#[tokio::test]
async fn test_recommendations_are_idempotent_without_refresh() {
    let (server, store) = create_test_server();
    seed_fantasy_reader(&server, &store).await;

    let first: Vec<serde_json::Value> = server.get("/api/v1/recommendations/1").await.json();
    let second: Vec<serde_json::Value> = server.get("/api/v1/recommendations/1").await.json();
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_refresh_preserves_the_item_set() {
    let (server, store) = create_test_server();
    seed_fantasy_reader(&server, &store).await;

    let stable: Vec<serde_json::Value> = server.get("/api/v1/recommendations/1").await.json();
    let refreshed: Vec<serde_json::Value> = server
        .get("/api/v1/recommendations/1")
        .add_query_param("refresh", true)
        .await
        .json();

    let stable_ids: HashSet<i64> = stable.iter().map(|i| i["book_id"].as_i64().unwrap()).collect();
    let refreshed_ids: HashSet<i64> = refreshed
        .iter()
        .map(|i| i["book_id"].as_i64().unwrap())
        .collect();
    assert_eq!(stable_ids, refreshed_ids);
    assert_eq!(stable.len(), refreshed.len());
}

#[tokio::test]
async fn test_brand_new_user_gets_the_popular_fallback() {
    let (server, store) = create_test_server();
    for i in 0..12 {
        store
            .seed_title(catalog_title(&format!("Acclaimed {i}"), "Fiction", 4.8))
            .await;
    }

    let response = server.get("/api/v1/recommendations/77").await;
    response.assert_status_ok();
    let items: Vec<serde_json::Value> = response.json();

    assert_eq!(items.len(), 10);
    for item in &items {
        assert_eq!(item["strategy"], "POPULAR");
        assert_eq!(item["reason"], "Highly rated across all readers");
    }
}

#[tokio::test]
async fn test_brand_new_user_with_empty_catalog_gets_nothing() {
    let (server, _) = create_test_server();
    let response = server.get("/api/v1/recommendations/77").await;
    response.assert_status_ok();
    let items: Vec<serde_json::Value> = response.json();
    assert!(items.is_empty());
}

#[tokio::test]
async fn test_library_source_recommends_unfinished_books() {
    let (server, _) = create_test_server();

    server
        .post("/api/v1/books/user/1")
        .json(&json!({
            "title": "Finished Fantasy",
            "author": "Author",
            "genre": "Fantasy",
            "total_pages": 300,
            "status": "READ",
            "rating": 5
        }))
        .await
        .assert_status(axum::http::StatusCode::CREATED);
    let response = server
        .post("/api/v1/books/user/1")
        .json(&json!({
            "title": "Waiting Fantasy",
            "author": "Author",
            "genre": "Fantasy",
            "total_pages": 300,
            "status": "WANT_TO_READ"
        }))
        .await;
    let waiting: serde_json::Value = response.json();

    let items: Vec<serde_json::Value> = server
        .get("/api/v1/recommendations/1")
        .add_query_param("source", "library")
        .await
        .json();

    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["book_id"], waiting["id"]);
    assert_eq!(items[0]["strategy"], "GENRE");
    assert_eq!(items[0]["reason"], "Top genre: Fantasy");
}

#[tokio::test]
async fn test_feedback_round_trip() {
    let (server, store) = create_test_server();
    let title = store.seed_title(catalog_title("Dune", "Sci-Fi", 4.5)).await;

    let response = server
        .post(&format!("/api/v1/recommendations/1/{}/feedback", title.id))
        .json(&json!({ "feedback": "up" }))
        .await;
    response.assert_status_ok();
    let record: serde_json::Value = response.json();
    assert_eq!(record["feedback"], "UP");
    assert_eq!(record["user_id"], 1);
    assert_eq!(record["book_id"], title.id);
    assert_eq!(store.feedback_count().await, 1);

    // Submitting twice appends a second row
    server
        .post(&format!("/api/v1/recommendations/1/{}/feedback", title.id))
        .json(&json!({ "feedback": "DOWN" }))
        .await
        .assert_status_ok();
    assert_eq!(store.feedback_count().await, 2);
}

#[tokio::test]
async fn test_feedback_rejects_invalid_values() {
    let (server, store) = create_test_server();
    let title = store.seed_title(catalog_title("Dune", "Sci-Fi", 4.5)).await;

    let response = server
        .post(&format!("/api/v1/recommendations/1/{}/feedback", title.id))
        .json(&json!({ "feedback": "maybe" }))
        .await;
    response.assert_status(axum::http::StatusCode::BAD_REQUEST);
    assert_eq!(store.feedback_count().await, 0);
}

#[tokio::test]
async fn test_feedback_for_unknown_title_is_not_found() {
    let (server, store) = create_test_server();

    let response = server
        .post("/api/v1/recommendations/1/424242/feedback")
        .json(&json!({ "feedback": "UP" }))
        .await;
    response.assert_status(axum::http::StatusCode::NOT_FOUND);
    assert_eq!(store.feedback_count().await, 0);
}
