pub mod cache;
pub mod memory;
pub mod postgres;
pub mod store;

pub use cache::{create_redis_client, CatalogCache};
pub use memory::MemoryStore;
pub use postgres::{create_pool, PostgresStore};
pub use store::{CatalogStore, LibraryStore};
