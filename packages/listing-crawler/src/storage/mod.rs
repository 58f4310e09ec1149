//! Storage backends for listings and crawl progress.
//!
//! Available backends:
//! - `SqliteStore` - SQLite file (or in-memory) storage used by the binary
//! - `MemoryStore` - In-memory storage for tests and dry runs
//!
//! Both implement [`ListingStore`](crate::traits::ListingStore) and
//! [`ProgressStore`](crate::traits::ProgressStore).

pub mod memory;
pub mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
