//! # Content Ledger Store
//!
//! Storage abstraction for the Content Ledger. Provides a trait-based
//! interface over the content, access-grant, revenue and earnings tables,
//! with SQLite and in-memory implementations.
//!
//! ## Overview
//!
//! Reads go through individual [`Store`] methods. Every write goes through
//! [`Store::commit`] as a [`WriteBatch`]: an ordered unit of work that is
//! applied completely or not at all. This is what keeps an entry's revenue
//! total and its revenue record equal.
//!
//! ## Key Types
//!
//! - [`Store`] - The async trait for all storage operations
//! - [`WriteBatch`] / [`WriteOp`] - Pending writes committed in one step
//! - [`SqliteStore`] - SQLite-based persistent storage
//! - [`MemoryStore`] - In-memory storage for tests and embedding
//!
//! ## Usage
//!
//! ```rust,no_run
//! use contentledger_store::{SqliteStore, Store, WriteBatch};
//! use contentledger_core::{ContentEntry, ContentMetadata, Principal};
//!
//! async fn example() {
//!     let store = SqliteStore::open("ledger.db").unwrap();
//!
//!     let creator = Principal::new("creator").unwrap();
//!     let meta = ContentMetadata::new("Title", "Description", "QmHash", 100, 10).unwrap();
//!     let id = store.next_content_id().await.unwrap();
//!
//!     let mut batch = WriteBatch::new();
//!     batch.insert_content(ContentEntry::new(id, creator, meta));
//!     store.commit(batch).await.unwrap();
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **Sequential ids**: `InsertContent` must carry exactly the next id; the
//!   counter advances in the same commit
//! - **No deletes**: there is no operation that removes an entry or a grant
//! - **Guards inside the commit**: existence and overflow are re-checked
//!   while the batch is applied, and any failure discards the whole batch

pub mod batch;
pub mod error;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;

pub use batch::{WriteBatch, WriteOp};
pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{Store, StoreExt};
