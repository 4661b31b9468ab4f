//! # Content Ledger
//!
//! The unified API for the Content Ledger: a registry of digital content with
//! creator-controlled metadata, owner-controlled transfer, paid access and
//! per-content revenue accounting.
//!
//! ## Overview
//!
//! - **Registry**: content entries with sequential ids, creator and owner
//! - **Access**: one-time purchases and time-bounded subscriptions
//! - **Revenue**: per-content totals and royalty earnings per principal
//! - **Dispatch**: method-name calls with positional JSON arguments and
//!   tagged `{success, value | error}` responses
//!
//! ## Key Concepts
//!
//! - **Creator**: immutable; keeps metadata edit rights after any transfer.
//! - **Owner**: starts as the creator; the only principal that may transfer.
//! - **Royalty**: the creator's percentage of every payment, below 100.
//! - **Lazy expiry**: expired subscriptions stay stored but grant nothing.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use contentledger::{Ledger, LedgerConfig};
//! use contentledger::core::{ContentMetadata, Principal};
//! use contentledger::store::SqliteStore;
//!
//! async fn example() {
//!     let store = SqliteStore::open("ledger.db").unwrap();
//!     let ledger = Ledger::new(store, LedgerConfig::default());
//!
//!     let creator = Principal::new("ST2CY5V39NHDPWSXMW9QDT3HC3GD6Q6XX4CFRK9AG").unwrap();
//!     let reader = Principal::new("ST2JHG361ZXG51QTKY2NQCVBPPRRE2KZB1HR05NNC").unwrap();
//!
//!     let meta = ContentMetadata::new("Test Content", "Description", "QmHash", 100, 10).unwrap();
//!     let id = ledger.create_content(&creator, meta).await.unwrap();
//!
//!     ledger.purchase_content(&reader, id).await.unwrap();
//!     assert!(ledger.is_subscribed(&reader, id).await.unwrap());
//! }
//! ```
//!
//! ## Re-exports
//!
//! This crate re-exports the component crates for convenience:
//!
//! - `contentledger::core` - Core types (ContentEntry, Principal, etc.)
//! - `contentledger::grants` - Grants and purchase planning
//! - `contentledger::store` - Storage abstraction and SQLite

pub mod access;
pub mod audit;
pub mod clock;
pub mod dispatch;
pub mod error;
pub mod ledger;
pub mod registry;
pub mod revenue;

// Re-export component crates
pub use contentledger_access as grants;
pub use contentledger_core as core;
pub use contentledger_store as store;

// Re-export main types for convenience
pub use audit::{compute_ledger_digest, verify_revenue_consistency, ConsistencyReport, RevenueMismatch};
pub use clock::{Clock, ManualClock, SystemClock};
pub use dispatch::{Request, Response};
pub use error::{ErrorCode, LedgerError, Result, Role};
pub use ledger::{Ledger, LedgerConfig, Payment, DEFAULT_SUBSCRIPTION_PERIOD_MS};

// Re-export commonly used core types
pub use contentledger_core::{
    ContentEntry, ContentId, ContentMetadata, Principal, RevenueRecord, RoyaltyPercentage,
    RoyaltySplit, Timestamp,
};
