//! # Content Ledger Core
//!
//! Pure primitives for the Content Ledger: content entries, royalty
//! percentages, revenue records, and canonical encoding.
//!
//! This crate contains no I/O, no storage, no clocks. It is pure computation
//! over the ledger's data model.
//!
//! ## Key Types
//!
//! - [`ContentEntry`] - A registered piece of content and its monetization terms
//! - [`ContentId`] - Sequential identifier assigned at creation
//! - [`Principal`] - Opaque caller identity supplied by the host environment
//! - [`RoyaltyPercentage`] - Creator share of a price, always below 100
//! - [`RoyaltySplit`] - How one payment divides between creator and owner
//! - [`RevenueRecord`] - Running revenue total for one content entry
//!
//! ## Canonicalization
//!
//! Entries and revenue records have a deterministic CBOR encoding used for
//! ledger digests. See [`canonical`] module.

pub mod canonical;
pub mod content;
pub mod error;
pub mod hash;
pub mod royalty;
pub mod types;
pub mod validation;

pub use canonical::{canonical_entry_bytes, canonical_revenue_bytes};
pub use content::{ContentEntry, ContentMetadata, RevenueRecord};
pub use error::{CoreError, ValidationError};
pub use hash::Blake3Hash;
pub use royalty::{RoyaltyPercentage, RoyaltySplit, MAX_ROYALTY_PERCENTAGE};
pub use types::{ContentId, Principal, Timestamp};
pub use validation::{validate_metadata, MetadataLimits};
