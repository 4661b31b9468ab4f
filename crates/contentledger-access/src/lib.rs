//! # Content Ledger Access
//!
//! Access grants: who may read which content, and until when.
//!
//! ## Overview
//!
//! Access is expressed as grants keyed by `(user, content_id)`. A grant is
//! either a permanent purchase or a subscription with an expiry. Grants are
//! never deleted; an expired subscription simply stops granting access.
//!
//! ## Key Concepts
//!
//! - **Purchase**: A one-time unlock that never expires
//! - **Subscription**: Access until `expires_at`, refreshed by subscribing again
//! - **Lazy expiry**: Expiry is a comparison against the current time at read
//!   time; nothing is cleaned up in the background
//! - **Plans**: [`plan_purchase`] and [`plan_subscription`] decide what a
//!   payment should write, so a repeat purchase is never charged twice
//!
//! ## Usage
//!
//! ```rust
//! use contentledger_access::{AccessGrant, AccessState};
//! use contentledger_core::{ContentId, Principal, Timestamp};
//!
//! let user = Principal::new("reader").unwrap();
//! let grant = AccessGrant::subscription(user.clone(), ContentId(0), Timestamp(1_000), Timestamp(0));
//!
//! let mut state = AccessState::new();
//! state.apply(grant);
//!
//! assert!(state.is_subscribed(&user, ContentId(0), Timestamp(999)));
//! assert!(!state.is_subscribed(&user, ContentId(0), Timestamp(1_000)));
//! ```

pub mod error;
pub mod grant;
pub mod policy;
pub mod state;

pub use error::{AccessError, Result};
pub use grant::{AccessGrant, GrantKind};
pub use policy::{next_expiry, plan_purchase, plan_subscription, PurchasePlan, SubscriptionPlan};
pub use state::AccessState;
