//! # Content Ledger Testkit
//!
//! Testing utilities for the Content Ledger.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Scenarios**: canned call sequences with the response each call must produce
//! - **Generators**: Proptest strategies for property-based testing
//! - **Fixtures**: Helper structs for setting up test scenarios
//!
//! ## Scenarios
//!
//! Scenarios run through the dispatch surface against a fresh ledger:
//!
//! ```rust,no_run
//! use contentledger_testkit::scenarios::{all_scenarios, run_scenario};
//!
//! async fn check() {
//!     for scenario in all_scenarios() {
//!         run_scenario(&scenario).await.unwrap();
//!     }
//! }
//! ```
//!
//! ## Property Testing
//!
//! Use the generators with proptest:
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use contentledger_testkit::generators::Operation;
//!
//! proptest! {
//!     #[test]
//!     fn calls_name_known_parties(op: Operation) {
//!         if let Some((caller, _, _)) = op.to_call() {
//!             prop_assert!(caller < contentledger_testkit::generators::PARTIES);
//!         }
//!     }
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! ```rust,no_run
//! use contentledger_testkit::fixtures::TestFixture;
//!
//! async fn example() {
//!     let fixture = TestFixture::new();
//!     let id = fixture.create_sample_content().await;
//!     fixture.as_user("purchase-content", vec![id.get().into()]).await;
//! }
//! ```

pub mod fixtures;
pub mod generators;
pub mod scenarios;

pub use fixtures::{multi_party_principals, principal, sample_metadata, TestFixture};
pub use generators::{apply_operation, parties, Operation};
pub use scenarios::{all_scenarios, run_scenario, Scenario, ScenarioFailure};
