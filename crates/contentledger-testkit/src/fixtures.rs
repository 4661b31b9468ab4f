//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use serde_json::{json, Value};

use contentledger::{Ledger, LedgerConfig, ManualClock, Response};
use contentledger_core::{ContentId, ContentMetadata, Principal, Timestamp};
use contentledger_store::MemoryStore;

/// Principal that creates content in the canned flows.
pub const CREATOR: &str = "ST2CY5V39NHDPWSXMW9QDT3HC3GD6Q6XX4CFRK9AG";

/// Principal that buys content in the canned flows.
pub const USER: &str = "ST2JHG361ZXG51QTKY2NQCVBPPRRE2KZB1HR05NNC";

/// Build a principal from a name known to be non-empty.
///
/// # Panics
/// If `name` is empty.
pub fn principal(name: &str) -> Principal {
    match Principal::new(name) {
        Ok(p) => p,
        Err(e) => panic!("invalid test principal {:?}: {}", name, e),
    }
}

/// The metadata the canned flows create: price 100, royalty 10.
pub fn sample_metadata() -> ContentMetadata {
    match ContentMetadata::new("Test Content", "Description", "QmHash", 100, 10) {
        Ok(meta) => meta,
        Err(e) => panic!("sample metadata rejected: {}", e),
    }
}

/// Positional arguments for `create-content` with the sample metadata.
pub fn sample_create_args() -> Vec<Value> {
    vec![
        json!("Test Content"),
        json!("Description"),
        json!("QmHash"),
        json!(100),
        json!(10),
    ]
}

/// A test fixture: a ledger over a memory store with a manual clock.
pub struct TestFixture {
    pub ledger: Ledger<MemoryStore, ManualClock>,
    /// Handle sharing the ledger's time.
    pub clock: ManualClock,
    pub creator: Principal,
    pub user: Principal,
}

impl TestFixture {
    /// Create a fixture with default configuration at time zero.
    pub fn new() -> Self {
        Self::with_config(LedgerConfig::default())
    }

    /// Create a fixture with a custom configuration.
    pub fn with_config(config: LedgerConfig) -> Self {
        let clock = ManualClock::new(Timestamp::ZERO);
        Self {
            ledger: Ledger::with_clock(MemoryStore::new(), config, clock.clone()),
            clock,
            creator: principal(CREATOR),
            user: principal(USER),
        }
    }

    /// Run a call and return its JSON response.
    pub async fn call(&self, caller: &Principal, method: &str, args: Vec<Value>) -> Value {
        self.response(caller, method, args).await.to_json()
    }

    /// Run a call and return the typed response.
    pub async fn response(&self, caller: &Principal, method: &str, args: Vec<Value>) -> Response {
        self.ledger.call(caller, method, &args).await
    }

    /// Run a call as the creator.
    pub async fn as_creator(&self, method: &str, args: Vec<Value>) -> Value {
        self.call(&self.creator, method, args).await
    }

    /// Run a call as the user.
    pub async fn as_user(&self, method: &str, args: Vec<Value>) -> Value {
        self.call(&self.user, method, args).await
    }

    /// Register the sample content as the creator.
    ///
    /// # Panics
    /// If creation fails.
    pub async fn create_sample_content(&self) -> ContentId {
        match self
            .ledger
            .create_content(&self.creator, sample_metadata())
            .await
        {
            Ok(id) => id,
            Err(e) => panic!("sample content rejected: {}", e),
        }
    }

    /// Move the clock forward.
    pub fn advance(&self, millis: u64) {
        self.clock.advance(millis);
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Distinct principals for multi-party tests.
pub fn multi_party_principals(count: usize) -> Vec<Principal> {
    (0..count)
        .map(|i| principal(&format!("ST{:02}PARTY", i)))
        .collect()
}
