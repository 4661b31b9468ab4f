//! Store trait: the abstract interface for ledger persistence.
//!
//! This trait allows the ledger to be storage-agnostic. Implementations
//! include SQLite (primary) and in-memory (for tests).

use async_trait::async_trait;
use contentledger_access::AccessGrant;
use contentledger_core::{ContentEntry, ContentId, Principal, RevenueRecord};

use crate::batch::WriteBatch;
use crate::error::{Result, StoreError};

/// The Store trait: async interface for ledger persistence.
///
/// All methods are async to support both sync (SQLite) and async backends.
/// For SQLite, we use `spawn_blocking` internally to avoid blocking the runtime.
///
/// # Design Notes
///
/// - **Committed reads**: every read observes the state after some complete
///   commit, never a partially applied batch.
/// - **Atomic commits**: [`commit`](Store::commit) applies a whole batch or
///   none of it.
/// - **Serialized writers**: the store does not order concurrent
///   read-validate-commit sequences; the ledger facade serializes its writers.
#[async_trait]
pub trait Store: Send + Sync {
    // ─────────────────────────────────────────────────────────────────────────
    // Registry
    // ─────────────────────────────────────────────────────────────────────────

    /// Get a content entry by id.
    async fn get_content(&self, id: ContentId) -> Result<Option<ContentEntry>>;

    /// The id the next inserted entry must carry.
    async fn next_content_id(&self) -> Result<ContentId>;

    /// List entries in id order, optionally filtered by creator.
    async fn list_contents(&self, creator: Option<&Principal>) -> Result<Vec<ContentEntry>>;

    // ─────────────────────────────────────────────────────────────────────────
    // Access Grants
    // ─────────────────────────────────────────────────────────────────────────

    /// Get the grant for `(user, content_id)`, active or not.
    async fn get_grant(&self, user: &Principal, content_id: ContentId)
        -> Result<Option<AccessGrant>>;

    /// All grants held by `user`, in content id order.
    async fn grants_for(&self, user: &Principal) -> Result<Vec<AccessGrant>>;

    // ─────────────────────────────────────────────────────────────────────────
    // Revenue
    // ─────────────────────────────────────────────────────────────────────────

    /// Get the revenue record for a content entry, if it was ever funded.
    async fn get_revenue(&self, content_id: ContentId) -> Result<Option<RevenueRecord>>;

    /// All revenue records in content id order.
    async fn list_revenue(&self) -> Result<Vec<(ContentId, RevenueRecord)>>;

    /// Accrued earnings of a principal (zero if never credited).
    async fn get_earnings(&self, principal: &Principal) -> Result<u64>;

    // ─────────────────────────────────────────────────────────────────────────
    // Writes
    // ─────────────────────────────────────────────────────────────────────────

    /// Apply every write in `batch`, in order, as one atomic step.
    ///
    /// # Errors
    /// - `IdConflict` if an insert does not carry the next id.
    /// - `ContentNotFound` if a write references a missing entry.
    /// - `Overflow` if a total would exceed its range.
    ///
    /// On error nothing from the batch is visible.
    async fn commit(&self, batch: WriteBatch) -> Result<()>;
}

/// Extension trait for common store patterns.
pub trait StoreExt: Store {
    /// Get a content entry, treating absence as an error.
    fn require_content(
        &self,
        id: ContentId,
    ) -> impl std::future::Future<Output = Result<ContentEntry>> + Send;

    /// Get the revenue record, reading an unfunded entry as zero.
    fn revenue_or_zero(
        &self,
        id: ContentId,
    ) -> impl std::future::Future<Output = Result<RevenueRecord>> + Send;
}

impl<S: Store + ?Sized> StoreExt for S {
    async fn require_content(&self, id: ContentId) -> Result<ContentEntry> {
        self.get_content(id)
            .await?
            .ok_or(StoreError::ContentNotFound(id))
    }

    async fn revenue_or_zero(&self, id: ContentId) -> Result<RevenueRecord> {
        Ok(self.get_revenue(id).await?.unwrap_or(RevenueRecord::ZERO))
    }
}
