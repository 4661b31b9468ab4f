//! The Ledger: unified API for the content registry and its monetization.
//!
//! The Ledger brings together the registry, access and revenue components
//! over one store. Every mutation runs under a single async write lock and
//! is committed as one [`WriteBatch`], so concurrent callers observe the
//! same serialized history a sequential host would produce.

use std::num::NonZeroU64;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use contentledger_access::{AccessGrant, PurchasePlan, SubscriptionPlan};
use contentledger_core::{
    ContentEntry, ContentId, ContentMetadata, MetadataLimits, Principal, RevenueRecord,
    RoyaltySplit, Timestamp,
};
use contentledger_store::{Store, WriteBatch};

use crate::access::AccessLedger;
use crate::clock::{Clock, MonotonicClock, SystemClock};
use crate::error::Result;
use crate::registry::Registry;
use crate::revenue::RevenueLedger;

/// Thirty days in milliseconds.
pub const DEFAULT_SUBSCRIPTION_PERIOD_MS: u64 = 30 * 24 * 60 * 60 * 1000;

const DEFAULT_SUBSCRIPTION_PERIOD: NonZeroU64 = match NonZeroU64::new(DEFAULT_SUBSCRIPTION_PERIOD_MS) {
    Some(period) => period,
    None => panic!("default subscription period is zero"),
};

/// Configuration for the Ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Length of one paid subscription period. A zero period is rejected
    /// when the configuration is parsed.
    pub subscription_period_ms: NonZeroU64,
    /// Size limits for text metadata.
    pub limits: MetadataLimits,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            subscription_period_ms: DEFAULT_SUBSCRIPTION_PERIOD,
            limits: MetadataLimits::default(),
        }
    }
}

/// Result of a purchase or subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payment {
    /// The price was charged, split, and the grant recorded.
    Charged {
        split: RoyaltySplit,
        grant: AccessGrant,
    },
    /// The caller already holds a permanent grant. Nothing was written.
    AlreadyGranted,
}

impl Payment {
    /// Check if anything was charged.
    pub fn is_charged(&self) -> bool {
        matches!(self, Payment::Charged { .. })
    }

    /// Expiry of the recorded grant, if it is a subscription.
    pub fn expires_at(&self) -> Option<Timestamp> {
        match self {
            Payment::Charged { grant, .. } => grant.kind.expires_at(),
            Payment::AlreadyGranted => None,
        }
    }
}

/// The main Ledger struct.
///
/// Provides a unified API for:
/// - Registering, editing and transferring content
/// - Purchasing and subscribing to content
/// - Recording and querying revenue
/// - Checking access
pub struct Ledger<S: Store, C: Clock = SystemClock> {
    /// The storage backend.
    store: Arc<S>,
    registry: Registry<S>,
    access: AccessLedger<S>,
    revenue: RevenueLedger<S>,
    /// Ambient time, clamped to never run backwards.
    clock: MonotonicClock<C>,
    /// Configuration.
    config: LedgerConfig,
    /// Serializes read-validate-commit sequences.
    write_lock: Mutex<()>,
}

impl<S: Store> Ledger<S, SystemClock> {
    /// Create a ledger that reads wall-clock time.
    pub fn new(store: S, config: LedgerConfig) -> Self {
        Self::with_clock(store, config, SystemClock)
    }
}

impl<S: Store, C: Clock> Ledger<S, C> {
    /// Create a ledger with a custom time source.
    pub fn with_clock(store: S, config: LedgerConfig, clock: C) -> Self {
        let store = Arc::new(store);
        Self {
            registry: Registry::new(Arc::clone(&store), config.limits),
            access: AccessLedger::new(Arc::clone(&store)),
            revenue: RevenueLedger::new(Arc::clone(&store)),
            store,
            clock: MonotonicClock::new(clock),
            config,
            write_lock: Mutex::new(()),
        }
    }

    /// Get the store reference.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Get the configuration.
    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Get the underlying clock.
    pub fn clock(&self) -> &C {
        self.clock.inner()
    }

    /// Current ledger time. Never decreases.
    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Registry Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Register new content owned by `caller`. Returns its id.
    pub async fn create_content(
        &self,
        caller: &Principal,
        metadata: ContentMetadata,
    ) -> Result<ContentId> {
        let _guard = self.write_lock.lock().await;

        let mut batch = WriteBatch::new();
        let id = self
            .registry
            .stage_create(caller, metadata, &mut batch)
            .await?;
        self.store.commit(batch).await?;

        tracing::info!(content_id = %id, caller = %caller, "content created");
        Ok(id)
    }

    /// Overwrite the editable fields of an entry. Creator only.
    pub async fn update_content(
        &self,
        caller: &Principal,
        id: ContentId,
        metadata: ContentMetadata,
    ) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        let mut batch = WriteBatch::new();
        self.registry
            .stage_update(caller, id, metadata, &mut batch)
            .await?;
        self.store.commit(batch).await?;

        tracing::info!(content_id = %id, caller = %caller, "content updated");
        Ok(())
    }

    /// Hand an entry to `new_owner`. Current owner only.
    pub async fn transfer_content(
        &self,
        caller: &Principal,
        id: ContentId,
        new_owner: &Principal,
    ) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        let mut batch = WriteBatch::new();
        self.registry
            .stage_transfer(caller, id, new_owner, &mut batch)
            .await?;
        self.store.commit(batch).await?;

        tracing::info!(
            content_id = %id,
            from = %caller,
            to = %new_owner,
            "content transferred"
        );
        Ok(())
    }

    /// Get an entry. `None` if it was never created.
    pub async fn get_content(&self, id: ContentId) -> Result<Option<ContentEntry>> {
        let entry = self.registry.get(id).await?;
        tracing::debug!(content_id = %id, found = entry.is_some(), "get content");
        Ok(entry)
    }

    /// Every entry in id order.
    pub async fn list_contents(&self) -> Result<Vec<ContentEntry>> {
        self.registry.list().await
    }

    /// Entries created by `creator`, in id order.
    pub async fn contents_by_creator(&self, creator: &Principal) -> Result<Vec<ContentEntry>> {
        self.registry.by_creator(creator).await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Monetization
    // ─────────────────────────────────────────────────────────────────────────

    /// Buy permanent access to `id` at its current price.
    ///
    /// Revenue, royalty credits and the grant commit together. A caller who
    /// already holds a purchase is not charged again.
    pub async fn purchase_content(&self, caller: &Principal, id: ContentId) -> Result<Payment> {
        let _guard = self.write_lock.lock().await;
        let now = self.now();

        let entry = self.registry.require(id).await?;
        let mut batch = WriteBatch::new();

        let grant = match self
            .access
            .stage_purchase(caller, id, now, &mut batch)
            .await?
        {
            PurchasePlan::Grant(grant) => grant,
            PurchasePlan::AlreadyGranted => {
                tracing::debug!(content_id = %id, caller = %caller, "already purchased");
                return Ok(Payment::AlreadyGranted);
            }
        };

        let split = self
            .revenue
            .stage_payment(&entry, entry.price, &mut batch)
            .await?;
        self.store.commit(batch).await?;

        tracing::info!(
            content_id = %id,
            caller = %caller,
            amount = entry.price,
            creator_share = split.creator_share,
            owner_share = split.owner_share,
            "content purchased"
        );
        Ok(Payment::Charged { split, grant })
    }

    /// Buy one subscription period for `id` at its current price.
    ///
    /// A live subscription is extended from its current expiry. A caller
    /// holding a purchase is not charged.
    pub async fn subscribe_content(&self, caller: &Principal, id: ContentId) -> Result<Payment> {
        let _guard = self.write_lock.lock().await;
        let now = self.now();

        let entry = self.registry.require(id).await?;
        let mut batch = WriteBatch::new();

        let grant = match self
            .access
            .stage_renewal(
                caller,
                id,
                self.config.subscription_period_ms.get(),
                now,
                &mut batch,
            )
            .await?
        {
            SubscriptionPlan::Grant(grant) => grant,
            SubscriptionPlan::AlreadyGranted => {
                tracing::debug!(content_id = %id, caller = %caller, "purchase covers subscription");
                return Ok(Payment::AlreadyGranted);
            }
        };

        let split = self
            .revenue
            .stage_payment(&entry, entry.price, &mut batch)
            .await?;
        self.store.commit(batch).await?;

        tracing::info!(
            content_id = %id,
            caller = %caller,
            amount = entry.price,
            expires_at = grant.kind.expires_at().map(|t| t.get()),
            "content subscribed"
        );
        Ok(Payment::Charged { split, grant })
    }

    /// Check if `user` can access `id` now.
    pub async fn is_subscribed(&self, user: &Principal, id: ContentId) -> Result<bool> {
        self.access.is_subscribed(user, id, self.now()).await
    }

    /// Ids `user` can access now, in id order.
    pub async fn accessible_contents(&self, user: &Principal) -> Result<Vec<ContentId>> {
        self.access.accessible_contents(user, self.now()).await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Revenue
    // ─────────────────────────────────────────────────────────────────────────

    /// Add `amount` to the revenue of `id`.
    ///
    /// Any caller may record revenue; the caller is only logged.
    pub async fn record_revenue(&self, caller: &Principal, id: ContentId, amount: u64) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        let entry = self.registry.require(id).await?;
        let mut batch = WriteBatch::new();
        self.revenue.stage_record(&entry, amount, &mut batch).await?;
        self.store.commit(batch).await?;

        tracing::info!(content_id = %id, caller = %caller, amount, "revenue recorded");
        Ok(())
    }

    /// Revenue of `id`; zero for unknown or unfunded ids.
    pub async fn get_content_revenue(&self, id: ContentId) -> Result<RevenueRecord> {
        self.revenue.content_revenue(id).await
    }

    /// Royalty earnings accrued to `principal`.
    pub async fn earnings(&self, principal: &Principal) -> Result<u64> {
        self.revenue.earnings(principal).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use contentledger_store::MemoryStore;

    fn principal(name: &str) -> Principal {
        Principal::new(name).unwrap()
    }

    fn meta(price: u64, royalty: u64) -> ContentMetadata {
        ContentMetadata::new("Test Content", "Description", "QmHash", price, royalty).unwrap()
    }

    fn ledger() -> Ledger<MemoryStore, ManualClock> {
        Ledger::with_clock(
            MemoryStore::new(),
            LedgerConfig::default(),
            ManualClock::new(Timestamp(1_000)),
        )
    }

    #[test]
    fn test_config_defaults_from_partial_json() {
        let config: LedgerConfig =
            serde_json::from_str(r#"{"subscription_period_ms": 60000}"#).unwrap();
        assert_eq!(config.subscription_period_ms.get(), 60_000);
        assert_eq!(config.limits, MetadataLimits::default());

        let config: LedgerConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, LedgerConfig::default());
    }

    #[test]
    fn test_config_rejects_zero_period() {
        let parsed = serde_json::from_str::<LedgerConfig>(r#"{"subscription_period_ms": 0}"#);
        assert!(parsed.is_err());
    }

    #[tokio::test]
    async fn test_purchase_charges_once() {
        let ledger = ledger();
        let creator = principal("creator");
        let user = principal("user");

        let id = ledger.create_content(&creator, meta(100, 10)).await.unwrap();

        let first = ledger.purchase_content(&user, id).await.unwrap();
        assert!(first.is_charged());
        assert_eq!(first.expires_at(), None);

        let second = ledger.purchase_content(&user, id).await.unwrap();
        assert_eq!(second, Payment::AlreadyGranted);

        assert_eq!(
            ledger.get_content_revenue(id).await.unwrap(),
            RevenueRecord::new(100)
        );
        assert_eq!(ledger.earnings(&creator).await.unwrap(), 100);
    }

    #[tokio::test]
    async fn test_subscription_expires_with_clock() {
        let ledger = ledger();
        let user = principal("user");
        let id = ledger
            .create_content(&principal("creator"), meta(5, 0))
            .await
            .unwrap();

        let payment = ledger.subscribe_content(&user, id).await.unwrap();
        assert_eq!(
            payment.expires_at(),
            Some(Timestamp(1_000 + DEFAULT_SUBSCRIPTION_PERIOD_MS))
        );
        assert!(ledger.is_subscribed(&user, id).await.unwrap());

        ledger.clock().advance(DEFAULT_SUBSCRIPTION_PERIOD_MS);
        assert!(!ledger.is_subscribed(&user, id).await.unwrap());
    }

    #[tokio::test]
    async fn test_clock_never_runs_backwards() {
        let ledger = ledger();
        ledger.clock().set(Timestamp(5_000));
        assert_eq!(ledger.now(), Timestamp(5_000));

        ledger.clock().set(Timestamp(10));
        assert_eq!(ledger.now(), Timestamp(5_000));
    }
}
