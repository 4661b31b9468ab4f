//! Access control ledger: purchase and subscription grants.

use std::sync::Arc;

use contentledger_access::{
    next_expiry, plan_purchase, plan_subscription, AccessGrant, PurchasePlan, SubscriptionPlan,
};
use contentledger_core::{ContentId, Principal, Timestamp};
use contentledger_store::{Store, WriteBatch};

use crate::error::{LedgerError, Result};

/// Access ledger component over a shared store.
pub struct AccessLedger<S: Store> {
    store: Arc<S>,
}

impl<S: Store> AccessLedger<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Check if `user` can access `content_id` at `now`.
    ///
    /// No grant and an expired subscription both read as `false`.
    pub async fn is_subscribed(
        &self,
        user: &Principal,
        content_id: ContentId,
        now: Timestamp,
    ) -> Result<bool> {
        Ok(self
            .store
            .get_grant(user, content_id)
            .await?
            .map(|grant| grant.is_active(now))
            .unwrap_or(false))
    }

    /// Ids `user` can access at `now`, in id order.
    pub async fn accessible_contents(
        &self,
        user: &Principal,
        now: Timestamp,
    ) -> Result<Vec<ContentId>> {
        Ok(self
            .store
            .grants_for(user)
            .await?
            .into_iter()
            .filter(|grant| grant.is_active(now))
            .map(|grant| grant.content_id)
            .collect())
    }

    /// Stored grant for `(user, content_id)`, active or not.
    pub async fn grant(&self, user: &Principal, content_id: ContentId) -> Result<Option<AccessGrant>> {
        Ok(self.store.get_grant(user, content_id).await?)
    }

    /// Stage a permanent grant.
    ///
    /// Returns `AlreadyGranted` without staging anything if the user already
    /// holds a purchase.
    pub async fn stage_purchase(
        &self,
        user: &Principal,
        content_id: ContentId,
        now: Timestamp,
        batch: &mut WriteBatch,
    ) -> Result<PurchasePlan> {
        self.require_content(content_id).await?;

        let existing = self.grant(user, content_id).await?;
        let plan = plan_purchase(existing.as_ref(), user, content_id, now)?;
        if let PurchasePlan::Grant(grant) = &plan {
            batch.put_grant(grant.clone());
        }
        Ok(plan)
    }

    /// Stage a subscription ending at `expires_at`.
    pub async fn stage_subscription(
        &self,
        user: &Principal,
        content_id: ContentId,
        expires_at: Timestamp,
        now: Timestamp,
        batch: &mut WriteBatch,
    ) -> Result<SubscriptionPlan> {
        self.require_content(content_id).await?;

        let existing = self.grant(user, content_id).await?;
        let plan = plan_subscription(existing.as_ref(), user, content_id, expires_at, now)?;
        if let SubscriptionPlan::Grant(grant) = &plan {
            batch.put_grant(grant.clone());
        }
        Ok(plan)
    }

    /// Stage one more subscription period for `user`.
    ///
    /// A live subscription is extended from its current expiry.
    pub async fn stage_renewal(
        &self,
        user: &Principal,
        content_id: ContentId,
        period: u64,
        now: Timestamp,
        batch: &mut WriteBatch,
    ) -> Result<SubscriptionPlan> {
        let existing = self.grant(user, content_id).await?;
        if existing.as_ref().is_some_and(AccessGrant::is_purchase) {
            return Ok(SubscriptionPlan::AlreadyGranted);
        }

        let expires_at = next_expiry(existing.as_ref(), now, period)?;
        self.stage_subscription(user, content_id, expires_at, now, batch)
            .await
    }

    async fn require_content(&self, content_id: ContentId) -> Result<()> {
        match self.store.get_content(content_id).await? {
            Some(_) => Ok(()),
            None => Err(LedgerError::ContentNotFound(content_id)),
        }
    }
}
