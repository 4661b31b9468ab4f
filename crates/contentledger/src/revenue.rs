//! Revenue ledger: per-content totals and royalty earnings.

use std::sync::Arc;

use contentledger_core::{
    ContentEntry, ContentId, Principal, RevenueRecord, RoyaltySplit, ValidationError,
};
use contentledger_store::{Store, StoreExt, WriteBatch};

use crate::error::Result;

/// Revenue ledger component over a shared store.
pub struct RevenueLedger<S: Store> {
    store: Arc<S>,
}

impl<S: Store> RevenueLedger<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Revenue of `content_id`; zero for unknown or unfunded ids.
    pub async fn content_revenue(&self, content_id: ContentId) -> Result<RevenueRecord> {
        Ok(self.store.revenue_or_zero(content_id).await?)
    }

    /// Accrued royalty earnings of `principal`; zero if never credited.
    pub async fn earnings(&self, principal: &Principal) -> Result<u64> {
        Ok(self.store.get_earnings(principal).await?)
    }

    /// Stage `amount` onto both the entry total and its revenue record.
    ///
    /// Overflow of either total is rejected before anything is staged.
    pub async fn stage_record(
        &self,
        entry: &ContentEntry,
        amount: u64,
        batch: &mut WriteBatch,
    ) -> Result<()> {
        let record = self.content_revenue(entry.id).await?;
        if entry.total_revenue.checked_add(amount).is_none()
            || record.total_revenue.checked_add(amount).is_none()
        {
            return Err(ValidationError::AmountOverflow(format!(
                "total revenue of content {}",
                entry.id
            ))
            .into());
        }

        batch.add_revenue(entry.id, amount);
        Ok(())
    }

    /// Stage a payment of `amount` for `entry`: revenue plus royalty credits.
    pub async fn stage_payment(
        &self,
        entry: &ContentEntry,
        amount: u64,
        batch: &mut WriteBatch,
    ) -> Result<RoyaltySplit> {
        self.stage_record(entry, amount, batch).await?;

        let split = entry.split(amount);
        batch.credit_split(&split);
        Ok(split)
    }
}
