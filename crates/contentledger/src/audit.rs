//! Ledger audit.
//!
//! Two stores that applied the same operations can verify they hold the same
//! ledger by comparing digests, and any store can be checked for the
//! entry-total / revenue-record equality.

use std::collections::BTreeMap;

use contentledger_core::{
    canonical_entry_bytes, canonical_revenue_bytes, Blake3Hash, ContentId, RevenueRecord,
};
use contentledger_store::Store;

use crate::error::Result;

const DIGEST_DOMAIN: &[u8] = b"contentledger-digest-v1:";

/// Compute a deterministic digest of a store's registry and revenue tables.
///
/// Algorithm:
/// 1. Hash the domain prefix and the next content id
/// 2. For every entry in id order: hash its length-prefixed canonical bytes
/// 3. For every revenue record in id order: same
/// 4. Return final H
pub async fn compute_ledger_digest<S: Store + ?Sized>(store: &S) -> Result<Blake3Hash> {
    let mut hasher = blake3::Hasher::new();
    hasher.update(DIGEST_DOMAIN);
    hasher.update(&store.next_content_id().await?.get().to_be_bytes());

    for entry in store.list_contents(None).await? {
        update_framed(&mut hasher, &canonical_entry_bytes(&entry)?);
    }

    for (content_id, record) in store.list_revenue().await? {
        update_framed(&mut hasher, &canonical_revenue_bytes(content_id, &record)?);
    }

    let digest = Blake3Hash::from_bytes(*hasher.finalize().as_bytes());
    tracing::debug!(digest = %digest, "ledger digest computed");
    Ok(digest)
}

fn update_framed(hasher: &mut blake3::Hasher, bytes: &[u8]) {
    hasher.update(&(bytes.len() as u64).to_be_bytes());
    hasher.update(bytes);
}

/// A disagreement between an entry's total and its revenue record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevenueMismatch {
    pub content_id: ContentId,
    /// `None` if the record references a missing entry.
    pub entry_total: Option<u64>,
    pub record_total: u64,
}

/// Result of a consistency check.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConsistencyReport {
    /// Entries checked.
    pub checked: usize,
    pub mismatches: Vec<RevenueMismatch>,
}

impl ConsistencyReport {
    /// Check if every entry agrees with its revenue record.
    pub fn is_consistent(&self) -> bool {
        self.mismatches.is_empty()
    }
}

/// Compare every entry's `total_revenue` with its revenue record.
///
/// A missing record counts as zero. Records without an entry are reported
/// too.
pub async fn verify_revenue_consistency<S: Store + ?Sized>(store: &S) -> Result<ConsistencyReport> {
    let mut records: BTreeMap<ContentId, RevenueRecord> =
        store.list_revenue().await?.into_iter().collect();
    let entries = store.list_contents(None).await?;

    let mut report = ConsistencyReport {
        checked: entries.len(),
        mismatches: Vec::new(),
    };

    for entry in entries {
        let record = records.remove(&entry.id).unwrap_or(RevenueRecord::ZERO);
        if record.total_revenue != entry.total_revenue {
            report.mismatches.push(RevenueMismatch {
                content_id: entry.id,
                entry_total: Some(entry.total_revenue),
                record_total: record.total_revenue,
            });
        }
    }

    for (content_id, record) in records {
        report.mismatches.push(RevenueMismatch {
            content_id,
            entry_total: None,
            record_total: record.total_revenue,
        });
    }

    if !report.is_consistent() {
        tracing::warn!(mismatches = report.mismatches.len(), "revenue totals disagree");
    }

    Ok(report)
}
