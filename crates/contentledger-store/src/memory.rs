//! In-memory implementation of the Store trait.
//!
//! This is primarily for testing. It has the same semantics as SQLite
//! but keeps everything in memory with no persistence.

use std::collections::{BTreeMap, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use contentledger_access::{AccessGrant, AccessState};
use contentledger_core::{ContentEntry, ContentId, Principal, RevenueRecord};

use crate::batch::{WriteBatch, WriteOp};
use crate::error::{Result, StoreError};
use crate::traits::Store;

/// In-memory store implementation.
///
/// All data is lost when the store is dropped. Thread-safe via RwLock.
pub struct MemoryStore {
    inner: RwLock<MemoryStoreInner>,
}

#[derive(Default)]
struct MemoryStoreInner {
    /// Entries indexed by id.
    contents: BTreeMap<ContentId, ContentEntry>,

    /// Id the next insert must carry.
    next_id: ContentId,

    /// Grants with per-user indexes.
    grants: AccessState,

    /// Revenue records.
    revenue: BTreeMap<ContentId, RevenueRecord>,

    /// Accrued earnings per principal.
    earnings: HashMap<Principal, u64>,
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(MemoryStoreInner::default()),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, MemoryStoreInner>> {
        self.inner
            .read()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, MemoryStoreInner>> {
        self.inner
            .write()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Changes of one batch, staged against the current state.
///
/// Nothing reaches the store until every op has been applied here, so a
/// failing op leaves the store untouched.
struct Staged<'a> {
    base: &'a MemoryStoreInner,
    next_id: ContentId,
    contents: BTreeMap<ContentId, ContentEntry>,
    grants: Vec<AccessGrant>,
    revenue: BTreeMap<ContentId, RevenueRecord>,
    earnings: HashMap<Principal, u64>,
}

/// Owned output of a staged batch.
struct Changes {
    next_id: ContentId,
    contents: BTreeMap<ContentId, ContentEntry>,
    grants: Vec<AccessGrant>,
    revenue: BTreeMap<ContentId, RevenueRecord>,
    earnings: HashMap<Principal, u64>,
}

impl<'a> Staged<'a> {
    fn new(base: &'a MemoryStoreInner) -> Self {
        Self {
            base,
            next_id: base.next_id,
            contents: BTreeMap::new(),
            grants: Vec::new(),
            revenue: BTreeMap::new(),
            earnings: HashMap::new(),
        }
    }

    fn content_mut(&mut self, id: ContentId) -> Result<&mut ContentEntry> {
        if !self.contents.contains_key(&id) {
            let entry = self
                .base
                .contents
                .get(&id)
                .cloned()
                .ok_or(StoreError::ContentNotFound(id))?;
            self.contents.insert(id, entry);
        }
        self.contents
            .get_mut(&id)
            .ok_or(StoreError::ContentNotFound(id))
    }

    fn apply(&mut self, op: WriteOp) -> Result<()> {
        match op {
            WriteOp::InsertContent(entry) => {
                if entry.id != self.next_id {
                    return Err(StoreError::IdConflict {
                        expected: self.next_id,
                        got: entry.id,
                    });
                }
                if entry.total_revenue != 0 {
                    return Err(StoreError::InvalidData(format!(
                        "new content {} carries revenue",
                        entry.id
                    )));
                }
                self.next_id = entry
                    .id
                    .next()
                    .ok_or_else(|| StoreError::Overflow("content id counter".into()))?;
                self.contents.insert(entry.id, entry);
            }
            WriteOp::UpdateMetadata {
                content_id,
                metadata,
            } => {
                self.content_mut(content_id)?.apply_metadata(metadata);
            }
            WriteOp::TransferOwner {
                content_id,
                new_owner,
            } => {
                self.content_mut(content_id)?.transfer_to(new_owner);
            }
            WriteOp::PutGrant(grant) => {
                self.content_mut(grant.content_id)?;
                self.grants.push(grant);
            }
            WriteOp::AddRevenue { content_id, amount } => {
                self.content_mut(content_id)?
                    .accrue(amount)
                    .map_err(|e| StoreError::Overflow(e.to_string()))?;

                let base = self.base.revenue.get(&content_id).copied();
                let record = self
                    .revenue
                    .entry(content_id)
                    .or_insert_with(|| base.unwrap_or(RevenueRecord::ZERO));
                record
                    .accrue(amount)
                    .map_err(|e| StoreError::Overflow(e.to_string()))?;
            }
            WriteOp::Credit { principal, amount } => {
                let base = self.base.earnings.get(&principal).copied().unwrap_or(0);
                let balance = self.earnings.entry(principal).or_insert(base);
                *balance = balance
                    .checked_add(amount)
                    .ok_or_else(|| StoreError::Overflow("earnings balance".into()))?;
            }
        }
        Ok(())
    }

    fn into_changes(self) -> Changes {
        Changes {
            next_id: self.next_id,
            contents: self.contents,
            grants: self.grants,
            revenue: self.revenue,
            earnings: self.earnings,
        }
    }
}

impl MemoryStoreInner {
    fn publish(&mut self, changes: Changes) {
        self.next_id = changes.next_id;
        self.contents.extend(changes.contents);
        for grant in changes.grants {
            self.grants.apply(grant);
        }
        self.revenue.extend(changes.revenue);
        self.earnings.extend(changes.earnings);
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn get_content(&self, id: ContentId) -> Result<Option<ContentEntry>> {
        Ok(self.read()?.contents.get(&id).cloned())
    }

    async fn next_content_id(&self) -> Result<ContentId> {
        Ok(self.read()?.next_id)
    }

    async fn list_contents(&self, creator: Option<&Principal>) -> Result<Vec<ContentEntry>> {
        let inner = self.read()?;
        Ok(inner
            .contents
            .values()
            .filter(|entry| creator.map_or(true, |c| entry.is_creator(c)))
            .cloned()
            .collect())
    }

    async fn get_grant(
        &self,
        user: &Principal,
        content_id: ContentId,
    ) -> Result<Option<AccessGrant>> {
        Ok(self.read()?.grants.get(user, content_id).cloned())
    }

    async fn grants_for(&self, user: &Principal) -> Result<Vec<AccessGrant>> {
        Ok(self
            .read()?
            .grants
            .grants_for(user)
            .into_iter()
            .cloned()
            .collect())
    }

    async fn get_revenue(&self, content_id: ContentId) -> Result<Option<RevenueRecord>> {
        Ok(self.read()?.revenue.get(&content_id).copied())
    }

    async fn list_revenue(&self) -> Result<Vec<(ContentId, RevenueRecord)>> {
        Ok(self
            .read()?
            .revenue
            .iter()
            .map(|(id, record)| (*id, *record))
            .collect())
    }

    async fn get_earnings(&self, principal: &Principal) -> Result<u64> {
        Ok(self.read()?.earnings.get(principal).copied().unwrap_or(0))
    }

    async fn commit(&self, batch: WriteBatch) -> Result<()> {
        let mut inner = self.write()?;

        let changes = {
            let mut staged = Staged::new(&inner);
            for op in batch.into_ops() {
                staged.apply(op)?;
            }
            staged.into_changes()
        };

        inner.publish(changes);
        Ok(())
    }
}
