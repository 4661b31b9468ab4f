//! Content registry: the canonical set of content entries.
//!
//! Writes are staged into a [`WriteBatch`] after every check has passed. The
//! caller commits the batch, which lets the facade hold its write lock across
//! the whole read-validate-commit sequence.

use std::sync::Arc;

use contentledger_core::{
    validate_metadata, ContentEntry, ContentId, ContentMetadata, MetadataLimits, Principal,
};
use contentledger_store::{Store, WriteBatch};

use crate::error::{LedgerError, Result, Role};

/// Registry component over a shared store.
pub struct Registry<S: Store> {
    store: Arc<S>,
    limits: MetadataLimits,
}

impl<S: Store> Registry<S> {
    pub fn new(store: Arc<S>, limits: MetadataLimits) -> Self {
        Self { store, limits }
    }

    /// Get an entry; absence is a normal result.
    pub async fn get(&self, id: ContentId) -> Result<Option<ContentEntry>> {
        Ok(self.store.get_content(id).await?)
    }

    /// Get an entry, failing with `ContentNotFound` if it does not exist.
    pub async fn require(&self, id: ContentId) -> Result<ContentEntry> {
        self.get(id).await?.ok_or(LedgerError::ContentNotFound(id))
    }

    /// Every entry in id order.
    pub async fn list(&self) -> Result<Vec<ContentEntry>> {
        Ok(self.store.list_contents(None).await?)
    }

    /// Entries created by `creator`, in id order.
    pub async fn by_creator(&self, creator: &Principal) -> Result<Vec<ContentEntry>> {
        Ok(self.store.list_contents(Some(creator)).await?)
    }

    /// Stage a new entry owned by `caller`. Returns the id it will receive.
    ///
    /// Nothing is staged if the metadata is rejected, so no id is consumed.
    pub async fn stage_create(
        &self,
        caller: &Principal,
        metadata: ContentMetadata,
        batch: &mut WriteBatch,
    ) -> Result<ContentId> {
        validate_metadata(&metadata, &self.limits)?;

        let id = self.store.next_content_id().await?;
        batch.insert_content(ContentEntry::new(id, caller.clone(), metadata));
        Ok(id)
    }

    /// Stage a metadata overwrite. Only the creator may edit.
    pub async fn stage_update(
        &self,
        caller: &Principal,
        id: ContentId,
        metadata: ContentMetadata,
        batch: &mut WriteBatch,
    ) -> Result<ContentEntry> {
        let entry = self.require(id).await?;
        if !entry.is_creator(caller) {
            return Err(LedgerError::unauthorized(caller, Role::Creator, id));
        }
        validate_metadata(&metadata, &self.limits)?;

        batch.update_metadata(id, metadata);
        Ok(entry)
    }

    /// Stage an ownership transfer. Only the current owner may transfer.
    pub async fn stage_transfer(
        &self,
        caller: &Principal,
        id: ContentId,
        new_owner: &Principal,
        batch: &mut WriteBatch,
    ) -> Result<ContentEntry> {
        let entry = self.require(id).await?;
        if !entry.is_owner(caller) {
            return Err(LedgerError::unauthorized(caller, Role::Owner, id));
        }

        batch.transfer_owner(id, new_owner.clone());
        Ok(entry)
    }
}
