//! Unit of work: pending writes committed in one step.

use contentledger_access::AccessGrant;
use contentledger_core::{ContentEntry, ContentId, ContentMetadata, Principal, RoyaltySplit};

/// A single pending write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOp {
    /// Register a new entry. Its id must be the store's next id.
    InsertContent(ContentEntry),

    /// Overwrite an entry's editable fields.
    UpdateMetadata {
        content_id: ContentId,
        metadata: ContentMetadata,
    },

    /// Hand an entry to a new owner.
    TransferOwner {
        content_id: ContentId,
        new_owner: Principal,
    },

    /// Record or replace the grant for `(grant.user, grant.content_id)`.
    PutGrant(AccessGrant),

    /// Add to both the entry's revenue total and its revenue record.
    AddRevenue { content_id: ContentId, amount: u64 },

    /// Add to a principal's accrued earnings.
    Credit { principal: Principal, amount: u64 },
}

impl WriteOp {
    /// The content entry this write touches, if any.
    pub fn content_id(&self) -> Option<ContentId> {
        match self {
            WriteOp::InsertContent(entry) => Some(entry.id),
            WriteOp::UpdateMetadata { content_id, .. }
            | WriteOp::TransferOwner { content_id, .. }
            | WriteOp::AddRevenue { content_id, .. } => Some(*content_id),
            WriteOp::PutGrant(grant) => Some(grant.content_id),
            WriteOp::Credit { .. } => None,
        }
    }
}

/// An ordered list of writes applied all-or-nothing by [`Store::commit`].
///
/// Later operations see the effects of earlier ones in the same batch, so an
/// `InsertContent` followed by `AddRevenue` for the same id is valid.
///
/// [`Store::commit`]: crate::Store::commit
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    /// Create an empty batch.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_content(&mut self, entry: ContentEntry) -> &mut Self {
        self.ops.push(WriteOp::InsertContent(entry));
        self
    }

    pub fn update_metadata(&mut self, content_id: ContentId, metadata: ContentMetadata) -> &mut Self {
        self.ops.push(WriteOp::UpdateMetadata {
            content_id,
            metadata,
        });
        self
    }

    pub fn transfer_owner(&mut self, content_id: ContentId, new_owner: Principal) -> &mut Self {
        self.ops.push(WriteOp::TransferOwner {
            content_id,
            new_owner,
        });
        self
    }

    pub fn put_grant(&mut self, grant: AccessGrant) -> &mut Self {
        self.ops.push(WriteOp::PutGrant(grant));
        self
    }

    pub fn add_revenue(&mut self, content_id: ContentId, amount: u64) -> &mut Self {
        self.ops.push(WriteOp::AddRevenue { content_id, amount });
        self
    }

    pub fn credit(&mut self, principal: Principal, amount: u64) -> &mut Self {
        self.ops.push(WriteOp::Credit { principal, amount });
        self
    }

    /// Credit every non-zero share of a royalty split.
    pub fn credit_split(&mut self, split: &RoyaltySplit) -> &mut Self {
        for (principal, amount) in split.credits() {
            self.credit(principal, amount);
        }
        self
    }

    /// Number of pending writes.
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Check if there is nothing to write.
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// The pending writes, in order.
    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }

    /// Consume the batch, yielding its writes in order.
    pub fn into_ops(self) -> Vec<WriteOp> {
        self.ops
    }
}
