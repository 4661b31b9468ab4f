//! Content entries and revenue records.
//!
//! A [`ContentEntry`] is created once, mutated in place by metadata updates,
//! ownership transfers and revenue accrual, and never destroyed.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::royalty::{RoyaltyPercentage, RoyaltySplit};
use crate::types::{ContentId, Principal};

/// The creator-editable fields of a content entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ContentMetadata {
    /// Display title.
    pub title: String,

    /// Free-form description.
    pub description: String,

    /// Content-addressed reference to the off-ledger payload.
    #[serde(rename = "ipfs-hash")]
    pub content_hash: String,

    /// Price in the smallest currency unit.
    pub price: u64,

    /// Creator's share of every payment.
    pub royalty_percentage: RoyaltyPercentage,
}

impl ContentMetadata {
    /// Build metadata from raw caller input, validating the royalty.
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        content_hash: impl Into<String>,
        price: u64,
        royalty_percentage: u64,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            title: title.into(),
            description: description.into(),
            content_hash: content_hash.into(),
            price,
            royalty_percentage: RoyaltyPercentage::new(royalty_percentage)?,
        })
    }
}

/// A registered piece of content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ContentEntry {
    /// Sequential id, immutable.
    pub id: ContentId,

    /// Who created the entry. Holds metadata edit rights forever.
    pub creator: Principal,

    /// Who holds transfer rights.
    pub owner: Principal,

    pub title: String,

    pub description: String,

    #[serde(rename = "ipfs-hash")]
    pub content_hash: String,

    pub price: u64,

    pub royalty_percentage: RoyaltyPercentage,

    /// Sum of every committed payment for this entry.
    pub total_revenue: u64,
}

impl ContentEntry {
    /// Create a fresh entry owned by its creator.
    pub fn new(id: ContentId, creator: Principal, metadata: ContentMetadata) -> Self {
        Self {
            id,
            owner: creator.clone(),
            creator,
            title: metadata.title,
            description: metadata.description,
            content_hash: metadata.content_hash,
            price: metadata.price,
            royalty_percentage: metadata.royalty_percentage,
            total_revenue: 0,
        }
    }

    /// Check if `principal` created this entry.
    pub fn is_creator(&self, principal: &Principal) -> bool {
        &self.creator == principal
    }

    /// Check if `principal` currently owns this entry.
    pub fn is_owner(&self, principal: &Principal) -> bool {
        &self.owner == principal
    }

    /// The current editable fields.
    pub fn metadata(&self) -> ContentMetadata {
        ContentMetadata {
            title: self.title.clone(),
            description: self.description.clone(),
            content_hash: self.content_hash.clone(),
            price: self.price,
            royalty_percentage: self.royalty_percentage,
        }
    }

    /// Overwrite the editable fields. Identity, ownership and revenue stay.
    pub fn apply_metadata(&mut self, metadata: ContentMetadata) {
        self.title = metadata.title;
        self.description = metadata.description;
        self.content_hash = metadata.content_hash;
        self.price = metadata.price;
        self.royalty_percentage = metadata.royalty_percentage;
    }

    /// Hand transfer rights to `new_owner`.
    pub fn transfer_to(&mut self, new_owner: Principal) {
        self.owner = new_owner;
    }

    /// Add `amount` to the revenue total.
    pub fn accrue(&mut self, amount: u64) -> Result<(), ValidationError> {
        self.total_revenue = self.total_revenue.checked_add(amount).ok_or_else(|| {
            ValidationError::AmountOverflow(format!("total revenue of content {}", self.id))
        })?;
        Ok(())
    }

    /// Split a payment of `amount` between creator and owner.
    pub fn split(&self, amount: u64) -> RoyaltySplit {
        RoyaltySplit::compute(
            amount,
            self.royalty_percentage,
            self.creator.clone(),
            self.owner.clone(),
        )
    }
}

/// Running revenue total for one content entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RevenueRecord {
    /// Sum of all committed payments.
    pub total_revenue: u64,
}

impl RevenueRecord {
    /// The record of content that has never been paid for.
    pub const ZERO: Self = Self { total_revenue: 0 };

    /// Create a record with the given total.
    pub const fn new(total_revenue: u64) -> Self {
        Self { total_revenue }
    }

    /// Add `amount` to the total.
    pub fn accrue(&mut self, amount: u64) -> Result<(), ValidationError> {
        self.total_revenue = self
            .total_revenue
            .checked_add(amount)
            .ok_or_else(|| ValidationError::AmountOverflow("revenue record".into()))?;
        Ok(())
    }
}

impl Default for RevenueRecord {
    fn default() -> Self {
        Self::ZERO
    }
}
