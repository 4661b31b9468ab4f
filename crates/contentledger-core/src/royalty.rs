//! Royalty percentages and payment splits.
//!
//! A royalty is the creator's share of every payment for a piece of content,
//! regardless of who currently owns it. The rest goes to the owner.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ValidationError;
use crate::types::Principal;

/// Exclusive upper bound for a royalty percentage.
pub const MAX_ROYALTY_PERCENTAGE: u8 = 100;

/// A royalty percentage in `[0, 100)`.
///
/// The only way to build one from a raw integer is [`RoyaltyPercentage::new`]
/// (or the equivalent `TryFrom`/deserialize path), so a stored entry can never
/// carry a royalty of 100 or more.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub struct RoyaltyPercentage(u8);

impl RoyaltyPercentage {
    /// No royalty: the owner receives the whole payment.
    pub const ZERO: Self = Self(0);

    /// Validate a raw percentage.
    pub fn new(percent: u64) -> Result<Self, ValidationError> {
        if percent >= u64::from(MAX_ROYALTY_PERCENTAGE) {
            return Err(ValidationError::RoyaltyOutOfRange(percent));
        }
        Ok(Self(percent as u8))
    }

    /// Get the raw percentage.
    pub const fn get(&self) -> u8 {
        self.0
    }

    /// The creator's share of `amount`, rounded down.
    pub fn share_of(&self, amount: u64) -> u64 {
        // Cannot exceed `amount` because the percentage is below 100.
        ((u128::from(amount) * u128::from(self.0)) / 100) as u64
    }
}

impl fmt::Display for RoyaltyPercentage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

impl TryFrom<u64> for RoyaltyPercentage {
    type Error = ValidationError;

    fn try_from(percent: u64) -> Result<Self, Self::Error> {
        Self::new(percent)
    }
}

impl From<RoyaltyPercentage> for u64 {
    fn from(r: RoyaltyPercentage) -> Self {
        u64::from(r.0)
    }
}

/// How a single payment divides between creator and owner.
///
/// `creator_share + owner_share` always equals `amount`. When the creator
/// still owns the content both shares go to the same principal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoyaltySplit {
    /// The full payment.
    pub amount: u64,

    /// The content's creator.
    pub creator: Principal,

    /// Royalty owed to the creator.
    pub creator_share: u64,

    /// The content's current owner.
    pub owner: Principal,

    /// Remainder owed to the owner.
    pub owner_share: u64,
}

impl RoyaltySplit {
    /// Split `amount` according to `royalty`.
    pub fn compute(
        amount: u64,
        royalty: RoyaltyPercentage,
        creator: Principal,
        owner: Principal,
    ) -> Self {
        let creator_share = royalty.share_of(amount);
        Self {
            amount,
            creator,
            creator_share,
            owner,
            owner_share: amount - creator_share,
        }
    }

    /// Credits to apply, one per non-zero share.
    pub fn credits(&self) -> Vec<(Principal, u64)> {
        let mut credits = Vec::with_capacity(2);
        if self.creator_share > 0 {
            credits.push((self.creator.clone(), self.creator_share));
        }
        if self.owner_share > 0 {
            credits.push((self.owner.clone(), self.owner_share));
        }
        credits
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn principal(name: &str) -> Principal {
        Principal::new(name).unwrap()
    }

    #[test]
    fn test_royalty_bounds() {
        assert!(RoyaltyPercentage::new(0).is_ok());
        assert!(RoyaltyPercentage::new(99).is_ok());
        assert_eq!(
            RoyaltyPercentage::new(100),
            Err(ValidationError::RoyaltyOutOfRange(100))
        );
        assert!(RoyaltyPercentage::new(u64::MAX).is_err());
    }

    #[test]
    fn test_royalty_deserialize_rejects_out_of_range() {
        assert!(serde_json::from_str::<RoyaltyPercentage>("15").is_ok());
        assert!(serde_json::from_str::<RoyaltyPercentage>("100").is_err());
    }

    #[test]
    fn test_split_price_100_royalty_10() {
        let royalty = RoyaltyPercentage::new(10).unwrap();
        let split = RoyaltySplit::compute(100, royalty, principal("creator"), principal("owner"));

        assert_eq!(split.creator_share, 10);
        assert_eq!(split.owner_share, 90);
        assert_eq!(split.credits().len(), 2);
    }

    #[test]
    fn test_split_rounds_toward_owner() {
        let royalty = RoyaltyPercentage::new(33).unwrap();
        let split = RoyaltySplit::compute(10, royalty, principal("creator"), principal("owner"));

        assert_eq!(split.creator_share, 3);
        assert_eq!(split.owner_share, 7);
    }

    #[test]
    fn test_zero_royalty_credits_owner_only() {
        let split = RoyaltySplit::compute(
            50,
            RoyaltyPercentage::ZERO,
            principal("creator"),
            principal("owner"),
        );
        assert_eq!(split.credits(), vec![(principal("owner"), 50)]);
    }

    proptest! {
        #[test]
        fn test_split_sums_to_amount(amount in any::<u64>(), pct in 0u64..100) {
            let royalty = RoyaltyPercentage::new(pct).unwrap();
            let split = RoyaltySplit::compute(amount, royalty, principal("c"), principal("o"));

            prop_assert_eq!(split.creator_share + split.owner_share, amount);
            prop_assert!(split.creator_share <= amount);
        }
    }
}
