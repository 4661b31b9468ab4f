//! Purchase and subscription planning.
//!
//! A plan says what a payment should write before anything is written. The
//! facade only charges for a plan that grants something new, which is how a
//! repeat purchase avoids a second charge.

use contentledger_core::{ContentId, Principal, Timestamp};

use crate::error::{AccessError, Result};
use crate::grant::AccessGrant;

/// Outcome of planning a purchase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PurchasePlan {
    /// Write this grant and charge for it.
    Grant(AccessGrant),
    /// The user already holds a permanent grant; nothing to write or charge.
    AlreadyGranted,
}

/// Outcome of planning a subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubscriptionPlan {
    /// Write this grant (new or refreshed subscription).
    Grant(AccessGrant),
    /// The user holds a permanent purchase; a subscription adds nothing.
    AlreadyGranted,
}

/// Plan a one-time purchase for `(user, content_id)`.
///
/// - No grant: new purchase grant.
/// - Subscription (live or expired): upgraded to a purchase.
/// - Purchase: `AlreadyGranted`.
pub fn plan_purchase(
    existing: Option<&AccessGrant>,
    user: &Principal,
    content_id: ContentId,
    now: Timestamp,
) -> Result<PurchasePlan> {
    match existing {
        None => Ok(PurchasePlan::Grant(AccessGrant::purchase(
            user.clone(),
            content_id,
            now,
        ))),
        Some(grant) => {
            check_key(grant, user, content_id)?;
            if grant.is_purchase() {
                Ok(PurchasePlan::AlreadyGranted)
            } else {
                Ok(PurchasePlan::Grant(grant.clone().into_purchase()))
            }
        }
    }
}

/// Plan a subscription for `(user, content_id)` that ends at `expires_at`.
///
/// Records a new subscription or refreshes an existing one with the new
/// expiry. Purchase holders get `AlreadyGranted`.
pub fn plan_subscription(
    existing: Option<&AccessGrant>,
    user: &Principal,
    content_id: ContentId,
    expires_at: Timestamp,
    now: Timestamp,
) -> Result<SubscriptionPlan> {
    match existing {
        None => Ok(SubscriptionPlan::Grant(AccessGrant::subscription(
            user.clone(),
            content_id,
            expires_at,
            now,
        ))),
        Some(grant) => {
            check_key(grant, user, content_id)?;
            if grant.is_purchase() {
                Ok(SubscriptionPlan::AlreadyGranted)
            } else {
                Ok(SubscriptionPlan::Grant(grant.clone().refreshed(expires_at)))
            }
        }
    }
}

/// Expiry for one more subscription period.
///
/// A live subscription is extended from its current expiry so paid time is
/// never lost; otherwise the period starts at `now`.
pub fn next_expiry(existing: Option<&AccessGrant>, now: Timestamp, period: u64) -> Result<Timestamp> {
    if period == 0 {
        return Err(AccessError::InvalidGrant(
            "subscription period must be positive".into(),
        ));
    }

    let start = existing
        .and_then(|g| g.kind.expires_at())
        .filter(|expires_at| *expires_at > now)
        .unwrap_or(now);

    start.checked_add(period).ok_or(AccessError::ExpiryOverflow {
        now: start.get(),
        period,
    })
}

fn check_key(grant: &AccessGrant, user: &Principal, content_id: ContentId) -> Result<()> {
    if &grant.user != user || grant.content_id != content_id {
        return Err(AccessError::InvalidGrant(format!(
            "grant for ({}, {}) used for ({}, {})",
            grant.user, grant.content_id, user, content_id
        )));
    }
    Ok(())
}
