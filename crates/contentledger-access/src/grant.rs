//! Access grants.
//!
//! A grant records a user's right to access one content entry, either
//! permanently (purchase) or until an expiry (subscription).

use serde::{Deserialize, Serialize};

use contentledger_core::{ContentId, Principal, Timestamp};

/// The kind of access a grant confers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum GrantKind {
    /// Permanent access from a one-time purchase.
    Purchase,

    /// Access while `now < expires_at`.
    Subscription {
        /// First instant at which the subscription no longer grants access.
        #[serde(rename = "expires-at")]
        expires_at: Timestamp,
    },
}

impl GrantKind {
    /// Check if this kind grants access at `now`.
    pub fn is_active(&self, now: Timestamp) -> bool {
        match self {
            GrantKind::Purchase => true,
            GrantKind::Subscription { expires_at } => *expires_at > now,
        }
    }

    /// The expiry, if this is a subscription.
    pub fn expires_at(&self) -> Option<Timestamp> {
        match self {
            GrantKind::Purchase => None,
            GrantKind::Subscription { expires_at } => Some(*expires_at),
        }
    }
}

/// A recorded access right for `(user, content_id)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct AccessGrant {
    /// Who holds the grant.
    pub user: Principal,

    /// What the grant unlocks.
    pub content_id: ContentId,

    /// Permanent or time-bounded.
    pub kind: GrantKind,

    /// When the grant was first recorded.
    pub granted_at: Timestamp,
}

impl AccessGrant {
    /// Create a permanent purchase grant.
    pub fn purchase(user: Principal, content_id: ContentId, now: Timestamp) -> Self {
        Self {
            user,
            content_id,
            kind: GrantKind::Purchase,
            granted_at: now,
        }
    }

    /// Create a subscription grant.
    pub fn subscription(
        user: Principal,
        content_id: ContentId,
        expires_at: Timestamp,
        now: Timestamp,
    ) -> Self {
        Self {
            user,
            content_id,
            kind: GrantKind::Subscription { expires_at },
            granted_at: now,
        }
    }

    /// Check if this grant currently gives access.
    ///
    /// Expired subscriptions stay stored but read as inactive.
    pub fn is_active(&self, now: Timestamp) -> bool {
        self.kind.is_active(now)
    }

    /// Check if this is a permanent purchase grant.
    pub fn is_purchase(&self) -> bool {
        matches!(self.kind, GrantKind::Purchase)
    }

    /// The `(user, content_id)` key of this grant.
    pub fn key(&self) -> (Principal, ContentId) {
        (self.user.clone(), self.content_id)
    }

    /// Upgrade to a permanent purchase, keeping the original grant time.
    pub fn into_purchase(mut self) -> Self {
        self.kind = GrantKind::Purchase;
        self
    }

    /// Replace the subscription expiry, keeping the original grant time.
    ///
    /// Purchases are left untouched: a permanent grant is never downgraded.
    pub fn refreshed(mut self, expires_at: Timestamp) -> Self {
        if !self.is_purchase() {
            self.kind = GrantKind::Subscription { expires_at };
        }
        self
    }
}
