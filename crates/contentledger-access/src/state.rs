//! Grant index.
//!
//! [`AccessState`] holds every grant keyed by `(user, content_id)` with a
//! per-user index for listing. It backs the in-memory store.

use std::collections::{BTreeSet, HashMap};

use contentledger_core::{ContentId, Principal, Timestamp};

use crate::grant::AccessGrant;

/// Aggregated access state.
#[derive(Debug, Clone, Default)]
pub struct AccessState {
    /// All grants indexed by `(user, content_id)`.
    grants: HashMap<(Principal, ContentId), AccessGrant>,

    /// Index: user -> content they hold grants for.
    by_user: HashMap<Principal, BTreeSet<ContentId>>,
}

impl AccessState {
    /// Create a new empty access state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record or replace a grant. Returns the grant it replaced.
    pub fn apply(&mut self, grant: AccessGrant) -> Option<AccessGrant> {
        self.by_user
            .entry(grant.user.clone())
            .or_default()
            .insert(grant.content_id);

        self.grants.insert(grant.key(), grant)
    }

    /// Get the grant for `(user, content_id)`, active or not.
    pub fn get(&self, user: &Principal, content_id: ContentId) -> Option<&AccessGrant> {
        self.grants.get(&(user.clone(), content_id))
    }

    /// Check if `user` can access `content_id` at `now`.
    ///
    /// A missing grant and an expired subscription both read as `false`.
    pub fn is_subscribed(&self, user: &Principal, content_id: ContentId, now: Timestamp) -> bool {
        self.get(user, content_id)
            .map(|grant| grant.is_active(now))
            .unwrap_or(false)
    }

    /// All grants held by `user`, ordered by content id.
    pub fn grants_for(&self, user: &Principal) -> Vec<&AccessGrant> {
        self.by_user
            .get(user)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| self.grants.get(&(user.clone(), *id)))
                    .collect()
            })
            .unwrap_or_default()
    }
}
