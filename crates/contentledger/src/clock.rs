//! Ambient time source for subscription expiry.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use contentledger_core::Timestamp;

/// Supplies the current time to the ledger.
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// Wall-clock time in Unix milliseconds.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        Timestamp(millis)
    }
}

/// A clock that only moves when told to.
///
/// Clones share the same time, so a test can keep a handle while the ledger
/// owns another.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new(start: Timestamp) -> Self {
        Self {
            now: Arc::new(AtomicU64::new(start.get())),
        }
    }

    /// Jump to `at`. Moving backwards is allowed here; the ledger clamps it.
    pub fn set(&self, at: Timestamp) {
        self.now.store(at.get(), Ordering::SeqCst);
    }

    /// Move forward by `millis`, saturating at the maximum timestamp.
    pub fn advance(&self, millis: u64) {
        let _ = self
            .now
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |t| {
                Some(t.saturating_add(millis))
            });
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        Timestamp(self.now.load(Ordering::SeqCst))
    }
}

/// Wraps a clock so observed time never decreases.
#[derive(Debug)]
pub(crate) struct MonotonicClock<C> {
    inner: C,
    high_water: AtomicU64,
}

impl<C: Clock> MonotonicClock<C> {
    pub(crate) fn new(inner: C) -> Self {
        Self {
            inner,
            high_water: AtomicU64::new(0),
        }
    }

    pub(crate) fn now(&self) -> Timestamp {
        let observed = self.inner.now().get();
        let previous = self.high_water.fetch_max(observed, Ordering::SeqCst);
        Timestamp(previous.max(observed))
    }

    pub(crate) fn inner(&self) -> &C {
        &self.inner
    }
}
