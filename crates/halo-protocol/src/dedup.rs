/// Flood dedup ledger — suppresses reprocessing of seen originator ids.
///
/// A flood message is merged and re-relayed at most once per distinct
/// originator id. The reference design kept an unbounded set; a
/// long-running node would leak, so the ledger is a fixed-capacity LRU
/// (the exactly-once guarantee holds for every id still resident).
use std::num::NonZeroUsize;

use lru::LruCache;

/// Default ledger capacity. At one fresh id per 20 s duty cycle a full
/// mesh of a dozen nodes takes hours to evict anything.
pub const DEFAULT_LEDGER_CAPACITY: usize = 4096;

/// Remembers which flood-message ids this node has already processed.
pub struct DedupLedger {
    seen: LruCache<u16, ()>,
}

impl DedupLedger {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_LEDGER_CAPACITY)
    }

    /// Custom capacity (tests, constrained targets). Panics on zero.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            seen: LruCache::new(NonZeroUsize::new(capacity).expect("capacity must be non-zero")),
        }
    }

    /// Gate an incoming flood message.
    ///
    /// Returns `true` exactly once per distinct id and marks it seen;
    /// every later call with the same id returns `false`. The caller
    /// must not touch the observation table when this returns `false`.
    pub fn should_process(&mut self, originator: u16) -> bool {
        if self.seen.contains(&originator) {
            // Refresh recency so active floods are not evicted early.
            self.seen.promote(&originator);
            return false;
        }
        self.seen.put(originator, ());
        true
    }

    /// Number of remembered ids.
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

impl Default for DedupLedger {
    fn default() -> Self {
        Self::new()
    }
}
