//! The verdict cache (§4.3): memoizes oracle verdicts keyed by fingerprint,
//! guaranteeing at-most-one evaluation per fingerprint, with an optional
//! LRU cap.

use fingerprint::Fingerprint;
use lru_cache::LruCache;
use oracle::Verdict;
use std::collections::HashMap;

enum Store<F: Fingerprint> {
    Unbounded(HashMap<F, Verdict>),
    Bounded(LruCache<F, Verdict>),
    // Memoizes nothing: every lookup misses, so every query re-invokes the
    // oracle. Still routed through `VerdictCache` so callers get the same
    // hit/miss/inconsistency accounting regardless of `cache_enabled`.
    Disabled,
}

/// Maps a candidate's fingerprint to the oracle's verdict for it.
///
/// Owned by exactly one reducer run (§5): sharing one cache across
/// genuinely different input models is unsound unless the fingerprint
/// strategy's injectivity holds across all of them, which `IndexSetFingerprint`
/// explicitly does not promise (it is only injective "for a fixed input
/// model", per its own docs). `HDD` accordingly gives each tree level its
/// own cache rather than sharing one across levels.
pub struct VerdictCache<F: Fingerprint> {
    store: Store<F>,
    // The first verdict ever observed for a fingerprint, kept even after
    // the main store evicts it, purely to detect and resolve a "cache
    // inconsistency": a non-deterministic oracle returning two different
    // verdicts for what fingerprints as the same candidate.
    first_seen: HashMap<F, Verdict>,
    hits: u64,
    misses: u64,
    inconsistencies: u64,
}

impl<F: Fingerprint> Store<F> {
    fn get(&mut self, key: &F) -> Option<Verdict> {
        match *self {
            Store::Unbounded(ref map) => map.get(key).cloned(),
            Store::Bounded(ref mut lru) => lru.get_mut(key).cloned(),
            Store::Disabled => None,
        }
    }

    fn put(&mut self, key: F, verdict: Verdict) {
        match *self {
            Store::Unbounded(ref mut map) => {
                map.insert(key, verdict);
            }
            Store::Bounded(ref mut lru) => {
                lru.insert(key, verdict);
            }
            Store::Disabled => {}
        }
    }
}

impl<F: Fingerprint> VerdictCache<F> {
    /// A cache with no eviction: every distinct fingerprint ever queried is
    /// remembered for the life of the run.
    pub fn unbounded() -> VerdictCache<F> {
        VerdictCache {
            store: Store::Unbounded(HashMap::new()),
            first_seen: HashMap::new(),
            hits: 0,
            misses: 0,
            inconsistencies: 0,
        }
    }

    /// A cache capped at `capacity` entries, evicting least-recently-used
    /// entries past that. Evicted entries are simply re-evaluated (and
    /// re-counted as a miss) if queried again.
    pub fn bounded(capacity: usize) -> VerdictCache<F> {
        VerdictCache {
            store: Store::Bounded(LruCache::new(capacity)),
            first_seen: HashMap::new(),
            hits: 0,
            misses: 0,
            inconsistencies: 0,
        }
    }

    /// A cache that never serves a hit: every query re-invokes the oracle.
    /// `hits()` stays at zero and `misses()` tracks the true oracle
    /// invocation count, for measuring the cache's own contribution.
    pub fn disabled() -> VerdictCache<F> {
        VerdictCache {
            store: Store::Disabled,
            first_seen: HashMap::new(),
            hits: 0,
            misses: 0,
            inconsistencies: 0,
        }
    }

    /// Look up `key` without invoking the oracle. Bumps the hit counter on
    /// a hit; callers that get `None` back are expected to invoke the
    /// oracle themselves and call [`VerdictCache::insert`].
    pub fn lookup(&mut self, key: &F) -> Option<Verdict> {
        match self.store.get(key) {
            Some(v) => {
                self.hits += 1;
                Some(v)
            }
            None => None,
        }
    }

    /// Record a freshly computed verdict for `key`, bumping the miss
    /// counter. If a different verdict was ever seen for this fingerprint
    /// before (only possible once `key` has been evicted and re-evaluated),
    /// the earlier verdict is trusted: it is what gets stored and returned,
    /// and the disagreement is counted as a cache inconsistency rather than
    /// silently overwriting history with a non-deterministic oracle's
    /// latest answer.
    pub fn insert(&mut self, key: F, verdict: Verdict) -> Verdict {
        self.misses += 1;
        let trusted = match self.first_seen.get(&key).cloned() {
            Some(prior) => {
                if prior != verdict {
                    self.inconsistencies += 1;
                }
                prior
            }
            None => {
                self.first_seen.insert(key.clone(), verdict);
                verdict
            }
        };
        self.store.put(key, trusted);
        trusted
    }

    /// Look up `key`, invoking `compute` (expected to call the oracle) and
    /// caching the result only on a miss. Guarantees at-most-one `compute`
    /// invocation per fingerprint.
    pub fn get_or_insert_with<C>(&mut self, key: F, compute: C) -> Verdict
    where
        C: FnOnce() -> Verdict,
    {
        if let Some(v) = self.lookup(&key) {
            return v;
        }
        let v = compute();
        self.insert(key, v)
    }

    /// Total cache hits so far.
    pub fn hits(&self) -> u64 {
        self.hits
    }

    /// Total cache misses (oracle invocations) so far.
    pub fn misses(&self) -> u64 {
        self.misses
    }

    /// Total cache inconsistencies detected so far.
    pub fn inconsistencies(&self) -> u64 {
        self.inconsistencies
    }
}

// `LruCache` does not implement `Debug`, so `VerdictCache` cannot derive it;
// summarize by counters instead, which is what a caller actually wants to
// see.
impl<F: Fingerprint> ::std::fmt::Debug for VerdictCache<F> {
    fn fmt(&self, f: &mut ::std::fmt::Formatter) -> ::std::fmt::Result {
        f.debug_struct("VerdictCache")
            .field("hits", &self.hits)
            .field("misses", &self.misses)
            .field("inconsistencies", &self.inconsistencies)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fingerprint::IndexSetFingerprint;
    use model::Configuration;

    fn key(indices: Vec<usize>) -> IndexSetFingerprint {
        IndexSetFingerprint::compute(&Configuration::from_indices(indices), b"")
    }

    #[test]
    fn hit_then_miss_counts() {
        let mut cache = VerdictCache::unbounded();
        let k = key(vec![1, 2, 3]);
        assert_eq!(cache.get_or_insert_with(k.clone(), || Verdict::Fail), Verdict::Fail);
        assert_eq!(cache.misses(), 1);
        assert_eq!(cache.hits(), 0);

        assert_eq!(cache.get_or_insert_with(k, || panic!("must not re-evaluate")), Verdict::Fail);
        assert_eq!(cache.misses(), 1);
        assert_eq!(cache.hits(), 1);
    }

    #[test]
    fn bounded_cache_evicts_and_recomputes() {
        let mut cache = VerdictCache::bounded(1);
        let a = key(vec![1]);
        let b = key(vec![2]);
        cache.get_or_insert_with(a.clone(), || Verdict::Pass);
        cache.get_or_insert_with(b, || Verdict::Fail);
        // `a` was evicted by the capacity-1 cache; re-evaluating should not
        // panic (it is a legitimate post-eviction miss), and should agree
        // with the first-seen verdict.
        let v = cache.get_or_insert_with(a, || Verdict::Pass);
        assert_eq!(v, Verdict::Pass);
        assert_eq!(cache.inconsistencies(), 0);
    }

    #[test]
    fn disabled_cache_never_hits() {
        let mut cache: VerdictCache<IndexSetFingerprint> = VerdictCache::disabled();
        let k = key(vec![1, 2, 3]);
        let mut calls = 0;
        cache.get_or_insert_with(k.clone(), || {
            calls += 1;
            Verdict::Fail
        });
        cache.get_or_insert_with(k, || {
            calls += 1;
            Verdict::Fail
        });
        assert_eq!(calls, 2);
        assert_eq!(cache.hits(), 0);
        assert_eq!(cache.misses(), 2);
    }

    #[test]
    fn inconsistent_reevaluation_trusts_first_seen() {
        let mut cache = VerdictCache::bounded(1);
        let a = key(vec![1]);
        let b = key(vec![2]);
        cache.get_or_insert_with(a.clone(), || Verdict::Pass);
        cache.get_or_insert_with(b, || Verdict::Fail);
        let v = cache.get_or_insert_with(a, || Verdict::Fail);
        assert_eq!(v, Verdict::Pass);
        assert_eq!(cache.inconsistencies(), 1);
    }
}
