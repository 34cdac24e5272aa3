//! Per-run counters (§3 "Counters"): monotonic during a run, immutable once
//! returned.

use cache::VerdictCache;
use fingerprint::Fingerprint;
use std::time::Duration;

/// How a run ended.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompletionStatus {
    /// The reducer ran to its natural termination condition.
    Completed,
    /// The run was cancelled (SIGINT or global time budget) before it
    /// would otherwise have finished.
    Cancelled,
    /// Reserved for a harness-level per-cell wall-clock budget distinct
    /// from a reducer's own `time_budget`; `ddmin`'s `Counters` itself
    /// never produces this variant, only `Cancelled`.
    Timeout,
}

/// Counters accumulated over the course of one reducer run.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Counters {
    /// Number of oracle invocations that were not served from the cache.
    pub oracle_queries: u64,
    /// Number of queries served from the cache without invoking the
    /// oracle.
    pub cache_hits: u64,
    /// Number of `Fail` verdicts observed (cache hit or miss).
    pub fail: u64,
    /// Number of `Pass` verdicts observed (cache hit or miss).
    pub pass: u64,
    /// Number of `Unresolved` verdicts observed (cache hit or miss).
    pub unresolved: u64,
    /// Number of times a freshly computed verdict disagreed with one
    /// already on record for the same fingerprint (§7, "Cache
    /// inconsistency"); the cache's original verdict is trusted and
    /// returned, and the disagreement is only counted here.
    pub cache_inconsistencies: u64,
    /// The size of the configuration the run started from.
    pub initial_size: usize,
    /// The size of the configuration the run ended with.
    pub final_size: usize,
    /// Wall-clock duration of the run, in milliseconds.
    pub wall_time_ms: u64,
    /// Whether the run was cancelled before reaching its natural
    /// termination.
    pub cancelled: bool,
}

impl Default for Counters {
    fn default() -> Counters {
        Counters {
            oracle_queries: 0,
            cache_hits: 0,
            fail: 0,
            pass: 0,
            unresolved: 0,
            cache_inconsistencies: 0,
            initial_size: 0,
            final_size: 0,
            wall_time_ms: 0,
            cancelled: false,
        }
    }
}

impl Counters {
    pub(crate) fn record(&mut self, verdict: ::oracle::Verdict) {
        match verdict {
            ::oracle::Verdict::Fail => self.fail += 1,
            ::oracle::Verdict::Pass => self.pass += 1,
            ::oracle::Verdict::Unresolved => self.unresolved += 1,
        }
    }

    /// Fold another cache's hit/miss/inconsistency counts into this one, for
    /// a reducer (`HDD`) that gives each sub-run its own cache and so must
    /// sum them by hand instead of calling `finalize` once.
    pub(crate) fn accumulate_cache<F: Fingerprint>(&mut self, cache: &VerdictCache<F>) {
        self.oracle_queries += cache.misses();
        self.cache_hits += cache.hits();
        self.cache_inconsistencies += cache.inconsistencies();
    }

    /// Fill in the cache- and timing-derived fields from the cache this run
    /// used and the wall-clock duration it took. Called exactly once, by
    /// the outermost reducer call (never by an inner per-level or
    /// per-subrun helper).
    pub fn finalize<F: Fingerprint>(&mut self, cache: &VerdictCache<F>, elapsed: Duration) {
        self.oracle_queries = cache.misses();
        self.cache_hits = cache.hits();
        self.cache_inconsistencies = cache.inconsistencies();
        self.wall_time_ms = elapsed_ms(elapsed);
    }

    /// This run's completion status, for a benchmark record.
    pub fn status(&self) -> CompletionStatus {
        if self.cancelled {
            CompletionStatus::Cancelled
        } else {
            CompletionStatus::Completed
        }
    }
}

/// Convert a `Duration` to whole milliseconds, for the counters' wall-time
/// field and for reducers (`HDD`) that assemble their own timing outside of
/// `Counters::finalize`.
pub(crate) fn elapsed_ms(elapsed: Duration) -> u64 {
    elapsed.as_secs() * 1000 + (elapsed.subsec_nanos() / 1_000_000) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accumulate_cache_sums_hits_and_misses() {
        let mut a = Counters::default();
        a.oracle_queries = 1;
        let mut cache: VerdictCache<::fingerprint::IndexSetFingerprint> = VerdictCache::unbounded();
        let key = ::fingerprint::IndexSetFingerprint::compute(&::model::Configuration::full(1), b"x");
        cache.get_or_insert_with(key, || ::oracle::Verdict::Fail);
        a.accumulate_cache(&cache);
        assert_eq!(a.oracle_queries, 2);
    }

    #[test]
    fn default_status_is_completed() {
        assert_eq!(Counters::default().status(), CompletionStatus::Completed);
    }
}
