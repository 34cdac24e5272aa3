//! The four reducers (§4.4-4.7): [`ddmin`], [`tictocmin`], [`hdd`], and
//! [`probdd`], sharing a common oracle-query helper and the cache/cancellation
//! wiring each public `reduce` entry point sets up from a [`Config`].

use cache::VerdictCache;
use cancel::Cancellation;
use config::Config;
use counters::Counters;
use error::Error;
use fingerprint::{Fingerprint, IndexSetFingerprint};
use logger::Logger;
use model::{Configuration, InputModel};
use oracle::{Oracle, Verdict};

pub mod ddmin;
pub mod hdd;
pub mod probdd;
pub mod tictocmin;

/// A sequence reducer's terminal value, distinguishing a natural finish from
/// one cut short by cancellation. Either way carries the best configuration
/// known at that point: cancellation never discards progress already made.
#[derive(Clone, Debug)]
pub(crate) enum Outcome<T> {
    Done(T),
    Cancelled(T),
}

/// The result of one oracle consultation through [`query`]: either a verdict
/// was obtained (from the cache or the oracle itself), or the run was
/// cancelled before the oracle was asked.
pub(crate) enum Progress {
    Verdict(Verdict),
    Cancelled,
}

/// Consult the cache for `configuration`'s fingerprint, falling back to the
/// oracle on a miss. The single point in every reducer where cancellation is
/// checked, verdicts are counted, and the logger is told what happened.
pub(crate) fn query<M, O, F>(
    model: &M,
    configuration: &Configuration,
    oracle: &mut O,
    cache: &mut VerdictCache<F>,
    logger: &Logger,
    cancel: &Cancellation,
    counters: &mut Counters,
) -> Progress
where
    M: InputModel,
    O: Oracle<Candidate = M::Rendered>,
    F: Fingerprint,
{
    if cancel.is_cancelled() {
        return Progress::Cancelled;
    }

    let size = configuration.len();
    let key = F::compute(configuration, &model.fingerprint_bytes(configuration));
    if let Some(verdict) = cache.lookup(&key) {
        logger.cache_hit(size, verdict);
        counters.record(verdict);
        return Progress::Verdict(verdict);
    }

    let rendered = model.materialize(configuration);
    let verdict = cache.insert(key, oracle.query(&rendered));
    logger.queried(size, verdict);
    counters.record(verdict);
    Progress::Verdict(verdict)
}

/// Build the verdict cache a top-level `reduce` call uses, per `config`'s
/// `cache_enabled`/`cache_cap`. The default fingerprint strategy throughout
/// is [`IndexSetFingerprint`] (§9, open question): cheap, no hashing
/// dependency, and injective for any one fixed input model, which is all any
/// single reducer run or single HDD tree level ever needs.
pub(crate) fn new_cache(config: &Config) -> VerdictCache<IndexSetFingerprint> {
    if !config.cache_enabled {
        VerdictCache::disabled()
    } else {
        match config.cache_cap {
            Some(cap) => VerdictCache::bounded(cap),
            None => VerdictCache::unbounded(),
        }
    }
}

/// Build the cancellation signal a top-level `reduce` call uses, per
/// `config`'s `time_budget`.
pub(crate) fn new_cancellation(config: &Config) -> Cancellation {
    match config.time_budget {
        Some(budget) => Cancellation::with_time_budget(budget),
        None => Cancellation::new(),
    }
}

/// Check the contract that `seed` (ordinarily the full configuration) is
/// `FAIL`, folding the query into `counters`. A reducer cannot make progress
/// from a seed that is not already known to fail.
pub(crate) fn check_contract<M, O, F>(
    model: &M,
    seed: &Configuration,
    oracle: &mut O,
    cache: &mut VerdictCache<F>,
    logger: &Logger,
    cancel: &Cancellation,
    counters: &mut Counters,
) -> ::error::Result<Outcome<()>>
where
    M: InputModel,
    O: Oracle<Candidate = M::Rendered>,
    F: Fingerprint,
{
    match query(model, seed, oracle, cache, logger, cancel, counters) {
        Progress::Cancelled => Ok(Outcome::Cancelled(())),
        Progress::Verdict(verdict) => {
            if verdict.is_fail() {
                Ok(Outcome::Done(()))
            } else {
                Err(Error::ContractViolation(format!(
                    "initial configuration of size {} was not FAIL (got {:?})",
                    seed.len(),
                    verdict
                )))
            }
        }
    }
}
