//! The bidirectional prefix/suffix sweep (§4.5): alternately shrink from the
//! front and the back with a monotonically non-increasing block size,
//! halving it whenever a full sweep commits no removal, and certifying
//! 1-minimality with one final sweep in both directions at block size 1.

use std::cmp;
use std::time::Instant;

use cache::VerdictCache;
use cancel::Cancellation;
use config::Config;
use counters::Counters;
use error::Result;
use fingerprint::Fingerprint;
use logger::Logger;
use model::{Configuration, InputModel};
use oracle::Oracle;
use reducers::{self, Outcome, Progress};

/// Minimize `model`'s full configuration with the prefix/suffix sweep.
pub fn reduce<M, O>(
    model: &M,
    oracle: &mut O,
    logger: &Logger,
    config: &Config,
) -> Result<(Configuration, Counters)>
where
    M: InputModel,
    O: Oracle<Candidate = M::Rendered>,
{
    let start = Instant::now();
    let cancel = reducers::new_cancellation(config);
    let mut cache = reducers::new_cache(config);
    let mut counters = Counters::default();

    let seed = Configuration::full(model.size());
    counters.initial_size = seed.len();

    match reducers::check_contract(model, &seed, oracle, &mut cache, logger, &cancel, &mut counters)? {
        Outcome::Cancelled(()) => {
            counters.cancelled = true;
            logger.cancelled();
            counters.final_size = seed.len();
            counters.finalize(&cache, start.elapsed());
            return Ok((seed, counters));
        }
        Outcome::Done(()) => {}
    }

    let outcome = reduce_from(model, seed, oracle, &mut cache, logger, &cancel, &mut counters);
    let (result, cancelled) = match outcome {
        Outcome::Done(c) => (c, false),
        Outcome::Cancelled(c) => (c, true),
    };

    counters.cancelled = cancelled;
    if cancelled {
        logger.cancelled();
    }
    counters.final_size = result.len();
    counters.finalize(&cache, start.elapsed());
    Ok((result, counters))
}

/// One sweep in a single direction at block size `b`: repeatedly test the
/// leading (or trailing) `b` remaining atoms for removal, committing on
/// `FAIL` and otherwise locking that block in and advancing past it.
/// Returns the swept configuration and whether anything was committed.
fn sweep<M, O, F>(
    model: &M,
    c: &Configuration,
    b: usize,
    forward: bool,
    oracle: &mut O,
    cache: &mut VerdictCache<F>,
    logger: &Logger,
    cancel: &Cancellation,
    counters: &mut Counters,
) -> Outcome<(Configuration, bool)>
where
    M: InputModel,
    O: Oracle<Candidate = M::Rendered>,
    F: Fingerprint,
{
    let mut locked = Configuration::empty();
    let mut remaining = c.clone();
    let mut committed = false;

    while remaining.len() > b {
        let idx = remaining.indices();
        let block = if forward {
            Configuration::from_indices(idx[0..b].iter().cloned())
        } else {
            Configuration::from_indices(idx[idx.len() - b..].iter().cloned())
        };
        let shrunk = remaining.difference(&block);
        let candidate = locked.union(&shrunk);

        match reducers::query(model, &candidate, oracle, cache, logger, cancel, counters) {
            Progress::Cancelled => return Outcome::Cancelled((locked.union(&remaining), committed)),
            Progress::Verdict(v) => {
                if v.is_fail() {
                    logger.committed(locked.union(&remaining).len(), candidate.len());
                    remaining = shrunk;
                    committed = true;
                } else {
                    locked = locked.union(&block);
                    remaining = shrunk;
                }
            }
        }
    }

    Outcome::Done((locked.union(&remaining), committed))
}

/// Run the sweep loop starting from `seed`, which callers must already know
/// is `FAIL`.
pub(crate) fn reduce_from<M, O, F>(
    model: &M,
    seed: Configuration,
    oracle: &mut O,
    cache: &mut VerdictCache<F>,
    logger: &Logger,
    cancel: &Cancellation,
    counters: &mut Counters,
) -> Outcome<Configuration>
where
    M: InputModel,
    O: Oracle<Candidate = M::Rendered>,
    F: Fingerprint,
{
    let mut c = seed;
    let mut b = cmp::max(1, c.len() / 2);
    let mut forward = true;

    loop {
        let (next, committed) = match sweep(model, &c, b, forward, oracle, cache, logger, cancel, counters) {
            Outcome::Cancelled(r) => return Outcome::Cancelled(r.0),
            Outcome::Done(r) => r,
        };
        c = next;
        forward = !forward;

        if !committed {
            if b == 1 {
                break;
            }
            b = cmp::max(1, b / 2);
        }
    }

    // A single b=1 sweep already tests every remaining atom for solitary
    // removal; run it in both directions to certify 1-minimality regardless
    // of which direction the loop above happened to end on.
    for &direction in &[true, false] {
        let (next, _) = match sweep(model, &c, 1, direction, oracle, cache, logger, cancel, counters) {
            Outcome::Cancelled(r) => return Outcome::Cancelled(r.0),
            Outcome::Done(r) => r,
        };
        c = next;
    }

    Outcome::Done(c)
}

#[cfg(test)]
mod tests {
    use super::*;
    use logger::Logger;
    use model::ByteModel;
    use oracle::Verdict;

    #[test]
    fn finds_abc_in_noise() {
        let model = ByteModel::new(b"xxxabcxxx".to_vec());
        let mut oracle = |candidate: &Vec<u8>| {
            if candidate.windows(3).any(|w| w == b"abc") {
                Verdict::Fail
            } else {
                Verdict::Pass
            }
        };
        let (result, _) = reduce(&model, &mut oracle, &Logger::discard(), &Config::default()).unwrap();
        assert_eq!(model.materialize(&result), b"abc".to_vec());
    }

    #[test]
    fn disjoint_required_atoms() {
        let items: Vec<i32> = (1..=8).collect();
        let model = ::model::ItemModel::new(items);
        let mut oracle = |candidate: &Vec<i32>| {
            if candidate.contains(&3) && candidate.contains(&6) {
                Verdict::Fail
            } else {
                Verdict::Pass
            }
        };
        let (result, _) = reduce(&model, &mut oracle, &Logger::discard(), &Config::default()).unwrap();
        assert_eq!(model.materialize(&result), vec![3, 6]);
    }

    #[test]
    fn alternating_pattern_is_one_minimal() {
        let model = ByteModel::new(b"abababab".to_vec());
        fn verdict(candidate: &Vec<u8>) -> Verdict {
            let s = String::from_utf8_lossy(candidate);
            if candidate.len() >= 4 && s.contains("abab") {
                Verdict::Fail
            } else {
                Verdict::Pass
            }
        }
        let (result, _) = reduce(&model, &mut verdict, &Logger::discard(), &Config::default()).unwrap();
        assert!(model.materialize(&result).len() >= 4);
        for i in result.indices() {
            let without = result.difference(&Configuration::from_indices(vec![*i]));
            let rendered = model.materialize(&without);
            assert_ne!(verdict(&rendered), Verdict::Fail);
        }
    }
}
