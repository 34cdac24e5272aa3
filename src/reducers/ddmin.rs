//! Classical recursive bisection (§4.4): partition the current configuration
//! into `g` contiguous blocks, try each block and each block's complement as
//! a smaller `FAIL` candidate, and grow `g` only when neither succeeds.
//! Terminates 1-minimal.

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

/// Minimize `model`'s full configuration down to a 1-minimal `FAIL` subset.
///
/// Returns an error if the full configuration is not itself `FAIL` (the
/// contract every reducer requires of its input).
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

/// Run the bisection loop starting from `seed`, which callers must already
/// know is `FAIL`. Shared with [`super::hdd`] (one fresh cache per tree
/// level) and [`super::probdd`] (the final certification pass, sharing its
/// own cache since the atom space does not change between ProbDD's trials
/// and its certification pass).
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
    let mut g = 2usize;

    loop {
        if c.len() <= 1 {
            return Outcome::Done(c);
        }
        if g > c.len() {
            g = c.len();
        }

        let blocks = c.partition(g);
        let mut reduced = false;

        for block in &blocks {
            if block.is_empty() {
                continue;
            }
            match reducers::query(model, block, oracle, cache, logger, cancel, counters) {
                Progress::Cancelled => return Outcome::Cancelled(c),
                Progress::Verdict(v) => {
                    if v.is_fail() {
                        logger.committed(c.len(), block.len());
                        c = block.clone();
                        g = 2;
                        reduced = true;
                        break;
                    }
                }
            }
        }

        if !reduced {
            for block in &blocks {
                if block.is_empty() {
                    continue;
                }
                let complement = c.difference(block);
                match reducers::query(model, &complement, oracle, cache, logger, cancel, counters) {
                    Progress::Cancelled => return Outcome::Cancelled(c),
                    Progress::Verdict(v) => {
                        if v.is_fail() {
                            logger.committed(c.len(), complement.len());
                            g = if g > 2 { g - 1 } else { 2 };
                            c = complement;
                            reduced = true;
                            break;
                        }
                    }
                }
            }
        }

        if !reduced {
            if g >= c.len() {
                return Outcome::Done(c);
            }
            g = cmp::min(g * 2, c.len());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use logger::Logger;
    use model::ByteModel;
    use oracle::Verdict;

    fn contains_abc(candidate: &Vec<u8>) -> Verdict {
        if candidate.windows(3).any(|w| w == b"abc") {
            Verdict::Fail
        } else {
            Verdict::Pass
        }
    }

    #[test]
    fn finds_abc_in_noise() {
        let model = ByteModel::new(b"xxxabcxxx".to_vec());
        let (result, counters) = reduce(&model, &mut contains_abc, &Logger::discard(), &Config::default()).unwrap();
        assert_eq!(model.materialize(&result), b"abc".to_vec());
        assert!(counters.fail >= 1);
        assert_eq!(counters.final_size, 3);
    }

    #[test]
    fn disjoint_required_atoms() {
        let items: Vec<i32> = (1..=8).collect();
        let model = ::model::ItemModel::new(items);
        let (result, _) = reduce(
            &model,
            &mut |candidate: &Vec<i32>| {
                if candidate.contains(&3) && candidate.contains(&6) {
                    Verdict::Fail
                } else {
                    Verdict::Pass
                }
            },
            &Logger::discard(),
            &Config::default(),
        ).unwrap();
        assert_eq!(model.materialize(&result), vec![3, 6]);
    }

    #[test]
    fn contract_violation_on_non_failing_seed() {
        let model = ByteModel::new(b"xxxxxxxxx".to_vec());
        let err = reduce(&model, &mut contains_abc, &Logger::discard(), &Config::default()).unwrap_err();
        match err {
            ::error::Error::ContractViolation(_) => {}
            other => panic!("expected ContractViolation, got {:?}", other),
        }
    }

    #[test]
    fn unresolved_small_candidates_never_yield_pass_shaped_output() {
        let model = ByteModel::new(b"abcdef".to_vec());
        let full = model.atoms().to_vec();
        let oracle_fn = move |candidate: &Vec<u8>| {
            if candidate.len() < 3 {
                Verdict::Unresolved
            } else if *candidate == full {
                Verdict::Fail
            } else {
                Verdict::Pass
            }
        };
        let mut oracle_fn = oracle_fn;
        let (result, _) = reduce(&model, &mut oracle_fn, &Logger::discard(), &Config::default()).unwrap();
        assert_eq!(model.materialize(&result), model.atoms().to_vec());
    }
}
