//! Probabilistic delta debugging (§4.7): maintain a belief `p_i` that each
//! atom is required, trial-remove the atoms least likely to be required,
//! and update beliefs by a Bayesian rule on the oracle's verdict. Survivors
//! are certified 1-minimal with a final `ddmin` pass.

use std::collections::{BTreeMap, HashSet};
use std::time::Instant;

use config::Config;
use counters::Counters;
use error::Result;
use logger::Logger;
use model::{Configuration, InputModel};
use oracle::{Oracle, Verdict};
use reducers::{self, ddmin, Outcome, Progress};

/// Order unpinned atoms ascending by `p` (least likely to be required
/// first) and take a greedy prefix whose joint removal probability
/// `∏(1 - p_i)` exceeds `tau`, per the spec's permitted deterministic
/// alternative to independent-probability sampling (§4.7 step 1). Always
/// includes at least the single least-likely atom, so a trial -- and hence
/// progress -- is always possible even once the joint probability of any
/// two atoms falls below `tau`.
fn select_trial(p: &BTreeMap<usize, f64>, tau: f64) -> HashSet<usize> {
    let mut candidates: Vec<(usize, f64)> = p.iter().map(|(&i, &pi)| (i, pi)).collect();
    candidates.sort_by(|a, b| {
        a.1.partial_cmp(&b.1)
            .unwrap_or(::std::cmp::Ordering::Equal)
            .then(a.0.cmp(&b.0))
    });

    let mut trial = HashSet::new();
    let mut joint = 1.0;
    for (i, pi) in candidates {
        let next_joint = joint * (1.0 - pi);
        if trial.is_empty() || next_joint >= tau {
            trial.insert(i);
            joint = next_joint;
        } else {
            break;
        }
    }
    trial
}

/// Minimize `model`'s full configuration by maintaining and updating a
/// per-atom required-probability estimate.
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

    let tau = config.probdd.tau;
    let epsilon = config.probdd.epsilon;
    let n = seed.len();
    let stall_k = config.probdd.stall_k.unwrap_or_else(|| 2 * n).max(1);

    let mut c = seed;
    let mut p: BTreeMap<usize, f64> = c.iter().map(|i| (i, 0.5)).collect();
    let mut stall = 0usize;
    let mut cancelled = false;

    loop {
        let unpinned: BTreeMap<usize, f64> = p.iter()
            .filter(|&(_, &pi)| pi < 1.0 - epsilon)
            .map(|(&i, &pi)| (i, pi))
            .collect();
        if unpinned.is_empty() || stall >= stall_k {
            break;
        }

        let trial = select_trial(&unpinned, tau);
        let trial_set = Configuration::from_indices(trial.iter().cloned());
        let candidate = c.difference(&trial_set);

        match reducers::query(model, &candidate, oracle, &mut cache, logger, &cancel, &mut counters) {
            Progress::Cancelled => {
                cancelled = true;
                break;
            }
            Progress::Verdict(Verdict::Fail) => {
                logger.committed(c.len(), candidate.len());
                c = candidate;
                for i in &trial {
                    p.remove(i);
                }
                stall = 0;
            }
            Progress::Verdict(Verdict::Pass) => {
                // joint_all = pi(T) = the prior joint probability that no
                // atom in T is required, computed from the beliefs as they
                // stood when T was selected.
                let joint_all: f64 = trial.iter().map(|&i| 1.0 - p[&i]).product();
                let mut changed = false;
                for &i in &trial {
                    let pi = p[&i];
                    let one_minus_pi = 1.0 - pi;
                    let joint_without_i = if one_minus_pi > 1e-12 {
                        joint_all / one_minus_pi
                    } else {
                        trial.iter()
                            .filter(|&&j| j != i)
                            .map(|&j| 1.0 - p[&j])
                            .product()
                    };
                    let denom = pi + one_minus_pi * (1.0 - joint_without_i);
                    let updated = if denom > 1e-12 { (pi / denom).min(1.0).max(0.0) } else { 1.0 };
                    if (updated - pi).abs() > 1e-9 {
                        changed = true;
                    }
                    p.insert(i, updated);
                }
                if changed {
                    stall = 0;
                } else {
                    stall += 1;
                }
            }
            Progress::Verdict(Verdict::Unresolved) => {
                stall += 1;
            }
        }

        for v in p.values_mut() {
            if *v >= 1.0 - epsilon {
                *v = 1.0;
            }
        }
    }

    if cancelled {
        counters.cancelled = true;
        logger.cancelled();
        counters.final_size = c.len();
        counters.finalize(&cache, start.elapsed());
        return Ok((c, counters));
    }

    // `c` is known FAIL: either it is the original (contract-checked) seed,
    // untouched, or it was set to a candidate that itself just queried FAIL.
    let outcome = ddmin::reduce_from(model, c, oracle, &mut cache, logger, &cancel, &mut counters);
    let (result, cert_cancelled) = match outcome {
        Outcome::Done(c) => (c, false),
        Outcome::Cancelled(c) => (c, true),
    };

    counters.cancelled = cert_cancelled;
    if cert_cancelled {
        logger.cancelled();
    }
    counters.final_size = result.len();
    counters.finalize(&cache, start.elapsed());
    Ok((result, counters))
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::ItemModel;

    #[test]
    fn drives_required_atoms_to_pinned() {
        // Values equal indices, so "atoms {2, 7, 13}" is unambiguous.
        let items: Vec<i32> = (0..20).collect();
        let model = ItemModel::new(items);
        let mut oracle = |candidate: &Vec<i32>| {
            if [2, 7, 13].iter().all(|needed| candidate.contains(needed)) {
                Verdict::Fail
            } else {
                Verdict::Pass
            }
        };
        let (result, counters) = reduce(&model, &mut oracle, &Logger::discard(), &Config::default()).unwrap();
        assert_eq!(model.materialize(&result), vec![2, 7, 13]);
        assert_eq!(counters.final_size, 3);
    }

    #[test]
    fn select_trial_always_makes_progress() {
        let mut p = BTreeMap::new();
        p.insert(0, 0.99);
        p.insert(1, 0.98);
        let trial = select_trial(&p, 0.7);
        assert!(!trial.is_empty());
    }
}
