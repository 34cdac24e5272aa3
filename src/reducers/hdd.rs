//! Hierarchical Delta Debugging (§4.6): run a sequence reducer over the
//! removable nodes at each tree level in turn, committing each level's
//! minimal subset before moving to the next.
//!
//! Each level gets its own fresh verdict cache. `IndexSetFingerprint` is only
//! injective "for a fixed input model" (see [`crate::fingerprint`]): the same
//! local index set `{0, 2}` means a different pair of tree nodes at level 1
//! than it does at level 2, so sharing one cache across levels would conflate
//! them. A fresh cache per level costs a little repeated bookkeeping but
//! keeps every lookup sound.

use std::collections::HashSet;
use std::time::Instant;

use config::{Config, InnerReducer};
use counters::{self, Counters};
use error::{Error, Result};
use logger::Logger;
use model::{Configuration, InputModel, NodeId, Tree};
use oracle::Oracle;
use reducers::{self, Outcome};

use reducers::ddmin;
use reducers::tictocmin;

/// A single tree level's removable nodes, presented as a sequence reducer's
/// atoms. An atom's index in this model is local to the level; its value is
/// the node's [`NodeId`] in the tree being reduced.
struct LevelModel<'a> {
    tree: &'a Tree,
    removable: Vec<NodeId>,
}

impl<'a> InputModel for LevelModel<'a> {
    type Atom = NodeId;
    type Rendered = String;

    fn size(&self) -> usize {
        self.removable.len()
    }

    fn atoms(&self) -> &[NodeId] {
        &self.removable
    }

    fn materialize(&self, configuration: &Configuration) -> String {
        let kept: HashSet<NodeId> = configuration.iter().map(|i| self.removable[i]).collect();
        let pruned: HashSet<NodeId> = self.removable
            .iter()
            .cloned()
            .filter(|id| !kept.contains(id))
            .collect();
        self.tree.yield_pruning(&pruned)
    }
}

fn apply_level_result(tree: &mut Tree, removable: &[NodeId], minimal: &Configuration) {
    let kept: HashSet<NodeId> = minimal.iter().map(|i| removable[i]).collect();
    let pruned: HashSet<NodeId> = removable
        .iter()
        .cloned()
        .filter(|id| !kept.contains(id))
        .collect();
    tree.prune(&pruned);
}

/// Reduce `tree` level-by-level, returning the minimized yield.
///
/// The whole, unpruned tree must itself yield `FAIL`; this is checked once,
/// up front, uncached (it is only ever asked once). Each subsequent level's
/// starting point -- "nothing pruned yet at this level" -- is exactly the
/// working tree's current yield, whose `FAIL`-ness was established by the
/// prior level's own last committed query (or by this initial check, for
/// level 0), so it is not re-verified per level.
pub fn reduce<O>(tree: &Tree, oracle: &mut O, logger: &Logger, config: &Config) -> Result<(String, Counters)>
where
    O: Oracle<Candidate = String>,
{
    let start = Instant::now();
    let cancel = reducers::new_cancellation(config);
    let mut counters = Counters::default();
    counters.initial_size = tree.node_count();

    let mut working = tree.clone();

    if cancel.is_cancelled() {
        counters.cancelled = true;
        logger.cancelled();
        counters.final_size = working.node_count();
        counters.wall_time_ms = counters::elapsed_ms(start.elapsed());
        return Ok((working.yield_all(), counters));
    }

    let whole = working.yield_all();
    let verdict = oracle.query(&whole);
    counters.oracle_queries += 1;
    counters.record(verdict);
    logger.queried(working.node_count(), verdict);
    if !verdict.is_fail() {
        return Err(Error::ContractViolation(format!(
            "initial tree yield was not FAIL (got {:?})",
            verdict
        )));
    }

    let mut level = 0;
    loop {
        if level > working.max_level() {
            break;
        }

        let removable = working.removable_at_level(level);
        if removable.is_empty() {
            level += 1;
            continue;
        }

        let level_model = LevelModel {
            tree: &working,
            removable: removable.clone(),
        };
        let seed = Configuration::full(level_model.size());
        let mut level_cache = reducers::new_cache(config);

        let outcome = match config.hdd_inner_reducer {
            InnerReducer::DdMin => {
                ddmin::reduce_from(&level_model, seed, oracle, &mut level_cache, logger, &cancel, &mut counters)
            }
            InnerReducer::TicTocMin => {
                tictocmin::reduce_from(&level_model, seed, oracle, &mut level_cache, logger, &cancel, &mut counters)
            }
        };
        counters.accumulate_cache(&level_cache);

        let (minimal, cancelled) = match outcome {
            Outcome::Done(c) => (c, false),
            Outcome::Cancelled(c) => (c, true),
        };
        apply_level_result(&mut working, &removable, &minimal);

        if cancelled {
            counters.cancelled = true;
            logger.cancelled();
            counters.final_size = working.node_count();
            counters.wall_time_ms = counters::elapsed_ms(start.elapsed());
            return Ok((working.yield_all(), counters));
        }

        level += 1;
    }

    counters.final_size = working.node_count();
    counters.wall_time_ms = counters::elapsed_ms(start.elapsed());
    Ok((working.yield_all(), counters))
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::TreeNode;
    use oracle::Verdict;

    fn call(name: &str, args: Vec<TreeNode>) -> TreeNode {
        let mut children = vec![TreeNode::leaf(format!("{}(", name)).removable(false)];
        for (i, arg) in args.into_iter().enumerate() {
            if i > 0 {
                children.push(TreeNode::leaf(",").removable(false));
            }
            children.push(arg);
        }
        children.push(TreeNode::leaf(")").removable(false));
        TreeNode::with_children(children)
    }

    #[test]
    fn prunes_the_branch_without_h() {
        let tree = Tree::new(
            call(
                "f",
                vec![
                    call("g", vec![TreeNode::leaf("1"), TreeNode::leaf("2")]),
                    call("h", vec![TreeNode::leaf("3"), TreeNode::leaf("4")]),
                ],
            ).removable(false),
        );

        let mut oracle = |candidate: &String| if candidate.contains('h') {
            Verdict::Fail
        } else {
            Verdict::Pass
        };

        let (result, counters) = reduce(&tree, &mut oracle, &Logger::discard(), &Config::default()).unwrap();
        assert!(result.contains("h(3,4)"));
        assert!(!result.contains('g'));
        assert!(counters.final_size <= counters.initial_size);
    }
}
