//! Configuration options recognized by reducers (§6): atom granularity,
//! verdict cache sizing, wall-clock budget, and the per-algorithm knobs for
//! `ProbDD` and `HDD`.

use std::time::Duration;

/// The atom granularity for a file or string input.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Granularity {
    /// Each byte is an atom.
    Bytes,
    /// Each line (including its terminator) is an atom.
    Lines,
    /// Atoms are produced by splitting on every match of a user-supplied
    /// regex, keeping each match as its own atom between the atoms it
    /// separates.
    Custom(String),
}

/// Which sequence reducer `HDD` runs at each tree level.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum InnerReducer {
    /// Classical recursive bisection (the default).
    DdMin,
    /// The bidirectional prefix/suffix sweep.
    TicTocMin,
}

/// `ProbDD`'s tunables (§4.7), with the spec's defaults.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ProbDdConfig {
    /// The joint-removal-probability threshold `τ` a trial subset's prefix
    /// must clear. Default `0.7`.
    pub tau: f64,
    /// The convergence threshold `ε`: an atom with `p ≥ 1 - ε` is pinned.
    /// Default `1e-3`.
    pub epsilon: f64,
    /// Consecutive no-progress iterations before giving up, if `None`
    /// defaults to `2 * n` at run time (`n` is only known once the seed
    /// configuration's size is).
    pub stall_k: Option<usize>,
}

impl Default for ProbDdConfig {
    fn default() -> ProbDdConfig {
        ProbDdConfig {
            tau: 0.7,
            epsilon: 1e-3,
            stall_k: None,
        }
    }
}

/// Top-level configuration shared by every reducer.
#[derive(Clone, Debug)]
pub struct Config {
    /// The atom granularity for file/string inputs.
    pub granularity: Granularity,
    /// Whether the verdict cache is consulted at all. Default `true`;
    /// disabling it is mostly useful for benchmarking the cache's own
    /// contribution, since every reducer still needs *some* place to count
    /// queries.
    pub cache_enabled: bool,
    /// An optional cap on the verdict cache's size, with LRU eviction.
    /// `None` (the default) never evicts.
    pub cache_cap: Option<usize>,
    /// An optional global wall-clock budget for the whole run.
    pub time_budget: Option<Duration>,
    /// `ProbDD`'s tunables.
    pub probdd: ProbDdConfig,
    /// Which sequence reducer `HDD` runs at each level.
    pub hdd_inner_reducer: InnerReducer,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            granularity: Granularity::Bytes,
            cache_enabled: true,
            cache_cap: None,
            time_budget: None,
            probdd: ProbDdConfig::default(),
            hdd_inner_reducer: InnerReducer::DdMin,
        }
    }
}
