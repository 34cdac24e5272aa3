//! The benchmark harness (§4.8): runs a matrix of (reducer, input, oracle)
//! cells under a fresh cache and cancellation signal per cell, and emits one
//! newline-delimited JSON record per cell to a caller-supplied sink. The
//! harness never interprets the records itself; persisting them for
//! downstream visualization is someone else's job.

use std::io::Write;

use config::Config;
use counters::{CompletionStatus, Counters};
use error::Result;
use logger::Logger;
use model::{ByteModel, Tree};
use oracle::Oracle;
use reducers::{ddmin, hdd, probdd, tictocmin};

/// Which reducer a benchmark cell runs.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReducerKind {
    /// Classical recursive bisection.
    DdMin,
    /// The bidirectional prefix/suffix sweep.
    TicTocMin,
    /// The belief-distribution reducer.
    ProbDd,
    /// Hierarchical delta debugging over a tree.
    Hdd,
}

impl ReducerKind {
    fn name(&self) -> &'static str {
        match *self {
            ReducerKind::DdMin => "ddmin",
            ReducerKind::TicTocMin => "tictocmin",
            ReducerKind::ProbDd => "probdd",
            ReducerKind::Hdd => "hdd",
        }
    }
}

/// One row of the benchmark table (§6, "Benchmark record schema"). Field
/// order and types are fixed so that the persisted form is consumable by any
/// tabular reader.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkRecord {
    /// The reducer's name, e.g. `"ddmin"`.
    pub reducer: String,
    /// The input's identifier, as supplied by the caller.
    pub input: String,
    /// The size of the configuration the run started from.
    pub initial_size: usize,
    /// The size of the configuration the run ended with.
    pub final_size: usize,
    /// Oracle invocations not served from the cache.
    pub oracle_queries: u64,
    /// Queries served from the cache.
    pub cache_hits: u64,
    /// `FAIL` verdicts observed.
    pub fail: u64,
    /// `PASS` verdicts observed.
    pub pass: u64,
    /// `UNRESOLVED` verdicts observed.
    pub unresolved: u64,
    /// Wall-clock duration of the run, in milliseconds.
    pub wall_time_ms: u64,
    /// How the run ended.
    pub status: CompletionStatus,
}

impl BenchmarkRecord {
    fn new(reducer: ReducerKind, input: &str, counters: Counters) -> BenchmarkRecord {
        BenchmarkRecord {
            reducer: reducer.name().to_string(),
            input: input.to_string(),
            initial_size: counters.initial_size,
            final_size: counters.final_size,
            oracle_queries: counters.oracle_queries,
            cache_hits: counters.cache_hits,
            fail: counters.fail,
            pass: counters.pass,
            unresolved: counters.unresolved,
            wall_time_ms: counters.wall_time_ms,
            status: counters.status(),
        }
    }
}

fn write_record<W: Write>(out: &mut W, record: &BenchmarkRecord) -> Result<()> {
    ::serde_json::to_writer(&mut *out, record)?;
    out.write_all(b"\n")?;
    Ok(())
}

/// One named byte-string input and a factory for a fresh oracle instance,
/// since a `Script` oracle (or any oracle owning a subprocess) cannot be
/// reused across cells that each need their own cache and counters.
pub struct SequenceCell<'a, F> {
    /// The input's identifier, for the emitted records.
    pub name: &'a str,
    /// The input's bytes.
    pub data: Vec<u8>,
    /// Builds a fresh oracle for one reducer's run against this input.
    pub make_oracle: F,
}

// `F` is typically a closure, which has no `Debug` impl of its own; print
// everything but the oracle factory.
impl<'a, F> ::std::fmt::Debug for SequenceCell<'a, F> {
    fn fmt(&self, f: &mut ::std::fmt::Formatter) -> ::std::fmt::Result {
        f.debug_struct("SequenceCell")
            .field("name", &self.name)
            .field("data", &self.data)
            .finish()
    }
}

/// Run every cell in `cells` through every reducer kind in `reducers` other
/// than [`ReducerKind::Hdd`] (which needs a tree, not a byte buffer; see
/// [`run_hdd_cell`]), appending one record per (reducer, cell) pair to `out`.
pub fn run_sequence_matrix<F, O, W>(
    reducers: &[ReducerKind],
    cells: &[SequenceCell<F>],
    config: &Config,
    out: &mut W,
) -> Result<Vec<BenchmarkRecord>>
where
    F: Fn() -> O,
    O: Oracle<Candidate = Vec<u8>>,
    W: Write,
{
    let mut records = Vec::new();
    let logger = Logger::discard();

    for cell in cells {
        let model = ByteModel::new(cell.data.clone());
        for &kind in reducers {
            if kind == ReducerKind::Hdd {
                continue;
            }
            let mut oracle = (cell.make_oracle)();
            let (_, counters) = match kind {
                ReducerKind::DdMin => ddmin::reduce(&model, &mut oracle, &logger, config)?,
                ReducerKind::TicTocMin => tictocmin::reduce(&model, &mut oracle, &logger, config)?,
                ReducerKind::ProbDd => probdd::reduce(&model, &mut oracle, &logger, config)?,
                ReducerKind::Hdd => unreachable!("filtered out above"),
            };
            let record = BenchmarkRecord::new(kind, cell.name, counters);
            write_record(out, &record)?;
            records.push(record);
        }
    }

    Ok(records)
}

/// Run one `HDD` cell against `tree`, appending its record to `out`.
pub fn run_hdd_cell<O, W>(
    name: &str,
    tree: &Tree,
    oracle: &mut O,
    config: &Config,
    out: &mut W,
) -> Result<BenchmarkRecord>
where
    O: Oracle<Candidate = String>,
    W: Write,
{
    let logger = Logger::discard();
    let (_, counters) = hdd::reduce(tree, oracle, &logger, config)?;
    let record = BenchmarkRecord::new(ReducerKind::Hdd, name, counters);
    write_record(out, &record)?;
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use oracle::Verdict;

    #[test]
    fn matrix_emits_one_record_per_reducer_per_cell() {
        let cells = vec![
            SequenceCell {
                name: "abc-in-noise",
                data: b"xxxabcxxx".to_vec(),
                make_oracle: || {
                    |candidate: &Vec<u8>| if candidate.windows(3).any(|w| w == b"abc") {
                        Verdict::Fail
                    } else {
                        Verdict::Pass
                    }
                },
            },
        ];
        let kinds = [ReducerKind::DdMin, ReducerKind::TicTocMin, ReducerKind::ProbDd];
        let mut out = Vec::new();
        let records = run_sequence_matrix(&kinds, &cells, &Config::default(), &mut out).unwrap();
        assert_eq!(records.len(), 3);
        for record in &records {
            assert_eq!(record.input, "abc-in-noise");
            assert_eq!(record.final_size, 3);
        }

        let lines: Vec<&str> = ::std::str::from_utf8(&out).unwrap().lines().collect();
        assert_eq!(lines.len(), 3);
        let parsed: BenchmarkRecord = ::serde_json::from_str(lines[0]).unwrap();
        assert_eq!(parsed, records[0]);
    }
}
