//! Custom errors and results.

use serde_json;
use std::error;
use std::fmt;
use std::io;

/// The kinds of errors that can happen when running a reducer.
///
/// Oracle exceptions, per-query timeouts, cache inconsistencies, and tree
/// illegality are deliberately *not* represented here: those are mapped to
/// an `UNRESOLVED` verdict and handled locally by the reducer. Only a
/// contract violation (the initial input is not `FAIL`) or cancellation
/// ever reach a caller.
#[derive(Debug)]
pub enum Error {
    /// The initial, full configuration was not classified `FAIL` by the
    /// oracle. A reducer cannot make progress without a failing seed.
    ContractViolation(String),

    /// An IO error reading an input file, spawning an oracle script, or
    /// writing a benchmark record.
    Io(io::Error),

    /// A benchmark record failed to serialize.
    Json(serde_json::Error),

    /// The run was cancelled, either by SIGINT or by exceeding its global
    /// time budget. The caller already has the best `FAIL` configuration
    /// found so far and the final counters from the reducer's return value.
    Cancelled,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> ::std::result::Result<(), fmt::Error> {
        match *self {
            Error::ContractViolation(ref details) => {
                write!(f, "initial input is not FAIL: {}", details)
            }
            Error::Io(ref e) => fmt::Display::fmt(e, f),
            Error::Json(ref e) => fmt::Display::fmt(e, f),
            Error::Cancelled => write!(f, "run was cancelled"),
        }
    }
}

impl error::Error for Error {
    fn description(&self) -> &str {
        match *self {
            Error::ContractViolation(_) => "initial input is not FAIL",
            Error::Io(ref e) => error::Error::description(e),
            Error::Json(ref e) => error::Error::description(e),
            Error::Cancelled => "run was cancelled",
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::Io(e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Json(e)
    }
}

/// A `Result` whose `Err` variant is `ddmin::error::Error`.
pub type Result<T> = ::std::result::Result<T, Error>;
