//! A minimal actor-style logger for reducer progress and oracle verdicts.
//!
//! Unlike a multi-worker supervisor's logger, a single reducer run has only
//! one writer, so there is no need to filter by severity or coordinate
//! shutdown with other actors: the logger thread simply drains messages
//! until its sender is dropped.

use std::fmt;
use std::io::Write;
use std::sync::mpsc;
use std::thread;

use oracle::Verdict;

/// A log message describing one step of a reducer run.
#[derive(Debug)]
pub enum LoggerMessage {
    /// An oracle query was issued for a candidate of the given size.
    Queried(usize, Verdict),
    /// A cached verdict was returned without invoking the oracle.
    CacheHit(usize, Verdict),
    /// A reducer committed a new, smaller configuration.
    Committed(usize, usize),
    /// The run was cancelled.
    Cancelled,
}

impl fmt::Display for LoggerMessage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            LoggerMessage::Queried(size, verdict) => {
                write!(f, "query: size={} verdict={:?}", size, verdict)
            }
            LoggerMessage::CacheHit(size, verdict) => {
                write!(f, "cache hit: size={} verdict={:?}", size, verdict)
            }
            LoggerMessage::Committed(from, to) => write!(f, "committed: {} -> {}", from, to),
            LoggerMessage::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// A client handle to the logger actor.
#[derive(Clone, Debug)]
pub struct Logger {
    sender: mpsc::Sender<LoggerMessage>,
}

/// Logger client API.
impl Logger {
    /// Spawn a `Logger` actor, writing log lines to the given `Write`able.
    pub fn spawn<W>(to: W) -> Logger
    where
        W: 'static + Send + Write,
    {
        let (sender, receiver) = mpsc::channel();
        thread::spawn(move || Logger::run(to, receiver));
        Logger { sender: sender }
    }

    /// A reducer with no logger: all messages are discarded.
    pub fn discard() -> Logger {
        Logger::spawn(::std::io::sink())
    }

    /// Log an oracle query and its verdict.
    pub fn queried(&self, size: usize, verdict: Verdict) {
        let _ = self.sender.send(LoggerMessage::Queried(size, verdict));
    }

    /// Log a verdict cache hit.
    pub fn cache_hit(&self, size: usize, verdict: Verdict) {
        let _ = self.sender.send(LoggerMessage::CacheHit(size, verdict));
    }

    /// Log that a reducer committed a smaller configuration.
    pub fn committed(&self, from: usize, to: usize) {
        let _ = self.sender.send(LoggerMessage::Committed(from, to));
    }

    /// Log that the run was cancelled.
    pub fn cancelled(&self) {
        let _ = self.sender.send(LoggerMessage::Cancelled);
    }
}

/// Logger actor implementation.
impl Logger {
    fn run<W>(mut to: W, incoming: mpsc::Receiver<LoggerMessage>)
    where
        W: Write,
    {
        for log_msg in incoming {
            let _ = writeln!(&mut to, "{}", log_msg);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oracle::Verdict;
    use std::sync::{Arc, Mutex};

    #[derive(Clone)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> ::std::io::Result<usize> {
            self.0.lock().unwrap().write(buf)
        }
        fn flush(&mut self) -> ::std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn logs_are_written() {
        let buf = Arc::new(Mutex::new(Vec::new()));
        let logger = Logger::spawn(SharedBuf(buf.clone()));
        logger.queried(5, Verdict::Fail);
        logger.committed(9, 5);
        drop(logger);

        // Give the actor thread a chance to drain; the channel disconnecting
        // when `logger` is dropped causes its `for` loop to end promptly.
        for _ in 0..100 {
            if !buf.lock().unwrap().is_empty() {
                break;
            }
            ::std::thread::yield_now();
        }
        let contents = String::from_utf8(buf.lock().unwrap().clone()).unwrap();
        assert!(contents.contains("query"));
    }
}
