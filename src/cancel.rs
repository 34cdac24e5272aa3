//! Cancellation: a SIGINT-driven flag plus an optional wall-clock deadline,
//! checked at the single suspension point a reducer has -- immediately
//! before an oracle invocation the verdict cache would otherwise perform.
//!
//! Unlike a multi-worker supervisor, a single reducer run has exactly one
//! thread of control, so there is no need for a dedicated polling actor
//! thread or an `mpsc` notification: the flag is read directly in-loop.

use ctrlc;
use std::sync::{Arc, Once, ONCE_INIT};
use std::sync::atomic::{AtomicBool, Ordering, ATOMIC_BOOL_INIT};
use std::time::{Duration, Instant};

static GOT_SIGINT: AtomicBool = ATOMIC_BOOL_INIT;
static SET_SIGINT_HANDLER: Once = ONCE_INIT;

fn install_sigint_handler() {
    SET_SIGINT_HANDLER.call_once(|| {
        // If installing the handler fails, we just never see a graceful
        // cancellation and a SIGINT kills the process the hard way instead.
        let _ = ctrlc::set_handler(|| {
            GOT_SIGINT.store(true, Ordering::SeqCst);
        });
    });
}

/// The cancellation signal a reducer consults before every oracle query.
///
/// Cheaply `Clone`-able: the deadline is a plain `Instant` and the SIGINT
/// flag is process-global, so every clone observes the same signal.
#[derive(Clone, Debug)]
pub struct Cancellation {
    deadline: Option<Instant>,
    // Kept only so that `Cancellation` carries its own handle, even though
    // the flag it reads is a process-wide static.
    _marker: Arc<()>,
}

impl Cancellation {
    /// A cancellation signal with no time budget: only a SIGINT can cancel.
    pub fn new() -> Cancellation {
        install_sigint_handler();
        Cancellation {
            deadline: None,
            _marker: Arc::new(()),
        }
    }

    /// A cancellation signal that also fires once `budget` has elapsed.
    pub fn with_time_budget(budget: Duration) -> Cancellation {
        install_sigint_handler();
        Cancellation {
            deadline: Some(Instant::now() + budget),
            _marker: Arc::new(()),
        }
    }

    /// Has this run been cancelled, either by SIGINT or by exceeding its
    /// time budget?
    pub fn is_cancelled(&self) -> bool {
        GOT_SIGINT.load(Ordering::SeqCst) ||
            self.deadline.map_or(false, |d| Instant::now() >= d)
    }
}

impl Default for Cancellation {
    fn default() -> Cancellation {
        Cancellation::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_budget_is_not_cancelled() {
        let c = Cancellation::new();
        assert!(!c.is_cancelled());
    }

    #[test]
    fn zero_budget_is_immediately_cancelled() {
        let c = Cancellation::with_time_budget(Duration::from_secs(0));
        ::std::thread::sleep(Duration::from_millis(5));
        assert!(c.is_cancelled());
    }

    #[test]
    fn ample_budget_is_not_cancelled() {
        let c = Cancellation::with_time_budget(Duration::from_secs(60));
        assert!(!c.is_cancelled());
    }
}
