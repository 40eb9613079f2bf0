//! Time boxes for extraction work
//!
//! Parsing cannot be preempted, so [`run_with_deadline`] moves the work to a
//! helper thread and stops waiting once the budget is spent. The work also
//! receives a [`Deadline`] and checks it between steps, so an abandoned
//! thread exits at its next checkpoint.

use crate::extractor::ExtractError;
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

/// A point in time after which work should stop
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    at: Instant,
    budget: Duration,
}

impl Deadline {
    pub fn after(budget: Duration) -> Self {
        Self {
            at: Instant::now() + budget,
            budget,
        }
    }

    pub fn expired(&self) -> bool {
        Instant::now() >= self.at
    }

    /// Fails with `ExtractError::Timeout` once the deadline has passed
    pub fn check(&self) -> Result<(), ExtractError> {
        if self.expired() {
            Err(self.timeout_error())
        } else {
            Ok(())
        }
    }

    fn timeout_error(&self) -> ExtractError {
        ExtractError::Timeout {
            after_ms: u64::try_from(self.budget.as_millis()).unwrap_or(u64::MAX),
        }
    }
}

/// Runs `work` on a helper thread and waits at most `budget` for it
///
/// A timeout or a panic inside `work` is returned as an error; the caller is
/// never blocked past the budget.
pub fn run_with_deadline<T, F>(budget: Duration, work: F) -> Result<T, ExtractError>
where
    T: Send + 'static,
    F: FnOnce(Deadline) -> Result<T, ExtractError> + Send + 'static,
{
    let deadline = Deadline::after(budget);
    let (tx, rx) = mpsc::channel();

    thread::Builder::new()
        .name("sieve-deadline".to_string())
        .spawn(move || {
            // The receiver is gone when the caller already gave up
            let _ = tx.send(work(deadline));
        })
        .map_err(|e| ExtractError::Panicked(format!("failed to spawn worker: {}", e)))?;

    match rx.recv_timeout(budget) {
        Ok(result) => result,
        Err(mpsc::RecvTimeoutError::Timeout) => Err(deadline.timeout_error()),
        Err(mpsc::RecvTimeoutError::Disconnected) => {
            Err(ExtractError::Panicked("analysis thread panicked".to_string()))
        }
    }
}
