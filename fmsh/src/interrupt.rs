//! Double-interrupt detection
//!
//! A single Ctrl+C aborts the running operation (or prints a hint when idle).
//! A second one within the window exits the shell, whatever state it is in.

use std::time::{Duration, Instant};

pub const DEFAULT_WINDOW: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptAction {
    /// Second interrupt inside the window.
    Exit,
    /// Abort the token of the running operation.
    AbortOperation,
    /// Nothing is running; tell the user how to exit.
    Hint,
}

#[derive(Debug, Clone)]
pub struct InterruptTracker {
    window: Duration,
    last: Option<Instant>,
}

impl InterruptTracker {
    pub fn new(window: Duration) -> Self {
        Self { window, last: None }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Record an interrupt at `now` and decide what it means.
    pub fn register(&mut self, now: Instant, operation_running: bool) -> InterruptAction {
        if let Some(last) = self.last {
            if now.saturating_duration_since(last) <= self.window {
                self.last = None;
                return InterruptAction::Exit;
            }
        }
        self.last = Some(now);
        if operation_running {
            InterruptAction::AbortOperation
        } else {
            InterruptAction::Hint
        }
    }
}

impl Default for InterruptTracker {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW)
    }
}
