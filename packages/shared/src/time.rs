//! Wall-clock utilities with a clock abstraction for testability.

use chrono::Local;

/// Clock trait for dependency injection and testing
pub trait Clock: Send + Sync {
    /// Current wall-clock time formatted for display, precision to the second
    fn wall_time(&self) -> String;
}

/// System clock implementation (uses actual local time)
#[derive(Debug, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn wall_time(&self) -> String {
        local_time_string()
    }
}

/// Fixed clock implementation for testing (returns a fixed time string)
#[derive(Debug, Clone)]
pub struct FixedClock {
    fixed_time: String,
}

impl FixedClock {
    /// Create a new fixed clock with the given display time
    pub fn new(fixed_time: impl Into<String>) -> Self {
        Self {
            fixed_time: fixed_time.into(),
        }
    }
}

impl Clock for FixedClock {
    fn wall_time(&self) -> String {
        self.fixed_time.clone()
    }
}

/// Current local time as `HH:MM:SS`
pub fn local_time_string() -> String {
    Local::now().format("%H:%M:%S").to_string()
}
