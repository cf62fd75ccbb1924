use std::time::Duration;

/// Default sleep between status polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_micros(10);

/// Default poll budget while waiting for the channel to become free (100 ms).
pub const DEFAULT_FREE_WAIT_POLLS: u32 = 10_000;

/// Default poll budget while waiting for the response (1 s).
pub const DEFAULT_RESPONSE_WAIT_POLLS: u32 = 100_000;

/// A bounded busy-wait: poll up to `max_polls` times, sleeping `interval`
/// between polls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_polls: u32,
}

impl PollPolicy {
    pub const fn new(interval: Duration, max_polls: u32) -> Self {
        Self {
            interval,
            max_polls,
        }
    }

    /// Nominal wall-clock ceiling. Real sleeps may overshoot it.
    pub fn ceiling(&self) -> Duration {
        self.interval * self.max_polls
    }
}

/// Timeout configuration for [`Transport`](crate::Transport).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportConfig {
    /// Window for the channel-status busy bit to clear before sending.
    pub free_wait: PollPolicy,
    /// Window for the response-ready bit to set after the doorbell.
    pub response_wait: PollPolicy,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            free_wait: PollPolicy::new(DEFAULT_POLL_INTERVAL, DEFAULT_FREE_WAIT_POLLS),
            response_wait: PollPolicy::new(DEFAULT_POLL_INTERVAL, DEFAULT_RESPONSE_WAIT_POLLS),
        }
    }
}

impl TransportConfig {
    /// Use the same poll interval for both windows.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.free_wait.interval = interval;
        self.response_wait.interval = interval;
        self
    }
}
