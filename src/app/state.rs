use std::time::{Duration, Instant};

/// What a single poll of the provider came back with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    Playing,
    NotPlaying,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatingState {
    /// Nothing polled yet.
    Idle,
    Playing,
    Stopped {
        since: Instant,
        idle_shown: bool,
    },
    /// `failures` consecutive polls or recoveries have failed.
    Error {
        failures: u32,
    },
}

impl OperatingState {
    pub fn on_poll(self, outcome: PollOutcome, now: Instant) -> Self {
        match (self, outcome) {
            (_, PollOutcome::Playing) => OperatingState::Playing,
            (stopped @ OperatingState::Stopped { .. }, PollOutcome::NotPlaying) => stopped,
            (_, PollOutcome::NotPlaying) => OperatingState::Stopped {
                since: now,
                idle_shown: false,
            },
            (state, PollOutcome::Failed) => OperatingState::Error {
                failures: state.failures() + 1,
            },
        }
    }

    /// Recovery (re-authentication) failed while in `Error`.
    pub fn on_recovery_failed(self) -> Self {
        OperatingState::Error {
            failures: self.failures() + 1,
        }
    }

    pub fn on_idle_shown(self) -> Self {
        match self {
            OperatingState::Stopped { since, .. } => OperatingState::Stopped {
                since,
                idle_shown: true,
            },
            other => other,
        }
    }

    pub fn failures(&self) -> u32 {
        match self {
            OperatingState::Error { failures } => *failures,
            _ => 0,
        }
    }

    /// True once nothing has played for longer than `timeout` and the
    /// placeholder is not up yet.
    pub fn idle_due(&self, now: Instant, timeout: Duration) -> bool {
        match self {
            OperatingState::Stopped {
                since,
                idle_shown: false,
            } => now.saturating_duration_since(*since) > timeout,
            _ => false,
        }
    }
}

/// Delay before recovery attempt number `failures`: `base` doubling each
/// time, capped at `max`.
pub fn backoff(failures: u32, base: Duration, max: Duration) -> Duration {
    let exponent = failures.saturating_sub(1).min(16);
    base.saturating_mul(1 << exponent).min(max)
}
