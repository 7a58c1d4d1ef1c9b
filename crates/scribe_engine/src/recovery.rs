//! Retry, backoff and graceful-degradation policy for classified errors.

use std::time::Duration;

use scribe_core::Mode;

use crate::{AiError, AiErrorKind};

/// Consecutive timed-out attempts after which timeouts count as persistent.
pub const DEGRADE_AFTER_TIMEOUTS: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecoveryStrategy {
    /// Manual retries the user may still attempt.
    pub retry_attempts: u32,
    pub backoff_base: Duration,
    /// Mode to fall back to when the failure looks persistent.
    pub fallback_mode: Mode,
}

/// Most recent failure of a session and whether a manual retry is allowed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ErrorState {
    pub has_error: bool,
    pub error: Option<AiError>,
    pub recovery_strategy: Option<RecoveryStrategy>,
    pub can_retry: bool,
    pub retry_count: u32,
    /// Mode of the operation that failed.
    pub failed_mode: Option<Mode>,
    /// Timed-out attempts in a row, across operations.
    pub timeout_streak: u32,
}

impl ErrorState {
    /// Records a failure and recomputes `can_retry`.
    pub fn record(&mut self, error: AiError, mode: Mode, retry_count: u32, timeout_streak: u32) {
        let strategy = retry_strategy(&error, mode, timeout_streak);
        self.can_retry = strategy.retry_attempts > 0 && retry_count < strategy.retry_attempts;
        self.has_error = true;
        self.error = Some(error);
        self.recovery_strategy = Some(strategy);
        self.retry_count = retry_count;
        self.failed_mode = Some(mode);
        self.timeout_streak = timeout_streak;
    }

    /// Forgets the failure but keeps the timeout streak.
    pub fn clear(&mut self) {
        let timeout_streak = self.timeout_streak;
        *self = Self {
            timeout_streak,
            ..Self::default()
        };
    }

    pub fn should_gracefully_degrade(&self) -> bool {
        self.error
            .as_ref()
            .is_some_and(|error| should_gracefully_degrade(error, self.timeout_streak))
    }
}

pub fn retry_strategy(error: &AiError, mode: Mode, timeout_streak: u32) -> RecoveryStrategy {
    let (retry_attempts, backoff_base) = match error.kind {
        AiErrorKind::Validation | AiErrorKind::Cancelled => (0, Duration::ZERO),
        AiErrorKind::Timeout => (3, Duration::from_millis(1000)),
        AiErrorKind::ServiceUnavailable => (3, Duration::from_millis(2000)),
        AiErrorKind::Api => (2, Duration::from_millis(1000)),
        AiErrorKind::Unknown => (1, Duration::from_millis(1000)),
    };
    RecoveryStrategy {
        retry_attempts,
        backoff_base,
        fallback_mode: fallback_mode(error, mode, timeout_streak),
    }
}

/// Simpler mode to switch to when `error` signals persistent unavailability.
pub fn fallback_mode(error: &AiError, mode: Mode, timeout_streak: u32) -> Mode {
    if !should_gracefully_degrade(error, timeout_streak) {
        return mode;
    }
    match mode {
        Mode::Continue => Mode::Prompt,
        Mode::Modify | Mode::Prompt | Mode::None => Mode::None,
    }
}

pub fn should_gracefully_degrade(error: &AiError, timeout_streak: u32) -> bool {
    match error.kind {
        AiErrorKind::ServiceUnavailable => true,
        AiErrorKind::Timeout => timeout_streak >= DEGRADE_AFTER_TIMEOUTS,
        _ => false,
    }
}

/// Delay before retrying after failed attempt `attempt` (1-based):
/// `min(base * 2^(attempt-1), cap)`.
pub fn backoff_delay(attempt: u32, base: Duration, cap: Duration) -> Duration {
    let exponent = attempt.saturating_sub(1).min(16);
    base.saturating_mul(1 << exponent).min(cap)
}
