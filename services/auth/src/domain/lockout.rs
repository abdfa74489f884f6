//! Failed-login counter and lock window.
//!
//! | From | Event | To |
//! |------|-------|----|
//! | `Active` | correct password | `Active`, attempts = 0 |
//! | `Active` | wrong password, attempts+1 < max | `Active`, attempts + 1 |
//! | `Active` | wrong password, attempts+1 >= max | `Locked(now + lock_duration)` |
//! | `Locked` | any attempt while `now < until` | rejected, unchanged |
//! | `Locked` | attempt once `now >= until` | treated as `Active` with attempts = 0 |
//! | any | admin unlock | `Active`, attempts = 0 |
//!
//! Expiry is lazy: nothing sweeps locks, the next attempt observes it.

use chrono::{DateTime, Duration, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockoutPolicy {
    pub max_attempts: u32,
    pub lock_duration: Duration,
}

impl Default for LockoutPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            lock_duration: Duration::minutes(30),
        }
    }
}

/// Persisted lockout fields of a user row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LockoutState {
    pub failed_attempts: u32,
    pub locked_until: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountState {
    Active,
    Locked { until: DateTime<Utc> },
}

impl LockoutState {
    pub fn state(&self, now: DateTime<Utc>) -> AccountState {
        match self.locked_until {
            Some(until) if until > now => AccountState::Locked { until },
            _ => AccountState::Active,
        }
    }

    pub fn is_locked(&self, now: DateTime<Utc>) -> bool {
        matches!(self.state(now), AccountState::Locked { .. })
    }

    /// Failures that still count at `now`. An expired lock starts a fresh count.
    fn live_attempts(&self, now: DateTime<Utc>) -> u32 {
        match self.locked_until {
            Some(until) if until <= now => 0,
            _ => self.failed_attempts,
        }
    }
}

impl LockoutPolicy {
    /// State after a wrong password (or wrong second factor) at `now`.
    ///
    /// Callers must have rejected currently-locked accounts beforehand.
    pub fn record_failure(&self, state: &LockoutState, now: DateTime<Utc>) -> LockoutState {
        let attempts = state.live_attempts(now).saturating_add(1);
        if attempts >= self.max_attempts {
            LockoutState {
                failed_attempts: attempts,
                locked_until: Some(now + self.lock_duration),
            }
        } else {
            LockoutState {
                failed_attempts: attempts,
                locked_until: None,
            }
        }
    }

    /// State after a successful login, and after an admin unlock.
    pub fn reset(&self) -> LockoutState {
        LockoutState::default()
    }
}
