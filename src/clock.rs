//! Pipeline clock
//!
//! Policy decisions compare order age against wall-clock time, so the demo
//! runner and tests need a way to pin "now". The clock is built from the
//! config override and threaded into the pipeline explicitly.

use chrono::{DateTime, Utc};

/// Time source for policy evaluation
#[derive(Debug, Clone, Copy, Default)]
pub struct Clock {
    now_override: Option<DateTime<Utc>>,
}

impl Clock {
    /// Real wall-clock time
    pub fn system() -> Self {
        Self { now_override: None }
    }

    /// Frozen clock returning `now` on every call
    pub fn fixed(now: DateTime<Utc>) -> Self {
        Self {
            now_override: Some(now),
        }
    }

    /// Clock from an optional override
    pub fn from_override(now_override: Option<DateTime<Utc>>) -> Self {
        Self { now_override }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.now_override.unwrap_or_else(Utc::now)
    }

    pub fn is_fixed(&self) -> bool {
        self.now_override.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_clock_returns_pinned_time() {
        let pinned = DateTime::parse_from_rfc3339("2025-09-07T12:40:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let clock = Clock::fixed(pinned);

        assert!(clock.is_fixed());
        assert_eq!(clock.now(), pinned);
        assert_eq!(clock.now(), pinned);
    }

    #[test]
    fn test_system_clock_advances() {
        let clock = Clock::system();
        assert!(!clock.is_fixed());

        let a = clock.now();
        let b = clock.now();
        assert!(b >= a);
    }

    #[test]
    fn test_from_override_none_is_system() {
        let clock = Clock::from_override(None);
        assert!(!clock.is_fixed());
    }
}
