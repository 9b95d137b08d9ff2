use chrono::{DateTime, Duration as ChronoDuration, Utc};
use tracing::warn;

use crate::constants::LIMITS;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClearStep {
    Armed,
    Confirmed,
}

/// Two-step confirmation for destructive actions.
///
/// The first press arms a window; a second press inside it confirms and
/// disarms. An expired window counts as disarmed, so the next press re-arms.
#[derive(Clone, Debug)]
pub struct ConfirmGuard {
    window: ChronoDuration,
    armed_at: Option<DateTime<Utc>>,
}

impl ConfirmGuard {
    pub fn new(window_seconds: u64, armed_at: Option<DateTime<Utc>>) -> Self {
        let window = i64::try_from(window_seconds)
            .ok()
            .and_then(ChronoDuration::try_seconds)
            .unwrap_or_else(|| {
                warn!(window_seconds, "confirmation window out of range, using default");
                ChronoDuration::seconds(LIMITS.clear_confirm_seconds as i64)
            });
        Self { window, armed_at }
    }

    pub fn armed_at(&self) -> Option<DateTime<Utc>> {
        self.armed_at
    }

    pub fn is_armed(&self, now: DateTime<Utc>) -> bool {
        self.armed_at
            .is_some_and(|armed| now >= armed && now - armed <= self.window)
    }

    pub fn press(&mut self, now: DateTime<Utc>) -> ClearStep {
        if self.is_armed(now) {
            self.armed_at = None;
            ClearStep::Confirmed
        } else {
            self.armed_at = Some(now);
            ClearStep::Armed
        }
    }
}
