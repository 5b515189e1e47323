//! Converts the level signal "which prayer window is open" into edges.
//!
//! ```text
//!   observe(p)                       observe(q), q != last
//!  Unset ─────────► Watching(p) ───────────────────────────► Watching(q)
//!    ▲   baseline,       │          emits Transition { to: q }
//!    │   no edge         │ observe(p): no-op
//!    └──── reset() ──────┘
//! ```
//!
//! Comparison is against the last *observed* value, not against a
//! timestamp, so any number of ticks inside one window produce nothing.

use log::debug;

use crate::models::{AlarmSet, PrayerName};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: PrayerName,
    pub to: PrayerName,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlarmTrigger {
    pub prayer: PrayerName,
}

#[derive(Debug, Default)]
pub struct TransitionTracker {
    last_observed: Option<PrayerName>,
}

impl TransitionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_observed(&self) -> Option<PrayerName> {
        self.last_observed
    }

    /// Forget the baseline. The next observation re-baselines silently,
    /// so switching city does not fire an alarm for the new city's window.
    pub fn reset(&mut self) {
        self.last_observed = None;
    }

    pub fn observe(&mut self, now_prayer: PrayerName) -> Option<Transition> {
        match self.last_observed.replace(now_prayer) {
            None => {
                debug!("tracker baseline: {}", now_prayer);
                None
            }
            Some(prev) if prev == now_prayer => None,
            Some(prev) => {
                debug!("transition {} -> {}", prev, now_prayer);
                Some(Transition {
                    from: prev,
                    to: now_prayer,
                })
            }
        }
    }

    /// Observe and return an alarm trigger when the window just entered has
    /// its alarm switched on.
    pub fn observe_with_alarms(
        &mut self,
        now_prayer: PrayerName,
        alarms: &AlarmSet,
    ) -> Option<AlarmTrigger> {
        self.observe(now_prayer)
            .filter(|t| alarms.is_enabled(t.to))
            .map(|t| AlarmTrigger { prayer: t.to })
    }
}
