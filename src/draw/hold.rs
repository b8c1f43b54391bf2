use std::time::{Duration, Instant};

/// Minimum spacing between progress updates while a hold is in progress.
pub const HOLD_TICK: Duration = Duration::from_millis(16);

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HoldProgress {
    Idle,
    Filling(f32),
    Fired,
}

/// Press-and-hold confirmation. The action fires once the button has been
/// held for `duration`; releasing or leaving earlier cancels it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HoldToConfirm {
    duration: Duration,
    started: Option<Instant>,
}

impl HoldToConfirm {
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            started: None,
        }
    }

    pub fn is_holding(&self) -> bool {
        self.started.is_some()
    }

    pub fn press(&mut self, now: Instant) {
        self.started = Some(now);
    }

    pub fn release(&mut self) {
        self.started = None;
    }

    pub fn tick(&mut self, now: Instant) -> HoldProgress {
        let Some(started) = self.started else {
            return HoldProgress::Idle;
        };
        let held = now.saturating_duration_since(started);
        if held >= self.duration {
            self.started = None;
            return HoldProgress::Fired;
        }
        let fraction = if self.duration.is_zero() {
            1.0
        } else {
            held.as_secs_f32() / self.duration.as_secs_f32()
        };
        HoldProgress::Filling(fraction.clamp(0.0, 1.0))
    }
}
