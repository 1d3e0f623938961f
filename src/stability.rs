// src/stability.rs
use std::time::{Duration, Instant};

pub const STABILITY_WINDOW: Duration = Duration::from_millis(300);

/// Debounces the raw per-frame finger count: a count is reported only after it
/// has been observed unchanged for [`STABILITY_WINDOW`].
#[derive(Debug, Clone, Default)]
pub struct StabilityFilter {
    candidate: Option<u8>,
    candidacy_start: Option<Instant>,
}

impl StabilityFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, raw_count: u8, now: Instant) -> Option<u8> {
        if self.candidate != Some(raw_count) {
            self.candidate = Some(raw_count);
            self.candidacy_start = Some(now);
            return None;
        }

        let start = self.candidacy_start?;
        (now.saturating_duration_since(start) >= STABILITY_WINDOW).then_some(raw_count)
    }

    pub fn candidate(&self) -> Option<u8> {
        self.candidate
    }
}
