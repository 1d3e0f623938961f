// src/swipe.rs
use crate::geometry::PixelPoint;

pub const HISTORY_CAPACITY: usize = 10;

const MIN_SAMPLES: usize = 8;
const MIN_HORIZONTAL_PX: f64 = 120.0;
const MAX_VERTICAL_PX: f64 = 80.0;
const HORIZONTAL_DOMINANCE: f64 = 1.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwipeDirection {
    Left,
    Right,
}

impl SwipeDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Left => "swipe_left",
            Self::Right => "swipe_right",
        }
    }
}

/// Fixed-capacity ring of wrist positions. `head` is the slot of the oldest
/// entry; once full, a push overwrites it.
#[derive(Debug, Clone)]
pub struct PositionHistory {
    slots: [PixelPoint; HISTORY_CAPACITY],
    head: usize,
    len: usize,
}

impl Default for PositionHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl PositionHistory {
    pub fn new() -> Self {
        Self {
            slots: [PixelPoint::origin(); HISTORY_CAPACITY],
            head: 0,
            len: 0,
        }
    }

    pub fn push(&mut self, position: PixelPoint) {
        if self.len < HISTORY_CAPACITY {
            self.slots[(self.head + self.len) % HISTORY_CAPACITY] = position;
            self.len += 1;
        } else {
            self.slots[self.head] = position;
            self.head = (self.head + 1) % HISTORY_CAPACITY;
        }
    }

    pub fn clear(&mut self) {
        self.head = 0;
        self.len = 0;
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn oldest(&self) -> Option<PixelPoint> {
        (self.len > 0).then(|| self.slots[self.head])
    }

    pub fn newest(&self) -> Option<PixelPoint> {
        (self.len > 0).then(|| self.slots[(self.head + self.len - 1) % HISTORY_CAPACITY])
    }

    /// Oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = PixelPoint> + '_ {
        (0..self.len).map(move |i| self.slots[(self.head + i) % HISTORY_CAPACITY])
    }
}

/// Classifies horizontal swipes from the recent wrist trajectory.
#[derive(Debug, Clone, Default)]
pub struct SwipeDetector {
    history: PositionHistory,
}

impl SwipeDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, wrist: PixelPoint) {
        self.history.push(wrist);
    }

    pub fn reset(&mut self) {
        self.history.clear();
    }

    pub fn history(&self) -> &PositionHistory {
        &self.history
    }

    /// A positive result consumes the history so the same motion cannot be
    /// reported again on the next frame.
    pub fn classify(&mut self) -> Option<SwipeDirection> {
        if self.history.len() < MIN_SAMPLES {
            return None;
        }

        let direction = classify_motion(self.history.oldest()?, self.history.newest()?)?;
        self.history.clear();
        Some(direction)
    }
}

pub fn classify_motion(oldest: PixelPoint, newest: PixelPoint) -> Option<SwipeDirection> {
    let dx = newest.x - oldest.x;
    let dy = (newest.y - oldest.y).abs();

    if dx.abs() > MIN_HORIZONTAL_PX && dy < MAX_VERTICAL_PX && dx.abs() > dy * HORIZONTAL_DOMINANCE {
        Some(if dx > 0.0 {
            SwipeDirection::Right
        } else {
            SwipeDirection::Left
        })
    } else {
        None
    }
}
