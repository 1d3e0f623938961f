// src/mode.rs
//! Per-frame interaction mode from the set of visible hands.

use std::time::{Duration, Instant};

use crate::geometry::{FrameObservation, HandObservation, PixelPoint};

/// No gesture may fire this long after hands first appear.
pub const APPEARANCE_COOLDOWN: Duration = Duration::from_millis(600);

const SCRUB_TRIGGER_FINGERS: u8 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeKind {
    Idle,
    SingleHand,
    TwoHandScrub,
    TwoHandBlocked,
}

impl ModeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::SingleHand => "single-hand",
            Self::TwoHandScrub => "scrub",
            Self::TwoHandBlocked => "two-hand-blocked",
        }
    }
}

/// Which hand (by index in the frame) opens the scrub and which one steers it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrubRoles {
    pub trigger: usize,
    pub control: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InteractionMode {
    Idle,
    SingleHand,
    TwoHandScrub {
        roles: ScrubRoles,
        control_wrist: PixelPoint,
    },
    TwoHandBlocked,
}

impl InteractionMode {
    pub fn kind(&self) -> ModeKind {
        match self {
            Self::Idle => ModeKind::Idle,
            Self::SingleHand => ModeKind::SingleHand,
            Self::TwoHandScrub { .. } => ModeKind::TwoHandScrub,
            Self::TwoHandBlocked => ModeKind::TwoHandBlocked,
        }
    }
}

pub fn classify(frame: &FrameObservation) -> InteractionMode {
    match frame.hands() {
        [] => InteractionMode::Idle,
        [_] => InteractionMode::SingleHand,
        [first, second, ..] => match scrub_roles(first, second) {
            Some(roles) => InteractionMode::TwoHandScrub {
                roles,
                control_wrist: frame.hands()[roles.control].wrist(),
            },
            None => InteractionMode::TwoHandBlocked,
        },
    }
}

/// One open hand (four or more fingers) plus one pinching hand, either way round.
pub fn scrub_roles(first: &HandObservation, second: &HandObservation) -> Option<ScrubRoles> {
    if first.extended_fingers() >= SCRUB_TRIGGER_FINGERS && second.is_pinching() {
        Some(ScrubRoles { trigger: 0, control: 1 })
    } else if second.extended_fingers() >= SCRUB_TRIGGER_FINGERS && first.is_pinching() {
        Some(ScrubRoles { trigger: 1, control: 0 })
    } else {
        None
    }
}

/// Side effects the arbiter must apply when the mode changes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransitionEffects {
    pub clear_history: bool,
    pub end_scrub: bool,
}

pub fn transition_effects(from: ModeKind, to: ModeKind, hands_appeared: bool) -> TransitionEffects {
    use ModeKind::*;

    let mut effects = match (from, to) {
        (a, b) if a == b => TransitionEffects::default(),
        (TwoHandScrub, Idle) | (TwoHandScrub, SingleHand) => TransitionEffects {
            clear_history: true,
            end_scrub: true,
        },
        (TwoHandScrub, TwoHandBlocked) => TransitionEffects {
            end_scrub: true,
            ..Default::default()
        },
        (_, Idle) | (_, SingleHand) => TransitionEffects {
            clear_history: true,
            ..Default::default()
        },
        (_, TwoHandScrub) | (_, TwoHandBlocked) => TransitionEffects::default(),
    };

    if hands_appeared {
        effects.clear_history = true;
    }
    effects
}

#[derive(Debug, Clone, Copy)]
pub struct ModeUpdate {
    pub mode: InteractionMode,
    pub previous: ModeKind,
    pub hands_appeared: bool,
    pub in_appearance_cooldown: bool,
    pub effects: TransitionEffects,
}

impl ModeUpdate {
    pub fn changed(&self) -> bool {
        self.previous != self.mode.kind()
    }
}

/// Tracks mode and hand visibility across frames.
#[derive(Debug, Clone)]
pub struct ModeArbiter {
    current: ModeKind,
    hands_visible: bool,
    first_seen: Option<Instant>,
}

impl Default for ModeArbiter {
    fn default() -> Self {
        Self::new()
    }
}

impl ModeArbiter {
    pub fn new() -> Self {
        Self {
            current: ModeKind::Idle,
            hands_visible: false,
            first_seen: None,
        }
    }

    pub fn current(&self) -> ModeKind {
        self.current
    }

    pub fn observe(&mut self, frame: &FrameObservation, now: Instant) -> ModeUpdate {
        let mode = classify(frame);
        let visible = !frame.is_empty();

        let hands_appeared = visible && !self.hands_visible;
        if hands_appeared {
            self.first_seen = Some(now);
        }
        self.hands_visible = visible;

        let in_appearance_cooldown = visible
            && self
                .first_seen
                .map_or(false, |seen| now.saturating_duration_since(seen) < APPEARANCE_COOLDOWN);

        let previous = std::mem::replace(&mut self.current, mode.kind());

        ModeUpdate {
            mode,
            previous,
            hands_appeared,
            in_appearance_cooldown,
            effects: transition_effects(previous, mode.kind(), hands_appeared),
        }
    }
}
