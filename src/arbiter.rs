// src/arbiter.rs
//! Frame-by-frame gesture arbitration.
//!
//! [`ArbiterState`] owns every timer that decides whether a gesture is allowed
//! to fire. One call to [`ArbiterState::step`] per frame, with the frame's
//! single sampled `now`, yields at most one [`Command`].
//!
//! Gate precedence for single-hand gestures: hand-appearance cooldown, then
//! post-scrub cooldown, then the post-swipe suppression window, then each
//! gesture's own cooldown and arming. Scrub seeks are gated by the
//! hand-appearance cooldown only.

use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::command::{Command, VOLUME_STEP};
use crate::geometry::{FrameObservation, FrameSize, HandObservation, PixelPoint};
use crate::mode::{InteractionMode, ModeArbiter};
use crate::sink::PlaybackState;
use crate::stability::StabilityFilter;
use crate::swipe::{SwipeDetector, SwipeDirection};

pub const SWIPE_SAME_DIRECTION_COOLDOWN: Duration = Duration::from_millis(800);
pub const SWIPE_OPPOSITE_DIRECTION_COOLDOWN: Duration = Duration::from_secs(3);
/// Play/pause and volume stay blocked this long after a swipe.
pub const SWIPE_SUPPRESSION_WINDOW: Duration = Duration::from_secs(1);
pub const PLAY_PAUSE_COOLDOWN: Duration = Duration::from_millis(1500);
pub const VOLUME_COOLDOWN: Duration = Duration::from_secs(1);
pub const POST_SCRUB_COOLDOWN: Duration = Duration::from_secs(2);
pub const SEEK_INTERVAL: Duration = Duration::from_millis(200);

/// Track time per pixel of control-hand travel.
pub const SCRUB_MS_PER_PIXEL: f64 = 250.0;
const SCRUB_DEADBAND_MS: i64 = 500;
/// Seeks never land closer than this to the end of the track.
const SEEK_END_MARGIN_MS: i64 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    GestureActive,
    ScrubActive,
    Blocked,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::GestureActive => "gestures",
            Self::ScrubActive => "scrubbing",
            Self::Blocked => "blocked",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct ScrubSession {
    origin_x: f64,
    /// Unknown when no playback state was available at scrub start; such a
    /// session never seeks.
    origin_progress_ms: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum PhaseState {
    Idle,
    GestureActive,
    ScrubActive(ScrubSession),
    Blocked,
}

impl PhaseState {
    fn phase(&self) -> Phase {
        match self {
            Self::Idle => Phase::Idle,
            Self::GestureActive => Phase::GestureActive,
            Self::ScrubActive(_) => Phase::ScrubActive,
            Self::Blocked => Phase::Blocked,
        }
    }
}

/// Gesture shown on the overlay. Not every label produces a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureLabel {
    Swipe(SwipeDirection),
    Pinch,
}

impl GestureLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Swipe(direction) => direction.as_str(),
            Self::Pinch => "pinch",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VolumeDirection {
    Up,
    Down,
}

impl VolumeDirection {
    fn from_count(count: u8) -> Option<Self> {
        match count {
            2 => Some(Self::Up),
            3 => Some(Self::Down),
            _ => None,
        }
    }

    fn delta(&self) -> i8 {
        match self {
            Self::Up => VOLUME_STEP,
            Self::Down => -VOLUME_STEP,
        }
    }
}

/// Everything the overlay needs about one arbitration step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameReport {
    pub command: Option<Command>,
    pub phase: Phase,
    pub gesture: Option<GestureLabel>,
    pub finger_count: u8,
    pub in_cooldown: bool,
}

impl FrameReport {
    pub fn idle() -> Self {
        Self {
            command: None,
            phase: Phase::Idle,
            gesture: None,
            finger_count: 0,
            in_cooldown: false,
        }
    }
}

pub struct FrameInput<'a> {
    /// `None` when the estimator did not run this frame.
    pub observation: Option<&'a FrameObservation>,
    pub frame: FrameSize,
    pub playback: Option<&'a PlaybackState>,
}

#[derive(Debug, Clone)]
struct PlayPauseState {
    last_fired: Option<Instant>,
    armed: bool,
}

#[derive(Debug, Clone)]
struct VolumeState {
    last_fired: Option<Instant>,
    armed: bool,
    last_direction: Option<VolumeDirection>,
}

/// All arbitration state. Mutated only by [`ArbiterState::step`].
#[derive(Debug, Clone)]
pub struct ArbiterState {
    phase: PhaseState,
    modes: ModeArbiter,
    swipe: SwipeDetector,
    stability: StabilityFilter,
    last_swipe: Option<(Instant, SwipeDirection)>,
    play_pause: PlayPauseState,
    volume: VolumeState,
    last_seek: Option<Instant>,
    scrub_ended: Option<Instant>,
    last_report: FrameReport,
}

impl Default for ArbiterState {
    fn default() -> Self {
        Self::new()
    }
}

fn within(now: Instant, since: Option<Instant>, window: Duration) -> bool {
    since.map_or(false, |t| now.saturating_duration_since(t) < window)
}

impl ArbiterState {
    pub fn new() -> Self {
        Self {
            phase: PhaseState::Idle,
            modes: ModeArbiter::new(),
            swipe: SwipeDetector::new(),
            stability: StabilityFilter::new(),
            last_swipe: None,
            play_pause: PlayPauseState {
                last_fired: None,
                armed: true,
            },
            volume: VolumeState {
                last_fired: None,
                armed: true,
                last_direction: None,
            },
            last_seek: None,
            scrub_ended: None,
            last_report: FrameReport::idle(),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase.phase()
    }

    pub fn step(&mut self, input: FrameInput<'_>, now: Instant) -> FrameReport {
        // Stale frame: hold everything, re-report the last display state
        let Some(observation) = input.observation else {
            return FrameReport {
                command: None,
                ..self.last_report
            };
        };

        let update = self.modes.observe(observation, now);
        if update.changed() {
            debug!(from = update.previous.as_str(), to = update.mode.kind().as_str(), "mode changed");
        }
        if update.effects.clear_history {
            self.swipe.reset();
        }
        if update.effects.end_scrub {
            info!("scrubbing ended");
            self.scrub_ended = Some(now);
        }

        let report = match update.mode {
            InteractionMode::Idle => {
                self.phase = PhaseState::Idle;
                self.arbitrate_counts(0, now);
                FrameReport::idle()
            }
            InteractionMode::TwoHandBlocked => {
                self.phase = PhaseState::Blocked;
                self.arbitrate_counts(0, now);
                FrameReport {
                    command: None,
                    phase: Phase::Blocked,
                    gesture: None,
                    finger_count: observation.hands()[0].extended_fingers(),
                    in_cooldown: false,
                }
            }
            InteractionMode::TwoHandScrub { roles, control_wrist } => {
                let in_cooldown = update.in_appearance_cooldown;
                let command = self.scrub(control_wrist, in_cooldown, input.playback, now);
                FrameReport {
                    command,
                    phase: Phase::ScrubActive,
                    gesture: None,
                    finger_count: observation.hands()[roles.trigger].extended_fingers(),
                    in_cooldown,
                }
            }
            InteractionMode::SingleHand => self.single_hand(
                &observation.hands()[0],
                update.in_appearance_cooldown,
                input.frame,
                now,
            ),
        };

        self.last_report = report;
        report
    }

    fn single_hand(
        &mut self,
        hand: &HandObservation,
        in_appearance_cooldown: bool,
        frame: FrameSize,
        now: Instant,
    ) -> FrameReport {
        self.phase = PhaseState::GestureActive;

        let in_post_scrub_cooldown = within(now, self.scrub_ended, POST_SCRUB_COOLDOWN);
        let in_cooldown = in_appearance_cooldown || in_post_scrub_cooldown;

        // The detector runs even while gated so a cooldown swallows the motion
        let wrist = hand.wrist();
        self.swipe.record(wrist);
        let detected = self.swipe.classify();
        let in_swipe_zone = wrist.y < frame.swipe_zone_limit();

        let mut gesture = None;
        let mut command = None;
        if !in_cooldown {
            if hand.is_pinching() {
                gesture = Some(GestureLabel::Pinch);
            } else if let Some(direction) = detected.filter(|_| in_swipe_zone) {
                gesture = Some(GestureLabel::Swipe(direction));
                command = self.arbitrate_swipe(direction, now);
            }
        }

        let raw_count = if in_cooldown { 0 } else { hand.extended_fingers() };
        let count_command = self.arbitrate_counts(raw_count, now);
        debug_assert!(command.is_none() || count_command.is_none());

        FrameReport {
            command: command.or(count_command),
            phase: Phase::GestureActive,
            gesture,
            finger_count: hand.extended_fingers(),
            in_cooldown,
        }
    }

    fn arbitrate_swipe(&mut self, direction: SwipeDirection, now: Instant) -> Option<Command> {
        if let Some((last_time, last_direction)) = self.last_swipe {
            let cooldown = if last_direction == direction {
                SWIPE_SAME_DIRECTION_COOLDOWN
            } else {
                SWIPE_OPPOSITE_DIRECTION_COOLDOWN
            };
            if now.saturating_duration_since(last_time) < cooldown {
                debug!(direction = direction.as_str(), "swipe ignored, cooling down");
                return None;
            }
        }

        self.last_swipe = Some((now, direction));
        Some(match direction {
            SwipeDirection::Left => Command::PreviousTrack,
            SwipeDirection::Right => Command::NextTrack,
        })
    }

    /// Play/pause and volume from the debounced finger count. Always runs so
    /// arming is updated even on frames that cannot fire.
    fn arbitrate_counts(&mut self, raw_count: u8, now: Instant) -> Option<Command> {
        let count = self.stability.update(raw_count, now)?;
        let swipe_suppressed = within(now, self.last_swipe.map(|(t, _)| t), SWIPE_SUPPRESSION_WINDOW);

        let play_pause_cooling = within(now, self.play_pause.last_fired, PLAY_PAUSE_COOLDOWN);
        let mut command = None;
        if count == 1 {
            if self.play_pause.armed && !play_pause_cooling && !swipe_suppressed {
                self.play_pause.last_fired = Some(now);
                self.play_pause.armed = false;
                command = Some(Command::TogglePlayPause);
            }
        } else if !play_pause_cooling {
            self.play_pause.armed = true;
        }

        let volume_cooling = within(now, self.volume.last_fired, VOLUME_COOLDOWN);
        match VolumeDirection::from_count(count) {
            None => {
                if !volume_cooling {
                    self.volume.armed = true;
                    self.volume.last_direction = None;
                }
            }
            Some(direction) => {
                let allowed = self.volume.armed || self.volume.last_direction != Some(direction);
                if allowed && !volume_cooling && !swipe_suppressed {
                    self.volume.last_fired = Some(now);
                    self.volume.armed = false;
                    self.volume.last_direction = Some(direction);
                    command = Some(Command::VolumeDelta(direction.delta()));
                }
            }
        }

        command
    }

    /// Until the appearance cooldown ends the session origin follows the
    /// control hand and no seek is issued.
    fn scrub(
        &mut self,
        control_wrist: PixelPoint,
        in_appearance_cooldown: bool,
        playback: Option<&PlaybackState>,
        now: Instant,
    ) -> Option<Command> {
        let session = match self.phase {
            PhaseState::ScrubActive(session) if !in_appearance_cooldown => session,
            previous => {
                let session = ScrubSession {
                    origin_x: control_wrist.x,
                    origin_progress_ms: playback.map(|p| p.progress_ms),
                };
                if !matches!(previous, PhaseState::ScrubActive(_)) {
                    info!(origin_x = session.origin_x, progress_ms = ?session.origin_progress_ms, "scrubbing started");
                }
                self.phase = PhaseState::ScrubActive(session);
                return None;
            }
        };

        let origin_progress = session.origin_progress_ms? as i64;
        let scrub_ms = ((control_wrist.x - session.origin_x) * SCRUB_MS_PER_PIXEL) as i64;
        if scrub_ms.abs() <= SCRUB_DEADBAND_MS || within(now, self.last_seek, SEEK_INTERVAL) {
            return None;
        }

        let duration = playback?.duration_ms as i64;
        let target = (origin_progress + scrub_ms)
            .min(duration - SEEK_END_MARGIN_MS)
            .max(0);

        self.last_seek = Some(now);
        Some(Command::SeekTo(target as u64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::fixtures::*;
    use crate::sink::testing::track;

    const STEP_MS: u64 = 100;

    struct Harness {
        state: ArbiterState,
        t0: Instant,
        playback: Option<PlaybackState>,
        commands: Vec<(u64, Command)>,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                state: ArbiterState::new(),
                t0: Instant::now(),
                playback: None,
                commands: Vec::new(),
            }
        }

        fn at(&self, ms: u64) -> Instant {
            self.t0 + Duration::from_millis(ms)
        }

        fn feed(&mut self, ms: u64, hands: Vec<HandObservation>) -> FrameReport {
            let observation = frame(hands);
            let now = self.at(ms);
            let report = self.state.step(
                FrameInput {
                    observation: Some(&observation),
                    frame: FRAME,
                    playback: self.playback.as_ref(),
                },
                now,
            );
            if let Some(command) = report.command {
                self.commands.push((ms, command));
            }
            report
        }

        /// Feeds one frame every `STEP_MS` in `[from, to)`.
        fn hold(&mut self, from: u64, to: u64, hands: impl Fn(u64) -> Vec<HandObservation>) {
            let mut t = from;
            while t < to {
                self.feed(t, hands(t));
                t += STEP_MS;
            }
        }

        fn count(&self, wanted: Command) -> usize {
            self.commands.iter().filter(|(_, c)| *c == wanted).count()
        }
    }

    #[test]
    fn test_play_pause_fires_once_per_streak() {
        let mut h = Harness::new();
        h.hold(0, 1000, |_| vec![open_hand(200, 300, 0)]);

        // Stable counts [1, 1, 1, 2, 2, 1, 1], each held for 1.5s
        let sequence = [1, 1, 1, 2, 2, 1, 1];
        for (i, fingers) in sequence.into_iter().enumerate() {
            let start = 1000 + 1500 * i as u64;
            h.hold(start, start + 1500, move |_| vec![open_hand(200, 300, fingers)]);
        }

        assert_eq!(h.count(Command::TogglePlayPause), 2, "{:?}", h.commands);
        let toggles: Vec<u64> = h
            .commands
            .iter()
            .filter(|(_, c)| *c == Command::TogglePlayPause)
            .map(|(t, _)| *t)
            .collect();
        assert_eq!(toggles, vec![1300, 8800]);
    }

    #[test]
    fn test_volume_alternates_without_repeating() {
        let mut h = Harness::new();
        h.hold(0, 1000, |_| vec![open_hand(200, 300, 0)]);

        let sequence = [2, 2, 2, 3, 3];
        for (i, fingers) in sequence.into_iter().enumerate() {
            let start = 1000 + 1500 * i as u64;
            h.hold(start, start + 1500, move |_| vec![open_hand(200, 300, fingers)]);
        }

        assert_eq!(
            h.commands,
            vec![(1300, Command::VolumeDelta(10)), (5800, Command::VolumeDelta(-10))]
        );
    }

    #[test]
    fn test_volume_rearms_after_leaving() {
        let mut h = Harness::new();
        h.hold(0, 1000, |_| vec![open_hand(200, 300, 0)]);
        h.hold(1000, 2000, |_| vec![open_hand(200, 300, 2)]);
        h.hold(2000, 3500, |_| vec![open_hand(200, 300, 0)]);
        h.hold(3500, 4500, |_| vec![open_hand(200, 300, 2)]);

        assert_eq!(
            h.commands,
            vec![(1300, Command::VolumeDelta(10)), (3800, Command::VolumeDelta(10))]
        );
    }

    #[test]
    fn test_appearance_cooldown_blocks_everything() {
        let mut h = Harness::new();
        // Hand enters already sweeping right with one finger raised
        for k in 0..12 {
            let report = h.feed(k * 50, vec![open_hand(100 + 20 * k as i32, 300, 1)]);
            if k * 50 < 600 {
                assert!(report.in_cooldown);
                assert!(report.command.is_none());
                assert!(report.gesture.is_none());
            }
        }
        assert!(h.commands.is_empty(), "{:?}", h.commands);
    }

    #[test]
    fn test_swipe_right_after_settling() {
        let mut h = Harness::new();
        h.hold(0, 800, |_| vec![open_hand(100, 300, 0)]);

        let mut fired = None;
        for k in 1..=7 {
            let t = 700 + k * STEP_MS;
            let report = h.feed(t, vec![open_hand(100 + 20 * k as i32, 300, 0)]);
            if report.command.is_some() {
                fired = Some((t, report));
            }
        }

        let (t, report) = fired.expect("swipe should fire");
        assert_eq!(t, 1400);
        assert_eq!(report.command, Some(Command::NextTrack));
        assert_eq!(report.gesture, Some(GestureLabel::Swipe(SwipeDirection::Right)));
    }

    #[test]
    fn test_swipe_below_zone_is_ignored() {
        let mut h = Harness::new();
        // Wrist at y=420 sits below 85% of 480
        h.hold(0, 800, |_| vec![open_hand(100, 420, 0)]);
        for k in 1..=10 {
            h.feed(700 + k * STEP_MS, vec![open_hand(100 + 20 * k as i32, 420, 0)]);
        }
        assert!(h.commands.is_empty(), "{:?}", h.commands);
    }

    #[test]
    fn test_pinch_is_observational() {
        let mut h = Harness::new();
        h.hold(0, 800, |_| vec![pinch_hand(100, 300)]);
        let mut labels = Vec::new();
        for k in 1..=10 {
            let report = h.feed(700 + k * STEP_MS, vec![pinch_hand(100 + 20 * k as i32, 300)]);
            labels.push(report.gesture);
        }
        assert!(h.commands.is_empty(), "{:?}", h.commands);
        assert!(labels.iter().all(|l| *l == Some(GestureLabel::Pinch)));
    }

    #[test]
    fn test_swipe_direction_cooldowns() {
        let mut state = ArbiterState::new();
        let t0 = Instant::now();
        let at = |ms| t0 + Duration::from_millis(ms);

        assert_eq!(state.arbitrate_swipe(SwipeDirection::Right, at(0)), Some(Command::NextTrack));
        assert_eq!(state.arbitrate_swipe(SwipeDirection::Right, at(500)), None);
        assert_eq!(state.arbitrate_swipe(SwipeDirection::Right, at(800)), Some(Command::NextTrack));
        assert_eq!(state.arbitrate_swipe(SwipeDirection::Left, at(1000)), None);
        assert_eq!(state.arbitrate_swipe(SwipeDirection::Left, at(3799)), None);
        assert_eq!(state.arbitrate_swipe(SwipeDirection::Left, at(3800)), Some(Command::PreviousTrack));
        assert_eq!(state.arbitrate_swipe(SwipeDirection::Left, at(4600)), Some(Command::PreviousTrack));
    }

    #[test]
    fn test_swipe_suppresses_count_gestures() {
        let mut state = ArbiterState::new();
        let t0 = Instant::now();
        let at = |ms| t0 + Duration::from_millis(ms);

        assert!(state.arbitrate_swipe(SwipeDirection::Left, at(0)).is_some());
        assert_eq!(state.arbitrate_counts(1, at(100)), None);
        assert_eq!(state.arbitrate_counts(1, at(500)), None);
        assert_eq!(state.arbitrate_counts(1, at(999)), None);
        assert_eq!(state.arbitrate_counts(1, at(1000)), Some(Command::TogglePlayPause));
    }

    #[test]
    fn test_two_hands_block_single_hand_gestures() {
        let mut h = Harness::new();
        h.hold(0, 4000, |_| vec![open_hand(150, 300, 1), open_hand(450, 300, 2)]);

        assert!(h.commands.is_empty(), "{:?}", h.commands);
        let report = h.feed(4000, vec![open_hand(150, 300, 1), open_hand(450, 300, 2)]);
        assert_eq!(report.phase, Phase::Blocked);
        assert_eq!(report.finger_count, 1);
        assert_eq!(h.state.phase(), Phase::Blocked);
    }

    fn scrub_hands(control_x: i32) -> Vec<HandObservation> {
        vec![open_hand(100, 300, 4), pinch_hand(control_x, 300)]
    }

    /// First frame after the hand-appearance cooldown.
    const SETTLED_MS: u64 = 600;

    /// Holds a still scrub pose through the appearance cooldown.
    fn settle_scrub(h: &mut Harness, control_x: i32) {
        h.hold(0, SETTLED_MS, |_| scrub_hands(control_x));
        assert!(h.commands.is_empty());
    }

    #[test]
    fn test_scrub_seeks_past_deadband() {
        let mut h = Harness::new();
        h.playback = Some(track(10_000, 200_000));
        settle_scrub(&mut h, 400);
        assert_eq!(h.state.phase(), Phase::ScrubActive);

        assert!(h.feed(600, scrub_hands(401)).command.is_none());
        assert!(h.feed(700, scrub_hands(402)).command.is_none());
        assert_eq!(h.feed(800, scrub_hands(403)).command, Some(Command::SeekTo(10_750)));
        // Inter-seek interval
        assert!(h.feed(900, scrub_hands(403)).command.is_none());
        assert_eq!(h.feed(1000, scrub_hands(404)).command, Some(Command::SeekTo(11_000)));
        assert_eq!(h.feed(1200, scrub_hands(380)).command, Some(Command::SeekTo(5_000)));
    }

    #[test]
    fn test_scrub_waits_for_appearance_cooldown() {
        let mut h = Harness::new();
        h.playback = Some(track(10_000, 200_000));

        // Both hands arrive already in scrub pose and keep moving
        for (t, x) in [(0, 400), (100, 403), (200, 420), (500, 450)] {
            let report = h.feed(t, scrub_hands(x));
            assert_eq!(report.phase, Phase::ScrubActive);
            assert!(report.in_cooldown, "t={}", t);
            assert!(report.command.is_none(), "t={} {:?}", t, report.command);
        }

        // The origin is where the control hand was when the cooldown ended
        let report = h.feed(600, scrub_hands(452));
        assert!(!report.in_cooldown);
        assert!(report.command.is_none());
        assert_eq!(h.feed(700, scrub_hands(453)).command, Some(Command::SeekTo(10_750)));
    }

    #[test]
    fn test_scrub_target_is_clamped() {
        let mut h = Harness::new();
        h.playback = Some(track(10_000, 12_000));
        settle_scrub(&mut h, 300);
        assert_eq!(h.feed(600, scrub_hands(310)).command, Some(Command::SeekTo(11_000)));

        let mut h = Harness::new();
        h.playback = Some(track(1_000, 12_000));
        settle_scrub(&mut h, 300);
        assert_eq!(h.feed(600, scrub_hands(290)).command, Some(Command::SeekTo(0)));
    }

    #[test]
    fn test_scrub_without_playback_never_seeks() {
        let mut h = Harness::new();
        h.hold(0, 1000, |t| scrub_hands(300 + (t / 100) as i32 * 10));
        assert!(h.commands.is_empty());
        assert_eq!(h.state.phase(), Phase::ScrubActive);
    }

    #[test]
    fn test_post_scrub_cooldown_blocks_swipe() {
        let mut h = Harness::new();
        h.hold(0, 1100, |_| scrub_hands(400));
        assert!(h.commands.is_empty());

        // Trigger hand withdrawn; the remaining hand sweeps right continuously
        let mut t = 1100;
        let mut k = 0;
        while t < 3500 {
            let report = h.feed(t, vec![open_hand(100 + 20 * k, 300, 0)]);
            if t < 3100 {
                assert!(report.in_cooldown, "t={}", t);
                assert!(report.command.is_none(), "t={} {:?}", t, report.command);
            }
            t += STEP_MS;
            k += 1;
        }

        assert_eq!(h.commands, vec![(3400, Command::NextTrack)]);
    }

    #[test]
    fn test_held_frames_emit_nothing() {
        let mut h = Harness::new();
        h.hold(0, 1000, |_| vec![open_hand(200, 300, 0)]);
        h.feed(1000, vec![open_hand(200, 300, 1)]);

        let now = h.at(1500);
        let report = h.state.step(
            FrameInput {
                observation: None,
                frame: FRAME,
                playback: None,
            },
            now,
        );
        assert!(report.command.is_none());
        assert_eq!(report.phase, Phase::GestureActive);
        assert_eq!(report.finger_count, 1);

        // The fresh frame after the hold still sees a stable count
        assert_eq!(
            h.feed(1600, vec![open_hand(200, 300, 1)]).command,
            Some(Command::TogglePlayPause)
        );
    }

    #[test]
    fn test_hands_leaving_cancels_scrub() {
        let mut h = Harness::new();
        h.playback = Some(track(10_000, 200_000));
        h.hold(0, 500, |_| scrub_hands(400));
        let report = h.feed(500, vec![]);
        assert_eq!(report.phase, Phase::Idle);

        // Hands reappear: a new cooldown, then a fresh origin
        h.hold(600, 1200, |_| scrub_hands(450));
        assert!(h.commands.is_empty());
        assert!(h.feed(1200, scrub_hands(452)).command.is_none());
        assert_eq!(h.feed(1300, scrub_hands(453)).command, Some(Command::SeekTo(10_750)));
    }

    /// xorshift64, enough to shuffle synthetic frames deterministically
    struct Rng(u64);

    impl Rng {
        fn next(&mut self) -> u64 {
            self.0 ^= self.0 << 13;
            self.0 ^= self.0 >> 7;
            self.0 ^= self.0 << 17;
            self.0
        }

        fn below(&mut self, n: u64) -> u64 {
            self.next() % n
        }
    }

    #[derive(Clone, Copy)]
    struct SyntheticHand {
        x: i32,
        y: i32,
        fingers: u8,
        pinching: bool,
    }

    impl SyntheticHand {
        fn random(rng: &mut Rng) -> Self {
            Self {
                x: 80 + rng.below(480) as i32,
                y: 120 + rng.below(340) as i32,
                fingers: rng.below(6) as u8,
                pinching: rng.below(4) == 0,
            }
        }

        fn drift(&mut self, rng: &mut Rng) {
            self.x = (self.x + rng.below(61) as i32 - 30).clamp(80, 560);
            self.y = (self.y + rng.below(21) as i32 - 10).clamp(120, 460);
        }

        fn observe(&self) -> HandObservation {
            if self.pinching {
                pinch_hand(self.x, self.y)
            } else {
                open_hand(self.x, self.y, self.fingers)
            }
        }
    }

    #[test]
    fn test_random_streams_respect_cooldowns() {
        let mut rng = Rng(0x9e37_79b9_7f4a_7c15);
        let mut h = Harness::new();
        h.playback = Some(track(60_000, 180_000));

        let mut t = 0;
        let mut hands: Vec<SyntheticHand> = vec![SyntheticHand::random(&mut rng)];
        for _ in 0..5000 {
            t += 20 + rng.below(80);

            // Occasionally reshuffle the scene, otherwise let the hands wander
            if rng.below(15) == 0 {
                let count = rng.below(3);
                hands = (0..count).map(|_| SyntheticHand::random(&mut rng)).collect();
            } else {
                hands.iter_mut().for_each(|hand| hand.drift(&mut rng));
            }

            if rng.below(5) == 0 {
                let now = h.at(t);
                let report = h.state.step(
                    FrameInput {
                        observation: None,
                        frame: FRAME,
                        playback: h.playback.as_ref(),
                    },
                    now,
                );
                assert!(report.command.is_none());
                continue;
            }

            h.feed(t, hands.iter().map(SyntheticHand::observe).collect());
        }

        assert!(!h.commands.is_empty());

        let gaps = |pick: &dyn Fn(&Command) -> bool| -> Vec<u64> {
            let times: Vec<u64> = h.commands.iter().filter(|(_, c)| pick(c)).map(|(t, _)| *t).collect();
            times.windows(2).map(|w| w[1] - w[0]).collect()
        };

        assert!(gaps(&|c| matches!(c, Command::NextTrack | Command::PreviousTrack)).iter().all(|g| *g >= 800));
        assert!(gaps(&|c| *c == Command::TogglePlayPause).iter().all(|g| *g >= 1500));
        assert!(gaps(&|c| matches!(c, Command::VolumeDelta(_))).iter().all(|g| *g >= 1000));
        assert!(gaps(&|c| matches!(c, Command::SeekTo(_))).iter().all(|g| *g >= 200));

        let mut frames = std::collections::HashSet::new();
        assert!(h.commands.iter().all(|(t, _)| frames.insert(*t)), "more than one command in a frame");
    }
}
