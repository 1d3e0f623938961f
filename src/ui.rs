// src/ui.rs
use eframe::egui::{self, Align2, Color32, FontId, Painter, Pos2, Rect, Stroke};

use crate::arbiter::{FrameReport, Phase};
use crate::geometry::{FrameSize, HandObservation, PixelPoint, HAND_CONNECTIONS};
use crate::sink::PlaybackState;

#[derive(Debug, Clone)]
pub struct Theme {
    pub skeleton: Color32,
    pub joint: Color32,
    pub gesture: Color32,
    pub fingers: Color32,
    pub scrubbing: Color32,
    pub muted: Color32,
    pub fps: Color32,
    pub now_playing: Color32,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            skeleton: Color32::from_rgb(0, 255, 0),
            joint: Color32::from_rgb(255, 0, 0),
            gesture: Color32::from_rgb(0, 255, 0),
            fingers: Color32::from_rgb(70, 130, 240),
            scrubbing: Color32::from_rgb(244, 67, 54),
            muted: Color32::from_rgb(128, 128, 128),
            fps: Color32::from_rgb(0, 255, 255),
            now_playing: Color32::from_rgb(76, 175, 80),
        }
    }
}

pub fn create_visuals() -> egui::Visuals {
    let mut visuals = egui::Visuals::dark();

    visuals.widgets.noninteractive.bg_fill = Color32::from_rgb(30, 30, 35);
    visuals.widgets.inactive.bg_fill = Color32::from_rgb(45, 45, 52);
    visuals.widgets.noninteractive.rounding = egui::Rounding::same(8.0);
    visuals.widgets.inactive.rounding = egui::Rounding::same(8.0);
    visuals.window_rounding = egui::Rounding::same(12.0);

    visuals
}

/// Maps a camera pixel onto the screen rect the frame is drawn into.
pub fn frame_to_screen(rect: Rect, frame: FrameSize, point: PixelPoint) -> Pos2 {
    Pos2::new(
        rect.left() + (point.x as f32 / frame.width as f32) * rect.width(),
        rect.top() + (point.y as f32 / frame.height as f32) * rect.height(),
    )
}

pub fn draw_hand(painter: &Painter, rect: Rect, frame: FrameSize, hand: &HandObservation, theme: &Theme) {
    let pixels = hand.pixels();
    for &(from, to) in HAND_CONNECTIONS.iter() {
        painter.line_segment(
            [
                frame_to_screen(rect, frame, pixels[from]),
                frame_to_screen(rect, frame, pixels[to]),
            ],
            Stroke::new(2.0, theme.skeleton),
        );
    }
    for &point in pixels.iter() {
        painter.circle_filled(frame_to_screen(rect, frame, point), 4.0, theme.joint);
    }
}

pub fn draw_swipe_zone(painter: &Painter, rect: Rect, frame: FrameSize, theme: &Theme) {
    let limit = frame.swipe_zone_limit().trunc();
    let y = frame_to_screen(rect, frame, PixelPoint::new(0.0, limit)).y;
    painter.line_segment(
        [Pos2::new(rect.left(), y), Pos2::new(rect.right(), y)],
        Stroke::new(1.0, theme.muted),
    );
    painter.text(
        Pos2::new(rect.left() + 10.0, y - 5.0),
        Align2::LEFT_BOTTOM,
        "Swipe zone above",
        FontId::proportional(12.0),
        theme.muted,
    );
}

/// Banner describing why gestures are or are not live.
pub fn mode_banner(report: &FrameReport) -> Option<&'static str> {
    match report.phase {
        Phase::ScrubActive | Phase::GestureActive if report.in_cooldown => Some("Cooldown..."),
        Phase::ScrubActive => Some("SCRUBBING"),
        Phase::Blocked => Some("Two hands - scrub only"),
        Phase::GestureActive | Phase::Idle => None,
    }
}

pub fn draw_status(painter: &Painter, rect: Rect, report: &FrameReport, fps: f32, theme: &Theme) {
    let left = rect.left() + 10.0;

    if let Some(gesture) = report.gesture {
        painter.text(
            Pos2::new(left, rect.top() + 30.0),
            Align2::LEFT_CENTER,
            format!("Gesture: {}", gesture.as_str()),
            FontId::proportional(24.0),
            theme.gesture,
        );
    }

    if report.phase != Phase::ScrubActive {
        painter.text(
            Pos2::new(left, rect.top() + 70.0),
            Align2::LEFT_CENTER,
            format!("Fingers: {}", report.finger_count),
            FontId::proportional(24.0),
            theme.fingers,
        );
    }

    if let Some(banner) = mode_banner(report) {
        let (size, color) = match report.phase {
            Phase::ScrubActive if !report.in_cooldown => (28.0, theme.scrubbing),
            _ => (18.0, theme.muted),
        };
        painter.text(
            Pos2::new(left, rect.top() + 110.0),
            Align2::LEFT_CENTER,
            banner,
            FontId::proportional(size),
            color,
        );
    }

    painter.text(
        Pos2::new(rect.right() - 10.0, rect.top() + 30.0),
        Align2::RIGHT_CENTER,
        format!("FPS: {}", fps as u32),
        FontId::proportional(18.0),
        theme.fps,
    );
}

pub fn now_playing_line(state: &PlaybackState) -> String {
    let status = if state.is_playing { ">" } else { "||" };
    let name: String = state.track_name.chars().take(30).collect();
    let artist: String = state.artist.chars().take(20).collect();
    format!("{} {} - {}", status, name, artist)
}

pub fn draw_now_playing(painter: &Painter, rect: Rect, state: &PlaybackState, theme: &Theme) {
    painter.text(
        Pos2::new(rect.left() + 10.0, rect.bottom() - 20.0),
        Align2::LEFT_CENTER,
        now_playing_line(state),
        FontId::proportional(18.0),
        theme.now_playing,
    );
}

/// Largest rect with the frame's aspect ratio that fits in `available`.
pub fn fit_frame(available: egui::Vec2, frame: FrameSize) -> egui::Vec2 {
    let aspect = frame.width as f32 / frame.height.max(1) as f32;
    if available.x / available.y.max(1.0) > aspect {
        egui::vec2(available.y * aspect, available.y)
    } else {
        egui::vec2(available.x, available.x / aspect)
    }
}
