// src/geometry.rs
//! Per-hand geometric features derived from the 21 MediaPipe hand landmarks.
//!
//! Landmarks arrive normalized to `[0, 1]`; every threshold here is in pixels,
//! so positions are first scaled by the frame size and truncated to whole
//! pixels.

use nalgebra::Point2;

use crate::error::GeometryError;

/// MediaPipe hand landmark indices.
#[allow(dead_code)]
pub mod landmarks {
    pub const WRIST: usize = 0;
    pub const THUMB_CMC: usize = 1;
    pub const THUMB_MCP: usize = 2;
    pub const THUMB_IP: usize = 3;
    pub const THUMB_TIP: usize = 4;
    pub const INDEX_MCP: usize = 5;
    pub const INDEX_PIP: usize = 6;
    pub const INDEX_DIP: usize = 7;
    pub const INDEX_TIP: usize = 8;
    pub const MIDDLE_MCP: usize = 9;
    pub const MIDDLE_PIP: usize = 10;
    pub const MIDDLE_DIP: usize = 11;
    pub const MIDDLE_TIP: usize = 12;
    pub const RING_MCP: usize = 13;
    pub const RING_PIP: usize = 14;
    pub const RING_DIP: usize = 15;
    pub const RING_TIP: usize = 16;
    pub const PINKY_MCP: usize = 17;
    pub const PINKY_PIP: usize = 18;
    pub const PINKY_DIP: usize = 19;
    pub const PINKY_TIP: usize = 20;
}

use landmarks::*;

pub const LANDMARK_COUNT: usize = 21;

const PINCH_THRESHOLD_PX: f64 = 40.0;
const FINGER_EXTENSION_PX: f64 = 10.0;
const THUMB_EXTENSION_PX: f64 = 30.0;

/// (tip, pip) pairs for the four non-thumb fingers.
const FINGER_JOINTS: [(usize, usize); 4] = [
    (INDEX_TIP, INDEX_PIP),
    (MIDDLE_TIP, MIDDLE_PIP),
    (RING_TIP, RING_PIP),
    (PINKY_TIP, PINKY_PIP),
];

/// Skeleton connections used by the overlay.
pub const HAND_CONNECTIONS: [(usize, usize); 21] = [
    (WRIST, THUMB_CMC), (THUMB_CMC, THUMB_MCP), (THUMB_MCP, THUMB_IP), (THUMB_IP, THUMB_TIP),
    (WRIST, INDEX_MCP), (INDEX_MCP, INDEX_PIP), (INDEX_PIP, INDEX_DIP), (INDEX_DIP, INDEX_TIP),
    (INDEX_MCP, MIDDLE_MCP), (MIDDLE_MCP, MIDDLE_PIP), (MIDDLE_PIP, MIDDLE_DIP), (MIDDLE_DIP, MIDDLE_TIP),
    (MIDDLE_MCP, RING_MCP), (RING_MCP, RING_PIP), (RING_PIP, RING_DIP), (RING_DIP, RING_TIP),
    (RING_MCP, PINKY_MCP), (PINKY_MCP, PINKY_PIP), (PINKY_PIP, PINKY_DIP), (PINKY_DIP, PINKY_TIP),
    (WRIST, PINKY_MCP),
];

pub type PixelPoint = Point2<f64>;

/// A single landmark, normalized to the frame (0.0 to 1.0 on both axes).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Landmark {
    pub x: f64,
    pub y: f64,
}

impl Landmark {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameSize {
    pub width: u32,
    pub height: u32,
}

impl FrameSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Pixel row below which swipes are ignored (85% of the frame height).
    pub fn swipe_zone_limit(&self) -> f64 {
        self.height as f64 * 0.85
    }
}

/// One detected hand with its derived features. Immutable once built.
#[derive(Debug, Clone)]
pub struct HandObservation {
    landmarks: [Landmark; LANDMARK_COUNT],
    pixels: [PixelPoint; LANDMARK_COUNT],
    is_pinching: bool,
    extended_fingers: u8,
}

impl HandObservation {
    pub fn from_normalized(raw: &[Landmark], frame: FrameSize) -> Result<Self, GeometryError> {
        if frame.width == 0 || frame.height == 0 {
            return Err(GeometryError::EmptyFrame {
                width: frame.width,
                height: frame.height,
            });
        }

        let landmarks: [Landmark; LANDMARK_COUNT] = raw
            .try_into()
            .map_err(|_| GeometryError::LandmarkCount(raw.len()))?;
        let pixels = landmarks.map(|lm| to_pixel(lm, frame));

        Ok(Self {
            landmarks,
            pixels,
            is_pinching: is_pinching(&pixels),
            extended_fingers: count_extended_fingers(&pixels),
        })
    }

    pub fn landmarks(&self) -> &[Landmark; LANDMARK_COUNT] {
        &self.landmarks
    }

    pub fn pixels(&self) -> &[PixelPoint; LANDMARK_COUNT] {
        &self.pixels
    }

    pub fn wrist(&self) -> PixelPoint {
        self.pixels[WRIST]
    }

    pub fn is_pinching(&self) -> bool {
        self.is_pinching
    }

    pub fn extended_fingers(&self) -> u8 {
        self.extended_fingers
    }
}

/// All hands seen in one processed frame, at most two.
#[derive(Debug, Clone, Default)]
pub struct FrameObservation {
    hands: Vec<HandObservation>,
}

impl FrameObservation {
    pub const MAX_HANDS: usize = 2;

    pub fn new(mut hands: Vec<HandObservation>) -> Self {
        hands.truncate(Self::MAX_HANDS);
        Self { hands }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn hands(&self) -> &[HandObservation] {
        &self.hands
    }

    pub fn len(&self) -> usize {
        self.hands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hands.is_empty()
    }
}

pub fn to_pixel(landmark: Landmark, frame: FrameSize) -> PixelPoint {
    Point2::new(
        (landmark.x * frame.width as f64).trunc(),
        (landmark.y * frame.height as f64).trunc(),
    )
}

/// Thumb tip and index tip closer than the pinch threshold.
pub fn is_pinching(pixels: &[PixelPoint; LANDMARK_COUNT]) -> bool {
    nalgebra::distance(&pixels[THUMB_TIP], &pixels[INDEX_TIP]) < PINCH_THRESHOLD_PX
}

pub fn count_extended_fingers(pixels: &[PixelPoint; LANDMARK_COUNT]) -> u8 {
    // Thumb moves sideways, so compare horizontally against its IP joint
    let thumb = (pixels[THUMB_TIP].x - pixels[THUMB_IP].x).abs() > THUMB_EXTENSION_PX;

    // Image y grows downwards: an extended tip sits above its PIP joint
    let fingers = FINGER_JOINTS
        .iter()
        .filter(|&&(tip, pip)| pixels[pip].y - pixels[tip].y >= FINGER_EXTENSION_PX)
        .count();

    thumb as u8 + fingers as u8
}
