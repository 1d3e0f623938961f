// src/error.rs
use thiserror::Error;

/// Malformed landmark data handed to the geometry layer.
#[derive(Debug, Error, PartialEq)]
pub enum GeometryError {
    #[error("expected 21 hand landmarks, got {0}")]
    LandmarkCount(usize),

    #[error("frame dimensions must be non-zero, got {width}x{height}")]
    EmptyFrame { width: u32, height: u32 },
}

#[derive(Debug, Error)]
pub enum LandmarkerError {
    #[error("failed to start landmarker helper: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("landmarker pipe error: {0}")]
    Io(#[from] std::io::Error),

    #[error("landmarker helper exited")]
    Exited,

    #[error("malformed landmarker response: {0}")]
    Protocol(#[from] serde_json::Error),

    #[error("landmarker reported: {0}")]
    Remote(String),

    #[error("invalid hand from landmarker: {0}")]
    InvalidHand(#[from] GeometryError),

    #[error("model download failed: {0}")]
    Download(#[from] reqwest::Error),
}

/// Failure of a single playback backend call. Never fed back into arbitration.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("authorization failed: {0}")]
    Auth(String),

    #[error("no active playback device")]
    NoActiveDevice,

    #[error("backend returned {status}: {message}")]
    Api { status: u16, message: String },
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("missing environment variable {0}")]
    MissingVar(&'static str),

    #[error("invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },
}
