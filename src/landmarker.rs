// src/landmarker.rs
//! Hand landmark estimation through a MediaPipe helper process.
//!
//! Line protocol over the helper's stdio. On start the helper prints one JSON
//! line, `{"ready": true}` or `{"error": "..."}`. For each frame we write a
//! header line `"<width> <height>\n"` followed by `width * height * 3` bytes of
//! packed RGB, and the helper answers with one JSON line:
//!
//! ```text
//! {"hands": [{"landmarks": [[x, y, z], ...21], "handedness": "Left"}], "error": null}
//! ```

use std::fs::{self, File};
use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::time::Duration;

use image::RgbImage;
use serde::Deserialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::LandmarkerConfig;
use crate::error::LandmarkerError;
use crate::geometry::{FrameObservation, FrameSize, HandObservation, Landmark};

pub const MODEL_URL: &str =
    "https://storage.googleapis.com/mediapipe-models/hand_landmarker/hand_landmarker/float16/1/hand_landmarker.task";

const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(300);

/// Source of per-frame hand observations.
pub trait HandLandmarker {
    fn detect(&mut self, frame: &RgbImage) -> Result<FrameObservation, LandmarkerError>;
}

impl LandmarkerError {
    /// A helper-side failure on one frame leaves the pipe in sync; everything
    /// else means the helper or its output can no longer be trusted.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::Remote(_))
    }
}

#[derive(Debug, Deserialize)]
struct HelperMessage {
    #[serde(default)]
    ready: bool,
    #[serde(default)]
    hands: Vec<HelperHand>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct HelperHand {
    landmarks: Vec<[f64; 3]>,
    #[serde(default)]
    handedness: Option<String>,
}

fn parse_detection(line: &str, frame: FrameSize) -> Result<FrameObservation, LandmarkerError> {
    let message: HelperMessage = serde_json::from_str(line.trim())?;
    if let Some(error) = message.error {
        return Err(LandmarkerError::Remote(error));
    }

    let hands = message
        .hands
        .into_iter()
        .map(|hand| {
            let raw: Vec<Landmark> = hand.landmarks.iter().map(|[x, y, _]| Landmark::new(*x, *y)).collect();
            let observation = HandObservation::from_normalized(&raw, frame)?;
            debug!(
                handedness = hand.handedness.as_deref().unwrap_or("unknown"),
                fingers = observation.extended_fingers(),
                pinching = observation.is_pinching(),
                "hand detected"
            );
            Ok(observation)
        })
        .collect::<Result<Vec<_>, LandmarkerError>>()?;

    Ok(FrameObservation::new(hands))
}

pub struct MediaPipeBridge {
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
    line: String,
}

impl MediaPipeBridge {
    /// Starts the helper and waits for it to load the model.
    pub fn spawn(config: &LandmarkerConfig) -> Result<Self, LandmarkerError> {
        info!(python = %config.python, script = %config.script.display(), "starting hand landmarker");

        let mut child = Command::new(&config.python)
            .arg(&config.script)
            .arg("--model")
            .arg(&config.model_path)
            .arg("--num-hands")
            .arg(config.num_hands.to_string())
            .arg("--min-detection-confidence")
            .arg(config.min_detection_confidence.to_string())
            .arg("--min-presence-confidence")
            .arg(config.min_presence_confidence.to_string())
            .arg("--min-tracking-confidence")
            .arg(config.min_tracking_confidence.to_string())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(LandmarkerError::Spawn)?;

        let (Some(stdin), Some(stdout)) = (child.stdin.take(), child.stdout.take()) else {
            let _ = child.kill();
            return Err(LandmarkerError::Exited);
        };

        let mut bridge = Self {
            child,
            stdin,
            stdout: BufReader::new(stdout),
            line: String::new(),
        };

        let hello: HelperMessage = serde_json::from_str(bridge.read_line()?.trim())?;
        match hello.error {
            Some(error) => Err(LandmarkerError::Remote(error)),
            None if !hello.ready => Err(LandmarkerError::Remote("helper did not report ready".to_string())),
            None => {
                info!("hand landmarker ready");
                Ok(bridge)
            }
        }
    }

    fn read_line(&mut self) -> Result<&str, LandmarkerError> {
        self.line.clear();
        if self.stdout.read_line(&mut self.line)? == 0 {
            return Err(LandmarkerError::Exited);
        }
        Ok(&self.line)
    }
}

impl HandLandmarker for MediaPipeBridge {
    fn detect(&mut self, frame: &RgbImage) -> Result<FrameObservation, LandmarkerError> {
        let (width, height) = frame.dimensions();
        let size = FrameSize::new(width, height);

        writeln!(self.stdin, "{} {}", width, height)?;
        self.stdin.write_all(frame.as_raw())?;
        self.stdin.flush()?;

        let line = self.read_line()?;
        parse_detection(line, size)
    }
}

impl Drop for MediaPipeBridge {
    fn drop(&mut self) {
        if let Err(e) = self.child.kill() {
            debug!(error = %e, "landmarker helper already gone");
        }
        let _ = self.child.wait();
    }
}

/// Downloads the landmarker model unless it is already present.
pub fn ensure_model(path: &Path) -> Result<(), LandmarkerError> {
    if path.is_file() {
        debug!(path = %path.display(), "landmarker model present");
        return Ok(());
    }

    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }

    info!(url = MODEL_URL, path = %path.display(), "downloading hand landmarker model");
    let client = reqwest::blocking::Client::builder()
        .timeout(DOWNLOAD_TIMEOUT)
        .build()?;
    let mut response = client.get(MODEL_URL).send()?.error_for_status()?;

    // Download beside the target so the final rename stays on one filesystem
    let partial = path.with_file_name(format!(".{}.part", Uuid::new_v4()));
    let written = File::create(&partial)
        .map_err(LandmarkerError::from)
        .and_then(|mut file| Ok(response.copy_to(&mut file)?));

    match written {
        Ok(bytes) => {
            fs::rename(&partial, path)?;
            info!(bytes, "landmarker model downloaded");
            Ok(())
        }
        Err(e) => {
            if let Err(cleanup) = fs::remove_file(&partial) {
                warn!(error = %cleanup, "failed to remove partial download");
            }
            Err(e)
        }
    }
}
