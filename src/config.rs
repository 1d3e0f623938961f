// src/config.rs
//! Runtime settings from the environment (and a `.env` file, loaded in main).

use std::path::PathBuf;
use std::str::FromStr;

use directories::ProjectDirs;

use crate::error::ConfigError;

const MODEL_FILE_NAME: &str = "hand_landmarker.task";

#[derive(Debug, Clone, PartialEq)]
pub struct CameraConfig {
    pub index: u32,
    pub width: u32,
    pub height: u32,
    pub fps: u32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            index: 0,
            width: 640,
            height: 480,
            fps: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LandmarkerConfig {
    pub python: String,
    pub script: PathBuf,
    pub model_path: PathBuf,
    pub num_hands: usize,
    pub min_detection_confidence: f32,
    pub min_presence_confidence: f32,
    pub min_tracking_confidence: f32,
}

impl Default for LandmarkerConfig {
    fn default() -> Self {
        Self {
            python: "python3".to_string(),
            script: PathBuf::from("scripts/hand_landmarker.py"),
            model_path: default_model_path(),
            num_hands: 2,
            min_detection_confidence: 0.4,
            min_presence_confidence: 0.4,
            min_tracking_confidence: 0.4,
        }
    }
}

/// Per-user cache dir, or the system temp dir when no home is available.
pub fn default_model_path() -> PathBuf {
    ProjectDirs::from("com", "gestureremote", "Gesture Remote")
        .map(|dirs| dirs.cache_dir().to_path_buf())
        .unwrap_or_else(std::env::temp_dir)
        .join(MODEL_FILE_NAME)
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub camera: CameraConfig,
    /// Run the hand estimator on every Nth camera frame.
    pub process_every: u32,
    pub landmarker: LandmarkerConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let camera_defaults = CameraConfig::default();
        let landmarker_defaults = LandmarkerConfig::default();

        let process_every = parse_var(&lookup, "GESTURE_PROCESS_EVERY", 2u32)?;
        if process_every == 0 {
            return Err(ConfigError::InvalidValue {
                name: "GESTURE_PROCESS_EVERY",
                value: "0".to_string(),
            });
        }

        Ok(Self {
            camera: CameraConfig {
                index: parse_var(&lookup, "GESTURE_CAMERA_INDEX", camera_defaults.index)?,
                width: parse_var(&lookup, "GESTURE_FRAME_WIDTH", camera_defaults.width)?,
                height: parse_var(&lookup, "GESTURE_FRAME_HEIGHT", camera_defaults.height)?,
                fps: parse_var(&lookup, "GESTURE_CAMERA_FPS", camera_defaults.fps)?,
            },
            process_every,
            landmarker: LandmarkerConfig {
                python: lookup("GESTURE_PYTHON").unwrap_or(landmarker_defaults.python),
                script: lookup("GESTURE_LANDMARKER_SCRIPT")
                    .map(PathBuf::from)
                    .unwrap_or(landmarker_defaults.script),
                model_path: lookup("GESTURE_MODEL_PATH")
                    .map(PathBuf::from)
                    .unwrap_or(landmarker_defaults.model_path),
                num_hands: landmarker_defaults.num_hands,
                min_detection_confidence: parse_confidence(
                    &lookup,
                    "GESTURE_MIN_DETECTION_CONFIDENCE",
                    landmarker_defaults.min_detection_confidence,
                )?,
                min_presence_confidence: parse_confidence(
                    &lookup,
                    "GESTURE_MIN_PRESENCE_CONFIDENCE",
                    landmarker_defaults.min_presence_confidence,
                )?,
                min_tracking_confidence: parse_confidence(
                    &lookup,
                    "GESTURE_MIN_TRACKING_CONFIDENCE",
                    landmarker_defaults.min_tracking_confidence,
                )?,
            },
        })
    }
}

fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(name) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue { name, value }),
    }
}

fn parse_confidence(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: f32,
) -> Result<f32, ConfigError> {
    let value = parse_var(lookup, name, default)?;
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(ConfigError::InvalidValue {
            name,
            value: value.to_string(),
        })
    }
}

/// Spotify app credentials plus a user refresh token.
#[derive(Clone, PartialEq)]
pub struct SpotifyCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
}

impl std::fmt::Debug for SpotifyCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpotifyCredentials")
            .field("client_id", &self.client_id)
            .finish_non_exhaustive()
    }
}

impl SpotifyCredentials {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let required = |name: &'static str| {
            lookup(name)
                .filter(|value| !value.trim().is_empty())
                .ok_or(ConfigError::MissingVar(name))
        };

        Ok(Self {
            client_id: required("SPOTIFY_CLIENT_ID")?,
            client_secret: required("SPOTIFY_CLIENT_SECRET")?,
            refresh_token: required("SPOTIFY_REFRESH_TOKEN")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_lookup(env(&[])).unwrap();
        assert_eq!(config.camera, CameraConfig::default());
        assert_eq!(config.process_every, 2);
        assert_eq!(config.landmarker.python, "python3");
        assert_eq!(config.landmarker.num_hands, 2);
        assert_eq!(config.landmarker.min_tracking_confidence, 0.4);
        assert!(config.landmarker.model_path.ends_with(MODEL_FILE_NAME));
    }

    #[test]
    fn test_overrides() {
        let config = AppConfig::from_lookup(env(&[
            ("GESTURE_CAMERA_INDEX", "1"),
            ("GESTURE_FRAME_WIDTH", "1280"),
            ("GESTURE_PROCESS_EVERY", " 3 "),
            ("GESTURE_PYTHON", "/opt/venv/bin/python"),
            ("GESTURE_MODEL_PATH", "/tmp/model.task"),
            ("GESTURE_MIN_DETECTION_CONFIDENCE", "0.6"),
        ]))
        .unwrap();

        assert_eq!(config.camera.index, 1);
        assert_eq!(config.camera.width, 1280);
        assert_eq!(config.camera.height, 480);
        assert_eq!(config.process_every, 3);
        assert_eq!(config.landmarker.python, "/opt/venv/bin/python");
        assert_eq!(config.landmarker.model_path, PathBuf::from("/tmp/model.task"));
        assert_eq!(config.landmarker.min_detection_confidence, 0.6);
    }

    #[test]
    fn test_invalid_values() {
        let err = AppConfig::from_lookup(env(&[("GESTURE_FRAME_HEIGHT", "tall")])).unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidValue {
                name: "GESTURE_FRAME_HEIGHT",
                value: "tall".to_string()
            }
        );

        let err = AppConfig::from_lookup(env(&[("GESTURE_PROCESS_EVERY", "0")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { name: "GESTURE_PROCESS_EVERY", .. }));

        let err = AppConfig::from_lookup(env(&[("GESTURE_MIN_PRESENCE_CONFIDENCE", "1.5")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { name: "GESTURE_MIN_PRESENCE_CONFIDENCE", .. }));
    }

    #[test]
    fn test_credentials() {
        let creds = SpotifyCredentials::from_lookup(env(&[
            ("SPOTIFY_CLIENT_ID", "id"),
            ("SPOTIFY_CLIENT_SECRET", "secret"),
            ("SPOTIFY_REFRESH_TOKEN", "refresh"),
        ]))
        .unwrap();
        assert_eq!(creds.client_id, "id");
        assert!(!format!("{:?}", creds).contains("secret"));

        let err = SpotifyCredentials::from_lookup(env(&[
            ("SPOTIFY_CLIENT_ID", "id"),
            ("SPOTIFY_CLIENT_SECRET", ""),
        ]))
        .unwrap_err();
        assert_eq!(err, ConfigError::MissingVar("SPOTIFY_CLIENT_SECRET"));

        let err = SpotifyCredentials::from_lookup(env(&[
            ("SPOTIFY_CLIENT_ID", "id"),
            ("SPOTIFY_CLIENT_SECRET", "secret"),
        ]))
        .unwrap_err();
        assert_eq!(err, ConfigError::MissingVar("SPOTIFY_REFRESH_TOKEN"));
    }
}
