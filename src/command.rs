// src/command.rs
use std::fmt;

/// Volume change per gesture, in percentage points.
pub const VOLUME_STEP: i8 = 10;

/// A discrete playback action. At most one is produced per processed frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    PreviousTrack,
    NextTrack,
    TogglePlayPause,
    VolumeDelta(i8),
    /// Absolute position in the current track, in milliseconds.
    SeekTo(u64),
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PreviousTrack => write!(f, "previous track"),
            Self::NextTrack => write!(f, "next track"),
            Self::TogglePlayPause => write!(f, "play/pause"),
            Self::VolumeDelta(delta) => write!(f, "volume {:+}", delta),
            Self::SeekTo(ms) => write!(f, "seek to {}:{:02}", ms / 60_000, (ms / 1000) % 60),
        }
    }
}
