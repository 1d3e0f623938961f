// src/sink.rs
//! Boundary between arbitration and the playback backend.
//!
//! Backend calls are synchronous and may fail at any time. Failures are logged
//! here and never reach the arbiter: its timers were already stamped when the
//! command was issued.

use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::command::Command;
use crate::error::SinkError;

/// Playback reads are comparatively expensive; refresh at most this often.
pub const PLAYBACK_REFRESH_INTERVAL: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackState {
    pub track_name: String,
    pub artist: String,
    pub duration_ms: u64,
    pub progress_ms: u64,
    pub is_playing: bool,
}

/// Playback backend operations.
pub trait CommandSink {
    fn previous_track(&mut self) -> Result<(), SinkError>;
    fn next_track(&mut self) -> Result<(), SinkError>;
    fn toggle_play_pause(&mut self) -> Result<(), SinkError>;
    /// Absolute volume, clamped to 0..=100 by the implementation.
    fn set_volume(&mut self, percent: u8) -> Result<(), SinkError>;
    fn adjust_volume(&mut self, delta: i32) -> Result<(), SinkError>;
    fn seek(&mut self, position_ms: u64) -> Result<(), SinkError>;
    /// `None` when nothing is playing.
    fn playback_state(&mut self) -> Result<Option<PlaybackState>, SinkError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchStatus {
    Sent,
    Failed,
    /// Display-only mode: no backend configured.
    Suppressed,
}

#[derive(Debug, Default)]
pub struct PlaybackCache {
    state: Option<PlaybackState>,
    last_fetch: Option<Instant>,
}

impl PlaybackCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&mut self, sink: &mut dyn CommandSink, now: Instant) -> Option<&PlaybackState> {
        let stale = self
            .last_fetch
            .map_or(true, |t| now.saturating_duration_since(t) >= PLAYBACK_REFRESH_INTERVAL);

        if stale {
            self.state = match sink.playback_state() {
                Ok(state) => state,
                Err(e) => {
                    warn!(error = %e, "failed to read playback state");
                    None
                }
            };
            self.last_fetch = Some(now);
            debug!(playing = ?self.state.as_ref().map(|s| &s.track_name), "playback state refreshed");
        }

        self.state.as_ref()
    }
}

/// Runs commands against the backend, or swallows them in display-only mode.
pub struct CommandDispatcher {
    sink: Option<Box<dyn CommandSink>>,
    playback: PlaybackCache,
}

impl CommandDispatcher {
    pub fn new(sink: Box<dyn CommandSink>) -> Self {
        Self {
            sink: Some(sink),
            playback: PlaybackCache::new(),
        }
    }

    pub fn display_only() -> Self {
        Self {
            sink: None,
            playback: PlaybackCache::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.sink.is_some()
    }

    pub fn dispatch(&mut self, command: Command) -> DispatchStatus {
        let Some(sink) = self.sink.as_mut() else {
            debug!(%command, "display-only mode, command suppressed");
            return DispatchStatus::Suppressed;
        };

        let result = match command {
            Command::PreviousTrack => sink.previous_track(),
            Command::NextTrack => sink.next_track(),
            Command::TogglePlayPause => sink.toggle_play_pause(),
            Command::VolumeDelta(delta) => sink.adjust_volume(delta as i32),
            Command::SeekTo(position_ms) => sink.seek(position_ms),
        };

        match result {
            Ok(()) => {
                info!(%command, "command sent");
                DispatchStatus::Sent
            }
            Err(e) => {
                warn!(%command, error = %e, "command failed");
                DispatchStatus::Failed
            }
        }
    }

    /// Cached playback state, refreshed every [`PLAYBACK_REFRESH_INTERVAL`].
    pub fn playback(&mut self, now: Instant) -> Option<&PlaybackState> {
        let sink = self.sink.as_deref_mut()?;
        self.playback.get(sink, now)
    }
}
