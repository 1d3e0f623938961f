// src/spotify.rs
//! Spotify Web API playback backend.
//!
//! Authenticates with a long-lived refresh token and keeps the short-lived
//! access token cached until shortly before it expires.

use std::time::{Duration, Instant};

use reqwest::blocking::{Client, Response};
use reqwest::header::CONTENT_LENGTH;
use reqwest::{Method, StatusCode};
use serde::Deserialize;
use tracing::{debug, info};

use crate::config::SpotifyCredentials;
use crate::error::SinkError;
use crate::sink::{CommandSink, PlaybackState};

const TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
const PLAYER_URL: &str = "https://api.spotify.com/v1/me/player";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);
const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(60);

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

#[derive(Debug, Deserialize)]
struct PlayerResponse {
    is_playing: bool,
    progress_ms: Option<u64>,
    item: Option<TrackItem>,
    device: Option<Device>,
}

#[derive(Debug, Deserialize)]
struct TrackItem {
    name: String,
    duration_ms: u64,
    #[serde(default)]
    artists: Vec<Artist>,
}

#[derive(Debug, Deserialize)]
struct Artist {
    name: String,
}

#[derive(Debug, Deserialize)]
struct Device {
    volume_percent: Option<u8>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

impl PlayerResponse {
    /// Only tracks count as playback; podcasts and ads come without an item.
    fn into_playback_state(self) -> Option<PlaybackState> {
        let item = self.item?;
        Some(PlaybackState {
            artist: item.artists.into_iter().next().map(|a| a.name).unwrap_or_default(),
            track_name: item.name,
            duration_ms: item.duration_ms,
            progress_ms: self.progress_ms.unwrap_or(0),
            is_playing: self.is_playing,
        })
    }
}

fn adjusted_volume(current: u8, delta: i32) -> u8 {
    (current as i32 + delta).clamp(0, 100) as u8
}

struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

impl CachedToken {
    fn is_valid(&self) -> bool {
        Instant::now() + TOKEN_REFRESH_MARGIN < self.expires_at
    }
}

pub struct SpotifyClient {
    http: Client,
    credentials: SpotifyCredentials,
    token: Option<CachedToken>,
}

impl SpotifyClient {
    pub fn new(credentials: SpotifyCredentials) -> Result<Self, SinkError> {
        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            http,
            credentials,
            token: None,
        })
    }

    fn access_token(&mut self) -> Result<String, SinkError> {
        if let Some(cached) = self.token.as_ref().filter(|t| t.is_valid()) {
            return Ok(cached.access_token.clone());
        }

        debug!("refreshing spotify access token");
        let response = self
            .http
            .post(TOKEN_URL)
            .basic_auth(&self.credentials.client_id, Some(&self.credentials.client_secret))
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", self.credentials.refresh_token.as_str()),
            ])
            .send()?;

        if !response.status().is_success() {
            return Err(SinkError::Auth(format!("token refresh returned {}", response.status())));
        }

        let token: TokenResponse = response.json()?;
        self.token = Some(CachedToken {
            access_token: token.access_token.clone(),
            expires_at: Instant::now() + Duration::from_secs(token.expires_in),
        });
        info!(expires_in = token.expires_in, "spotify access token refreshed");
        Ok(token.access_token)
    }

    fn send(&mut self, method: Method, path: &str, query: &[(&str, String)]) -> Result<Response, SinkError> {
        let token = self.access_token()?;
        let response = self
            .http
            .request(method, format!("{}{}", PLAYER_URL, path))
            .bearer_auth(token)
            .query(query)
            .header(CONTENT_LENGTH, "0")
            .send()?;

        if response.status() == StatusCode::UNAUTHORIZED {
            self.token = None;
        }
        check_status(response)
    }

    fn player(&mut self) -> Result<Option<PlayerResponse>, SinkError> {
        let response = self.send(Method::GET, "", &[])?;
        if response.status() == StatusCode::NO_CONTENT {
            return Ok(None);
        }
        Ok(Some(response.json()?))
    }
}

fn check_status(response: Response) -> Result<Response, SinkError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    match status {
        StatusCode::UNAUTHORIZED => Err(SinkError::Auth("access token rejected".to_string())),
        StatusCode::NOT_FOUND => Err(SinkError::NoActiveDevice),
        _ => {
            let message = response
                .json::<ErrorBody>()
                .map(|body| body.error.message)
                .unwrap_or_else(|_| status.canonical_reason().unwrap_or_default().to_string());
            Err(SinkError::Api {
                status: status.as_u16(),
                message,
            })
        }
    }
}

impl CommandSink for SpotifyClient {
    fn previous_track(&mut self) -> Result<(), SinkError> {
        self.send(Method::POST, "/previous", &[]).map(drop)
    }

    fn next_track(&mut self) -> Result<(), SinkError> {
        self.send(Method::POST, "/next", &[]).map(drop)
    }

    fn toggle_play_pause(&mut self) -> Result<(), SinkError> {
        let playing = self.player()?.map_or(false, |p| p.is_playing);
        let path = if playing { "/pause" } else { "/play" };
        self.send(Method::PUT, path, &[]).map(drop)
    }

    fn set_volume(&mut self, percent: u8) -> Result<(), SinkError> {
        let percent = percent.min(100);
        self.send(Method::PUT, "/volume", &[("volume_percent", percent.to_string())])
            .map(drop)
    }

    fn adjust_volume(&mut self, delta: i32) -> Result<(), SinkError> {
        let current = self
            .player()?
            .and_then(|p| p.device)
            .and_then(|d| d.volume_percent)
            .ok_or(SinkError::NoActiveDevice)?;
        self.set_volume(adjusted_volume(current, delta))
    }

    fn seek(&mut self, position_ms: u64) -> Result<(), SinkError> {
        self.send(Method::PUT, "/seek", &[("position_ms", position_ms.to_string())])
            .map(drop)
    }

    fn playback_state(&mut self) -> Result<Option<PlaybackState>, SinkError> {
        Ok(self.player()?.and_then(PlayerResponse::into_playback_state))
    }
}
