//! Wire types for the Lavalink v4 REST API and websocket.

use std::num::NonZeroU64;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serenity::model::id::GuildId;

use super::error::LavalinkError;

/// A resolved, playable track. `encoded` is opaque and only meaningful to the node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    pub encoded: String,
    pub info: TrackInfo,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackInfo {
    pub identifier: String,
    pub is_seekable: bool,
    pub author: String,
    /// Length in milliseconds
    pub length: u64,
    pub is_stream: bool,
    pub position: u64,
    pub title: String,
    pub uri: Option<String>,
    pub artwork_url: Option<String>,
    pub isrc: Option<String>,
    pub source_name: String,
}

impl Track {
    pub fn title(&self) -> &str {
        &self.info.title
    }

    pub fn uri(&self) -> &str {
        self.info.uri.as_deref().unwrap_or("#")
    }

    pub fn length(&self) -> Duration {
        Duration::from_millis(self.info.length)
    }

    pub fn thumbnail(&self) -> Option<&str> {
        self.info.artwork_url.as_deref()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Playlist {
    pub info: PlaylistInfo,
    pub tracks: Vec<Track>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistInfo {
    pub name: String,
    pub selected_track: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Exception {
    pub message: Option<String>,
    pub severity: String,
    #[serde(default)]
    pub cause: Option<String>,
}

impl Exception {
    pub fn describe(&self) -> String {
        self.message
            .clone()
            .unwrap_or_else(|| format!("{} failure", self.severity))
    }
}

/// Response of `GET /v4/loadtracks`
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "loadType", content = "data", rename_all = "lowercase")]
pub enum LoadResult {
    Track(Track),
    Playlist(Playlist),
    Search(Vec<Track>),
    Empty(serde_json::Value),
    Error(Exception),
}

impl LoadResult {
    /// Flattens the result into a list of tracks, surfacing a node-side load error.
    pub fn into_tracks(self) -> Result<Vec<Track>, LavalinkError> {
        match self {
            LoadResult::Track(track) => Ok(vec![track]),
            LoadResult::Playlist(playlist) => {
                let mut tracks = playlist.tracks;
                // start from the selected entry when the URL pointed at one
                if let Ok(selected) = usize::try_from(playlist.info.selected_track) {
                    if selected < tracks.len() {
                        tracks.rotate_left(selected);
                    }
                }
                Ok(tracks)
            }
            LoadResult::Search(tracks) => Ok(tracks),
            LoadResult::Empty(_) => Ok(Vec::new()),
            LoadResult::Error(exception) => Err(LavalinkError::LoadFailed(exception.describe())),
        }
    }
}

/// Body of `PATCH /v4/sessions/{session}/players/{guild}`
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePlayer {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub track: Option<UpdatePlayerTrack>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paused: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice: Option<VoiceState>,
}

/// `encoded: None` serializes to `null`, which stops the player.
#[derive(Debug, Clone, Serialize)]
pub struct UpdatePlayerTrack {
    pub encoded: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceState {
    pub token: String,
    pub endpoint: String,
    pub session_id: String,
}

/// Messages received over the node websocket, tagged by `op`
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum IncomingMessage {
    Ready(Ready),
    PlayerUpdate(PlayerUpdate),
    Stats(Stats),
    Event(Event),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ready {
    pub resumed: bool,
    pub session_id: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerUpdate {
    pub guild_id: String,
    pub state: PlayerUpdateState,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlayerUpdateState {
    pub time: u64,
    pub position: u64,
    pub connected: bool,
    pub ping: i64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub players: u32,
    pub playing_players: u32,
    pub uptime: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    TrackStartEvent(TrackStart),
    TrackEndEvent(TrackEnd),
    TrackExceptionEvent(TrackException),
    TrackStuckEvent(TrackStuck),
    WebSocketClosedEvent(WebSocketClosed),
}

impl Event {
    pub fn guild_id(&self) -> &str {
        match self {
            Event::TrackStartEvent(e) => &e.guild_id,
            Event::TrackEndEvent(e) => &e.guild_id,
            Event::TrackExceptionEvent(e) => &e.guild_id,
            Event::TrackStuckEvent(e) => &e.guild_id,
            Event::WebSocketClosedEvent(e) => &e.guild_id,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackStart {
    pub guild_id: String,
    pub track: Track,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackEnd {
    pub guild_id: String,
    pub track: Track,
    pub reason: TrackEndReason,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TrackEndReason {
    Finished,
    LoadFailed,
    Stopped,
    Replaced,
    Cleanup,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackException {
    pub guild_id: String,
    pub track: Track,
    pub exception: Exception,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackStuck {
    pub guild_id: String,
    pub track: Track,
    pub threshold_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebSocketClosed {
    pub guild_id: String,
    pub code: u16,
    pub reason: String,
    pub by_remote: bool,
}

/// Node payloads carry guild ids as strings
pub fn parse_guild_id(raw: &str) -> Option<GuildId> {
    raw.parse::<NonZeroU64>().ok().map(|id| GuildId::new(id.get()))
}
