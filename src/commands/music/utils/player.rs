//! Per-guild player: queue, loop mode, idle timeout and playback transitions.
//!
//! The player never touches audio itself. Every play/pause/seek goes through a
//! [`PlaybackBackend`], and "now playing" messages go through an [`Announcer`].

use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serenity::model::id::{ChannelId, GuildId};
use tokio::sync::{Mutex, Notify};
use tokio::task::JoinHandle;
use tokio::time::{Instant, timeout};
use tracing::{debug, error, info, warn};

use super::music_manager::{MusicError, MusicResult};
use super::notifications::{EventSender, MusicEvent};
use super::search::Provider;
use crate::lavalink::{LavalinkResult, Track, TrackEndReason};

pub const DEFAULT_VOLUME: u16 = 100;
/// Highest volume the node accepts
pub const MAX_NODE_VOLUME: u16 = 1000;

/// Replay policy applied when a track ends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoopMode {
    #[default]
    None,
    Current,
    Playlist,
}

impl LoopMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoopMode::None => "NONE",
            LoopMode::Current => "CURRENT",
            LoopMode::Playlist => "PLAYLIST",
        }
    }

    /// `NONE -> CURRENT -> PLAYLIST -> NONE`, skipping `PLAYLIST` when fewer than two tracks are queued
    pub fn next(self, queued: usize) -> LoopMode {
        match self {
            LoopMode::None => LoopMode::Current,
            LoopMode::Current if queued >= 2 => LoopMode::Playlist,
            LoopMode::Current | LoopMode::Playlist => LoopMode::None,
        }
    }
}

impl fmt::Display for LoopMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LoopMode {
    type Err = MusicError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "NONE" => Ok(LoopMode::None),
            "CURRENT" => Ok(LoopMode::Current),
            "PLAYLIST" => Ok(LoopMode::Playlist),
            _ => Err(MusicError::InvalidLoopMode(s.to_string())),
        }
    }
}

/// Validate a requested volume: never negative, at most 100 unless forced.
pub fn validate_volume(volume: i64, forced: bool) -> MusicResult<u16> {
    if volume < 0 || (volume > 100 && !forced) {
        return Err(MusicError::InvalidVolume(volume));
    }
    Ok(volume.min(i64::from(MAX_NODE_VOLUME)) as u16)
}

/// New position after seeking `offset_secs` from `position`, kept within `[0, length]`
pub fn clamp_seek(position: Duration, offset_secs: i64, length: Duration) -> Duration {
    let offset = Duration::from_secs(offset_secs.unsigned_abs());
    let target = if offset_secs < 0 {
        position.saturating_sub(offset)
    } else {
        position.saturating_add(offset)
    };
    target.min(length)
}

/// The audio side of a player
#[async_trait]
pub trait PlaybackBackend: Send + Sync {
    async fn play(&self, track: &Track) -> LavalinkResult<()>;
    async fn stop(&self) -> LavalinkResult<()>;
    async fn set_pause(&self, paused: bool) -> LavalinkResult<()>;
    async fn seek(&self, position: Duration) -> LavalinkResult<()>;
    async fn set_volume(&self, volume: u16) -> LavalinkResult<()>;
    async fn disconnect(&self) -> LavalinkResult<()>;
}

/// Snapshot used to render a "now playing" message
#[derive(Debug, Clone)]
pub struct NowPlaying {
    pub guild_id: GuildId,
    pub track: Track,
    pub loop_mode: LoopMode,
    pub volume: u16,
    pub position: Duration,
    pub next: Option<String>,
    pub bound_channel: Option<ChannelId>,
}

/// Posts "now playing" messages when playback advances on its own
#[async_trait]
pub trait Announcer: Send + Sync {
    async fn now_playing(&self, now_playing: NowPlaying);
}

#[derive(Default)]
struct QueueInner {
    items: VecDeque<Track>,
    closed: bool,
}

/// FIFO of pending tracks that can be awaited
#[derive(Default)]
pub struct TrackQueue {
    inner: Mutex<QueueInner>,
    notify: Notify,
}

impl TrackQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn put(&self, track: Track) {
        let mut inner = self.inner.lock().await;
        if inner.closed {
            return;
        }
        inner.items.push_back(track);
        self.notify.notify_one();
    }

    pub async fn put_front(&self, track: Track) {
        let mut inner = self.inner.lock().await;
        if inner.closed {
            return;
        }
        inner.items.push_front(track);
        self.notify.notify_one();
    }

    /// Wait for the next track. Returns `None` once the queue is closed.
    pub async fn get(&self) -> Option<Track> {
        loop {
            let notified = self.notify.notified();
            {
                let mut inner = self.inner.lock().await;
                if inner.closed {
                    return None;
                }
                if let Some(track) = inner.items.pop_front() {
                    return Some(track);
                }
            }
            notified.await;
        }
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.items.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.lock().await.items.is_empty()
    }

    pub async fn snapshot(&self) -> Vec<Track> {
        self.inner.lock().await.items.iter().cloned().collect()
    }

    pub async fn peek(&self) -> Option<Track> {
        self.inner.lock().await.items.front().cloned()
    }

    /// Drop every pending track and wake all waiters
    pub async fn close(&self) {
        let mut inner = self.inner.lock().await;
        inner.closed = true;
        inner.items.clear();
        self.notify.notify_waiters();
    }
}

struct PlayerState {
    loop_mode: LoopMode,
    current: Option<Track>,
    paused: bool,
    volume: u16,
    position: Duration,
    position_at: Instant,
    bound_channel: Option<ChannelId>,
    provider: Provider,
    always_joined: bool,
}

impl PlayerState {
    fn estimated_position(&self) -> Duration {
        let Some(track) = &self.current else {
            return Duration::ZERO;
        };
        let position = if self.paused {
            self.position
        } else {
            self.position + self.position_at.elapsed()
        };
        position.min(track.length())
    }

    fn set_position(&mut self, position: Duration) {
        self.position = position;
        self.position_at = Instant::now();
    }
}

pub struct DisPlayer {
    guild_id: GuildId,
    channel_id: ChannelId,
    idle_timeout: Duration,
    backend: Arc<dyn PlaybackBackend>,
    announcer: Arc<dyn Announcer>,
    events: EventSender,
    queue: TrackQueue,
    state: Mutex<PlayerState>,
    destroyed: AtomicBool,
}

impl DisPlayer {
    pub fn new(
        guild_id: GuildId,
        channel_id: ChannelId,
        idle_timeout: Duration,
        backend: Arc<dyn PlaybackBackend>,
        announcer: Arc<dyn Announcer>,
        events: EventSender,
    ) -> Self {
        Self {
            guild_id,
            channel_id,
            idle_timeout,
            backend,
            announcer,
            events,
            queue: TrackQueue::new(),
            state: Mutex::new(PlayerState {
                loop_mode: LoopMode::None,
                current: None,
                paused: false,
                volume: DEFAULT_VOLUME,
                position: Duration::ZERO,
                position_at: Instant::now(),
                bound_channel: None,
                provider: Provider::default(),
                always_joined: false,
            }),
            destroyed: AtomicBool::new(false),
        }
    }

    pub fn guild_id(&self) -> GuildId {
        self.guild_id
    }

    /// Voice channel the player is connected to
    pub fn channel_id(&self) -> ChannelId {
        self.channel_id
    }

    pub fn queue(&self) -> &TrackQueue {
        &self.queue
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::SeqCst)
    }

    pub async fn is_playing(&self) -> bool {
        !self.is_destroyed() && self.state.lock().await.current.is_some()
    }

    pub async fn is_paused(&self) -> bool {
        self.state.lock().await.paused
    }

    pub async fn current_track(&self) -> Option<Track> {
        self.state.lock().await.current.clone()
    }

    pub async fn loop_mode(&self) -> LoopMode {
        self.state.lock().await.loop_mode
    }

    pub async fn volume(&self) -> u16 {
        self.state.lock().await.volume
    }

    pub async fn position(&self) -> Duration {
        self.state.lock().await.estimated_position()
    }

    pub async fn bound_channel(&self) -> Option<ChannelId> {
        self.state.lock().await.bound_channel
    }

    pub async fn set_bound_channel(&self, channel_id: ChannelId) {
        self.state.lock().await.bound_channel = Some(channel_id);
    }

    pub async fn provider(&self) -> Provider {
        self.state.lock().await.provider
    }

    pub async fn set_provider(&self, provider: Provider) {
        self.state.lock().await.provider = provider;
    }

    pub async fn is_always_joined(&self) -> bool {
        self.state.lock().await.always_joined
    }

    /// 24/7 mode: the idle timeout never tears the player down
    pub async fn set_always_joined(&self, always_joined: bool) {
        self.state.lock().await.always_joined = always_joined;
    }

    pub async fn enqueue(&self, track: Track) {
        self.queue.put(track).await;
    }

    /// Position reported by the node
    pub async fn update_position(&self, position: Duration) {
        self.state.lock().await.set_position(position);
    }

    /// Start the next queued track, waiting up to the idle timeout for one to arrive.
    /// No-op while something is already playing. A track the node refuses is
    /// dropped and the queue keeps advancing, so the idle clock always runs.
    pub async fn do_next(&self) -> MusicResult<()> {
        loop {
            if self.is_destroyed() || self.is_playing().await {
                return Ok(());
            }

            let Some(track) = self.wait_for_track().await? else {
                return Ok(());
            };

            {
                let mut state = self.state.lock().await;
                if self.is_destroyed() {
                    return Ok(());
                }
                if state.current.is_some() {
                    // another advance won the race; keep the track for later
                    drop(state);
                    self.queue.put_front(track).await;
                    return Ok(());
                }
                state.current = Some(track.clone());
                state.paused = false;
                state.set_position(Duration::ZERO);
            }

            match self.backend.play(&track).await {
                Ok(()) => break self.track_started(track).await,
                Err(e) => {
                    warn!(
                        "Failed to play {} in guild {}, moving on: {}",
                        track.title(),
                        self.guild_id,
                        e
                    );
                    self.state.lock().await.current = None;
                }
            }
        }

        Ok(())
    }

    /// Dequeue a track, or tear the player down once it has been idle too long.
    /// `None` means there is nothing to play any more.
    async fn wait_for_track(&self) -> MusicResult<Option<Track>> {
        loop {
            match timeout(self.idle_timeout, self.queue.get()).await {
                Ok(Some(track)) => return Ok(Some(track)),
                Ok(None) => return Ok(None),
                Err(_) => {
                    if self.is_playing().await {
                        return Ok(None);
                    }
                    if self.is_always_joined().await {
                        debug!("Guild {} idle in 24/7 mode, still waiting", self.guild_id);
                        continue;
                    }
                    info!(
                        "Guild {} idle for {:?}, destroying player",
                        self.guild_id, self.idle_timeout
                    );
                    self.destroy().await?;
                    return Ok(None);
                }
            }
        }
    }

    async fn track_started(&self, track: Track) {
        info!("Guild {} now playing {}", self.guild_id, track.title());
        self.events.emit(MusicEvent::TrackStart {
            guild_id: self.guild_id,
            track: Box::new(track),
        });

        if let Ok(now_playing) = self.now_playing().await {
            self.announcer.now_playing(now_playing).await;
        }
    }

    /// Run [`DisPlayer::do_next`] in the background so callers can reply immediately
    pub fn advance(self: &Arc<Self>) -> JoinHandle<()> {
        let player = Arc::clone(self);
        tokio::spawn(async move {
            if let Err(e) = player.do_next().await {
                error!("Failed to start next track in guild {}: {}", player.guild_id, e);
            }
        })
    }

    /// Apply the loop policy after the node reports the current track ended
    pub async fn on_track_end(&self, reason: TrackEndReason) -> MusicResult<()> {
        if matches!(reason, TrackEndReason::Replaced | TrackEndReason::Cleanup) {
            return Ok(());
        }

        let (finished, loop_mode) = {
            let mut state = self.state.lock().await;
            (state.current.take(), state.loop_mode)
        };

        let Some(finished) = finished else {
            return self.do_next().await;
        };

        match loop_mode {
            LoopMode::Current if reason != TrackEndReason::LoadFailed => {
                {
                    let mut state = self.state.lock().await;
                    state.current = Some(finished.clone());
                    state.set_position(Duration::ZERO);
                }
                match self.backend.play(&finished).await {
                    Ok(()) => {
                        self.events.emit(MusicEvent::TrackStart {
                            guild_id: self.guild_id,
                            track: Box::new(finished),
                        });
                        Ok(())
                    }
                    Err(e) => {
                        warn!(
                            "Failed to replay {} in guild {}, moving on: {}",
                            finished.title(),
                            self.guild_id,
                            e
                        );
                        self.state.lock().await.current = None;
                        self.do_next().await
                    }
                }
            }
            LoopMode::Playlist => {
                self.queue.put(finished).await;
                self.do_next().await
            }
            _ => self.do_next().await,
        }
    }

    /// Change the loop mode, or cycle it when `loop_type` is `None`
    pub async fn set_loop(&self, loop_type: Option<&str>) -> MusicResult<LoopMode> {
        if !self.is_playing().await {
            return Err(MusicError::NothingIsPlaying);
        }

        let queued = self.queue.len().await;
        let mut state = self.state.lock().await;

        let mode = match loop_type {
            None => state.loop_mode.next(queued),
            Some(raw) => {
                let mode = raw.parse::<LoopMode>()?;
                if mode == LoopMode::Playlist && queued < 2 {
                    return Err(MusicError::NotEnoughSongs);
                }
                mode
            }
        };

        state.loop_mode = mode;
        debug!("Guild {} loop mode set to {}", self.guild_id, mode);
        Ok(mode)
    }

    pub async fn set_pause(&self, paused: bool) -> MusicResult<()> {
        {
            let state = self.state.lock().await;
            if state.current.is_none() || self.is_destroyed() {
                return Err(MusicError::NothingIsPlaying);
            }
            if paused && state.paused {
                return Err(MusicError::AlreadyPaused);
            }
            if !paused && !state.paused {
                return Err(MusicError::NotPaused);
            }
        }

        self.backend.set_pause(paused).await?;

        let mut state = self.state.lock().await;
        let position = state.estimated_position();
        state.paused = paused;
        state.set_position(position);
        drop(state);

        self.events.emit(if paused {
            MusicEvent::PlayerPause {
                guild_id: self.guild_id,
            }
        } else {
            MusicEvent::PlayerResume {
                guild_id: self.guild_id,
            }
        });

        Ok(())
    }

    /// Seek relative to the current position; the result is clamped to the track bounds.
    /// Returns the old and new positions.
    pub async fn seek(&self, offset_secs: i64) -> MusicResult<(Duration, Duration)> {
        let (old, new) = {
            let state = self.state.lock().await;
            let Some(track) = &state.current else {
                return Err(MusicError::NothingIsPlaying);
            };
            let old = state.estimated_position();
            (old, clamp_seek(old, offset_secs, track.length()))
        };

        self.backend.seek(new).await?;
        self.state.lock().await.set_position(new);

        self.events.emit(MusicEvent::PlayerSeek {
            guild_id: self.guild_id,
            old,
            new,
        });

        Ok((old, new))
    }

    pub async fn set_volume(&self, volume: u16) -> MusicResult<()> {
        let volume = volume.min(MAX_NODE_VOLUME);
        self.backend.set_volume(volume).await?;
        self.state.lock().await.volume = volume;
        Ok(())
    }

    /// Stop the current track; the node's track-end event then advances the queue.
    /// A `CURRENT` loop is dropped so the skipped track is not replayed.
    pub async fn skip(&self) -> MusicResult<()> {
        {
            let mut state = self.state.lock().await;
            if state.current.is_none() {
                return Err(MusicError::NothingIsPlaying);
            }
            if state.loop_mode == LoopMode::Current {
                state.loop_mode = LoopMode::None;
            }
        }

        self.backend.stop().await?;
        self.events.emit(MusicEvent::TrackSkip {
            guild_id: self.guild_id,
        });

        Ok(())
    }

    /// Stop playback, drop the queue and disconnect. Idempotent.
    pub async fn destroy(&self) -> MusicResult<()> {
        if self.destroyed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        self.state.lock().await.current = None;
        self.queue.close().await;

        if let Err(e) = self.backend.stop().await {
            warn!("Failed to stop player for guild {}: {}", self.guild_id, e);
        }
        self.backend.disconnect().await?;

        info!("Destroyed player for guild {}", self.guild_id);
        Ok(())
    }

    pub async fn now_playing(&self) -> MusicResult<NowPlaying> {
        let upcoming = self.queue.peek().await;
        let state = self.state.lock().await;
        let track = state.current.clone().ok_or(MusicError::NothingIsPlaying)?;

        let next = if state.loop_mode == LoopMode::Current {
            Some(track.title().to_string())
        } else {
            upcoming.map(|t| t.title().to_string())
        };

        Ok(NowPlaying {
            guild_id: self.guild_id,
            loop_mode: state.loop_mode,
            volume: state.volume,
            position: state.estimated_position(),
            bound_channel: state.bound_channel,
            next,
            track,
        })
    }
}
