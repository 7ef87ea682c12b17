use async_trait::async_trait;
use dashmap::DashMap;
use poise::serenity_prelude as serenity;
use ::serenity::all::CreateMessage;
use ::serenity::client::Context;
use ::serenity::model::id::{ChannelId, GuildId, UserId};
use songbird::Songbird;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::backend::LavalinkBackend;
use super::button_controls::create_music_control_buttons;
use super::embedded_messages;
use super::notifications::{EventSender, MusicEvent};
use super::player::{Announcer, DisPlayer, NowPlaying};
use super::search::{Provider, TrackSearch, TrackSource};
use super::spotify_api::SpotifyApi;
use crate::HTTP_CLIENT;
use crate::config::{Config, ConfigError};
use crate::lavalink::model::{Event, parse_guild_id};
use crate::lavalink::{LavalinkError, NodeEvent, NodePool, Track};

/// Discord close code sent when the bot was removed from the voice channel
const VOICE_DISCONNECTED: u16 = 4014;

/// Errors that can occur during music operations
#[derive(Error, Debug)]
pub enum MusicError {
    #[error("Not in a guild")]
    NotInGuild,

    #[error("You are not in a voice channel")]
    NotConnectedToVoice,

    #[error("The bot is not in a voice channel")]
    PlayerNotConnected,

    #[error("You must be in the same voice channel as the bot")]
    MustBeSameChannel,

    #[error("Nothing is playing")]
    NothingIsPlaying,

    #[error("Looping the playlist needs at least 2 songs in the queue")]
    NotEnoughSongs,

    #[error("Loop mode must be `NONE`, `CURRENT` or `PLAYLIST`, got `{0}`")]
    InvalidLoopMode(String),

    #[error("Nothing found for the query")]
    NothingFound,

    #[error("The music is already paused")]
    AlreadyPaused,

    #[error("The music is not paused")]
    NotPaused,

    #[error("Volume must be between 0 and 100, got {0}")]
    InvalidVolume(i64),

    #[error("Failed to join voice channel: {0}")]
    JoinError(String),

    #[error("Failed to get voice manager")]
    NoVoiceManager,

    #[error("No audio node is available")]
    NoAvailableNode,

    #[error("Audio node error: {0}")]
    Node(#[from] LavalinkError),

    #[error("External API error: {0}")]
    ExternalApiError(String),

    #[error("Configuration error: {0}")]
    ConfigError(#[from] ConfigError),
}

/// Result type for music operations
pub type MusicResult<T> = Result<T, MusicError>;

/// Owns every guild's player and the node pool they play on
pub struct MusicManager {
    players: DashMap<GuildId, Arc<DisPlayer>>,
    nodes: NodePool,
    events: EventSender,
    idle_timeout: Duration,
    search_timeout: Duration,
    default_provider: Provider,
    spotify: Option<Arc<SpotifyApi>>,
}

impl MusicManager {
    pub fn new(config: &Config) -> Self {
        let spotify = config
            .spotify
            .clone()
            .map(|credentials| {
                Arc::new(
                    SpotifyApi::new(credentials, HTTP_CLIENT.clone())
                        .with_timeout(config.search_timeout),
                )
            });

        Self {
            players: DashMap::new(),
            nodes: NodePool::new(),
            events: EventSender::new(),
            idle_timeout: config.idle_timeout,
            search_timeout: config.search_timeout,
            default_provider: config.default_provider,
            spotify,
        }
    }

    pub fn nodes(&self) -> &NodePool {
        &self.nodes
    }

    pub fn events(&self) -> &EventSender {
        &self.events
    }

    pub fn idle_timeout(&self) -> Duration {
        self.idle_timeout
    }

    /// The guild's live player. Players destroyed by the idle timeout are pruned here.
    pub fn get_player(&self, guild_id: GuildId) -> Option<Arc<DisPlayer>> {
        let player = self
            .players
            .get(&guild_id)
            .map(|entry| Arc::clone(entry.value()))?;

        if player.is_destroyed() {
            debug!("Pruning destroyed player for guild {}", guild_id);
            self.players
                .remove_if(&guild_id, |_, existing| existing.is_destroyed());
            return None;
        }

        Some(player)
    }

    pub fn insert_player(&self, player: Arc<DisPlayer>) {
        self.players.insert(player.guild_id(), player);
    }

    /// Join the voice channel on the least busy node and register a player for the guild
    pub async fn connect(
        &self,
        ctx: &Context,
        guild_id: GuildId,
        voice_channel: ChannelId,
        text_channel: ChannelId,
    ) -> MusicResult<Arc<DisPlayer>> {
        if let Some(player) = self.get_player(guild_id) {
            return Ok(player);
        }

        let node = self.nodes.best().await.ok_or(MusicError::NoAvailableNode)?;
        let songbird = Self::get_songbird(ctx).await?;
        let backend = LavalinkBackend::connect(node, songbird, guild_id, voice_channel).await?;

        let player = Arc::new(DisPlayer::new(
            guild_id,
            voice_channel,
            self.idle_timeout,
            Arc::new(backend),
            Arc::new(ChannelAnnouncer::new(ctx.http.clone())),
            self.events.clone(),
        ));
        player.set_bound_channel(text_channel).await;
        player.set_provider(self.default_provider).await;

        self.insert_player(Arc::clone(&player));
        self.events.emit(MusicEvent::PlayerConnect {
            guild_id,
            channel_id: voice_channel,
        });
        info!("Connected player for guild {} in {}", guild_id, voice_channel);

        // starts the idle clock
        player.advance();

        Ok(player)
    }

    /// Explicit stop: destroy the player and forget it
    pub async fn stop(&self, guild_id: GuildId) -> MusicResult<()> {
        let (_, player) = self
            .players
            .remove(&guild_id)
            .ok_or(MusicError::PlayerNotConnected)?;

        if player.is_destroyed() {
            return Err(MusicError::PlayerNotConnected);
        }

        player.destroy().await?;
        self.events.emit(MusicEvent::PlayerStop { guild_id });

        Ok(())
    }

    /// Resolve a query to a single track, trying every node in order
    pub async fn search(&self, query: &str, provider: Provider) -> MusicResult<Track> {
        let nodes: Vec<Arc<dyn TrackSource>> = self
            .nodes
            .nodes()
            .await
            .into_iter()
            .map(|node| node as Arc<dyn TrackSource>)
            .collect();

        if nodes.is_empty() {
            return Err(MusicError::NoAvailableNode);
        }

        TrackSearch::new(
            nodes,
            self.search_timeout,
            self.events.clone(),
            self.spotify.clone(),
        )
        .find(query, provider)
        .await
        .ok_or(MusicError::NothingFound)
    }

    /// Route node websocket traffic to the owning player
    pub async fn handle_node_event(&self, event: NodeEvent) {
        match event {
            NodeEvent::PlayerUpdate(update) => {
                if let Some(player) = parse_guild_id(&update.guild_id).and_then(|id| self.get_player(id)) {
                    player
                        .update_position(Duration::from_millis(update.state.position))
                        .await;
                }
            }
            NodeEvent::Event(event) => {
                let Some(guild_id) = parse_guild_id(event.guild_id()) else {
                    warn!("Node event with invalid guild id: {}", event.guild_id());
                    return;
                };
                let Some(player) = self.get_player(guild_id) else {
                    debug!("Node event for guild {} without a player", guild_id);
                    return;
                };
                self.dispatch_player_event(guild_id, player, event);
            }
        }
    }

    fn dispatch_player_event(&self, guild_id: GuildId, player: Arc<DisPlayer>, event: Event) {
        match event {
            Event::TrackStartEvent(start) => {
                debug!("Node started {} in guild {}", start.track.title(), guild_id)
            }
            Event::TrackEndEvent(end) => {
                // advancing may wait for the idle timeout, so it gets its own task
                tokio::spawn(async move {
                    if let Err(e) = player.on_track_end(end.reason).await {
                        error!("Failed to advance queue for guild {}: {}", guild_id, e);
                    }
                });
            }
            Event::TrackExceptionEvent(exception) => warn!(
                "Track {} failed in guild {}: {}",
                exception.track.title(),
                guild_id,
                exception.exception.describe()
            ),
            Event::TrackStuckEvent(stuck) => {
                warn!(
                    "Track {} stuck for {}ms in guild {}, skipping",
                    stuck.track.title(),
                    stuck.threshold_ms,
                    guild_id
                );
                tokio::spawn(async move {
                    if let Err(e) = player.skip().await {
                        warn!("Failed to skip stuck track in guild {}: {}", guild_id, e);
                    }
                });
            }
            Event::WebSocketClosedEvent(closed) => {
                warn!(
                    "Voice websocket closed for guild {}: {} {} (by remote: {})",
                    guild_id, closed.code, closed.reason, closed.by_remote
                );
                if closed.by_remote && closed.code == VOICE_DISCONNECTED {
                    self.players
                        .remove_if(&guild_id, |_, existing| Arc::ptr_eq(existing, &player));
                    tokio::spawn(async move {
                        if let Err(e) = player.destroy().await {
                            warn!("Failed to destroy player for guild {}: {}", guild_id, e);
                        }
                    });
                }
            }
        }
    }

    /// Consume node events until every node has shut down
    pub fn spawn_event_router(
        self: Arc<Self>,
        mut receiver: mpsc::UnboundedReceiver<NodeEvent>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            while let Some(event) = receiver.recv().await {
                self.handle_node_event(event).await;
            }
            info!("Node event router finished");
        })
    }

    /// Get the Songbird voice client from the context
    pub async fn get_songbird(ctx: &Context) -> MusicResult<Arc<Songbird>> {
        songbird::get(ctx).await.ok_or(MusicError::NoVoiceManager)
    }

    /// Get the voice channel ID that the user is currently in
    pub fn get_user_voice_channel(
        ctx: &Context,
        guild_id: GuildId,
        user_id: UserId,
    ) -> MusicResult<ChannelId> {
        let guild = ctx.cache.guild(guild_id).ok_or(MusicError::NotInGuild)?;

        guild
            .voice_states
            .get(&user_id)
            .and_then(|voice_state| voice_state.channel_id)
            .ok_or(MusicError::NotConnectedToVoice)
    }
}

/// Posts "now playing" embeds into the player's bound text channel
pub struct ChannelAnnouncer {
    http: Arc<serenity::Http>,
}

impl ChannelAnnouncer {
    pub fn new(http: Arc<serenity::Http>) -> Self {
        Self { http }
    }
}

#[async_trait]
impl Announcer for ChannelAnnouncer {
    async fn now_playing(&self, now_playing: NowPlaying) {
        let Some(channel_id) = now_playing.bound_channel else {
            return;
        };

        let message = CreateMessage::new()
            .embed(embedded_messages::now_playing(&now_playing))
            .components(create_music_control_buttons());

        if let Err(e) = channel_id.send_message(self.http.clone(), message).await {
            warn!(
                "Failed to post now playing message in channel {}: {}",
                channel_id, e
            );
        }
    }
}
