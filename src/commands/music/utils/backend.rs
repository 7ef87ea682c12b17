use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serenity::model::id::{ChannelId, GuildId};
use songbird::Songbird;
use tracing::{info, warn};

use super::music_manager::{MusicError, MusicResult};
use super::player::PlaybackBackend;
use crate::lavalink::model::{UpdatePlayer, UpdatePlayerTrack, VoiceState};
use crate::lavalink::{LavalinkResult, Node, Track};

/// Plays a guild's audio on a Lavalink node; songbird only holds the voice gateway session
pub struct LavalinkBackend {
    node: Arc<Node>,
    songbird: Arc<Songbird>,
    guild_id: GuildId,
}

impl LavalinkBackend {
    /// Join the voice channel through the gateway and hand the voice session to the node
    pub async fn connect(
        node: Arc<Node>,
        songbird: Arc<Songbird>,
        guild_id: GuildId,
        channel_id: ChannelId,
    ) -> MusicResult<Self> {
        let (info, _call) = songbird
            .join_gateway(guild_id, channel_id)
            .await
            .map_err(|e| MusicError::JoinError(e.to_string()))?;

        let update = UpdatePlayer {
            voice: Some(VoiceState {
                token: info.token,
                endpoint: info.endpoint,
                session_id: info.session_id,
            }),
            ..Default::default()
        };

        if let Err(e) = node.update_player(guild_id, &update).await {
            if let Err(leave_err) = songbird.remove(guild_id).await {
                warn!("Failed to leave voice in guild {}: {}", guild_id, leave_err);
            }
            return Err(e.into());
        }

        node.attach_player();
        info!(
            "Guild {} voice session handed to node {}",
            guild_id,
            node.identifier()
        );

        Ok(Self {
            node,
            songbird,
            guild_id,
        })
    }

    async fn update(&self, update: UpdatePlayer) -> LavalinkResult<()> {
        self.node.update_player(self.guild_id, &update).await
    }
}

#[async_trait]
impl PlaybackBackend for LavalinkBackend {
    async fn play(&self, track: &Track) -> LavalinkResult<()> {
        self.update(UpdatePlayer {
            track: Some(UpdatePlayerTrack {
                encoded: Some(track.encoded.clone()),
            }),
            position: Some(0),
            paused: Some(false),
            ..Default::default()
        })
        .await
    }

    async fn stop(&self) -> LavalinkResult<()> {
        self.update(UpdatePlayer {
            track: Some(UpdatePlayerTrack { encoded: None }),
            ..Default::default()
        })
        .await
    }

    async fn set_pause(&self, paused: bool) -> LavalinkResult<()> {
        self.update(UpdatePlayer {
            paused: Some(paused),
            ..Default::default()
        })
        .await
    }

    async fn seek(&self, position: Duration) -> LavalinkResult<()> {
        self.update(UpdatePlayer {
            position: Some(position.as_millis() as u64),
            ..Default::default()
        })
        .await
    }

    async fn set_volume(&self, volume: u16) -> LavalinkResult<()> {
        self.update(UpdatePlayer {
            volume: Some(volume),
            ..Default::default()
        })
        .await
    }

    async fn disconnect(&self) -> LavalinkResult<()> {
        let destroyed = self.node.destroy_player(self.guild_id).await;
        self.node.detach_player();

        if let Err(e) = self.songbird.remove(self.guild_id).await {
            warn!("Failed to leave voice in guild {}: {}", self.guild_id, e);
        }

        destroyed
    }
}
