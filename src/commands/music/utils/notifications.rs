//! Player lifecycle notifications, fanned out on a broadcast channel.

use std::time::Duration;

use serenity::model::id::{ChannelId, GuildId};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::lavalink::Track;

const CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone)]
pub enum MusicEvent {
    NodeFail {
        node: String,
    },
    PlayerConnect {
        guild_id: GuildId,
        channel_id: ChannelId,
    },
    PlayerStop {
        guild_id: GuildId,
    },
    PlayerPause {
        guild_id: GuildId,
    },
    PlayerResume {
        guild_id: GuildId,
    },
    TrackSkip {
        guild_id: GuildId,
    },
    PlayerSeek {
        guild_id: GuildId,
        old: Duration,
        new: Duration,
    },
    TrackStart {
        guild_id: GuildId,
        track: Box<Track>,
    },
}

#[derive(Clone)]
pub struct EventSender(broadcast::Sender<MusicEvent>);

impl EventSender {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self(sender)
    }

    /// Fire-and-forget; having no listeners is fine
    pub fn emit(&self, event: MusicEvent) {
        let _ = self.0.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<MusicEvent> {
        self.0.subscribe()
    }
}

impl Default for EventSender {
    fn default() -> Self {
        Self::new()
    }
}

/// Log every lifecycle event until the sender is dropped
pub fn spawn_log_listener(events: &EventSender) -> JoinHandle<()> {
    let mut receiver = events.subscribe();

    tokio::spawn(async move {
        loop {
            match receiver.recv().await {
                Ok(MusicEvent::NodeFail { node }) => warn!("Node {} timed out", node),
                Ok(MusicEvent::TrackStart { guild_id, track }) => {
                    info!("Guild {} started {}", guild_id, track.title())
                }
                Ok(MusicEvent::PlayerSeek { guild_id, old, new }) => {
                    info!("Guild {} seeked from {:?} to {:?}", guild_id, old, new)
                }
                Ok(event) => info!("{:?}", event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("Event listener lagged, skipped {} events", skipped)
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}
