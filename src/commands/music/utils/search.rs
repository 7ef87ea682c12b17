use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::timeout;
use tracing::{debug, info, warn};
use url::Url;

use super::notifications::{EventSender, MusicEvent};
use super::spotify_api::SpotifyApi;
use crate::lavalink::model::LoadResult;
use crate::lavalink::{LavalinkResult, Node, Track};

/// Where a plain-text query is searched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, poise::ChoiceParameter)]
pub enum Provider {
    #[default]
    #[name = "YouTube"]
    YouTube,
    #[name = "YouTube Music"]
    YouTubeMusic,
    #[name = "SoundCloud"]
    SoundCloud,
    #[name = "Spotify"]
    Spotify,
}

impl Provider {
    /// Parse the short keys used in configuration (`yt`, `ytmusic`, `soundcloud`, `spotify`)
    pub fn from_key(key: &str) -> Option<Self> {
        match key.trim().to_ascii_lowercase().as_str() {
            "yt" | "youtube" => Some(Provider::YouTube),
            "ytmusic" | "youtubemusic" => Some(Provider::YouTubeMusic),
            "soundcloud" | "sc" => Some(Provider::SoundCloud),
            "spotify" | "sp" => Some(Provider::Spotify),
            _ => None,
        }
    }

    pub fn search_prefix(&self) -> &'static str {
        match self {
            Provider::YouTube => "ytsearch:",
            Provider::YouTubeMusic => "ytmsearch:",
            Provider::SoundCloud => "scsearch:",
            Provider::Spotify => "spsearch:",
        }
    }
}

pub fn is_url(query: &str) -> bool {
    Url::parse(query).is_ok_and(|url| matches!(url.scheme(), "http" | "https"))
}

/// URLs go to the node untouched, everything else gets the provider's search prefix
pub fn build_identifier(query: &str, provider: Provider) -> String {
    let query = query.trim();
    if is_url(query) {
        query.to_string()
    } else {
        format!("{}{}", provider.search_prefix(), query)
    }
}

/// Anything that can turn an identifier into tracks
#[async_trait]
pub trait TrackSource: Send + Sync {
    fn identifier(&self) -> &str;

    async fn load_tracks(&self, identifier: &str) -> LavalinkResult<LoadResult>;
}

#[async_trait]
impl TrackSource for Node {
    fn identifier(&self) -> &str {
        Node::identifier(self)
    }

    async fn load_tracks(&self, identifier: &str) -> LavalinkResult<LoadResult> {
        Node::load_tracks(self, identifier).await
    }
}

/// Try each node in order and take the first entry of the first non-empty result.
/// Nodes that time out or fail are skipped.
pub async fn search_nodes(
    nodes: &[Arc<dyn TrackSource>],
    identifier: &str,
    per_node_timeout: Duration,
    events: &EventSender,
) -> Option<Track> {
    for node in nodes {
        let result = match timeout(per_node_timeout, node.load_tracks(identifier)).await {
            Ok(result) => result,
            Err(_) => {
                warn!("Node {} timed out searching {}", node.identifier(), identifier);
                events.emit(MusicEvent::NodeFail {
                    node: node.identifier().to_string(),
                });
                continue;
            }
        };

        match result.and_then(LoadResult::into_tracks) {
            Ok(tracks) => match tracks.into_iter().next() {
                Some(track) => return Some(track),
                None => debug!("Node {} found nothing for {}", node.identifier(), identifier),
            },
            Err(e) => warn!("Node {} failed searching {}: {}", node.identifier(), identifier, e),
        }
    }

    None
}

/// Resolves chat queries into a single track across the registered nodes
pub struct TrackSearch {
    nodes: Vec<Arc<dyn TrackSource>>,
    per_node_timeout: Duration,
    events: EventSender,
    spotify: Option<Arc<SpotifyApi>>,
}

impl TrackSearch {
    pub fn new(
        nodes: Vec<Arc<dyn TrackSource>>,
        per_node_timeout: Duration,
        events: EventSender,
        spotify: Option<Arc<SpotifyApi>>,
    ) -> Self {
        Self {
            nodes,
            per_node_timeout,
            events,
            spotify,
        }
    }

    pub async fn find(&self, query: &str, provider: Provider) -> Option<Track> {
        let identifier = self.identifier_for(query, provider).await;
        info!("Searching {} node(s) for {}", self.nodes.len(), identifier);
        search_nodes(&self.nodes, &identifier, self.per_node_timeout, &self.events).await
    }

    /// Spotify has no audio of its own: with credentials available, Spotify queries are
    /// resolved to "artists - title" and searched on YouTube instead.
    async fn identifier_for(&self, query: &str, provider: Provider) -> String {
        let wants_spotify = provider == Provider::Spotify || SpotifyApi::is_spotify_url(query);

        if let (true, Some(spotify)) = (wants_spotify, &self.spotify) {
            let resolved = match SpotifyApi::extract_track_id(query) {
                Some(track_id) => spotify.get_track(&track_id).await.map(Some),
                None if is_url(query) => Ok(None),
                None => spotify.search_track(query).await,
            };

            match resolved {
                Ok(Some(track)) => return build_identifier(&track.search_query(), Provider::YouTube),
                Ok(None) => debug!("Spotify could not resolve {}", query),
                Err(e) => warn!("Spotify lookup failed for {}: {}", query, e),
            }
        }

        build_identifier(query, provider)
    }
}
