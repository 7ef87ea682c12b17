use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use futures::StreamExt;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::{Client as HttpClient, Response, Url};
use serde::Deserialize;
use serenity::model::id::{GuildId, UserId};
use tokio::sync::{RwLock, mpsc};
use tokio_tungstenite::tungstenite::Message as TungsteniteMessage;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tracing::{debug, error, info, warn};

use super::error::{LavalinkError, LavalinkResult};
use super::model::{Event, IncomingMessage, LoadResult, PlayerUpdate, UpdatePlayer};

const CLIENT_NAME: &str = concat!("dismusic/", env!("CARGO_PKG_VERSION"));
const MAX_RECONNECT_ATTEMPTS: u8 = 5;
const RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// Connection settings for one Lavalink node, as listed in `LAVALINK_NODES`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NodeConfig {
    pub host: String,
    pub port: u16,
    pub password: String,
    #[serde(default)]
    pub secure: bool,
    #[serde(default)]
    pub identifier: Option<String>,
}

impl NodeConfig {
    pub fn identifier(&self) -> String {
        self.identifier
            .clone()
            .unwrap_or_else(|| format!("{}:{}", self.host, self.port))
    }

    fn rest_url(&self) -> String {
        let scheme = if self.secure { "https" } else { "http" };
        format!("{}://{}:{}/v4", scheme, self.host, self.port)
    }

    fn socket_url(&self) -> String {
        let scheme = if self.secure { "wss" } else { "ws" };
        format!("{}://{}:{}/v4/websocket", scheme, self.host, self.port)
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 2333,
            password: "youshallnotpass".to_string(),
            secure: false,
            identifier: None,
        }
    }
}

/// What a node forwards to the player registry
#[derive(Debug, Clone)]
pub enum NodeEvent {
    PlayerUpdate(PlayerUpdate),
    Event(Event),
}

/// A single Lavalink node: REST calls plus the websocket session that feeds events back.
pub struct Node {
    identifier: String,
    config: NodeConfig,
    http: HttpClient,
    rest_url: String,
    session_id: RwLock<Option<String>>,
    players: AtomicUsize,
}

impl Node {
    pub fn new(config: NodeConfig) -> LavalinkResult<Self> {
        let identifier = config.identifier();

        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&config.password)
                .map_err(|_| LavalinkError::InvalidHeader(identifier.clone()))?,
        );

        let http = HttpClient::builder().default_headers(headers).build()?;

        Ok(Self {
            rest_url: config.rest_url(),
            identifier,
            config,
            http,
            session_id: RwLock::new(None),
            players: AtomicUsize::new(0),
        })
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub async fn is_connected(&self) -> bool {
        self.session_id.read().await.is_some()
    }

    pub async fn session_id(&self) -> LavalinkResult<String> {
        self.session_id
            .read()
            .await
            .clone()
            .ok_or_else(|| LavalinkError::NoSession(self.identifier.clone()))
    }

    pub fn player_count(&self) -> usize {
        self.players.load(Ordering::Relaxed)
    }

    pub fn attach_player(&self) {
        self.players.fetch_add(1, Ordering::Relaxed);
    }

    pub fn detach_player(&self) {
        let _ = self
            .players
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_sub(1));
    }

    /// Resolve an identifier (`ytsearch:...`, a URL, ...) into tracks
    pub async fn load_tracks(&self, identifier: &str) -> LavalinkResult<LoadResult> {
        let url = Url::parse_with_params(
            &format!("{}/loadtracks", self.rest_url),
            &[("identifier", identifier)],
        )
        .map_err(|e| LavalinkError::LoadFailed(e.to_string()))?;

        debug!("Node {} loading tracks for {}", self.identifier, identifier);

        let response = Self::check(self.http.get(url).send().await?).await?;
        Ok(response.json::<LoadResult>().await?)
    }

    pub async fn update_player(
        &self,
        guild_id: GuildId,
        update: &UpdatePlayer,
    ) -> LavalinkResult<()> {
        let url = self.player_url(guild_id).await?;

        Self::check(
            self.http
                .patch(url)
                .query(&[("noReplace", "false")])
                .json(update)
                .send()
                .await?,
        )
        .await?;

        Ok(())
    }

    pub async fn destroy_player(&self, guild_id: GuildId) -> LavalinkResult<()> {
        let url = self.player_url(guild_id).await?;
        Self::check(self.http.delete(url).send().await?).await?;
        Ok(())
    }

    async fn player_url(&self, guild_id: GuildId) -> LavalinkResult<String> {
        let session_id = self.session_id().await?;
        Ok(format!(
            "{}/sessions/{}/players/{}",
            self.rest_url, session_id, guild_id
        ))
    }

    async fn check(response: Response) -> LavalinkResult<Response> {
        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status().as_u16();
        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "Cannot read response".to_string());

        Err(LavalinkError::Rest { status, message })
    }

    /// Spawn the websocket task. It reconnects a few times before giving up on the node.
    pub fn run(node: Arc<Self>, user_id: UserId, events: mpsc::UnboundedSender<NodeEvent>) {
        tokio::spawn(async move {
            let mut attempt = 1u8;

            while attempt <= MAX_RECONNECT_ATTEMPTS {
                info!(
                    "Node {} connecting to {}, attempt {}",
                    node.identifier,
                    node.config.socket_url(),
                    attempt
                );

                match node.listen(user_id, &events).await {
                    Ok(()) => {
                        attempt = 1;
                        warn!("Node {} websocket closed, reconnecting", node.identifier);
                    }
                    Err(e) => {
                        warn!(
                            "Node {} connection failed (attempt {}/{}): {}",
                            node.identifier, attempt, MAX_RECONNECT_ATTEMPTS, e
                        );
                        attempt += 1;
                    }
                }

                *node.session_id.write().await = None;
                tokio::time::sleep(RECONNECT_DELAY).await;
            }

            error!(
                "Node {} reached max connection attempts, giving up",
                node.identifier
            );
        });
    }

    async fn listen(
        &self,
        user_id: UserId,
        events: &mpsc::UnboundedSender<NodeEvent>,
    ) -> LavalinkResult<()> {
        let mut request = self.config.socket_url().into_client_request()?;
        let headers = request.headers_mut();
        headers.insert(
            "Authorization",
            HeaderValue::from_str(&self.config.password)
                .map_err(|_| LavalinkError::InvalidHeader(self.identifier.clone()))?,
        );
        headers.insert(
            "User-Id",
            HeaderValue::from_str(&user_id.to_string())
                .map_err(|_| LavalinkError::InvalidHeader(self.identifier.clone()))?,
        );
        headers.insert("Client-Name", HeaderValue::from_static(CLIENT_NAME));

        let (mut stream, _) = tokio_tungstenite::connect_async(request).await?;

        while let Some(message) = stream.next().await {
            match message? {
                TungsteniteMessage::Text(text) => self.handle_message(&text, events).await,
                TungsteniteMessage::Close(_) => break,
                _ => (),
            }
        }

        Ok(())
    }

    /// Apply one websocket frame: `ready` opens the session, player traffic is forwarded
    pub async fn handle_message(&self, text: &str, events: &mpsc::UnboundedSender<NodeEvent>) {
        let message = match serde_json::from_str::<IncomingMessage>(text) {
            Ok(message) => message,
            Err(e) => {
                debug!("Node {} sent an unhandled payload: {}", self.identifier, e);
                return;
            }
        };

        let forwarded = match message {
            IncomingMessage::Ready(ready) => {
                info!(
                    "Node {} ready with session {} (resumed: {})",
                    self.identifier, ready.session_id, ready.resumed
                );
                *self.session_id.write().await = Some(ready.session_id);
                return;
            }
            IncomingMessage::Stats(stats) => {
                debug!(
                    "Node {} stats: {}/{} players playing, uptime {}ms",
                    self.identifier, stats.playing_players, stats.players, stats.uptime
                );
                return;
            }
            IncomingMessage::PlayerUpdate(update) => NodeEvent::PlayerUpdate(update),
            IncomingMessage::Event(event) => NodeEvent::Event(event),
        };

        if events.send(forwarded).is_err() {
            warn!("Node {} has no event receiver", self.identifier);
        }
    }
}
