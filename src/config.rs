//! Runtime configuration read from the environment (and `.env` via dotenv).

use std::env;
use std::time::Duration;

use thiserror::Error;

use crate::commands::music::utils::search::Provider;
use crate::lavalink::NodeConfig;

pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(300);
pub const DEFAULT_SEARCH_TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{0} not specified in env")]
    Missing(&'static str),

    #[error("Invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpotifyCredentials {
    pub client_id: String,
    pub client_secret: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub discord_token: String,
    /// How long an idle player waits for a new track before disconnecting
    pub idle_timeout: Duration,
    pub search_timeout: Duration,
    pub default_provider: Provider,
    pub nodes: Vec<NodeConfig>,
    pub spotify: Option<SpotifyCredentials>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let discord_token = lookup("DISCORD_TOKEN").ok_or(ConfigError::Missing("DISCORD_TOKEN"))?;

        let idle_timeout = seconds(&lookup, "DISMUSIC_TIMEOUT")?.unwrap_or(DEFAULT_IDLE_TIMEOUT);
        let search_timeout =
            seconds(&lookup, "DISMUSIC_SEARCH_TIMEOUT")?.unwrap_or(DEFAULT_SEARCH_TIMEOUT);

        let default_provider = match lookup("DISMUSIC_PROVIDER") {
            Some(raw) => Provider::from_key(&raw).ok_or_else(|| ConfigError::Invalid {
                key: "DISMUSIC_PROVIDER",
                reason: format!("unknown provider `{}`", raw),
            })?,
            None => Provider::default(),
        };

        let nodes = match lookup("LAVALINK_NODES") {
            Some(raw) => serde_json::from_str::<Vec<NodeConfig>>(&raw).map_err(|e| {
                ConfigError::Invalid {
                    key: "LAVALINK_NODES",
                    reason: e.to_string(),
                }
            })?,
            None => vec![NodeConfig::default()],
        };

        let spotify = match (lookup("SPOTIFY_CLIENT_ID"), lookup("SPOTIFY_CLIENT_SECRET")) {
            (Some(client_id), Some(client_secret))
                if !client_id.is_empty() && !client_secret.is_empty() =>
            {
                Some(SpotifyCredentials {
                    client_id,
                    client_secret,
                })
            }
            _ => None,
        };

        Ok(Self {
            discord_token,
            idle_timeout,
            search_timeout,
            default_provider,
            nodes,
            spotify,
        })
    }
}

fn seconds<F>(lookup: &F, key: &'static str) -> Result<Option<Duration>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|raw| {
            raw.trim()
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|e| ConfigError::Invalid {
                    key,
                    reason: e.to_string(),
                })
        })
        .transpose()
}
