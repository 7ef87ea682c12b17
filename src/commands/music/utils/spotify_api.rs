use base64::Engine;
use base64::prelude::BASE64_STANDARD;
use regex::Regex;
use reqwest::header;
use serde::Deserialize;
use std::sync::LazyLock;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use super::music_manager::MusicError;
use crate::config::SpotifyCredentials;

pub type SpotifyResult<T> = Result<T, MusicError>;

const ACCOUNTS_URL: &str = "https://accounts.spotify.com";
const API_URL: &str = "https://api.spotify.com/v1";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

/// Data structure for Spotify track information
#[derive(Clone, Debug, PartialEq)]
pub struct SpotifyTrack {
    pub name: String,
    pub artists: Vec<String>,
    pub duration_ms: u64,
}

impl SpotifyTrack {
    /// Text used to find the same song on YouTube
    pub fn search_query(&self) -> String {
        if self.artists.is_empty() {
            self.name.clone()
        } else {
            format!("{} - {}", self.artists.join(", "), self.name)
        }
    }
}

#[derive(Debug, Deserialize)]
struct SpotifyToken {
    access_token: String,
    expires_in: u64,
    #[serde(skip, default = "Instant::now")]
    created_at: Instant,
}

impl SpotifyToken {
    fn is_expired(&self) -> bool {
        let expiry = Duration::from_secs(self.expires_in);
        // Consider it expired 30 seconds before actual expiry
        self.created_at.elapsed() > expiry.saturating_sub(Duration::from_secs(30))
    }
}

#[derive(Debug, Deserialize)]
struct ApiTrack {
    name: String,
    artists: Vec<ApiArtist>,
    duration_ms: u64,
}

#[derive(Debug, Deserialize)]
struct ApiArtist {
    name: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    tracks: SearchPage,
}

#[derive(Debug, Deserialize)]
struct SearchPage {
    items: Vec<ApiTrack>,
}

impl From<ApiTrack> for SpotifyTrack {
    fn from(track: ApiTrack) -> Self {
        Self {
            name: track.name,
            artists: track.artists.into_iter().map(|a| a.name).collect(),
            duration_ms: track.duration_ms,
        }
    }
}

static SPOTIFY_TRACK_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(https?://)?(open\.spotify\.com|spotify)/(intl-[a-z]+/)?track/([a-zA-Z0-9]+)(\?.*)?$")
        .expect("valid spotify track regex")
});

static SPOTIFY_URL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(https?://)?(open\.spotify\.com|spotify)/").expect("valid spotify url regex")
});

/// Spotify Web API client using the client-credentials flow
pub struct SpotifyApi {
    credentials: SpotifyCredentials,
    http: reqwest::Client,
    token: Mutex<Option<SpotifyToken>>,
    accounts_url: String,
    api_url: String,
    timeout: Duration,
}

impl SpotifyApi {
    pub fn new(credentials: SpotifyCredentials, http: reqwest::Client) -> Self {
        Self::with_base_urls(credentials, http, ACCOUNTS_URL, API_URL)
    }

    pub fn with_base_urls(
        credentials: SpotifyCredentials,
        http: reqwest::Client,
        accounts_url: &str,
        api_url: &str,
    ) -> Self {
        Self {
            credentials,
            http,
            token: Mutex::new(None),
            accounts_url: accounts_url.trim_end_matches('/').to_string(),
            api_url: api_url.trim_end_matches('/').to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Upper bound for each Spotify request, body included
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Check if the given text is a Spotify URL
    pub fn is_spotify_url(url: &str) -> bool {
        SPOTIFY_URL_REGEX.is_match(url.trim())
    }

    /// Extract track ID from a Spotify track URL
    pub fn extract_track_id(url: &str) -> Option<String> {
        SPOTIFY_TRACK_REGEX
            .captures(url.trim())
            .and_then(|cap| cap.get(4))
            .map(|m| m.as_str().to_string())
    }

    async fn get_access_token(&self) -> SpotifyResult<String> {
        let mut token_lock = self.token.lock().await;

        // Return existing token if it's still valid
        if let Some(token) = &*token_lock {
            if !token.is_expired() {
                return Ok(token.access_token.clone());
            }
        }

        let auth = BASE64_STANDARD.encode(format!(
            "{}:{}",
            self.credentials.client_id, self.credentials.client_secret
        ));

        let response = self
            .http
            .post(format!("{}/api/token", self.accounts_url))
            .header(header::AUTHORIZATION, format!("Basic {}", auth))
            .form(&[("grant_type", "client_credentials")])
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| {
                MusicError::ExternalApiError(format!("Failed to request Spotify token: {}", e))
            })?;

        let response = Self::check(response).await?;
        let token = response.json::<SpotifyToken>().await.map_err(|e| {
            MusicError::ExternalApiError(format!("Failed to parse Spotify token: {}", e))
        })?;

        let access_token = token.access_token.clone();
        *token_lock = Some(token);

        Ok(access_token)
    }

    /// Get track information from Spotify API
    pub async fn get_track(&self, track_id: &str) -> SpotifyResult<SpotifyTrack> {
        let token = self.get_access_token().await?;

        let response = self
            .http
            .get(format!("{}/tracks/{}", self.api_url, track_id))
            .bearer_auth(token)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| {
                MusicError::ExternalApiError(format!("Failed to request Spotify track: {}", e))
            })?;

        let track = Self::check(response)
            .await?
            .json::<ApiTrack>()
            .await
            .map_err(|e| {
                MusicError::ExternalApiError(format!("Failed to parse Spotify track data: {}", e))
            })?;

        Ok(track.into())
    }

    /// Best Spotify match for a free-text query
    pub async fn search_track(&self, query: &str) -> SpotifyResult<Option<SpotifyTrack>> {
        let token = self.get_access_token().await?;

        let response = self
            .http
            .get(format!("{}/search", self.api_url))
            .bearer_auth(token)
            .query(&[("q", query), ("type", "track"), ("limit", "1")])
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| {
                MusicError::ExternalApiError(format!("Failed to search Spotify: {}", e))
            })?;

        let page = Self::check(response)
            .await?
            .json::<SearchResponse>()
            .await
            .map_err(|e| {
                MusicError::ExternalApiError(format!("Failed to parse Spotify search: {}", e))
            })?;

        Ok(page.tracks.items.into_iter().next().map(SpotifyTrack::from))
    }

    async fn check(response: reqwest::Response) -> SpotifyResult<reqwest::Response> {
        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status();
        let text = response
            .text()
            .await
            .unwrap_or_else(|_| "Cannot read response".to_string());

        Err(MusicError::ExternalApiError(format!(
            "Spotify API error: {} - {}",
            status, text
        )))
    }
}
