//! Mock implementations for external dependencies
//! This module contains mock objects used for testing

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use dismusic::commands::music::utils::player::{Announcer, NowPlaying, PlaybackBackend};
use dismusic::commands::music::utils::search::TrackSource;
use dismusic::lavalink::model::LoadResult;
use dismusic::lavalink::{LavalinkError, LavalinkResult, Track};
use mockall::mock;

// Mocked node for search fallback tests
mock! {
    pub TrackSource {}

    #[async_trait]
    impl TrackSource for TrackSource {
        fn identifier(&self) -> &str;
        async fn load_tracks(&self, identifier: &str) -> LavalinkResult<LoadResult>;
    }
}

/// A node that never answers within any reasonable timeout
pub struct StalledSource {
    pub name: String,
    pub delay: Duration,
}

#[async_trait]
impl TrackSource for StalledSource {
    fn identifier(&self) -> &str {
        &self.name
    }

    async fn load_tracks(&self, _identifier: &str) -> LavalinkResult<LoadResult> {
        tokio::time::sleep(self.delay).await;
        Ok(LoadResult::Search(Vec::new()))
    }
}

/// What the player asked the backend to do
#[derive(Debug, Clone, PartialEq)]
pub enum BackendCall {
    Play(String),
    Stop,
    Pause(bool),
    Seek(Duration),
    Volume(u16),
    Disconnect,
}

/// Backend double that records every call in order
#[derive(Default)]
pub struct RecordingBackend {
    calls: Mutex<Vec<BackendCall>>,
    fail_play: AtomicBool,
    broken_titles: Mutex<Vec<String>>,
}

impl RecordingBackend {
    pub fn failing_play() -> Self {
        let backend = Self::default();
        backend.fail_play.store(true, Ordering::SeqCst);
        backend
    }

    /// Every later `play` of this title fails
    pub fn break_title(&self, title: &str) {
        self.broken_titles.lock().unwrap().push(title.to_string());
    }

    pub fn calls(&self) -> Vec<BackendCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Titles passed to `play`, in order
    pub fn played(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                BackendCall::Play(title) => Some(title),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, wanted: &BackendCall) -> usize {
        self.calls().iter().filter(|call| *call == wanted).count()
    }

    fn record(&self, call: BackendCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl PlaybackBackend for RecordingBackend {
    async fn play(&self, track: &Track) -> LavalinkResult<()> {
        let broken = self
            .broken_titles
            .lock()
            .unwrap()
            .iter()
            .any(|title| title == track.title());
        if broken || self.fail_play.load(Ordering::SeqCst) {
            return Err(LavalinkError::NoSession("test-node".to_string()));
        }
        self.record(BackendCall::Play(track.title().to_string()));
        Ok(())
    }

    async fn stop(&self) -> LavalinkResult<()> {
        self.record(BackendCall::Stop);
        Ok(())
    }

    async fn set_pause(&self, paused: bool) -> LavalinkResult<()> {
        self.record(BackendCall::Pause(paused));
        Ok(())
    }

    async fn seek(&self, position: Duration) -> LavalinkResult<()> {
        self.record(BackendCall::Seek(position));
        Ok(())
    }

    async fn set_volume(&self, volume: u16) -> LavalinkResult<()> {
        self.record(BackendCall::Volume(volume));
        Ok(())
    }

    async fn disconnect(&self) -> LavalinkResult<()> {
        self.record(BackendCall::Disconnect);
        Ok(())
    }
}

/// Collects "now playing" announcements
#[derive(Default)]
pub struct RecordingAnnouncer {
    announced: Mutex<Vec<NowPlaying>>,
}

impl RecordingAnnouncer {
    pub fn announced(&self) -> Vec<NowPlaying> {
        self.announced.lock().unwrap().clone()
    }
}

#[async_trait]
impl Announcer for RecordingAnnouncer {
    async fn now_playing(&self, now_playing: NowPlaying) {
        self.announced.lock().unwrap().push(now_playing);
    }
}
