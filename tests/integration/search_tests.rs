use std::sync::Arc;
use std::time::Duration;

use dismusic::commands::music::utils::notifications::{EventSender, MusicEvent};
use dismusic::commands::music::utils::search::{Provider, TrackSearch, TrackSource, search_nodes};
use dismusic::lavalink::LavalinkError;
use dismusic::lavalink::model::{Exception, LoadResult};

use crate::common::fixtures::track;
use crate::common::mocks::{MockTrackSource, StalledSource};
use crate::{assert_eq, assert_matches};

const PER_NODE: Duration = Duration::from_secs(20);

fn node(name: &'static str, result: fn() -> Result<LoadResult, LavalinkError>) -> MockTrackSource {
    let mut mock = MockTrackSource::new();
    mock.expect_identifier().return_const(name.to_string());
    mock.expect_load_tracks().times(1).returning(move |_| result());
    mock
}

fn unused(name: &'static str) -> MockTrackSource {
    let mut mock = MockTrackSource::new();
    mock.expect_identifier().return_const(name.to_string());
    mock.expect_load_tracks().never();
    mock
}

#[tokio::test]
async fn first_node_with_results_wins() {
    let nodes: Vec<Arc<dyn TrackSource>> = vec![
        Arc::new(node("a", || {
            Ok(LoadResult::Search(vec![track("hit", 180), track("other", 120)]))
        })),
        Arc::new(unused("b")),
    ];

    let found = search_nodes(&nodes, "ytsearch:hit", PER_NODE, &EventSender::new()).await;

    assert_eq!(found.unwrap().title(), "hit");
}

#[tokio::test]
async fn errors_and_empty_results_fall_through() {
    let nodes: Vec<Arc<dyn TrackSource>> = vec![
        Arc::new(node("broken", || {
            Err(LavalinkError::Rest {
                status: 500,
                message: "boom".to_string(),
            })
        })),
        Arc::new(node("failing", || {
            Ok(LoadResult::Error(Exception {
                message: Some("blocked".to_string()),
                severity: "common".to_string(),
                cause: None,
            }))
        })),
        Arc::new(node("empty", || Ok(LoadResult::Search(Vec::new())))),
        Arc::new(node("good", || Ok(LoadResult::Track(track("found", 90))))),
    ];

    let found = search_nodes(&nodes, "ytsearch:x", PER_NODE, &EventSender::new()).await;

    assert_eq!(found.unwrap().title(), "found");
}

#[tokio::test]
async fn nothing_anywhere_yields_none() {
    let nodes: Vec<Arc<dyn TrackSource>> = vec![
        Arc::new(node("a", || Ok(LoadResult::Search(Vec::new())))),
        Arc::new(node("b", || Ok(LoadResult::Search(Vec::new())))),
    ];

    assert!(
        search_nodes(&nodes, "ytsearch:x", PER_NODE, &EventSender::new())
            .await
            .is_none()
    );
}

#[tokio::test(start_paused = true)]
async fn timed_out_node_is_reported_and_skipped() {
    let events = EventSender::new();
    let mut received = events.subscribe();
    let nodes: Vec<Arc<dyn TrackSource>> = vec![
        Arc::new(StalledSource {
            name: "slow".to_string(),
            delay: PER_NODE * 10,
        }),
        Arc::new(node("fast", || Ok(LoadResult::Track(track("found", 90))))),
    ];

    let found = search_nodes(&nodes, "ytsearch:x", PER_NODE, &events).await;

    assert_eq!(found.unwrap().title(), "found");
    assert_matches!(
        received.try_recv(),
        Ok(MusicEvent::NodeFail { node }) if node == "slow"
    );
}

#[tokio::test]
async fn queries_get_the_provider_prefix() {
    let mut mock = MockTrackSource::new();
    mock.expect_identifier().return_const("a".to_string());
    mock.expect_load_tracks()
        .withf(|identifier| identifier == "scsearch:lofi")
        .times(1)
        .returning(|_| Ok(LoadResult::Track(track("lofi", 60))));

    let search = TrackSearch::new(vec![Arc::new(mock)], PER_NODE, EventSender::new(), None);

    assert_eq!(
        search.find("lofi", Provider::SoundCloud).await.unwrap().title(),
        "lofi"
    );
}

#[tokio::test]
async fn spotify_urls_go_to_the_node_without_credentials() {
    let url = "https://open.spotify.com/track/4cOdK2wGLETKBW3PvgPWqT";
    let mut mock = MockTrackSource::new();
    mock.expect_identifier().return_const("a".to_string());
    mock.expect_load_tracks()
        .withf(move |identifier| identifier == url)
        .times(1)
        .returning(|_| Ok(LoadResult::Track(track("spotify", 60))));

    let search = TrackSearch::new(vec![Arc::new(mock)], PER_NODE, EventSender::new(), None);

    assert!(search.find(url, Provider::YouTube).await.is_some());
}
