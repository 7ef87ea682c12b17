use std::sync::Arc;
use std::time::Duration;

use dismusic::commands::music::utils::music_manager::MusicError;
use dismusic::commands::music::utils::notifications::EventSender;
use dismusic::commands::music::utils::search::{Provider, TrackSearch};
use dismusic::commands::music::utils::spotify_api::SpotifyApi;
use dismusic::config::SpotifyCredentials;
use dismusic::lavalink::model::LoadResult;
use serde_json::json;
use wiremock::matchers::{bearer_token, body_string_contains, method, path, query_param};

use crate::common::fixtures::track;
use crate::common::mocks::MockTrackSource;
use crate::{Mock, MockServer, ResponseTemplate, assert_eq, assert_matches};

const TRACK_ID: &str = "4cOdK2wGLETKBW3PvgPWqT";

fn api_for(server: &MockServer) -> SpotifyApi {
    SpotifyApi::with_base_urls(
        SpotifyCredentials {
            client_id: "client".to_string(),
            client_secret: "secret".to_string(),
        },
        reqwest::Client::new(),
        &server.uri(),
        &format!("{}/v1", server.uri()),
    )
}

async fn mount_token(server: &MockServer, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path("/api/token"))
        .and(body_string_contains("grant_type=client_credentials"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "token-123",
            "token_type": "Bearer",
            "expires_in": 3600
        })))
        .expect(expected_calls)
        .mount(server)
        .await;
}

fn track_body() -> serde_json::Value {
    json!({
        "name": "Never Gonna Give You Up",
        "artists": [{ "name": "Rick Astley" }],
        "duration_ms": 213573
    })
}

#[tokio::test]
async fn resolves_a_track_and_reuses_the_token() {
    let server = MockServer::start().await;
    mount_token(&server, 1).await;
    Mock::given(method("GET"))
        .and(path(format!("/v1/tracks/{}", TRACK_ID)))
        .and(bearer_token("token-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(track_body()))
        .expect(2)
        .mount(&server)
        .await;

    let api = api_for(&server);
    let first = api.get_track(TRACK_ID).await.unwrap();
    let second = api.get_track(TRACK_ID).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(first.search_query(), "Rick Astley - Never Gonna Give You Up");
    assert_eq!(first.duration_ms, 213573);
}

#[tokio::test]
async fn searches_for_the_best_match() {
    let server = MockServer::start().await;
    mount_token(&server, 1).await;
    Mock::given(method("GET"))
        .and(path("/v1/search"))
        .and(query_param("q", "never gonna"))
        .and(query_param("type", "track"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "tracks": { "items": [track_body()] }
        })))
        .mount(&server)
        .await;

    let found = api_for(&server).search_track("never gonna").await.unwrap();

    assert_eq!(found.unwrap().name, "Never Gonna Give You Up");
}

#[tokio::test]
async fn api_errors_are_reported() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/token"))
        .respond_with(ResponseTemplate::new(400).set_body_string("invalid_client"))
        .mount(&server)
        .await;

    assert_matches!(
        api_for(&server).get_track(TRACK_ID).await,
        Err(MusicError::ExternalApiError(message)) if message.contains("invalid_client")
    );
}

#[tokio::test]
async fn slow_spotify_requests_time_out() {
    let server = MockServer::start().await;
    mount_token(&server, 1).await;
    Mock::given(method("GET"))
        .and(path(format!("/v1/tracks/{}", TRACK_ID)))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(track_body())
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let api = api_for(&server).with_timeout(Duration::from_millis(200));
    let started = std::time::Instant::now();

    assert_matches!(
        api.get_track(TRACK_ID).await,
        Err(MusicError::ExternalApiError(_))
    );
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn spotify_links_are_searched_on_youtube() {
    let server = MockServer::start().await;
    mount_token(&server, 1).await;
    Mock::given(method("GET"))
        .and(path(format!("/v1/tracks/{}", TRACK_ID)))
        .respond_with(ResponseTemplate::new(200).set_body_json(track_body()))
        .mount(&server)
        .await;

    let mut node = MockTrackSource::new();
    node.expect_identifier().return_const("a".to_string());
    node.expect_load_tracks()
        .withf(|identifier| identifier == "ytsearch:Rick Astley - Never Gonna Give You Up")
        .times(1)
        .returning(|_| Ok(LoadResult::Search(vec![track("rickroll", 213)])));

    let search = TrackSearch::new(
        vec![Arc::new(node)],
        Duration::from_secs(20),
        EventSender::new(),
        Some(Arc::new(api_for(&server))),
    );

    let found = search
        .find(
            &format!("https://open.spotify.com/track/{}?si=abc", TRACK_ID),
            Provider::YouTube,
        )
        .await;

    assert_eq!(found.unwrap().title(), "rickroll");
}

#[tokio::test]
async fn failed_spotify_lookup_falls_back_to_the_node() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/token"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let mut node = MockTrackSource::new();
    node.expect_identifier().return_const("a".to_string());
    node.expect_load_tracks()
        .withf(|identifier| identifier == "spsearch:never gonna")
        .times(1)
        .returning(|_| Ok(LoadResult::Search(vec![track("fallback", 100)])));

    let search = TrackSearch::new(
        vec![Arc::new(node)],
        Duration::from_secs(20),
        EventSender::new(),
        Some(Arc::new(api_for(&server))),
    );

    assert_eq!(
        search.find("never gonna", Provider::Spotify).await.unwrap().title(),
        "fallback"
    );
}
