use std::sync::Arc;

use dismusic::lavalink::model::{Event, LoadResult, UpdatePlayer, UpdatePlayerTrack};
use dismusic::lavalink::{LavalinkError, Node, NodeConfig, NodeEvent, NodePool, TrackEndReason};
use serde_json::json;
use serenity::model::id::GuildId;
use tokio::sync::mpsc;
use wiremock::matchers::{body_json, header, method, path, query_param};

use crate::common::fixtures::{
    SAMPLE_GUILD_ID, empty_result_json, error_result_json, search_result_json, track_json,
};
use crate::{Mock, MockServer, ResponseTemplate, assert_eq, assert_matches};

const PASSWORD: &str = "youshallnotpass";

fn node_for(server: &MockServer) -> Node {
    let address = server.address();
    Node::new(NodeConfig {
        host: address.ip().to_string(),
        port: address.port(),
        password: PASSWORD.to_string(),
        secure: false,
        identifier: Some("test".to_string()),
    })
    .unwrap()
}

async fn ready(node: &Node) -> mpsc::UnboundedReceiver<NodeEvent> {
    let (tx, rx) = mpsc::unbounded_channel();
    node.handle_message(r#"{"op":"ready","resumed":false,"sessionId":"abc"}"#, &tx)
        .await;
    rx
}

#[tokio::test]
async fn loads_search_results() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v4/loadtracks"))
        .and(query_param("identifier", "ytsearch:never gonna"))
        .and(header("Authorization", PASSWORD))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_result_json(&["one", "two"])))
        .expect(1)
        .mount(&server)
        .await;

    let result = node_for(&server).load_tracks("ytsearch:never gonna").await.unwrap();

    let tracks = result.into_tracks().unwrap();
    assert_eq!(tracks.len(), 2);
    assert_eq!(tracks[0].title(), "one");
    assert_eq!(tracks[0].uri(), "https://www.youtube.com/watch?v=one");
}

#[tokio::test]
async fn playlist_starts_at_the_selected_track() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v4/loadtracks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "loadType": "playlist",
            "data": {
                "info": { "name": "mix", "selectedTrack": 1 },
                "pluginInfo": {},
                "tracks": [track_json("a", 60), track_json("b", 60), track_json("c", 60)]
            }
        })))
        .mount(&server)
        .await;

    let tracks = node_for(&server)
        .load_tracks("https://www.youtube.com/playlist?list=x")
        .await
        .unwrap()
        .into_tracks()
        .unwrap();

    let titles: Vec<&str> = tracks.iter().map(|t| t.title()).collect();
    assert_eq!(titles, vec!["b", "c", "a"]);
}

#[tokio::test]
async fn empty_and_error_results() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(query_param("identifier", "nothing"))
        .respond_with(ResponseTemplate::new(200).set_body_json(empty_result_json()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(query_param("identifier", "broken"))
        .respond_with(ResponseTemplate::new(200).set_body_json(error_result_json("This video is unavailable")))
        .mount(&server)
        .await;

    let node = node_for(&server);

    assert_matches!(node.load_tracks("nothing").await, Ok(LoadResult::Empty(_)));
    assert_matches!(
        node.load_tracks("broken").await.unwrap().into_tracks(),
        Err(LavalinkError::LoadFailed(message)) if message == "This video is unavailable"
    );
}

#[tokio::test]
async fn http_errors_surface_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401).set_body_string("Unauthorized"))
        .mount(&server)
        .await;

    assert_matches!(
        node_for(&server).load_tracks("ytsearch:x").await,
        Err(LavalinkError::Rest { status: 401, .. })
    );
}

#[tokio::test]
async fn player_updates_need_a_session() {
    let server = MockServer::start().await;
    let node = node_for(&server);

    assert!(!node.is_connected().await);
    assert_matches!(
        node.update_player(GuildId::new(SAMPLE_GUILD_ID), &UpdatePlayer::default())
            .await,
        Err(LavalinkError::NoSession(id)) if id == "test"
    );
}

#[tokio::test]
async fn player_updates_are_patched_into_the_session() {
    let server = MockServer::start().await;
    let player_path = format!("/v4/sessions/abc/players/{}", SAMPLE_GUILD_ID);
    Mock::given(method("PATCH"))
        .and(path(player_path.as_str()))
        .and(query_param("noReplace", "false"))
        .and(body_json(json!({ "track": { "encoded": null }, "paused": true })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path(player_path.as_str()))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let node = node_for(&server);
    let _events = ready(&node).await;
    assert!(node.is_connected().await);

    let update = UpdatePlayer {
        track: Some(UpdatePlayerTrack { encoded: None }),
        paused: Some(true),
        ..Default::default()
    };
    node.update_player(GuildId::new(SAMPLE_GUILD_ID), &update)
        .await
        .unwrap();
    node.destroy_player(GuildId::new(SAMPLE_GUILD_ID))
        .await
        .unwrap();
}

#[tokio::test]
async fn websocket_events_are_forwarded() {
    let server = MockServer::start().await;
    let node = node_for(&server);
    let (tx, mut rx) = mpsc::unbounded_channel();

    let frame = json!({
        "op": "event",
        "type": "TrackEndEvent",
        "guildId": SAMPLE_GUILD_ID.to_string(),
        "track": track_json("done", 60),
        "reason": "finished"
    });
    node.handle_message(&frame.to_string(), &tx).await;

    assert_matches!(
        rx.try_recv(),
        Ok(NodeEvent::Event(Event::TrackEndEvent(end))) if end.reason == TrackEndReason::Finished
    );
}

#[tokio::test]
async fn stats_and_unknown_frames_are_not_forwarded() {
    let server = MockServer::start().await;
    let node = node_for(&server);
    let (tx, mut rx) = mpsc::unbounded_channel();

    node.handle_message(
        r#"{"op":"stats","players":1,"playingPlayers":1,"uptime":1000,"memory":{},"cpu":{}}"#,
        &tx,
    )
    .await;
    node.handle_message(r#"{"op":"somethingNew"}"#, &tx).await;

    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn player_counts_track_attachments() {
    let server = MockServer::start().await;
    let node = node_for(&server);

    node.attach_player();
    node.attach_player();
    node.detach_player();
    node.detach_player();
    node.detach_player();

    assert_eq!(node.player_count(), 0);
}

#[tokio::test]
async fn pool_prefers_the_least_busy_connected_node() {
    let server = MockServer::start().await;
    let pool = NodePool::new();
    let busy = Arc::new(node_for(&server));
    let idle = Arc::new(node_for(&server));
    let offline = Arc::new(node_for(&server));
    pool.add(Arc::clone(&busy)).await;
    pool.add(Arc::clone(&offline)).await;
    pool.add(Arc::clone(&idle)).await;

    assert!(!pool.is_empty().await);
    assert!(pool.best().await.is_none());

    let _busy_events = ready(&busy).await;
    let _idle_events = ready(&idle).await;
    busy.attach_player();

    assert_eq!(pool.len().await, 3);
    assert!(Arc::ptr_eq(&pool.best().await.unwrap(), &idle));
}
