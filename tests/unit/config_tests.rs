use std::collections::HashMap;
use std::time::Duration;

use dismusic::commands::music::utils::search::Provider;
use dismusic::config::{Config, ConfigError};
use dismusic::lavalink::NodeConfig;

use crate::{assert_eq, assert_matches, test_case};

fn load(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
    let vars: HashMap<&str, &str> = pairs.iter().copied().collect();
    Config::from_lookup(|key| vars.get(key).map(|v| v.to_string()))
}

#[test]
fn reads_every_setting() {
    let config = load(&[
        ("DISCORD_TOKEN", "token"),
        ("DISMUSIC_TIMEOUT", "60"),
        ("DISMUSIC_SEARCH_TIMEOUT", "5"),
        ("DISMUSIC_PROVIDER", "soundcloud"),
        (
            "LAVALINK_NODES",
            r#"[{"host":"lava.example","port":443,"password":"pw","secure":true,"identifier":"main"},
                {"host":"backup","port":2333,"password":"pw2"}]"#,
        ),
        ("SPOTIFY_CLIENT_ID", "id"),
        ("SPOTIFY_CLIENT_SECRET", "secret"),
    ])
    .unwrap();

    assert_eq!(config.discord_token, "token");
    assert_eq!(config.idle_timeout, Duration::from_secs(60));
    assert_eq!(config.search_timeout, Duration::from_secs(5));
    assert_eq!(config.default_provider, Provider::SoundCloud);
    assert_eq!(config.nodes.len(), 2);
    assert_eq!(config.nodes[0].identifier(), "main");
    assert!(config.nodes[0].secure);
    assert_eq!(config.nodes[1].identifier(), "backup:2333");
    assert!(config.spotify.is_some());
}

#[test]
fn single_local_node_by_default() {
    let config = load(&[("DISCORD_TOKEN", "token")]).unwrap();

    assert_eq!(config.nodes, vec![NodeConfig::default()]);
    assert_eq!(config.nodes[0].identifier(), "localhost:2333");
}

#[test]
fn spotify_needs_both_credentials() {
    let config = load(&[("DISCORD_TOKEN", "token"), ("SPOTIFY_CLIENT_ID", "id")]).unwrap();

    assert!(config.spotify.is_none());
}

#[test_case("DISMUSIC_TIMEOUT", "soon" ; "non numeric timeout")]
#[test_case("DISMUSIC_SEARCH_TIMEOUT", "-1" ; "negative search timeout")]
#[test_case("DISMUSIC_PROVIDER", "bandcamp" ; "unknown provider")]
#[test_case("LAVALINK_NODES", "not json" ; "malformed nodes")]
fn invalid_values_are_reported(key: &str, value: &str) {
    let result = load(&[("DISCORD_TOKEN", "token"), (key, value)]);

    assert_matches!(result, Err(ConfigError::Invalid { key: k, .. }) if k == key);
}
