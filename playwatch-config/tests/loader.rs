use std::fs;
use std::time::Duration;

use playwatch_config::{
    ConfigGuardRailError, ConfigLoadError, ConfigLoader, PollerConfig,
    PollerConfigSource,
};
use playwatch_model::ServerType;
use tempfile::TempDir;

const TOML_CONFIG: &str = r#"
poll_interval = "10s"
fetch_timeout = "4s"

[[servers]]
id = "plex-main"
name = "Basement Plex"
type = "plex"
url = "http://192.168.1.10:32400"
token = "plex-token"

[[servers]]
id = "emby"
type = "emby"
url = "https://emby.example.net"
token = "emby-token"
enabled = false
"#;

fn write(dir: &TempDir, name: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).unwrap();
    path
}

fn loader_for(dir: &TempDir, config: &std::path::Path) -> ConfigLoader {
    ConfigLoader::new()
        .with_env_file(dir.path().join("missing.env"))
        .with_config_path(config)
}

#[test]
fn loads_toml_file_with_warnings() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "playwatch.toml", TOML_CONFIG);

    let load = loader_for(&dir, &path).load().unwrap();

    assert_eq!(load.source, PollerConfigSource::File(path));
    assert!(!load.env_file_loaded);
    assert_eq!(load.config.poll_interval, Duration::from_secs(10));
    assert_eq!(load.config.fetch_timeout, Duration::from_secs(4));
    assert_eq!(load.config.resume_window, Duration::from_secs(60));
    assert_eq!(load.config.servers.len(), 2);
    assert_eq!(load.config.servers[0].display_name(), "Basement Plex");
    assert_eq!(load.config.servers[1].server_type, ServerType::Emby);

    let enabled: Vec<_> = load.config.enabled_servers().map(|s| s.id.as_str()).collect();
    assert_eq!(enabled, ["plex-main"]);
    assert!(
        load.warnings
            .iter()
            .any(|warning| warning.message.contains("'emby' is disabled"))
    );
}

#[test]
fn loads_json_file() {
    let dir = TempDir::new().unwrap();
    let path = write(
        &dir,
        "playwatch.json",
        r#"{
            "poll_interval": "30s",
            "resume_window": "5m",
            "servers": [
                {"id": "jf", "type": "jellyfin", "url": "http://jf:8096", "token": "t"}
            ]
        }"#,
    );

    let load = loader_for(&dir, &path).load().unwrap();
    assert_eq!(load.config.poll_interval, Duration::from_secs(30));
    assert_eq!(load.config.resume_window, Duration::from_secs(300));
    assert_eq!(load.config.poll_settings().resume_window, Duration::from_secs(300));
    assert!(load.warnings.is_empty());
}

#[test]
fn extensionless_file_accepts_either_format() {
    let dir = TempDir::new().unwrap();
    let toml_path = write(&dir, "poller-conf", TOML_CONFIG);
    let json_path = write(&dir, "poller-json", r#"{"poll_interval": 20}"#);

    let from_toml = PollerConfig::load_from_file(&toml_path).unwrap();
    assert_eq!(from_toml.servers.len(), 2);

    let from_json = PollerConfig::load_from_file(&json_path).unwrap();
    assert_eq!(from_json.poll_interval, Duration::from_secs(20));
}

#[test]
fn env_file_is_loaded_when_present() {
    let dir = TempDir::new().unwrap();
    let config = write(&dir, "playwatch.toml", TOML_CONFIG);
    let env_file = write(&dir, ".env", "PLAYWATCH_TEST_ONLY_MARKER=1\n");

    let load = ConfigLoader::new()
        .with_env_file(env_file)
        .with_config_path(config)
        .load()
        .unwrap();
    assert!(load.env_file_loaded);
}

#[test]
fn guard_rails_surface_as_load_errors() {
    let dir = TempDir::new().unwrap();
    let path = write(
        &dir,
        "dupes.toml",
        r#"
        [[servers]]
        id = "a"
        type = "plex"
        url = "http://one:32400"

        [[servers]]
        id = "a"
        type = "jellyfin"
        url = "http://two:8096"
        "#,
    );

    let err = loader_for(&dir, &path).load().unwrap_err();
    assert!(matches!(
        err,
        ConfigLoadError::GuardRail(ConfigGuardRailError::DuplicateServerId { .. })
    ));
}

#[test]
fn missing_or_malformed_files_are_errors() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("nope.toml");
    assert!(matches!(
        loader_for(&dir, &missing).load(),
        Err(ConfigLoadError::MissingConfigFile { .. })
    ));

    let broken = write(&dir, "broken.toml", "servers = [");
    assert!(matches!(
        loader_for(&dir, &broken).load(),
        Err(ConfigLoadError::Poller(_))
    ));

    let unknown_vendor = write(
        &dir,
        "vendor.json",
        r#"{"servers": [{"id": "x", "type": "kodi", "url": "http://x"}]}"#,
    );
    assert!(PollerConfig::load_from_file(&unknown_vendor).is_err());
}
