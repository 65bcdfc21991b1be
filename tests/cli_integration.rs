//! CLI integration tests.
//!
//! These verify the CLI argument parsing and configuration loading.

use std::ffi::OsString;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;
use tempfile::NamedTempFile;

use mvc_dispatch::cli::{parse_args_from, Args};
use mvc_dispatch::config::Config;

fn args(args: &[&str]) -> Vec<OsString> {
    std::iter::once("mvc-dispatch")
        .chain(args.iter().copied())
        .map(OsString::from)
        .collect()
}

fn config_file(json: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(json.as_bytes()).unwrap();
    file
}

// ============================================================================
// CLI Argument Tests
// ============================================================================

#[test]
fn test_cli_full_options() {
    let result = parse_args_from(args(&[
        "-H",
        "0.0.0.0",
        "-p",
        "8080",
        "-r",
        "/srv/site",
        "-d",
        "home",
        "-l",
        "debug",
    ]))
    .unwrap();

    assert_eq!(result.host.unwrap().to_string(), "0.0.0.0");
    assert_eq!(result.port, Some(8080));
    assert_eq!(result.root, Some(PathBuf::from("/srv/site")));
    assert_eq!(result.default_controller.as_deref(), Some("home"));
    assert_eq!(result.log_level.as_deref(), Some("debug"));
}

#[test]
fn test_cli_unknown_flag() {
    assert!(parse_args_from(args(&["--no-such-flag"])).is_err());
}

#[test]
fn test_cli_missing_value() {
    assert!(parse_args_from(args(&["--port"])).is_err());
}

// ============================================================================
// Configuration Priority Tests
// ============================================================================

#[test]
fn test_file_then_cli_priority() {
    let file = config_file(
        r#"{
            "server": { "host": "0.0.0.0", "port": 8000, "graceful_shutdown": false },
            "dispatch": { "app_root": "/from/file", "default_controller": "file" },
            "logging": { "level": "warn" }
        }"#,
    );

    let mut config = Config::from_file(file.path()).unwrap();
    let cli = Args {
        port: Some(9000),
        default_controller: Some("cli".to_string()),
        ..Args::default()
    };
    config.apply_args(&cli);

    assert_eq!(config.server.host, "0.0.0.0");
    assert_eq!(config.server.port, 9000);
    assert_eq!(config.dispatch.app_root, Some(PathBuf::from("/from/file")));
    assert_eq!(config.dispatch.default_controller.as_deref(), Some("cli"));
    assert_eq!(config.log_filter(), "warn");

    let server = config.to_server_config().unwrap();
    assert!(!server.graceful_shutdown);
    assert_eq!(server.bind_address(), "0.0.0.0:9000");
}

#[test]
fn test_dispatch_settings_from_file() {
    let file = config_file(
        r#"{
            "dispatch": {
                "app_root": "site",
                "session_cookie": "SID",
                "session_timeout_secs": 120,
                "sweep_interval_secs": 10,
                "max_body_bytes": 1024
            }
        }"#,
    );

    let config = Config::from_file(file.path()).unwrap();
    let dispatch = config.to_dispatch_config().unwrap();
    assert_eq!(dispatch.app_root, PathBuf::from("site"));
    assert_eq!(dispatch.session_cookie, "SID");
    assert_eq!(dispatch.session_timeout, Duration::from_secs(120));

    let server = config.to_server_config().unwrap();
    assert_eq!(server.sweep_interval, Duration::from_secs(10));
    assert_eq!(server.max_body_bytes, 1024);
}

#[test]
fn test_missing_config_file() {
    let cli = Args {
        config: Some(PathBuf::from("/definitely/not/here.json")),
        ..Args::default()
    };
    let err = Config::load(&cli).unwrap_err();
    assert!(err.to_string().starts_with("failed to read config file"));
}

#[test]
fn test_empty_session_cookie_rejected() {
    let file = config_file(r#"{ "dispatch": { "session_cookie": "" } }"#);
    let config = Config::from_file(file.path()).unwrap();
    assert!(config.to_dispatch_config().is_err());
}
