//! `RpcConfig::load` reads process-wide environment variables, so every test
//! here holds `ENV_LOCK`

use std::env;
use std::fs;
use std::sync::Mutex;

use courier_core::config::CONFIG_PATH_ENV;
use courier_core::{Error, RpcConfig, SerializerKind};

static ENV_LOCK: Mutex<()> = Mutex::new(());

const OVERRIDES: &[&str] = &[
    "COURIER_NAME",
    "COURIER_VERSION",
    "COURIER_SERVER_HOST",
    "COURIER_SERVER_PORT",
    "COURIER_SERIALIZER",
    "COURIER_TRANSPORT",
    "COURIER_TIMEOUT_MS",
    "COURIER_LOG_LEVEL",
];

/// Clears every courier variable on creation and again on drop
struct CleanEnv;

impl CleanEnv {
    fn new() -> Self {
        clear();
        CleanEnv
    }
}

impl Drop for CleanEnv {
    fn drop(&mut self) {
        clear();
    }
}

fn clear() {
    env::remove_var(CONFIG_PATH_ENV);
    for key in OVERRIDES {
        env::remove_var(key);
    }
}

#[test]
fn config_path_variable_selects_the_file() {
    let _lock = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let _env = CleanEnv::new();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("provider.toml");
    fs::write(&path, "name = \"user-provider\"\nserver_port = 8200\n").unwrap();

    env::set_var(CONFIG_PATH_ENV, &path);
    let config = RpcConfig::load(Some("dev")).unwrap();

    assert_eq!(config.name, "user-provider");
    assert_eq!(config.server_port, 8200);
}

#[test]
fn missing_config_path_is_a_config_error() {
    let _lock = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let _env = CleanEnv::new();
    let dir = tempfile::tempdir().unwrap();

    env::set_var(CONFIG_PATH_ENV, dir.path().join("absent.toml"));
    let result = RpcConfig::load(None);

    match result {
        Err(Error::Config(msg)) => assert!(msg.contains(CONFIG_PATH_ENV)),
        other => panic!("Expected Config error, got {:?}", other),
    }
}

#[test]
fn environment_variables_override_the_file() {
    let _lock = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let _env = CleanEnv::new();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("courier.toml");
    fs::write(&path, "server_port = 8200\nserializer = \"bincode\"\n").unwrap();

    env::set_var(CONFIG_PATH_ENV, &path);
    env::set_var("COURIER_SERVER_PORT", "9300");
    env::set_var("COURIER_SERIALIZER", "json");
    env::set_var("COURIER_TIMEOUT_MS", "soon");
    let config = RpcConfig::load(None).unwrap();

    assert_eq!(config.server_port, 9300);
    assert_eq!(config.serializer, SerializerKind::Json);
    assert_eq!(config.timeout_ms, None);
}

#[test]
fn overrides_are_validated() {
    let _lock = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let _env = CleanEnv::new();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("courier.toml");
    fs::write(&path, "server_port = 8200\n").unwrap();

    env::set_var(CONFIG_PATH_ENV, &path);
    env::set_var("COURIER_SERVER_PORT", "0");
    let result = RpcConfig::load(None);

    assert!(matches!(result, Err(Error::Config(_))));
}
