use std::env;
use std::sync::{Mutex, OnceLock};

use deskvoice_cli::commands::{ask, migrate, seed, voice};
use serde_json::Value;
use tempfile::TempDir;

#[test]
fn migrate_returns_success_with_valid_env() {
    let dir = TempDir::new().expect("temp dir");
    with_env(&[("DESKVOICE_DATABASE_URL", &database_url(&dir))], || {
        let result = migrate::run();
        assert_eq!(result.exit_code, 0, "expected successful migrate run");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "migrate");
        assert_eq!(payload["status"], "ok");
    });
}

#[test]
fn migrate_reports_config_failure_for_bad_override() {
    with_env(&[("DESKVOICE_DATABASE_MAX_CONNECTIONS", "many")], || {
        let result = migrate::run();
        assert_eq!(result.exit_code, 2, "expected config validation failure code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "config_validation");
    });
}

#[test]
fn seed_inserts_dummy_data_once() {
    let dir = TempDir::new().expect("temp dir");
    with_env(&[("DESKVOICE_DATABASE_URL", &database_url(&dir))], || {
        let first = parse_payload(&seed::run().output);
        assert_eq!(first["status"], "ok");
        assert_eq!(first["data"]["knowledge_created"], 3);
        assert_eq!(first["data"]["tickets_created"], 3);

        let second = parse_payload(&seed::run().output);
        assert_eq!(second["data"]["tickets_created"], 0);
        assert_eq!(second["message"], "dummy data already present; nothing inserted");
    });
}

#[test]
fn ask_answers_from_seeded_runbook() {
    let dir = TempDir::new().expect("temp dir");
    with_env(&[("DESKVOICE_DATABASE_URL", &database_url(&dir))], || {
        let result = ask::run("vpn not connecting");
        assert_eq!(result.exit_code, 0);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "ask");
        assert_eq!(payload["data"]["action"], "knowledge_search");
        assert!(payload["message"]
            .as_str()
            .unwrap_or_default()
            .starts_with("I found 'VPN not connecting'."));
    });
}

#[test]
fn ask_reports_missing_ticket_in_envelope() {
    let dir = TempDir::new().expect("temp dir");
    with_env(&[("DESKVOICE_DATABASE_URL", &database_url(&dir))], || {
        let payload = parse_payload(&ask::run("check ticket 404").output);

        assert_eq!(payload["status"], "ok");
        assert_eq!(payload["data"]["action"], "ticket_status");
        assert_eq!(payload["message"], "Ticket 404 not found");
    });
}

#[test]
fn ask_output_stays_a_single_json_line_with_debug_logging() {
    let dir = TempDir::new().expect("temp dir");
    with_env(
        &[
            ("DESKVOICE_DATABASE_URL", &database_url(&dir)),
            ("DESKVOICE_LOG_LEVEL", "debug"),
            ("DESKVOICE_LOG_FORMAT", "json"),
        ],
        || {
            let result = ask::run("create ticket for broken keyboard");
            assert_eq!(result.exit_code, 0);
            assert_eq!(result.output.lines().count(), 1);

            let payload = parse_payload(&result.output);
            assert_eq!(payload["command"], "ask");
            assert_eq!(payload["data"]["action"], "ticket_create");
        },
    );
}

#[test]
fn ask_rejects_short_utterance() {
    let result = ask::run(" x ");
    assert_eq!(result.exit_code, 2);
    assert_eq!(parse_payload(&result.output)["error_class"], "validation");
}

#[test]
fn voice_fails_fast_without_credential() {
    let dir = TempDir::new().expect("temp dir");
    with_env(&[("DESKVOICE_DATABASE_URL", &database_url(&dir))], || {
        let result = voice::run();
        assert_eq!(result.exit_code, 2);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "voice");
        assert_eq!(payload["error_class"], "config_validation");
        assert!(!dir.path().join("itsd.db").exists(), "no database work before the credential check");
    });
}

#[test]
fn voice_reports_transport_failure_when_peer_is_unreachable() {
    let dir = TempDir::new().expect("temp dir");
    with_env(
        &[
            ("DESKVOICE_DATABASE_URL", &database_url(&dir)),
            ("DESKVOICE_REALTIME_API_KEY", "xai-test"),
            ("DESKVOICE_REALTIME_URL", "ws://127.0.0.1:9/realtime"),
        ],
        || {
            let result = voice::run();
            let payload = parse_payload(&result.output);

            assert_eq!(result.exit_code, 7);
            assert_eq!(payload["error_class"], "realtime_transport");
        },
    );
}

fn database_url(dir: &TempDir) -> String {
    format!("sqlite://{}?mode=rwc", dir.path().join("itsd.db").display())
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid json")
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard =
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().expect("env mutex should not be poisoned");

    let keys = [
        "DESKVOICE_DATABASE_URL",
        "DATABASE_URL",
        "DESKVOICE_DATABASE_MAX_CONNECTIONS",
        "DESKVOICE_DATABASE_TIMEOUT_SECS",
        "DESKVOICE_REALTIME_ENABLED",
        "DESKVOICE_REALTIME_API_KEY",
        "DESKVOICE_REALTIME_URL",
        "DESKVOICE_REALTIME_MODEL",
        "DESKVOICE_REALTIME_TOOL_TIMEOUT_SECS",
        "GROK_API_KEY",
        "GROK_MODEL",
        "GROK_REALTIME_URL",
        "DESKVOICE_SERVER_BIND_ADDRESS",
        "DESKVOICE_SERVER_PORT",
        "DESKVOICE_LOGGING_LEVEL",
        "DESKVOICE_LOGGING_FORMAT",
        "DESKVOICE_LOG_LEVEL",
        "DESKVOICE_LOG_FORMAT",
    ];

    let previous_values: Vec<(&str, Option<String>)> =
        keys.iter().map(|key| (*key, env::var(key).ok())).collect();

    for key in &keys {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    test_fn();

    for (key, value) in previous_values {
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
    }
}
