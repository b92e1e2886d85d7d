use super::*;

use std::{
    env,
    time::{SystemTime, UNIX_EPOCH},
};

fn no_env(_: &str) -> Option<String> {
    None
}

#[test]
fn defaults_use_the_http_backend_with_fifteen_second_timeout() {
    let settings = load_settings_from(Path::new("/nonexistent/navctl.toml"), no_env);
    assert_eq!(settings, Settings::default());
    assert!(!settings.use_in_memory_backend);
    assert_eq!(settings.operation_timeout(), Some(Duration::from_secs(15)));
}

#[test]
fn file_keys_override_defaults() {
    let mut settings = Settings::default();
    apply_file(
        &mut settings,
        r#"
backend_url = "https://nav.example/api"
use_in_memory_backend = "yes"
operation_timeout_ms = "2500"
log_filter = "client_core=debug"
"#,
    );
    assert_eq!(settings.backend_url, "https://nav.example/api");
    assert!(settings.use_in_memory_backend);
    assert_eq!(settings.operation_timeout(), Some(Duration::from_millis(2500)));
    assert_eq!(settings.log_filter, "client_core=debug");
}

#[test]
fn malformed_file_and_values_are_ignored() {
    let mut settings = Settings::default();
    apply_file(&mut settings, "this is = not [toml");
    apply_file(&mut settings, "operation_timeout_ms = \"soon\"");
    assert_eq!(settings, Settings::default());
}

#[test]
fn app_prefixed_env_wins_over_short_names() {
    let mut settings = Settings::default();
    apply_env(&mut settings, |key| match key {
        "NAVCTL_BACKEND_URL" => Some("http://short.example/api".into()),
        "APP__BACKEND_URL" => Some("http://app.example/api".into()),
        "NAVCTL_TIMEOUT_MS" => Some("0".into()),
        "NAVCTL_IN_MEMORY" => Some("true".into()),
        _ => None,
    });
    assert_eq!(settings.backend_url, "http://app.example/api");
    assert!(settings.use_in_memory_backend);
    assert_eq!(settings.operation_timeout(), None);
}

#[test]
fn env_overrides_file() {
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let path = env::temp_dir().join(format!("navctl_config_test_{suffix}.toml"));
    fs::write(&path, "backend_url = \"http://file.example/api\"\n").expect("write config");

    let from_file = load_settings_from(&path, no_env);
    assert_eq!(from_file.backend_url, "http://file.example/api");
    let overridden = load_settings_from(&path, |key| {
        (key == "APP__LOG_FILTER").then(|| "warn".to_string())
    });
    assert_eq!(overridden.backend_url, "http://file.example/api");
    assert_eq!(overridden.log_filter, "warn");

    fs::remove_file(path).expect("cleanup");
}
