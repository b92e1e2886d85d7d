use std::{collections::HashMap, fs, path::Path, time::Duration};

use client_core::DEFAULT_OPERATION_TIMEOUT;

pub const SETTINGS_FILE: &str = "navctl.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub backend_url: String,
    pub use_in_memory_backend: bool,
    /// 0 disables the timeout.
    pub operation_timeout_ms: u64,
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            backend_url: "http://localhost:8788/api".into(),
            use_in_memory_backend: false,
            operation_timeout_ms: DEFAULT_OPERATION_TIMEOUT.as_millis() as u64,
            log_filter: "info".into(),
        }
    }
}

impl Settings {
    pub fn operation_timeout(&self) -> Option<Duration> {
        (self.operation_timeout_ms > 0).then(|| Duration::from_millis(self.operation_timeout_ms))
    }
}

pub fn load_settings() -> Settings {
    load_settings_from(Path::new(SETTINGS_FILE), |key| std::env::var(key).ok())
}

pub fn load_settings_from(path: &Path, env: impl Fn(&str) -> Option<String>) -> Settings {
    let mut settings = Settings::default();
    if let Ok(raw) = fs::read_to_string(path) {
        apply_file(&mut settings, &raw);
    }
    apply_env(&mut settings, env);
    settings
}

fn apply_file(settings: &mut Settings, raw: &str) {
    let Ok(file_cfg) = toml::from_str::<HashMap<String, String>>(raw) else {
        return;
    };
    if let Some(v) = file_cfg.get("backend_url") {
        settings.backend_url = v.clone();
    }
    if let Some(v) = file_cfg.get("use_in_memory_backend") {
        if let Some(parsed) = parse_flag(v) {
            settings.use_in_memory_backend = parsed;
        }
    }
    if let Some(v) = file_cfg.get("operation_timeout_ms") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.operation_timeout_ms = parsed;
        }
    }
    if let Some(v) = file_cfg.get("log_filter") {
        settings.log_filter = v.clone();
    }
}

fn apply_env(settings: &mut Settings, env: impl Fn(&str) -> Option<String>) {
    if let Some(v) = env("NAVCTL_BACKEND_URL") {
        settings.backend_url = v;
    }
    if let Some(v) = env("APP__BACKEND_URL") {
        settings.backend_url = v;
    }

    for key in ["NAVCTL_IN_MEMORY", "APP__USE_IN_MEMORY_BACKEND"] {
        if let Some(parsed) = env(key).as_deref().and_then(parse_flag) {
            settings.use_in_memory_backend = parsed;
        }
    }

    for key in ["NAVCTL_TIMEOUT_MS", "APP__OPERATION_TIMEOUT_MS"] {
        if let Some(parsed) = env(key).and_then(|v| v.parse::<u64>().ok()) {
            settings.operation_timeout_ms = parsed;
        }
    }

    if let Some(v) = env("APP__LOG_FILTER") {
        settings.log_filter = v;
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
