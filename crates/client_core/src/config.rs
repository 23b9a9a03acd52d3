use std::{collections::HashMap, fs, path::Path, time::Duration};

use thiserror::Error;
use url::Url;

pub const SETTINGS_FILE: &str = "embconv.toml";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("invalid server url '{url}': {source}")]
    InvalidServerUrl {
        url: String,
        source: url::ParseError,
    },
    #[error("failed to build http client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub server_url: String,
    pub request_timeout_secs: u64,
    pub max_upload_bytes: usize,
    pub default_format: String,
    pub surface_width: f32,
    pub surface_height: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:5000".into(),
            request_timeout_secs: 60,
            max_upload_bytes: 16 * 1024 * 1024,
            default_format: "pes".into(),
            surface_width: 400.0,
            surface_height: 400.0,
        }
    }
}

impl Settings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    /// Base URL with a trailing slash so endpoint paths join beneath it.
    pub fn base_url(&self) -> Result<Url, SettingsError> {
        let normalized = normalize_server_url(&self.server_url);
        Url::parse(&format!("{normalized}/")).map_err(|source| SettingsError::InvalidServerUrl {
            url: self.server_url.clone(),
            source,
        })
    }
}

pub fn load_settings() -> Settings {
    let mut settings = Settings::default();
    apply_file(&mut settings, Path::new(SETTINGS_FILE));
    apply_env(&mut settings, |key| std::env::var(key).ok());
    settings
}

fn apply_file(settings: &mut Settings, path: &Path) {
    let Ok(raw) = fs::read_to_string(path) else {
        return;
    };
    match toml::from_str::<HashMap<String, toml::Value>>(&raw) {
        Ok(file_cfg) => apply_values(settings, |key| {
            file_cfg.get(key).map(|value| match value {
                toml::Value::String(s) => s.clone(),
                other => other.to_string(),
            })
        }),
        Err(err) => tracing::warn!("ignoring malformed {}: {err}", path.display()),
    }
}

fn apply_values(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup("server_url") {
        settings.server_url = normalize_server_url(&v);
    }
    if let Some(v) = lookup("request_timeout_secs").and_then(|v| v.parse().ok()) {
        settings.request_timeout_secs = v;
    }
    if let Some(v) = lookup("max_upload_bytes").and_then(|v| v.parse().ok()) {
        settings.max_upload_bytes = v;
    }
    if let Some(v) = lookup("default_format") {
        settings.default_format = v.trim().to_string();
    }
    if let Some(v) = lookup("surface_width").and_then(|v| v.parse().ok()) {
        settings.surface_width = v;
    }
    if let Some(v) = lookup("surface_height").and_then(|v| v.parse().ok()) {
        settings.surface_height = v;
    }
}

fn apply_env(settings: &mut Settings, env: impl Fn(&str) -> Option<String>) {
    if let Some(v) = env("EMBCONV_SERVER_URL") {
        settings.server_url = normalize_server_url(&v);
    }
    apply_values(settings, |key| env(&format!("APP__{}", key.to_ascii_uppercase())));
}

pub fn normalize_server_url(raw: &str) -> String {
    let raw = raw.trim();
    if raw.is_empty() {
        return Settings::default().server_url;
    }

    let with_scheme = if raw.contains("://") {
        raw.to_string()
    } else {
        format!("http://{raw}")
    };
    with_scheme.trim_end_matches('/').to_string()
}
