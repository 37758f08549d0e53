use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::Context;
use client_core::ClientSettings;
use serde::Deserialize;

pub const CONFIG_FILE_NAME: &str = "graph_admin.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub api_base_url: String,
    pub app_name: String,
    pub auth_token: Option<String>,
    pub request_timeout_secs: u64,
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: "http://127.0.0.1:8080".into(),
            app_name: "visualizer2App".into(),
            auth_token: None,
            request_timeout_secs: 30,
            log_filter: "info".into(),
        }
    }
}

/// Keys accepted in `graph_admin.toml`; anything missing keeps its default.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileSettings {
    pub api_base_url: Option<String>,
    pub app_name: Option<String>,
    pub auth_token: Option<String>,
    pub request_timeout_secs: Option<u64>,
    pub log_filter: Option<String>,
}

impl Settings {
    pub fn apply_file(&mut self, file: FileSettings) {
        if let Some(v) = file.api_base_url {
            self.api_base_url = v;
        }
        if let Some(v) = file.app_name {
            self.app_name = v;
        }
        if let Some(v) = file.auth_token {
            self.auth_token = Some(v);
        }
        if let Some(v) = file.request_timeout_secs {
            self.request_timeout_secs = v;
        }
        if let Some(v) = file.log_filter {
            self.log_filter = v;
        }
    }

    /// Applies `APP__*` overrides. Empty values are ignored, as are timeouts that
    /// do not parse.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let read = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        if let Some(v) = read("GRAPH_ADMIN_API_URL") {
            self.api_base_url = v;
        }
        if let Some(v) = read("APP__API_BASE_URL") {
            self.api_base_url = v;
        }
        if let Some(v) = read("APP__APP_NAME") {
            self.app_name = v;
        }
        if let Some(v) = read("APP__AUTH_TOKEN") {
            self.auth_token = Some(v);
        }
        if let Some(v) = read("APP__REQUEST_TIMEOUT_SECS") {
            if let Ok(parsed) = v.trim().parse::<u64>() {
                self.request_timeout_secs = parsed;
            }
        }
        if let Some(v) = read("APP__LOG_FILTER") {
            self.log_filter = v;
        }
    }

    pub fn client_settings(&self) -> ClientSettings {
        ClientSettings {
            base_url: self.api_base_url.clone(),
            app_name: self.app_name.clone(),
            auth_token: self.auth_token.clone(),
            request_timeout: Duration::from_secs(self.request_timeout_secs.max(1)),
        }
    }
}

pub fn parse_file_settings(raw: &str) -> Result<FileSettings, toml::de::Error> {
    toml::from_str(raw)
}

/// Defaults, then the config file, then environment overrides.
pub fn load_settings(explicit_path: Option<&Path>) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    if let Some(path) = resolve_config_path(explicit_path) {
        let raw = fs::read_to_string(&path)
            .with_context(|| format!("failed to read config file '{}'", path.display()))?;
        let file = parse_file_settings(&raw)
            .with_context(|| format!("invalid config file '{}'", path.display()))?;
        settings.apply_file(file);
    }

    settings.apply_env(|name| std::env::var(name).ok());
    Ok(settings)
}

/// An explicit path is always used, so a missing explicit file is an error.
fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return Some(path.to_path_buf());
    }

    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.is_file() {
        return Some(local);
    }

    dirs::config_dir()
        .map(|dir| dir.join("graph_admin").join(CONFIG_FILE_NAME))
        .filter(|path| path.is_file())
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
