use std::{
    fs, io,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::Context;
use client_core::{
    config::{DEFAULT_API_BASE_URL, DEFAULT_REQUEST_TIMEOUT},
    ClientConfig, FileSessionStorage,
};
use serde::Deserialize;

pub const DEFAULT_CONFIG_FILE: &str = "miniapp.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub api_base_url: String,
    pub request_timeout_secs: u64,
    pub session_path: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.into(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT.as_secs(),
            session_path: None,
        }
    }
}

impl Settings {
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig::new(self.api_base_url.trim())
            .with_timeout(Duration::from_secs(self.request_timeout_secs))
    }

    pub fn session_path(&self) -> anyhow::Result<PathBuf> {
        match &self.session_path {
            Some(path) => Ok(path.clone()),
            None => FileSessionStorage::default_path().context("failed to resolve session file location"),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    api_base_url: Option<String>,
    request_timeout_secs: Option<u64>,
    session_path: Option<PathBuf>,
}

/// Defaults, then the config file, then the environment.
pub fn load_settings(config_path: Option<&Path>) -> anyhow::Result<Settings> {
    load_settings_with(config_path, |key| std::env::var(key).ok())
}

/// An explicitly named config file must exist; the default one is optional.
pub fn load_settings_with(
    config_path: Option<&Path>,
    env: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    let (path, required) = match config_path {
        Some(path) => (path.to_path_buf(), true),
        None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
    };
    match fs::read_to_string(&path) {
        Ok(raw) => {
            let file: FileSettings = toml::from_str(&raw)
                .with_context(|| format!("failed to parse config file '{}'", path.display()))?;
            if let Some(v) = file.api_base_url {
                settings.api_base_url = v;
            }
            if let Some(v) = file.request_timeout_secs {
                settings.request_timeout_secs = v;
            }
            if let Some(v) = file.session_path {
                settings.session_path = Some(v);
            }
        }
        Err(err) if !required && err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => {
            return Err(err)
                .with_context(|| format!("failed to read config file '{}'", path.display()))
        }
    }

    if let Some(v) = env("MINIAPP_API_URL") {
        settings.api_base_url = v;
    }
    if let Some(v) = env("APP__API_BASE_URL") {
        settings.api_base_url = v;
    }
    if let Some(v) = env("APP__REQUEST_TIMEOUT_SECS") {
        settings.request_timeout_secs = v
            .trim()
            .parse()
            .with_context(|| format!("APP__REQUEST_TIMEOUT_SECS must be whole seconds, got '{v}'"))?;
    }
    if let Some(v) = env("APP__SESSION_PATH") {
        settings.session_path = Some(PathBuf::from(v));
    }

    anyhow::ensure!(
        settings.request_timeout_secs > 0,
        "request timeout must be at least one second"
    );
    Ok(settings)
}
