//! Inputs supplied by the embedding Telegram host.

use serde::Deserialize;
use shared::domain::Language;

pub const INIT_DATA_ENV: &str = "TELEGRAM_INIT_DATA";
pub const LOCALE_ENV: &str = "TELEGRAM_LOCALE";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostContext {
    init_data: Option<String>,
    locale_hint: Option<String>,
}

/// The `user` object embedded in init data. Only read for the locale hint;
/// identity is always established by the backend.
#[derive(Debug, Clone, Deserialize)]
pub struct InitDataUser {
    pub id: i64,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub language_code: Option<String>,
}

impl HostContext {
    pub fn new(init_data: Option<String>, locale_hint: Option<String>) -> Self {
        Self {
            init_data: non_empty(init_data),
            locale_hint: non_empty(locale_hint),
        }
    }

    pub fn from_env() -> Self {
        Self::new(
            std::env::var(INIT_DATA_ENV).ok(),
            std::env::var(LOCALE_ENV).ok(),
        )
    }

    pub fn init_data(&self) -> Option<&str> {
        self.init_data.as_deref()
    }

    pub fn locale_hint(&self) -> Option<&str> {
        self.locale_hint.as_deref()
    }

    pub fn init_data_user(&self) -> Option<InitDataUser> {
        self.init_data.as_deref().and_then(parse_init_data_user)
    }

    /// Explicit hint first, then the `language_code` of the init-data user.
    pub fn host_language_code(&self) -> Option<String> {
        self.locale_hint
            .clone()
            .or_else(|| self.init_data_user().and_then(|user| user.language_code))
    }

    pub fn detect_language(&self) -> Language {
        let system = std::env::var("LANG").ok();
        self.detect_language_with(system.as_deref())
    }

    pub fn detect_language_with(&self, system_lang: Option<&str>) -> Language {
        self.host_language_code()
            .as_deref()
            .and_then(Language::from_tag)
            .or_else(|| system_lang.and_then(Language::from_tag))
            .unwrap_or_default()
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|raw| raw.trim().to_string())
        .filter(|raw| !raw.is_empty())
}

/// Init data is a URL-encoded query string; `user` holds a JSON object.
pub fn parse_init_data_user(init_data: &str) -> Option<InitDataUser> {
    url::form_urlencoded::parse(init_data.as_bytes())
        .find(|(key, _)| key == "user")
        .and_then(|(_, value)| serde_json::from_str(&value).ok())
}
