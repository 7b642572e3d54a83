// Client configuration. Built once at startup (from flags, the environment or
// explicit arguments) and handed to `ApiClient::new`; nothing below this layer
// reads the process environment.

use std::time::Duration;

use crate::error::{BeeminderError, Result};

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;

pub const DEFAULT_BASE_URL: &str = "https://www.beeminder.com/api/v1";
pub const DEFAULT_WEB_URL: &str = "https://www.beeminder.com";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

pub const API_KEY_VAR: &str = "BEEMINDER_API_KEY";
pub const USERNAME_VAR: &str = "BEEMINDER_USERNAME";
pub const BASE_URL_VAR: &str = "BEEMINDER_BASE_URL";

/// Username alias the service resolves to the owner of the API key.
pub const SELF_ALIAS: &str = "me";

#[derive(Clone, Debug)]
pub struct Config {
    api_key: String,
    username: Option<String>,
    base_url: String,
    web_url: String,
    timeout: Duration,
}

impl Config {
    /// Validate credentials. The API key must be non-blank; a blank username
    /// is treated as absent.
    pub fn new(api_key: impl Into<String>, username: Option<String>) -> Result<Self> {
        let api_key = api_key.into().trim().to_string();
        if api_key.is_empty() {
            return Err(BeeminderError::Configuration(format!(
                "{API_KEY_VAR} is not set; export it or pass --api-key"
            )));
        }
        let username = username
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty());

        Ok(Config {
            api_key,
            username,
            base_url: DEFAULT_BASE_URL.to_string(),
            web_url: DEFAULT_WEB_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        })
    }

    /// Read `BEEMINDER_API_KEY`, `BEEMINDER_USERNAME` and `BEEMINDER_BASE_URL`.
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Same as [`Config::from_env`] with an injectable variable lookup.
    pub fn from_vars<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = Config::new(lookup(API_KEY_VAR).unwrap_or_default(), lookup(USERNAME_VAR))?;
        Ok(match lookup(BASE_URL_VAR).filter(|u| !u.trim().is_empty()) {
            Some(url) => config.with_base_url(url),
            None => config,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_web_url(mut self, web_url: impl Into<String>) -> Self {
        self.web_url = web_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Pick the user for a call: explicit override, then the configured
    /// default, then the `me` alias.
    pub fn resolve_user<'a>(&'a self, user: Option<&'a str>) -> &'a str {
        user.filter(|u| !u.is_empty())
            .or(self.username.as_deref())
            .unwrap_or(SELF_ALIAS)
    }

    /// Public page of a user, or of one of their goals.
    pub fn profile_url(&self, username: &str, slug: Option<&str>) -> String {
        match slug {
            Some(slug) => format!("{}/{}/{}", self.web_url, username, slug),
            None => format!("{}/{}", self.web_url, username),
        }
    }
}
