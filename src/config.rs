//! Provider configuration parsed from environment variables.

use crate::services::oauth::Platform;

pub const DEFAULT_APPWRITE_ENDPOINT: &str = "https://fra.cloud.appwrite.io/v1";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

const PLACEHOLDER_PROJECT_ID: &str = "your-project-id";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing project id: set APPWRITE_PROJECT_ID")]
    MissingProjectId,
    #[error("config parse failed: {0}")]
    Parse(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self { request_secs: DEFAULT_REQUEST_TIMEOUT_SECS, connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppwriteConfig {
    pub endpoint: String,
    pub project_id: String,
    pub platform: Platform,
    /// Overrides the platform's default OAuth callback URL.
    pub oauth_callback: Option<String>,
    pub timeouts: Timeouts,
}

impl AppwriteConfig {
    /// Build a config from explicit values, applying the same normalization
    /// and validation as [`AppwriteConfig::from_env`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingProjectId`] for an empty or placeholder id.
    pub fn new(endpoint: &str, project_id: &str, platform: Platform) -> Result<Self, ConfigError> {
        let project_id = validate_project_id(Some(project_id))?;
        Ok(Self {
            endpoint: normalize_endpoint(endpoint),
            project_id,
            platform,
            oauth_callback: None,
            timeouts: Timeouts::default(),
        })
    }

    /// Build typed provider config from environment variables.
    ///
    /// Required:
    /// - `APPWRITE_PROJECT_ID`
    ///
    /// Optional:
    /// - `APPWRITE_ENDPOINT`: default `https://fra.cloud.appwrite.io/v1`
    /// - `BUS_TRACKER_PLATFORM`: `web` (default), `android` or `ios`
    /// - `BUS_TRACKER_OAUTH_CALLBACK`: platform default when absent
    /// - `APPWRITE_REQUEST_TIMEOUT_SECS`: default 30
    /// - `APPWRITE_CONNECT_TIMEOUT_SECS`: default 10
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary variable lookup, using the same keys
    /// as [`AppwriteConfig::from_env`]. Lets callers layer flags over the
    /// environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let project_id = validate_project_id(lookup("APPWRITE_PROJECT_ID").as_deref())?;
        let endpoint = normalize_endpoint(
            &lookup("APPWRITE_ENDPOINT").unwrap_or_else(|| DEFAULT_APPWRITE_ENDPOINT.into()),
        );
        let platform = parse_platform(lookup("BUS_TRACKER_PLATFORM").as_deref())?;
        let oauth_callback = lookup("BUS_TRACKER_OAUTH_CALLBACK")
            .map(|v| v.trim().to_owned())
            .filter(|v| !v.is_empty());
        let timeouts = Timeouts {
            request_secs: parse_u64(lookup("APPWRITE_REQUEST_TIMEOUT_SECS"), DEFAULT_REQUEST_TIMEOUT_SECS),
            connect_secs: parse_u64(lookup("APPWRITE_CONNECT_TIMEOUT_SECS"), DEFAULT_CONNECT_TIMEOUT_SECS),
        };

        Ok(Self { endpoint, project_id, platform, oauth_callback, timeouts })
    }

    /// OAuth callback URL: the explicit override, else the platform default.
    #[must_use]
    pub fn callback_url(&self) -> &str {
        self.oauth_callback
            .as_deref()
            .unwrap_or_else(|| self.platform.default_callback_url())
    }
}

fn normalize_endpoint(raw: &str) -> String {
    raw.trim().trim_end_matches('/').to_owned()
}

fn validate_project_id(raw: Option<&str>) -> Result<String, ConfigError> {
    match raw.map(str::trim) {
        Some(id) if !id.is_empty() && id != PLACEHOLDER_PROJECT_ID => Ok(id.to_owned()),
        _ => Err(ConfigError::MissingProjectId),
    }
}

pub(crate) fn parse_platform(raw: Option<&str>) -> Result<Platform, ConfigError> {
    match raw.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
        None | Some("" | "web") => Ok(Platform::Web),
        Some("android") => Ok(Platform::Android),
        Some("ios") => Ok(Platform::Ios),
        Some(other) => Err(ConfigError::Parse(format!(
            "unknown BUS_TRACKER_PLATFORM '{other}' (expected 'web', 'android' or 'ios')"
        ))),
    }
}

fn parse_u64(raw: Option<String>, default: u64) -> u64 {
    raw.and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
