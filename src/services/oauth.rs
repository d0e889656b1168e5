//! OAuth redirect plumbing: callback URLs, authorize URL, redirect parsing.
//!
//! ARCHITECTURE
//! ============
//! The provider finishes OAuth by redirecting to a callback URL with a
//! one-time `userId` + `secret` pair, which the client exchanges for a
//! session. Getting the user through the browser and back is delegated to an
//! [`OAuthBrowser`], so a CLI can ask for the pasted redirect while a GUI
//! shell can intercept it directly.

use std::fmt;

use reqwest::Url;

use super::auth::{AuthFailure, ErrorKind};

/// OAuth provider identifier for Google on the identity service.
pub const GOOGLE_PROVIDER: &str = "google";

const WEB_CALLBACK_URL: &str = "http://localhost:19006";
const ANDROID_CALLBACK_URL: &str = "https://auth.bustracker.app/oauth2redirect";
const DEFAULT_CALLBACK_URL: &str = "exp://127.0.0.1:19000/--/";

// =============================================================================
// PLATFORM
// =============================================================================

/// Client platform, which decides where the provider redirects after OAuth.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Web,
    Android,
    Ios,
}

impl Platform {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Web => "web",
            Self::Android => "android",
            Self::Ios => "ios",
        }
    }

    #[must_use]
    pub fn default_callback_url(self) -> &'static str {
        match self {
            Self::Web => WEB_CALLBACK_URL,
            Self::Android => ANDROID_CALLBACK_URL,
            Self::Ios => DEFAULT_CALLBACK_URL,
        }
    }

    /// Success and failure redirect targets for `base`.
    ///
    /// Android registers distinct `/success` and `/failure` paths; other
    /// platforms send both outcomes to the same URL.
    #[must_use]
    pub fn callback_urls(self, base: &str) -> CallbackUrls {
        match self {
            Self::Android => {
                let base = base.trim_end_matches('/');
                CallbackUrls { success: format!("{base}/success"), failure: format!("{base}/failure") }
            }
            Self::Web | Self::Ios => CallbackUrls { success: base.to_owned(), failure: base.to_owned() },
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackUrls {
    pub success: String,
    pub failure: String,
}

// =============================================================================
// AUTHORIZE URL
// =============================================================================

/// Build the provider URL that starts an OAuth token flow.
///
/// # Errors
///
/// Returns an [`ErrorKind::OAuthMisconfigured`] failure if `endpoint` is not a
/// valid absolute URL.
pub fn authorize_url(
    endpoint: &str,
    project_id: &str,
    provider: &str,
    callbacks: &CallbackUrls,
) -> Result<Url, AuthFailure> {
    let raw = format!("{}/account/tokens/oauth2/{provider}", endpoint.trim_end_matches('/'));
    let mut url = Url::parse(&raw).map_err(|e| {
        AuthFailure::new(ErrorKind::OAuthMisconfigured, format!("OAuth configuration incomplete: {e}"))
    })?;
    url.query_pairs_mut()
        .append_pair("project", project_id)
        .append_pair("success", &callbacks.success)
        .append_pair("failure", &callbacks.failure);
    Ok(url)
}

// =============================================================================
// REDIRECT PARSING
// =============================================================================

/// One-time credential delivered on the OAuth success redirect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthToken {
    pub user_id: String,
    pub secret: String,
}

#[derive(serde::Deserialize)]
struct RedirectError {
    message: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
    code: Option<u16>,
}

/// Extract the token from the URL the browser landed on.
///
/// # Errors
///
/// - the URL does not parse → [`ErrorKind::Other`]
/// - an `error` query parameter is present → classified from its JSON payload,
///   [`ErrorKind::Cancelled`] when nothing more specific applies
/// - the failure callback was hit → [`ErrorKind::Cancelled`]
/// - the token is missing → [`ErrorKind::OAuthMisconfigured`]
pub fn parse_callback(redirect: &str, callbacks: &CallbackUrls) -> Result<OAuthToken, AuthFailure> {
    let redirect = redirect.trim();
    let url = Url::parse(redirect)
        .map_err(|e| AuthFailure::new(ErrorKind::Other, format!("invalid OAuth redirect URL: {e}")))?;

    let mut user_id = None;
    let mut secret = None;
    let mut error = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "userId" => user_id = Some(value.into_owned()),
            "secret" => secret = Some(value.into_owned()),
            "error" => error = Some(value.into_owned()),
            _ => {}
        }
    }

    if let Some(raw) = error {
        return Err(redirect_error(&raw));
    }

    match (user_id, secret) {
        (Some(user_id), Some(secret)) if !user_id.is_empty() && !secret.is_empty() => {
            Ok(OAuthToken { user_id, secret })
        }
        _ if callbacks.failure != callbacks.success && redirect.starts_with(&callbacks.failure) => {
            Err(AuthFailure::new(ErrorKind::Cancelled, "OAuth sign-in was cancelled"))
        }
        _ => Err(AuthFailure::new(
            ErrorKind::OAuthMisconfigured,
            "OAuth configuration incomplete: redirect carried no token",
        )),
    }
}

fn redirect_error(raw: &str) -> AuthFailure {
    match serde_json::from_str::<RedirectError>(raw) {
        Ok(parsed) => {
            let kind = match ErrorKind::classify(parsed.kind.as_deref(), parsed.code) {
                ErrorKind::Other => ErrorKind::Cancelled,
                kind => kind,
            };
            let failure = AuthFailure::new(kind, parsed.message.unwrap_or_else(|| "OAuth sign-in failed".into()));
            match parsed.kind {
                Some(code) => failure.with_details(serde_json::json!({ "type": code })),
                None => failure,
            }
        }
        Err(_) => AuthFailure::new(ErrorKind::Cancelled, raw),
    }
}

/// Diagnostic payload for an OAuth attempt: platform, callback URL, and
/// the provider error type when the attempt failed.
#[must_use]
pub fn oauth_details(platform: Platform, callback_url: &str, error_type: Option<&str>) -> serde_json::Value {
    let mut details = serde_json::json!({
        "platform": platform.as_str(),
        "callbackUrl": callback_url,
    });
    if let Some(error_type) = error_type {
        details["type"] = serde_json::Value::String(error_type.to_owned());
    }
    details
}

// =============================================================================
// BROWSER
// =============================================================================

/// Sends the user to the authorize URL and reports where they came back.
#[async_trait::async_trait]
pub trait OAuthBrowser: Send + Sync {
    /// Open `authorize_url` and return the full redirect URL the provider
    /// sent the user to.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::Cancelled`] if the user abandons the flow.
    async fn open(&self, authorize_url: &Url, callbacks: &CallbackUrls) -> Result<String, AuthFailure>;
}

#[cfg(test)]
#[path = "oauth_test.rs"]
mod tests;
