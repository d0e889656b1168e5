//! Appwrite account API client implementing [`AuthService`].
//!
//! Thin HTTP wrapper over the `/account` endpoints. Response and error
//! parsing live in pure functions for testability.
//!
//! SESSION CARRIAGE
//! ================
//! There is no cookie jar. The provider mirrors the session cookie in an
//! `X-Fallback-Cookies` response header; the client keeps the latest value
//! in memory and replays it on every request until sign-out succeeds.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use rand::Rng;
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;

use super::auth::{AuthFailure, AuthService, ErrorKind, OAuthOutcome, SessionInfo, User};
use super::oauth::{self, OAuthBrowser, OAuthToken, Platform};
use crate::config::AppwriteConfig;

const PROJECT_HEADER: &str = "X-Appwrite-Project";
const FALLBACK_COOKIES_HEADER: &str = "X-Fallback-Cookies";
const ID_PADDING: usize = 7;

// =============================================================================
// CLIENT
// =============================================================================

pub struct AppwriteAuth {
    http: reqwest::Client,
    config: AppwriteConfig,
    fallback_cookies: Mutex<Option<String>>,
    browser: Option<Arc<dyn OAuthBrowser>>,
}

impl AppwriteAuth {
    /// Build a client with the configured request and connect timeouts.
    ///
    /// # Errors
    ///
    /// Returns an [`ErrorKind::Other`] failure if the HTTP client cannot be built.
    pub fn new(config: AppwriteConfig) -> Result<Self, AuthFailure> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeouts.request_secs))
            .connect_timeout(Duration::from_secs(config.timeouts.connect_secs))
            .build()
            .map_err(|e| AuthFailure::new(ErrorKind::Other, format!("HTTP client build failed: {e}")))?;
        Ok(Self { http, config, fallback_cookies: Mutex::new(None), browser: None })
    }

    /// Attach the browser used to complete OAuth sign-in.
    #[must_use]
    pub fn with_browser(mut self, browser: Arc<dyn OAuthBrowser>) -> Self {
        self.browser = Some(browser);
        self
    }

    #[must_use]
    pub fn config(&self) -> &AppwriteConfig {
        &self.config
    }

    /// Whether a session credential is currently held.
    #[must_use]
    pub fn has_session(&self) -> bool {
        self.fallback_cookies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Probe the endpoint and project, reporting a readable reason on failure.
    ///
    /// Reachability is checked first with an unauthenticated `GET /health`,
    /// then project access with `GET /projects/{id}`.
    ///
    /// # Errors
    ///
    /// Returns a failure describing the unreachable endpoint or rejected project.
    pub async fn test_connection(&self) -> Result<(), AuthFailure> {
        tracing::info!(
            endpoint = %self.config.endpoint,
            project = %self.config.project_id,
            platform = %self.config.platform,
            callback_url = self.config.callback_url(),
            "testing provider connection"
        );

        let (status, _body) = self.send(self.http.get(self.url("/health"))).await?;
        if !(200..300).contains(&status) {
            return Err(AuthFailure::new(
                ErrorKind::classify(None, Some(status)),
                format!("Health check failed: HTTP {status}"),
            ));
        }
        tracing::debug!("provider health check passed");

        let path = format!("/projects/{}", self.config.project_id);
        let (status, _body) = self.send(self.request(Method::GET, &path)).await?;
        match status {
            200..=299 => Ok(()),
            401 => Err(AuthFailure::new(
                ErrorKind::Unauthorized,
                "Project access denied. Please check: 1) Project ID is correct, \
                 2) Platform is registered in Appwrite console",
            )),
            other => Err(AuthFailure::new(
                ErrorKind::classify(None, Some(other)),
                format!("Project access failed: HTTP {other}"),
            )),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.endpoint)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let mut builder = self
            .http
            .request(method, self.url(path))
            .header(PROJECT_HEADER, &self.config.project_id);
        let cookies = self
            .fallback_cookies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(cookies) = cookies {
            builder = builder.header(FALLBACK_COOKIES_HEADER, cookies);
        }
        builder
    }

    async fn send(&self, builder: RequestBuilder) -> Result<(u16, String), AuthFailure> {
        let response = builder
            .send()
            .await
            .map_err(|e| AuthFailure::network(e.to_string()))?;
        let status = response.status().as_u16();
        if let Some(cookies) = response
            .headers()
            .get(FALLBACK_COOKIES_HEADER)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.trim().is_empty())
        {
            *self
                .fallback_cookies
                .lock()
                .unwrap_or_else(PoisonError::into_inner) = Some(cookies.to_owned());
        }
        let body = response
            .text()
            .await
            .map_err(|e| AuthFailure::network(e.to_string()))?;
        tracing::debug!(status, "provider responded");
        Ok((status, body))
    }

    async fn call<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, AuthFailure> {
        let (status, body) = self.send(builder).await?;
        parse_response(status, &body)
    }

    async fn create_token_session(&self, token: &OAuthToken) -> Result<SessionInfo, AuthFailure> {
        let body = serde_json::json!({ "userId": token.user_id, "secret": token.secret });
        self.call(self.request(Method::POST, "/account/sessions/token").json(&body))
            .await
    }

    fn oauth_failure(&self, failure: AuthFailure) -> AuthFailure {
        with_oauth_context(failure, self.config.platform, self.config.callback_url())
    }
}

#[async_trait::async_trait]
impl AuthService for AppwriteAuth {
    async fn is_authenticated(&self) -> bool {
        self.current_user().await.is_ok()
    }

    async fn current_user(&self) -> Result<User, AuthFailure> {
        self.call(self.request(Method::GET, "/account")).await
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<SessionInfo, AuthFailure> {
        let body = serde_json::json!({ "email": email, "password": password });
        self.call(self.request(Method::POST, "/account/sessions/email").json(&body))
            .await
    }

    async fn create_account(&self, email: &str, password: &str, name: &str) -> Result<User, AuthFailure> {
        let body = serde_json::json!({
            "userId": unique_id(),
            "email": email,
            "password": password,
            "name": name,
        });
        self.call(self.request(Method::POST, "/account").json(&body))
            .await
    }

    async fn sign_in_with_google(&self) -> Result<OAuthOutcome, AuthFailure> {
        let platform = self.config.platform;
        let callback_url = self.config.callback_url();
        let callbacks = platform.callback_urls(callback_url);
        tracing::info!(%platform, callback_url, "starting google oauth");

        let Some(browser) = self.browser.as_ref() else {
            return Err(self.oauth_failure(AuthFailure::new(
                ErrorKind::OAuthMisconfigured,
                "OAuth configuration incomplete: no browser available",
            )));
        };

        let authorize = oauth::authorize_url(
            &self.config.endpoint,
            &self.config.project_id,
            oauth::GOOGLE_PROVIDER,
            &callbacks,
        )
        .map_err(|e| self.oauth_failure(e))?;
        let redirect = browser
            .open(&authorize, &callbacks)
            .await
            .map_err(|e| self.oauth_failure(e))?;
        let token = oauth::parse_callback(&redirect, &callbacks).map_err(|e| self.oauth_failure(e))?;
        let session = self
            .create_token_session(&token)
            .await
            .map_err(|e| self.oauth_failure(e))?;

        Ok(OAuthOutcome { session, details: Some(oauth::oauth_details(platform, callback_url, None)) })
    }

    async fn sign_out(&self) -> Result<(), AuthFailure> {
        let (status, body) = self
            .send(self.request(Method::DELETE, "/account/sessions/current"))
            .await?;
        if !(200..300).contains(&status) {
            return Err(parse_error(status, &body));
        }
        *self
            .fallback_cookies
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}

// =============================================================================
// PARSING
// =============================================================================

#[derive(serde::Deserialize)]
struct ErrorBody {
    message: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
}

fn parse_response<T: DeserializeOwned>(status: u16, body: &str) -> Result<T, AuthFailure> {
    if !(200..300).contains(&status) {
        return Err(parse_error(status, body));
    }
    serde_json::from_str(body).map_err(|e| AuthFailure::new(ErrorKind::Other, format!("unexpected response: {e}")))
}

fn parse_error(status: u16, body: &str) -> AuthFailure {
    let parsed = serde_json::from_str::<ErrorBody>(body).ok();
    let code = parsed.as_ref().and_then(|b| b.kind.clone());
    let message = parsed
        .and_then(|b| b.message)
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| format!("HTTP {status}"));
    let failure = AuthFailure::new(ErrorKind::classify(code.as_deref(), Some(status)), message);
    match code {
        Some(code) => failure.with_details(serde_json::json!({ "type": code, "status": status })),
        None => failure,
    }
}

fn with_oauth_context(failure: AuthFailure, platform: Platform, callback_url: &str) -> AuthFailure {
    let error_type = failure
        .details
        .as_ref()
        .and_then(|d| d.get("type"))
        .and_then(serde_json::Value::as_str)
        .map(str::to_owned);
    let details = oauth::oauth_details(platform, callback_url, error_type.as_deref());
    AuthFailure { details: Some(details), ..failure }
}

/// Generate a provider-style unique id: hex seconds, five hex digits of
/// milliseconds, then random hex padding.
#[must_use]
pub fn unique_id() -> String {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    let mut rng = rand::rng();
    let padding: String = (0..ID_PADDING)
        .filter_map(|_| char::from_digit(rng.random_range(0..16u32), 16))
        .collect();
    format!("{:x}{:05x}{padding}", now.as_secs(), now.subsec_millis())
}

#[cfg(test)]
#[path = "appwrite_test.rs"]
mod tests;
