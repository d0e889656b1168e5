//! Identity-provider contract consumed by the session state machine.
//!
//! DESIGN
//! ======
//! `AuthService` is the seam between session bookkeeping and whatever
//! provider actually holds accounts. Every call returns a typed
//! `AuthFailure` instead of a success flag so the state machine can settle
//! without inspecting message text.

use serde::{Deserialize, Serialize};

// =============================================================================
// IDENTITY
// =============================================================================

/// Identity record for the signed-in account. Mirrors the provider's
/// account object; unknown wire fields are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "$id")]
    pub id: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "emailVerification", skip_serializing_if = "Option::is_none")]
    pub email_verification: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registration: Option<String>,
}

impl User {
    /// Name to show in the UI, falling back to the email when no name is set.
    #[must_use]
    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() { &self.email } else { &self.name }
    }
}

/// Session record returned by password and token sign-in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionInfo {
    #[serde(rename = "$id")]
    pub id: String,
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(default)]
    pub provider: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expire: Option<String>,
}

/// Result of a completed OAuth round trip.
#[derive(Debug, Clone, PartialEq)]
pub struct OAuthOutcome {
    pub session: SessionInfo,
    /// Diagnostic context (platform, callback URL) for display on failure screens.
    pub details: Option<serde_json::Value>,
}

// =============================================================================
// ERROR
// =============================================================================

/// Structured classification of a provider failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidCredentials,
    UserExists,
    Unauthorized,
    Cancelled,
    OAuthMisconfigured,
    RateLimited,
    Network,
    Server,
    Other,
}

impl ErrorKind {
    /// Derive a kind from the provider's error `type` code and HTTP status.
    #[must_use]
    pub fn classify(code: Option<&str>, status: Option<u16>) -> Self {
        match code.unwrap_or_default() {
            "user_invalid_credentials" | "user_password_mismatch" | "password_mismatch" => {
                return Self::InvalidCredentials;
            }
            "user_already_exists" | "user_email_already_exists" | "user_phone_already_exists" => {
                return Self::UserExists;
            }
            "user_oauth2_unauthorized" | "user_oauth2_bad_request" | "user_oauth2_provider_error" => {
                return Self::Cancelled;
            }
            "project_provider_disabled" | "project_provider_unsupported" => return Self::OAuthMisconfigured,
            "general_rate_limit_exceeded" => return Self::RateLimited,
            "user_unauthorized" | "user_session_not_found" | "user_jwt_invalid" | "general_unauthorized_scope" => {
                return Self::Unauthorized;
            }
            _ => {}
        }
        match status {
            Some(401 | 403) => Self::Unauthorized,
            Some(409) => Self::UserExists,
            Some(429) => Self::RateLimited,
            Some(500..=599) => Self::Server,
            _ => Self::Other,
        }
    }
}

/// A failed provider operation: human-readable message, structured kind, and
/// optional diagnostic payload.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{message}")]
pub struct AuthFailure {
    pub kind: ErrorKind,
    pub message: String,
    pub details: Option<serde_json::Value>,
}

impl AuthFailure {
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self { kind, message: message.into(), details: None }
    }

    #[must_use]
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Transport-level failure (connect, timeout, unreadable body).
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Network, message)
    }

    /// Message suitable for showing to the end user.
    ///
    /// Well-known kinds get a fixed sentence; anything else falls back to the
    /// provider's own message. A `general_unauthorized_scope` detail appends
    /// OAuth troubleshooting steps.
    #[must_use]
    pub fn friendly_message(&self) -> String {
        let mut text = match self.kind {
            ErrorKind::Network => "Network error. Please check your connection.".to_owned(),
            ErrorKind::Unauthorized => "Authorization failed. Please try again.".to_owned(),
            ErrorKind::Cancelled => "Sign-in was cancelled.".to_owned(),
            ErrorKind::OAuthMisconfigured => "OAuth setup is incomplete. Please contact support.".to_owned(),
            ErrorKind::RateLimited => "Too many attempts. Please wait a moment and try again.".to_owned(),
            ErrorKind::InvalidCredentials
            | ErrorKind::UserExists
            | ErrorKind::Server
            | ErrorKind::Other => self.message.clone(),
        };
        let scope_hint = self
            .details
            .as_ref()
            .and_then(|d| d.get("type"))
            .and_then(serde_json::Value::as_str)
            == Some("general_unauthorized_scope");
        if scope_hint {
            text.push_str(
                "\n\nTroubleshooting:\n1. Ensure Google OAuth is correctly set up in Appwrite\n\
                 2. Check your project permissions\n3. Verify callback URLs",
            );
        }
        text
    }
}

// =============================================================================
// SERVICE TRAIT
// =============================================================================

/// Account and session primitives of an external identity provider.
/// Implemented over HTTP by [`super::appwrite::AppwriteAuth`]; mocked in tests.
#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    /// Whether the provider currently recognizes a live session.
    async fn is_authenticated(&self) -> bool;

    /// Fetch the canonical identity of the signed-in account.
    ///
    /// # Errors
    ///
    /// Returns an [`AuthFailure`] when no session exists or the call fails.
    async fn current_user(&self) -> Result<User, AuthFailure>;

    /// Create a session from email and password.
    ///
    /// # Errors
    ///
    /// Returns an [`AuthFailure`] on rejected credentials or transport failure.
    async fn sign_in(&self, email: &str, password: &str) -> Result<SessionInfo, AuthFailure>;

    /// Register a new account. Does not sign in.
    ///
    /// # Errors
    ///
    /// Returns an [`AuthFailure`] if the account exists or the call fails.
    async fn create_account(&self, email: &str, password: &str, name: &str) -> Result<User, AuthFailure>;

    /// Run the Google OAuth flow to completion.
    ///
    /// # Errors
    ///
    /// Returns an [`AuthFailure`], usually with `details`, when the flow is
    /// cancelled, misconfigured, or the token exchange fails.
    async fn sign_in_with_google(&self) -> Result<OAuthOutcome, AuthFailure>;

    /// End the current session.
    ///
    /// # Errors
    ///
    /// Returns an [`AuthFailure`] if the provider rejects the request.
    async fn sign_out(&self) -> Result<(), AuthFailure>;
}

#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;
