//! Auth-session state observed by the UI layer.
//!
//! SYSTEM CONTEXT
//! ==============
//! Produced by [`crate::services::session::SessionStateMachine`] and read
//! by route guards and user-aware views to decide between the loading
//! screen, the login flow, and the home screen.

use crate::services::auth::{AuthFailure, User};

/// Coarse lifecycle position of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    /// Constructed, startup check not yet run.
    #[default]
    Unknown,
    /// Startup check in flight.
    Checking,
    /// A sign-in, sign-up, OAuth or sign-out call is in flight.
    Busy,
    Authenticated,
    Unauthenticated,
}

impl Phase {
    /// Whether an operation is still pending in this phase.
    #[must_use]
    pub fn is_pending(self) -> bool {
        matches!(self, Self::Unknown | Self::Checking | Self::Busy)
    }
}

/// Screen the app should show for a given session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Loading,
    Login,
    Home,
}

/// Authentication state tracking the current user, loading status and the
/// last failure.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthState {
    pub user: Option<User>,
    pub loading: bool,
    pub error: Option<AuthFailure>,
    pub phase: Phase,
}

impl Default for AuthState {
    /// State at mount: nothing known yet, loading until the startup check settles.
    fn default() -> Self {
        Self { user: None, loading: true, error: None, phase: Phase::Unknown }
    }
}

impl AuthState {
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    /// Last error message, if any.
    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        self.error.as_ref().map(|e| e.message.as_str())
    }

    #[must_use]
    pub fn screen(&self) -> Screen {
        if self.loading {
            Screen::Loading
        } else if self.user.is_some() {
            Screen::Home
        } else {
            Screen::Login
        }
    }

    /// True once loading has finished and nobody is signed in.
    #[must_use]
    pub fn should_redirect_unauth(&self) -> bool {
        !self.loading && self.user.is_none()
    }
}

#[cfg(test)]
#[path = "state_test.rs"]
mod tests;
