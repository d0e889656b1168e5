//! Client-side authentication session state machine.
//!
//! ARCHITECTURE
//! ============
//! `SessionStateMachine` is the single owner of "who is logged in". Every
//! auth intent goes through it to an [`AuthService`], and every provider
//! result is folded back into one [`AuthState`] published on a
//! `tokio::sync::watch` channel. Observers never mutate state; they hold a
//! receiver, which closes when the machine is dropped.
//!
//! STATES
//! ======
//! `Unknown → Checking → {Authenticated, Unauthenticated}`; sign-in, sign-up
//! and OAuth lead to `Authenticated`, sign-out to `Unauthenticated`. Every
//! operation passes through `Busy` (`loading = true`) before it settles.
//!
//! CONCURRENCY
//! ===========
//! One operation may be in flight. A second call while one is pending is
//! rejected with [`SessionError::Busy`] and leaves the state untouched. If
//! an in-flight future is dropped, its guard settles the state and frees the
//! slot.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::watch;

use super::auth::{AuthFailure, AuthService, User};
use crate::state::{AuthState, Phase};

const IDENTITY_FETCH_FAILED: &str = "Failed to get user data";

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SessionError {
    #[error("another auth operation is already in progress")]
    Busy,
    #[error(transparent)]
    Provider(#[from] AuthFailure),
}

impl SessionError {
    /// The provider failure behind this error, if any.
    #[must_use]
    pub fn failure(&self) -> Option<&AuthFailure> {
        match self {
            Self::Busy => None,
            Self::Provider(failure) => Some(failure),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operation {
    Initialize,
    SignIn,
    SignUp,
    SignInWithGoogle,
    SignOut,
}

impl Operation {
    fn as_str(self) -> &'static str {
        match self {
            Self::Initialize => "initialize",
            Self::SignIn => "sign_in",
            Self::SignUp => "sign_up",
            Self::SignInWithGoogle => "sign_in_with_google",
            Self::SignOut => "sign_out",
        }
    }
}

/// How a finished operation changes the session.
enum Settlement {
    /// Signed in as this identity.
    Adopt(User),
    /// Signed out.
    Clear,
    /// Provider failure; identity unchanged.
    Fail(AuthFailure),
    /// Startup check result. Failures are folded into `None` without an error.
    Quiet(Option<User>),
}

// =============================================================================
// STATE MACHINE
// =============================================================================

pub struct SessionStateMachine {
    service: Arc<dyn AuthService>,
    state: watch::Sender<AuthState>,
    in_flight: AtomicBool,
}

impl SessionStateMachine {
    /// Create a machine in the `Unknown` phase (`loading = true`, no user).
    /// Call [`Self::initialize`] to resolve it.
    #[must_use]
    pub fn new(service: Arc<dyn AuthService>) -> Self {
        let (state, _) = watch::channel(AuthState::default());
        Self { service, state, in_flight: AtomicBool::new(false) }
    }

    /// Current state, cloned.
    #[must_use]
    pub fn snapshot(&self) -> AuthState {
        self.state.borrow().clone()
    }

    /// Receiver notified whenever an operation starts or settles.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    #[must_use]
    pub fn user(&self) -> Option<User> {
        self.state.borrow().user.clone()
    }

    #[must_use]
    pub fn loading(&self) -> bool {
        self.state.borrow().loading
    }

    #[must_use]
    pub fn error(&self) -> Option<AuthFailure> {
        self.state.borrow().error.clone()
    }

    /// Resolve the startup state by asking the provider for a live session.
    ///
    /// A missing session or any provider failure settles as signed out with
    /// no error surfaced.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Busy`] if another operation is in flight.
    pub async fn initialize(&self) -> Result<(), SessionError> {
        let op = self.begin(Operation::Initialize)?;
        let user = if self.service.is_authenticated().await {
            match self.service.current_user().await {
                Ok(user) => Some(user),
                Err(e) => {
                    tracing::warn!(error = %e, "startup identity fetch failed, treating as signed out");
                    None
                }
            }
        } else {
            None
        };
        op.settle(Settlement::Quiet(user))
    }

    /// Sign in with email and password, then fetch the canonical identity.
    /// Credential format is the caller's concern.
    ///
    /// # Errors
    ///
    /// [`SessionError::Busy`] on overlap, otherwise the provider failure,
    /// which is also stored in the state's `error`.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<(), SessionError> {
        let op = self.begin(Operation::SignIn)?;
        let settlement = self.password_sign_in(email, password).await;
        op.settle(settlement)
    }

    /// Register an account and, on success, sign in once with the same
    /// credentials. The sign-in outcome is the overall outcome.
    ///
    /// # Errors
    ///
    /// [`SessionError::Busy`] on overlap, otherwise the failure of account
    /// creation or of the chained sign-in.
    pub async fn sign_up(&self, email: &str, password: &str, name: &str) -> Result<(), SessionError> {
        let op = self.begin(Operation::SignUp)?;
        let settlement = match self.service.create_account(email, password, name).await {
            Ok(user) => {
                tracing::info!(user_id = %user.id, "account created, signing in");
                self.password_sign_in(email, password).await
            }
            Err(e) => Settlement::Fail(e),
        };
        op.settle(settlement)
    }

    /// Run the provider OAuth flow, then fetch the canonical identity the
    /// same way the password path does.
    ///
    /// # Errors
    ///
    /// [`SessionError::Busy`] on overlap, otherwise the provider failure with
    /// any diagnostic `details` it carried.
    pub async fn sign_in_with_google(&self) -> Result<(), SessionError> {
        let op = self.begin(Operation::SignInWithGoogle)?;
        let settlement = match self.service.sign_in_with_google().await {
            Ok(outcome) => {
                tracing::info!(session_id = %outcome.session.id, "oauth session created");
                self.fetch_identity().await
            }
            Err(e) => Settlement::Fail(e),
        };
        op.settle(settlement)
    }

    /// End the session. On provider failure the local user is kept.
    ///
    /// # Errors
    ///
    /// [`SessionError::Busy`] on overlap, otherwise the provider failure.
    pub async fn sign_out(&self) -> Result<(), SessionError> {
        let op = self.begin(Operation::SignOut)?;
        let settlement = match self.service.sign_out().await {
            Ok(()) => Settlement::Clear,
            Err(e) => Settlement::Fail(e),
        };
        op.settle(settlement)
    }

    /// Drop the last error. Observers are only notified if there was one.
    pub fn clear_error(&self) {
        self.state.send_if_modified(|s| s.error.take().is_some());
    }

    async fn password_sign_in(&self, email: &str, password: &str) -> Settlement {
        match self.service.sign_in(email, password).await {
            Ok(session) => {
                tracing::debug!(session_id = %session.id, "password session created");
                self.fetch_identity().await
            }
            Err(e) => Settlement::Fail(e),
        }
    }

    async fn fetch_identity(&self) -> Settlement {
        match self.service.current_user().await {
            Ok(user) => Settlement::Adopt(user),
            Err(e) => {
                tracing::warn!(error = %e, "identity fetch after sign-in failed");
                Settlement::Fail(AuthFailure { message: IDENTITY_FETCH_FAILED.to_owned(), ..e })
            }
        }
    }

    fn begin(&self, op: Operation) -> Result<InFlight<'_>, SessionError> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::warn!(op = op.as_str(), "rejected overlapping auth operation");
            return Err(SessionError::Busy);
        }
        let phase = if op == Operation::Initialize { Phase::Checking } else { Phase::Busy };
        self.state.send_modify(|s| {
            s.loading = true;
            s.error = None;
            s.phase = phase;
        });
        tracing::debug!(op = op.as_str(), "auth operation started");
        Ok(InFlight { machine: self, op, settled: false })
    }
}

fn settled_phase(state: &AuthState) -> Phase {
    if state.user.is_some() { Phase::Authenticated } else { Phase::Unauthenticated }
}

// =============================================================================
// IN-FLIGHT GUARD
// =============================================================================

/// Holds the single operation slot until settled or dropped.
struct InFlight<'a> {
    machine: &'a SessionStateMachine,
    op: Operation,
    settled: bool,
}

impl InFlight<'_> {
    fn settle(mut self, settlement: Settlement) -> Result<(), SessionError> {
        self.settled = true;
        let result = match &settlement {
            Settlement::Fail(failure) => {
                tracing::warn!(op = self.op.as_str(), kind = ?failure.kind, error = %failure, "auth operation failed");
                Err(SessionError::Provider(failure.clone()))
            }
            Settlement::Adopt(_) | Settlement::Clear | Settlement::Quiet(_) => Ok(()),
        };
        let mut authenticated = false;
        self.machine.state.send_modify(|s| {
            match settlement {
                Settlement::Adopt(user) => s.user = Some(user),
                Settlement::Clear => s.user = None,
                Settlement::Fail(failure) => s.error = Some(failure),
                Settlement::Quiet(user) => s.user = user,
            }
            s.loading = false;
            s.phase = settled_phase(s);
            authenticated = s.user.is_some();
            // Free the slot under the write lock so woken observers can start the next op.
            self.machine.in_flight.store(false, Ordering::Release);
        });
        tracing::info!(
            op = self.op.as_str(),
            authenticated,
            "auth operation settled"
        );
        result
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.settled {
            tracing::warn!(op = self.op.as_str(), "auth operation abandoned before settling");
            let in_flight = &self.machine.in_flight;
            self.machine.state.send_modify(|s| {
                s.loading = false;
                s.phase = settled_phase(s);
                in_flight.store(false, Ordering::Release);
            });
        }
    }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
