//! Client-side services behind the app screens.
//!
//! ARCHITECTURE
//! ============
//! `session` owns auth state and talks to the provider only through the
//! `auth::AuthService` trait; `appwrite` and `oauth` implement that trait
//! over HTTP. `stops` and `credentials` are pure helpers for the search
//! and login screens.

pub mod appwrite;
pub mod auth;
pub mod credentials;
pub mod oauth;
pub mod session;
pub mod stops;
