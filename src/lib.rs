//! Bus Tracker client core: auth session, provider binding, stop search.

pub mod config;
pub mod services;
pub mod state;
