//! HTTP glue: route wiring, cookie session transport, response envelope.
//!
//! Everything here is thin composition over the library core: the session
//! codec in [`cookies`], the error-to-envelope mapping in [`error`], and the
//! handlers in [`routes`].

mod config;
mod cookies;
mod error;
mod response;
mod routes;
mod state;

pub use config::{AppConfig, ConfigError};
pub use error::ApiError;
pub use routes::router;
pub use state::AppState;

/// Re-export cookie key type for builder API.
pub use axum_extra::extract::cookie::Key as CookieKey;
