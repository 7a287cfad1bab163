use std::sync::Arc;

use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;

use super::config::AppConfig;
use crate::drive::DriveClient;
use crate::google::GoogleClient;

/// Immutable shared state: clients plus the settings handlers read.
///
/// This is the only cross-request state the server holds — no sessions, no
/// locks, nothing mutable.
#[derive(Clone)]
pub struct AppState {
    pub(super) google: Arc<GoogleClient>,
    pub(super) drive: Arc<DriveClient>,
    pub(super) settings: Arc<Settings>,
}

pub(super) struct Settings {
    pub(super) frontend_origin: String,
    pub(super) drive_folder_id: Option<String>,
    pub(super) allowed_email_domain: Option<String>,
    pub(super) cookie_key: Key,
    pub(super) secure_cookies: bool,
}

impl AppState {
    #[must_use]
    pub fn new(config: AppConfig) -> Self {
        // Share one connection pool between the OAuth and Drive clients.
        let http = reqwest::Client::new();
        Self {
            google: Arc::new(GoogleClient::new(config.google).with_http_client(http.clone())),
            drive: Arc::new(DriveClient::new().with_http_client(http)),
            settings: Arc::new(Settings {
                frontend_origin: config.frontend_origin,
                drive_folder_id: config.drive_folder_id,
                allowed_email_domain: config.allowed_email_domain,
                cookie_key: config.cookie_key,
                secure_cookies: config.secure_cookies,
            }),
        }
    }
}

// PrivateCookieJar requires Key to be extractable from state
impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.settings.cookie_key.clone()
    }
}
