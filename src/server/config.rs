use axum_extra::extract::cookie::Key;
use url::Url;

use crate::google::GoogleConfig;

const DEFAULT_REDIRECT_URI: &str = "http://localhost:4000/auth/google/callback";
const DEFAULT_FRONTEND_ORIGIN: &str = "http://localhost:5173";
const DEFAULT_PORT: u16 = 4000;

/// Missing or malformed environment configuration.
#[derive(Debug, thiserror::Error)]
#[error("configuration error: {0}")]
pub struct ConfigError(pub(crate) String);

/// Application configuration.
///
/// Use [`from_env()`](AppConfig::from_env) for convention-based setup, or
/// [`new()`](AppConfig::new) with `with_*` methods for full control.
pub struct AppConfig {
    pub(crate) google: GoogleConfig,
    pub(crate) frontend_origin: String,
    pub(crate) drive_folder_id: Option<String>,
    pub(crate) allowed_email_domain: Option<String>,
    pub(crate) cookie_key: Key,
    pub(crate) secure_cookies: bool,
    pub(crate) port: u16,
}

impl AppConfig {
    /// Create config with the required Google client settings.
    ///
    /// All optional fields use sensible defaults. Override with `with_*`
    /// methods.
    #[must_use]
    pub fn new(google: GoogleConfig) -> Self {
        Self {
            google,
            frontend_origin: DEFAULT_FRONTEND_ORIGIN.into(),
            drive_folder_id: None,
            allowed_email_domain: None,
            cookie_key: Key::generate(),
            secure_cookies: true,
            port: DEFAULT_PORT,
        }
    }

    /// Create config from environment variables.
    ///
    /// # Required env vars
    /// - `GOOGLE_CLIENT_ID`: OAuth2 client ID
    /// - `GOOGLE_CLIENT_SECRET`: OAuth2 client secret
    ///
    /// # Optional env vars
    /// - `GOOGLE_OAUTH_REDIRECT_URI`: callback URL (must be a valid URL)
    /// - `GOOGLE_OAUTH_SCOPES`: space-separated scope override
    /// - `GOOGLE_DRIVE_FOLDER_ID`: target Drive folder
    /// - `FRONTEND_ORIGIN`: CORS origin and post-login redirect target
    /// - `ALLOWED_EMAIL_DOMAIN`: restrict sign-in to one email domain
    /// - `COOKIE_KEY`: cookie sealing key bytes
    /// - `DEV_AUTH`: `"1"` or `"true"` disables the `Secure` cookie attribute
    /// - `PORT`: listen port
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if required vars are missing or values are
    /// malformed.
    pub fn from_env() -> Result<Self, ConfigError> {
        let client_id = std::env::var("GOOGLE_CLIENT_ID")
            .map_err(|_| ConfigError("GOOGLE_CLIENT_ID is required".into()))?;
        let client_secret = std::env::var("GOOGLE_CLIENT_SECRET")
            .map_err(|_| ConfigError("GOOGLE_CLIENT_SECRET is required".into()))?;
        let redirect_uri: Url = std::env::var("GOOGLE_OAUTH_REDIRECT_URI")
            .unwrap_or_else(|_| DEFAULT_REDIRECT_URI.into())
            .parse()
            .map_err(|e| ConfigError(format!("GOOGLE_OAUTH_REDIRECT_URI: {e}")))?;

        let mut google = GoogleConfig::new(client_id, client_secret, redirect_uri);
        if let Ok(scopes) = std::env::var("GOOGLE_OAUTH_SCOPES") {
            google = google.with_scopes(
                scopes.split_whitespace().map(str::to_string).collect(),
            );
        }

        let dev_auth = matches!(std::env::var("DEV_AUTH").as_deref(), Ok("1") | Ok("true"));

        let cookie_key = match std::env::var("COOKIE_KEY") {
            Ok(k) => Key::try_from(k.as_bytes()).map_err(|_| {
                ConfigError(
                    "COOKIE_KEY is set but invalid (must be at least 64 bytes). \
                     Remove the env var to use an ephemeral key, or provide a valid key."
                        .into(),
                )
            })?,
            Err(_) => Key::generate(),
        };

        let port = match std::env::var("PORT") {
            Ok(p) => p
                .parse()
                .map_err(|e| ConfigError(format!("PORT: {e}")))?,
            Err(_) => DEFAULT_PORT,
        };

        let mut config = Self::new(google)
            .with_cookie_key(cookie_key)
            .with_secure_cookies(!dev_auth)
            .with_port(port);

        if let Ok(origin) = std::env::var("FRONTEND_ORIGIN") {
            config = config.with_frontend_origin(origin);
        }
        if let Ok(folder) = std::env::var("GOOGLE_DRIVE_FOLDER_ID") {
            config = config.with_drive_folder_id(folder);
        }
        if let Ok(domain) = std::env::var("ALLOWED_EMAIL_DOMAIN") {
            config = config.with_allowed_email_domain(domain);
        }

        Ok(config)
    }

    #[must_use]
    pub fn with_frontend_origin(mut self, origin: impl Into<String>) -> Self {
        self.frontend_origin = origin.into();
        self
    }

    #[must_use]
    pub fn with_drive_folder_id(mut self, folder_id: impl Into<String>) -> Self {
        self.drive_folder_id = Some(folder_id.into());
        self
    }

    #[must_use]
    pub fn with_allowed_email_domain(mut self, domain: impl Into<String>) -> Self {
        self.allowed_email_domain = Some(domain.into());
        self
    }

    #[must_use]
    pub fn with_cookie_key(mut self, key: Key) -> Self {
        self.cookie_key = key;
        self
    }

    #[must_use]
    pub fn with_secure_cookies(mut self, secure: bool) -> Self {
        self.secure_cookies = secure;
        self
    }

    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Listen port for the server binary.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }
}
