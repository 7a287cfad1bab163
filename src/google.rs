use serde::Deserialize;
use url::Url;

use crate::error::Error;
use crate::session::{Credential, TokenRefresher, now_ms};

const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const GOOGLE_USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v2/userinfo";

/// Lifetime assumed when the token endpoint omits `expires_in`.
const DEFAULT_TOKEN_LIFETIME_SECS: u64 = 3600;

/// Google `OAuth2` configuration.
///
/// Required fields are constructor parameters — no runtime "missing field"
/// errors. Endpoint URLs default to Google's public endpoints and are
/// overridable for tests.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct GoogleConfig {
    pub(crate) client_id: String,
    pub(crate) client_secret: String,
    pub(crate) redirect_uri: Url,
    pub(crate) auth_url: Url,
    pub(crate) token_url: Url,
    pub(crate) userinfo_url: Url,
    pub(crate) scopes: Vec<String>,
}

impl GoogleConfig {
    /// Create a new `OAuth2` configuration.
    #[must_use]
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        redirect_uri: Url,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            redirect_uri,
            auth_url: GOOGLE_AUTH_URL.parse().expect("valid default URL"),
            token_url: GOOGLE_TOKEN_URL.parse().expect("valid default URL"),
            userinfo_url: GOOGLE_USERINFO_URL.parse().expect("valid default URL"),
            scopes: vec![
                "https://www.googleapis.com/auth/drive.file".into(),
                "https://www.googleapis.com/auth/userinfo.email".into(),
            ],
        }
    }

    /// Override the authorization endpoint.
    #[must_use]
    pub fn with_auth_url(mut self, url: Url) -> Self {
        self.auth_url = url;
        self
    }

    /// Override the token endpoint.
    #[must_use]
    pub fn with_token_url(mut self, url: Url) -> Self {
        self.token_url = url;
        self
    }

    /// Override the userinfo endpoint.
    #[must_use]
    pub fn with_userinfo_url(mut self, url: Url) -> Self {
        self.userinfo_url = url;
        self
    }

    /// Override the requested scopes (default: `drive.file` + `userinfo.email`).
    #[must_use]
    pub fn with_scopes(mut self, scopes: Vec<String>) -> Self {
        self.scopes = scopes;
        self
    }
}

/// Token response from the Google token endpoint.
#[derive(Debug, Clone, Deserialize)]
#[non_exhaustive]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

impl TokenResponse {
    /// Absolute expiry (epoch milliseconds) computed from `expires_in`.
    #[must_use]
    pub fn expiry_ms(&self) -> i64 {
        let lifetime = self.expires_in.unwrap_or(DEFAULT_TOKEN_LIFETIME_SECS);
        now_ms() + i64::try_from(lifetime).unwrap_or(i64::MAX / 2) * 1000
    }
}

/// User info from the Google userinfo endpoint.
#[derive(Debug, Clone, Deserialize)]
#[non_exhaustive]
pub struct UserInfo {
    #[serde(default)]
    pub email: Option<String>,
}

/// `OAuth2` client for Google's authorization-code flow.
pub struct GoogleClient {
    config: GoogleConfig,
    http: reqwest::Client,
}

impl GoogleClient {
    #[must_use]
    pub fn new(config: GoogleConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }

    /// Use a custom HTTP client (for connection pool reuse or testing).
    #[must_use]
    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.http = client;
        self
    }

    /// Build the authorization redirect URL.
    ///
    /// `access_type=offline` makes Google issue a refresh token, and
    /// `prompt=consent` makes it re-issue one on repeat logins (Google omits
    /// it by default after the first consent).
    #[must_use]
    pub fn authorization_url(&self) -> String {
        let scope = self.config.scopes.join(" ");

        let mut url = self.config.auth_url.clone();
        url.query_pairs_mut()
            .append_pair("client_id", &self.config.client_id)
            .append_pair("redirect_uri", self.config.redirect_uri.as_str())
            .append_pair("response_type", "code")
            .append_pair("scope", &scope)
            .append_pair("access_type", "offline")
            .append_pair("prompt", "consent");

        url.into()
    }

    /// Exchange an authorization code for tokens.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Http`] on network failure, or
    /// [`Error::TokenExchange`] if the token endpoint returns an error.
    pub async fn exchange_code(&self, code: &str) -> Result<TokenResponse, Error> {
        let params = [
            ("code", code),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("redirect_uri", self.config.redirect_uri.as_str()),
            ("grant_type", "authorization_code"),
        ];

        let response = self
            .http
            .post(self.config.token_url.clone())
            .form(&params)
            .send()
            .await?;

        if !response.status().is_success() {
            let (status, detail) = failure_detail(response).await;
            return Err(Error::TokenExchange { status, detail });
        }
        response.json::<TokenResponse>().await.map_err(Into::into)
    }

    /// Mint a fresh access token from a refresh token.
    ///
    /// Google's refresh tokens are long-lived and reusable; this call does
    /// not rotate or invalidate them.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Http`] on network failure, or
    /// [`Error::TokenRefresh`] if the token endpoint returns an error.
    pub async fn refresh_access_token(&self, refresh_token: &str) -> Result<Credential, Error> {
        let params = [
            ("refresh_token", refresh_token),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("grant_type", "refresh_token"),
        ];

        let response = self
            .http
            .post(self.config.token_url.clone())
            .form(&params)
            .send()
            .await?;

        if !response.status().is_success() {
            let (status, detail) = failure_detail(response).await;
            return Err(Error::TokenRefresh { status, detail });
        }
        let tokens = response.json::<TokenResponse>().await?;
        Ok(Credential {
            expires_at_ms: tokens.expiry_ms(),
            access_token: tokens.access_token,
        })
    }

    /// Fetch the authenticated user's profile.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Http`] on network failure, or [`Error::UserInfo`] if
    /// the userinfo endpoint returns an error.
    pub async fn fetch_user_info(&self, access_token: &str) -> Result<UserInfo, Error> {
        let response = self
            .http
            .get(self.config.userinfo_url.clone())
            .bearer_auth(access_token)
            .send()
            .await?;

        if !response.status().is_success() {
            let (status, detail) = failure_detail(response).await;
            return Err(Error::UserInfo { status, detail });
        }
        response.json::<UserInfo>().await.map_err(Into::into)
    }
}

impl TokenRefresher for GoogleClient {
    async fn refresh(&self, refresh_token: &str) -> Result<Credential, Error> {
        self.refresh_access_token(refresh_token).await
    }
}

/// Reads status + body text from a non-success response for diagnostics.
pub(crate) async fn failure_detail(response: reqwest::Response) -> (u16, String) {
    let status = response.status().as_u16();
    let detail = response.text().await.unwrap_or_default();
    (status, detail)
}
