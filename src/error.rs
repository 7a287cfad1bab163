use crate::validate::EmailDomainError;

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// No usable access token and no refresh token — the caller must
    /// re-authenticate with Google.
    #[error("Google sign-in required")]
    CredentialRequired,
    #[error("token exchange failed (status {status}): {detail}")]
    TokenExchange { status: u16, detail: String },
    #[error("access token refresh failed (status {status}): {detail}")]
    TokenRefresh { status: u16, detail: String },
    #[error("userinfo request failed (status {status}): {detail}")]
    UserInfo { status: u16, detail: String },
    #[error("Drive upload failed (status {status}): {detail}")]
    DriveUpload { status: u16, detail: String },
    #[error("Drive file listing failed (status {status}): {detail}")]
    DriveList { status: u16, detail: String },
    /// Drive reported success but the response carried no file id.
    #[error("Drive response did not include a file id")]
    DriveResponseMissingId,
    #[error(transparent)]
    EmailRejected(#[from] EmailDomainError),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}
