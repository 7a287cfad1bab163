use std::future::Future;

use time::OffsetDateTime;

use crate::error::Error;

/// Authentication state reconstructed from the client's cookies.
///
/// The server never stores a session: each request decodes one from whatever
/// the client presents, and any mutation (a token refresh) is propagated by
/// re-encoding the session onto the outgoing response. A session with no
/// populated field is simply an unauthenticated caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub user_email: Option<String>,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    /// Access-token expiry as epoch milliseconds.
    pub token_expiry: Option<i64>,
}

impl Session {
    /// Whether the caller completed the OAuth handshake at some point.
    ///
    /// Says nothing about the access token still being usable — see
    /// [`ensure_valid`] for that.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.user_email.is_some()
    }
}

/// A currently-usable bearer credential.
///
/// Produced by [`ensure_valid`], consumed immediately by the Drive client.
/// Never outlives the request except by being written back into the outgoing
/// session cookies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub access_token: String,
    /// Expiry as epoch milliseconds.
    pub expires_at_ms: i64,
}

/// Result of [`ensure_valid`]: the credential, plus whether the session's
/// token fields were rewritten and must be re-encoded to the client.
#[derive(Debug, Clone)]
pub struct EnsuredCredential {
    pub credential: Credential,
    pub refreshed: bool,
}

/// Mints a fresh access token from a refresh token.
///
/// Implemented by [`GoogleClient`](crate::google::GoogleClient); test code
/// substitutes a recording mock.
pub trait TokenRefresher: Send + Sync {
    fn refresh(
        &self,
        refresh_token: &str,
    ) -> impl Future<Output = Result<Credential, Error>> + Send;
}

/// Current time as epoch milliseconds.
#[must_use]
pub fn now_ms() -> i64 {
    let now = OffsetDateTime::now_utc();
    i64::try_from(now.unix_timestamp_nanos() / 1_000_000).unwrap_or(i64::MAX)
}

/// Guarantees a currently-valid bearer credential before any Drive call.
///
/// Three states, re-evaluated independently on every request:
/// - token set and not yet expired → returned as-is, no external call, no
///   session mutation;
/// - token missing or expired but a refresh token is present → exactly one
///   `refresh` call, and the session's `access_token`/`token_expiry` are
///   overwritten in place (the refresh token itself is not rotated);
/// - neither → [`Error::CredentialRequired`].
///
/// # Errors
///
/// Propagates [`Error::TokenRefresh`] from the refresh call, or returns
/// [`Error::CredentialRequired`] for a session with nothing to work with.
pub async fn ensure_valid<R: TokenRefresher>(
    refresher: &R,
    session: &mut Session,
) -> Result<EnsuredCredential, Error> {
    let now = now_ms();

    if let (Some(token), Some(expiry)) = (session.access_token.as_deref(), session.token_expiry)
        && expiry > now
    {
        return Ok(EnsuredCredential {
            credential: Credential {
                access_token: token.to_string(),
                expires_at_ms: expiry,
            },
            refreshed: false,
        });
    }

    if let Some(refresh_token) = session.refresh_token.clone() {
        let credential = refresher.refresh(&refresh_token).await?;
        session.access_token = Some(credential.access_token.clone());
        session.token_expiry = Some(credential.expires_at_ms);
        tracing::debug!("access token refreshed");
        return Ok(EnsuredCredential {
            credential,
            refreshed: true,
        });
    }

    Err(Error::CredentialRequired)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    struct CountingRefresher {
        calls: AtomicUsize,
        result: Result<Credential, ()>,
    }

    impl CountingRefresher {
        fn returning(credential: Credential) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                result: Ok(credential),
            }
        }

        fn failing() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                result: Err(()),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl TokenRefresher for CountingRefresher {
        async fn refresh(&self, _refresh_token: &str) -> Result<Credential, Error> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.result {
                Ok(credential) => Ok(credential.clone()),
                Err(()) => Err(Error::TokenRefresh {
                    status: 400,
                    detail: "invalid_grant".into(),
                }),
            }
        }
    }

    fn fresh_credential() -> Credential {
        Credential {
            access_token: "fresh-token".into(),
            expires_at_ms: now_ms() + 3_600_000,
        }
    }

    #[tokio::test]
    async fn valid_token_returned_without_refresh() {
        let refresher = CountingRefresher::returning(fresh_credential());
        let expiry = now_ms() + 60_000;
        let mut session = Session {
            user_email: Some("a@example.com".into()),
            access_token: Some("cached-token".into()),
            refresh_token: Some("refresh".into()),
            token_expiry: Some(expiry),
        };
        let before = session.clone();

        let ensured = ensure_valid(&refresher, &mut session).await.unwrap();

        assert_eq!(ensured.credential.access_token, "cached-token");
        assert_eq!(ensured.credential.expires_at_ms, expiry);
        assert!(!ensured.refreshed);
        assert_eq!(refresher.call_count(), 0);
        assert_eq!(session, before, "valid state must not mutate the session");
    }

    #[tokio::test]
    async fn expired_token_refreshed_exactly_once() {
        let refresher = CountingRefresher::returning(fresh_credential());
        let mut session = Session {
            access_token: Some("stale-token".into()),
            refresh_token: Some("refresh".into()),
            token_expiry: Some(now_ms() - 1),
            ..Session::default()
        };

        let ensured = ensure_valid(&refresher, &mut session).await.unwrap();

        assert!(ensured.refreshed);
        assert_eq!(ensured.credential.access_token, "fresh-token");
        assert_eq!(refresher.call_count(), 1);
        assert_eq!(session.access_token.as_deref(), Some("fresh-token"));
        assert_eq!(
            session.token_expiry,
            Some(ensured.credential.expires_at_ms),
            "refresh must overwrite the session's expiry in place"
        );
        assert_eq!(
            session.refresh_token.as_deref(),
            Some("refresh"),
            "the refresh token is not rotated"
        );
    }

    #[tokio::test]
    async fn missing_token_with_refresh_token_is_refreshable() {
        let refresher = CountingRefresher::returning(fresh_credential());
        let mut session = Session {
            refresh_token: Some("refresh".into()),
            ..Session::default()
        };

        let ensured = ensure_valid(&refresher, &mut session).await.unwrap();

        assert!(ensured.refreshed);
        assert_eq!(refresher.call_count(), 1);
    }

    #[tokio::test]
    async fn no_usable_state_fails_with_credential_required() {
        let refresher = CountingRefresher::returning(fresh_credential());
        let mut session = Session {
            user_email: Some("a@example.com".into()),
            access_token: Some("stale-token".into()),
            token_expiry: Some(now_ms() - 1),
            ..Session::default()
        };

        let err = ensure_valid(&refresher, &mut session).await.unwrap_err();

        assert!(matches!(err, Error::CredentialRequired));
        assert_eq!(refresher.call_count(), 0);
    }

    #[tokio::test]
    async fn refresh_failure_propagates() {
        let refresher = CountingRefresher::failing();
        let mut session = Session {
            refresh_token: Some("revoked".into()),
            ..Session::default()
        };

        let err = ensure_valid(&refresher, &mut session).await.unwrap_err();

        assert!(matches!(err, Error::TokenRefresh { .. }));
        assert_eq!(
            session.access_token, None,
            "a failed refresh must not plant a token"
        );
    }
}
