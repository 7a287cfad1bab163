//! Session codec: one sealed cookie per session field.
//!
//! The jar is a `PrivateCookieJar`, so values are encrypted and
//! integrity-protected; the client stores tokens but cannot read or forge
//! them. Decoding never fails: a missing, undecryptable, or unparsable
//! cookie simply leaves its field absent, which at worst forces a
//! re-authentication.

use axum_extra::extract::PrivateCookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};
use time::Duration;

use crate::session::Session;

// Cookie names match what the front end was built against.
const EMAIL_COOKIE: &str = "userEmail";
const ACCESS_TOKEN_COOKIE: &str = "accessToken";
const REFRESH_TOKEN_COOKIE: &str = "refreshToken";
const TOKEN_EXPIRY_COOKIE: &str = "tokenExpiry";

const SESSION_TTL: Duration = Duration::hours(24);

/// Reconstruct a [`Session`] from the request's cookies. Never fails.
pub(super) fn decode(jar: &PrivateCookieJar) -> Session {
    Session {
        user_email: value(jar, EMAIL_COOKIE),
        access_token: value(jar, ACCESS_TOKEN_COOKIE),
        refresh_token: value(jar, REFRESH_TOKEN_COOKIE),
        token_expiry: value(jar, TOKEN_EXPIRY_COOKIE).and_then(|v| v.parse::<i64>().ok()),
    }
}

/// Write every populated session field back out as a cookie.
///
/// Absent fields are left untouched rather than cleared: a token refresh
/// rewrites `accessToken`/`tokenExpiry` without disturbing the rest.
pub(super) fn encode(mut jar: PrivateCookieJar, session: &Session, secure: bool) -> PrivateCookieJar {
    if let Some(email) = &session.user_email {
        jar = jar.add(session_cookie(EMAIL_COOKIE, email.clone(), secure));
    }
    if let Some(token) = &session.access_token {
        jar = jar.add(session_cookie(ACCESS_TOKEN_COOKIE, token.clone(), secure));
    }
    if let Some(token) = &session.refresh_token {
        jar = jar.add(session_cookie(REFRESH_TOKEN_COOKIE, token.clone(), secure));
    }
    if let Some(expiry) = session.token_expiry {
        jar = jar.add(session_cookie(TOKEN_EXPIRY_COOKIE, expiry.to_string(), secure));
    }
    jar
}

/// Remove all four session cookies (logout).
pub(super) fn clear(mut jar: PrivateCookieJar) -> PrivateCookieJar {
    for name in [
        EMAIL_COOKIE,
        ACCESS_TOKEN_COOKIE,
        REFRESH_TOKEN_COOKIE,
        TOKEN_EXPIRY_COOKIE,
    ] {
        jar = jar.remove(
            Cookie::build((name, ""))
                .path("/")
                .max_age(Duration::ZERO)
                .build(),
        );
    }
    jar
}

fn value(jar: &PrivateCookieJar, name: &str) -> Option<String> {
    jar.get(name).map(|c| c.value().to_string())
}

fn session_cookie(name: &'static str, value: String, secure: bool) -> Cookie<'static> {
    // SameSite=None is required for the cross-site OAuth redirect round trip,
    // and browsers only accept it on Secure cookies. Local development over
    // plain HTTP falls back to Lax.
    let same_site = if secure { SameSite::None } else { SameSite::Lax };
    Cookie::build((name, value))
        .http_only(true)
        .secure(secure)
        .same_site(same_site)
        .path("/")
        .max_age(SESSION_TTL)
        .build()
}
