use axum::extract::{DefaultBodyLimit, Multipart, Query, State};
use axum::http::{HeaderValue, Method, Uri, header};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use axum_extra::extract::PrivateCookieJar;
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::config::{AppConfig, ConfigError};
use super::error::ApiError;
use super::response::{SuccessBody, success};
use super::state::AppState;
use super::cookies;
use crate::drive::FolderProbe;
use crate::error::Error;
use crate::naming;
use crate::session::{Session, ensure_valid};
use crate::validate::{
    MAX_FILE_SIZE, UploadedFile, validate_date, validate_email, validate_student_id,
    validate_text_file,
};

/// Multipart body ceiling: the 10 MiB file plus form-field and framing
/// overhead. An oversized-but-close file must still reach the validator so
/// the client gets `INVALID_FILE` rather than a parse error.
const UPLOAD_BODY_LIMIT: usize = MAX_FILE_SIZE + 1024 * 1024;

const SIGN_IN_REQUIRED: &str = "sign in required";

/// Build the application router.
///
/// # Errors
///
/// Returns [`ConfigError`] if the configured front-end origin is not a valid
/// CORS origin.
pub fn router(config: AppConfig) -> Result<Router, ConfigError> {
    let origin: HeaderValue = config
        .frontend_origin
        .parse()
        .map_err(|e| ConfigError(format!("FRONTEND_ORIGIN: {e}")))?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    let state = AppState::new(config);

    Ok(Router::new()
        .route("/health", get(health))
        .route("/auth/google", get(google_login))
        .route("/auth/google/callback", get(google_callback))
        .route("/auth/logout", post(logout))
        .route("/auth/me", get(me))
        .route(
            "/api/upload",
            post(upload).layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
        .fallback(not_found)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state))
}

// ── Auth ───────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct AuthStatus {
    authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    email: Option<String>,
}

async fn google_login(State(state): State<AppState>) -> Redirect {
    Redirect::to(&state.google.authorization_url())
}

#[derive(Deserialize)]
struct CallbackParams {
    code: Option<String>,
    error: Option<String>,
}

/// OAuth callback. Every failure path redirects back to the front end with
/// an `error` query parameter — this handler never surfaces a 5xx.
async fn google_callback(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
    Query(params): Query<CallbackParams>,
) -> (PrivateCookieJar, Redirect) {
    let frontend = &state.settings.frontend_origin;

    if let Some(error) = &params.error {
        tracing::warn!(error = %error, "OAuth2 error from Google");
        return (jar, front_error(frontend, error));
    }
    let Some(code) = params.code else {
        tracing::warn!("OAuth callback without a code");
        return (jar, front_error(frontend, "missing_code"));
    };

    match complete_login(&state, &code).await {
        Ok(session) => {
            tracing::info!(email = session.user_email.as_deref(), "login successful");
            let jar = cookies::encode(jar, &session, state.settings.secure_cookies);
            (jar, Redirect::to(frontend))
        }
        Err(err) => {
            tracing::error!(error = %err, "OAuth callback failed");
            (jar, front_error(frontend, &err.to_string()))
        }
    }
}

/// Code exchange + identity fetch + (optional) domain check, producing the
/// session to seal into cookies.
async fn complete_login(state: &AppState, code: &str) -> Result<Session, Error> {
    let tokens = state.google.exchange_code(code).await?;
    let user_info = state.google.fetch_user_info(&tokens.access_token).await?;
    if let Some(domain) = &state.settings.allowed_email_domain {
        validate_email(user_info.email.as_deref().unwrap_or_default(), domain)?;
    }
    let token_expiry = tokens.expiry_ms();
    Ok(Session {
        user_email: Some(user_info.email.unwrap_or_else(|| "unknown-user".into())),
        access_token: Some(tokens.access_token),
        refresh_token: tokens.refresh_token,
        token_expiry: Some(token_expiry),
    })
}

fn front_error(frontend: &str, message: &str) -> Redirect {
    Redirect::to(&format!("{frontend}?error={}", urlencoding::encode(message)))
}

async fn logout(jar: PrivateCookieJar) -> (PrivateCookieJar, Json<SuccessBody<AuthStatus>>) {
    (
        cookies::clear(jar),
        success(
            AuthStatus {
                authenticated: false,
                email: None,
            },
            Some("signed out"),
        ),
    )
}

async fn me(jar: PrivateCookieJar) -> Result<Json<SuccessBody<AuthStatus>>, ApiError> {
    let session = cookies::decode(&jar);
    match session.user_email {
        Some(email) => Ok(success(
            AuthStatus {
                authenticated: true,
                email: Some(email),
            },
            None,
        )),
        None => Err(ApiError::AuthRequired(SIGN_IN_REQUIRED)),
    }
}

// ── Upload ─────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UploadReceipt {
    file_id: String,
    original_name: String,
    size: usize,
}

#[derive(Default)]
struct UploadForm {
    student_id: Option<String>,
    date: Option<String>,
    file: Option<UploadedFile>,
}

impl UploadForm {
    async fn from_multipart(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut form = Self::default();
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ApiError::UploadParse(e.to_string()))?
        {
            match field.name() {
                Some("studentId") => {
                    form.student_id = Some(
                        field
                            .text()
                            .await
                            .map_err(|e| ApiError::UploadParse(e.to_string()))?,
                    );
                }
                Some("date") => {
                    form.date = Some(
                        field
                            .text()
                            .await
                            .map_err(|e| ApiError::UploadParse(e.to_string()))?,
                    );
                }
                Some("file") => {
                    let name = field.file_name().unwrap_or("upload.txt").to_string();
                    let mime_type = field.content_type().map(str::to_string);
                    let bytes = field
                        .bytes()
                        .await
                        .map_err(|e| ApiError::UploadParse(e.to_string()))?;
                    form.file = Some(UploadedFile {
                        name,
                        mime_type,
                        bytes: bytes.to_vec(),
                    });
                }
                _ => {}
            }
        }
        Ok(form)
    }
}

/// Validate-then-upload pipeline.
///
/// Order matters: auth check, form parse, field validation (fail-fast per
/// field), credential guard (may refresh), name allocation, Drive write. If
/// a refresh happened, the rewritten session is re-sealed onto the response
/// whether the Drive write succeeded or not.
async fn upload(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
    multipart: Multipart,
) -> Response {
    let mut session = cookies::decode(&jar);
    if !session.is_authenticated() {
        return ApiError::AuthRequired(SIGN_IN_REQUIRED).into_response();
    }

    let form = match UploadForm::from_multipart(multipart).await {
        Ok(form) => form,
        Err(err) => return err.into_response(),
    };

    let validated = validate_student_id(form.student_id.as_deref())
        .and_then(|student_id| Ok((student_id, validate_date(form.date.as_deref())?)))
        .and_then(|fields| {
            validate_text_file(form.file.as_ref())?;
            Ok(fields)
        });
    let (student_id, date) = match validated {
        Ok(fields) => fields,
        Err(err) => return ApiError::from(err).into_response(),
    };
    let Some(file) = form.file else {
        // validate_text_file already rejected the missing-file case
        return ApiError::UploadParse("file field missing".into()).into_response();
    };

    let ensured = match ensure_valid(state.google.as_ref(), &mut session).await {
        Ok(ensured) => ensured,
        Err(err) => return ApiError::from(err).into_response(),
    };

    let result = store_upload(&state, &ensured.credential, &student_id, &date, file).await;

    // A refreshed token must reach the client even when the write failed,
    // so the next attempt skips the refresh.
    let jar = if ensured.refreshed {
        cookies::encode(jar, &session, state.settings.secure_cookies)
    } else {
        jar
    };

    match result {
        Ok(receipt) => {
            tracing::info!(file_id = %receipt.file_id, name = %receipt.original_name, "file uploaded");
            (jar, success(receipt, Some("file saved to Google Drive"))).into_response()
        }
        Err(err) => (jar, ApiError::from(err)).into_response(),
    }
}

async fn store_upload(
    state: &AppState,
    credential: &crate::session::Credential,
    student_id: &str,
    date: &str,
    file: UploadedFile,
) -> Result<UploadReceipt, Error> {
    let folder_id = state.settings.drive_folder_id.as_deref();
    let probe = FolderProbe::new(&state.drive, credential, folder_id);
    let name = naming::allocate(&probe, student_id, date).await?;
    let size = file.bytes.len();
    let file_id = state
        .drive
        .upload(credential, &name, file.bytes, folder_id)
        .await?;
    Ok(UploadReceipt {
        file_id,
        original_name: file.name,
        size,
    })
}

// ── Misc ───────────────────────────────────────────────────────────

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn not_found(uri: Uri) -> ApiError {
    ApiError::NotFound(uri.path().to_string())
}
