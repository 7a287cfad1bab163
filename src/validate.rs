use time::Date;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;

/// Inclusive upper bound on upload size: exactly 10 MiB is accepted.
pub const MAX_FILE_SIZE: usize = 10 * 1024 * 1024;

const DATE_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// Why an upload input was rejected. One variant per form field, so the API
/// layer can map each to its error code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{0}")]
    StudentId(&'static str),
    #[error("{0}")]
    Date(&'static str),
    /// File-level checks accumulate every violation so the UI can show all
    /// problems at once.
    #[error("file validation failed")]
    File { details: Vec<String> },
}

/// An uploaded file as parsed from the multipart form.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub name: String,
    /// Declared MIME type from the form part, if any.
    pub mime_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// A student number is exactly 7 ASCII digits.
///
/// # Errors
///
/// Returns [`ValidationError::StudentId`] when missing or malformed.
pub fn validate_student_id(value: Option<&str>) -> Result<String, ValidationError> {
    let Some(value) = value.filter(|v| !v.is_empty()) else {
        return Err(ValidationError::StudentId("studentId is required"));
    };
    if value.len() == 7 && value.bytes().all(|b| b.is_ascii_digit()) {
        Ok(value.to_string())
    } else {
        Err(ValidationError::StudentId(
            "studentId must be exactly 7 ASCII digits",
        ))
    }
}

/// A date is `YYYY-MM-DD` and a real calendar date.
///
/// # Errors
///
/// Returns [`ValidationError::Date`] when missing, lexically malformed, or
/// not a real date (e.g. `2024-13-40`).
pub fn validate_date(value: Option<&str>) -> Result<String, ValidationError> {
    let Some(value) = value.filter(|v| !v.is_empty()) else {
        return Err(ValidationError::Date("date is required"));
    };
    if !has_date_shape(value) {
        return Err(ValidationError::Date("date must be in YYYY-MM-DD format"));
    }
    if Date::parse(value, DATE_FORMAT).is_err() {
        return Err(ValidationError::Date("date must be a real calendar date"));
    }
    Ok(value.to_string())
}

fn has_date_shape(s: &str) -> bool {
    let b = s.as_bytes();
    b.len() == 10
        && b[4] == b'-'
        && b[7] == b'-'
        && b.iter()
            .enumerate()
            .all(|(i, c)| i == 4 || i == 7 || c.is_ascii_digit())
}

/// A file must declare `text/plain` and fit within [`MAX_FILE_SIZE`].
///
/// Unlike the per-field checks, every violation is collected before failing.
///
/// # Errors
///
/// Returns [`ValidationError::File`] listing each violation.
pub fn validate_text_file(file: Option<&UploadedFile>) -> Result<(), ValidationError> {
    let Some(file) = file else {
        return Err(ValidationError::File {
            details: vec!["an upload file is required".into()],
        });
    };

    let mut details = Vec::new();
    if file.mime_type.as_deref() != Some("text/plain") {
        details.push("only plain-text (.txt) files are accepted".into());
    }
    if file.bytes.len() > MAX_FILE_SIZE {
        details.push("file size must be 10 MiB or less".into());
    }

    if details.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::File { details })
    }
}

/// Account restriction applied at login time, when a domain is configured.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EmailDomainError {
    #[error("sign in with an @{0} account")]
    WrongDomain(String),
    /// All-digit local parts are shared class accounts, not individuals.
    #[error("this account cannot be used to sign in")]
    SharedAccount,
}

/// The address must belong to `allowed_domain` and name an individual.
///
/// # Errors
///
/// Returns [`EmailDomainError`] for a foreign domain or an all-digit
/// account name.
pub fn validate_email(email: &str, allowed_domain: &str) -> Result<(), EmailDomainError> {
    let Some(local) = email.strip_suffix(allowed_domain).and_then(|e| e.strip_suffix('@'))
    else {
        return Err(EmailDomainError::WrongDomain(allowed_domain.to_string()));
    };
    if !local.is_empty() && local.bytes().all(|b| b.is_ascii_digit()) {
        return Err(EmailDomainError::SharedAccount);
    }
    Ok(())
}
