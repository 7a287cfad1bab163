use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use url::Url;

use crate::error::Error;
use crate::google::failure_detail;
use crate::naming::NameProbe;
use crate::session::Credential;

const DRIVE_UPLOAD_URL: &str = "https://www.googleapis.com/upload/drive/v3/files";
const DRIVE_FILES_URL: &str = "https://www.googleapis.com/drive/v3/files";

#[derive(Debug, Deserialize)]
struct DriveFile {
    #[serde(default)]
    id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DriveFileList {
    #[serde(default)]
    files: Vec<DriveFile>,
}

/// Authenticated client for the Drive v3 files API.
///
/// Holds no credential of its own: every call takes the request's
/// [`Credential`], since tokens live in the client's cookies, not the server.
pub struct DriveClient {
    http: reqwest::Client,
    upload_url: Url,
    files_url: Url,
}

impl Default for DriveClient {
    fn default() -> Self {
        Self::new()
    }
}

impl DriveClient {
    #[must_use]
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
            upload_url: DRIVE_UPLOAD_URL.parse().expect("valid default URL"),
            files_url: DRIVE_FILES_URL.parse().expect("valid default URL"),
        }
    }

    /// Use a custom HTTP client (for connection pool reuse or testing).
    #[must_use]
    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.http = client;
        self
    }

    /// Override the multipart upload endpoint.
    #[must_use]
    pub fn with_upload_url(mut self, url: Url) -> Self {
        self.upload_url = url;
        self
    }

    /// Override the file listing endpoint.
    #[must_use]
    pub fn with_files_url(mut self, url: Url) -> Self {
        self.files_url = url;
        self
    }

    /// Upload `content` as `name`, optionally into a folder.
    ///
    /// One multipart POST: a JSON metadata part (`name`, optional `parents`)
    /// plus the raw content. Returns Drive's assigned file id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DriveUpload`] on a non-success status, or
    /// [`Error::DriveResponseMissingId`] if the success body has no `id`.
    pub async fn upload(
        &self,
        credential: &Credential,
        name: &str,
        content: Vec<u8>,
        folder_id: Option<&str>,
    ) -> Result<String, Error> {
        let metadata = match folder_id {
            Some(folder) => serde_json::json!({ "name": name, "parents": [folder] }),
            None => serde_json::json!({ "name": name }),
        };
        let form = Form::new()
            .part(
                "metadata",
                Part::text(metadata.to_string()).mime_str("application/json")?,
            )
            .part(
                "file",
                Part::bytes(content)
                    .file_name(name.to_string())
                    .mime_str("text/plain")?,
            );

        let mut url = self.upload_url.clone();
        url.query_pairs_mut().append_pair("uploadType", "multipart");
        if folder_id.is_some() {
            url.query_pairs_mut().append_pair("supportsAllDrives", "true");
        }

        let response = self
            .http
            .post(url)
            .bearer_auth(&credential.access_token)
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            let (status, detail) = failure_detail(response).await;
            return Err(Error::DriveUpload { status, detail });
        }

        let file = response.json::<DriveFile>().await?;
        file.id.ok_or(Error::DriveResponseMissingId)
    }

    /// Whether an object named `name` already exists at the target location.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DriveList`] on a non-success status.
    pub async fn exists(
        &self,
        credential: &Credential,
        name: &str,
        folder_id: Option<&str>,
    ) -> Result<bool, Error> {
        let mut url = self.files_url.clone();
        url.query_pairs_mut()
            .append_pair("q", &list_query(name, folder_id))
            .append_pair("fields", "files(id)")
            .append_pair("pageSize", "1");
        if folder_id.is_some() {
            url.query_pairs_mut()
                .append_pair("supportsAllDrives", "true")
                .append_pair("includeItemsFromAllDrives", "true");
        }

        let response = self
            .http
            .get(url)
            .bearer_auth(&credential.access_token)
            .send()
            .await?;

        if !response.status().is_success() {
            let (status, detail) = failure_detail(response).await;
            return Err(Error::DriveList { status, detail });
        }

        let listing = response.json::<DriveFileList>().await?;
        Ok(!listing.files.is_empty())
    }
}

/// Drive `files.list` query for an exact, non-trashed name match.
fn list_query(name: &str, folder_id: Option<&str>) -> String {
    // Drive query strings use backslash escapes inside single quotes.
    let escaped = name.replace('\\', "\\\\").replace('\'', "\\'");
    match folder_id {
        Some(folder) => format!("name = '{escaped}' and '{folder}' in parents and trashed = false"),
        None => format!("name = '{escaped}' and trashed = false"),
    }
}

/// Per-request [`NameProbe`] binding a Drive client to one credential and
/// target folder.
pub struct FolderProbe<'a> {
    drive: &'a DriveClient,
    credential: &'a Credential,
    folder_id: Option<&'a str>,
}

impl<'a> FolderProbe<'a> {
    #[must_use]
    pub fn new(
        drive: &'a DriveClient,
        credential: &'a Credential,
        folder_id: Option<&'a str>,
    ) -> Self {
        Self {
            drive,
            credential,
            folder_id,
        }
    }
}

impl NameProbe for FolderProbe<'_> {
    async fn exists(&self, name: &str) -> Result<bool, Error> {
        self.drive.exists(self.credential, name, self.folder_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_query_without_folder() {
        assert_eq!(
            list_query("1234567_2024-01-02.txt", None),
            "name = '1234567_2024-01-02.txt' and trashed = false"
        );
    }

    #[test]
    fn list_query_scopes_to_folder() {
        assert_eq!(
            list_query("a.txt", Some("folder-1")),
            "name = 'a.txt' and 'folder-1' in parents and trashed = false"
        );
    }

    #[test]
    fn list_query_escapes_quotes() {
        assert_eq!(
            list_query("it's.txt", None),
            "name = 'it\\'s.txt' and trashed = false"
        );
    }
}
