//! Wire types shared between the relay server and its clients.

use serde::{Deserialize, Serialize};

/// MIME type Google Drive uses for folders.
///
/// Consumers distinguish folders from files by comparing against this exact
/// sentinel string.
pub const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";

/// MIME type prefix shared by Google editor documents (Docs, Sheets, ...).
///
/// These have no binary content and cannot be downloaded without an export
/// conversion, which the relay does not support.
pub const GOOGLE_EDITOR_PREFIX: &str = "application/vnd.google-apps";

/// A single Drive entry as relayed to the presentation layer.
///
/// Fields mirror the fixed projection the relay requests from Drive:
/// `files(id,name,mimeType,webViewLink,iconLink)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileEntry {
    /// Drive file ID.
    pub id: String,
    /// File name.
    pub name: String,
    /// MIME type.
    pub mime_type: String,
    /// Link for viewing the file in the Drive UI.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web_view_link: Option<String>,
    /// Link to the file-type icon.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_link: Option<String>,
}

impl FileEntry {
    /// Check if this entry is a folder.
    pub fn is_folder(&self) -> bool {
        self.mime_type == FOLDER_MIME_TYPE
    }
}

/// Structured Drive list query: folder scoping plus an optional name filter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileQuery {
    /// Folder whose children are listed.
    pub folder_id: String,
    /// Optional substring to match against file names.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_contains: Option<String>,
}

impl FileQuery {
    /// Query for the children of a folder.
    pub fn children_of(folder_id: impl Into<String>) -> Self {
        Self {
            folder_id: folder_id.into(),
            name_contains: None,
        }
    }

    /// Restrict the query to names containing the given substring.
    pub fn with_name_contains(mut self, needle: impl Into<String>) -> Self {
        self.name_contains = Some(needle.into());
        self
    }

    /// Render the Drive query string.
    ///
    /// Single quotes in the name filter are backslash-escaped so user input
    /// cannot break out of the quoted clause.
    pub fn to_drive_query(&self) -> String {
        let mut query = format!("'{}' in parents and trashed=false", self.folder_id);
        if let Some(needle) = &self.name_contains {
            let escaped = needle.replace('\'', "\\'");
            query.push_str(&format!(" and name contains '{}'", escaped));
        }
        query
    }
}

// ── HTTP payloads ──────────────────────────────────────────────────

/// Body of `POST /auth/google`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthCodeRequest {
    /// One-time authorization code from the OAuth2 consent flow.
    pub code: String,
}

/// Minimal user profile returned alongside the access token.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Response of `POST /auth/google`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub access_token: String,
    pub user: UserProfile,
}

/// Response of `POST /auth/refresh`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub access_token: String,
}

/// Generic success message body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Structured error body returned by the relay on every failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Body of `POST /drive/files`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListFilesRequest {
    /// Raw Drive query string, typically built with [`FileQuery`].
    pub query: String,
}

/// Body of `POST /drive/downloadFile`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadRequest {
    pub file_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_entry_is_folder() {
        let folder = FileEntry {
            id: "1".to_string(),
            name: "docs".to_string(),
            mime_type: FOLDER_MIME_TYPE.to_string(),
            web_view_link: None,
            icon_link: None,
        };
        assert!(folder.is_folder());

        let file = FileEntry {
            id: "2".to_string(),
            name: "notes.txt".to_string(),
            mime_type: "text/plain".to_string(),
            web_view_link: None,
            icon_link: None,
        };
        assert!(!file.is_folder());
    }

    #[test]
    fn test_file_entry_wire_shape() {
        let json = r#"{"id":"abc","name":"report.pdf","mimeType":"application/pdf","webViewLink":"https://drive.google.com/file/d/abc/view","iconLink":"https://drive.google.com/icon.png"}"#;
        let entry: FileEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.mime_type, "application/pdf");
        assert!(entry.web_view_link.is_some());

        let roundtrip = serde_json::to_string(&entry).unwrap();
        assert!(roundtrip.contains("\"mimeType\""));
        assert!(roundtrip.contains("\"webViewLink\""));
    }

    #[test]
    fn test_query_children_of_root() {
        let query = FileQuery::children_of("root").to_drive_query();
        assert_eq!(query, "'root' in parents and trashed=false");
    }

    #[test]
    fn test_query_name_filter_escapes_quotes() {
        let query = FileQuery::children_of("folder1")
            .with_name_contains("bob's files")
            .to_drive_query();
        assert_eq!(
            query,
            "'folder1' in parents and trashed=false and name contains 'bob\\'s files'"
        );
    }

    #[test]
    fn test_login_response_wire_shape() {
        let resp = LoginResponse {
            access_token: "ya29.token".to_string(),
            user: UserProfile::default(),
        };
        let json = serde_json::to_string(&resp).unwrap();
        assert_eq!(json, r#"{"accessToken":"ya29.token","user":{}}"#);
    }

    #[test]
    fn test_download_request_wire_shape() {
        let req: DownloadRequest = serde_json::from_str(r#"{"fileId":"f-1"}"#).unwrap();
        assert_eq!(req.file_id, "f-1");
    }
}
