//! Request and response bodies for the journal workflows.

use serde::{Deserialize, Deserializer, Serialize};
use smol_str::SmolStr;

use crate::error::RemoteError;
use crate::record::{Journal, MediaKind, MediaLists, MediaRef, Recipe, User};

/// A file in transport form: base64 content without any data-URL prefix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncodedFile {
    pub file_name: String,
    pub file_content: String,
    pub content_type: String,
}

/// Cover image fields, flattened into the journal payload when a cover file
/// was uploaded alongside the journal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncodedCover {
    pub cover_image_data: String,
    pub cover_image_name: String,
    pub cover_image_type: String,
}

impl From<EncodedFile> for EncodedCover {
    fn from(file: EncodedFile) -> Self {
        Self {
            cover_image_data: file.file_content,
            cover_image_name: file.file_name,
            cover_image_type: file.content_type,
        }
    }
}

/// Composite body for both the create and the update workflow.
///
/// `new_media` carries encoded bytes for files added in this session,
/// `existing_media` lists the already stored media to keep. Anything stored
/// remotely but missing from `existing_media` is dropped by the update
/// workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalPayload {
    /// Present for updates only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<SmolStr>,
    pub user_id: SmolStr,
    pub title: String,
    pub description: String,
    /// Literal cover URL. Empty when there is none, or when a cover file is
    /// attached instead.
    pub cover_image: String,
    pub recipe: Recipe,
    pub new_media: MediaLists<EncodedFile>,
    pub existing_media: MediaLists<MediaRef>,
    #[serde(flatten)]
    pub cover: Option<EncodedCover>,
}

impl JournalPayload {
    pub fn is_update(&self) -> bool {
        self.id.is_some()
    }
}

/// Body for uploading one file straight into an existing journal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaUpload {
    pub journal_id: SmolStr,
    pub user_id: SmolStr,
    pub media_type: MediaKind,
    #[serde(flatten)]
    pub file: EncodedFile,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub password: &'a str,
}

/// `{success, journal?, error?}` as answered by create and update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub journal: Option<Journal>,
    #[serde(default, deserialize_with = "lenient_error", skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PersistResponse {
    pub fn ok(journal: Option<Journal>) -> Self {
        Self {
            success: true,
            journal,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            journal: None,
            error: Some(error.into()),
        }
    }
}

/// `{success, user?, error?}` as answered by login and register.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default, deserialize_with = "lenient_error")]
    pub error: Option<String>,
}

/// `{success, data?, error?}` as answered by the read and delete workflows.
#[derive(Debug, Clone, Deserialize)]
pub struct DataResponse<T> {
    #[serde(default)]
    pub success: bool,
    #[serde(default = "Option::default")]
    pub data: Option<T>,
    #[serde(default, deserialize_with = "lenient_error")]
    pub error: Option<String>,
}

/// Turn an unsuccessful response into a [`RemoteError::Rejected`].
pub fn rejected(error: Option<String>, fallback: &str) -> RemoteError {
    RemoteError::Rejected(
        error
            .filter(|message| !message.is_empty())
            .unwrap_or_else(|| fallback.to_string()),
    )
}

/// Errors come back as a string, as `{message}`, or as some other object.
fn lenient_error<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.filter(|value| !value.is_null()).map(error_message))
}

/// Readable text of an `error` field.
pub(crate) fn error_message(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Object(ref map) => match map.get("message") {
            Some(serde_json::Value::String(message)) => message.clone(),
            _ => value.to_string(),
        },
        other => other.to_string(),
    }
}
