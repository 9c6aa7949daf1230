use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{MediaError, MediaResult};

/// Unique identifier for a media asset record
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AssetId(pub String);

impl AssetId {
    /// Generate a new random asset ID
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from existing string
    pub fn from_string(id: String) -> Self {
        Self(id)
    }

    /// Get the inner string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for AssetId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&str> for AssetId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl std::fmt::Display for AssetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Reject blank ids before any side effect
pub(crate) fn require_id(id: &AssetId) -> MediaResult<()> {
    if id.as_str().trim().is_empty() {
        return Err(MediaError::validation("Media id is required"));
    }
    Ok(())
}

/// Broad family of an uploaded file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MediaType {
    Image,
    Video,
    Pdf,
    Other,
}

impl MediaType {
    /// Classify a mime type
    pub fn from_mime(mime: &str) -> Self {
        let essence = mime.split(';').next().unwrap_or_default().trim().to_ascii_lowercase();
        if essence.starts_with("image/") {
            Self::Image
        } else if essence.starts_with("video/") {
            Self::Video
        } else if essence == "application/pdf" {
            Self::Pdf
        } else {
            Self::Other
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Image => "IMAGE",
            Self::Video => "VIDEO",
            Self::Pdf => "PDF",
            Self::Other => "OTHER",
        }
    }
}

impl std::fmt::Display for MediaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Metadata record for a stored object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaAsset {
    pub id: AssetId,

    /// Public URL, derived from the storage key
    pub url: String,

    #[serde(rename = "type")]
    pub media_type: MediaType,

    /// Display name, renameable independently of the stored object
    pub filename: String,

    /// Length of the stored bytes (after compression for images)
    pub size: u64,

    pub uploader_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields for a new record
#[derive(Debug, Clone, PartialEq)]
pub struct NewAsset {
    pub url: String,
    pub media_type: MediaType,
    pub filename: String,
    pub size: u64,
    pub uploader_id: String,
}

/// Fields replaced when an asset's bytes are swapped
#[derive(Debug, Clone, PartialEq)]
pub struct AssetUpdate {
    pub url: String,
    pub media_type: MediaType,
    pub filename: String,
    pub size: u64,
}

/// A file handed to the pipeline by the upload boundary
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub name: String,
    pub mime_type: String,
    pub bytes: Bytes,
}

impl UploadFile {
    pub fn new<N, M, B>(name: N, mime_type: M, bytes: B) -> Self
    where
        N: Into<String>,
        M: Into<String>,
        B: Into<Bytes>,
    {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            bytes: bytes.into(),
        }
    }

    pub fn media_type(&self) -> MediaType {
        MediaType::from_mime(&self.mime_type)
    }
}

/// Role of the acting principal, as decided by the authorization layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Member,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Member => "member",
            Self::Admin => "admin",
        }
    }
}

/// Context for pipeline operations: the trusted principal and request info
#[derive(Debug, Clone)]
pub struct MediaCtx {
    pub actor_id: String,
    pub role: Role,
    pub request_id: String,
}

impl MediaCtx {
    pub fn new<S: Into<String>>(actor_id: S) -> Self {
        Self {
            actor_id: actor_id.into(),
            role: Role::Member,
            request_id: Uuid::new_v4().to_string(),
        }
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }

    pub fn with_request_id<S: Into<String>>(mut self, request_id: S) -> Self {
        self.request_id = request_id.into();
        self
    }
}

/// One asset whose stored object could not be removed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageFailure {
    pub asset_id: AssetId,
    pub key: String,
    pub message: String,
}

/// Outcome of a bulk delete.
///
/// Storage failures are informational: the metadata records are gone either way.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteReport {
    /// Distinct ids asked for
    pub requested: usize,
    pub deleted_count: u64,
    pub storage_errors: Vec<StorageFailure>,
}

impl DeleteReport {
    pub fn has_storage_errors(&self) -> bool {
        !self.storage_errors.is_empty()
    }

    /// Human readable summary, e.g. `"deleted 2 of 3 media (1 storage cleanup failed)"`
    pub fn summary(&self) -> String {
        let mut summary = format!("deleted {} of {} media", self.deleted_count, self.requested);
        if self.has_storage_errors() {
            summary.push_str(&format!(
                " ({} storage cleanup failed)",
                self.storage_errors.len()
            ));
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn media_type_from_mime() {
        assert_eq!(MediaType::from_mime("image/png"), MediaType::Image);
        assert_eq!(MediaType::from_mime("Video/MP4"), MediaType::Video);
        assert_eq!(MediaType::from_mime("application/pdf"), MediaType::Pdf);
        assert_eq!(MediaType::from_mime("application/zip"), MediaType::Other);
        assert_eq!(MediaType::from_mime(""), MediaType::Other);
    }

    #[test]
    fn report_summary_mentions_storage_failures() {
        let report = DeleteReport {
            requested: 3,
            deleted_count: 2,
            storage_errors: vec![StorageFailure {
                asset_id: AssetId::from("a"),
                key: "k".into(),
                message: "boom".into(),
            }],
        };
        assert_eq!(report.summary(), "deleted 2 of 3 media (1 storage cleanup failed)");
    }
}
