//! The unit of storage metadata persisted in the catalog.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::FileId;

/// Metadata for one stored file.
///
/// `id`, `file`, `size` and `media_type` are immutable after creation;
/// `last_read` is the only field the catalog ever updates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct FileRecord {
    /// External handle, derived from `file`.
    #[cfg_attr(
        feature = "openapi",
        schema(value_type = String, example = "9f86d081884c7d659a2feaa0c55ad015")
    )]
    pub id: FileId,

    /// Sanitized client-supplied display name, used for `Content-Disposition`
    /// and archive entry names.
    #[cfg_attr(feature = "openapi", schema(example = "report.pdf"))]
    pub name: String,

    /// Internally generated storage file name used for physical lookup.
    #[cfg_attr(
        feature = "openapi",
        schema(example = "0191a0b0c0d0e0f0a1b2c3d4e5f60718_report.pdf")
    )]
    pub file: String,

    /// Byte length at upload time.
    #[cfg_attr(feature = "openapi", schema(example = 1024))]
    pub size: i64,

    /// Client-declared media type.
    #[serde(rename = "type")]
    #[cfg_attr(feature = "openapi", schema(example = "application/pdf"))]
    pub media_type: String,

    /// Timestamp of the most recent successful catalog resolution.
    /// Cache hits do not refresh this field.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_read: Option<DateTime<Utc>>,
}

impl FileRecord {
    /// Build a record for a freshly ingested file, deriving the id from the
    /// storage name.
    #[must_use]
    pub fn new(name: impl Into<String>, file: impl Into<String>, size: i64, media_type: impl Into<String>) -> Self {
        let file = file.into();
        Self {
            id: FileId::from_storage_name(&file),
            name: name.into(),
            file,
            size,
            media_type: media_type.into(),
            last_read: None,
        }
    }
}
