//! Asset model as exposed by the host repository.
//!
//! The host owns persistence; these types only carry the accessors the indexer and the
//! query side need (identifier, file metadata, descriptive texts, tags, collections).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::utils::urlize;

/// A tag that can be attached to assets.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tag {
    pub identifier: String,
    pub label: String,
}

impl Tag {
    pub fn new(identifier: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            label: label.into(),
        }
    }

    /// The label in the form stored in the `tags` field of the index.
    pub fn urlized_label(&self) -> String {
        urlize(&self.label)
    }
}

/// A collection grouping assets together.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssetCollection {
    pub identifier: String,
    pub title: String,
}

impl AssetCollection {
    pub fn new(identifier: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            title: title.into(),
        }
    }
}

/// A binary asset (document, image, PDF, ...) managed by the host repository.
///
/// The `identifier` is stable across the asset's lifetime and is used as the
/// document id in the search index.
///
/// # Fields
///
/// - `identifier`: Stable identifier, also the index document id
/// - `filename`: Original filename of the resource
/// - `file_size`: Size of the resource in bytes
/// - `media_type`: MIME type as known by the host
/// - `title`, `caption`, `copyright_notice`: Optional descriptive texts
/// - `tags`, `collections`: Classification assigned in the host
/// - `last_modified`: Last modification timestamp, if tracked
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    pub identifier: String,
    pub filename: String,
    pub file_size: u64,
    #[serde(default)]
    pub media_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub copyright_notice: Option<String>,
    #[serde(default)]
    pub tags: Vec<Tag>,
    #[serde(default)]
    pub collections: Vec<AssetCollection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<DateTime<Utc>>,
}

impl Asset {
    /// Create an asset with only its file metadata set.
    ///
    /// # Arguments
    ///
    /// * `identifier` - The stable identifier of the asset
    /// * `filename` - The original filename of the resource
    /// * `file_size` - The size of the resource in bytes
    ///
    /// # Example
    ///
    /// ```
    /// use asset_search_shared::Asset;
    ///
    /// let asset = Asset::new("a1", "report.pdf", 2048)
    ///     .with_title("Annual report")
    ///     .with_media_type("application/pdf");
    /// assert_eq!(asset.title.as_deref(), Some("Annual report"));
    /// ```
    pub fn new(identifier: impl Into<String>, filename: impl Into<String>, file_size: u64) -> Self {
        Self {
            identifier: identifier.into(),
            filename: filename.into(),
            file_size,
            media_type: String::new(),
            title: None,
            caption: None,
            copyright_notice: None,
            tags: Vec::new(),
            collections: Vec::new(),
            last_modified: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = Some(caption.into());
        self
    }

    pub fn with_copyright_notice(mut self, notice: impl Into<String>) -> Self {
        self.copyright_notice = Some(notice.into());
        self
    }

    pub fn with_media_type(mut self, media_type: impl Into<String>) -> Self {
        self.media_type = media_type.into();
        self
    }

    pub fn with_tag(mut self, tag: Tag) -> Self {
        self.tags.push(tag);
        self
    }

    pub fn with_collection(mut self, collection: AssetCollection) -> Self {
        self.collections.push(collection);
        self
    }

    pub fn with_last_modified(mut self, last_modified: DateTime<Utc>) -> Self {
        self.last_modified = Some(last_modified);
        self
    }
}
