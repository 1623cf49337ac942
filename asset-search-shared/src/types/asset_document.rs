//! Document shapes written to the asset index.
//!
//! Every asset produces two documents worth of data: the structured fields used for
//! filtering and sorting, and a fulltext block whose sections are weighted differently
//! at query time.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::types::asset::Asset;
use crate::types::extracted_content::ExtractedContent;

/// Timestamp format used for every date written to or compared against the index.
pub const DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%:z";

/// A trailing file extension of three or four characters.
static FILE_EXTENSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.[^.\s]{3,4}$").expect("Invalid file extension regex"));

/// Structured fields of an indexed asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetDocument {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub copyright_notice: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<String>,
    pub collections: Vec<String>,
    pub tags: Vec<String>,
    pub content_length: u64,
    pub content_type: String,
    pub file_size: u64,
    pub filename: String,
}

impl AssetDocument {
    /// Build the structured fields from an asset and the content extracted from its resource.
    ///
    /// The asset's own title wins over the extracted one, and the host media type is
    /// used when extraction did not report a content type.
    pub fn from_asset(asset: &Asset, content: &ExtractedContent) -> Self {
        let title = asset
            .title
            .clone()
            .filter(|title| !title.is_empty())
            .or_else(|| non_empty(content.title()));
        let content_type =
            non_empty(content.content_type()).unwrap_or_else(|| asset.media_type.clone());

        Self {
            title,
            caption: asset.caption.clone(),
            copyright_notice: asset.copyright_notice.clone(),
            last_modified: asset
                .last_modified
                .map(|date| date.format(DATE_FORMAT).to_string()),
            collections: asset
                .collections
                .iter()
                .map(|collection| collection.identifier.clone())
                .collect(),
            tags: asset.tags.iter().map(|tag| tag.urlized_label()).collect(),
            content_length: content.content_length(),
            content_type,
            file_size: asset.file_size,
            filename: asset.filename.clone(),
        }
    }
}

/// Fulltext sections of an indexed asset, from most to least relevant.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FulltextBlock {
    pub h1: String,
    pub h2: String,
    pub h3: String,
    pub text: String,
}

impl FulltextBlock {
    /// Map title, caption, filename plus copyright, and body text onto the sections.
    pub fn from_asset(asset: &Asset, content: &ExtractedContent) -> Self {
        let title = asset.title.as_deref().unwrap_or_default();
        let copyright = asset.copyright_notice.as_deref().unwrap_or_default();

        Self {
            h1: format!("{} {}", title, content.title()).trim().to_string(),
            h2: asset.caption.clone().unwrap_or_default(),
            h3: format!("{} {}", sanitize_filename(&asset.filename), copyright)
                .trim()
                .to_string(),
            text: content.content().to_string(),
        }
    }
}

/// Strip the extension and turn word separators into spaces so filenames are searchable.
fn sanitize_filename(filename: &str) -> String {
    FILE_EXTENSION
        .replace(filename, "")
        .replace(['_', '-'], " ")
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::asset::{AssetCollection, Tag};
    use crate::types::extracted_content::ExtractedAttachment;
    use chrono::{TimeZone, Utc};

    fn extracted(title: &str, content_type: &str) -> ExtractedContent {
        ExtractedContent::from(ExtractedAttachment {
            content: "Body  text".to_string(),
            title: title.to_string(),
            content_type: content_type.to_string(),
            content_length: 9,
            ..Default::default()
        })
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("annual_report-2023.pdf"), "annual report 2023");
        assert_eq!(sanitize_filename("photo.jpeg"), "photo");
        assert_eq!(sanitize_filename("archive.gz"), "archive.gz");
        assert_eq!(sanitize_filename("no extension"), "no extension");
    }

    #[test]
    fn test_document_fields() {
        let asset = Asset::new("a1", "report.pdf", 1024)
            .with_caption("Caption")
            .with_tag(Tag::new("t1", "Press Kit"))
            .with_collection(AssetCollection::new("c1", "Marketing"))
            .with_media_type("application/pdf")
            .with_last_modified(Utc.with_ymd_and_hms(2023, 5, 1, 12, 0, 0).unwrap());

        let document = AssetDocument::from_asset(&asset, &extracted("Extracted", ""));

        assert_eq!(document.title.as_deref(), Some("Extracted"));
        assert_eq!(document.tags, vec!["press-kit".to_string()]);
        assert_eq!(document.collections, vec!["c1".to_string()]);
        assert_eq!(document.content_type, "application/pdf");
        assert_eq!(document.file_size, 1024);
        assert_eq!(
            document.last_modified.as_deref(),
            Some("2023-05-01T12:00:00+00:00")
        );

        let json = serde_json::to_value(&document).unwrap();
        assert_eq!(json["contentLength"], 9);
        assert_eq!(json["fileSize"], 1024);
        assert!(json.get("copyrightNotice").is_none());
    }

    #[test]
    fn test_asset_title_wins_over_extracted_title() {
        let asset = Asset::new("a1", "report.pdf", 1).with_title("Own");
        let document = AssetDocument::from_asset(&asset, &extracted("Extracted", "text/plain"));
        assert_eq!(document.title.as_deref(), Some("Own"));
        assert_eq!(document.content_type, "text/plain");
    }

    #[test]
    fn test_fulltext_sections() {
        let asset = Asset::new("a1", "annual_report.pdf", 1)
            .with_title("Report")
            .with_caption("The caption")
            .with_copyright_notice("ACME");

        let block = FulltextBlock::from_asset(&asset, &extracted("Extracted", ""));

        assert_eq!(block.h1, "Report Extracted");
        assert_eq!(block.h2, "The caption");
        assert_eq!(block.h3, "annual report ACME");
        assert_eq!(block.text, "Body text");
    }

    #[test]
    fn test_fulltext_sections_without_metadata() {
        let asset = Asset::new("a1", "scan.tiff", 1);
        let block = FulltextBlock::from_asset(&asset, &ExtractedContent::empty());
        assert_eq!(block.h1, "");
        assert_eq!(block.h3, "scan");
        assert_eq!(block.text, "");
    }
}
