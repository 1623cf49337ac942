//! # Asset Search Shared
//!
//! This crate defines shared data structures and types used across the asset search crates.
//! It includes the asset model handed over by the host repository, the content extracted
//! from asset binaries, the document shape written to the index, and raw search results.

pub mod types;
pub mod utils;

pub use types::asset::{Asset, AssetCollection, Tag};
pub use types::asset_document::{AssetDocument, FulltextBlock, DATE_FORMAT};
pub use types::extracted_content::{ExtractedAttachment, ExtractedContent};
pub use types::search_result::{RawHit, SearchResult};
pub use utils::urlize;
