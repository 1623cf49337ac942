//! This module defines the core data structures and types used across the asset search crates.

pub mod asset;
pub mod asset_document;
pub mod extracted_content;
pub mod search_result;
