//! Interfaces to the host content repository.

mod asset_repository;

pub use asset_repository::AssetRepository;
