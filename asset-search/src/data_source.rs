//! Option lists of tags and collections for search forms.

use serde::Serialize;

use asset_search_shared::urlize;

use crate::interfaces::AssetRepository;
use crate::AssetSearchError;

/// One selectable option: the value written into a query and its display label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DataSourceOption {
    pub value: String,
    pub label: String,
}

/// Options for every tag, valued with the urlized label the index stores.
///
/// With a collection identifier, only tags used by assets of that collection
/// are listed. An unknown collection yields no options.
pub async fn asset_tag_options(
    repository: &dyn AssetRepository,
    collection: Option<&str>,
) -> Result<Vec<DataSourceOption>, AssetSearchError> {
    let tags = match collection {
        Some(identifier) => {
            let collection = repository
                .find_collections()
                .await?
                .into_iter()
                .find(|collection| collection.identifier == identifier);
            match collection {
                Some(collection) => repository.find_tags(Some(&collection)).await?,
                None => Vec::new(),
            }
        }
        None => repository.find_tags(None).await?,
    };

    Ok(tags
        .into_iter()
        .map(|tag| DataSourceOption {
            value: urlize(&tag.label),
            label: tag.label,
        })
        .collect())
}

/// Options for every collection, valued with the collection identifier.
pub async fn asset_collection_options(
    repository: &dyn AssetRepository,
) -> Result<Vec<DataSourceOption>, AssetSearchError> {
    Ok(repository
        .find_collections()
        .await?
        .into_iter()
        .map(|collection| DataSourceOption {
            value: collection.identifier,
            label: collection.title,
        })
        .collect())
}
