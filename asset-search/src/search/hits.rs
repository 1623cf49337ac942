//! Resolution of raw hits to assets.

use std::collections::HashMap;

use tracing::{error, warn};

use asset_search_shared::{Asset, RawHit};

use crate::interfaces::AssetRepository;

/// Assets resolved from a page of hits, with the hit each asset came from.
#[derive(Debug, Clone, Default)]
pub struct ResolvedHits {
    /// Assets in the order their first hit was returned.
    pub assets: Vec<Asset>,
    pub hits_by_identifier: HashMap<String, RawHit>,
}

/// Look up the asset of every hit in the repository.
///
/// An asset returned by several hits is kept once, with its first hit. Hits
/// that cannot be resolved are skipped and reported in one warning. With a
/// `limit` above zero, resolution stops as soon as that many assets were
/// found, leaving the remaining hits unread.
pub async fn convert_hits_to_assets(
    hits: &[RawHit],
    repository: &dyn AssetRepository,
    limit: Option<usize>,
) -> ResolvedHits {
    let mut resolved = ResolvedHits::default();
    let mut unresolved: Vec<&str> = Vec::new();

    for hit in hits {
        let asset = match repository.find_by_identifier(&hit.id).await {
            Ok(Some(asset)) => asset,
            Ok(None) => {
                unresolved.push(&hit.id);
                continue;
            }
            Err(e) => {
                error!(asset = %hit.id, error = %e, "Asset lookup failed");
                unresolved.push(&hit.id);
                continue;
            }
        };

        if resolved.hits_by_identifier.contains_key(&asset.identifier) {
            continue;
        }
        resolved
            .hits_by_identifier
            .insert(asset.identifier.clone(), hit.clone());
        resolved.assets.push(asset);

        if limit.is_some_and(|limit| limit > 0 && resolved.assets.len() >= limit) {
            break;
        }
    }

    if !unresolved.is_empty() {
        warn!(
            hits = hits.len(),
            converted = resolved.assets.len(),
            unresolved = %unresolved.join(", "),
            "Search returned hits that could not be converted to assets"
        );
    }

    resolved
}
