use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::extract::ValueKind;
use crate::store::{SourceId, SourceTile};

/// A value present in every tile of an analysis
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrossReferenceResult {
    pub kind: ValueKind,
    pub normalized_value: String,
    /// Number of sources sharing the value
    pub count: usize,
    /// Sum of occurrence counts over all tiles
    pub total_count: usize,
    pub per_source_counts: BTreeMap<SourceId, usize>,
}

/// `{ value, count }` view of a cross-reference result
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharedValue {
    pub kind: ValueKind,
    pub value: String,
    pub count: usize,
}

impl From<&CrossReferenceResult> for SharedValue {
    fn from(result: &CrossReferenceResult) -> Self {
        Self {
            kind: result.kind,
            value: result.normalized_value.clone(),
            count: result.count,
        }
    }
}

/// Values of `kind` present in every given tile, sorted by normalized value.
///
/// Fewer than two tiles have nothing to cross-reference and give an empty result.
pub fn cross_reference(
    stores: &[(&SourceId, &SourceTile)],
    kind: ValueKind,
) -> Vec<CrossReferenceResult> {
    if stores.len() < 2 {
        return Vec::new();
    }

    // walk the smallest map; its keys are already sorted
    let Some((_, smallest)) = stores.iter().min_by_key(|(_, tile)| tile.unique_count(kind)) else {
        return Vec::new();
    };

    let mut results = Vec::new();
    'values: for value in smallest.values(kind).keys() {
        let mut per_source_counts = BTreeMap::new();
        for (id, tile) in stores {
            match tile.values(kind).get(value) {
                Some(occurrences) => {
                    per_source_counts.insert((*id).clone(), occurrences.len());
                }
                None => continue 'values,
            }
        }

        results.push(CrossReferenceResult {
            kind,
            normalized_value: value.clone(),
            count: per_source_counts.len(),
            total_count: per_source_counts.values().sum(),
            per_source_counts,
        });
    }

    log::debug!(
        "Cross-reference of {} over {} sources: {} shared values",
        kind.plural(),
        stores.len(),
        results.len()
    );
    results
}
