use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::extract::ValueKind;
use crate::store::{SourceId, SourceTile, TileSnapshot};

pub const SNAPSHOT_FORMAT: &str = "CAST_JSON";
pub const CURRENT_VERSION: u32 = 2;

/// Totals recorded alongside a snapshot for quick inspection
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SnapshotMetadata {
    pub total_tiles: usize,
    pub total_phones: usize,
    pub total_emails: usize,
    pub total_ips: usize,
}

impl SnapshotMetadata {
    /// Tile count and distinct values per kind, summed over tiles
    pub fn of<'a>(tiles: impl Iterator<Item = &'a SourceTile>) -> Self {
        let mut metadata = Self::default();
        for tile in tiles {
            metadata.total_tiles += 1;
            metadata.total_phones += tile.unique_count(ValueKind::Phone);
            metadata.total_emails += tile.unique_count(ValueKind::Email);
            metadata.total_ips += tile.unique_count(ValueKind::Ip);
        }
        metadata
    }
}

/// Persisted form of a whole session
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    /// Version for migration purposes
    #[serde(default)]
    pub version: u32,
    pub format: String,
    /// Unix timestamp of when the snapshot was taken
    #[serde(default)]
    pub saved_at: i64,
    #[serde(default)]
    pub metadata: SnapshotMetadata,
    /// Tile state indexed by source id
    #[serde(default)]
    pub tiles: BTreeMap<SourceId, TileSnapshot>,
}

impl SessionSnapshot {
    pub fn new(metadata: SnapshotMetadata, tiles: BTreeMap<SourceId, TileSnapshot>) -> Self {
        Self {
            version: CURRENT_VERSION,
            format: SNAPSHOT_FORMAT.to_string(),
            saved_at: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .as_secs() as i64,
            metadata,
            tiles,
        }
    }
}
