use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::snapshot::{SessionSnapshot, SnapshotMetadata};
use crate::analysis::{self, Analysis, CrossReferenceResult, SharedValue};
use crate::cancel::CancelToken;
use crate::config::AppConfig;
use crate::error::IngestError;
use crate::extract::{ExtractionResult, Extractor, ValueKind};
use crate::store::{SourceId, SourceTile, TileSnapshot};
use crate::tokenizer;

/// Outcome of ingesting one file
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestReport {
    pub source_id: SourceId,
    pub file_name: String,
    pub rows_scanned: usize,
    /// Distinct values found in this file, per kind
    pub phones: usize,
    pub emails: usize,
    pub ips: usize,
}

impl IngestReport {
    fn new(source_id: &SourceId, file_name: &str, extraction: &ExtractionResult) -> Self {
        Self {
            source_id: source_id.clone(),
            file_name: file_name.to_string(),
            rows_scanned: extraction.rows_scanned,
            phones: extraction.distinct(ValueKind::Phone),
            emails: extraction.distinct(ValueKind::Email),
            ips: extraction.distinct(ValueKind::Ip),
        }
    }
}

/// Every source tile of a run, plus the settings used to fill them.
///
/// Constructed by the caller and passed to every operation; there is no global session.
#[derive(Debug)]
pub struct Session {
    config: AppConfig,
    extractor: Extractor,
    tiles: BTreeMap<SourceId, SourceTile>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(AppConfig::default())
    }
}

impl Session {
    pub fn new(config: AppConfig) -> Self {
        Self {
            extractor: Extractor::new(config.extraction.clone()),
            config,
            tiles: BTreeMap::new(),
        }
    }

    pub fn tile(&self, source_id: &SourceId) -> Option<&SourceTile> {
        self.tiles.get(source_id)
    }

    /// Tiles in source-id order
    pub fn tiles(&self) -> impl Iterator<Item = (&SourceId, &SourceTile)> {
        self.tiles.iter()
    }

    /// Tiles that have ingested at least one file
    pub fn active_tiles(&self) -> Vec<(&SourceId, &SourceTile)> {
        self.tiles.iter().filter(|(_, tile)| tile.is_active()).collect()
    }

    /// Get a tile, creating it (named from the config) on first use
    pub fn open_tile(&mut self, source_id: &SourceId) -> &mut SourceTile {
        self.tiles.entry(source_id.clone()).or_insert_with(|| {
            let name = self.config.source_name(source_id.as_str());
            log::info!("Created tile '{}' for source {}", name, source_id);
            SourceTile::new(&name)
        })
    }

    /// Tokenize, extract and merge one file into a source.
    ///
    /// Extraction completes before anything is merged, so a failing file leaves
    /// the session untouched.
    pub fn ingest(
        &mut self,
        file_name: &str,
        bytes: &[u8],
        source_id: &SourceId,
    ) -> Result<IngestReport, IngestError> {
        let rows = tokenizer::tokenize(file_name, bytes)?;
        let extraction = self.extractor.extract(file_name, rows);
        Ok(self.merge(source_id, file_name, extraction))
    }

    /// Like [`Session::ingest`], checking the token between rows
    pub fn ingest_cancellable(
        &mut self,
        file_name: &str,
        bytes: &[u8],
        source_id: &SourceId,
        cancel: &CancelToken,
    ) -> Result<IngestReport, IngestError> {
        let rows = tokenizer::tokenize(file_name, bytes)?;
        let extraction = self
            .extractor
            .extract_cancellable(file_name, rows, cancel)
            .ok_or_else(|| IngestError::Cancelled {
                file_name: file_name.to_string(),
            })?;
        Ok(self.merge(source_id, file_name, extraction))
    }

    /// Append an extraction to a source's tile
    pub fn merge(
        &mut self,
        source_id: &SourceId,
        file_name: &str,
        extraction: ExtractionResult,
    ) -> IngestReport {
        let report = IngestReport::new(source_id, file_name, &extraction);
        self.open_tile(source_id).merge(file_name, extraction);
        log::info!(
            "Merged {} into source {}: {} phones, {} emails, {} ips",
            file_name,
            source_id,
            report.phones,
            report.emails,
            report.ips
        );
        report
    }

    /// Empty one tile; returns false if the source does not exist
    pub fn clear(&mut self, source_id: &SourceId) -> bool {
        match self.tiles.get_mut(source_id) {
            Some(tile) => {
                tile.clear();
                log::info!("Cleared source {}", source_id);
                true
            }
            None => false,
        }
    }

    /// Drop every tile
    pub fn reset(&mut self) {
        self.tiles.clear();
        log::info!("Session reset");
    }

    pub fn snapshot_tile(&self, source_id: &SourceId) -> Option<TileSnapshot> {
        self.tiles.get(source_id).map(SourceTile::snapshot)
    }

    pub fn restore_tile(&mut self, source_id: &SourceId, snapshot: TileSnapshot) {
        let tile = self.admit(source_id, snapshot);
        self.tiles.insert(source_id.clone(), tile);
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let tiles: BTreeMap<SourceId, TileSnapshot> = self
            .tiles
            .iter()
            .map(|(id, tile)| (id.clone(), tile.snapshot()))
            .collect();
        SessionSnapshot::new(SnapshotMetadata::of(self.tiles.values()), tiles)
    }

    /// Replace every tile with the snapshot's
    pub fn restore(&mut self, snapshot: SessionSnapshot) {
        let tiles: BTreeMap<SourceId, SourceTile> = snapshot
            .tiles
            .into_iter()
            .map(|(id, tile)| {
                let tile = self.admit(&id, tile);
                (id, tile)
            })
            .collect();
        self.tiles = tiles;
        log::info!("Restored {} source tiles", self.tiles.len());
    }

    /// Build a tile from stored state, bringing its keys back to normalized form
    fn admit(&self, source_id: &SourceId, snapshot: TileSnapshot) -> SourceTile {
        let mut tile = SourceTile::from_snapshot(snapshot);
        let changed = tile.renormalize(|kind, value| self.extractor.normalize(kind, value));
        if changed > 0 {
            log::warn!(
                "Source {}: {} stored values were not normalized and have been re-keyed",
                source_id,
                changed
            );
        }
        tile
    }

    /// Per-source value counts for every kind
    pub fn analysis(&self) -> Analysis {
        analysis::summarize(self.tiles.iter())
    }

    /// Values of one kind shared by every active tile
    pub fn cross_reference(&self, kind: ValueKind) -> Vec<CrossReferenceResult> {
        analysis::cross_reference(&self.active_tiles(), kind)
    }

    /// Cross-reference of all kinds: phones, then emails, then IPs
    pub fn analyze_cross_reference(&self) -> Vec<CrossReferenceResult> {
        let active = self.active_tiles();
        ValueKind::ALL
            .iter()
            .flat_map(|&kind| analysis::cross_reference(&active, kind))
            .collect()
    }

    /// `{ value, count }` form of [`Session::analyze_cross_reference`]
    pub fn shared_values(&self) -> Vec<SharedValue> {
        self.analyze_cross_reference()
            .iter()
            .map(SharedValue::from)
            .collect()
    }
}
