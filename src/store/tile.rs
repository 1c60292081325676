use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::extract::{ExtractionResult, ValueKind, ValueMap};

/// One ingestion bucket: the files dropped into a source and every value found in them
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceTile {
    name: String,
    /// Ingested file names in drop order, repeats included
    files: Vec<String>,
    phones: ValueMap,
    emails: ValueMap,
    ips: ValueMap,
    /// Unix timestamp of creation
    created_at: i64,
}

/// Serializable state of a tile
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TileSnapshot {
    pub name: String,
    #[serde(default)]
    pub files: Vec<String>,
    #[serde(default)]
    pub phone_rows: ValueMap,
    #[serde(default)]
    pub email_rows: ValueMap,
    #[serde(default)]
    pub ip_rows: ValueMap,
    #[serde(default)]
    pub created_at: i64,
}

impl SourceTile {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            files: Vec::new(),
            phones: ValueMap::new(),
            emails: ValueMap::new(),
            ips: ValueMap::new(),
            created_at: now_timestamp(),
        }
    }

    pub fn from_snapshot(snapshot: TileSnapshot) -> Self {
        Self {
            name: snapshot.name,
            files: snapshot.files,
            phones: snapshot.phone_rows,
            emails: snapshot.email_rows,
            ips: snapshot.ip_rows,
            created_at: snapshot.created_at,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn files(&self) -> &[String] {
        &self.files
    }

    /// A tile takes part in cross-referencing once it has ingested a file
    pub fn is_active(&self) -> bool {
        !self.files.is_empty()
    }

    pub fn values(&self, kind: ValueKind) -> &ValueMap {
        match kind {
            ValueKind::Phone => &self.phones,
            ValueKind::Email => &self.emails,
            ValueKind::Ip => &self.ips,
        }
    }

    fn values_mut(&mut self, kind: ValueKind) -> &mut ValueMap {
        match kind {
            ValueKind::Phone => &mut self.phones,
            ValueKind::Email => &mut self.emails,
            ValueKind::Ip => &mut self.ips,
        }
    }

    /// Number of recorded occurrences of a value (0 if absent)
    pub fn occurrence_count(&self, kind: ValueKind, value: &str) -> usize {
        self.values(kind).get(value).map_or(0, Vec::len)
    }

    /// Number of distinct values of a kind
    pub fn unique_count(&self, kind: ValueKind) -> usize {
        self.values(kind).len()
    }

    /// Occurrences across every kind
    pub fn occurrence_total(&self) -> usize {
        ValueKind::ALL
            .iter()
            .flat_map(|&kind| self.values(kind).values())
            .map(Vec::len)
            .sum()
    }

    /// File names ingested more than once, in first-drop order
    pub fn duplicate_files(&self) -> Vec<&str> {
        let mut seen: HashMap<&str, usize> = HashMap::new();
        for file in &self.files {
            *seen.entry(file.as_str()).or_default() += 1;
        }

        let mut duplicates = Vec::new();
        for file in &self.files {
            let repeated = seen.get(file.as_str()).copied().unwrap_or(0) > 1;
            if repeated && !duplicates.contains(&file.as_str()) {
                duplicates.push(file.as_str());
            }
        }
        duplicates
    }

    /// Append a file's extraction to the tile.
    ///
    /// The file name is always appended, and occurrences are appended to existing
    /// lists: merging the same file twice doubles its occurrences.
    pub fn merge(&mut self, file_name: &str, extraction: ExtractionResult) {
        if self.files.iter().any(|f| f == file_name) {
            log::warn!(
                "{} was already ingested into {}; its occurrences will be counted again",
                file_name,
                self.name
            );
        }
        self.files.push(file_name.to_string());

        let ExtractionResult {
            phones, emails, ips, ..
        } = extraction;
        for (kind, incoming) in [
            (ValueKind::Phone, phones),
            (ValueKind::Email, emails),
            (ValueKind::Ip, ips),
        ] {
            let existing = self.values_mut(kind);
            for (value, occurrences) in incoming {
                existing.entry(value).or_default().extend(occurrences);
            }
        }
    }

    /// Re-key every value through `normalize`.
    ///
    /// Keys that collapse onto one normalized value have their occurrence lists joined;
    /// keys `normalize` rejects are dropped. Returns how many keys changed or were dropped.
    pub fn renormalize<F>(&mut self, normalize: F) -> usize
    where
        F: Fn(ValueKind, &str) -> Option<String>,
    {
        let mut changed = 0;
        for kind in ValueKind::ALL {
            let stored = std::mem::take(self.values_mut(kind));
            let mut rebuilt = ValueMap::new();
            for (value, occurrences) in stored {
                match normalize(kind, &value) {
                    Some(normalized) => {
                        if normalized != value {
                            changed += 1;
                        }
                        rebuilt.entry(normalized).or_default().extend(occurrences);
                    }
                    None => {
                        log::warn!("Dropping invalid {} '{}' from {}", kind, value, self.name);
                        changed += 1;
                    }
                }
            }
            *self.values_mut(kind) = rebuilt;
        }
        changed
    }

    /// Forget every file and value; the name is kept
    pub fn clear(&mut self) {
        self.files.clear();
        self.phones.clear();
        self.emails.clear();
        self.ips.clear();
    }

    pub fn snapshot(&self) -> TileSnapshot {
        TileSnapshot {
            name: self.name.clone(),
            files: self.files.clone(),
            phone_rows: self.phones.clone(),
            email_rows: self.emails.clone(),
            ip_rows: self.ips.clone(),
            created_at: self.created_at,
        }
    }

    /// Replace the whole state of the tile with a snapshot
    pub fn restore(&mut self, snapshot: TileSnapshot) {
        *self = Self::from_snapshot(snapshot);
    }
}

fn now_timestamp() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::{ExtractedValue, Occurrence};

    fn extraction(file_name: &str, entries: &[(ValueKind, &str, usize)]) -> ExtractionResult {
        let mut result = ExtractionResult::default();
        for &(kind, value, row_index) in entries {
            result.record(
                ExtractedValue {
                    kind,
                    normalized_value: value.to_string(),
                },
                Occurrence {
                    file_name: file_name.to_string(),
                    row_index,
                    row_text: format!("row {}", row_index),
                },
            );
        }
        result
    }

    #[test]
    fn test_merge_creates_entries() {
        let mut tile = SourceTile::new("Source 1");
        tile.merge(
            "a.csv",
            extraction("a.csv", &[(ValueKind::Email, "j@x.com", 1), (ValueKind::Phone, "5551112222", 1)]),
        );

        assert_eq!(tile.files(), &["a.csv".to_string()]);
        assert_eq!(tile.occurrence_count(ValueKind::Email, "j@x.com"), 1);
        assert_eq!(tile.occurrence_count(ValueKind::Phone, "5551112222"), 1);
        assert_eq!(tile.occurrence_count(ValueKind::Ip, "1.1.1.1"), 0);
        assert!(tile.is_active());
    }

    #[test]
    fn test_merging_twice_doubles_counts() {
        let batch = extraction(
            "a.csv",
            &[
                (ValueKind::Email, "j@x.com", 1),
                (ValueKind::Email, "j@x.com", 2),
                (ValueKind::Ip, "10.0.0.1", 3),
            ],
        );
        let mut tile = SourceTile::new("Source 1");
        tile.merge("a.csv", batch.clone());
        let before = tile.clone();
        tile.merge("a.csv", batch);

        for kind in ValueKind::ALL {
            for (value, occurrences) in before.values(kind) {
                assert_eq!(tile.occurrence_count(kind, value), occurrences.len() * 2);
                // earlier occurrences are untouched
                assert_eq!(&tile.values(kind)[value][..occurrences.len()], &occurrences[..]);
            }
            assert_eq!(tile.unique_count(kind), before.unique_count(kind));
        }
        assert_eq!(tile.files().len(), 2);
        assert_eq!(tile.duplicate_files(), vec!["a.csv"]);
    }

    #[test]
    fn test_merge_preserves_prior_provenance() {
        let mut tile = SourceTile::new("Source 1");
        tile.merge("a.csv", extraction("a.csv", &[(ValueKind::Email, "j@x.com", 4)]));
        tile.merge("b.csv", extraction("b.csv", &[(ValueKind::Email, "j@x.com", 9)]));

        let files: Vec<&str> = tile.values(ValueKind::Email)["j@x.com"]
            .iter()
            .map(|o| o.file_name.as_str())
            .collect();
        assert_eq!(files, vec!["a.csv", "b.csv"]);
        assert!(tile.duplicate_files().is_empty());
        assert_eq!(tile.occurrence_total(), 2);
    }

    #[test]
    fn test_clear_keeps_name() {
        let mut tile = SourceTile::new("Source 2");
        tile.merge("a.csv", extraction("a.csv", &[(ValueKind::Ip, "10.0.0.1", 1)]));
        tile.clear();

        assert_eq!(tile.name(), "Source 2");
        assert!(!tile.is_active());
        assert_eq!(tile.occurrence_total(), 0);
    }

    #[test]
    fn test_snapshot_round_trip() {
        let empty = SourceTile::new("Empty");
        let mut restored = SourceTile::new("other");
        restored.restore(empty.snapshot());
        assert_eq!(restored, empty);

        let mut tile = SourceTile::new("Source 1");
        tile.merge(
            "a.csv",
            extraction("a.csv", &[(ValueKind::Email, "j@x.com", 1), (ValueKind::Email, "j@x.com", 2)]),
        );
        tile.merge("a.csv", extraction("a.csv", &[(ValueKind::Phone, "5551112222", 7)]));

        let json = serde_json::to_string(&tile.snapshot()).unwrap();
        let snapshot: TileSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(SourceTile::from_snapshot(snapshot), tile);
    }

    #[test]
    fn test_renormalize_merges_and_drops_keys() {
        let mut tile = SourceTile::new("Source 1");
        tile.merge(
            "a.csv",
            extraction(
                "a.csv",
                &[
                    (ValueKind::Email, "J@X.COM", 1),
                    (ValueKind::Email, "j@x.com", 2),
                    (ValueKind::Ip, "not an ip", 3),
                ],
            ),
        );

        let changed = tile.renormalize(|kind, value| match kind {
            ValueKind::Email => Some(value.to_lowercase()),
            _ => None,
        });

        assert_eq!(changed, 2);
        assert_eq!(tile.occurrence_count(ValueKind::Email, "j@x.com"), 2);
        assert_eq!(tile.unique_count(ValueKind::Email), 1);
        assert_eq!(tile.unique_count(ValueKind::Ip), 0);
    }

    #[test]
    fn test_snapshot_uses_row_map_names() {
        let json = serde_json::to_value(SourceTile::new("S").snapshot()).unwrap();
        assert!(json.get("phoneRows").is_some());
        assert!(json.get("emailRows").is_some());
        assert!(json.get("ipRows").is_some());
        assert!(json.get("createdAt").is_some());
    }
}
