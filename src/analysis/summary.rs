use serde::{Deserialize, Serialize};

use crate::extract::ValueKind;
use crate::store::{SourceId, SourceTile};

/// One value as seen by one source
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisItem {
    pub kind: ValueKind,
    pub value: String,
    pub source: SourceId,
    pub source_name: String,
    /// Occurrences of the value in this source
    pub count: usize,
}

/// Per-source view of everything extracted so far
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Analysis {
    pub phones: Vec<AnalysisItem>,
    pub emails: Vec<AnalysisItem>,
    pub ips: Vec<AnalysisItem>,
}

impl Analysis {
    pub fn items(&self, kind: ValueKind) -> &[AnalysisItem] {
        match kind {
            ValueKind::Phone => &self.phones,
            ValueKind::Email => &self.emails,
            ValueKind::Ip => &self.ips,
        }
    }

    fn items_mut(&mut self, kind: ValueKind) -> &mut Vec<AnalysisItem> {
        match kind {
            ValueKind::Phone => &mut self.phones,
            ValueKind::Email => &mut self.emails,
            ValueKind::Ip => &mut self.ips,
        }
    }
}

/// Summarize tiles into (value, source, count) items, most frequent first
pub fn summarize<'a, I>(tiles: I) -> Analysis
where
    I: IntoIterator<Item = (&'a SourceId, &'a SourceTile)>,
{
    let mut analysis = Analysis::default();

    for (id, tile) in tiles {
        for kind in ValueKind::ALL {
            let items = analysis.items_mut(kind);
            for (value, occurrences) in tile.values(kind) {
                items.push(AnalysisItem {
                    kind,
                    value: value.clone(),
                    source: id.clone(),
                    source_name: tile.name().to_string(),
                    count: occurrences.len(),
                });
            }
        }
    }

    for kind in ValueKind::ALL {
        analysis.items_mut(kind).sort_by(|a, b| {
            b.count
                .cmp(&a.count)
                .then_with(|| a.value.cmp(&b.value))
                .then_with(|| a.source.cmp(&b.source))
        });
    }

    analysis
}
