use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Kind of identifier pulled out of a row
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    Phone,
    Email,
    Ip,
}

impl ValueKind {
    pub const ALL: [ValueKind; 3] = [ValueKind::Phone, ValueKind::Email, ValueKind::Ip];

    /// Plural name used for result groups and export tables ("phones", "emails", "ips")
    pub fn plural(self) -> &'static str {
        match self {
            Self::Phone => "phones",
            Self::Email => "emails",
            Self::Ip => "ips",
        }
    }

    /// Human-readable column label
    pub fn label(self) -> &'static str {
        match self {
            Self::Phone => "Phone",
            Self::Email => "Email",
            Self::Ip => "IP",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ValueKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "phone" | "phones" => Ok(Self::Phone),
            "email" | "emails" => Ok(Self::Email),
            "ip" | "ips" => Ok(Self::Ip),
            other => Err(format!("unknown value kind '{}'", other)),
        }
    }
}

/// A normalized identifier; identity is (kind, normalized value)
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedValue {
    pub kind: ValueKind,
    pub normalized_value: String,
}

/// Where a value was seen
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Occurrence {
    pub file_name: String,
    /// 1-based position of the row in the file's row sequence
    pub row_index: usize,
    /// Full row text, kept for audit and export
    pub row_text: String,
}

/// Normalized value -> occurrences in insertion order
pub type ValueMap = BTreeMap<String, Vec<Occurrence>>;

/// Everything extracted from one file
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionResult {
    pub phones: ValueMap,
    pub emails: ValueMap,
    pub ips: ValueMap,
    /// Number of rows read from the file
    #[serde(default)]
    pub rows_scanned: usize,
}

impl ExtractionResult {
    pub fn values(&self, kind: ValueKind) -> &ValueMap {
        match kind {
            ValueKind::Phone => &self.phones,
            ValueKind::Email => &self.emails,
            ValueKind::Ip => &self.ips,
        }
    }

    pub fn values_mut(&mut self, kind: ValueKind) -> &mut ValueMap {
        match kind {
            ValueKind::Phone => &mut self.phones,
            ValueKind::Email => &mut self.emails,
            ValueKind::Ip => &mut self.ips,
        }
    }

    /// Append an occurrence for a value, creating the entry if absent
    pub fn record(&mut self, value: ExtractedValue, occurrence: Occurrence) {
        self.values_mut(value.kind)
            .entry(value.normalized_value)
            .or_default()
            .push(occurrence);
    }

    /// Number of distinct values of a kind
    pub fn distinct(&self, kind: ValueKind) -> usize {
        self.values(kind).len()
    }

    pub fn is_empty(&self) -> bool {
        ValueKind::ALL.iter().all(|&kind| self.values(kind).is_empty())
    }
}
