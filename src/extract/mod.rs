//! Pattern extractor: scans rows for phone numbers, email addresses and IP
//! addresses and records where each normalized value was seen.
//!
//! Scanning never fails. Text that does not match is simply ignored.

pub mod normalize;
mod patterns;
pub mod types;

pub use normalize::normalize;
pub use types::{ExtractedValue, ExtractionResult, Occurrence, ValueKind, ValueMap};

use crate::cancel::CancelToken;
use crate::config::ExtractionConfig;

/// Row scanner configured with the extraction policy
#[derive(Clone, Debug, Default)]
pub struct Extractor {
    config: ExtractionConfig,
}

impl Extractor {
    pub fn new(config: ExtractionConfig) -> Self {
        Self { config }
    }

    /// Normalize a raw string as a value of the given kind
    pub fn normalize(&self, kind: ValueKind, raw: &str) -> Option<String> {
        normalize::normalize(kind, raw, &self.config)
    }

    /// Distinct values found in one row, phones first, then emails, then IPs,
    /// each in order of appearance
    pub fn scan_row(&self, row: &str) -> Vec<ExtractedValue> {
        let mut found: Vec<ExtractedValue> = Vec::new();
        let mut push = |kind: ValueKind, normalized: Option<String>| {
            if let Some(normalized_value) = normalized {
                let value = ExtractedValue {
                    kind,
                    normalized_value,
                };
                if !found.contains(&value) {
                    found.push(value);
                }
            }
        };

        for candidate in patterns::phones(row) {
            push(ValueKind::Phone, normalize::normalize_phone(candidate, &self.config));
        }
        for candidate in patterns::emails(row) {
            push(ValueKind::Email, normalize::normalize_email(candidate));
        }
        for candidate in patterns::ipv4s(row) {
            push(ValueKind::Ip, normalize::normalize_ip(candidate, &self.config));
        }
        if self.config.ipv6 {
            for candidate in patterns::ipv6s(row) {
                push(ValueKind::Ip, normalize::normalize_ip(candidate, &self.config));
            }
        }

        found
    }

    /// Scan every row of a file
    pub fn extract<I>(&self, file_name: &str, rows: I) -> ExtractionResult
    where
        I: IntoIterator<Item = String>,
    {
        let mut result = ExtractionResult::default();
        for (i, row) in rows.into_iter().enumerate() {
            self.scan_into(&mut result, file_name, i + 1, row);
        }
        log_summary(file_name, &result);
        result
    }

    /// Like [`Extractor::extract`], checking the token before each row.
    ///
    /// Returns `None` when cancelled; the partial result is discarded.
    pub fn extract_cancellable<I>(
        &self,
        file_name: &str,
        rows: I,
        cancel: &CancelToken,
    ) -> Option<ExtractionResult>
    where
        I: IntoIterator<Item = String>,
    {
        let mut result = ExtractionResult::default();
        for (i, row) in rows.into_iter().enumerate() {
            if cancel.is_cancelled() {
                log::info!("Extraction of {} cancelled at row {}", file_name, i + 1);
                return None;
            }
            self.scan_into(&mut result, file_name, i + 1, row);
        }
        log_summary(file_name, &result);
        Some(result)
    }

    fn scan_into(&self, result: &mut ExtractionResult, file_name: &str, row_index: usize, row: String) {
        result.rows_scanned += 1;
        let values = self.scan_row(&row);
        let Some((last, rest)) = values.split_last() else {
            return;
        };

        for value in rest {
            result.record(value.clone(), occurrence(file_name, row_index, row.clone()));
        }
        result.record(last.clone(), occurrence(file_name, row_index, row));
    }
}

fn occurrence(file_name: &str, row_index: usize, row_text: String) -> Occurrence {
    Occurrence {
        file_name: file_name.to_string(),
        row_index,
        row_text,
    }
}

fn log_summary(file_name: &str, result: &ExtractionResult) {
    log::debug!(
        "{}: {} rows, {} phones, {} emails, {} ips",
        file_name,
        result.rows_scanned,
        result.distinct(ValueKind::Phone),
        result.distinct(ValueKind::Email),
        result.distinct(ValueKind::Ip)
    );
}
