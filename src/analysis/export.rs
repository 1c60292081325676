//! Delimited-text export of analysis results for spreadsheet import.

use std::collections::BTreeSet;
use std::io::Write;

use anyhow::{Context, Result};

use super::crossref::CrossReferenceResult;
use super::summary::AnalysisItem;
use crate::extract::ValueKind;
use crate::store::{SourceId, SourceTile};

/// `Value, Source, Count` table for one kind
pub fn write_kind_csv<W: Write>(writer: W, items: &[AnalysisItem]) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(["Value", "Source", "Count"])
        .context("failed to write CSV header")?;

    for item in items {
        csv.write_record([
            item.value.as_str(),
            item.source_name.as_str(),
            item.count.to_string().as_str(),
        ])
        .context("failed to write CSV row")?;
    }

    csv.flush().context("failed to flush CSV output")?;
    Ok(())
}

/// `Value, Type, Sources, Total Count, Source <id>...` table.
///
/// One count column per source appearing in the results, in source-id order.
pub fn write_cross_reference_csv<W: Write>(
    writer: W,
    results: &[CrossReferenceResult],
) -> Result<()> {
    let sources: BTreeSet<&SourceId> = results
        .iter()
        .flat_map(|r| r.per_source_counts.keys())
        .collect();

    let mut csv = csv::Writer::from_writer(writer);
    let mut header = vec![
        "Value".to_string(),
        "Type".to_string(),
        "Sources".to_string(),
        "Total Count".to_string(),
    ];
    header.extend(sources.iter().map(|id| format!("Source {}", id)));
    csv.write_record(&header)
        .context("failed to write CSV header")?;

    for result in results {
        let mut record = vec![
            result.normalized_value.clone(),
            result.kind.label().to_string(),
            result.count.to_string(),
            result.total_count.to_string(),
        ];
        record.extend(sources.iter().map(|id| {
            result
                .per_source_counts
                .get(*id)
                .map_or_else(String::new, |count| count.to_string())
        }));
        csv.write_record(&record)
            .context("failed to write CSV row")?;
    }

    csv.flush().context("failed to flush CSV output")?;
    Ok(())
}

/// Audit table with one line per occurrence:
/// `Type, Value, Source, File, Row, Row Text`
pub fn write_occurrences_csv<'a, W, I>(writer: W, tiles: I) -> Result<()>
where
    W: Write,
    I: IntoIterator<Item = (&'a SourceId, &'a SourceTile)>,
{
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(["Type", "Value", "Source", "File", "Row", "Row Text"])
        .context("failed to write CSV header")?;

    for (_, tile) in tiles {
        for kind in ValueKind::ALL {
            for (value, occurrences) in tile.values(kind) {
                for occurrence in occurrences {
                    csv.write_record([
                        kind.label(),
                        value.as_str(),
                        tile.name(),
                        occurrence.file_name.as_str(),
                        occurrence.row_index.to_string().as_str(),
                        occurrence.row_text.as_str(),
                    ])
                    .context("failed to write CSV row")?;
                }
            }
        }
    }

    csv.flush().context("failed to flush CSV output")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    use crate::extract::{ExtractedValue, ExtractionResult, Occurrence};

    #[test]
    fn test_kind_table() {
        let items = vec![AnalysisItem {
            kind: ValueKind::Email,
            value: "j@x.com".to_string(),
            source: SourceId::from(1),
            source_name: "Source 1".to_string(),
            count: 2,
        }];
        let mut out = Vec::new();
        write_kind_csv(&mut out, &items).unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Value,Source,Count\nj@x.com,Source 1,2\n"
        );
    }

    #[test]
    fn test_cross_reference_table_has_source_columns() {
        let results = vec![CrossReferenceResult {
            kind: ValueKind::Phone,
            normalized_value: "5551112222".to_string(),
            count: 2,
            total_count: 3,
            per_source_counts: BTreeMap::from([(SourceId::from(1), 1), (SourceId::from(2), 2)]),
        }];
        let mut out = Vec::new();
        write_cross_reference_csv(&mut out, &results).unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Value,Type,Sources,Total Count,Source 1,Source 2\n5551112222,Phone,2,3,1,2\n"
        );
    }

    #[test]
    fn test_occurrence_table_quotes_row_text() {
        let mut extraction = ExtractionResult::default();
        extraction.record(
            ExtractedValue {
                kind: ValueKind::Ip,
                normalized_value: "10.0.0.1".to_string(),
            },
            Occurrence {
                file_name: "hosts.csv".to_string(),
                row_index: 4,
                row_text: "gw,10.0.0.1".to_string(),
            },
        );
        let mut tile = SourceTile::new("Source 2");
        tile.merge("hosts.csv", extraction);
        let id = SourceId::from(2);

        let mut out = Vec::new();
        write_occurrences_csv(&mut out, [(&id, &tile)]).unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Type,Value,Source,File,Row,Row Text\nIP,10.0.0.1,Source 2,hosts.csv,4,\"gw,10.0.0.1\"\n"
        );
    }
}
