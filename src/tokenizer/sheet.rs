use std::io::Cursor;

use calamine::{Data, Range, Reader, open_workbook_auto_from_rs};

use crate::error::TokenizeError;

/// Column separator used when a spreadsheet row is flattened to text
pub const CELL_SEPARATOR: &str = "\t";

/// Read every sheet of a workbook, in workbook order, as tab-joined rows
pub(super) fn read_workbook(file_name: &str, bytes: &[u8]) -> Result<Vec<String>, TokenizeError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|e| TokenizeError::unreadable(file_name, e.to_string()))?;

    let mut rows = Vec::new();
    for sheet_name in workbook.sheet_names() {
        match workbook.worksheet_range(&sheet_name) {
            Ok(range) => {
                let before = rows.len();
                rows.extend(range_rows(&range));
                log::debug!(
                    "{}: sheet '{}' produced {} rows",
                    file_name,
                    sheet_name,
                    rows.len() - before
                );
            }
            Err(e) => {
                log::warn!("{}: skipping sheet '{}': {}", file_name, sheet_name, e);
            }
        }
    }

    Ok(rows)
}

/// Flatten a sheet, skipping rows that are blank once trimmed
pub(super) fn range_rows(range: &Range<Data>) -> impl Iterator<Item = String> + '_ {
    range
        .rows()
        .map(|cells| {
            cells
                .iter()
                .map(|cell| cell.to_string())
                .collect::<Vec<_>>()
                .join(CELL_SEPARATOR)
        })
        .filter(|row| !row.trim().is_empty())
}
