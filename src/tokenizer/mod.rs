//! Row tokenizer: raw file bytes to a lazy sequence of text rows.
//!
//! Every supported format is a [`FileKind`] variant. Detection runs once per file
//! (extension first, content sniffing for unknown extensions) and the variant
//! decides how rows are produced.

mod document;
mod html;
mod sheet;
mod text;

use std::path::Path;

use crate::error::TokenizeError;

const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
const OLE2_MAGIC: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

/// Supported input formats
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FileKind {
    /// Plain, CSV or tab-delimited text; one row per line
    Text,
    /// HTML export; one row per block element
    Html,
    /// Multi-sheet workbook (xlsx, xls, xlsb, ods)
    Spreadsheet,
    /// PDF with a text layer
    Document,
}

impl FileKind {
    /// Pick the kind from the file extension, sniffing the content when the extension is unknown
    pub fn detect(file_name: &str, bytes: &[u8]) -> Self {
        let extension = Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);

        match extension.as_deref() {
            Some("txt" | "csv" | "tsv" | "tab" | "log") => Self::Text,
            Some("html" | "htm") => Self::Html,
            Some("xlsx" | "xlsm" | "xlsb" | "xls" | "ods") => Self::Spreadsheet,
            Some("pdf") => Self::Document,
            _ => Self::sniff(bytes),
        }
    }

    fn sniff(bytes: &[u8]) -> Self {
        if document::has_pdf_header(bytes) {
            Self::Document
        } else if bytes.starts_with(ZIP_MAGIC) || bytes.starts_with(OLE2_MAGIC) {
            Self::Spreadsheet
        } else {
            Self::Text
        }
    }

    /// Produce the rows of a file of this kind
    pub fn rows(self, file_name: &str, bytes: &[u8]) -> Result<Rows, TokenizeError> {
        match self {
            Self::Text => text::decode(file_name, bytes).map(Rows::lines),
            Self::Html => {
                let decoded = text::decode(file_name, bytes)?;
                Ok(Rows::buffered(html::block_rows(&decoded)))
            }
            Self::Spreadsheet => sheet::read_workbook(file_name, bytes).map(Rows::buffered),
            Self::Document => document::read_text_layer(file_name, bytes).map(Rows::buffered),
        }
    }
}

/// Tokenize a file into rows.
///
/// Corrupt or undecodable bytes fail with [`TokenizeError::UnreadableFile`]. A recognised
/// format whose content cannot be read (e.g. an encrypted PDF) yields no rows instead.
pub fn tokenize(file_name: &str, bytes: &[u8]) -> Result<Rows, TokenizeError> {
    let kind = FileKind::detect(file_name, bytes);
    log::debug!("Tokenizing {} ({} bytes) as {:?}", file_name, bytes.len(), kind);
    kind.rows(file_name, bytes)
}

/// Lazy, finite sequence of rows produced by [`tokenize`]
#[derive(Debug)]
pub struct Rows {
    source: RowSource,
}

#[derive(Debug)]
enum RowSource {
    /// Decoded text, split on demand
    Lines { text: String, pos: usize },
    /// Rows materialized by a format reader
    Buffered(std::vec::IntoIter<String>),
}

impl Rows {
    fn lines(text: String) -> Self {
        Self {
            source: RowSource::Lines { text, pos: 0 },
        }
    }

    fn buffered(rows: Vec<String>) -> Self {
        Self {
            source: RowSource::Buffered(rows.into_iter()),
        }
    }
}

impl Iterator for Rows {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        match &mut self.source {
            RowSource::Lines { text, pos } => {
                if *pos >= text.len() {
                    return None;
                }
                let rest = &text[*pos..];
                let (line, advance) = match rest.find('\n') {
                    Some(end) => (&rest[..end], end + 1),
                    None => (rest, rest.len()),
                };
                *pos += advance;
                Some(line.strip_suffix('\r').unwrap_or(line).to_string())
            }
            RowSource::Buffered(rows) => rows.next(),
        }
    }
}
