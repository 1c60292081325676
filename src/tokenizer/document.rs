use std::panic;

use crate::error::TokenizeError;

const PDF_MAGIC: &[u8] = b"%PDF-";
/// Some producers put junk before the header; readers accept it within the first KiB
const HEADER_WINDOW: usize = 1024;

pub(super) fn has_pdf_header(bytes: &[u8]) -> bool {
    let head = &bytes[..bytes.len().min(HEADER_WINDOW)];
    head.windows(PDF_MAGIC.len()).any(|w| w == PDF_MAGIC)
}

/// Rows of a PDF text layer: one per non-blank line, pages concatenated.
///
/// A file without a PDF header is unreadable. A PDF whose text layer cannot be
/// extracted yields no rows.
pub(super) fn read_text_layer(file_name: &str, bytes: &[u8]) -> Result<Vec<String>, TokenizeError> {
    if !has_pdf_header(bytes) {
        return Err(TokenizeError::unreadable(file_name, "missing %PDF- header"));
    }

    match extract_text(bytes) {
        Ok(text) => Ok(layer_rows(&text)),
        Err(reason) => {
            let err = TokenizeError::unsupported(file_name, reason);
            log::warn!("{}; no rows extracted", err);
            Ok(Vec::new())
        }
    }
}

fn extract_text(bytes: &[u8]) -> Result<String, String> {
    // pdf-extract panics on some malformed font and filter tables
    match panic::catch_unwind(|| pdf_extract::extract_text_from_mem(bytes)) {
        Ok(Ok(text)) => Ok(text),
        Ok(Err(e)) => Err(e.to_string()),
        Err(_) => Err("text layer extraction aborted".to_string()),
    }
}

fn layer_rows(text: &str) -> Vec<String> {
    text.split(['\n', '\x0c'])
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
