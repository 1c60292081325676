use encoding_rs::{Encoding, UTF_8};

use crate::error::TokenizeError;

/// How far into the file to look for NUL bytes when deciding it is binary
const BINARY_SNIFF_LEN: usize = 8 * 1024;

/// Decode text bytes, honouring a UTF-8/UTF-16 byte-order mark.
///
/// Invalid sequences are replaced rather than rejected; only binary content is unreadable.
pub(super) fn decode(file_name: &str, bytes: &[u8]) -> Result<String, TokenizeError> {
    let bom = Encoding::for_bom(bytes);

    if bom.is_none() && looks_binary(bytes) {
        return Err(TokenizeError::unreadable(
            file_name,
            "binary content in a text file",
        ));
    }

    let encoding = bom.map(|(encoding, _)| encoding).unwrap_or(UTF_8);
    let (text, used, had_errors) = encoding.decode(bytes);
    if had_errors {
        log::warn!(
            "{} contains invalid {} sequences; they were replaced",
            file_name,
            used.name()
        );
    }

    Ok(text.into_owned())
}

fn looks_binary(bytes: &[u8]) -> bool {
    let head = &bytes[..bytes.len().min(BINARY_SNIFF_LEN)];
    head.contains(&0)
}
