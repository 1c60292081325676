//! Error taxonomy for the ingestion pipeline.
//!
//! Corrupt input is an error for the file it came from. A recognised format whose
//! sub-format cannot be read is not: the tokenizer logs an [`TokenizeError::UnsupportedSubformat`]
//! and yields no rows. Row scanning never fails.

/// Errors raised while turning raw bytes into rows.
#[derive(Debug, thiserror::Error)]
pub enum TokenizeError {
    #[error("cannot read {file_name}: {reason}")]
    UnreadableFile { file_name: String, reason: String },

    #[error("unsupported format in {file_name}: {reason}")]
    UnsupportedSubformat { file_name: String, reason: String },
}

impl TokenizeError {
    pub fn unreadable(file_name: &str, reason: impl Into<String>) -> Self {
        Self::UnreadableFile {
            file_name: file_name.to_string(),
            reason: reason.into(),
        }
    }

    pub fn unsupported(file_name: &str, reason: impl Into<String>) -> Self {
        Self::UnsupportedSubformat {
            file_name: file_name.to_string(),
            reason: reason.into(),
        }
    }
}

/// Per-file failure of the tokenize → extract → merge pipeline.
///
/// A file that fails contributes nothing to the session.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("cannot read file {file_name}: {reason}")]
    Read { file_name: String, reason: String },

    #[error(transparent)]
    Tokenize(#[from] TokenizeError),

    #[error("processing of {file_name} was cancelled")]
    Cancelled { file_name: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_carry_file_and_cause() {
        let err = IngestError::from(TokenizeError::unreadable("a.xlsx", "bad zip"));
        assert_eq!(err.to_string(), "cannot read a.xlsx: bad zip");

        let err = IngestError::Cancelled {
            file_name: "big.csv".to_string(),
        };
        assert!(err.to_string().contains("big.csv"));

        let err = IngestError::Read {
            file_name: "gone.csv".to_string(),
            reason: "No such file or directory".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "cannot read file gone.csv: No such file or directory"
        );
    }
}
