//! Contact-identifier extraction and cross-reference engine.
//!
//! Files dropped on a source are tokenized into rows, scanned for phone numbers,
//! email addresses and IP addresses, and merged into that source's tile with the
//! file and row each value came from. Values present in every active source form
//! the cross-reference.

pub mod analysis;
pub mod cancel;
pub mod config;
pub mod error;
pub mod extract;
pub mod session;
pub mod store;
pub mod tokenizer;

pub use analysis::{Analysis, AnalysisItem, CrossReferenceResult, SharedValue};
pub use cancel::CancelToken;
pub use config::{AppConfig, ExtractionConfig};
pub use error::{IngestError, TokenizeError};
pub use extract::{ExtractedValue, ExtractionResult, Extractor, Occurrence, ValueKind};
pub use session::{IngestReport, Session, SessionSnapshot};
pub use store::{SourceId, SourceTile, TileSnapshot};
