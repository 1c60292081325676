pub mod snapshot;
pub mod state;
pub mod storage;
pub mod worker;

// Re-export commonly used items
pub use snapshot::{SessionSnapshot, SnapshotMetadata};
pub use state::{IngestReport, Session};
pub use storage::{load_snapshot, save_snapshot};
pub use worker::{DroppedFile, IngestEvent, SessionClient, SessionCommand, spawn_session_worker};
