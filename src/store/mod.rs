pub mod source_id;
pub mod tile;

// Re-export commonly used items
pub use source_id::SourceId;
pub use tile::{SourceTile, TileSnapshot};
