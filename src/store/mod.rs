/// Persistence subsystem - Durable position and last-file records
///
/// Both stores keep a small JSON document on disk and rewrite it whole on
/// every change. Reads never fail: missing or malformed documents read as empty.

pub mod document;
pub mod error;
pub mod last_file;
pub mod position_store;

// Re-export public interface
pub use document::{JsonDocument, ReadOutcome};
pub use error::StoreError;
pub use last_file::{DEFAULT_ANNOUNCE_DURATION, LAST_FILE_NAME, LastFilePointer};
pub use position_store::{POSITIONS_FILE_NAME, PositionMap, PositionStore};
