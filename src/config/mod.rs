/// Configuration subsystem - Storage location, tracked languages, marker asset
///
/// This module handles loading settings from .lasteditrc files and the
/// environment, and holds the eligibility set the session controller consults.

pub mod eligibility;
pub mod rc;

// Re-export public interface
pub use eligibility::{DEFAULT_LANGUAGES, Eligibility, NARROW_LANGUAGES};
pub use rc::{ConfigError, RcConfig, RcLoader, default_storage_dir};
