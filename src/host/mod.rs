/// Host subsystem - The seam between the tracking core and an editor
///
/// The core never renders or opens anything itself. It talks to the editor
/// through these traits; `terminal` provides a concrete host that works on
/// plain files and draws views with crossterm.

pub mod error;
pub mod language;
pub mod terminal;

use crate::position::{CursorCoordinate, FileIdentity};
use std::path::Path;
use std::time::Duration;

// Re-export public interface
pub use error::HostError;
pub use language::language_for_path;
pub use terminal::TerminalHost;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ViewId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MarkerId(pub u64);

/// What the host knows about a document shown in a view.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentInfo {
    pub view: ViewId,
    pub file: FileIdentity,
    pub content_type: String,
    pub caret: CursorCoordinate,
}

/// User-facing messages. `Status` is transient and must not block the user.
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    Info(String),
    Error(String),
    Status { message: String, duration: Duration },
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Notice::Info(message.into())
    }

    pub fn error(message: impl Into<String>) -> Self {
        Notice::Error(message.into())
    }

    pub fn status(message: impl Into<String>, duration: Duration) -> Self {
        Notice::Status {
            message: message.into(),
            duration,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Notice::Info(message) | Notice::Error(message) => message,
            Notice::Status { message, .. } => message,
        }
    }
}

pub trait Notifier {
    fn notify(&mut self, notice: Notice);
}

/// Gutter decorations. A marker id is placed at most once and removed at most
/// once; removing an id the host no longer shows is a no-op.
pub trait MarkerHost {
    fn place_marker(&mut self, marker: MarkerId, view: ViewId, at: CursorCoordinate, icon: &Path);
    fn remove_marker(&mut self, marker: MarkerId);
}

pub trait EditorHost: MarkerHost + Notifier {
    fn active_document(&self) -> Option<DocumentInfo>;

    /// View already showing `file`, active or not.
    fn find_open(&self, file: &FileIdentity) -> Option<ViewId>;

    fn activate(&mut self, view: ViewId) -> Result<DocumentInfo, HostError>;

    /// Open `file` in a new view and make it active.
    fn open(&mut self, file: &FileIdentity) -> Result<DocumentInfo, HostError>;

    fn set_caret(&mut self, view: ViewId, at: CursorCoordinate);

    /// Scroll `at` into view, centered where the host supports it.
    fn reveal(&mut self, view: ViewId, at: CursorCoordinate);
}
