/// Controller subsystem - Turns editor events into store writes and marker moves
///
/// The session controller is the only component that talks to all of the
/// position store, the last-file pointer and the marker manager.

pub mod session_controller;

// Re-export public interface
pub use session_controller::{
    EditOutcome, NO_LAST_FILE_MESSAGE, REOPEN_FAILED_MESSAGE, ReopenOutcome, ReopenRoute,
    RestoreOutcome, SessionController, SessionState, StartupOutcome,
};
