//! Remembers where each file was last edited and which file was edited last.
//!
//! `SessionController` receives editor events through the `host` traits,
//! persists caret positions with `PositionStore`, records the last edited file
//! with `LastFilePointer`, and keeps a single gutter marker on the last edit
//! through `MarkerManager`.

pub mod config;
pub mod controller;
pub mod host;
pub mod marker;
pub mod position;
pub mod store;

pub use controller::SessionController;
pub use position::{CursorCoordinate, FileIdentity};
