use crate::host::{MarkerHost, MarkerId, ViewId};
use crate::position::CursorCoordinate;
use std::path::{Path, PathBuf};

pub const DEFAULT_MARKER_ICON: &str = "images/dot.png";

/// Caller's reference to a marker created by `MarkerManager::show`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkerHandle {
    id: MarkerId,
}

impl MarkerHandle {
    pub fn id(&self) -> MarkerId {
        self.id
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ActiveMarker {
    pub id: MarkerId,
    pub view: ViewId,
    pub coordinate: CursorCoordinate,
}

/// Owner of the single last-edit marker. At most one marker is ever placed
/// at a time: the previous one is removed before the next one is created.
pub struct MarkerManager {
    icon: PathBuf,
    active: Option<ActiveMarker>,
    next_id: u64,
}

impl MarkerManager {
    pub fn new(icon: impl Into<PathBuf>) -> Self {
        Self {
            icon: icon.into(),
            active: None,
            next_id: 1,
        }
    }

    pub fn icon(&self) -> &Path {
        &self.icon
    }

    pub fn active(&self) -> Option<&ActiveMarker> {
        self.active.as_ref()
    }

    /// Move the marker to `coordinate` in `view`.
    pub fn show<H: MarkerHost + ?Sized>(
        &mut self,
        coordinate: CursorCoordinate,
        view: ViewId,
        host: &mut H,
    ) -> MarkerHandle {
        if let Some(previous) = self.active.take() {
            host.remove_marker(previous.id);
        }

        let id = MarkerId(self.next_id);
        self.next_id += 1;
        host.place_marker(id, view, coordinate, &self.icon);
        self.active = Some(ActiveMarker {
            id,
            view,
            coordinate,
        });
        MarkerHandle { id }
    }

    /// Remove the marker behind `handle`. Returns false if it was already
    /// superseded or disposed.
    pub fn dispose<H: MarkerHost + ?Sized>(&mut self, handle: MarkerHandle, host: &mut H) -> bool {
        match &self.active {
            Some(active) if active.id == handle.id => {
                host.remove_marker(handle.id);
                self.active = None;
                true
            }
            _ => false,
        }
    }

    /// Drop the marker if it lives in a view that is going away.
    pub fn view_disposed<H: MarkerHost + ?Sized>(&mut self, view: ViewId, host: &mut H) -> bool {
        match &self.active {
            Some(active) if active.view == view => {
                host.remove_marker(active.id);
                self.active = None;
                true
            }
            _ => false,
        }
    }
}
