use crate::config::{Eligibility, RcConfig};
use crate::host::{DocumentInfo, EditorHost, HostError, Notice, ViewId};
use crate::marker::MarkerManager;
use crate::position::{CursorCoordinate, FileIdentity};
use crate::store::{LastFilePointer, PositionStore};

pub const NO_LAST_FILE_MESSAGE: &str = "No last edited file found.";
pub const REOPEN_FAILED_MESSAGE: &str = "Failed to open last edited file.";

#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    Idle,
    Tracking { view: ViewId, file: FileIdentity },
}

#[derive(Debug, Clone, PartialEq)]
pub enum RestoreOutcome {
    Restored(CursorCoordinate),
    NoPosition,
    Ineligible,
    NoActiveDocument,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EditOutcome {
    /// Each step ran; the flags say which writes made it to disk.
    Recorded {
        file: FileIdentity,
        coordinate: CursorCoordinate,
        position_saved: bool,
        last_file_saved: bool,
    },
    Ignored,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReopenRoute {
    AlreadyActive,
    Activated,
    Opened,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReopenOutcome {
    NoLastFile,
    Reopened {
        file: FileIdentity,
        route: ReopenRoute,
        restore: RestoreOutcome,
    },
    Failed {
        file: FileIdentity,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct StartupOutcome {
    pub restore: RestoreOutcome,
    pub last_file: Option<FileIdentity>,
}

/// Reacts to editor events and keeps the stores and the marker in step.
pub struct SessionController {
    positions: PositionStore,
    last_file: LastFilePointer,
    markers: MarkerManager,
    eligibility: Eligibility,
    state: SessionState,
}

impl SessionController {
    pub fn new(
        positions: PositionStore,
        last_file: LastFilePointer,
        markers: MarkerManager,
        eligibility: Eligibility,
    ) -> Self {
        Self {
            positions,
            last_file,
            markers,
            eligibility,
            state: SessionState::Idle,
        }
    }

    pub fn from_config(config: &RcConfig) -> Self {
        let storage_dir = config.storage_dir();
        Self::new(
            PositionStore::in_dir(&storage_dir),
            LastFilePointer::in_dir(&storage_dir).with_announce_duration(config.announce_duration),
            MarkerManager::new(config.marker_icon.clone()),
            config.languages.clone(),
        )
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn positions(&self) -> &PositionStore {
        &self.positions
    }

    pub fn last_file(&self) -> &LastFilePointer {
        &self.last_file
    }

    pub fn markers(&self) -> &MarkerManager {
        &self.markers
    }

    pub fn is_eligible(&self, document: &DocumentInfo) -> bool {
        self.eligibility.contains(&document.content_type)
    }

    /// Restore the active document, if any, then announce the last edited file.
    pub async fn startup<H: EditorHost>(&mut self, host: &mut H) -> StartupOutcome {
        let restore = self.active_view_changed(host).await;
        let last_file = self.last_file.announce(host).await;
        StartupOutcome { restore, last_file }
    }

    /// Content of the active document changed. Saves the caret position,
    /// records the file as last edited, then moves the marker. Each step runs
    /// even if an earlier one failed.
    pub async fn document_changed<H: EditorHost>(&mut self, host: &mut H) -> EditOutcome {
        let Some(document) = host.active_document() else {
            return EditOutcome::Ignored;
        };
        if !self.is_eligible(&document) {
            return EditOutcome::Ignored;
        }

        let file = document.file;
        let coordinate = document.caret;

        let position_saved = match self.positions.save(&file, coordinate).await {
            Ok(()) => {
                log::info!("[SESSION] Last edit position updated: {file}, {coordinate}");
                true
            }
            Err(e) => {
                log::warn!("[SESSION] Error saving last edit position: {e}");
                false
            }
        };

        let last_file_saved = match self.last_file.set(&file).await {
            Ok(()) => true,
            Err(e) => {
                log::warn!("[SESSION] Error saving last opened file: {e}");
                false
            }
        };

        self.markers.show(coordinate, document.view, host);
        self.state = SessionState::Tracking {
            view: document.view,
            file: file.clone(),
        };

        EditOutcome::Recorded {
            file,
            coordinate,
            position_saved,
            last_file_saved,
        }
    }

    /// A different document became active.
    pub async fn active_view_changed<H: EditorHost>(&mut self, host: &mut H) -> RestoreOutcome {
        let Some(document) = host.active_document() else {
            self.state = SessionState::Idle;
            return RestoreOutcome::NoActiveDocument;
        };
        if !self.is_eligible(&document) {
            self.state = SessionState::Idle;
            return RestoreOutcome::Ineligible;
        }

        self.state = SessionState::Tracking {
            view: document.view,
            file: document.file.clone(),
        };
        self.restore(&document, host).await
    }

    /// The "open last edited file" command.
    pub async fn reopen_last<H: EditorHost>(&mut self, host: &mut H) -> ReopenOutcome {
        let Some(file) = self.last_file.get().await else {
            host.notify(Notice::info(NO_LAST_FILE_MESSAGE));
            return ReopenOutcome::NoLastFile;
        };

        let located = match Self::locate(&file, host) {
            Ok(located) => located,
            Err(e) => {
                log::error!("[SESSION] Error opening last edited file: {e}");
                host.notify(Notice::error(REOPEN_FAILED_MESSAGE));
                return ReopenOutcome::Failed {
                    file,
                    reason: e.to_string(),
                };
            }
        };
        let (route, document) = located;

        self.state = SessionState::Tracking {
            view: document.view,
            file: file.clone(),
        };
        let restore = self.restore(&document, host).await;
        ReopenOutcome::Reopened {
            file,
            route,
            restore,
        }
    }

    /// A view was closed by the host.
    pub fn view_disposed<H: EditorHost>(&mut self, view: ViewId, host: &mut H) {
        self.markers.view_disposed(view, host);
        if matches!(&self.state, SessionState::Tracking { view: tracked, .. } if *tracked == view) {
            self.state = SessionState::Idle;
        }
    }

    fn locate<H: EditorHost>(
        file: &FileIdentity,
        host: &mut H,
    ) -> Result<(ReopenRoute, DocumentInfo), HostError> {
        if let Some(active) = host.active_document() {
            if &active.file == file {
                log::info!("[SESSION] File is already active: {file}");
                return Ok((ReopenRoute::AlreadyActive, active));
            }
        }

        if let Some(view) = host.find_open(file) {
            log::info!("[SESSION] File is open but inactive, activating: {file}");
            return host.activate(view).map(|document| (ReopenRoute::Activated, document));
        }

        log::info!("[SESSION] Opening file: {file}");
        host.open(file).map(|document| (ReopenRoute::Opened, document))
    }

    async fn restore<H: EditorHost>(&mut self, document: &DocumentInfo, host: &mut H) -> RestoreOutcome {
        let Some(coordinate) = self.positions.load(&document.file).await else {
            return RestoreOutcome::NoPosition;
        };

        self.markers.show(coordinate, document.view, host);
        host.set_caret(document.view, coordinate);
        host.reveal(document.view, coordinate);
        log::info!(
            "[SESSION] Last edit position revealed: {}, {coordinate}",
            document.file
        );
        RestoreOutcome::Restored(coordinate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::TerminalHost;
    use crate::marker::DEFAULT_MARKER_ICON;
    use crate::store::POSITIONS_FILE_NAME;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    struct Fixture {
        storage: TempDir,
        files: TempDir,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                storage: tempfile::tempdir().unwrap(),
                files: tempfile::tempdir().unwrap(),
            }
        }

        fn controller(&self) -> SessionController {
            SessionController::new(
                PositionStore::in_dir(self.storage.path()),
                LastFilePointer::in_dir(self.storage.path()),
                MarkerManager::new(DEFAULT_MARKER_ICON),
                Eligibility::default(),
            )
        }

        fn file(&self, name: &str, lines: usize) -> FileIdentity {
            let path = self.files.path().join(name);
            let content: Vec<String> = (0..lines).map(|i| format!("{i:02} some text here")).collect();
            fs::write(&path, content.join("\n")).unwrap();
            FileIdentity::from_path(&path)
        }
    }

    fn host() -> TerminalHost {
        TerminalHost::new().with_color(false)
    }

    async fn edit_at(
        controller: &mut SessionController,
        host: &mut TerminalHost,
        at: CursorCoordinate,
    ) -> EditOutcome {
        let view = host.active_document().unwrap().view;
        host.set_caret(view, at);
        controller.document_changed(host).await
    }

    #[tokio::test]
    async fn test_edit_records_position_last_file_and_marker() {
        let fixture = Fixture::new();
        let mut controller = fixture.controller();
        let mut host = host();
        let a = fixture.file("a.rs", 10);
        let view = host.open(&a).unwrap().view;

        let outcome = edit_at(&mut controller, &mut host, CursorCoordinate::new(4, 2)).await;

        assert_eq!(
            outcome,
            EditOutcome::Recorded {
                file: a.clone(),
                coordinate: CursorCoordinate::new(4, 2),
                position_saved: true,
                last_file_saved: true,
            }
        );
        assert_eq!(controller.positions().load(&a).await, Some(CursorCoordinate::new(4, 2)));
        assert_eq!(controller.last_file().get().await, Some(a.clone()));
        let markers = host.visible_markers();
        assert_eq!(markers.len(), 1);
        assert_eq!(markers[0].1.view, view);
        assert_eq!(markers[0].1.at, CursorCoordinate::new(4, 2));
        assert_eq!(controller.state(), &SessionState::Tracking { view, file: a });
    }

    #[tokio::test]
    async fn test_edit_in_ineligible_document_is_ignored() {
        let fixture = Fixture::new();
        let mut controller = fixture.controller();
        let mut host = host();
        let notes = fixture.file("notes.txt", 3);
        host.open(&notes).unwrap();

        let outcome = edit_at(&mut controller, &mut host, CursorCoordinate::new(1, 1)).await;

        assert_eq!(outcome, EditOutcome::Ignored);
        assert_eq!(controller.positions().load(&notes).await, None);
        assert_eq!(controller.last_file().get().await, None);
        assert!(host.visible_markers().is_empty());
        assert_eq!(controller.state(), &SessionState::Idle);
    }

    #[tokio::test]
    async fn test_edit_without_active_document_is_ignored() {
        let fixture = Fixture::new();
        let mut controller = fixture.controller();
        let mut host = host();
        assert_eq!(controller.document_changed(&mut host).await, EditOutcome::Ignored);
    }

    #[tokio::test]
    async fn test_switch_away_and_back_restores_caret() {
        let fixture = Fixture::new();
        let mut controller = fixture.controller();
        let mut host = host();
        let a = fixture.file("a.py", 12);
        let b = fixture.file("b.py", 12);

        let view_a = host.open(&a).unwrap().view;
        edit_at(&mut controller, &mut host, CursorCoordinate::new(4, 2)).await;
        host.set_caret(view_a, CursorCoordinate::new(0, 0));

        // Switch to B, which has no stored position
        host.open(&b).unwrap();
        assert_eq!(controller.active_view_changed(&mut host).await, RestoreOutcome::NoPosition);

        // Back to A
        host.activate(view_a).unwrap();
        let restored = controller.active_view_changed(&mut host).await;

        assert_eq!(restored, RestoreOutcome::Restored(CursorCoordinate::new(4, 2)));
        assert_eq!(host.view(view_a).unwrap().caret(), CursorCoordinate::new(4, 2));
        let markers = host.visible_markers();
        assert_eq!(markers.len(), 1);
        assert_eq!(markers[0].1.view, view_a);
        assert_eq!(markers[0].1.at, CursorCoordinate::new(4, 2));
    }

    #[tokio::test]
    async fn test_switch_without_position_leaves_caret() {
        let fixture = Fixture::new();
        let mut controller = fixture.controller();
        let mut host = host();
        let a = fixture.file("a.go", 8);
        let view = host.open(&a).unwrap().view;
        host.set_caret(view, CursorCoordinate::new(5, 1));

        let outcome = controller.active_view_changed(&mut host).await;

        assert_eq!(outcome, RestoreOutcome::NoPosition);
        assert_eq!(host.view(view).unwrap().caret(), CursorCoordinate::new(5, 1));
        assert!(host.visible_markers().is_empty());
    }

    #[tokio::test]
    async fn test_switch_to_ineligible_document_goes_idle() {
        let fixture = Fixture::new();
        let mut controller = fixture.controller();
        let mut host = host();
        let a = fixture.file("a.rs", 4);
        host.open(&a).unwrap();
        edit_at(&mut controller, &mut host, CursorCoordinate::new(1, 0)).await;

        host.open(&fixture.file("b.txt", 4)).unwrap();
        let outcome = controller.active_view_changed(&mut host).await;

        assert_eq!(outcome, RestoreOutcome::Ineligible);
        assert_eq!(controller.state(), &SessionState::Idle);
        // The marker in A stays until superseded
        assert_eq!(host.visible_markers().len(), 1);
    }

    #[tokio::test]
    async fn test_reopen_without_prior_edits() {
        let fixture = Fixture::new();
        let mut controller = fixture.controller();
        let mut host = host();

        let outcome = controller.reopen_last(&mut host).await;

        assert_eq!(outcome, ReopenOutcome::NoLastFile);
        assert_eq!(host.notices(), &[Notice::info(NO_LAST_FILE_MESSAGE)]);
        assert!(host.views().is_empty());
        assert_eq!(controller.state(), &SessionState::Idle);
    }

    #[tokio::test]
    async fn test_reopen_routes() {
        let fixture = Fixture::new();
        let mut controller = fixture.controller();
        let mut host = host();
        let a = fixture.file("a.ts", 20);
        let b = fixture.file("b.ts", 20);

        let view_a = host.open(&a).unwrap().view;
        edit_at(&mut controller, &mut host, CursorCoordinate::new(9, 3)).await;

        // A is active
        let outcome = controller.reopen_last(&mut host).await;
        assert!(matches!(
            outcome,
            ReopenOutcome::Reopened { route: ReopenRoute::AlreadyActive, .. }
        ));

        // A is open behind B
        host.open(&b).unwrap();
        let outcome = controller.reopen_last(&mut host).await;
        assert_eq!(
            outcome,
            ReopenOutcome::Reopened {
                file: a.clone(),
                route: ReopenRoute::Activated,
                restore: RestoreOutcome::Restored(CursorCoordinate::new(9, 3)),
            }
        );
        assert_eq!(host.active_document().unwrap().view, view_a);

        // A is closed
        host.close(view_a);
        controller.view_disposed(view_a, &mut host);
        let outcome = controller.reopen_last(&mut host).await;
        assert!(matches!(
            outcome,
            ReopenOutcome::Reopened { route: ReopenRoute::Opened, .. }
        ));
        let active = host.active_document().unwrap();
        assert_eq!(active.file, a);
        assert_eq!(active.caret, CursorCoordinate::new(9, 3));
        assert_eq!(host.visible_markers().len(), 1);
        assert!(host.notices().is_empty());
    }

    #[tokio::test]
    async fn test_reopen_deleted_file_reports_error() {
        let fixture = Fixture::new();
        let mut controller = fixture.controller();
        let mut host = host();
        let a = fixture.file("a.md", 6);
        let view = host.open(&a).unwrap().view;
        edit_at(&mut controller, &mut host, CursorCoordinate::new(2, 2)).await;
        let positions_before = fs::read_to_string(controller.positions().path()).unwrap();
        let last_before = fs::read_to_string(controller.last_file().path()).unwrap();

        fs::remove_file(a.as_path()).unwrap();
        host.close(view);
        controller.view_disposed(view, &mut host);

        let outcome = controller.reopen_last(&mut host).await;

        assert!(matches!(outcome, ReopenOutcome::Failed { ref file, .. } if file == &a));
        assert_eq!(host.notices(), &[Notice::error(REOPEN_FAILED_MESSAGE)]);
        assert_eq!(fs::read_to_string(controller.positions().path()).unwrap(), positions_before);
        assert_eq!(fs::read_to_string(controller.last_file().path()).unwrap(), last_before);
        assert_eq!(controller.state(), &SessionState::Idle);
    }

    #[tokio::test]
    async fn test_startup_restores_and_announces() {
        let fixture = Fixture::new();
        let a = fixture.file("a.json", 10);
        {
            let mut controller = fixture.controller();
            let mut host = host();
            host.open(&a).unwrap();
            edit_at(&mut controller, &mut host, CursorCoordinate::new(7, 1)).await;
        }

        // A new session over the same storage
        let mut controller = fixture.controller();
        let mut host = host();
        let view = host.open(&a).unwrap().view;

        let outcome = controller.startup(&mut host).await;

        assert_eq!(outcome.restore, RestoreOutcome::Restored(CursorCoordinate::new(7, 1)));
        assert_eq!(outcome.last_file, Some(a.clone()));
        assert_eq!(host.view(view).unwrap().caret(), CursorCoordinate::new(7, 1));
        assert_eq!(host.notices().len(), 1);
        assert!(matches!(&host.notices()[0], Notice::Status { message, .. } if message.ends_with("a.json")));
    }

    #[tokio::test]
    async fn test_startup_without_active_document_still_announces() {
        let fixture = Fixture::new();
        let mut controller = fixture.controller();
        let mut host = host();

        let outcome = controller.startup(&mut host).await;

        assert_eq!(outcome.restore, RestoreOutcome::NoActiveDocument);
        assert_eq!(outcome.last_file, None);
        // Empty record is created for later sessions
        assert!(controller.last_file().path().exists());
        assert!(host.notices().is_empty());
    }

    #[tokio::test]
    async fn test_store_failure_does_not_stop_marker() {
        let fixture = Fixture::new();
        // A regular file where the storage directory should be makes every write fail
        let blocked = fixture.storage.path().join("blocked");
        fs::write(&blocked, "").unwrap();
        let mut controller = SessionController::new(
            PositionStore::in_dir(&blocked),
            LastFilePointer::in_dir(&blocked),
            MarkerManager::new(DEFAULT_MARKER_ICON),
            Eligibility::default(),
        );
        let mut host = host();
        host.open(&fixture.file("a.css", 5)).unwrap();

        let outcome = edit_at(&mut controller, &mut host, CursorCoordinate::new(3, 0)).await;

        assert!(matches!(
            outcome,
            EditOutcome::Recorded {
                position_saved: false,
                last_file_saved: false,
                ..
            }
        ));
        assert_eq!(host.visible_markers().len(), 1);
        assert!(host.notices().is_empty());
    }

    #[tokio::test]
    async fn test_position_failure_still_records_last_file() {
        let fixture = Fixture::new();
        // A directory in place of the positions document fails only that store
        fs::create_dir(fixture.storage.path().join(POSITIONS_FILE_NAME)).unwrap();
        let mut controller = fixture.controller();
        let mut host = host();
        let a = fixture.file("a.rs", 5);
        host.open(&a).unwrap();

        let outcome = edit_at(&mut controller, &mut host, CursorCoordinate::new(2, 1)).await;

        assert!(matches!(
            outcome,
            EditOutcome::Recorded {
                position_saved: false,
                last_file_saved: true,
                ..
            }
        ));
        assert_eq!(controller.last_file().get().await, Some(a));
        assert_eq!(host.visible_markers().len(), 1);
        assert!(matches!(controller.state(), SessionState::Tracking { .. }));
    }

    #[tokio::test]
    async fn test_corrupt_store_restores_nothing() {
        let fixture = Fixture::new();
        let mut controller = fixture.controller();
        let mut host = host();
        let a = fixture.file("a.yaml", 5);
        host.open(&a).unwrap();
        edit_at(&mut controller, &mut host, CursorCoordinate::new(3, 3)).await;

        fs::write(controller.positions().path(), "{{{{").unwrap();

        assert_eq!(controller.active_view_changed(&mut host).await, RestoreOutcome::NoPosition);
    }

    #[tokio::test]
    async fn test_view_disposed_clears_marker_and_state() {
        let fixture = Fixture::new();
        let mut controller = fixture.controller();
        let mut host = host();
        let view = host.open(&fixture.file("a.rs", 5)).unwrap().view;
        edit_at(&mut controller, &mut host, CursorCoordinate::new(1, 1)).await;

        controller.view_disposed(view, &mut host);

        assert!(controller.markers().active().is_none());
        assert!(host.visible_markers().is_empty());
        assert_eq!(controller.state(), &SessionState::Idle);
    }

    #[tokio::test]
    async fn test_from_config_uses_storage_dir() {
        let fixture = Fixture::new();
        let config = RcConfig {
            storage_dir: Some(fixture.storage.path().to_path_buf()),
            ..RcConfig::default()
        };
        let controller = SessionController::from_config(&config);
        assert!(controller.positions().path().starts_with(fixture.storage.path()));
        assert_eq!(controller.markers().icon(), Path::new(DEFAULT_MARKER_ICON));
    }
}
