use crate::host::{
    DocumentInfo, EditorHost, HostError, MarkerHost, MarkerId, Notice, Notifier, ViewId,
    language_for_path,
};
use crate::position::{CursorCoordinate, FileIdentity};
use crossterm::{
    queue,
    style::{Attribute, Color, Print, ResetColor, SetAttribute, SetForegroundColor},
    terminal::size,
};
use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use unicode_width::UnicodeWidthChar;

pub const MARKER_GLYPH: char = '●';
const TAB_WIDTH: usize = 4;
const DEFAULT_WIDTH: usize = 80;

#[derive(Debug, Clone)]
pub struct TerminalView {
    pub id: ViewId,
    pub file: FileIdentity,
    pub content_type: String,
    lines: Vec<String>,
    caret: CursorCoordinate,
    top_line: usize,
}

impl TerminalView {
    fn info(&self) -> DocumentInfo {
        DocumentInfo {
            view: self.id,
            file: self.file.clone(),
            content_type: self.content_type.clone(),
            caret: self.caret,
        }
    }

    pub fn caret(&self) -> CursorCoordinate {
        self.caret
    }

    pub fn top_line(&self) -> usize {
        self.top_line
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Keep the caret inside the document, like editors do for stale positions.
    /// `character` counts Unicode scalar values here, not UTF-16 units, so
    /// positions written by a UTF-16 host land a little off on lines with
    /// astral-plane characters.
    fn clamp(&self, at: CursorCoordinate) -> CursorCoordinate {
        let last_line = self.lines.len().saturating_sub(1);
        let line = (at.line as usize).min(last_line);
        let line_len = self.lines.get(line).map_or(0, |text| text.chars().count());
        let character = (at.character as usize).min(line_len);
        CursorCoordinate::new(line as u32, character as u32)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacedMarker {
    pub view: ViewId,
    pub at: CursorCoordinate,
}

/// Editor host backed by files on disk, drawing the active view to a terminal.
pub struct TerminalHost {
    views: Vec<TerminalView>,
    active: Option<ViewId>,
    markers: BTreeMap<MarkerId, PlacedMarker>,
    notices: Vec<Notice>,
    next_view: u64,
    context: usize,
    color: bool,
    width: Option<usize>,
}

impl Default for TerminalHost {
    fn default() -> Self {
        Self::new()
    }
}

impl TerminalHost {
    pub fn new() -> Self {
        Self {
            views: Vec::new(),
            active: None,
            markers: BTreeMap::new(),
            notices: Vec::new(),
            next_view: 1,
            context: 3,
            color: true,
            width: None,
        }
    }

    /// Lines shown above and below the revealed position.
    pub fn with_context(mut self, context: usize) -> Self {
        self.context = context;
        self
    }

    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    /// Fixed render width instead of asking the terminal.
    pub fn with_width(mut self, width: usize) -> Self {
        self.width = Some(width);
        self
    }

    pub fn views(&self) -> &[TerminalView] {
        &self.views
    }

    pub fn view(&self, id: ViewId) -> Option<&TerminalView> {
        self.views.iter().find(|view| view.id == id)
    }

    pub fn active_view(&self) -> Option<&TerminalView> {
        self.active.and_then(|id| self.view(id))
    }

    /// Close a view. Its markers disappear with it; the most recently opened
    /// remaining view becomes active if the closed one was.
    pub fn close(&mut self, id: ViewId) -> Option<TerminalView> {
        let index = self.views.iter().position(|view| view.id == id)?;
        let closed = self.views.remove(index);
        self.markers.retain(|_, marker| marker.view != id);
        if self.active == Some(id) {
            self.active = self.views.last().map(|view| view.id);
        }
        Some(closed)
    }

    pub fn visible_markers(&self) -> Vec<(MarkerId, PlacedMarker)> {
        self.markers.iter().map(|(id, marker)| (*id, *marker)).collect()
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// Draw the visible window of the active view: a gutter carrying the
    /// marker glyph, line numbers, then the text clipped to the terminal width.
    pub fn render<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let Some(view) = self.active_view() else {
            writeln!(out, "[No active view]")?;
            return Ok(());
        };

        self.write_styled(
            out,
            Color::Cyan,
            &format!("{} ({})", view.file, view.content_type),
        )?;
        writeln!(out)?;

        let width = self
            .width
            .unwrap_or_else(|| size().map(|(w, _)| w as usize).unwrap_or(DEFAULT_WIDTH));
        let line_num_width = (view.lines.len().max(1).to_string().len() + 1).max(4);
        // Marker column, line number, separating space
        let text_width = width.saturating_sub(line_num_width + 2).max(1);

        let end = view
            .lines
            .len()
            .min(view.top_line + self.context * 2 + 1);
        for idx in view.top_line..end {
            let marked = self
                .markers
                .values()
                .any(|marker| marker.view == view.id && marker.at.line as usize == idx);
            if marked {
                self.write_styled(out, Color::Red, &MARKER_GLYPH.to_string())?;
            } else {
                write!(out, " ")?;
            }

            let line_num = format!("{:>width$} ", idx + 1, width = line_num_width);
            if idx == view.caret.line as usize {
                self.write_styled(out, Color::Yellow, &line_num)?;
            } else {
                write!(out, "{line_num}")?;
            }
            writeln!(out, "{}", truncate_to_width(&view.lines[idx], text_width))?;
        }

        writeln!(
            out,
            "Ln {}, Col {}",
            view.caret.line + 1,
            view.caret.character + 1
        )?;
        Ok(())
    }

    /// Print and drain pending notices.
    pub fn write_notices<W: Write>(&mut self, out: &mut W) -> io::Result<()> {
        for notice in self.take_notices() {
            match &notice {
                Notice::Info(message) => {
                    self.write_styled(out, Color::Cyan, "info: ")?;
                    writeln!(out, "{message}")?;
                }
                Notice::Error(message) => {
                    self.write_styled(out, Color::Red, "error: ")?;
                    writeln!(out, "{message}")?;
                }
                Notice::Status { message, .. } => {
                    if self.color {
                        queue!(
                            out,
                            SetAttribute(Attribute::Dim),
                            Print(message),
                            SetAttribute(Attribute::Reset)
                        )?;
                        writeln!(out)?;
                    } else {
                        writeln!(out, "{message}")?;
                    }
                }
            }
        }
        out.flush()
    }

    fn write_styled<W: Write>(&self, out: &mut W, color: Color, text: &str) -> io::Result<()> {
        if self.color {
            queue!(out, SetForegroundColor(color), Print(text), ResetColor)
        } else {
            write!(out, "{text}")
        }
    }

    fn view_mut(&mut self, id: ViewId) -> Option<&mut TerminalView> {
        self.views.iter_mut().find(|view| view.id == id)
    }
}

fn truncate_to_width(text: &str, max_width: usize) -> String {
    let mut result = String::new();
    let mut width = 0;
    for ch in text.chars() {
        let ch_width = if ch == '\t' {
            TAB_WIDTH
        } else {
            ch.width().unwrap_or(0)
        };
        if width + ch_width > max_width {
            break;
        }
        width += ch_width;
        if ch == '\t' {
            result.push_str(&" ".repeat(TAB_WIDTH));
        } else {
            result.push(ch);
        }
    }
    result
}

impl Notifier for TerminalHost {
    fn notify(&mut self, notice: Notice) {
        self.notices.push(notice);
    }
}

impl MarkerHost for TerminalHost {
    fn place_marker(&mut self, marker: MarkerId, view: ViewId, at: CursorCoordinate, icon: &Path) {
        // The terminal draws a glyph in place of the icon image
        log::debug!(
            "[TERMINAL] marker {:?} at {at} in {:?} (icon {})",
            marker,
            view,
            icon.display()
        );
        self.markers.insert(marker, PlacedMarker { view, at });
    }

    fn remove_marker(&mut self, marker: MarkerId) {
        self.markers.remove(&marker);
    }
}

impl EditorHost for TerminalHost {
    fn active_document(&self) -> Option<DocumentInfo> {
        self.active_view().map(TerminalView::info)
    }

    fn find_open(&self, file: &FileIdentity) -> Option<ViewId> {
        self.views
            .iter()
            .find(|view| &view.file == file)
            .map(|view| view.id)
    }

    fn activate(&mut self, view: ViewId) -> Result<DocumentInfo, HostError> {
        let info = self.view(view).map(TerminalView::info).ok_or(HostError::UnknownView(view))?;
        self.active = Some(view);
        Ok(info)
    }

    fn open(&mut self, file: &FileIdentity) -> Result<DocumentInfo, HostError> {
        let path = file.as_path();
        let content = fs::read_to_string(path).map_err(|source| HostError::open(path, source))?;

        let mut lines: Vec<String> = content.lines().map(String::from).collect();
        if lines.is_empty() {
            lines.push(String::new());
        }

        let id = ViewId(self.next_view);
        self.next_view += 1;
        let view = TerminalView {
            id,
            file: file.clone(),
            content_type: language_for_path(path).to_string(),
            lines,
            caret: CursorCoordinate::default(),
            top_line: 0,
        };
        let info = view.info();
        self.views.push(view);
        self.active = Some(id);
        Ok(info)
    }

    fn set_caret(&mut self, view: ViewId, at: CursorCoordinate) {
        if let Some(target) = self.view_mut(view) {
            target.caret = target.clamp(at);
        }
    }

    fn reveal(&mut self, view: ViewId, at: CursorCoordinate) {
        let context = self.context;
        if let Some(target) = self.view_mut(view) {
            let line = target.clamp(at).line as usize;
            target.top_line = line.saturating_sub(context);
        }
    }
}
