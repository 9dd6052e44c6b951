// Scrollable, read-only list of lines: used for both results and the debug log
use copypasta::{ClipboardContext, ClipboardProvider};
use crossterm::{
    cursor::MoveTo,
    event::{MouseButton, MouseEvent, MouseEventKind},
    execute,
    style::{Color, ResetColor, SetBackgroundColor, SetForegroundColor},
};
use std::io::{self, Write};

use crate::theme::Theme;

#[derive(Debug, Clone, PartialEq)]
pub struct PanelLine {
    pub text: String,
    pub color: Option<Color>,
}

impl PanelLine {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            color: None,
        }
    }

    pub fn colored(text: impl Into<String>, color: Color) -> Self {
        Self {
            text: text.into(),
            color: Some(color),
        }
    }
}

/// One screen row: which line it belongs to and the slice of text shown.
#[derive(Debug, Clone, PartialEq)]
struct Row {
    line: usize,
    text: String,
}

pub struct LinePanel {
    pub lines: Vec<PanelLine>,
    pub scroll_offset: usize,
    pub selection_start: Option<usize>,
    pub selection_end: Option<usize>,
    pub is_selecting: bool,
    pub wrap: bool,
    last_bounds: Option<(u16, u16, u16, u16)>, // x, y, width, height
    last_rows: Vec<Row>,
}

impl LinePanel {
    pub fn new(wrap: bool) -> Self {
        Self {
            lines: Vec::new(),
            scroll_offset: 0,
            selection_start: None,
            selection_end: None,
            is_selecting: false,
            wrap,
            last_bounds: None,
            last_rows: Vec::new(),
        }
    }

    pub fn set_lines(&mut self, lines: Vec<PanelLine>) {
        self.lines = lines;
        self.scroll_offset = 0;
        self.clear_selection();
    }

    /// Split lines into screen rows of at most `width` characters.
    fn layout(&self, width: usize) -> Vec<Row> {
        let width = width.max(1);
        let mut rows = Vec::new();
        for (line, panel_line) in self.lines.iter().enumerate() {
            let chars: Vec<char> = panel_line.text.chars().collect();
            if chars.is_empty() {
                rows.push(Row { line, text: String::new() });
            } else if self.wrap {
                for chunk in chars.chunks(width) {
                    rows.push(Row {
                        line,
                        text: chunk.iter().collect(),
                    });
                }
            } else {
                rows.push(Row {
                    line,
                    text: chars.iter().take(width).collect(),
                });
            }
        }
        rows
    }

    pub fn render(&mut self, start_x: u16, start_y: u16, width: u16, height: u16) -> io::Result<()> {
        self.last_bounds = Some((start_x, start_y, width, height));
        self.last_rows = self.layout(width as usize);
        self.clamp_scroll(height as usize);

        let mut stdout = io::stdout();
        for y in 0..height {
            execute!(stdout, MoveTo(start_x, start_y + y))?;
            match self.last_rows.get(self.scroll_offset + y as usize) {
                Some(row) => {
                    let panel_line = &self.lines[row.line];
                    if self.is_selected(row.line) {
                        execute!(stdout, SetBackgroundColor(Theme::selection_bg()))?;
                    }
                    execute!(
                        stdout,
                        SetForegroundColor(panel_line.color.unwrap_or_else(Theme::text_primary))
                    )?;
                    let pad = (width as usize).saturating_sub(row.text.chars().count());
                    write!(stdout, "{}{}", row.text, " ".repeat(pad))?;
                    execute!(stdout, ResetColor)?;
                }
                None => write!(stdout, "{:width$}", "", width = width as usize)?,
            }
        }

        stdout.flush()?;
        Ok(())
    }

    fn row_count(&self) -> usize {
        if self.last_rows.is_empty() {
            self.lines.len()
        } else {
            self.last_rows.len()
        }
    }

    fn visible_height(&self) -> usize {
        self.last_bounds.map(|(_, _, _, h)| h as usize).unwrap_or(10)
    }

    fn clamp_scroll(&mut self, height: usize) {
        let max_scroll = self.row_count().saturating_sub(height);
        self.scroll_offset = self.scroll_offset.min(max_scroll);
    }

    pub fn scroll_up(&mut self, rows: usize) {
        self.scroll_offset = self.scroll_offset.saturating_sub(rows);
    }

    pub fn scroll_down(&mut self, rows: usize) {
        self.scroll_offset += rows;
        self.clamp_scroll(self.visible_height());
    }

    pub fn page_up(&mut self) {
        self.scroll_up(self.visible_height().max(1));
    }

    pub fn page_down(&mut self) {
        self.scroll_down(self.visible_height().max(1));
    }

    pub fn scroll_home(&mut self) {
        self.scroll_offset = 0;
    }

    pub fn scroll_end(&mut self) {
        self.scroll_offset = self.row_count();
        self.clamp_scroll(self.visible_height());
    }

    fn is_selected(&self, line: usize) -> bool {
        match (self.selection_start, self.selection_end) {
            (Some(start), Some(end)) => (start.min(end)..=start.max(end)).contains(&line),
            _ => false,
        }
    }

    pub fn select_all(&mut self) {
        if !self.lines.is_empty() {
            self.selection_start = Some(0);
            self.selection_end = Some(self.lines.len() - 1);
        }
    }

    pub fn clear_selection(&mut self) {
        self.selection_start = None;
        self.selection_end = None;
        self.is_selecting = false;
    }

    pub fn all_text(&self) -> String {
        self.lines
            .iter()
            .map(|line| line.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn selected_text(&self) -> Option<String> {
        let (start, end) = (self.selection_start?, self.selection_end?);
        let (start, end) = (start.min(end), start.max(end));
        let selected = self.lines.get(start..=end)?;
        Some(
            selected
                .iter()
                .map(|line| line.text.as_str())
                .collect::<Vec<_>>()
                .join("\n"),
        )
    }

    /// Copy the selection, or every line when nothing is selected.
    pub fn copy_to_clipboard(&self) -> Result<usize, String> {
        if self.lines.is_empty() {
            return Err("Nothing to copy".to_string());
        }
        let text = self.selected_text().unwrap_or_else(|| self.all_text());
        let count = text.lines().count();
        write_clipboard(text)?;
        Ok(count)
    }

    pub fn handle_mouse(&mut self, mouse: MouseEvent) -> bool {
        let Some((start_x, start_y, width, height)) = self.last_bounds else {
            return false;
        };
        let inside = mouse.column >= start_x
            && mouse.column < start_x + width
            && mouse.row >= start_y
            && mouse.row < start_y + height;
        if !inside {
            return false;
        }

        let row_idx = self.scroll_offset + (mouse.row - start_y) as usize;
        let line = self.last_rows.get(row_idx).map(|row| row.line);

        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                if let Some(line) = line {
                    self.selection_start = Some(line);
                    self.selection_end = Some(line);
                    self.is_selecting = true;
                    return true;
                }
            }
            MouseEventKind::Drag(MouseButton::Left) => {
                if let (true, Some(line)) = (self.is_selecting, line) {
                    self.selection_end = Some(line);
                    return true;
                }
            }
            MouseEventKind::Up(MouseButton::Left) => {
                if self.is_selecting {
                    if let Some(line) = line {
                        self.selection_end = Some(line);
                    }
                    self.is_selecting = false;
                    return true;
                }
            }
            MouseEventKind::ScrollUp => {
                self.scroll_up(3);
                return true;
            }
            MouseEventKind::ScrollDown => {
                self.scroll_down(3);
                return true;
            }
            _ => {}
        }
        false
    }
}

fn write_clipboard(text: String) -> Result<(), String> {
    let mut ctx = ClipboardContext::new().map_err(|e| format!("Clipboard error: {}", e))?;
    ctx.set_contents(text)
        .map_err(|e| format!("Clipboard error: {}", e))
}
