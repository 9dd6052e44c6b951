use anyhow::Result;
use crossterm::{
    cursor::MoveTo,
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyModifiers, MouseButton, MouseEventKind},
    execute,
    style::{Attribute, Print, ResetColor, SetAttribute, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen},
};
use log::{debug, info, warn};
use nucleo::pattern::{CaseMatching, Normalization};
use nucleo::{Config, Nucleo, Utf32String};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;
use std::time::Duration;

use crate::theme::Theme;

// Header (2) + gap (1) + search (2)
const LIST_TOP: u16 = 6;
const MAX_VISIBLE: usize = 15;

/// Use nucleo to pick a PDF file with interactive fuzzy finding
pub fn pick_pdf_file(search_dirs: &[PathBuf]) -> Result<Option<PathBuf>> {
    let pdf_files = find_pdf_files(search_dirs);

    if pdf_files.is_empty() {
        let dirs: Vec<String> = search_dirs.iter().map(|d| d.display().to_string()).collect();
        warn!("No PDF files found in {}", dirs.join(", "));
        println!("No PDF files found in {}", dirs.join(", "));
        return Ok(None);
    }
    info!("File picker: {} PDF(s) to choose from", pdf_files.len());

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    terminal::enable_raw_mode()?;
    execute!(stdout, EnableMouseCapture)?;

    let result = run_fuzzy_picker(&pdf_files);

    execute!(stdout, DisableMouseCapture)?;
    terminal::disable_raw_mode()?;
    execute!(stdout, LeaveAlternateScreen)?;

    result
}

fn run_fuzzy_picker(files: &[String]) -> Result<Option<PathBuf>> {
    let mut stdout = io::stdout();

    let mut nucleo = Nucleo::<Arc<str>>::new(Config::DEFAULT.match_paths(), Arc::new(|| {}), None, 1);
    let injector = nucleo.injector();
    for file in files {
        let item: Arc<str> = Arc::from(file.as_str());
        let _ = injector.push(item, |data, cols: &mut [Utf32String]| {
            cols[0] = data.as_ref().into();
        });
    }

    let home = dirs::home_dir().map(|h| h.display().to_string());
    let mut query = String::new();
    let mut selected_index = 0usize;
    let mut scroll_offset = 0usize;

    loop {
        nucleo.tick(10);
        let (term_width, term_height) = terminal::size().unwrap_or((80, 24));
        execute!(stdout, Clear(ClearType::All))?;

        execute!(
            stdout,
            MoveTo(0, 0),
            SetBackgroundColor(Theme::header_results()),
            SetForegroundColor(Theme::text_header()),
            SetAttribute(Attribute::Bold),
            Print(format!("  {:<width$}", "Open PDF", width = term_width.saturating_sub(2) as usize)),
            ResetColor,
            SetAttribute(Attribute::Reset),
            MoveTo(0, 1),
            SetBackgroundColor(Theme::header_results()),
            Print(" ".repeat(term_width as usize)),
            ResetColor
        )?;

        execute!(
            stdout,
            MoveTo(0, 3),
            SetForegroundColor(Theme::accent_text()),
            Print("  Search: "),
            SetForegroundColor(Theme::text_primary()),
            Print(&query),
            SetForegroundColor(Theme::text_dim()),
            Print("_"),
            ResetColor
        )?;

        let snapshot = nucleo.snapshot();
        let all_matches: Vec<&str> = snapshot.matched_items(..).map(|item| item.data.as_ref()).collect();

        let max_path_width = (term_width as usize).saturating_sub(5);
        let max_display_items = (term_height as usize).saturating_sub(9).clamp(1, MAX_VISIBLE);

        selected_index = selected_index.min(all_matches.len().saturating_sub(1));
        if selected_index >= scroll_offset + max_display_items {
            scroll_offset = selected_index + 1 - max_display_items;
        } else if selected_index < scroll_offset {
            scroll_offset = selected_index;
        }

        let visible = all_matches.iter().skip(scroll_offset).take(max_display_items);
        for (display_i, path) in visible.enumerate() {
            let shown = shorten(display_path(path, home.as_deref()), max_path_width);
            execute!(stdout, MoveTo(0, LIST_TOP + display_i as u16))?;
            if scroll_offset + display_i == selected_index {
                execute!(
                    stdout,
                    SetForegroundColor(Theme::success()),
                    Print("  ▶ "),
                    SetForegroundColor(Theme::text_primary()),
                    Print(&shown),
                    ResetColor
                )?;
            } else {
                execute!(
                    stdout,
                    Print("    "),
                    SetForegroundColor(Theme::text_secondary()),
                    Print(&shown),
                    ResetColor
                )?;
            }
        }

        let help_line = LIST_TOP + max_display_items as u16 + 2;
        let count = if all_matches.len() > max_display_items {
            format!(
                "  Showing {}-{} of {} files",
                scroll_offset + 1,
                (scroll_offset + max_display_items).min(all_matches.len()),
                all_matches.len()
            )
        } else {
            format!("  {} files", all_matches.len())
        };
        execute!(
            stdout,
            MoveTo(0, help_line),
            SetForegroundColor(Theme::text_dim()),
            Print(&count),
            MoveTo(0, help_line + 1),
            Print("  ↑/↓ Navigate  •  Enter Open  •  Esc Cancel  •  Type to search"),
            ResetColor
        )?;
        stdout.flush()?;

        if !event::poll(Duration::from_millis(100))? {
            continue;
        }
        match event::read()? {
            Event::Key(key) if key.modifiers.contains(KeyModifiers::CONTROL) => {
                if matches!(key.code, KeyCode::Char('q') | KeyCode::Char('c')) {
                    return Ok(None);
                }
            }
            Event::Key(key) => match key.code {
                KeyCode::Esc => return Ok(None),
                KeyCode::Enter => {
                    if let Some(path) = all_matches.get(selected_index) {
                        debug!("File picker selected {}", path);
                        return Ok(Some(PathBuf::from(*path)));
                    }
                }
                KeyCode::Up => selected_index = selected_index.saturating_sub(1),
                KeyCode::Down => selected_index += 1,
                KeyCode::PageUp => selected_index = selected_index.saturating_sub(max_display_items),
                KeyCode::PageDown => selected_index += max_display_items,
                KeyCode::Home => selected_index = 0,
                KeyCode::End => selected_index = all_matches.len().saturating_sub(1),
                KeyCode::Backspace => {
                    query.pop();
                    selected_index = 0;
                    scroll_offset = 0;
                    nucleo
                        .pattern
                        .reparse(0, &query, CaseMatching::Smart, Normalization::Smart, false);
                }
                KeyCode::Char(c) => {
                    query.push(c);
                    selected_index = 0;
                    scroll_offset = 0;
                    // appending only narrows the match set
                    nucleo
                        .pattern
                        .reparse(0, &query, CaseMatching::Smart, Normalization::Smart, true);
                }
                _ => {}
            },
            Event::Mouse(mouse) => match mouse.kind {
                MouseEventKind::ScrollUp => selected_index = selected_index.saturating_sub(3),
                MouseEventKind::ScrollDown => selected_index += 3,
                MouseEventKind::Down(MouseButton::Left) => {
                    let row = mouse.row;
                    if row >= LIST_TOP && row < LIST_TOP + max_display_items as u16 {
                        let clicked = scroll_offset + (row - LIST_TOP) as usize;
                        if clicked < all_matches.len() {
                            selected_index = clicked;
                        }
                    }
                }
                _ => {}
            },
            _ => {}
        }
    }
}

/// Path relative to the home directory when it lives under it.
fn display_path<'a>(path: &'a str, home: Option<&str>) -> &'a str {
    home.and_then(|home| path.strip_prefix(home))
        .map(|rest| rest.trim_start_matches('/'))
        .filter(|rest| !rest.is_empty())
        .unwrap_or(path)
}

/// Fit a path into `max` characters, preferring the file name.
fn shorten(path: &str, max: usize) -> String {
    if path.chars().count() <= max {
        return path.to_string();
    }
    let name = path.rsplit('/').next().unwrap_or(path);
    if name.chars().count() + 4 <= max {
        return format!(".../{}", name);
    }
    let keep = max.saturating_sub(3);
    format!("{}...", name.chars().take(keep).collect::<String>())
}

/// Every PDF under the search directories, sorted and de-duplicated.
pub fn find_pdf_files(search_dirs: &[PathBuf]) -> Vec<String> {
    let mut all_files: Vec<String> = search_dirs
        .iter()
        .filter(|dir| dir.is_dir())
        .flat_map(|dir| find_pdfs_in_dir(dir))
        .collect();
    all_files.sort();
    all_files.dedup();
    all_files
}

fn find_pdfs_in_dir(search_dir: &Path) -> Vec<String> {
    // Try using fd first (faster), fallback to find
    let output = if command_exists("fd") {
        Command::new("fd")
            .args(["-e", "pdf", "-t", "f", "-a", "."])
            .arg(search_dir)
            .output()
    } else {
        Command::new("find")
            .arg(search_dir)
            .args(["-iname", "*.pdf", "-type", "f"])
            .output()
    };

    match output {
        Ok(output) if output.status.success() => String::from_utf8_lossy(&output.stdout)
            .lines()
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect(),
        Ok(output) => {
            debug!("PDF search in {} exited with {}", search_dir.display(), output.status);
            Vec::new()
        }
        Err(e) => {
            warn!("PDF search in {} failed: {}", search_dir.display(), e);
            Vec::new()
        }
    }
}

fn command_exists(cmd: &str) -> bool {
    Command::new("which")
        .arg(cmd)
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_display_path_strips_home() {
        assert_eq!(display_path("/home/ana/docs/a.pdf", Some("/home/ana")), "docs/a.pdf");
        assert_eq!(display_path("/srv/a.pdf", Some("/home/ana")), "/srv/a.pdf");
        assert_eq!(display_path("/srv/a.pdf", None), "/srv/a.pdf");
    }

    #[test]
    fn test_shorten_prefers_file_name() {
        assert_eq!(shorten("a/b.pdf", 20), "a/b.pdf");
        assert_eq!(shorten("/very/long/directory/name/report.pdf", 16), ".../report.pdf");
        assert_eq!(shorten("/x/quarterly-report.pdf", 10), "quarter...");
    }

    #[test]
    fn test_find_pdf_files_in_tempdir() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("one.pdf"), b"%PDF-1.4").unwrap();
        fs::write(dir.path().join("notes.txt"), b"x").unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub").join("two.pdf"), b"%PDF-1.4").unwrap();

        let dirs = vec![dir.path().to_path_buf(), dir.path().join("missing")];
        let files = find_pdf_files(&dirs);
        assert_eq!(files.len(), 2);
        assert!(files.iter().all(|f| f.ends_with(".pdf")));
    }
}
