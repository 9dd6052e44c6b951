// Keyboard handling module
use crate::screen_mode::ScreenMode;
use crate::types::AppFlags;
use crate::{App, MOD_KEY};
use anyhow::Result;
#[cfg(target_os = "macos")]
use crossterm::event::KeyModifiers;
use crossterm::event::{KeyCode, KeyEvent};
use log::debug;

/// Returns `false` when the app should exit.
pub fn handle_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    // Ctrl+O - Open file picker (GLOBAL)
    if key.code == KeyCode::Char('o') && key.modifiers.contains(MOD_KEY) {
        app.open_file_picker = true;
        debug!("Ctrl+O: opening file picker");
        return Ok(true);
    }

    // Tab - Switch screens (GLOBAL)
    if key.code == KeyCode::Tab {
        app.screen_mode = app.screen_mode.next();
        app.flags.insert(AppFlags::REDRAW);
        debug!("Switched to {:?} screen", app.screen_mode);
        return Ok(true);
    }

    // Copy before quit so Ctrl+C copies where Ctrl is the modifier key
    if key.code == KeyCode::Char('c') && (key.modifiers.contains(MOD_KEY) || key.modifiers.is_empty()) {
        app.copy_active_panel();
        app.flags.insert(AppFlags::REDRAW);
        return Ok(true);
    }

    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => {
            app.flags.insert(AppFlags::EXIT);
            return Ok(false);
        }
        // Cmd+C copies on macOS, which leaves Ctrl+C free to quit
        #[cfg(target_os = "macos")]
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.flags.insert(AppFlags::EXIT);
            return Ok(false);
        }
        _ => {}
    }

    let panel = match app.screen_mode {
        ScreenMode::Results => &mut app.results,
        ScreenMode::Debug => &mut app.debug_panel,
    };
    match key.code {
        KeyCode::Char('a') if key.modifiers.contains(MOD_KEY) => panel.select_all(),
        KeyCode::Up => panel.scroll_up(1),
        KeyCode::Down => panel.scroll_down(1),
        KeyCode::PageUp => panel.page_up(),
        KeyCode::PageDown => panel.page_down(),
        KeyCode::Home => panel.scroll_home(),
        KeyCode::End => panel.scroll_end(),
        _ => return Ok(true),
    }
    app.flags.insert(AppFlags::REDRAW);
    Ok(true)
}
