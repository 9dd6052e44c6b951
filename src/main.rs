// pdf-highlights - sort colored PDF annotations and show the text they mark
use anyhow::Result;
use clap::Parser;
use crossterm::{
    cursor::{Hide, MoveTo, Show},
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyModifiers},
    execute,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, disable_raw_mode, enable_raw_mode, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen},
};
use log::{error, info, LevelFilter};
use std::{
    io::{self, Write},
    path::{Path, PathBuf},
    process::ExitCode,
    time::Duration,
};

use pdf_highlights::config::{OutputFormat, Settings};
use pdf_highlights::{scan_file, ScanReport, NO_HIGHLIGHTS};

mod file_picker;
mod keyboard;
mod line_panel;
mod logging;
mod screen_mode;
mod theme;
mod types;

use line_panel::{LinePanel, PanelLine};
use screen_mode::ScreenMode;
use theme::Theme;
use types::AppFlags;

#[cfg(target_os = "macos")]
const MOD_KEY: KeyModifiers = KeyModifiers::SUPER;
#[cfg(not(target_os = "macos"))]
const MOD_KEY: KeyModifiers = KeyModifiers::CONTROL;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// PDF to scan. Without one, a file picker opens.
    pdf_file: Option<PathBuf>,

    /// Print result lines to stdout instead of opening the terminal UI
    #[arg(long, conflicts_with = "json")]
    print: bool,

    /// Print a JSON report to stdout
    #[arg(long)]
    json: bool,

    /// Settings file (default: <config dir>/pdf-highlights/config.toml)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Args {
    /// Batch output format, if this run should not open the terminal UI.
    fn batch_format(&self, settings: &Settings) -> Option<OutputFormat> {
        if self.json {
            Some(OutputFormat::Json)
        } else if self.print {
            Some(OutputFormat::Text)
        } else if !atty::is(atty::Stream::Stdout) {
            Some(settings.output)
        } else {
            None
        }
    }
}

pub struct App {
    pub settings: Settings,
    pub pdf_path: Option<PathBuf>,
    pub report: Option<ScanReport>,
    pub results: LinePanel,
    pub debug_panel: LinePanel,
    pub status_message: String,
    pub flags: AppFlags,
    pub open_file_picker: bool,
    pub screen_mode: ScreenMode,
    pub last_rendered_screen: Option<ScreenMode>,
    last_log_seq: usize,
}

impl App {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            pdf_path: None,
            report: None,
            results: LinePanel::new(true),
            debug_panel: LinePanel::new(false),
            status_message: String::new(),
            flags: AppFlags::REDRAW,
            open_file_picker: false,
            screen_mode: ScreenMode::Results,
            last_rendered_screen: None,
            last_log_seq: 0,
        }
    }

    /// Scan `path` and replace the results screen with its findings.
    pub fn load_pdf(&mut self, path: PathBuf) {
        match scan_file(&path) {
            Ok(report) => {
                info!(
                    "{}: {} finding(s) on {} page(s)",
                    path.display(),
                    report.findings.len(),
                    report.pages
                );
                self.status_message = match report.fault_count() {
                    0 => format!("{} finding(s)", report.findings.len()),
                    faults => format!("{} finding(s), {} unreadable", report.findings.len(), faults),
                };
                self.results.set_lines(result_lines(&report));
                self.report = Some(report);
            }
            Err(e) => {
                error!("{}: {}", path.display(), e);
                self.status_message = "Open failed".to_string();
                self.results
                    .set_lines(vec![PanelLine::colored(e.to_string(), Theme::error())]);
                self.report = None;
            }
        }
        self.pdf_path = Some(path);
        self.screen_mode = ScreenMode::Results;
        self.flags.insert(AppFlags::REDRAW);
    }

    pub fn copy_active_panel(&mut self) {
        let panel = match self.screen_mode {
            ScreenMode::Results => &self.results,
            ScreenMode::Debug => &self.debug_panel,
        };
        self.status_message = match panel.copy_to_clipboard() {
            Ok(count) => format!("Copied {} line(s)", count),
            Err(e) => format!("Copy failed: {}", e),
        };
    }

    fn sync_debug_log(&mut self) -> bool {
        let seq = logging::debug_log_seq();
        if seq == self.last_log_seq {
            return false;
        }
        self.last_log_seq = seq;
        self.debug_panel
            .set_lines(logging::snapshot().into_iter().map(PanelLine::plain).collect());
        self.debug_panel.scroll_end();
        true
    }
}

fn result_lines(report: &ScanReport) -> Vec<PanelLine> {
    if report.is_empty() {
        return vec![PanelLine::colored(NO_HIGHLIGHTS, Theme::text_dim())];
    }
    report
        .findings
        .iter()
        .map(|finding| PanelLine::colored(finding.to_string(), Theme::finding(finding)))
        .collect()
}

fn main() -> Result<ExitCode> {
    let args = Args::parse();
    let settings = Settings::load(args.config.as_deref())?;

    if let Some(format) = args.batch_format(&settings) {
        logging::init_stderr(args.verbose, &settings);
        let Some(path) = args.pdf_file.as_deref() else {
            eprintln!("A PDF path is required when not running interactively");
            return Ok(ExitCode::from(2));
        };
        return run_batch(path, format);
    }

    logging::init_debug_log(logging::resolve_level(args.verbose, &settings, LevelFilter::Info));
    info!("pdf-highlights v{}", env!("CARGO_PKG_VERSION"));

    let pdf_path = match args.pdf_file {
        Some(path) => path,
        None => match file_picker::pick_pdf_file(&settings.search_dirs)? {
            Some(path) => path,
            None => {
                println!("No file selected");
                return Ok(ExitCode::SUCCESS);
            }
        },
    };

    let mut app = App::new(settings);
    app.load_pdf(pdf_path);

    setup_terminal()?;
    let result = run_app(&mut app);
    restore_terminal()?;

    result.map(|()| ExitCode::SUCCESS)
}

fn run_batch(path: &Path, format: OutputFormat) -> Result<ExitCode> {
    let report = match scan_file(path) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("{}", e);
            return Ok(ExitCode::FAILURE);
        }
    };

    let mut stdout = io::stdout().lock();
    match format {
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut stdout, &report)?;
            writeln!(stdout)?;
        }
        OutputFormat::Text if report.is_empty() => eprintln!("{}", NO_HIGHLIGHTS),
        OutputFormat::Text => {
            for line in report.lines() {
                writeln!(stdout, "{}", line)?;
            }
        }
    }
    stdout.flush()?;
    Ok(ExitCode::SUCCESS)
}

fn setup_terminal() -> Result<()> {
    enable_raw_mode()?;
    execute!(io::stdout(), EnterAlternateScreen, Hide, EnableMouseCapture)?;
    Ok(())
}

fn restore_terminal() -> Result<()> {
    execute!(io::stdout(), Clear(ClearType::All), MoveTo(0, 0))?;
    execute!(io::stdout(), Show, LeaveAlternateScreen, DisableMouseCapture)?;
    disable_raw_mode()?;
    Ok(())
}

fn run_app(app: &mut App) -> Result<()> {
    let mut stdout = io::stdout();
    let mut last_term_size = (0, 0);

    loop {
        let (term_width, term_height) = terminal::size()?;

        if (term_width, term_height) != last_term_size || app.last_rendered_screen != Some(app.screen_mode) {
            app.flags.insert(AppFlags::REDRAW);
            last_term_size = (term_width, term_height);
            app.last_rendered_screen = Some(app.screen_mode);
        }

        if app.open_file_picker {
            app.open_file_picker = false;
            restore_terminal()?;
            if let Some(new_path) = file_picker::pick_pdf_file(&app.settings.search_dirs)? {
                app.load_pdf(new_path);
            }
            setup_terminal()?;
            app.flags.insert(AppFlags::REDRAW);
        }

        if app.sync_debug_log() && app.screen_mode == ScreenMode::Debug {
            app.flags.insert(AppFlags::REDRAW);
        }

        if app.flags.contains(AppFlags::REDRAW) {
            execute!(stdout, Clear(ClearType::All), MoveTo(0, 0))?;
            let body_height = term_height.saturating_sub(2);

            match app.screen_mode {
                ScreenMode::Results => {
                    let title = match &app.pdf_path {
                        Some(path) => format!("HIGHLIGHTS - {}", path.display()),
                        None => "HIGHLIGHTS".to_string(),
                    };
                    render_panel_header(&mut stdout, 0, 0, term_width, &title, Theme::header_results())?;
                    app.results.render(0, 1, term_width, body_height)?;
                }
                ScreenMode::Debug => {
                    render_panel_header(
                        &mut stdout,
                        0,
                        0,
                        term_width,
                        "DEBUG LOG - c to copy",
                        Theme::header_debug(),
                    )?;
                    app.debug_panel.render(0, 1, term_width, body_height)?;
                }
            }

            render_status_bar(&mut stdout, app, term_width, term_height)?;
            stdout.flush()?;
            app.flags.remove(AppFlags::REDRAW);
        }

        if event::poll(Duration::from_millis(50))? {
            match event::read()? {
                Event::Key(key) => {
                    if !keyboard::handle_input(app, key)? || app.flags.contains(AppFlags::EXIT) {
                        break;
                    }
                }
                Event::Mouse(mouse) => {
                    let panel = match app.screen_mode {
                        ScreenMode::Results => &mut app.results,
                        ScreenMode::Debug => &mut app.debug_panel,
                    };
                    if panel.handle_mouse(mouse) {
                        app.flags.insert(AppFlags::REDRAW);
                    }
                }
                Event::Resize(..) => app.flags.insert(AppFlags::REDRAW),
                _ => {}
            }
        }
    }

    Ok(())
}

fn render_panel_header(stdout: &mut io::Stdout, x: u16, y: u16, width: u16, title: &str, color: Color) -> Result<()> {
    execute!(stdout, MoveTo(x, y))?;
    execute!(stdout, SetBackgroundColor(color))?;
    execute!(stdout, SetForegroundColor(Theme::text_header()))?;

    let header_text: String = format!(" ● {} ", title).chars().take(width as usize).collect();
    write!(stdout, "{:^width$}", header_text, width = width as usize)?;

    execute!(stdout, ResetColor)?;
    Ok(())
}

fn render_status_bar(stdout: &mut io::Stdout, app: &App, width: u16, height: u16) -> Result<()> {
    execute!(stdout, MoveTo(0, height.saturating_sub(1)))?;
    execute!(stdout, SetBackgroundColor(Theme::bg_status_dark()))?;
    execute!(stdout, SetForegroundColor(Theme::text_status_dark()))?;

    let pages = app
        .report
        .as_ref()
        .map(|r| format!("{} page(s)", r.pages))
        .unwrap_or_else(|| "-".to_string());
    let status = format!(
        " {} | {} | {} | Tab: Switch | c: Copy | Ctrl+O: Open | q: Quit ",
        app.screen_mode.label(),
        pages,
        if app.status_message.is_empty() { "Ready" } else { &app.status_message }
    );

    let status: String = status.chars().take(width as usize).collect();
    let status_len = status.chars().count();
    execute!(stdout, Print(status))?;
    execute!(stdout, Print(" ".repeat((width as usize).saturating_sub(status_len))))?;
    execute!(stdout, ResetColor)?;

    Ok(())
}
