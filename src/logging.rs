// Log sinks: in-memory ring buffer for the debug screen, env_logger for batch runs
use std::collections::VecDeque;
use std::env;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use log::{LevelFilter, Log, Metadata, Record};
use once_cell::sync::Lazy;

use pdf_highlights::config::{Settings, MAX_DEBUG_LOGS};

static DEBUG_LOGS: Lazy<Mutex<VecDeque<String>>> = Lazy::new(|| Mutex::new(VecDeque::new()));
/// Lines ever pushed. Keeps counting after the ring buffer is full.
static LOG_SEQ: AtomicUsize = AtomicUsize::new(0);

static DEBUG_LOGGER: DebugLog = DebugLog;

struct DebugLog;

impl Log for DebugLog {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        push_line(format!(
            "[{}] {:<5} {}: {}",
            chrono::Local::now().format("%H:%M:%S%.3f"),
            record.level(),
            record.target(),
            record.args()
        ));
    }

    fn flush(&self) {}
}

fn push_line(line: String) {
    if let Ok(mut logs) = DEBUG_LOGS.lock() {
        logs.push_back(line);
        while logs.len() > MAX_DEBUG_LOGS {
            logs.pop_front();
        }
        LOG_SEQ.fetch_add(1, Ordering::Relaxed);
    }
}

/// Copy of everything currently in the debug buffer, oldest first.
pub fn snapshot() -> Vec<String> {
    DEBUG_LOGS
        .lock()
        .map(|logs| logs.iter().cloned().collect())
        .unwrap_or_default()
}

/// Changes whenever a line is logged, even once old lines start dropping out.
pub fn debug_log_seq() -> usize {
    LOG_SEQ.load(Ordering::Relaxed)
}

/// Route `log` records into the debug screen buffer.
pub fn init_debug_log(level: LevelFilter) {
    if log::set_logger(&DEBUG_LOGGER).is_ok() {
        log::set_max_level(level);
    }
}

/// Route `log` records to stderr. `-v` beats `RUST_LOG`, which beats the config file.
pub fn init_stderr(verbose: u8, settings: &Settings) {
    let mut builder = env_logger::Builder::from_default_env();
    if verbose > 0 || env::var_os("RUST_LOG").is_none() {
        builder.filter_level(resolve_level(verbose, settings, LevelFilter::Warn));
    }
    let _ = builder.try_init();
}

/// Level from the `-v` count, else `RUST_LOG`, else the config file, else `fallback`.
pub fn resolve_level(verbose: u8, settings: &Settings, fallback: LevelFilter) -> LevelFilter {
    match verbose {
        0 => {}
        1 => return LevelFilter::Debug,
        _ => return LevelFilter::Trace,
    }
    env::var("RUST_LOG")
        .ok()
        .and_then(|value| value.parse().ok())
        .or_else(|| settings.log_level.as_deref().and_then(|value| value.parse().ok()))
        .unwrap_or(fallback)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbose_count_wins() {
        let settings = Settings {
            log_level: Some("error".to_string()),
            ..Settings::default()
        };
        assert_eq!(resolve_level(1, &settings, LevelFilter::Warn), LevelFilter::Debug);
        assert_eq!(resolve_level(3, &settings, LevelFilter::Warn), LevelFilter::Trace);
    }

    #[test]
    fn test_ring_buffer_is_bounded() {
        for i in 0..MAX_DEBUG_LOGS + 5 {
            push_line(format!("line {}", i));
        }
        let logs = snapshot();
        assert_eq!(logs.len(), MAX_DEBUG_LOGS);
        assert_eq!(logs.last().map(String::as_str), Some(format!("line {}", MAX_DEBUG_LOGS + 4).as_str()));
    }

    #[test]
    fn test_sequence_advances_when_buffer_is_full() {
        for i in 0..MAX_DEBUG_LOGS {
            push_line(format!("filler {}", i));
        }
        let before = debug_log_seq();
        push_line("one more".to_string());
        assert!(debug_log_seq() > before);
        assert_eq!(snapshot().len(), MAX_DEBUG_LOGS);
    }
}
