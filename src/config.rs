// Configuration for pdf-highlights: constants plus the optional settings file
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::HighlightError;

// Debug screen
pub const MAX_DEBUG_LOGS: usize = 1000;

// Environment overrides
pub const CONFIG_ENV: &str = "PDF_HIGHLIGHTS_CONFIG";
pub const SEARCH_DIRS_ENV: &str = "PDF_HIGHLIGHTS_SEARCH_DIRS";

const APP_DIR: &str = "pdf-highlights";
const CONFIG_FILE: &str = "config.toml";

/// How the batch shell writes results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Directories the file picker searches for PDFs.
    pub search_dirs: Vec<PathBuf>,
    /// `log` level filter name, used when neither `-v` nor `RUST_LOG` is set.
    pub log_level: Option<String>,
    pub output: OutputFormat,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            search_dirs: default_search_dirs(),
            log_level: None,
            output: OutputFormat::Text,
        }
    }
}

impl Settings {
    /// Read settings from `explicit`, else `$PDF_HIGHLIGHTS_CONFIG`, else the
    /// per-user config file. A missing default file is not an error; a
    /// missing explicit one is.
    pub fn load(explicit: Option<&Path>) -> Result<Self, HighlightError> {
        let from_env = env::var_os(CONFIG_ENV).map(PathBuf::from);
        let (path, required) = match explicit.map(Path::to_path_buf).or(from_env) {
            Some(path) => (Some(path), true),
            None => (default_config_path(), false),
        };

        let mut settings = match path {
            Some(path) if required || path.exists() => Self::from_file(&path)?,
            _ => Self::default(),
        };
        settings.apply_env();
        Ok(settings)
    }

    pub fn from_file(path: &Path) -> Result<Self, HighlightError> {
        let text = fs::read_to_string(path).map_err(|source| HighlightError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| HighlightError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    fn apply_env(&mut self) {
        if let Ok(dirs) = env::var(SEARCH_DIRS_ENV) {
            self.search_dirs = parse_search_dirs(&dirs);
        }
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
}

// Home, Documents, Downloads and Desktop, whichever exist
fn default_search_dirs() -> Vec<PathBuf> {
    [dirs::home_dir(), dirs::document_dir(), dirs::download_dir(), dirs::desktop_dir()]
        .into_iter()
        .flatten()
        .collect()
}

fn parse_search_dirs(value: &str) -> Vec<PathBuf> {
    value
        .split(':')
        .filter(|part| !part.trim().is_empty())
        .map(PathBuf::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_full_settings_file() {
        let settings: Settings = toml::from_str(
            r#"
            search_dirs = ["/srv/contracts", "/tmp"]
            log_level = "debug"
            output = "json"
            "#,
        )
        .unwrap();
        assert_eq!(settings.search_dirs, vec![PathBuf::from("/srv/contracts"), PathBuf::from("/tmp")]);
        assert_eq!(settings.log_level.as_deref(), Some("debug"));
        assert_eq!(settings.output, OutputFormat::Json);
    }

    #[test]
    fn test_missing_keys_use_defaults() {
        let settings: Settings = toml::from_str("log_level = \"warn\"").unwrap();
        assert_eq!(settings.output, OutputFormat::Text);
        assert_eq!(settings.search_dirs, default_search_dirs());
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        assert!(toml::from_str::<Settings>("colour = \"red\"").is_err());
        assert!(toml::from_str::<Settings>("output = \"yaml\"").is_err());
    }

    #[test]
    fn test_from_file_reports_path_on_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "search_dirs = 3").unwrap();
        let err = Settings::from_file(file.path()).unwrap_err();
        assert!(matches!(err, HighlightError::ConfigParse { .. }));
        assert!(err.to_string().contains(&file.path().display().to_string()));
    }

    #[test]
    fn test_from_file_missing() {
        let err = Settings::from_file(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, HighlightError::ConfigIo { .. }));
    }

    #[test]
    fn test_parse_search_dirs_skips_empty_parts() {
        assert_eq!(
            parse_search_dirs("/a::/b:"),
            vec![PathBuf::from("/a"), PathBuf::from("/b")]
        );
    }
}
