// Error types for the extractor
use std::path::PathBuf;

/// Failures that end a whole run.
#[derive(Debug, thiserror::Error)]
pub enum HighlightError {
    #[error("Could not open PDF: {0}")]
    Open(#[from] lopdf::Error),

    #[error("Could not read config {path}: {source}")]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// A problem with one annotation. Reported inline, never fatal.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AnnotationFault {
    #[error("missing /Rect")]
    MissingRect,

    #[error("/Rect must hold 4 numbers, found {0}")]
    BadRect(String),

    #[error("/{key} color has {count} components")]
    ColorComponents { key: &'static str, count: usize },

    #[error("/{key} color is not a number array")]
    ColorNotNumeric { key: &'static str },

    #[error("broken object reference: {0}")]
    Reference(String),

    #[error("page text unavailable: {0}")]
    Text(#[from] TextLayerError),
}

/// Problems interpreting a page content stream.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TextLayerError {
    #[error("page object is not a dictionary")]
    NotAPage,

    #[error("content stream: {0}")]
    Content(String),
}

impl From<lopdf::Error> for TextLayerError {
    fn from(e: lopdf::Error) -> Self {
        TextLayerError::Content(e.to_string())
    }
}
