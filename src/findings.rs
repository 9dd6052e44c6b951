// Scan results and their one-line renderings
use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

/// Shown by the shells when a scan produces no findings.
pub const NO_HIGHLIGHTS: &str = "No highlights detected in the selected PDF.";

/// Outcome for one qualifying annotation. Pages are 1-indexed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Finding {
    Match {
        page: u32,
        category: &'static str,
        text: String,
    },
    Uncolored {
        page: u32,
    },
    Fault {
        page: u32,
        detail: String,
    },
}

impl Finding {
    pub fn page(&self) -> u32 {
        match self {
            Finding::Match { page, .. } | Finding::Uncolored { page } | Finding::Fault { page, .. } => *page,
        }
    }

    pub fn is_fault(&self) -> bool {
        matches!(self, Finding::Fault { .. })
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Finding::Match { page, category, text } => write!(f, "{} found on page {}: {}", category, page, text),
            Finding::Uncolored { page } => write!(f, "Uncolored annotation found on page {}", page),
            Finding::Fault { page, detail } => {
                write!(f, "Error processing annotation on page {}: {}", page, detail)
            }
        }
    }
}

/// Everything one scan produced, in document order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScanReport {
    pub path: Option<PathBuf>,
    pub pages: usize,
    pub findings: Vec<Finding>,
}

impl ScanReport {
    pub fn is_empty(&self) -> bool {
        self.findings.is_empty()
    }

    pub fn lines(&self) -> Vec<String> {
        self.findings.iter().map(ToString::to_string).collect()
    }

    /// All result lines separated by newlines, as copied to the clipboard.
    pub fn joined(&self) -> String {
        self.lines().join("\n")
    }

    pub fn fault_count(&self) -> usize {
        self.findings.iter().filter(|f| f.is_fault()).count()
    }
}
