//! Colored annotation extraction for PDF documents.
//!
//! Each highlight, free-text or polygon annotation is classified by its color
//! against a fixed five-entry [`palette`] and paired with the words printed
//! under its rectangle. The result of a scan is an ordered list of
//! [`Finding`]s, one per qualifying annotation.
//!
//! ```no_run
//! let report = pdf_highlights::scan_file("contract.pdf")?;
//! for line in report.lines() {
//!     println!("{line}");
//! }
//! # Ok::<(), pdf_highlights::HighlightError>(())
//! ```

pub mod annotations;
pub mod config;
pub mod error;
pub mod extractor;
pub mod findings;
pub mod fonts;
pub mod palette;
pub mod pdf_objects;
pub mod text_layer;

pub use error::{AnnotationFault, HighlightError, TextLayerError};
pub use extractor::{scan_bytes, scan_document, scan_file};
pub use findings::{Finding, ScanReport, NO_HIGHLIGHTS};
pub use palette::{ColorReference, Rgb, PALETTE};
