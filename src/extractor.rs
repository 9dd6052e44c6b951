// Highlight extraction: pages -> qualifying annotations -> findings
use std::path::Path;

use log::{debug, info};
use lopdf::{Document, ObjectId};

use crate::annotations::{page_annotations, Annotation};
use crate::error::{AnnotationFault, HighlightError, TextLayerError};
use crate::findings::{Finding, ScanReport};
use crate::palette::categorize;
use crate::text_layer::TextLayer;

/// Open a PDF from disk and scan it.
pub fn scan_file(path: impl AsRef<Path>) -> Result<ScanReport, HighlightError> {
    let path = path.as_ref();
    info!("Scanning {}", path.display());
    let doc = open(Document::load(path)?)?;
    Ok(ScanReport {
        path: Some(path.to_path_buf()),
        pages: doc.get_pages().len(),
        findings: scan_document(&doc),
    })
}

/// Scan a PDF held in memory.
pub fn scan_bytes(bytes: &[u8]) -> Result<ScanReport, HighlightError> {
    let doc = open(Document::load_mem(bytes)?)?;
    Ok(ScanReport {
        path: None,
        pages: doc.get_pages().len(),
        findings: scan_document(&doc),
    })
}

// Documents encrypted with an empty user password open transparently.
fn open(mut doc: Document) -> Result<Document, HighlightError> {
    if doc.is_encrypted() {
        debug!("Document is encrypted, trying the empty password");
        doc.decrypt("")?;
    }
    Ok(doc)
}

/// One finding per qualifying annotation, pages ascending then `/Annots` order.
pub fn scan_document(doc: &Document) -> Vec<Finding> {
    let mut findings = Vec::new();
    for (page_number, page_id) in doc.get_pages() {
        let annotations = page_annotations(doc, page_id);
        debug!("Page {}: {} annotation(s)", page_number, annotations.len());

        let mut page = PageScan::new(doc, page_id, page_number);
        for annotation in annotations.iter().filter(|a| a.kind.qualifies()) {
            let finding = page.inspect(annotation).unwrap_or_else(|fault| {
                debug!("Page {}: annotation fault: {}", page_number, fault);
                Finding::Fault {
                    page: page_number,
                    detail: fault.to_string(),
                }
            });
            findings.push(finding);
        }
    }
    findings
}

/// Per-page state: the text layer is built on first use and kept.
struct PageScan<'a> {
    doc: &'a Document,
    page_id: ObjectId,
    number: u32,
    text: Option<Result<TextLayer, TextLayerError>>,
}

impl<'a> PageScan<'a> {
    fn new(doc: &'a Document, page_id: ObjectId, number: u32) -> Self {
        Self {
            doc,
            page_id,
            number,
            text: None,
        }
    }

    fn inspect(&mut self, annotation: &Annotation<'_>) -> Result<Finding, AnnotationFault> {
        let Some(color) = annotation.color()? else {
            return Ok(Finding::Uncolored { page: self.number });
        };
        let category = categorize(color);
        let area = annotation.rect()?;
        let text = self.text_layer()?.text_in(area);
        Ok(Finding::Match {
            page: self.number,
            category,
            text,
        })
    }

    fn text_layer(&mut self) -> Result<&TextLayer, TextLayerError> {
        let (doc, page_id) = (self.doc, self.page_id);
        self.text
            .get_or_insert_with(|| TextLayer::for_page(doc, page_id))
            .as_ref()
            .map_err(Clone::clone)
    }
}
