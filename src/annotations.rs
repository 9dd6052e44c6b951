// Annotation access: type codes, colors and rectangles from /Annots
use kurbo::Rect;
use log::warn;
use lopdf::{Dictionary, Document, Object, ObjectId};

use crate::error::AnnotationFault;
use crate::palette::Rgb;
use crate::pdf_objects::{get_array, get_resolved, numbers, resolve};

/// Type codes that take part in a scan: free text, highlight, polygon.
pub const QUALIFYING_CODES: [i32; 3] = [1, 8, 21];

/// Annotation subtype as a numeric type code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnotationKind {
    Text,
    FreeText,
    Link,
    Line,
    Square,
    Circle,
    Widget,
    PolyLine,
    Highlight,
    Underline,
    Squiggly,
    StrikeOut,
    Redact,
    Stamp,
    Caret,
    Ink,
    Popup,
    FileAttachment,
    Sound,
    Movie,
    RichMedia,
    Polygon,
    Screen,
    PrinterMark,
    TrapNet,
    Watermark,
    ThreeD,
    Projection,
    Unknown,
}

impl AnnotationKind {
    pub fn from_subtype(name: &[u8]) -> Self {
        match name {
            b"Text" => Self::Text,
            b"FreeText" => Self::FreeText,
            b"Link" => Self::Link,
            b"Line" => Self::Line,
            b"Square" => Self::Square,
            b"Circle" => Self::Circle,
            b"Widget" => Self::Widget,
            b"PolyLine" => Self::PolyLine,
            b"Highlight" => Self::Highlight,
            b"Underline" => Self::Underline,
            b"Squiggly" => Self::Squiggly,
            b"StrikeOut" => Self::StrikeOut,
            b"Redact" => Self::Redact,
            b"Stamp" => Self::Stamp,
            b"Caret" => Self::Caret,
            b"Ink" => Self::Ink,
            b"Popup" => Self::Popup,
            b"FileAttachment" => Self::FileAttachment,
            b"Sound" => Self::Sound,
            b"Movie" => Self::Movie,
            b"RichMedia" => Self::RichMedia,
            b"Polygon" => Self::Polygon,
            b"Screen" => Self::Screen,
            b"PrinterMark" => Self::PrinterMark,
            b"TrapNet" => Self::TrapNet,
            b"Watermark" => Self::Watermark,
            b"3D" => Self::ThreeD,
            b"Projection" => Self::Projection,
            _ => Self::Unknown,
        }
    }

    pub fn code(self) -> i32 {
        match self {
            Self::Text => 0,
            Self::FreeText => 1,
            Self::Link => 2,
            Self::Line => 3,
            Self::Square => 4,
            Self::Circle => 5,
            Self::Widget => 6,
            Self::PolyLine => 7,
            Self::Highlight => 8,
            Self::Underline => 9,
            Self::Squiggly => 10,
            Self::StrikeOut => 11,
            Self::Redact => 12,
            Self::Stamp => 13,
            Self::Caret => 14,
            Self::Ink => 15,
            Self::Popup => 16,
            Self::FileAttachment => 17,
            Self::Sound => 18,
            Self::Movie => 19,
            Self::RichMedia => 20,
            Self::Polygon => 21,
            Self::Screen => 22,
            Self::PrinterMark => 23,
            Self::TrapNet => 24,
            Self::Watermark => 25,
            Self::ThreeD => 26,
            Self::Projection => 27,
            Self::Unknown => -1,
        }
    }

    pub fn qualifies(self) -> bool {
        QUALIFYING_CODES.contains(&self.code())
    }
}

/// Read-only view of one annotation dictionary.
///
/// Only the subtype is read up front; color and rectangle are read on demand
/// so that a malformed field surfaces as a fault for this annotation alone.
#[derive(Debug, Clone, Copy)]
pub struct Annotation<'a> {
    doc: &'a Document,
    dict: &'a Dictionary,
    pub kind: AnnotationKind,
}

impl<'a> Annotation<'a> {
    pub fn new(doc: &'a Document, dict: &'a Dictionary) -> Option<Self> {
        let subtype = match get_resolved(doc, dict, b"Subtype")? {
            Object::Name(name) => name,
            _ => return None,
        };
        Some(Self {
            doc,
            dict,
            kind: AnnotationKind::from_subtype(subtype),
        })
    }

    /// Border color (`/C`).
    pub fn stroke_color(&self) -> Result<Option<Rgb>, AnnotationFault> {
        self.color_entry(b"C", "C")
    }

    /// Interior color (`/IC`).
    pub fn fill_color(&self) -> Result<Option<Rgb>, AnnotationFault> {
        self.color_entry(b"IC", "IC")
    }

    /// Stroke color if present, else fill color.
    pub fn color(&self) -> Result<Option<Rgb>, AnnotationFault> {
        match self.stroke_color()? {
            Some(color) => Ok(Some(color)),
            None => self.fill_color(),
        }
    }

    pub fn rect(&self) -> Result<Rect, AnnotationFault> {
        let raw = self.dict.get(b"Rect").map_err(|_| AnnotationFault::MissingRect)?;
        let items = resolve(self.doc, raw)
            .map_err(|e| AnnotationFault::Reference(e.to_string()))?
            .as_array()
            .map_err(|_| AnnotationFault::BadRect("a non-array".to_string()))?;
        let values = numbers(self.doc, items)
            .ok_or_else(|| AnnotationFault::BadRect("a non-number".to_string()))?;
        match values.as_slice() {
            [x0, y0, x1, y1] => Ok(Rect::new(*x0, *y0, *x1, *y1).abs()),
            other => Err(AnnotationFault::BadRect(other.len().to_string())),
        }
    }

    fn color_entry(&self, key: &[u8], label: &'static str) -> Result<Option<Rgb>, AnnotationFault> {
        let Ok(raw) = self.dict.get(key) else {
            return Ok(None);
        };
        let resolved = resolve(self.doc, raw).map_err(|e| AnnotationFault::Reference(e.to_string()))?;
        let items = match resolved {
            Object::Array(items) => items,
            Object::Null => return Ok(None),
            _ => return Err(AnnotationFault::ColorNotNumeric { key: label }),
        };
        let components = numbers(self.doc, items).ok_or(AnnotationFault::ColorNotNumeric { key: label })?;
        color_from_components(&components, label)
    }
}

/// Device color from 0, 1, 3 or 4 components.
pub fn color_from_components(components: &[f64], key: &'static str) -> Result<Option<Rgb>, AnnotationFault> {
    match *components {
        [] => Ok(None),
        [gray] => Ok(Some(Rgb::new(gray, gray, gray))),
        [r, g, b] => Ok(Some(Rgb::new(r, g, b))),
        [c, m, y, k] => Ok(Some(Rgb::new(
            (1.0 - c) * (1.0 - k),
            (1.0 - m) * (1.0 - k),
            (1.0 - y) * (1.0 - k),
        ))),
        _ => Err(AnnotationFault::ColorComponents {
            key,
            count: components.len(),
        }),
    }
}

/// Annotations listed in a page's `/Annots`, in array order.
///
/// Entries that are not annotation dictionaries are skipped with a warning.
pub fn page_annotations(doc: &Document, page_id: ObjectId) -> Vec<Annotation<'_>> {
    let Some(page) = doc.get_object(page_id).ok().and_then(|o| o.as_dict().ok()) else {
        warn!("Page object {:?} is not a dictionary", page_id);
        return Vec::new();
    };
    let Some(entries) = get_array(doc, page, b"Annots") else {
        return Vec::new();
    };

    let mut annotations = Vec::with_capacity(entries.len());
    for (index, entry) in entries.iter().enumerate() {
        let dict = match resolve(doc, entry).map(|obj| obj.as_dict()) {
            Ok(Ok(dict)) => dict,
            _ => {
                warn!("Skipping /Annots entry {} on page object {:?}: not a dictionary", index, page_id);
                continue;
            }
        };
        match Annotation::new(doc, dict) {
            Some(annotation) => annotations.push(annotation),
            None => warn!("Skipping /Annots entry {} on page object {:?}: no /Subtype", index, page_id),
        }
    }
    annotations
}
