// Shared fixtures: small annotated PDFs built in memory with lopdf
#![allow(dead_code)]

use lopdf::content::{Content, Operation};
use lopdf::encryption::{decrypt_object, get_encryption_key};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream, StringFormat};
use std::path::{Path, PathBuf};

/// Font size every fixture line is set in. Without /Widths each glyph is 0.5 em.
pub const FONT_SIZE: f64 = 12.0;

#[derive(Default)]
struct PageFixture {
    lines: Vec<(f64, f64, String)>,
    annots: Vec<Object>,
    contents: Option<Object>,
}

#[derive(Default)]
pub struct PdfBuilder {
    pages: Vec<PageFixture>,
    font_entries: Vec<(String, Object)>,
}

impl PdfBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new page. Lines and annotations go to the latest page.
    pub fn page(mut self) -> Self {
        self.pages.push(PageFixture::default());
        self
    }

    pub fn text(mut self, x: f64, y: f64, text: &str) -> Self {
        self.current().lines.push((x, y, text.to_string()));
        self
    }

    pub fn annot(mut self, dict: Dictionary) -> Self {
        self.current().annots.push(Object::Dictionary(dict));
        self
    }

    /// Replace the latest page's `/Contents` with `contents` instead of its text lines.
    pub fn contents(mut self, contents: Object) -> Self {
        self.current().contents = Some(contents);
        self
    }

    /// Extra entry for the shared `/F1` font dictionary.
    pub fn font_entry(mut self, key: &str, value: Object) -> Self {
        self.font_entries.push((key.to_string(), value));
        self
    }

    /// Raw `/Annots` entry, for entries that are not annotation dictionaries.
    pub fn annot_entry(mut self, obj: Object) -> Self {
        self.current().annots.push(obj);
        self
    }

    fn current(&mut self) -> &mut PageFixture {
        if self.pages.is_empty() {
            self.pages.push(PageFixture::default());
        }
        let last = self.pages.len() - 1;
        &mut self.pages[last]
    }

    pub fn build(&self) -> Document {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let mut font = dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        };
        for (key, value) in &self.font_entries {
            font.set(key.as_str(), value.clone());
        }
        let font_id = doc.add_object(font);

        let mut kids = Vec::new();
        for fixture in &self.pages {
            let mut operations = Vec::new();
            for (x, y, text) in &fixture.lines {
                operations.push(Operation::new("BT", vec![]));
                operations.push(Operation::new("Tf", vec!["F1".into(), Object::Real(FONT_SIZE as _)]));
                operations.push(Operation::new("Td", vec![Object::Real(*x as _), Object::Real(*y as _)]));
                operations.push(Operation::new("Tj", vec![Object::string_literal(text.as_str())]));
                operations.push(Operation::new("ET", vec![]));
            }
            let contents = match &fixture.contents {
                Some(contents) => contents.clone(),
                None => {
                    let content = Content { operations };
                    Object::Reference(doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap())))
                }
            };

            let annots: Vec<Object> = fixture
                .annots
                .iter()
                .map(|annot| match annot {
                    Object::Dictionary(dict) => Object::Reference(doc.add_object(dict.clone())),
                    other => other.clone(),
                })
                .collect();

            let mut page = dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => contents,
            };
            if !annots.is_empty() {
                page.set("Annots", annots);
            }
            kids.push(Object::Reference(doc.add_object(page)));
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
                "MediaBox" => vec![Object::Integer(0), Object::Integer(0), Object::Integer(612), Object::Integer(792)],
                "Resources" => dictionary! {
                    "Font" => dictionary! { "F1" => font_id },
                },
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc
    }

    pub fn bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.build().save_to(&mut out).unwrap();
        out
    }

    /// Saved bytes encrypted with 40-bit RC4 (V1 R2) under the empty user password.
    /// `user_check` becomes `/U`; without one any password is accepted.
    pub fn encrypted_bytes(&self, user_check: Option<&[u8]>) -> Vec<u8> {
        let mut doc = self.build();
        let file_id = Object::String(b"pdf-highlights-01".to_vec(), StringFormat::Literal);
        doc.trailer.set("ID", vec![file_id.clone(), file_id]);
        let mut encrypt = dictionary! {
            "Filter" => "Standard",
            "V" => 1i64,
            "R" => 2i64,
            "Length" => 40i64,
            "O" => Object::String(vec![0x5a; 32], StringFormat::Literal),
            "P" => -4i64,
        };
        if let Some(check) = user_check {
            encrypt.set("U", Object::String(check.to_vec(), StringFormat::Literal));
        }
        let encrypt_id = doc.add_object(encrypt);
        doc.trailer.set("Encrypt", encrypt_id);

        // RC4 is symmetric, so the decrypting helper encrypts too
        let key = get_encryption_key(&doc, "", false).unwrap();
        let ids: Vec<ObjectId> = doc.objects.keys().copied().filter(|id| *id != encrypt_id).collect();
        for id in ids {
            let object = doc.objects.get_mut(&id).unwrap();
            if let Ok(sealed) = decrypt_object(&key, id, object) {
                match object {
                    Object::Stream(stream) => stream.set_content(sealed),
                    Object::String(content, _) => *content = sealed,
                    _ => {}
                }
            }
        }

        let mut out = Vec::new();
        doc.save_to(&mut out).unwrap();
        out
    }

    pub fn write_to(&self, dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, self.bytes()).unwrap();
        path
    }
}

fn numbers(values: &[f64]) -> Object {
    Object::Array(values.iter().map(|v| Object::Real(*v as _)).collect())
}

/// Annotation dictionary with optional stroke (`/C`) and fill (`/IC`) colors.
pub fn annotation(subtype: &str, rect: [f64; 4], stroke: Option<&[f64]>, fill: Option<&[f64]>) -> Dictionary {
    let mut dict = dictionary! {
        "Type" => "Annot",
        "Subtype" => Object::Name(subtype.as_bytes().to_vec()),
        "Rect" => numbers(&rect),
    };
    if let Some(stroke) = stroke {
        dict.set("C", numbers(stroke));
    }
    if let Some(fill) = fill {
        dict.set("IC", numbers(fill));
    }
    dict
}

pub fn highlight(rect: [f64; 4], color: &[f64]) -> Dictionary {
    annotation("Highlight", rect, Some(color), None)
}

/// Rectangle around the baseline-at-`y` line from `x0` to `x1`.
pub fn around(x0: f64, x1: f64, y: f64) -> [f64; 4] {
    [x0, y - 4.0, x1, y + 12.0]
}
