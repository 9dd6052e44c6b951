// Font metrics and character decoding for the page text layer
use std::collections::HashMap;
use std::ops::RangeInclusive;
use std::rc::Rc;

use encoding_rs::WINDOWS_1252;
use log::{debug, warn};
use lopdf::{Dictionary, Document, Object};

use crate::pdf_objects::{get_array, get_dict, get_name, get_resolved, number, resolve};

/// Advance for simple-font codes missing from `/Widths`, in 1/1000 em.
const SIMPLE_DEFAULT_WIDTH: f64 = 500.0;
/// `/DW` default for CID fonts.
const CID_DEFAULT_WIDTH: f64 = 1000.0;
/// Highest code a width table may name. Shown strings split into at most two bytes.
const MAX_CODE: u32 = 0xFFFF;

/// What the text layer needs from a font: code splitting, advances, Unicode.
#[derive(Debug, Clone, Default)]
pub struct FontMetrics {
    two_byte: bool,
    widths: HashMap<u32, f64>,
    default_width: f64,
    to_unicode: HashMap<u32, String>,
}

impl FontMetrics {
    /// Stand-in for fonts that cannot be found in the resources.
    pub fn fallback() -> Self {
        Self {
            default_width: SIMPLE_DEFAULT_WIDTH,
            ..Self::default()
        }
    }

    pub fn from_dict(doc: &Document, font: &Dictionary) -> Self {
        let subtype = get_name(doc, font, b"Subtype").unwrap_or_default();
        let mut metrics = if subtype == b"Type0" {
            Self::composite(doc, font)
        } else {
            Self::simple(doc, font)
        };
        metrics.to_unicode = load_to_unicode(doc, font);
        metrics
    }

    fn simple(doc: &Document, font: &Dictionary) -> Self {
        let mut widths = HashMap::new();
        let first_char = get_resolved(doc, font, b"FirstChar").and_then(number);
        if let (Some(first), Some(entries)) = (first_char, get_array(doc, font, b"Widths")) {
            for (offset, entry) in entries.iter().enumerate() {
                let Some(code) = code_at(first, offset) else {
                    warn!("/Widths from /FirstChar {} run past code {:#x}, ignoring the rest", first, MAX_CODE);
                    break;
                };
                if let Some(width) = resolve(doc, entry).ok().and_then(number) {
                    widths.insert(code, width);
                }
            }
        }
        Self {
            two_byte: false,
            widths,
            default_width: SIMPLE_DEFAULT_WIDTH,
            to_unicode: HashMap::new(),
        }
    }

    fn composite(doc: &Document, font: &Dictionary) -> Self {
        let descendant = get_array(doc, font, b"DescendantFonts")
            .and_then(|fonts| fonts.first())
            .and_then(|first| resolve(doc, first).ok())
            .and_then(|obj| obj.as_dict().ok());

        let (widths, default_width) = match descendant {
            Some(cid_font) => {
                let default_width = get_resolved(doc, cid_font, b"DW")
                    .and_then(number)
                    .unwrap_or(CID_DEFAULT_WIDTH);
                let widths = get_array(doc, cid_font, b"W")
                    .map(|w| parse_cid_widths(doc, w))
                    .unwrap_or_default();
                (widths, default_width)
            }
            None => {
                warn!("Type0 font without DescendantFonts, using default widths");
                (HashMap::new(), CID_DEFAULT_WIDTH)
            }
        };

        Self {
            two_byte: true,
            widths,
            default_width,
            to_unicode: HashMap::new(),
        }
    }

    /// Split a shown string into character codes.
    pub fn codes(&self, bytes: &[u8]) -> Vec<u32> {
        if self.two_byte {
            bytes
                .chunks(2)
                .map(|pair| match pair {
                    [hi, lo] => (u32::from(*hi) << 8) | u32::from(*lo),
                    [single] => u32::from(*single),
                    _ => 0,
                })
                .collect()
        } else {
            bytes.iter().map(|b| u32::from(*b)).collect()
        }
    }

    /// Glyph advance in 1/1000 em.
    pub fn width(&self, code: u32) -> f64 {
        self.widths.get(&code).copied().unwrap_or(self.default_width)
    }

    /// Word spacing (`Tw`) only applies to single-byte code 32.
    pub fn is_word_space(&self, code: u32) -> bool {
        !self.two_byte && code == 32
    }

    pub fn decode(&self, code: u32) -> String {
        if let Some(text) = self.to_unicode.get(&code) {
            return text.clone();
        }
        if self.two_byte {
            return char::from_u32(code).map(String::from).unwrap_or_default();
        }
        let byte = [code as u8];
        let (text, _) = WINDOWS_1252.decode_without_bom_handling(&byte);
        text.into_owned()
    }
}

/// `/W` array: `c [w1 w2 ...]` or `c_first c_last w` runs.
fn parse_cid_widths(doc: &Document, entries: &[Object]) -> HashMap<u32, f64> {
    let mut widths = HashMap::new();
    let mut i = 0;
    while i < entries.len() {
        let Some(first) = resolve(doc, &entries[i]).ok().and_then(number) else {
            break;
        };
        let Some(next) = entries.get(i + 1).and_then(|o| resolve(doc, o).ok()) else {
            break;
        };
        match next {
            Object::Array(run) => {
                for (offset, w) in run.iter().enumerate() {
                    let Some(code) = code_at(first, offset) else {
                        warn!("/W run from {} passes code {:#x}, ignoring the rest", first, MAX_CODE);
                        break;
                    };
                    if let Some(w) = resolve(doc, w).ok().and_then(number) {
                        widths.insert(code, w);
                    }
                }
                i += 2;
            }
            other => {
                let last = number(other);
                let w = entries.get(i + 2).and_then(|o| resolve(doc, o).ok()).and_then(number);
                let (Some(last), Some(w)) = (last, w) else {
                    break;
                };
                match code_range(first, last) {
                    Some(codes) => {
                        for code in codes {
                            widths.insert(code, w);
                        }
                    }
                    None => warn!("Skipping /W range {} {}", first, last),
                }
                i += 3;
            }
        }
    }
    widths
}

/// `first + offset` as a character code, or `None` outside `0..=MAX_CODE`.
fn code_at(first: f64, offset: usize) -> Option<u32> {
    if !(0.0..=f64::from(MAX_CODE)).contains(&first) {
        return None;
    }
    let code = (first as u32).checked_add(u32::try_from(offset).ok()?)?;
    (code <= MAX_CODE).then_some(code)
}

/// Codes covered by a `c_first c_last w` entry, clamped to `MAX_CODE`.
/// Inverted ranges and ranges starting past `MAX_CODE` give `None`.
fn code_range(first: f64, last: f64) -> Option<RangeInclusive<u32>> {
    let start = code_at(first, 0)?;
    if !(last >= first) {
        return None;
    }
    Some(start..=last.min(f64::from(MAX_CODE)) as u32)
}

fn load_to_unicode(doc: &Document, font: &Dictionary) -> HashMap<u32, String> {
    let Some(Object::Stream(stream)) = get_resolved(doc, font, b"ToUnicode") else {
        return HashMap::new();
    };
    let data = stream
        .decompressed_content()
        .unwrap_or_else(|_| stream.content.clone());
    let cmap = match adobe_cmap_parser::get_unicode_map(&data) {
        Ok(cmap) => cmap,
        Err(e) => {
            warn!("Ignoring unreadable ToUnicode CMap: {:?}", e);
            return HashMap::new();
        }
    };

    let mut map = HashMap::with_capacity(cmap.len());
    for (code, utf16_bytes) in cmap {
        let units: Vec<u16> = utf16_bytes
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        match String::from_utf16(&units) {
            Ok(text) => {
                map.insert(code, text);
            }
            Err(_) => debug!("Skipping invalid UTF-16 for code {}", code),
        }
    }
    map
}

/// Font dictionaries keyed by resource name, decoded on first use.
pub struct FontCache<'a> {
    doc: &'a Document,
    resources: Option<&'a Dictionary>,
    fonts: HashMap<Vec<u8>, Rc<FontMetrics>>,
}

impl<'a> FontCache<'a> {
    pub fn new(doc: &'a Document, resources: Option<&'a Dictionary>) -> Self {
        Self {
            doc,
            resources,
            fonts: HashMap::new(),
        }
    }

    pub fn get(&mut self, name: &[u8]) -> Rc<FontMetrics> {
        if let Some(font) = self.fonts.get(name) {
            return font.clone();
        }
        let font_dict = self
            .resources
            .and_then(|res| get_dict(self.doc, res, b"Font"))
            .and_then(|fonts| get_dict(self.doc, fonts, name));
        let metrics = match font_dict {
            Some(dict) => FontMetrics::from_dict(self.doc, dict),
            None => {
                warn!("Font /{} not in page resources", String::from_utf8_lossy(name));
                FontMetrics::fallback()
            }
        };
        let metrics = Rc::new(metrics);
        self.fonts.insert(name.to_vec(), metrics.clone());
        metrics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::{dictionary, Stream};

    #[test]
    fn test_simple_font_widths_from_first_char() {
        let doc = Document::with_version("1.5");
        let font = dictionary! {
            "Type" => "Font",
            "Subtype" => "TrueType",
            "FirstChar" => 65i64,
            "Widths" => vec![Object::Integer(600), Object::Integer(700)],
        };
        let metrics = FontMetrics::from_dict(&doc, &font);
        assert_eq!(metrics.width(65), 600.0);
        assert_eq!(metrics.width(66), 700.0);
        assert_eq!(metrics.width(67), SIMPLE_DEFAULT_WIDTH);
        assert_eq!(metrics.codes(b"AB"), vec![65, 66]);
        assert_eq!(metrics.decode(65), "A");
        assert!(metrics.is_word_space(32));
    }

    #[test]
    fn test_winansi_fallback_decodes_high_bytes() {
        let metrics = FontMetrics::fallback();
        assert_eq!(metrics.decode(0x93), "\u{201c}");
        assert_eq!(metrics.decode(0xe9), "é");
    }

    #[test]
    fn test_cid_width_runs() {
        let doc = Document::with_version("1.5");
        let w = vec![
            Object::Integer(1),
            Object::Array(vec![Object::Integer(250), Object::Integer(300)]),
            Object::Integer(10),
            Object::Integer(12),
            Object::Integer(800),
        ];
        let widths = parse_cid_widths(&doc, &w);
        assert_eq!(widths.get(&1), Some(&250.0));
        assert_eq!(widths.get(&2), Some(&300.0));
        assert_eq!(widths.get(&11), Some(&800.0));
        assert_eq!(widths.get(&13), None);
    }

    #[test]
    fn test_first_char_past_code_space_is_ignored() {
        let doc = Document::with_version("1.5");
        let font = dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "FirstChar" => 4_294_967_295i64,
            "Widths" => vec![Object::Integer(600), Object::Integer(700)],
        };
        let metrics = FontMetrics::from_dict(&doc, &font);
        assert!(metrics.widths.is_empty());
        assert_eq!(metrics.width(65), SIMPLE_DEFAULT_WIDTH);
    }

    #[test]
    fn test_widths_stop_at_last_code() {
        let doc = Document::with_version("1.5");
        let font = dictionary! {
            "Type" => "Font",
            "Subtype" => "TrueType",
            "FirstChar" => 65534i64,
            "Widths" => vec![Object::Integer(600), Object::Integer(700), Object::Integer(800)],
        };
        let metrics = FontMetrics::from_dict(&doc, &font);
        assert_eq!(metrics.widths.len(), 2);
        assert_eq!(metrics.width(0xFFFF), 700.0);
    }

    #[test]
    fn test_cid_ranges_are_bounded() {
        let doc = Document::with_version("1.5");
        let w = vec![
            // huge range: clamped to the two-byte code space
            Object::Integer(0xFFF0),
            Object::Integer(4_000_000_000),
            Object::Integer(500),
            // inverted range: skipped
            Object::Integer(20),
            Object::Integer(10),
            Object::Integer(900),
            // negative start: skipped
            Object::Integer(-5),
            Object::Integer(3),
            Object::Integer(900),
            Object::Integer(40),
            Object::Array(vec![Object::Integer(250)]),
        ];
        let widths = parse_cid_widths(&doc, &w);
        assert_eq!(widths.len(), 16 + 1);
        assert_eq!(widths.get(&0xFFFF), Some(&500.0));
        assert_eq!(widths.get(&15), None);
        assert_eq!(widths.get(&0), None);
        assert_eq!(widths.get(&40), Some(&250.0));
    }

    #[test]
    fn test_type0_font_uses_two_byte_codes_and_to_unicode() {
        let mut doc = Document::with_version("1.5");
        let cmap = b"/CIDInit /ProcSet findresource begin\n\
            12 dict begin\nbegincmap\n\
            1 begincodespacerange\n<0000> <FFFF>\nendcodespacerange\n\
            2 beginbfchar\n<0001> <0048>\n<0002> <0069>\nendbfchar\n\
            endcmap\nend\nend\n";
        let to_unicode = doc.add_object(Stream::new(dictionary! {}, cmap.to_vec()));
        let descendant = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "CIDFontType2",
            "DW" => 900i64,
        });
        let font = dictionary! {
            "Type" => "Font",
            "Subtype" => "Type0",
            "Encoding" => "Identity-H",
            "DescendantFonts" => vec![Object::Reference(descendant)],
            "ToUnicode" => to_unicode,
        };
        let metrics = FontMetrics::from_dict(&doc, &font);
        assert_eq!(metrics.codes(&[0, 1, 0, 2]), vec![1, 2]);
        assert_eq!(metrics.decode(1), "H");
        assert_eq!(metrics.decode(2), "i");
        assert_eq!(metrics.width(1), 900.0);
        assert!(!metrics.is_word_space(32));
    }

    #[test]
    fn test_cache_falls_back_for_unknown_font() {
        let doc = Document::with_version("1.5");
        let mut cache = FontCache::new(&doc, None);
        let font = cache.get(b"F9");
        assert_eq!(font.width(65), SIMPLE_DEFAULT_WIDTH);
    }
}
