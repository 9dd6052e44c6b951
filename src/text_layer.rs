// Page text layer: positioned words from a page content stream
use std::rc::Rc;

use kurbo::{Affine, Point, Rect};
use log::debug;
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, ObjectId};

use crate::error::TextLayerError;
use crate::fonts::{FontCache, FontMetrics};
use crate::pdf_objects::{content_bytes, inherited, number};

/// Glyph box extent below and above the baseline, in em.
const DESCENT_EM: f64 = 0.2;
const ASCENT_EM: f64 = 0.8;
/// Gaps wider than this (in em) split words.
const WORD_GAP_EM: f64 = 0.25;

#[derive(Debug, Clone, PartialEq)]
pub struct Word {
    pub text: String,
    /// User-space bounds, y up.
    pub bbox: Rect,
}

#[derive(Debug, Clone, Default)]
pub struct TextLayer {
    words: Vec<Word>,
}

impl TextLayer {
    /// Interpret the page's content streams into words.
    pub fn for_page(doc: &Document, page_id: ObjectId) -> Result<Self, TextLayerError> {
        let page = doc
            .get_object(page_id)
            .and_then(Object::as_dict)
            .map_err(|_| TextLayerError::NotAPage)?;

        let data = match page.get(b"Contents") {
            Ok(contents) => content_bytes(doc, contents)?,
            Err(_) => return Ok(Self::default()),
        };
        let content = Content::decode(&data)
            .map_err(|e| TextLayerError::Content(format!("undecodable operators: {e}")))?;

        let resources = inherited(doc, page, b"Resources").and_then(|r| r.as_dict().ok());
        let mut interpreter = Interpreter::new(FontCache::new(doc, resources));
        for operation in &content.operations {
            interpreter.apply(operation);
        }
        let words = interpreter.finish();
        debug!("Page object {:?}: {} words", page_id, words.len());
        Ok(Self { words })
    }

    pub fn words(&self) -> &[Word] {
        &self.words
    }

    /// Words whose boxes overlap `area`, in content order.
    pub fn words_in(&self, area: Rect) -> impl Iterator<Item = &Word> {
        let area = area.abs();
        self.words.iter().filter(move |word| overlaps(word.bbox, area))
    }

    /// Text under `area`, words joined by single spaces.
    pub fn text_in(&self, area: Rect) -> String {
        self.words_in(area)
            .map(|word| word.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Positive-area overlap; touching edges do not count.
fn overlaps(a: Rect, b: Rect) -> bool {
    a.x0 < b.x1 && b.x0 < a.x1 && a.y0 < b.y1 && b.y0 < a.y1
}

#[derive(Clone)]
struct TextState {
    font: Option<Rc<FontMetrics>>,
    font_size: f64,
    char_spacing: f64,
    word_spacing: f64,
    horizontal_scaling: f64,
    leading: f64,
    rise: f64,
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            font: None,
            font_size: 0.0,
            char_spacing: 0.0,
            word_spacing: 0.0,
            horizontal_scaling: 1.0,
            leading: 0.0,
            rise: 0.0,
        }
    }
}

#[derive(Clone, Default)]
struct GraphicsState {
    ctm: Affine,
    text: TextState,
}

struct PendingWord {
    text: String,
    bbox: Rect,
    /// Where the next glyph of this word would start.
    next_origin: Point,
    em: f64,
}

struct Interpreter<'a> {
    fonts: FontCache<'a>,
    gs: GraphicsState,
    stack: Vec<GraphicsState>,
    tm: Affine,
    tlm: Affine,
    pending: Option<PendingWord>,
    words: Vec<Word>,
}

impl<'a> Interpreter<'a> {
    fn new(fonts: FontCache<'a>) -> Self {
        Self {
            fonts,
            gs: GraphicsState::default(),
            stack: Vec::new(),
            tm: Affine::IDENTITY,
            tlm: Affine::IDENTITY,
            pending: None,
            words: Vec::new(),
        }
    }

    fn apply(&mut self, op: &Operation) {
        let args = &op.operands;
        match op.operator.as_str() {
            "q" => self.stack.push(self.gs.clone()),
            "Q" => {
                if let Some(saved) = self.stack.pop() {
                    self.gs = saved;
                }
            }
            "cm" => {
                if let Some(m) = matrix(args) {
                    self.gs.ctm = self.gs.ctm * m;
                }
            }
            "BT" => {
                self.tm = Affine::IDENTITY;
                self.tlm = Affine::IDENTITY;
            }
            "ET" => self.flush(),
            "Tf" => {
                if let (Some(Object::Name(name)), Some(size)) = (args.first(), args.get(1).and_then(number)) {
                    self.gs.text.font = Some(self.fonts.get(name));
                    self.gs.text.font_size = size;
                }
            }
            "Tc" => set_number(args, &mut self.gs.text.char_spacing),
            "Tw" => set_number(args, &mut self.gs.text.word_spacing),
            "TL" => set_number(args, &mut self.gs.text.leading),
            "Ts" => set_number(args, &mut self.gs.text.rise),
            "Tz" => {
                if let Some(scale) = args.first().and_then(number) {
                    self.gs.text.horizontal_scaling = scale / 100.0;
                }
            }
            "Td" => {
                if let Some((tx, ty)) = pair(args) {
                    self.move_line(tx, ty);
                }
            }
            "TD" => {
                if let Some((tx, ty)) = pair(args) {
                    self.gs.text.leading = -ty;
                    self.move_line(tx, ty);
                }
            }
            "Tm" => {
                if let Some(m) = matrix(args) {
                    self.tlm = m;
                    self.tm = m;
                }
            }
            "T*" => self.next_line(),
            "Tj" => {
                if let Some(Object::String(bytes, _)) = args.first() {
                    self.show(bytes);
                }
            }
            "'" => {
                self.next_line();
                if let Some(Object::String(bytes, _)) = args.first() {
                    self.show(bytes);
                }
            }
            "\"" => {
                if let [aw, ac, Object::String(bytes, _)] = args.as_slice() {
                    if let (Some(aw), Some(ac)) = (number(aw), number(ac)) {
                        self.gs.text.word_spacing = aw;
                        self.gs.text.char_spacing = ac;
                    }
                    self.next_line();
                    self.show(bytes);
                }
            }
            "TJ" => {
                if let Some(Object::Array(items)) = args.first() {
                    for item in items {
                        match item {
                            Object::String(bytes, _) => self.show(bytes),
                            other => {
                                if let Some(adjust) = number(other) {
                                    self.kern(adjust);
                                }
                            }
                        }
                    }
                }
            }
            _ => {}
        }
    }

    fn move_line(&mut self, tx: f64, ty: f64) {
        self.tlm = self.tlm * Affine::translate((tx, ty));
        self.tm = self.tlm;
    }

    fn next_line(&mut self) {
        let leading = self.gs.text.leading;
        self.move_line(0.0, -leading);
    }

    /// Text rendering matrix: glyph space (em units) to user space.
    fn rendering_matrix(&self) -> Affine {
        let ts = &self.gs.text;
        let tsm = Affine::new([ts.font_size * ts.horizontal_scaling, 0.0, 0.0, ts.font_size, 0.0, ts.rise]);
        self.gs.ctm * self.tm * tsm
    }

    /// `TJ` number: thousandths of an em, positive moves left.
    fn kern(&mut self, adjust: f64) {
        let ts = &self.gs.text;
        let tx = -adjust / 1000.0 * ts.font_size * ts.horizontal_scaling;
        self.tm = self.tm * Affine::translate((tx, 0.0));
        if -adjust / 1000.0 > WORD_GAP_EM {
            self.flush();
        }
    }

    fn show(&mut self, bytes: &[u8]) {
        let font = self
            .gs
            .text
            .font
            .clone()
            .unwrap_or_else(|| Rc::new(FontMetrics::fallback()));

        for code in font.codes(bytes) {
            let w0 = font.width(code) / 1000.0;
            let text = font.decode(code);

            let trm = self.rendering_matrix();
            let origin = trm * Point::ORIGIN;
            let glyph_box = trm.transform_rect_bbox(Rect::new(0.0, -DESCENT_EM, w0, ASCENT_EM));
            let em = (trm * Point::new(0.0, 1.0) - origin).hypot();

            let ts = &self.gs.text;
            let mut spacing = ts.char_spacing;
            if font.is_word_space(code) {
                spacing += ts.word_spacing;
            }
            let tx = (w0 * ts.font_size + spacing) * ts.horizontal_scaling;
            self.tm = self.tm * Affine::translate((tx, 0.0));

            if text.trim().is_empty() {
                self.flush();
                continue;
            }
            let next_origin = self.rendering_matrix() * Point::ORIGIN;
            self.push_glyph(&text, origin, glyph_box, next_origin, em);
        }
    }

    fn push_glyph(&mut self, text: &str, origin: Point, glyph_box: Rect, next_origin: Point, em: f64) {
        if let Some(word) = &self.pending {
            let gap = (origin - word.next_origin).hypot();
            if gap > WORD_GAP_EM * word.em.max(em) {
                self.flush();
            }
        }
        match &mut self.pending {
            Some(word) => {
                word.text.push_str(text);
                word.bbox = word.bbox.union(glyph_box);
                word.next_origin = next_origin;
                word.em = em;
            }
            None => {
                self.pending = Some(PendingWord {
                    text: text.to_string(),
                    bbox: glyph_box,
                    next_origin,
                    em,
                });
            }
        }
    }

    fn flush(&mut self) {
        if let Some(word) = self.pending.take() {
            self.words.push(Word {
                text: word.text,
                bbox: word.bbox,
            });
        }
    }

    fn finish(mut self) -> Vec<Word> {
        self.flush();
        self.words
    }
}

fn set_number(args: &[Object], slot: &mut f64) {
    if let Some(value) = args.first().and_then(number) {
        *slot = value;
    }
}

fn pair(args: &[Object]) -> Option<(f64, f64)> {
    match args {
        [a, b] => Some((number(a)?, number(b)?)),
        _ => None,
    }
}

fn matrix(args: &[Object]) -> Option<Affine> {
    if args.len() != 6 {
        return None;
    }
    let mut coeffs = [0.0; 6];
    for (slot, arg) in coeffs.iter_mut().zip(args) {
        *slot = number(arg)?;
    }
    Some(Affine::new(coeffs))
}
