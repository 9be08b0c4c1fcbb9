use std::fs;
use std::path::Path;
use std::sync::Mutex;

use ab_glyph::{Font, FontArc, PxScale, ScaleFont, point};
use fontdb::{Database, Family, Query, Source};
use image::{Rgba, RgbaImage};
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Measured size of a single line of text in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextExtent {
    pub width: f32,
    pub height: f32,
}

/// Text capability used by the overlay layouts.
pub trait Typeface: Send + Sync {
    fn measure(&self, text: &str, size: f32) -> TextExtent;

    /// Draw `text` with its left edge at `left` and its baseline at `baseline`.
    fn rasterize(
        &self,
        canvas: &mut RgbaImage,
        text: &str,
        size: f32,
        color: Rgba<u8>,
        left: f32,
        baseline: f32,
    );
}

/// Outline font rendered through `ab_glyph`.
#[derive(Clone)]
pub struct GlyphFace {
    font: FontArc,
}

impl GlyphFace {
    pub fn new(font: FontArc) -> Self {
        Self { font }
    }

    /// Load the configured font file, falling back to an installed sans-serif face.
    pub fn load(font_path: Option<&Path>) -> Result<Self> {
        if let Some(path) = font_path {
            match fs::read(path) {
                Ok(data) => match FontArc::try_from_vec(data) {
                    Ok(font) => {
                        debug!(path = %path.display(), "loaded overlay font");
                        return Ok(Self::new(font));
                    }
                    Err(err) => {
                        warn!(path = %path.display(), error = %err, "invalid font file; searching system fonts")
                    }
                },
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "font file unreadable; searching system fonts")
                }
            }
        }
        load_system_font().map(Self::new)
    }
}

fn load_system_font() -> Result<FontArc> {
    let mut db = Database::new();
    db.load_system_fonts();

    let preferred_families = [
        Family::Name("Roboto Black"),
        Family::Name("Roboto"),
        Family::Name("Noto Sans"),
        Family::Name("DejaVu Sans"),
        Family::SansSerif,
    ];

    for family in preferred_families {
        if let Some(id) = db.query(&Query {
            families: &[family],
            ..Default::default()
        }) && let Some(font) = load_face(&db, id)
        {
            return Ok(font);
        }
    }

    for face in db.faces() {
        if let Some(font) = load_face(&db, face.id) {
            return Ok(font);
        }
    }

    Err(Error::Config("no usable font found for overlays".into()))
}

fn load_face(db: &Database, id: fontdb::ID) -> Option<FontArc> {
    let face = db.face(id)?;
    let data = match &face.source {
        Source::Binary(data) => data.as_ref().as_ref().to_vec(),
        Source::File(path) => match fs::read(path) {
            Ok(data) => data,
            Err(err) => {
                debug!(path = %path.display(), error = %err, "skipping unreadable font");
                return None;
            }
        },
        Source::SharedFile(_, data) => data.as_ref().as_ref().to_vec(),
    };
    // Collections are skipped; `try_from_vec` only reads the first face.
    FontArc::try_from_vec(data).ok()
}

impl Typeface for GlyphFace {
    fn measure(&self, text: &str, size: f32) -> TextExtent {
        let scaled = self.font.as_scaled(PxScale::from(size));
        let mut width = 0.0f32;
        let mut previous = None;
        for ch in text.chars() {
            if ch.is_control() {
                continue;
            }
            let glyph_id = scaled.glyph_id(ch);
            if let Some(prev) = previous {
                width += scaled.kern(prev, glyph_id);
            }
            width += scaled.h_advance(glyph_id);
            previous = Some(glyph_id);
        }
        TextExtent {
            width: width.max(0.0),
            height: scaled.ascent() + scaled.descent().abs(),
        }
    }

    fn rasterize(
        &self,
        canvas: &mut RgbaImage,
        text: &str,
        size: f32,
        color: Rgba<u8>,
        left: f32,
        baseline: f32,
    ) {
        let scaled = self.font.as_scaled(PxScale::from(size));
        // Baseline is the bottom of the measured line box.
        let baseline = baseline - scaled.descent().abs();
        let mut cursor_x = left;
        let mut previous = None;
        for ch in text.chars() {
            if ch.is_control() {
                continue;
            }
            let glyph = scaled.glyph_id(ch);
            if let Some(prev) = previous {
                cursor_x += scaled.kern(prev, glyph);
            }
            let advance = scaled.h_advance(glyph);
            let mut positioned = scaled.scaled_glyph(ch);
            positioned.position = point(cursor_x, baseline);
            if let Some(outline) = self.font.outline_glyph(positioned) {
                let bounds = outline.px_bounds();
                outline.draw(|x, y, coverage| {
                    blend_pixel(
                        canvas,
                        bounds.min.x + x as f32,
                        bounds.min.y + y as f32,
                        color,
                        coverage,
                    );
                });
            }
            cursor_x += advance;
            previous = Some(glyph);
        }
    }
}

pub(crate) fn blend_pixel(canvas: &mut RgbaImage, x: f32, y: f32, color: Rgba<u8>, coverage: f32) {
    if coverage <= 0.0 {
        return;
    }
    let xi = x.floor() as i64;
    let yi = y.floor() as i64;
    if xi < 0 || yi < 0 || xi >= canvas.width() as i64 || yi >= canvas.height() as i64 {
        return;
    }
    let alpha = (color[3] as f32 / 255.0 * coverage).clamp(0.0, 1.0);
    let dst = canvas.get_pixel_mut(xi as u32, yi as u32);
    for c in 0..3 {
        let blended = color[c] as f32 * alpha + dst[c] as f32 * (1.0 - alpha);
        dst[c] = blended.round().clamp(0.0, 255.0) as u8;
    }
    dst[3] = dst[3].max((alpha * 255.0).round() as u8);
}

/// One `rasterize` call as seen by [`BlockFace`].
#[derive(Debug, Clone, PartialEq)]
pub struct DrawnText {
    pub text: String,
    pub size: f32,
    pub color: Rgba<u8>,
    pub left: f32,
    pub baseline: f32,
}

/// Fixed-pitch typeface that paints each glyph as a solid cell and records every call.
///
/// Glyphs are `size / 2` wide and `size` tall, so layouts are exact without any font installed.
#[derive(Debug, Default)]
pub struct BlockFace {
    calls: Mutex<Vec<DrawnText>>,
}

impl BlockFace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call made so far, in drawing order.
    pub fn calls(&self) -> Vec<DrawnText> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }
}

impl Typeface for BlockFace {
    fn measure(&self, text: &str, size: f32) -> TextExtent {
        let glyphs = text.chars().filter(|ch| !ch.is_control()).count();
        TextExtent {
            width: glyphs as f32 * size / 2.0,
            height: size,
        }
    }

    fn rasterize(
        &self,
        canvas: &mut RgbaImage,
        text: &str,
        size: f32,
        color: Rgba<u8>,
        left: f32,
        baseline: f32,
    ) {
        let extent = self.measure(text, size);
        let top = baseline - extent.height;
        let mut x = left;
        for ch in text.chars().filter(|ch| !ch.is_control()) {
            if !ch.is_whitespace() {
                let cell = size / 2.0;
                let mut py = top + 1.0;
                while py < baseline - 1.0 {
                    let mut px = x + 1.0;
                    while px < x + cell - 1.0 {
                        blend_pixel(canvas, px, py, color, 1.0);
                        px += 1.0;
                    }
                    py += 1.0;
                }
            }
            x += size / 2.0;
        }
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(DrawnText {
                text: text.to_string(),
                size,
                color,
                left,
                baseline,
            });
        }
    }
}
