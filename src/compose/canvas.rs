use image::{Rgba, RgbaImage, imageops};

use crate::compose::typeface::{TextExtent, Typeface};

pub const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
pub const SHADOW: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// Map a calendar colour name to RGBA; unknown names draw white.
pub fn colour_named(name: &str) -> Rgba<u8> {
    match name {
        "Red" => Rgba([255, 0, 0, 255]),
        "Orange" => Rgba([255, 165, 0, 255]),
        "Yellow" => Rgba([255, 255, 0, 255]),
        "Tan" => Rgba([210, 180, 140, 255]),
        "Chocolate" => Rgba([210, 105, 30, 255]),
        "Lime" => Rgba([0, 255, 0, 255]),
        "SkyBlue" => Rgba([135, 206, 235, 255]),
        "Violet" => Rgba([238, 130, 238, 255]),
        "LightPink" => Rgba([255, 182, 193, 255]),
        _ => WHITE,
    }
}

/// A photo being annotated, with the typeface used for its text.
pub struct Canvas<'a> {
    image: RgbaImage,
    face: &'a dyn Typeface,
}

impl<'a> Canvas<'a> {
    pub fn new(image: RgbaImage, face: &'a dyn Typeface) -> Self {
        Self { image, face }
    }

    pub fn measure(&self, text: &str, size: f32) -> TextExtent {
        self.face.measure(text, size)
    }

    /// Draw `text` with its top-left corner at (`x`, `y`): a black shadow one pixel down-right,
    /// then the text itself in `color`.
    pub fn draw_text(&mut self, text: &str, size: f32, color: Rgba<u8>, x: i32, y: i32) {
        let height = self.face.measure(text, size).height;
        let (x, y) = (x as f32, y as f32);
        self.face
            .rasterize(&mut self.image, text, size, SHADOW, x + 1.0, y + 1.0 + height);
        self.face
            .rasterize(&mut self.image, text, size, color, x, y + height);
    }

    /// Alpha-composite `icon` with its top-left corner at (`x`, `y`); overhang is clipped.
    pub fn draw_icon(&mut self, icon: &RgbaImage, x: i64, y: i64) {
        imageops::overlay(&mut self.image, icon, x, y);
    }

    /// Drop characters from the end until the text fits `max_width`, then trim whitespace.
    pub fn truncate_to_width(&self, text: &str, size: f32, max_width: f32) -> String {
        let mut line = text.to_string();
        while !line.is_empty() && self.face.measure(&line, size).width > max_width {
            line.pop();
        }
        line.trim().to_string()
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }
}
