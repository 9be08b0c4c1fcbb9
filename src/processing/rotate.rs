use image::{Rgba, RgbaImage};

/// Rotate clockwise around the centre, growing the canvas to fit; uncovered pixels stay transparent.
pub fn rotate_clockwise(src: &RgbaImage, degrees: f32) -> RgbaImage {
    let theta = degrees.rem_euclid(360.0).to_radians();
    let (sin, cos) = theta.sin_cos();
    let w = src.width() as f32;
    let h = src.height() as f32;
    // The epsilon keeps right angles from growing a pixel through float noise.
    let out_w = (w * cos.abs() + h * sin.abs() - 1e-3).ceil().max(1.0) as u32;
    let out_h = (w * sin.abs() + h * cos.abs() - 1e-3).ceil().max(1.0) as u32;
    let (cx, cy) = (w / 2.0, h / 2.0);
    let (ox, oy) = (out_w as f32 / 2.0, out_h as f32 / 2.0);

    let mut out = RgbaImage::from_pixel(out_w, out_h, Rgba([0, 0, 0, 0]));
    for (x, y, px) in out.enumerate_pixels_mut() {
        let dx = x as f32 + 0.5 - ox;
        let dy = y as f32 + 0.5 - oy;
        let sx = dx * cos + dy * sin + cx;
        let sy = -dx * sin + dy * cos + cy;
        if sx >= 0.0 && sy >= 0.0 && sx < w && sy < h {
            *px = *src.get_pixel(sx as u32, sy as u32);
        }
    }
    out
}
