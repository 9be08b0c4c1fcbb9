use std::path::Path;

use fast_image_resize as fir;
use image::{ImageFormat, RgbaImage, imageops};
use tracing::debug;

use crate::error::{Error, Result};
use crate::processing::layout::{center_offset, resize_to_cover};
use crate::processing::orientation::decode_rgba8_apply_exif;

/// Scale `source` to cover `target_w`×`target_h`, then crop the centre.
pub fn fill(source: &RgbaImage, target_w: u32, target_h: u32) -> Result<RgbaImage> {
    if source.width() == target_w && source.height() == target_h {
        return Ok(source.clone());
    }
    let (cover_w, cover_h) = resize_to_cover(target_w, target_h, source.width(), source.height());
    let resized = resize_rgba(source, cover_w, cover_h)?;
    let (crop_x, crop_y) = center_offset(target_w, target_h, cover_w, cover_h);
    Ok(imageops::crop_imm(&resized, crop_x, crop_y, target_w, target_h).to_image())
}

/// Decode the file at `path`, fill it to the target resolution and write it back in place.
pub fn fill_file_in_place(path: &Path, target_w: u32, target_h: u32) -> Result<()> {
    let source = decode_rgba8_apply_exif(path)?;
    let filled = fill(&source, target_w, target_h)?;
    debug!(
        path = %path.display(),
        from = ?source.dimensions(),
        to = ?filled.dimensions(),
        "filled image to target resolution"
    );
    save_for_path(&filled, path)
}

/// Save using the format implied by the extension, dropping alpha for JPEG.
pub fn save_for_path(img: &RgbaImage, path: &Path) -> Result<()> {
    let format = ImageFormat::from_path(path).unwrap_or(ImageFormat::Jpeg);
    let result = match format {
        ImageFormat::Jpeg => image::DynamicImage::ImageRgba8(img.clone())
            .to_rgb8()
            .save_with_format(path, ImageFormat::Jpeg),
        other => img.save_with_format(path, other),
    };
    result.map_err(|err| Error::image(path, err))
}

fn resize_rgba(source: &RgbaImage, target_w: u32, target_h: u32) -> Result<RgbaImage> {
    if target_w == 0 || target_h == 0 {
        return Err(Error::Render("resize dimensions must be positive".into()));
    }
    if source.width() == target_w && source.height() == target_h {
        return Ok(source.clone());
    }

    let src_view = fir::images::ImageRef::new(
        source.width(),
        source.height(),
        source.as_raw(),
        fir::PixelType::U8x4,
    )
    .map_err(|err| Error::Render(format!("failed to create resize source view: {err}")))?;
    let mut dst_image = fir::images::Image::new(target_w, target_h, fir::PixelType::U8x4);
    let options = fir::ResizeOptions::new()
        .resize_alg(fir::ResizeAlg::Convolution(fir::FilterType::Lanczos3));
    let mut resizer = fir::Resizer::new();
    resizer
        .resize(&src_view, &mut dst_image, Some(&options))
        .map_err(|err| Error::Render(format!("resize failed: {err}")))?;
    RgbaImage::from_raw(target_w, target_h, dst_image.into_vec())
        .ok_or_else(|| Error::Render("failed to construct resized RGBA image".into()))
}
