use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use image::RgbaImage;
use image::metadata::Orientation;
use tracing::debug;

use crate::error::{Error, Result};

/// Decode `path` to RGBA8, turned upright according to its EXIF orientation tag.
pub fn decode_rgba8_apply_exif(path: &Path) -> Result<RgbaImage> {
    let mut img = image::ImageReader::open(path)
        .and_then(|reader| reader.with_guessed_format())
        .map_err(|err| Error::fs(path, err))?
        .decode()
        .map_err(|err| Error::image(path, err))?;
    if let Some(orientation) = exif_orientation(path) {
        debug!(path = %path.display(), ?orientation, "applying exif orientation");
        img.apply_orientation(orientation);
    }
    Ok(img.into_rgba8())
}

/// Orientation of the primary image. Missing or unreadable metadata counts as upright.
fn exif_orientation(path: &Path) -> Option<Orientation> {
    let mut reader = BufReader::new(File::open(path).ok()?);
    let exif = exif::Reader::new().read_from_container(&mut reader).ok()?;
    let value = exif
        .get_field(exif::Tag::Orientation, exif::In::PRIMARY)?
        .value
        .get_uint(0)?;
    Orientation::from_exif(u8::try_from(value).ok()?)
}
