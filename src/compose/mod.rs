//! Draws overlay data onto staged photos and writes the composites into the render folder.

pub mod calendar;
pub mod canvas;
pub mod icons;
pub mod typeface;
pub mod weather;

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, FixedOffset};
use image::{ImageFormat, RgbaImage};
use tracing::{debug, info, instrument, warn};

use crate::error::{Error, Result};
use crate::model::{Composite, OverlayKind, StagedImage};
use crate::overlay::OverlayData;
use crate::processing::orientation::decode_rgba8_apply_exif;
use crate::processing::resize;

pub use canvas::Canvas;
pub use icons::IconSet;
pub use typeface::{BlockFace, GlyphFace, TextExtent, Typeface};

pub struct OverlayCompositor {
    render_dir: PathBuf,
    width: u32,
    height: u32,
    icons: IconSet,
    face: Option<Arc<dyn Typeface>>,
}

impl OverlayCompositor {
    pub fn new(
        render_dir: impl Into<PathBuf>,
        (width, height): (u32, u32),
        icons: IconSet,
        face: Option<Arc<dyn Typeface>>,
    ) -> Self {
        Self {
            render_dir: render_dir.into(),
            width,
            height,
            icons,
            face,
        }
    }

    /// Overlay kinds drawn for every photo, in output order. Plain when nothing is enabled.
    pub fn kinds(data: &OverlayData) -> Vec<OverlayKind> {
        let mut kinds = Vec::with_capacity(2);
        if data.weather.is_some() {
            kinds.push(OverlayKind::Weather);
        }
        if data.calendar.is_some() {
            kinds.push(OverlayKind::Calendar);
        }
        if kinds.is_empty() {
            kinds.push(OverlayKind::Plain);
        }
        kinds
    }

    /// Rebuild the render folder from `images`. Composites are numbered across the whole batch.
    #[instrument(skip_all, fields(images = images.len(), dir = %self.render_dir.display()))]
    pub fn compose_all(
        &self,
        images: &[StagedImage],
        data: &OverlayData,
        now: DateTime<FixedOffset>,
    ) -> Result<Vec<Composite>> {
        self.clear_render_dir()?;
        let kinds = Self::kinds(data);

        let mut composites = Vec::new();
        for image in images {
            let base = match self.load_base(image) {
                Ok(base) => base,
                Err(err) => {
                    warn!(image = %image.name, error = %err, "skipping unloadable image");
                    continue;
                }
            };
            for &kind in &kinds {
                let index = composites.len();
                match self.compose_one(index, image, &base, kind, data, now) {
                    Ok(composite) => composites.push(composite),
                    Err(err) => {
                        warn!(image = %image.name, ?kind, error = %err, "composite failed")
                    }
                }
            }
        }
        info!(count = composites.len(), "composites rendered");
        Ok(composites)
    }

    fn clear_render_dir(&self) -> Result<()> {
        let dir = &self.render_dir;
        if !dir.is_dir() {
            info!(path = %dir.display(), "creating render folder");
            return fs::create_dir_all(dir).map_err(|err| Error::fs(dir, err));
        }
        let entries = fs::read_dir(dir).map_err(|err| Error::fs(dir, err))?;
        for entry in entries.filter_map(|e| e.ok()) {
            let path = entry.path();
            let removed = if path.is_dir() {
                fs::remove_dir_all(&path)
            } else {
                fs::remove_file(&path)
            };
            if let Err(err) = removed {
                warn!(path = %path.display(), error = %err, "failed to clear render entry");
            }
        }
        Ok(())
    }

    fn load_base(&self, image: &StagedImage) -> Result<RgbaImage> {
        let decoded = decode_rgba8_apply_exif(&image.path)?;
        if decoded.dimensions() == (self.width, self.height) {
            return Ok(decoded);
        }
        debug!(image = %image.name, from = ?decoded.dimensions(), "filling to target resolution");
        resize::fill(&decoded, self.width, self.height)
    }

    fn compose_one(
        &self,
        index: usize,
        image: &StagedImage,
        base: &RgbaImage,
        kind: OverlayKind,
        data: &OverlayData,
        now: DateTime<FixedOffset>,
    ) -> Result<Composite> {
        let drawn = match kind {
            OverlayKind::Plain => base.clone(),
            OverlayKind::Weather => {
                let overlay = data
                    .weather
                    .as_ref()
                    .ok_or_else(|| Error::Render("weather data missing".into()))?;
                let mut canvas = Canvas::new(base.clone(), self.face()?);
                weather::draw(&mut canvas, &self.icons, overlay, now.date_naive(), now);
                canvas.into_image()
            }
            OverlayKind::Calendar => {
                let overlay = data
                    .calendar
                    .as_ref()
                    .ok_or_else(|| Error::Render("calendar data missing".into()))?;
                let mut canvas = Canvas::new(base.clone(), self.face()?);
                calendar::draw(&mut canvas, overlay, now.date_naive());
                canvas.into_image()
            }
        };

        let path = self.render_dir.join(format!("image{index}.png"));
        drawn
            .save_with_format(&path, ImageFormat::Png)
            .map_err(|err| Error::image(&path, err))?;
        debug!(path = %path.display(), ?kind, "composite written");
        Ok(Composite {
            index,
            kind,
            source: image.name.clone(),
            path,
        })
    }

    fn face(&self) -> Result<&dyn Typeface> {
        self.face
            .as_deref()
            .ok_or_else(|| Error::Render("no typeface available for overlay text".into()))
    }
}
