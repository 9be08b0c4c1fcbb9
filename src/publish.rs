use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use image::ImageFormat;
use tracing::{debug, info, instrument, warn};

use crate::error::{Error, Result};
use crate::model::Composite;

/// Replace the contents of the USB share with `composites`, re-encoded as `image{n}.jpg`.
/// A composite that cannot be re-encoded is skipped; the returned paths are what was written.
///
/// The folder must already exist; it is normally the mount point of the gadget's backing file.
/// Entries named in `reserved` are never touched.
#[instrument(skip_all, fields(dir = %dir.display(), count = composites.len()))]
pub fn publish(dir: &Path, reserved: &[String], composites: &[Composite]) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(Error::fs(
            dir,
            io::Error::new(io::ErrorKind::NotFound, "publish folder does not exist"),
        ));
    }
    clear(dir, reserved)?;

    let mut published = Vec::with_capacity(composites.len());
    for composite in composites {
        let target = dir.join(format!("image{}.jpg", composite.index));
        if let Err(err) = copy_as_jpeg(&composite.path, &target) {
            warn!(composite = composite.index, error = %err, "skipping composite");
            match fs::remove_file(&target) {
                Err(err) if err.kind() != io::ErrorKind::NotFound => {
                    warn!(path = %target.display(), error = %err, "failed to remove partial file");
                }
                _ => {}
            }
            continue;
        }
        debug!(from = %composite.path.display(), to = %target.display(), "published");
        published.push(target);
    }
    info!(count = published.len(), "publish folder updated");
    Ok(published)
}

fn copy_as_jpeg(source: &Path, target: &Path) -> Result<()> {
    let img = image::open(source).map_err(|err| Error::image(source, err))?;
    img.to_rgb8()
        .save_with_format(target, ImageFormat::Jpeg)
        .map_err(|err| Error::image(target, err))
}

fn clear(dir: &Path, reserved: &[String]) -> Result<()> {
    let entries = fs::read_dir(dir).map_err(|err| Error::fs(dir, err))?;
    for entry in entries.filter_map(|e| e.ok()) {
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if reserved.iter().any(|r| r == name.as_ref()) {
            debug!(entry = %name, "keeping reserved entry");
            continue;
        }
        let path = entry.path();
        let removed = if path.is_dir() {
            fs::remove_dir_all(&path)
        } else {
            fs::remove_file(&path)
        };
        if let Err(err) = removed {
            warn!(path = %path.display(), error = %err, "failed to remove published entry");
        }
    }
    Ok(())
}
