use std::path::PathBuf;

use image::RgbaImage;
use tracing::debug;

pub const HUMIDITY: &str = "humidity.png";
pub const PRESSURE: &str = "pressure.png";
pub const SUNRISE: &str = "sunrise.png";
pub const SUNSET: &str = "sunset.png";
pub const WIND_ARROW: &str = "up.png";

/// Icon for a weather service condition code.
pub fn weather_icon(code: i32) -> &'static str {
    match code {
        1 => "sun1.png",
        2 => "suncloud1.png",
        3 => "cloud1.png",
        4 => "cloudy1.png",
        5 => "sunrain1.png",
        6 => "rain1.png",
        7 => "thunder1.png",
        8 => "snow1.png",
        9 => "mist1.png",
        _ => "unknown1.png",
    }
}

/// Icon for a moon age bucket.
pub fn moon_icon(bucket: i64) -> String {
    format!("moon50_{bucket}.png")
}

/// Directory of overlay icons. Missing or unreadable icons are skipped by the layouts.
#[derive(Debug, Clone)]
pub struct IconSet {
    dir: PathBuf,
}

impl IconSet {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn get(&self, name: &str) -> Option<RgbaImage> {
        let path = self.dir.join(name);
        match image::open(&path) {
            Ok(img) => Some(img.to_rgba8()),
            Err(err) => {
                debug!(icon = %path.display(), error = %err, "icon unavailable; skipping");
                None
            }
        }
    }
}
