use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::overlay::OverlaySource;

/// Days in the lunar cycle used to bucket the moon age into an icon.
pub const MOON_BUCKETS: i64 = 30;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Moon {
    pub date: Option<DateTime<FixedOffset>>,
    /// Days since the last new moon.
    pub age: f64,
    pub phase: f64,
    pub phase_name: String,
    pub illumination: f64,
}

impl Moon {
    /// Icon bucket `0..MOON_BUCKETS` for the current age.
    pub fn bucket(&self) -> i64 {
        if !self.age.is_finite() {
            return 0;
        }
        (self.age.round() as i64).rem_euclid(MOON_BUCKETS)
    }
}

pub struct MoonSource;

impl OverlaySource for MoonSource {
    type Snapshot = Moon;
    const PATH: &'static str = "/moon/get";
    const SNAPSHOT_FILE: &'static str = "lastmoon.json";
}
