use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::overlay::OverlaySource;

/// Load-shedding schedule for the configured area.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Loadshedding {
    /// Area name.
    pub name: String,
    pub region: String,
    /// Stage currently in force; zero when there is no load shedding.
    pub stage: i32,
    #[serde(rename = "Events")]
    pub events: Vec<LoadshedEvent>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadshedEvent {
    pub start: Option<DateTime<FixedOffset>>,
    pub end: Option<DateTime<FixedOffset>>,
    /// Short day name, e.g. `Mon`.
    pub day: String,
    pub note: String,
    pub stage: i32,
}

impl Loadshedding {
    /// Slots that have not finished yet at `now`, in schedule order.
    pub fn upcoming(&self, now: DateTime<FixedOffset>) -> impl Iterator<Item = &LoadshedEvent> {
        self.events
            .iter()
            .filter(move |event| event.end.is_none_or(|end| end > now))
    }
}

pub struct LoadshedSource;

impl OverlaySource for LoadshedSource {
    type Snapshot = Loadshedding;
    const PATH: &'static str = "/forecast/get";
    const SNAPSHOT_FILE: &'static str = "lastloadshed.json";
}
