use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::overlay::OverlaySource;

/// One upcoming event as listed by the calendar service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CalendarEvent {
    pub id: String,
    /// Name of the calendar the event belongs to.
    pub name: String,
    pub start: Option<DateTime<FixedOffset>>,
    pub end: Option<DateTime<FixedOffset>>,
    pub day_name: String,
    /// Preformatted start time, e.g. `09:30`.
    pub time: String,
    /// Preformatted duration, e.g. `1h`.
    pub duration: String,
    pub summary: String,
    pub location: String,
    pub description: String,
    pub colour: String,
}

/// Legend entry pairing a calendar name with its display colour.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalendarName {
    pub name: String,
    pub colour: String,
}

/// Events for the next four days.
pub struct CalendarEventsSource;

impl OverlaySource for CalendarEventsSource {
    type Snapshot = Vec<CalendarEvent>;
    const PATH: &'static str = "/calendar/get/4";
    const SNAPSHOT_FILE: &'static str = "lastcalevents.json";
}

pub struct CalendarLegendSource;

impl OverlaySource for CalendarLegendSource {
    type Snapshot = Vec<CalendarName>;
    const PATH: &'static str = "/calendar/get";
    const SNAPSHOT_FILE: &'static str = "lastcalnames.json";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_camel_case_events() {
        let json = r#"[{
            "id": "abc", "name": "Family",
            "start": "2024-03-02T09:30:00+02:00", "end": "2024-03-02T10:30:00+02:00",
            "dayName": "Saturday", "time": "09:30", "duration": "1h",
            "summary": "Swimming", "location": "", "description": "", "colour": "SkyBlue"
        }]"#;
        let events: Vec<CalendarEvent> = serde_json::from_str(json).unwrap();
        assert_eq!(events[0].day_name, "Saturday");
        assert_eq!(events[0].colour, "SkyBlue");
        assert!(events[0].start.is_some());
    }
}
