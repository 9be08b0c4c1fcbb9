//! Overlay data sources. Each fetch persists its payload as the last-known-good snapshot.

pub mod calendar;
pub mod loadshed;
pub mod moon;
pub mod weather;

use std::fs;
use std::path::{Path, PathBuf};

use reqwest::Client;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info, instrument, warn};

use crate::config::Configuration;
use crate::error::{Error, Result};
use crate::http;

pub use calendar::{CalendarEvent, CalendarEventsSource, CalendarLegendSource, CalendarName};
pub use loadshed::{LoadshedEvent, LoadshedSource, Loadshedding};
pub use moon::{Moon, MoonSource};
pub use weather::{CurrentConditions, ForecastDay, Weather, WeatherSource};

/// A JSON endpoint with a fixed snapshot file.
pub trait OverlaySource {
    type Snapshot: DeserializeOwned + Serialize + Send;
    /// Path appended to the service base URL.
    const PATH: &'static str;
    /// File name of the snapshot inside the state directory.
    const SNAPSHOT_FILE: &'static str;
}

/// Fetches overlay snapshots over a shared client.
#[derive(Debug, Clone)]
pub struct OverlayFetcher {
    client: Client,
    state_dir: PathBuf,
}

impl OverlayFetcher {
    pub fn new(client: Client, state_dir: impl Into<PathBuf>) -> Self {
        Self {
            client,
            state_dir: state_dir.into(),
        }
    }

    pub fn snapshot_path<S: OverlaySource>(&self) -> PathBuf {
        self.state_dir.join(S::SNAPSHOT_FILE)
    }

    /// GET `{base_url}{S::PATH}`, decode it and overwrite the snapshot. Errors propagate.
    pub async fn fetch<S: OverlaySource>(&self, base_url: &str) -> Result<S::Snapshot> {
        let url = format!("{}{}", base_url.trim_end_matches('/'), S::PATH);
        let value: S::Snapshot = http::get_json(&self.client, &url).await?;
        let path = self.snapshot_path::<S>();
        if let Err(err) = write_snapshot(&path, &value) {
            warn!(path = %path.display(), error = %err, "failed to persist overlay snapshot");
        }
        debug!(url = %url, "overlay data refreshed");
        Ok(value)
    }
}

fn write_snapshot<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|err| Error::fs(parent, err))?;
    }
    let json = serde_json::to_vec(value)
        .map_err(|err| Error::decode(path.display().to_string(), err))?;
    fs::write(path, json).map_err(|err| Error::fs(path, err))
}

/// Weather forecast together with the moon phase drawn beside it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeatherOverlay {
    pub weather: Weather,
    pub moon: Moon,
    /// Present only when load shedding is enabled.
    pub loadshed: Option<Loadshedding>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CalendarOverlay {
    pub events: Vec<CalendarEvent>,
    pub legend: Vec<CalendarName>,
}

/// Everything fetched for one run, keyed by the enabled feature flags.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OverlayData {
    pub weather: Option<WeatherOverlay>,
    pub calendar: Option<CalendarOverlay>,
}

impl OverlayData {
    /// Fetch every source enabled in `cfg`. The first failure aborts the acquisition.
    #[instrument(skip_all, fields(weather = cfg.weather, calendar = cfg.calendar, loadshed = cfg.loadshed))]
    pub async fn acquire(fetcher: &OverlayFetcher, cfg: &Configuration) -> Result<Self> {
        let mut data = OverlayData::default();

        if cfg.weather {
            info!("getting weather forecast");
            let weather = fetcher.fetch::<WeatherSource>(&cfg.weather_url).await?;
            info!("getting moon phase");
            let moon = fetcher.fetch::<MoonSource>(&cfg.weather_url).await?;
            let loadshed = if cfg.loadshed {
                info!("getting load shedding schedule");
                Some(fetcher.fetch::<LoadshedSource>(&cfg.loadshed_url).await?)
            } else {
                None
            };
            data.weather = Some(WeatherOverlay {
                weather,
                moon,
                loadshed,
            });
        } else if cfg.loadshed {
            debug!("load shedding is only drawn on the weather overlay; skipping fetch");
        }

        if cfg.calendar {
            info!("getting calendar events");
            let events = fetcher
                .fetch::<CalendarEventsSource>(&cfg.calendar_url)
                .await?;
            let legend = fetcher
                .fetch::<CalendarLegendSource>(&cfg.calendar_url)
                .await?;
            data.calendar = Some(CalendarOverlay { events, legend });
        }

        Ok(data)
    }

    pub fn is_empty(&self) -> bool {
        self.weather.is_none() && self.calendar.is_none()
    }
}
