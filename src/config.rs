use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, ensure};
use serde::Deserialize;

const DEFAULT_RESERVED_ENTRY: &str = "System Volume Information";

/// Image source selected for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProviderKind {
    Bing,
    Natgeo,
    Pexels,
    Random,
    LocalFolder,
}

impl ProviderKind {
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Bing => "Bing Image of the Day",
            Self::Natgeo => "National Geographic Photo of the Day",
            Self::Pexels => "Pexels Curated",
            Self::Random => "Lorem Picsum",
            Self::LocalFolder => "Local Folder",
        }
    }

    /// Directory under `cache-root` holding this provider's files.
    pub fn cache_dir_name(self) -> &'static str {
        match self {
            Self::Bing => "bing",
            Self::Natgeo => "natgeo",
            Self::Pexels => "pexels",
            Self::Random => "lorem",
            Self::LocalFolder => "filefolder",
        }
    }

    /// Fallback snapshot file written into `state-dir`.
    pub fn snapshot_file_name(self) -> &'static str {
        match self {
            Self::Bing => "lastiodbing.json",
            Self::Natgeo => "lastnatgeo.json",
            Self::Pexels => "lastpexels.json",
            Self::Random => "lastlorem.json",
            Self::LocalFolder => "lastfilefolder.json",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Default for Resolution {
    fn default() -> Self {
        Self {
            width: 800,
            height: 480,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct Configuration {
    /// Image provider used for every run.
    pub provider: ProviderKind,
    /// Maximum number of staged images per run.
    pub image_count: usize,
    /// Target resolution of the frame panel.
    pub resolution: Resolution,
    /// Draw a weather composite per photo.
    pub weather: bool,
    /// Draw a calendar composite per photo.
    pub calendar: bool,
    /// Fetch load shedding data and show it on the weather composite.
    pub loadshed: bool,
    pub weather_url: String,
    pub calendar_url: String,
    pub loadshed_url: String,
    /// Parent of the per-provider cache directories.
    pub cache_root: PathBuf,
    /// Directory listed by the local-folder provider.
    pub local_folder: PathBuf,
    /// Render staging directory, rebuilt each run.
    pub render_path: PathBuf,
    /// Directory holding the last-known-good snapshot files.
    pub state_dir: PathBuf,
    pub publish: PublishConfig,
    pub assets: AssetsConfig,
    pub endpoints: EndpointsConfig,
    #[serde(with = "humantime_serde")]
    pub http_timeout: Duration,
    pub connectivity: ConnectivityConfig,
    pub usb_gadget: UsbGadgetConfig,
    pub schedule: ScheduleConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct PublishConfig {
    /// Root of the folder exported through the mass-storage gadget.
    pub path: PathBuf,
    /// Entries left untouched when the folder is cleared.
    pub reserved_entries: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct AssetsConfig {
    pub icon_dir: PathBuf,
    /// Font used for overlays; system fonts are searched when unset or unreadable.
    pub font_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct EndpointsConfig {
    pub bing: String,
    pub natgeo: String,
    pub pexels_api: String,
    pub pexels_images: String,
    pub pexels_api_key: String,
    pub picsum: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct ConnectivityConfig {
    /// `host:port` that must accept a TCP connection for the network to count as up.
    pub probe_address: String,
    #[serde(with = "humantime_serde")]
    pub interval: Duration,
    pub attempts: u32,
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct UsbGadgetConfig {
    pub detach_command: Vec<String>,
    pub attach_command: Vec<String>,
    /// Pause between detach and attach so the frame notices the disconnect.
    #[serde(with = "humantime_serde")]
    pub settle_delay: Duration,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct ScheduleConfig {
    #[serde(with = "humantime_serde")]
    pub interval: Duration,
    pub run_on_start: bool,
}

impl Configuration {
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let s = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config at {}", path.display()))?;
        serde_yaml::from_str(&s)
            .with_context(|| format!("failed to parse config at {}", path.display()))
    }

    /// Validate runtime invariants that cannot be expressed via serde defaults alone.
    pub fn validated(self) -> Result<Self> {
        ensure!(
            self.resolution.width >= 4 && self.resolution.height >= 4,
            "resolution must be at least 4x4"
        );
        ensure!(self.image_count > 0, "image-count must be greater than zero");
        ensure!(
            !self.publish.path.as_os_str().is_empty(),
            "publish.path must not be empty"
        );
        ensure!(
            self.connectivity.attempts > 0,
            "connectivity.attempts must be greater than zero"
        );
        ensure!(
            !self.connectivity.probe_address.trim().is_empty(),
            "connectivity.probe-address must not be empty"
        );
        ensure!(
            !self.usb_gadget.detach_command.is_empty()
                && !self.usb_gadget.attach_command.is_empty(),
            "usb-gadget commands must not be empty"
        );
        ensure!(
            !self.schedule.interval.is_zero(),
            "schedule.interval must be greater than zero"
        );
        if self.provider == ProviderKind::Pexels {
            ensure!(
                !self.endpoints.pexels_api_key.trim().is_empty(),
                "endpoints.pexels-api-key is required for the pexels provider"
            );
        }
        Ok(self)
    }

    pub fn provider_cache_dir(&self) -> PathBuf {
        match self.provider {
            ProviderKind::LocalFolder => self.local_folder.clone(),
            kind => self.cache_root.join(kind.cache_dir_name()),
        }
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            provider: ProviderKind::Bing,
            image_count: 8,
            resolution: Resolution::default(),
            weather: false,
            calendar: false,
            loadshed: false,
            weather_url: "http://localhost:20511".to_string(),
            calendar_url: "http://localhost:20513".to_string(),
            loadshed_url: "http://localhost:20515".to_string(),
            cache_root: PathBuf::from("./img"),
            local_folder: PathBuf::from("./img/filefolder"),
            render_path: PathBuf::from("./img/display"),
            state_dir: PathBuf::from("."),
            publish: PublishConfig::default(),
            assets: AssetsConfig::default(),
            endpoints: EndpointsConfig::default(),
            http_timeout: Duration::from_secs(30),
            connectivity: ConnectivityConfig::default(),
            usb_gadget: UsbGadgetConfig::default(),
            schedule: ScheduleConfig::default(),
        }
    }
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("/mnt/usb_share"),
            reserved_entries: vec![DEFAULT_RESERVED_ENTRY.to_string()],
        }
    }
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            icon_dir: PathBuf::from("./html/assets/images"),
            font_path: Some(PathBuf::from("./html/assets/font/Roboto-Black.ttf")),
        }
    }
}

impl Default for EndpointsConfig {
    fn default() -> Self {
        Self {
            bing: "http://www.bing.com".to_string(),
            natgeo: "https://www.nationalgeographic.com".to_string(),
            pexels_api: "https://api.pexels.com".to_string(),
            pexels_images: "https://images.pexels.com".to_string(),
            pexels_api_key: String::new(),
            picsum: "https://picsum.photos".to_string(),
        }
    }
}

impl Default for ConnectivityConfig {
    fn default() -> Self {
        Self {
            probe_address: "1.1.1.1:53".to_string(),
            interval: Duration::from_secs(60),
            attempts: 5,
            timeout: Duration::from_secs(2),
        }
    }
}

impl Default for UsbGadgetConfig {
    fn default() -> Self {
        Self {
            detach_command: ["sudo", "modprobe", "-r", "g_mass_storage"]
                .map(String::from)
                .to_vec(),
            attach_command: [
                "sudo",
                "modprobe",
                "g_mass_storage",
                "file=/piusb.bin",
                "stall=0",
                "ro=1",
            ]
            .map(String::from)
            .to_vec(),
            settle_delay: Duration::from_secs(5),
        }
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(30 * 60),
            run_on_start: true,
        }
    }
}
