//! Image providers: each variant turns a remote gallery or a local folder into staged images.

pub mod bing;
pub mod cache;
pub mod local_folder;
pub mod natgeo;
pub mod pexels;
pub mod picsum;

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use reqwest::Client;

use crate::config::{Configuration, EndpointsConfig, ProviderKind};
use crate::error::Result;
use crate::model::StagedImage;

pub use bing::Bing;
pub use local_folder::LocalFolder;
pub use natgeo::NatGeo;
pub use pexels::Pexels;
pub use picsum::Picsum;

#[async_trait]
pub trait ImageProvider: Send + Sync {
    fn kind(&self) -> ProviderKind;

    /// Replace the run configuration. Called once per run before `get_images`.
    fn configure(&mut self, cfg: ProviderConfig);

    /// Produce up to `image_count` staged images, each backed by a file on disk.
    async fn get_images(&self) -> Result<Vec<StagedImage>>;
}

/// Immutable per-run view of the settings a provider needs.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub kind: ProviderKind,
    pub width: u32,
    pub height: u32,
    pub image_count: usize,
    pub cache_dir: PathBuf,
    pub snapshot_path: PathBuf,
    pub endpoints: EndpointsConfig,
}

impl ProviderConfig {
    pub fn from_configuration(cfg: &Configuration) -> Self {
        Self {
            kind: cfg.provider,
            width: cfg.resolution.width,
            height: cfg.resolution.height,
            image_count: cfg.image_count,
            cache_dir: cfg.provider_cache_dir(),
            snapshot_path: cfg.state_dir.join(cfg.provider.snapshot_file_name()),
            endpoints: cfg.endpoints.clone(),
        }
    }

    #[cfg(test)]
    pub(crate) fn for_tests() -> Self {
        Self::from_configuration(&Configuration::default())
    }
}

/// Build the provider selected in `cfg`, already configured for this run.
pub fn select(cfg: &Configuration, client: Client) -> Box<dyn ImageProvider> {
    let provider_cfg = ProviderConfig::from_configuration(cfg);
    let mut provider: Box<dyn ImageProvider> = match cfg.provider {
        ProviderKind::Bing => Box::new(Bing::new(client, provider_cfg.clone())),
        ProviderKind::Natgeo => Box::new(NatGeo::new(client, provider_cfg.clone())),
        ProviderKind::Pexels => Box::new(Pexels::new(client, provider_cfg.clone())),
        ProviderKind::Random => Box::new(Picsum::new(client, provider_cfg.clone())),
        ProviderKind::LocalFolder => Box::new(LocalFolder::new(provider_cfg.clone())),
    };
    provider.configure(provider_cfg);
    provider
}

/// Whether `path` has an extension the decoder understands.
pub fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            matches!(
                ext.to_ascii_lowercase().as_str(),
                "jpg" | "jpeg" | "png" | "gif" | "webp"
            )
        })
        .unwrap_or(false)
}

/// Last non-empty `/`-separated segment of `uri`, ignoring any query string.
pub(crate) fn last_segment(uri: &str) -> Option<&str> {
    let path = uri.split(['?', '#']).next().unwrap_or(uri);
    path.rsplit('/').find(|segment| !segment.is_empty())
}
