use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{info, instrument};

use crate::config::ProviderKind;
use crate::error::Result;
use crate::http;
use crate::model::StagedImage;
use crate::providers::cache::{self, Candidate};
use crate::providers::{ImageProvider, ProviderConfig, last_segment};

#[derive(Debug, Deserialize)]
struct Archive {
    #[serde(default)]
    images: Vec<ArchiveImage>,
}

#[derive(Debug, Deserialize)]
struct ArchiveImage {
    #[serde(default)]
    urlbase: String,
    #[serde(default)]
    copyright: String,
}

/// Bing image-of-the-day archive.
pub struct Bing {
    client: Client,
    cfg: ProviderConfig,
}

impl Bing {
    pub fn new(client: Client, cfg: ProviderConfig) -> Self {
        Self { client, cfg }
    }

    fn manifest_url(&self) -> String {
        format!(
            "{}/HPImageArchive.aspx?format=js&idx=0&n={}&mkt=za",
            self.cfg.endpoints.bing.trim_end_matches('/'),
            self.cfg.image_count
        )
    }

    async fn manifest(&self) -> Result<Vec<Candidate>> {
        let archive: Archive = http::get_json(&self.client, &self.manifest_url()).await?;
        let base = self.cfg.endpoints.bing.trim_end_matches('/');
        Ok(archive
            .images
            .into_iter()
            .map(|img| Candidate {
                file_name: file_name_for(&img.urlbase).unwrap_or_default(),
                url: (!img.urlbase.is_empty())
                    .then(|| format!("{base}{}_1920x1080.jpg", img.urlbase)),
                attribution: Some(img.copyright),
            })
            .collect())
    }
}

/// `/th?id=OHR.Falls_EN-US123` becomes `OHR.Falls_EN-US123.jpg`.
fn file_name_for(urlbase: &str) -> Option<String> {
    let id = match urlbase.split_once("id=") {
        Some((_, rest)) => rest.split('&').next().unwrap_or(rest),
        None => last_segment(urlbase)?,
    };
    let id = id.trim();
    (!id.is_empty()).then(|| format!("{id}.jpg"))
}

#[async_trait]
impl ImageProvider for Bing {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Bing
    }

    fn configure(&mut self, cfg: ProviderConfig) {
        self.cfg = cfg;
    }

    #[instrument(skip(self), fields(provider = "bing"))]
    async fn get_images(&self) -> Result<Vec<StagedImage>> {
        info!("getting latest image list");
        match self.manifest().await {
            Ok(candidates) => cache::stage(&self.client, &self.cfg, candidates).await,
            Err(err) => Ok(cache::fallback(&self.cfg, "bing", &err)),
        }
    }
}
