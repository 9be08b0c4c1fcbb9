use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::AUTHORIZATION;
use serde::Deserialize;
use tracing::{info, instrument};

use crate::config::ProviderKind;
use crate::error::Result;
use crate::http;
use crate::model::StagedImage;
use crate::providers::cache::{self, Candidate};
use crate::providers::{ImageProvider, ProviderConfig};

#[derive(Debug, Deserialize)]
struct Curated {
    #[serde(default)]
    photos: Vec<Photo>,
}

#[derive(Debug, Deserialize)]
struct Photo {
    id: u64,
    #[serde(default)]
    photographer: String,
}

/// Pexels curated photos.
pub struct Pexels {
    client: Client,
    cfg: ProviderConfig,
}

impl Pexels {
    pub fn new(client: Client, cfg: ProviderConfig) -> Self {
        Self { client, cfg }
    }

    fn manifest_url(&self) -> String {
        format!(
            "{}/v1/curated?per_page={}&page=1",
            self.cfg.endpoints.pexels_api.trim_end_matches('/'),
            self.cfg.image_count
        )
    }

    fn image_url(&self, id: u64) -> String {
        format!(
            "{}/photos/{id}/pexels-photo-{id}.jpeg?auto=compress&cs=tinysrgb&fit=crop&h={}&w={}",
            self.cfg.endpoints.pexels_images.trim_end_matches('/'),
            self.cfg.height,
            self.cfg.width
        )
    }

    async fn manifest(&self) -> Result<Vec<Candidate>> {
        let url = self.manifest_url();
        let request = self
            .client
            .get(&url)
            .header(AUTHORIZATION, self.cfg.endpoints.pexels_api_key.as_str());
        let curated: Curated = http::get_json_with(request, &url).await?;
        Ok(curated
            .photos
            .into_iter()
            .map(|photo| Candidate {
                file_name: format!("{}.jpg", photo.id),
                url: Some(self.image_url(photo.id)),
                attribution: Some(photo.photographer),
            })
            .collect())
    }
}

#[async_trait]
impl ImageProvider for Pexels {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Pexels
    }

    fn configure(&mut self, cfg: ProviderConfig) {
        self.cfg = cfg;
    }

    #[instrument(skip(self), fields(provider = "pexels"))]
    async fn get_images(&self) -> Result<Vec<StagedImage>> {
        info!("getting curated photo list");
        match self.manifest().await {
            Ok(candidates) => cache::stage(&self.client, &self.cfg, candidates).await,
            Err(err) => Ok(cache::fallback(&self.cfg, "pexels", &err)),
        }
    }
}
