use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

use crate::config::ProviderKind;
use crate::error::Result;
use crate::http;
use crate::model::StagedImage;
use crate::providers::cache::{self, Candidate};
use crate::providers::{ImageProvider, ProviderConfig, last_segment};

const GALLERY_PATH: &str = "/photography/photo-of-the-day/_jcr_content/.gallery.json";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Gallery {
    #[serde(default)]
    previous_endpoint: String,
    #[serde(default)]
    items: Vec<GalleryItem>,
}

#[derive(Debug, Deserialize)]
struct GalleryItem {
    #[serde(default)]
    image: GalleryImage,
}

#[derive(Debug, Default, Deserialize)]
struct GalleryImage {
    #[serde(default)]
    title: String,
    #[serde(default)]
    credit: String,
    #[serde(default)]
    uri: String,
}

/// National Geographic photo of the day.
pub struct NatGeo {
    client: Client,
    cfg: ProviderConfig,
}

impl NatGeo {
    pub fn new(client: Client, cfg: ProviderConfig) -> Self {
        Self { client, cfg }
    }

    fn base(&self) -> &str {
        self.cfg.endpoints.natgeo.trim_end_matches('/')
    }

    async fn manifest(&self) -> Result<Vec<Candidate>> {
        let url = format!("{}{GALLERY_PATH}", self.base());
        let mut gallery: Gallery = http::get_json(&self.client, &url).await?;

        if gallery.items.len() < self.cfg.image_count && !gallery.previous_endpoint.is_empty() {
            let previous = format!("{}{}", self.base(), gallery.previous_endpoint);
            debug!(url = %previous, "first page short; fetching previous page");
            match http::get_json::<Gallery>(&self.client, &previous).await {
                Ok(page) => gallery.items.extend(page.items),
                Err(err) => warn!(error = %err, "previous gallery page unavailable"),
            }
        }

        Ok(gallery.items.into_iter().map(candidate_for).collect())
    }
}

fn candidate_for(item: GalleryItem) -> Candidate {
    let image = item.image;
    let file_name = last_segment(&image.uri).unwrap_or_default().to_string();
    Candidate {
        file_name,
        url: (!image.uri.is_empty()).then_some(image.uri),
        attribution: Some(format!("{} - {}", image.title, image.credit)),
    }
}

#[async_trait]
impl ImageProvider for NatGeo {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Natgeo
    }

    fn configure(&mut self, cfg: ProviderConfig) {
        self.cfg = cfg;
    }

    #[instrument(skip(self), fields(provider = "natgeo"))]
    async fn get_images(&self) -> Result<Vec<StagedImage>> {
        info!("getting latest image list");
        match self.manifest().await {
            Ok(candidates) => cache::stage(&self.client, &self.cfg, candidates).await,
            Err(err) => Ok(cache::fallback(&self.cfg, "natgeo", &err)),
        }
    }
}
