use async_trait::async_trait;
use reqwest::Client;
use tracing::{info, instrument};

use crate::config::ProviderKind;
use crate::error::Result;
use crate::model::StagedImage;
use crate::providers::{ImageProvider, ProviderConfig, cache};

/// Lorem Picsum random photos. Nothing is cached between runs.
pub struct Picsum {
    client: Client,
    cfg: ProviderConfig,
}

impl Picsum {
    pub fn new(client: Client, cfg: ProviderConfig) -> Self {
        Self { client, cfg }
    }

    fn image_url(&self) -> String {
        format!(
            "{}/{}/{}/?random",
            self.cfg.endpoints.picsum.trim_end_matches('/'),
            self.cfg.width,
            self.cfg.height
        )
    }
}

#[async_trait]
impl ImageProvider for Picsum {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Random
    }

    fn configure(&mut self, cfg: ProviderConfig) {
        self.cfg = cfg;
    }

    #[instrument(skip(self), fields(provider = "picsum"))]
    async fn get_images(&self) -> Result<Vec<StagedImage>> {
        cache::ensure_dir(&self.cfg.cache_dir)?;
        let url = self.image_url();
        let mut images = Vec::with_capacity(self.cfg.image_count);
        for i in 0..self.cfg.image_count {
            let name = format!("image{i}.jpg");
            let path = self.cfg.cache_dir.join(&name);
            info!(file = %name, "downloading random image");
            cache::download(&self.client, &url, &path, self.cfg.width, self.cfg.height).await?;
            images.push(StagedImage::new(name, path));
        }
        Ok(images)
    }
}
