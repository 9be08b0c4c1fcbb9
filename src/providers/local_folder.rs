use async_trait::async_trait;
use tracing::{debug, info, instrument};
use walkdir::WalkDir;

use crate::config::ProviderKind;
use crate::error::Result;
use crate::model::StagedImage;
use crate::providers::{ImageProvider, ProviderConfig, cache, is_image};

/// Images dropped into a local directory, used as-is.
pub struct LocalFolder {
    cfg: ProviderConfig,
}

impl LocalFolder {
    pub fn new(cfg: ProviderConfig) -> Self {
        Self { cfg }
    }
}

#[async_trait]
impl ImageProvider for LocalFolder {
    fn kind(&self) -> ProviderKind {
        ProviderKind::LocalFolder
    }

    fn configure(&mut self, cfg: ProviderConfig) {
        self.cfg = cfg;
    }

    #[instrument(skip(self), fields(provider = "local-folder", root = %self.cfg.cache_dir.display()))]
    async fn get_images(&self) -> Result<Vec<StagedImage>> {
        cache::ensure_dir(&self.cfg.cache_dir)?;
        let images: Vec<StagedImage> = WalkDir::new(&self.cfg.cache_dir)
            .min_depth(1)
            .max_depth(1)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file() && is_image(entry.path()))
            .take(self.cfg.image_count)
            .map(|entry| {
                let name = entry.file_name().to_string_lossy().into_owned();
                debug!(file = %name, "found local image");
                StagedImage::new(name, entry.into_path())
            })
            .collect();
        info!(count = images.len(), "listed local images");
        Ok(images)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[tokio::test]
    async fn lists_images_sorted_and_capped() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["c.jpg", "a.png", "b.JPG", "notes.txt"] {
            fs::write(dir.path().join(name), b"x").unwrap();
        }
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("nested/d.jpg"), b"x").unwrap();
        let cfg = ProviderConfig {
            kind: ProviderKind::LocalFolder,
            image_count: 2,
            cache_dir: dir.path().to_path_buf(),
            ..ProviderConfig::for_tests()
        };

        let images = LocalFolder::new(cfg).get_images().await.unwrap();

        let names: Vec<&str> = images.iter().map(|img| img.name.as_str()).collect();
        assert_eq!(names, vec!["a.png", "b.JPG"]);
        assert!(images.iter().all(|img| img.path.is_file()));
    }

    #[tokio::test]
    async fn creates_a_missing_folder() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("filefolder");
        let cfg = ProviderConfig {
            cache_dir: root.clone(),
            ..ProviderConfig::for_tests()
        };

        let images = LocalFolder::new(cfg).get_images().await.unwrap();

        assert!(images.is_empty());
        assert!(root.is_dir());
    }
}
