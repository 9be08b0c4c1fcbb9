use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use reqwest::Client;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::http;
use crate::model::StagedImage;
use crate::processing::resize;
use crate::providers::ProviderConfig;

/// One manifest entry, reduced to what staging needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Deterministic cache file name derived from the provider's identity for the entry.
    pub file_name: String,
    /// Binary download URL; entries without one can only be served from cache.
    pub url: Option<String>,
    pub attribution: Option<String>,
}

/// Accept up to `image_count` candidates in manifest order, downloading what is not cached,
/// then reconcile the cache directory and persist the accepted list as the fallback snapshot.
pub async fn stage(
    client: &Client,
    cfg: &ProviderConfig,
    candidates: Vec<Candidate>,
) -> Result<Vec<StagedImage>> {
    ensure_dir(&cfg.cache_dir)?;

    let mut accepted: Vec<StagedImage> = Vec::new();
    let mut names: HashSet<String> = HashSet::new();
    for candidate in candidates {
        if accepted.len() >= cfg.image_count {
            break;
        }
        if candidate.file_name.is_empty() || names.contains(&candidate.file_name) {
            debug!(file = %candidate.file_name, "skipping unusable or duplicate entry");
            continue;
        }
        let path = cfg.cache_dir.join(&candidate.file_name);
        if path.is_file() {
            debug!(path = %path.display(), "cache hit");
        } else {
            let Some(url) = candidate.url.as_deref() else {
                debug!(file = %candidate.file_name, "entry has no image url; discarding");
                remove_partial(&path);
                continue;
            };
            info!(file = %candidate.file_name, "downloading");
            if let Err(err) = download(client, url, &path, cfg.width, cfg.height).await {
                warn!(file = %candidate.file_name, error = %err, "discarding entry");
                remove_partial(&path);
                continue;
            }
        }
        names.insert(candidate.file_name.clone());
        let mut image = StagedImage::new(candidate.file_name, path);
        if let Some(attribution) = candidate.attribution {
            image = image.with_attribution(attribution);
        }
        accepted.push(image);
    }

    reconcile(&cfg.cache_dir, &accepted);
    if let Err(err) = write_snapshot(&cfg.snapshot_path, &accepted) {
        warn!(error = %err, "failed to persist provider snapshot");
    }
    Ok(accepted)
}

/// Serve the last accepted list after a manifest failure. Entries whose file vanished are dropped.
pub fn fallback(cfg: &ProviderConfig, provider: &str, cause: &Error) -> Vec<StagedImage> {
    warn!(provider, error = %cause, "manifest unavailable; using last snapshot");
    match read_snapshot(&cfg.snapshot_path) {
        Ok(Some(list)) => {
            let total = list.len();
            let kept: Vec<StagedImage> = list
                .into_iter()
                .filter(|img| img.path.is_file())
                .take(cfg.image_count)
                .collect();
            if kept.len() < total {
                debug!(kept = kept.len(), total, "snapshot entries missing on disk");
            }
            info!(provider, count = kept.len(), "serving snapshot");
            kept
        }
        Ok(None) => {
            warn!(provider, "no snapshot available");
            Vec::new()
        }
        Err(err) => {
            warn!(provider, error = %err, "snapshot unreadable");
            Vec::new()
        }
    }
}

/// Remove every entry of `dir` whose name is not in `keep`.
pub fn reconcile(dir: &Path, keep: &[StagedImage]) {
    let wanted: HashSet<&str> = keep.iter().map(|img| img.name.as_str()).collect();
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => {
            warn!(dir = %dir.display(), error = %err, "cannot list cache directory");
            return;
        }
    };
    for entry in entries.filter_map(|e| e.ok()) {
        let name = entry.file_name();
        if wanted.contains(name.to_string_lossy().as_ref()) {
            continue;
        }
        let path = entry.path();
        info!(path = %path.display(), "removing stale cache entry");
        let removed = if path.is_dir() {
            fs::remove_dir_all(&path)
        } else {
            fs::remove_file(&path)
        };
        if let Err(err) = removed {
            warn!(path = %path.display(), error = %err, "failed to remove stale entry");
        }
    }
}

pub fn read_snapshot(path: &Path) -> Result<Option<Vec<StagedImage>>> {
    let data = match fs::read(path) {
        Ok(value) => value,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(Error::fs(path, err)),
    };
    let list = serde_json::from_slice(&data)
        .map_err(|err| Error::decode(path.display().to_string(), err))?;
    Ok(Some(list))
}

pub fn write_snapshot(path: &Path, list: &[StagedImage]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        ensure_dir(parent)?;
    }
    let json = serde_json::to_vec_pretty(list)
        .map_err(|err| Error::decode(path.display().to_string(), err))?;
    fs::write(path, json).map_err(|err| Error::fs(path, err))
}

pub fn ensure_dir(dir: &Path) -> Result<()> {
    if !dir.is_dir() {
        info!(path = %dir.display(), "creating directory");
        fs::create_dir_all(dir).map_err(|err| Error::fs(dir, err))?;
    }
    Ok(())
}

/// Fetch `url` into `path`, then fill it to the target resolution.
pub async fn download(
    client: &Client,
    url: &str,
    path: &Path,
    width: u32,
    height: u32,
) -> Result<()> {
    let bytes = http::get_bytes(client, url).await?;
    let path: PathBuf = path.to_path_buf();
    tokio::task::spawn_blocking(move || -> Result<()> {
        fs::write(&path, &bytes).map_err(|err| Error::fs(&path, err))?;
        resize::fill_file_in_place(&path, width, height)
    })
    .await
    .map_err(|err| Error::Render(format!("resize task failed: {err}")))?
}

fn remove_partial(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => debug!(path = %path.display(), "removed partial file"),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
        Err(err) => warn!(path = %path.display(), error = %err, "failed to remove partial file"),
    }
}
