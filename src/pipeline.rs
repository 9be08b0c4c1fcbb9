use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Local};
use tokio_util::task::TaskTracker;
use tracing::{error, info, instrument};

use crate::compose::{GlyphFace, IconSet, OverlayCompositor, Typeface};
use crate::config::Configuration;
use crate::error::{Error, Result};
use crate::http;
use crate::overlay::{OverlayData, OverlayFetcher};
use crate::platform::connectivity::{Reachability, TcpProbe, wait_for_network};
use crate::platform::usb_gadget::UsbGadget;
use crate::providers;
use crate::publish;

/// Result of a `run()` call that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// The publish folder now holds `published` images.
    Completed { published: usize },
    /// Another run was in progress; nothing was done.
    Skipped,
}

/// Refreshes the USB share: waits for the network, fetches photos and overlay data,
/// renders composites, publishes them and re-presents the gadget to the frame.
pub struct DisplayPipeline {
    cfg: Configuration,
    running: AtomicBool,
    last_error: Mutex<Option<String>>,
    last_run: Mutex<Option<DateTime<Local>>>,
    probe: Arc<dyn Reachability>,
    typeface: Mutex<Option<Arc<dyn Typeface>>>,
    gadget: UsbGadget,
    refreshes: TaskTracker,
}

struct RunningGuard<'a>(&'a AtomicBool);

impl<'a> RunningGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl DisplayPipeline {
    pub fn new(cfg: Configuration) -> Self {
        let probe = Arc::new(TcpProbe::from_config(&cfg.connectivity));
        let gadget = UsbGadget::from_config(&cfg.usb_gadget);
        Self {
            cfg,
            running: AtomicBool::new(false),
            last_error: Mutex::new(None),
            last_run: Mutex::new(None),
            probe,
            typeface: Mutex::new(None),
            gadget,
            refreshes: TaskTracker::new(),
        }
    }

    /// Replace the connectivity probe.
    pub fn with_probe(mut self, probe: Arc<dyn Reachability>) -> Self {
        self.probe = probe;
        self
    }

    /// Use `face` for overlay text instead of loading the configured font.
    pub fn with_typeface(self, face: Arc<dyn Typeface>) -> Self {
        *self.typeface.lock().unwrap_or_else(PoisonError::into_inner) = Some(face);
        self
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Message of the most recent aborted run; cleared by a completed run.
    pub fn last_error(&self) -> Option<String> {
        self.last_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// When the most recent run completed.
    pub fn last_run(&self) -> Option<DateTime<Local>> {
        *self.last_run.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run the whole refresh once. A call made while another run is active returns `Skipped`.
    pub async fn run(&self) -> Result<RunOutcome> {
        let Some(_guard) = RunningGuard::acquire(&self.running) else {
            info!("refresh already running; ignoring trigger");
            return Ok(RunOutcome::Skipped);
        };

        match self.refresh_display().await {
            Ok(published) => {
                *self.last_error.lock().unwrap_or_else(PoisonError::into_inner) = None;
                *self.last_run.lock().unwrap_or_else(PoisonError::into_inner) = Some(Local::now());
                info!(published, "display refresh complete");
                Ok(RunOutcome::Completed { published })
            }
            Err(err) => {
                error!(error = %err, "display refresh aborted");
                *self.last_error.lock().unwrap_or_else(PoisonError::into_inner) =
                    Some(err.to_string());
                Err(err)
            }
        }
    }

    /// Ask the frame to reload the share. Runs in the background; failures are only logged.
    pub fn refresh_hardware(&self) {
        self.gadget.spawn_refresh(&self.refreshes);
    }

    /// Wait for every hardware refresh started so far. Call before the runtime shuts down.
    pub async fn wait_for_refresh(&self) {
        self.refreshes.close();
        self.refreshes.wait().await;
        self.refreshes.reopen();
    }

    #[instrument(skip(self), fields(provider = ?self.cfg.provider))]
    async fn refresh_display(&self) -> Result<usize> {
        let cfg = &self.cfg;
        wait_for_network(
            self.probe.as_ref(),
            cfg.connectivity.attempts,
            cfg.connectivity.interval,
        )
        .await?;

        let client = http::build_client(cfg.http_timeout)?;

        let provider = providers::select(cfg, client.clone());
        let images = provider.get_images().await?;
        if images.is_empty() {
            return Err(Error::NoImages {
                provider: cfg.provider.display_name().to_string(),
            });
        }
        info!(count = images.len(), "images staged");

        let fetcher = OverlayFetcher::new(client, cfg.state_dir.clone());
        let data = OverlayData::acquire(&fetcher, cfg).await?;

        let face = if data.is_empty() {
            None
        } else {
            Some(self.typeface()?)
        };
        let compositor = OverlayCompositor::new(
            cfg.render_path.clone(),
            (cfg.resolution.width, cfg.resolution.height),
            IconSet::new(cfg.assets.icon_dir.clone()),
            face,
        );
        let now = Local::now().fixed_offset();
        let composites = tokio::task::spawn_blocking(move || {
            compositor.compose_all(&images, &data, now)
        })
        .await
        .map_err(|err| Error::Render(format!("compose task failed: {err}")))??;
        if composites.is_empty() {
            return Err(Error::Render("no composites were produced".into()));
        }

        let publish_dir = cfg.publish.path.clone();
        let reserved = cfg.publish.reserved_entries.clone();
        let published = tokio::task::spawn_blocking(move || {
            publish::publish(&publish_dir, &reserved, &composites)
        })
        .await
        .map_err(|err| Error::Render(format!("publish task failed: {err}")))??;
        if published.is_empty() {
            return Err(Error::Render("no composites were published".into()));
        }

        self.refresh_hardware();
        Ok(published.len())
    }

    fn typeface(&self) -> Result<Arc<dyn Typeface>> {
        let mut slot = self.typeface.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(face) = slot.as_ref() {
            return Ok(Arc::clone(face));
        }
        let face: Arc<dyn Typeface> = Arc::new(GlyphFace::load(self.cfg.assets.font_path.as_deref())?);
        *slot = Some(Arc::clone(&face));
        Ok(face)
    }
}
