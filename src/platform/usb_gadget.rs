use std::time::Duration;

use anyhow::{Context, Result, anyhow, ensure};
use tokio::process::Command;
use tokio_util::task::TaskTracker;
use tracing::{info, warn};

use crate::config::UsbGadgetConfig;

/// Emulated mass-storage device the frame reads its pictures from.
#[derive(Debug, Clone)]
pub struct UsbGadget {
    detach: Vec<String>,
    attach: Vec<String>,
    settle_delay: Duration,
}

impl UsbGadget {
    pub fn from_config(cfg: &UsbGadgetConfig) -> Self {
        Self {
            detach: cfg.detach_command.clone(),
            attach: cfg.attach_command.clone(),
            settle_delay: cfg.settle_delay,
        }
    }

    /// Detach, wait for the host to notice, then attach again.
    pub async fn refresh(&self) -> Result<()> {
        info!(command = ?self.detach, "detaching mass-storage gadget");
        run_command(&self.detach).await?;
        tokio::time::sleep(self.settle_delay).await;
        info!(command = ?self.attach, "attaching mass-storage gadget");
        run_command(&self.attach).await
    }

    /// Start a refresh on `tracker`. Failures are logged. Returns `false` off Linux.
    ///
    /// Once detach has run, attach must follow, so callers wait on the tracker before the
    /// runtime shuts down.
    pub fn spawn_refresh(&self, tracker: &TaskTracker) -> bool {
        if !cfg!(target_os = "linux") {
            info!("usb gadget refresh is only supported on linux; skipping");
            return false;
        }
        let gadget = self.clone();
        tracker.spawn(async move {
            if let Err(err) = gadget.refresh().await {
                warn!(error = %err, "usb gadget refresh failed");
            }
        });
        true
    }
}

async fn run_command(argv: &[String]) -> Result<()> {
    let (program, args) = argv
        .split_first()
        .ok_or_else(|| anyhow!("gadget command must not be empty"))?;
    let status = Command::new(program)
        .args(args)
        .status()
        .await
        .with_context(|| format!("failed to spawn {program}"))?;
    ensure!(
        status.success(),
        "command exited with status {}: {}",
        status.code().unwrap_or(-1),
        argv.join(" ")
    );
    Ok(())
}
