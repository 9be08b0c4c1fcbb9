//! Binary entrypoint: loads the configuration and drives the refresh pipeline.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{ArgAction, Parser};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

use usb_photo_frame::config::Configuration;
use usb_photo_frame::tasks::scheduler::{self, Trigger};
use usb_photo_frame::{DisplayPipeline, RunOutcome};

#[derive(Debug, Parser)]
#[command(
    name = "usb-photo-frame",
    version,
    about = "Feeds a USB photo frame with photos and overlays"
)]
struct Args {
    /// Path to YAML config
    #[arg(value_name = "CONFIG", default_value = "config.yaml")]
    config: PathBuf,
    /// Perform a single refresh and exit
    #[arg(long)]
    once: bool,
    /// Increase log verbosity (repeatable)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbosity: u8) -> Result<()> {
    let level = match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"))
        .add_directive(
            format!("usb_photo_frame={level}")
                .parse()
                .context("invalid log directive")?,
        );
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let Args {
        config,
        once,
        verbose,
    } = Args::parse();
    init_tracing(verbose)?;

    let cfg = Configuration::from_yaml_file(&config)
        .with_context(|| format!("failed to load configuration from {}", config.display()))?
        .validated()
        .context("invalid configuration values")?;
    tracing::debug!("Loaded configuration from {}:\n{:#?}", config.display(), cfg);

    let schedule = cfg.schedule.clone();
    let pipeline = Arc::new(DisplayPipeline::new(cfg));

    if once {
        let outcome = pipeline.run().await;
        pipeline.wait_for_refresh().await;
        return match outcome.context("refresh failed")? {
            RunOutcome::Completed { published } => {
                tracing::info!(published, "single refresh complete");
                Ok(())
            }
            RunOutcome::Skipped => bail!("refresh skipped"),
        };
    }

    let cancel = CancellationToken::new();
    let (trigger_tx, trigger_rx) = mpsc::channel::<Trigger>(8);

    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if let Err(err) = tokio::signal::ctrl_c().await {
                tracing::warn!("ctrl-c handler failed: {err}");
                return;
            }
            tracing::info!("ctrl-c received; initiating shutdown");
            cancel.cancel();
        });
    }

    #[cfg(unix)]
    {
        forward_signal(SignalKind::terminate(), None, trigger_tx.clone(), cancel.clone());
        forward_signal(
            SignalKind::user_defined1(),
            Some(Trigger::Run),
            trigger_tx.clone(),
            cancel.clone(),
        );
        forward_signal(
            SignalKind::user_defined2(),
            Some(Trigger::RefreshHardware),
            trigger_tx.clone(),
            cancel.clone(),
        );
    }
    drop(trigger_tx);

    let result = scheduler::run(Arc::clone(&pipeline), schedule, trigger_rx, cancel).await;
    pipeline.wait_for_refresh().await;
    result.context("scheduler failed")
}

/// Forward `kind` as `trigger`, or cancel everything when `trigger` is `None`.
#[cfg(unix)]
fn forward_signal(
    kind: SignalKind,
    trigger: Option<Trigger>,
    tx: mpsc::Sender<Trigger>,
    cancel: CancellationToken,
) {
    tokio::spawn(async move {
        let mut stream = match signal(kind) {
            Ok(stream) => stream,
            Err(err) => {
                tracing::warn!("failed to register {kind:?} handler: {err}");
                return;
            }
        };
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                received = stream.recv() => {
                    if received.is_none() {
                        break;
                    }
                    let Some(trigger) = trigger else {
                        tracing::info!("termination signal received; initiating shutdown");
                        cancel.cancel();
                        break;
                    };
                    tracing::info!(?trigger, "signal received");
                    if let Err(err) = tx.send(trigger).await {
                        tracing::warn!("failed to forward trigger: {err}");
                        break;
                    }
                }
            }
        }
    });
}
