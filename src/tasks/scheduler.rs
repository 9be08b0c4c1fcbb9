use std::sync::Arc;

use anyhow::Result;
use tokio::sync::mpsc::Receiver;
use tokio::task::JoinSet;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::config::ScheduleConfig;
use crate::pipeline::{DisplayPipeline, RunOutcome};

/// On-demand requests forwarded to the scheduler (e.g. from signal handlers).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Run,
    RefreshHardware,
}

/// Drive `pipeline` on the configured interval and on incoming triggers until cancelled.
///
/// Every run is spawned on its own task so that overlapping triggers hit the pipeline's
/// running guard instead of queueing.
#[instrument(skip_all, fields(interval = ?schedule.interval))]
pub async fn run(
    pipeline: Arc<DisplayPipeline>,
    schedule: ScheduleConfig,
    mut triggers: Receiver<Trigger>,
    cancel: CancellationToken,
) -> Result<()> {
    let mut ticker = tokio::time::interval(schedule.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    if !schedule.run_on_start {
        // The first tick completes immediately.
        ticker.tick().await;
    }

    let mut runs = JoinSet::new();
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {
                debug!("scheduled refresh");
                spawn_run(&mut runs, &pipeline);
            }
            Some(trigger) = triggers.recv() => match trigger {
                Trigger::Run => {
                    info!("refresh requested");
                    spawn_run(&mut runs, &pipeline);
                }
                Trigger::RefreshHardware => {
                    info!("hardware refresh requested");
                    pipeline.refresh_hardware();
                }
            },
            Some(joined) = runs.join_next(), if !runs.is_empty() => {
                if let Err(err) = joined {
                    warn!(error = %err, "refresh task panicked");
                }
            }
        }
    }

    info!(in_flight = runs.len(), "scheduler stopping");
    runs.abort_all();
    while runs.join_next().await.is_some() {}
    Ok(())
}

fn spawn_run(runs: &mut JoinSet<()>, pipeline: &Arc<DisplayPipeline>) {
    let pipeline = Arc::clone(pipeline);
    runs.spawn(async move {
        match pipeline.run().await {
            Ok(RunOutcome::Completed { published }) => debug!(published, "refresh finished"),
            Ok(RunOutcome::Skipped) => debug!("refresh skipped"),
            // Already logged and recorded by the pipeline.
            Err(_) => {}
        }
    });
}
