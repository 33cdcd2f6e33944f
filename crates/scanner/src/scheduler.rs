use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone)]
pub struct JobSpec {
    pub name: String,
    pub interval: Duration,
    pub tick: mpsc::Sender<()>,
    pub run_immediately: bool,
}

/// One ticking task per job. A tick is skipped, not queued, while the
/// worker is still busy with the previous one. Stops on `cancel` or when the
/// worker drops its receiver.
pub fn start(jobs: Vec<JobSpec>, cancel: &CancellationToken) -> Vec<JoinHandle<()>> {
    jobs.into_iter()
        .map(|job| {
            let cancel = cancel.clone();
            tokio::spawn(async move {
                let start_at = if job.run_immediately {
                    Instant::now()
                } else {
                    Instant::now() + job.interval
                };
                let mut interval = tokio::time::interval_at(start_at, job.interval);
                interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

                loop {
                    tokio::select! {
                        () = cancel.cancelled() => break,
                        _ = interval.tick() => {}
                    }
                    tracing::debug!(job = %job.name, "scheduler tick");
                    match job.tick.try_send(()) {
                        Ok(()) => {}
                        Err(mpsc::error::TrySendError::Full(())) => {
                            tracing::warn!(
                                job = %job.name,
                                "previous run still busy; tick skipped"
                            );
                        }
                        Err(mpsc::error::TrySendError::Closed(())) => break,
                    }
                }
            })
        })
        .collect()
}
