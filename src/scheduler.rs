//! Background job scheduler.
//!
//! Owns one tokio task per maintenance job: fixed-interval loops for the
//! time-progress refresh, warning detection, and statistics rebuild, plus a
//! daily wall-clock loop for periodic recycling. A watch channel signals
//! shutdown; [`SchedulerHandle::stop`] flips it and joins every loop, and
//! dropping the handle stops the loops as the sender goes away.

use crate::config::JobsConfig;
use crate::db::Database;
use crate::error::FlowResult;
use crate::maintenance::{self, RunSummary};
use crate::notify::Notifier;
use chrono::Duration as ChronoDuration;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Duration, interval, sleep};
use tracing::{debug, info, warn};

/// Background job driver.
pub struct Scheduler {
    db: Database,
    notifier: Arc<dyn Notifier>,
    jobs: JobsConfig,
}

/// A started scheduler. Stop it to join the job loops cleanly.
pub struct SchedulerHandle {
    shutdown: watch::Sender<bool>,
    handles: Vec<JoinHandle<()>>,
}

impl Scheduler {
    pub fn new(db: Database, notifier: Arc<dyn Notifier>, jobs: JobsConfig) -> Self {
        Self { db, notifier, jobs }
    }

    /// Spawn all four job loops.
    pub fn start(self) -> SchedulerHandle {
        let (shutdown, _) = watch::channel(false);
        let mut handles = Vec::new();

        // tokio intervals panic on a zero period; clamp configured cadences
        handles.push(spawn_interval_job(
            "time-progress-refresh",
            Duration::from_secs(self.jobs.refresh_minutes.max(1) * 60),
            false,
            shutdown.subscribe(),
            {
                let db = self.db.clone();
                move || maintenance::refresh_time_progress(&db)
            },
        ));

        handles.push(spawn_interval_job(
            "warning-detection",
            Duration::from_secs(self.jobs.warning_minutes.max(1) * 60),
            false,
            shutdown.subscribe(),
            {
                let db = self.db.clone();
                let notifier = self.notifier.clone();
                move || maintenance::detect_warnings(&db, notifier.as_ref())
            },
        ));

        handles.push(spawn_daily_job(
            "periodic-recycle",
            self.jobs.recycle_hour,
            self.jobs.recycle_minute,
            shutdown.subscribe(),
            {
                let db = self.db.clone();
                let notifier = self.notifier.clone();
                move || maintenance::recycle_periodic_tasks(&db, notifier.as_ref())
            },
        ));

        // Startup already ran a full rebuild, so this loop skips its
        // immediate first tick.
        handles.push(spawn_interval_job(
            "statistics-rebuild",
            Duration::from_secs(self.jobs.rebuild_minutes.max(1) * 60),
            true,
            shutdown.subscribe(),
            {
                let db = self.db.clone();
                move || maintenance::rebuild_statistics(&db)
            },
        ));

        info!(
            refresh_minutes = self.jobs.refresh_minutes,
            warning_minutes = self.jobs.warning_minutes,
            recycle_hour = self.jobs.recycle_hour,
            recycle_minute = self.jobs.recycle_minute,
            rebuild_minutes = self.jobs.rebuild_minutes,
            "background jobs started"
        );

        SchedulerHandle { shutdown, handles }
    }
}

impl SchedulerHandle {
    /// Signal shutdown and wait for every job loop to exit.
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        for handle in self.handles {
            let _ = handle.await;
        }
        info!("scheduler stopped");
    }
}

fn spawn_interval_job<F>(
    name: &'static str,
    period: Duration,
    skip_first: bool,
    mut shutdown: watch::Receiver<bool>,
    job: F,
) -> JoinHandle<()>
where
    F: Fn() -> FlowResult<RunSummary> + Send + 'static,
{
    tokio::spawn(async move {
        let mut ticker = interval(period);
        if skip_first {
            ticker.tick().await; // consume the immediate initial tick
        }
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = job() {
                        warn!(job = name, err = %e, "maintenance job failed");
                    }
                }
                _ = shutdown.changed() => {
                    debug!(job = name, "job loop stopped");
                    break;
                }
            }
        }
    })
}

fn spawn_daily_job<F>(
    name: &'static str,
    hour: u32,
    minute: u32,
    mut shutdown: watch::Receiver<bool>,
    job: F,
) -> JoinHandle<()>
where
    F: Fn() -> FlowResult<RunSummary> + Send + 'static,
{
    tokio::spawn(async move {
        loop {
            let wait = until_next_daily(hour, minute);
            debug!(job = name, in_secs = wait.as_secs(), "next run scheduled");
            tokio::select! {
                _ = sleep(wait) => {
                    if let Err(e) = job() {
                        warn!(job = name, err = %e, "maintenance job failed");
                    }
                }
                _ = shutdown.changed() => {
                    debug!(job = name, "job loop stopped");
                    break;
                }
            }
        }
    })
}

/// Time until the next wall-clock occurrence of `hour:minute` UTC.
/// Out-of-range schedule values clamp instead of erroring.
fn until_next_daily(hour: u32, minute: u32) -> Duration {
    let now = chrono::Utc::now().naive_utc();
    let (hour, minute) = (hour.min(23), minute.min(59));
    let Some(mut target) = now.date().and_hms_opt(hour, minute, 0) else {
        return Duration::from_secs(24 * 3600);
    };
    if target <= now {
        target += ChronoDuration::days(1);
    }
    (target - now).to_std().unwrap_or(Duration::from_secs(60))
}
