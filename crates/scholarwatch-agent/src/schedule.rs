//! Daily scheduling: run once immediately, then every day at `run_at`.

use std::future::Future;
use std::time::Duration;

use chrono::{Days, NaiveDate, NaiveDateTime, NaiveTime};
use tracing::{error, info};

pub const POLL_INTERVAL: Duration = Duration::from_secs(60);

/// The first `run_at` strictly after `now`.
pub fn next_run_after(now: NaiveDateTime, run_at: NaiveTime) -> NaiveDateTime {
    let today = now.date().and_time(run_at);
    if today > now {
        today
    } else {
        now.date()
            .checked_add_days(Days::new(1))
            .unwrap_or(now.date())
            .and_time(run_at)
    }
}

/// Drive `job` until `shutdown` resolves. Returns the number of runs started.
///
/// A failed run is logged and the loop keeps going. A run in progress when
/// `shutdown` resolves is completed first. `clock` supplies local wall-clock
/// time and is read after every poll.
pub async fn run_daily<C, J, Fut, E, S>(
    run_at: NaiveTime,
    poll: Duration,
    mut clock: C,
    mut job: J,
    shutdown: S,
) -> usize
where
    C: FnMut() -> NaiveDateTime,
    J: FnMut(NaiveDate) -> Fut,
    Fut: Future<Output = Result<(), E>>,
    E: std::fmt::Display,
    S: Future<Output = ()>,
{
    tokio::pin!(shutdown);

    let started = clock();
    let mut next = next_run_after(started, run_at);
    let mut runs = 0usize;

    let mut due = Some(started.date());
    loop {
        if let Some(date) = due.take() {
            runs += 1;
            // A run that has started is finished before shutdown is honoured.
            let run = job(date);
            tokio::pin!(run);
            let mut stopping = false;
            let result = loop {
                tokio::select! {
                    result = &mut run => break result,
                    _ = &mut shutdown, if !stopping => {
                        info!("Shutdown requested; finishing the current run");
                        stopping = true;
                    }
                }
            };
            if let Err(e) = result {
                error!(%date, error = %e, "Scheduled run failed");
            }
            if stopping {
                break;
            }
            info!(next = %next, "Next digest run scheduled");
        }

        tokio::select! {
            _ = &mut shutdown => break,
            _ = tokio::time::sleep(poll) => {}
        }

        let now = clock();
        if now >= next {
            due = Some(now.date());
            next = next_run_after(now, run_at);
        }
    }

    info!(runs, "Scheduler stopped");
    runs
}
