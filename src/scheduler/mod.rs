//! Daily collection trigger.
//!
//! Sleeps until the configured wall-clock time, fires a run through the
//! shared guard, repeats. A run that is already in progress (e.g. manually
//! triggered) makes the scheduled firing a skip, not an error.

use crate::collectors::CollectionSession;
use crate::config::Config;
use crate::run_guard::RunGuard;
use crate::store::AdvertisementStore;
use anyhow::{Context, Result};
use chrono::{DateTime, Duration as ChronoDuration, Local, NaiveTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

pub async fn run_daily(
    config: Arc<Config>,
    store: AdvertisementStore,
    guard: Arc<RunGuard>,
) -> Result<()> {
    let daily_at = NaiveTime::parse_from_str(&config.schedule.daily_at, "%H:%M")
        .with_context(|| format!("Invalid schedule time {:?}", config.schedule.daily_at))?;

    if needs_catchup(&config, &store).await {
        info!(
            hours = config.schedule.startup_catchup_hours,
            "Store is stale, running catch-up collection"
        );
        trigger(&config, &store, &guard).await;
    }

    loop {
        let next = next_occurrence(Local::now(), daily_at);
        guard.set_next_run(next.with_timezone(&Utc));
        info!(next = %next, "Next scheduled collection");

        let wait = (next - Local::now())
            .to_std()
            .unwrap_or(Duration::from_secs(0));
        tokio::time::sleep(wait).await;
        trigger(&config, &store, &guard).await;
    }
}

/// First time `at` comes around after `now`, in local time.
fn next_occurrence(now: DateTime<Local>, at: NaiveTime) -> DateTime<Local> {
    let mut date = now.date_naive();
    if now.time() >= at {
        date = date.succ_opt().unwrap_or(date);
    }
    date.and_time(at)
        .and_local_timezone(Local)
        .earliest()
        .unwrap_or(now + ChronoDuration::hours(24))
}

/// Whether the most recent update is older than the catch-up threshold.
async fn needs_catchup(config: &Config, store: &AdvertisementStore) -> bool {
    let years = config.search.inclusion_years();
    match store.statistics(&years, config.search.min_price).await {
        Ok(stats) => match stats.last_update {
            Some(last) => {
                Utc::now() - last > ChronoDuration::hours(config.schedule.startup_catchup_hours)
            }
            None => true,
        },
        Err(e) => {
            error!(error = %e, "Failed to read store statistics, assuming stale");
            true
        }
    }
}

async fn trigger(config: &Arc<Config>, store: &AdvertisementStore, guard: &Arc<RunGuard>) {
    let Some(_token) = RunGuard::try_start(guard) else {
        info!("Collection already running, skipping scheduled run");
        return;
    };

    match CollectionSession::new(config, store.clone()) {
        Ok(session) => {
            let report = session.run(None).await;
            guard.record_result(&format!("success: {} saved", report.saved));
        }
        Err(e) => {
            error!(error = %e, "Failed to start collection session");
            guard.record_result(&format!("error: {e}"));
        }
    }
}
