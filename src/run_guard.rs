//! Single-flight guard for collection runs.
//!
//! The scheduler and the manual API trigger share one guard; whoever wins the
//! idle→running transition owns the run, everyone else gets an "already
//! running" no-op. The token releases the guard on drop, so a panicking run
//! cannot wedge the flag.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

#[derive(Default)]
pub struct RunGuard {
    running: AtomicBool,
    last_run: RwLock<Option<DateTime<Utc>>>,
    last_result: RwLock<Option<String>>,
    next_run: RwLock<Option<DateTime<Utc>>>,
}

/// Snapshot of the guard, served by the scheduler-status endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct RunStatus {
    pub is_running: bool,
    pub last_run: Option<DateTime<Utc>>,
    pub last_result: Option<String>,
    pub next_run: Option<DateTime<Utc>>,
}

impl RunGuard {
    /// Attempt the idle→running transition. `None` means a run is already in
    /// progress and the caller should skip, not fail.
    pub fn try_start(guard: &Arc<Self>) -> Option<RunToken> {
        guard
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()?;
        if let Ok(mut last) = guard.last_run.write() {
            *last = Some(Utc::now());
        }
        Some(RunToken {
            guard: Arc::clone(guard),
        })
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub fn record_result(&self, result: &str) {
        if let Ok(mut slot) = self.last_result.write() {
            *slot = Some(result.to_string());
        }
    }

    pub fn set_next_run(&self, at: DateTime<Utc>) {
        if let Ok(mut slot) = self.next_run.write() {
            *slot = Some(at);
        }
    }

    pub fn status(&self) -> RunStatus {
        RunStatus {
            is_running: self.is_running(),
            last_run: self.last_run.read().ok().and_then(|v| *v),
            last_result: self.last_result.read().ok().and_then(|v| v.clone()),
            next_run: self.next_run.read().ok().and_then(|v| *v),
        }
    }
}

/// Proof of run ownership; dropping it returns the guard to idle.
pub struct RunToken {
    guard: Arc<RunGuard>,
}

impl Drop for RunToken {
    fn drop(&mut self) {
        self.guard.running.store(false, Ordering::Release);
    }
}
