//! # aegis-watcher
//!
//! Debounced filesystem watcher that drives policy hot-reload (Module C).
//!
//! A single-slot debounce, not a queue of events: every filesystem event
//! bumps a generation counter and wakes a reload task; the task waits out a
//! quiet period and only reloads if no further event arrived during that
//! window. Reloads are serialized — at most one runs at a time, and events
//! that land mid-reload schedule exactly one follow-up (spec §4.3, §9).

pub mod error;

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::Notify;

use aegis_policy::PolicyIndex;
pub use error::WatcherError;

/// Observes reload outcomes — the Watcher's side of the `Telemetry`
/// boundary (spec §4.3: "an error is surfaced to telemetry").
pub trait ReloadObserver: Send + Sync {
    fn reload_succeeded(&self, fingerprint: &str, warnings: usize);
    fn reload_failed(&self, error: &str);
}

/// A `ReloadObserver` that only logs via `tracing` — the default when no
/// richer telemetry sink is wired up.
pub struct TracingReloadObserver;

impl ReloadObserver for TracingReloadObserver {
    fn reload_succeeded(&self, fingerprint: &str, warnings: usize) {
        tracing::info!(fingerprint, warnings, "policy reload succeeded");
    }

    fn reload_failed(&self, error: &str) {
        tracing::error!(error, "policy reload failed, retaining previous snapshot");
    }
}

const DEFAULT_QUIET_PERIOD_MS: u64 = 300;

/// Handle returned by `spawn`. Dropping it stops the watcher (the
/// underlying `notify` watcher and the reload task are both tied to its
/// lifetime).
pub struct PolicyWatcher {
    _fs_watcher: RecommendedWatcher,
    _reload_task: tokio::task::JoinHandle<()>,
}

/// Start watching `dir` for changes and hot-reloading `index` on a debounced
/// quiet period (default 300ms, spec §4.3).
pub fn spawn(
    dir: PathBuf,
    index: Arc<PolicyIndex>,
    observer: Arc<dyn ReloadObserver>,
) -> Result<PolicyWatcher, WatcherError> {
    spawn_with_quiet_period(dir, index, observer, Duration::from_millis(DEFAULT_QUIET_PERIOD_MS))
}

pub fn spawn_with_quiet_period(
    dir: PathBuf,
    index: Arc<PolicyIndex>,
    observer: Arc<dyn ReloadObserver>,
    quiet_period: Duration,
) -> Result<PolicyWatcher, WatcherError> {
    let generation = Arc::new(AtomicU64::new(0));
    let notify_handle = Arc::new(Notify::new());

    let gen_for_events = Arc::clone(&generation);
    let notify_for_events = Arc::clone(&notify_handle);
    let fs_watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
        if res.is_ok() {
            gen_for_events.fetch_add(1, Ordering::SeqCst);
            notify_for_events.notify_one();
        }
    })
    .map_err(|source| WatcherError::StartFailed {
        path: dir.display().to_string(),
        source,
    })?;

    let mut fs_watcher = fs_watcher;
    fs_watcher
        .watch(&dir, RecursiveMode::Recursive)
        .map_err(|source| WatcherError::StartFailed {
            path: dir.display().to_string(),
            source,
        })?;

    let reload_task = tokio::spawn(reload_loop(dir, index, observer, generation, notify_handle, quiet_period));

    Ok(PolicyWatcher {
        _fs_watcher: fs_watcher,
        _reload_task: reload_task,
    })
}

async fn reload_loop(
    dir: PathBuf,
    index: Arc<PolicyIndex>,
    observer: Arc<dyn ReloadObserver>,
    generation: Arc<AtomicU64>,
    notify_handle: Arc<Notify>,
    quiet_period: Duration,
) {
    loop {
        notify_handle.notified().await;
        let seen = generation.load(Ordering::SeqCst);
        tokio::time::sleep(quiet_period).await;
        if generation.load(Ordering::SeqCst) != seen {
            // Another event arrived during the quiet window — don't reload
            // yet, let the next loop iteration wait out a fresh window.
            continue;
        }
        reload_once(&dir, &index, observer.as_ref());
    }
}

/// Perform one reload: load + merge the directory and, on success, swap it
/// in. On failure, the previous snapshot is retained (spec §4.3, §7).
pub fn reload_once(dir: &Path, index: &PolicyIndex, observer: &dyn ReloadObserver) {
    match aegis_policy::load_and_merge(dir) {
        Ok((set, warnings)) => {
            let fingerprint = set.version_fingerprint.clone();
            index.swap(set);
            observer.reload_succeeded(&fingerprint, warnings.len());
        }
        Err(e) => {
            observer.reload_failed(&e.to_string());
        }
    }
}
