use std::sync::{Arc, Mutex};
use std::time::Duration;

use bayline_core::config::TrackerConfig;
use bayline_core::{Arming, Clock, IdentityProvider, SessionTracker, TrackerEvent};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;

use crate::bays::BayFeed;

// ─── Shared ───────────────────────────────────────────────────────────────

/// State reachable from both the service handle and its background tasks.
struct Shared {
    tracker: Mutex<SessionTracker>,
    arming: watch::Sender<Arming>,
}

impl Shared {
    /// Run `f` against the tracker, then re-arm the scheduler if the
    /// required timer changed. The lock is released before returning.
    fn update<R>(&self, f: impl FnOnce(&mut SessionTracker) -> R) -> R {
        let mut tracker = self.tracker.lock().unwrap_or_else(|e| e.into_inner());
        let out = f(&mut tracker);
        let next = tracker.arming();
        drop(tracker);

        self.arming.send_if_modified(|current| {
            if *current == next {
                return false;
            }
            tracing::debug!("scheduler re-armed: {current:?} -> {next:?}");
            *current = next;
            true
        });
        out
    }

    fn read<R>(&self, f: impl FnOnce(&SessionTracker) -> R) -> R {
        let tracker = self.tracker.lock().unwrap_or_else(|e| e.into_inner());
        f(&tracker)
    }
}

// ─── TrackerService ───────────────────────────────────────────────────────

/// Owns a [`SessionTracker`] and drives it from the Tokio runtime.
///
/// Two background tasks are spawned: the tick scheduler, which runs the
/// promotion or expiry check according to the tracker's [`Arming`], and the
/// bay-feed watcher, which cross-checks every published bay list. Both are
/// aborted by [`TrackerService::shutdown`] or on drop.
///
/// Tracker events are re-published on a `broadcast` channel; call
/// [`TrackerService::subscribe`] for a receiver.
pub struct TrackerService {
    shared: Arc<Shared>,
    events: broadcast::Sender<TrackerEvent>,
    bays: BayFeed,
    config: TrackerConfig,
    tasks: Vec<JoinHandle<()>>,
}

impl TrackerService {
    /// Build the tracker and spawn its tasks. Must be called inside a Tokio
    /// runtime.
    pub fn spawn(
        clock: Arc<dyn Clock>,
        identity: Arc<dyn IdentityProvider>,
        config: TrackerConfig,
        bays: BayFeed,
    ) -> Self {
        let (events, _) = broadcast::channel(64);

        let mut tracker = SessionTracker::new(clock, identity, config.clone());
        let tx = events.clone();
        tracker.subscribe(move |event| {
            // No receivers is fine; the UI may not be connected yet.
            let _ = tx.send(event.clone());
        });

        let (arming, arming_rx) = watch::channel(tracker.arming());
        let shared = Arc::new(Shared {
            tracker: Mutex::new(tracker),
            arming,
        });

        let scheduler = tokio::spawn(run_scheduler(
            shared.clone(),
            arming_rx,
            config.promotion_interval(),
            config.expiry_interval(),
        ));
        let watcher = tokio::spawn(watch_bays(shared.clone(), bays.subscribe()));

        tracing::info!(
            "session tracker started (promotion every {}s, expiry every {}s)",
            config.promotion_interval_secs,
            config.expiry_interval_secs
        );

        Self {
            shared,
            events,
            bays,
            config,
            tasks: vec![scheduler, watcher],
        }
    }

    /// Mutate the tracker. Do not block inside `f`.
    pub fn update<R>(&self, f: impl FnOnce(&mut SessionTracker) -> R) -> R {
        self.shared.update(f)
    }

    pub fn read<R>(&self, f: impl FnOnce(&SessionTracker) -> R) -> R {
        self.shared.read(f)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TrackerEvent> {
        self.events.subscribe()
    }

    pub fn bays(&self) -> &BayFeed {
        &self.bays
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn arming(&self) -> Arming {
        *self.shared.arming.borrow()
    }

    /// Stop the scheduler and the bay watcher. The tracker stays readable and
    /// writable, but no further ticks fire.
    pub fn shutdown(&self) {
        for task in &self.tasks {
            task.abort();
        }
        tracing::info!("session tracker stopped");
    }
}

impl Drop for TrackerService {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

// ─── Background tasks ─────────────────────────────────────────────────────

/// Fire the armed tick every `period`, restarting the wait whenever the
/// arming changes. Idle means no timer at all.
async fn run_scheduler(
    shared: Arc<Shared>,
    mut arming_rx: watch::Receiver<Arming>,
    promotion: Duration,
    expiry: Duration,
) {
    loop {
        let arming = *arming_rx.borrow_and_update();
        let period = match arming {
            Arming::Idle => {
                if arming_rx.changed().await.is_err() {
                    return;
                }
                continue;
            }
            Arming::Promotion => promotion,
            Arming::Expiry => expiry,
        };

        tokio::select! {
            changed = arming_rx.changed() => {
                if changed.is_err() {
                    return;
                }
            }
            _ = tokio::time::sleep(period) => {
                shared.update(|tracker| match arming {
                    Arming::Promotion => tracker.promotion_tick(),
                    Arming::Expiry => tracker.expiry_tick(),
                    Arming::Idle => false,
                });
            }
        }
    }
}

async fn watch_bays(shared: Arc<Shared>, mut bays_rx: watch::Receiver<Vec<bayline_core::Bay>>) {
    loop {
        let bays = bays_rx.borrow_and_update().clone();
        shared.update(|tracker| tracker.on_bays_updated(&bays));
        if bays_rx.changed().await.is_err() {
            return;
        }
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────
