use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::watch;

use crate::error::FetchError;
use crate::source::TrackerSource;
use crate::stats::{Stats, StatsSnapshot};
use crate::types::OrderSnapshot;

pub type UpdateCallback = Arc<dyn Fn(&OrderSnapshot) + Send + Sync>;
pub type ErrorCallback = Arc<dyn Fn(&FetchError) + Send + Sync>;

/// Hooks and interval are re-read by the scheduler each cycle, so callers can
/// swap them between cycles without touching one already in flight.
struct Hooks {
    interval: Duration,
    on_update: UpdateCallback,
    on_error: Option<ErrorCallback>,
}

struct Shared {
    snapshot: Mutex<Arc<OrderSnapshot>>,
    hooks: Mutex<Hooks>,
    stats: Arc<Stats>,
}

/// Self-rescheduling order tracker.
///
/// One scheduler task per loop owns the timer, so at most one pending cycle
/// exists at any time. Cycles never overlap: the interval is measured from
/// completion of the previous cycle. A failed cycle is a skipped cycle: the
/// last snapshot stays published, the error goes to the error hook (default:
/// a warn log), and the next cycle is still armed. A panicking hook is
/// caught and logged; it never kills the schedule.
pub struct PollingLoop {
    shared: Arc<Shared>,
    stop_tx: watch::Sender<bool>,
    store_id: String,
    order_key: String,
}

impl PollingLoop {
    /// Fetch once inline, then arm the recurring cycle. A failing first fetch
    /// returns the error and arms nothing.
    pub async fn start(
        source: Arc<dyn TrackerSource>,
        store_id: impl Into<String>,
        order_key: impl Into<String>,
        interval: Duration,
        on_update: UpdateCallback,
    ) -> Result<Self, FetchError> {
        let store_id = store_id.into();
        let order_key = order_key.into();

        let first = source.fetch(&store_id, &order_key).await?;
        let first = Arc::new(first);

        let stats = Stats::new();
        stats.inc_cycle();
        stats.mark_success(now_ms());
        on_update(&first);

        let shared = Arc::new(Shared {
            snapshot: Mutex::new(first),
            hooks: Mutex::new(Hooks {
                interval,
                on_update,
                on_error: None,
            }),
            stats,
        });

        let (stop_tx, stop_rx) = watch::channel(false);
        tokio::spawn(run_cycles(
            source,
            store_id.clone(),
            order_key.clone(),
            shared.clone(),
            stop_rx,
        ));

        Ok(Self {
            shared,
            stop_tx,
            store_id,
            order_key,
        })
    }

    /// Last successfully fetched snapshot, whole or not at all.
    pub fn current_snapshot(&self) -> Arc<OrderSnapshot> {
        self.shared.snapshot.lock().unwrap().clone()
    }

    /// Cancel the pending cycle. Idempotent; a fetch or callback already in
    /// progress runs to completion, and the last snapshot stays readable.
    pub fn stop(&self) {
        let _ = self.stop_tx.send(true);
    }

    /// Replace the update callback for cycles from the next fire onward.
    pub fn set_callback(&self, on_update: UpdateCallback) {
        self.shared.hooks.lock().unwrap().on_update = on_update;
    }

    /// Replace the skipped-cycle error hook.
    pub fn set_on_error(&self, on_error: ErrorCallback) {
        self.shared.hooks.lock().unwrap().on_error = Some(on_error);
    }

    /// Change the interval used when the *next* cycle is armed. A cycle
    /// already pending keeps the delay it was armed with.
    pub fn set_interval(&self, interval: Duration) {
        self.shared.hooks.lock().unwrap().interval = interval;
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.shared.stats.snapshot()
    }

    pub fn store_id(&self) -> &str {
        &self.store_id
    }

    pub fn order_key(&self) -> &str {
        &self.order_key
    }
}

async fn run_cycles(
    source: Arc<dyn TrackerSource>,
    store_id: String,
    order_key: String,
    shared: Arc<Shared>,
    mut stop_rx: watch::Receiver<bool>,
) {
    loop {
        let interval = shared.hooks.lock().unwrap().interval;

        // The sleep is the only cancellation point: stop() keeps a pending
        // timer from firing but never interrupts a cycle mid-fetch.
        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = stop_rx.changed() => return,
        }
        if *stop_rx.borrow() {
            return;
        }

        shared.stats.inc_cycle();
        // Snapshot the hooks before the fetch: a set_callback() arriving
        // mid-cycle applies from the next cycle.
        let (on_update, on_error) = {
            let hooks = shared.hooks.lock().unwrap();
            (hooks.on_update.clone(), hooks.on_error.clone())
        };

        match source.fetch(&store_id, &order_key).await {
            Ok(snap) => {
                let snap = Arc::new(snap);
                *shared.snapshot.lock().unwrap() = snap.clone();
                shared.stats.mark_success(now_ms());
                // The snapshot is already published; a hook panic must not
                // unwind the scheduler and kill the chain.
                if let Err(panic) = catch_unwind(AssertUnwindSafe(|| on_update(&snap))) {
                    tracing::warn!(
                        store_id = %store_id,
                        order_key = %order_key,
                        panic = %panic_message(&*panic),
                        "update callback panicked; polling continues"
                    );
                }
            }
            Err(err) => {
                shared.stats.inc_failure();
                match on_error {
                    Some(hook) => {
                        if let Err(panic) = catch_unwind(AssertUnwindSafe(|| hook(&err))) {
                            tracing::warn!(
                                store_id = %store_id,
                                order_key = %order_key,
                                panic = %panic_message(&*panic),
                                "error hook panicked; polling continues"
                            );
                        }
                    }
                    None => tracing::warn!(
                        store_id = %store_id,
                        order_key = %order_key,
                        error = %err,
                        "tracker poll failed; cycle skipped"
                    ),
                }
            }
        }
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> &str {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s
    } else {
        "non-string panic payload"
    }
}

fn now_ms() -> u64 {
    chrono::Utc::now().timestamp_millis() as u64
}
