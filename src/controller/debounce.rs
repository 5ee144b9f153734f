//! Search query debouncer
//!
//! Every push cancels the pending timer and starts a new one. When a timer
//! fires, the query is published on a watch channel unless it equals the last
//! published value. At most one timer is pending at any time.
//!
//! Timers run on the runtime current at the push, or else on the runtime the
//! debouncer was created in. With neither, the query settles immediately.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

pub struct SearchDebouncer {
    delay: Duration,
    runtime: Option<Handle>,
    pending: Mutex<Option<JoinHandle<()>>>,
    settled: Arc<watch::Sender<String>>,
    emissions: Arc<AtomicUsize>,
    closed: AtomicBool,
}

impl SearchDebouncer {
    pub fn new(delay: Duration) -> Self {
        let (settled, _) = watch::channel(String::new());
        Self {
            delay,
            runtime: Handle::try_current().ok(),
            pending: Mutex::new(None),
            settled: Arc::new(settled),
            emissions: Arc::new(AtomicUsize::new(0)),
            closed: AtomicBool::new(false),
        }
    }

    /// Schedule `query` to settle after the quiet period. No-op once closed.
    pub fn push(&self, query: &str) {
        if self.is_closed() {
            return;
        }
        // whitespace-only queries settle as the empty query
        let query = query.trim().to_string();

        let mut pending = self.pending.lock();
        if let Some(handle) = pending.take() {
            handle.abort();
        }
        let Some(runtime) = Handle::try_current().ok().or_else(|| self.runtime.clone()) else {
            warn!("No async runtime for the search debounce timer; settling immediately");
            publish(&self.settled, &self.emissions, &query);
            return;
        };

        let settled = Arc::clone(&self.settled);
        let emissions = Arc::clone(&self.emissions);
        let delay = self.delay;
        *pending = Some(runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            publish(&settled, &emissions, &query);
        }));
    }

    /// Drop the pending timer without publishing
    pub fn cancel(&self) {
        if let Some(handle) = self.pending.lock().take() {
            handle.abort();
        }
    }

    /// Cancel the pending timer and ignore every later push
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.cancel();
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn has_pending(&self) -> bool {
        self.pending
            .lock()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Last published query
    pub fn settled(&self) -> String {
        self.settled.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<String> {
        self.settled.subscribe()
    }

    /// Number of distinct values published so far
    pub fn emissions(&self) -> usize {
        self.emissions.load(Ordering::SeqCst)
    }
}

fn publish(settled: &watch::Sender<String>, emissions: &AtomicUsize, query: &str) {
    let changed = settled.send_if_modified(|current| {
        if current.as_str() == query {
            false
        } else {
            query.clone_into(current);
            true
        }
    });
    if changed {
        emissions.fetch_add(1, Ordering::SeqCst);
        debug!(query = %query, "Search query settled");
    }
}

impl Drop for SearchDebouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}
