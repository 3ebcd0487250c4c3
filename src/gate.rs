/*!
 * Concurrency gate for outbound translation requests.
 *
 * Bounds the number of in-flight requests with a semaphore and enforces a
 * minimum spacing between dispatches across all holders. Constructed once and
 * injected into every pipeline that shares the endpoint; there is no global
 * instance.
 */

use std::sync::Arc;
use std::time::Duration;

use log::debug;
use tokio::sync::{Mutex, OwnedSemaphorePermit, Semaphore};
use tokio::time::Instant;

/// Shared gate limiting request concurrency and dispatch rate.
#[derive(Debug)]
pub struct RequestGate {
    /// Pool of in-flight permits
    semaphore: Arc<Semaphore>,
    /// Timestamp of the last dispatch by any holder
    last_dispatch: Mutex<Option<Instant>>,
    /// Minimum spacing between any two dispatches
    min_interval: Duration,
}

/// RAII guard for one in-flight request.
///
/// Dropping the permit releases the gate slot on every exit path, including
/// cancellation while still waiting for the dispatch interval.
#[derive(Debug)]
pub struct RequestPermit {
    _permit: OwnedSemaphorePermit,
}

impl RequestGate {
    /// Create a gate allowing `max_in_flight` concurrent requests spaced at
    /// least `min_interval` apart.
    pub fn new(max_in_flight: usize, min_interval: Duration) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(max_in_flight.max(1))),
            last_dispatch: Mutex::new(None),
            min_interval,
        }
    }

    /// Acquire a permit, suspending until one is free and the minimum
    /// dispatch interval has elapsed.
    ///
    /// Acquisition never fails; it only ever waits. The shared last-dispatch
    /// timestamp is advanced before this returns, so two concurrent acquirers
    /// can never dispatch closer together than the configured interval. No
    /// FIFO ordering is guaranteed among waiters.
    pub async fn acquire(self: &Arc<Self>) -> RequestPermit {
        let permit = self
            .semaphore
            .clone()
            .acquire_owned()
            .await
            .expect("request gate semaphore is never closed");

        loop {
            let wait = {
                let mut last = self.last_dispatch.lock().await;
                let now = Instant::now();
                match *last {
                    Some(stamp) if now < stamp + self.min_interval => (stamp + self.min_interval) - now,
                    _ => {
                        *last = Some(now);
                        break;
                    }
                }
                // Lock dropped before sleeping so other holders can make
                // their own interval check.
            };
            debug!("Gate acquired, waiting {:?} for dispatch slot", wait);
            tokio::time::sleep(wait).await;
        }

        RequestPermit { _permit: permit }
    }

    /// Number of permits currently available.
    pub fn available_permits(&self) -> usize {
        self.semaphore.available_permits()
    }
}
