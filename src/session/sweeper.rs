//! Background expiry of idle sessions.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use super::SessionStore;

/// Shortest period the sweeper will tick at.
pub const MIN_SWEEP_INTERVAL: Duration = Duration::from_millis(1);

/// Spawn a task that sweeps expired sessions every `every`.
///
/// The task runs until aborted or the runtime shuts down. It takes the
/// same exclusive lock as request-time mutations. Periods shorter than
/// [`MIN_SWEEP_INTERVAL`] are raised to it.
pub fn spawn_sweeper(store: Arc<SessionStore>, every: Duration) -> JoinHandle<()> {
    if every < MIN_SWEEP_INTERVAL {
        warn!(?every, "Sweep interval too short, using {:?}", MIN_SWEEP_INTERVAL);
    }
    let every = every.max(MIN_SWEEP_INTERVAL);

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        // The first tick completes immediately.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            match store.sweep_expired(Instant::now()) {
                Ok(0) => {}
                Ok(removed) => {
                    debug!(removed, remaining = store.count(), "Swept expired sessions")
                }
                Err(e) => warn!("Session sweep failed: {}", e),
            }
        }
    })
}
