//! Background sampler: turns interface byte counters into a bytes/sec history.

use std::time::Instant;

use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::trace;

use crate::state::AppState;

pub fn spawn_sampler(state: AppState, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // First tick fires immediately; it only establishes the baseline.
        ticker.tick().await;
        let mut last = Instant::now();
        {
            let mut nets = state.nets.lock().await;
            nets.refresh(true);
        }
        loop {
            ticker.tick().await;
            let now = Instant::now();
            let bytes = {
                let mut nets = state.nets.lock().await;
                // sysinfo: received()/transmitted() are deltas since the previous refresh
                nets.refresh(true);
                nets.iter()
                    .map(|(_, data)| data.received().saturating_add(data.transmitted()))
                    .fold(0u64, u64::saturating_add)
            };
            let rate = bytes_per_sec(bytes, now.duration_since(last));
            last = now;
            state.history.write().await.push(rate);
            trace!(bytes, rate, "sampled");
        }
    })
}

/// Average rate over `elapsed`, rounded to whole bytes.
pub fn bytes_per_sec(bytes: u64, elapsed: Duration) -> u64 {
    let secs = elapsed.as_secs_f64().max(1e-6);
    (bytes as f64 / secs).round() as u64
}
