//! Shared agent state: sysinfo network handle, sample history and response counters.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use sysinfo::Networks;
use tokio::sync::{Mutex, RwLock};

use crate::history::TrafficHistory;

pub type SharedNetworks = Arc<Mutex<Networks>>;
pub type SharedHistory = Arc<RwLock<TrafficHistory>>;

#[derive(Clone)]
pub struct AppState {
    // Persistent sysinfo handle so received()/transmitted() are deltas between samples
    pub nets: SharedNetworks,
    pub history: SharedHistory,

    // Manager responses served and their body bytes
    pub requests: Arc<AtomicU64>,
    pub bytes_sent: Arc<AtomicU64>,

    // Manager requests currently being handled, and the highest count seen
    pub open: Arc<AtomicU64>,
    pub max_open: Arc<AtomicU64>,

    pub started: Instant,
    pub hostname: String,
}

impl AppState {
    pub fn new(nets: Networks, history_cap: usize) -> Self {
        let hostname = hostname::get()
            .ok()
            .and_then(|s| s.into_string().ok())
            .unwrap_or_else(|| "unknown".into());
        Self {
            nets: Arc::new(Mutex::new(nets)),
            history: Arc::new(RwLock::new(TrafficHistory::new(history_cap))),
            requests: Arc::new(AtomicU64::new(0)),
            bytes_sent: Arc::new(AtomicU64::new(0)),
            open: Arc::new(AtomicU64::new(0)),
            max_open: Arc::new(AtomicU64::new(0)),
            started: Instant::now(),
            hostname,
        }
    }
}

/// Counts one in-flight manager request for as long as it is held.
pub struct OpenGuard {
    open: Arc<AtomicU64>,
}

impl OpenGuard {
    pub fn enter(state: &AppState) -> Self {
        let now = state.open.fetch_add(1, Ordering::Relaxed) + 1;
        state.max_open.fetch_max(now, Ordering::Relaxed);
        Self {
            open: state.open.clone(),
        }
    }
}

impl Drop for OpenGuard {
    fn drop(&mut self) {
        self.open.fetch_sub(1, Ordering::Relaxed);
    }
}
