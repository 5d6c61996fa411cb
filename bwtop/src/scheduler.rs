//! Poll loops for the traffic chart and the status panel.
//!
//! Every fetch runs as its own task and reports back on a channel; the UI task
//! is the single consumer and applies results in arrival order. The ticker
//! never waits for an earlier fetch, so slow responses can overlap and land
//! out of issue order.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::debug;

use crate::buffer::DEFAULT_CAPACITY;
use crate::fetch::{FetchError, ManagerApi};

pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(5000);

/// The status panel refreshes on a fixed period, independent of the chart interval.
pub const STATUS_INTERVAL: Duration = Duration::from_millis(5000);

/// Outcome of one fetch, delivered to the UI task.
#[derive(Debug, Clone, PartialEq)]
pub enum PollEvent {
    Traffic {
        requested: usize,
        result: Result<Vec<f64>, FetchError>,
    },
    Status(Result<String, FetchError>),
}

impl PollEvent {
    /// Samples missing from a successful traffic response that came back
    /// shorter than requested.
    pub fn shortfall(&self) -> Option<usize> {
        match self {
            PollEvent::Traffic {
                requested,
                result: Ok(samples),
            } if samples.len() < *requested => Some(requested - samples.len()),
            _ => None,
        }
    }
}

/// Initial history size for a chart surface `dots` braille dots wide: half
/// the width, rounded, or the default window when nothing was measured.
pub fn initial_fetch_size(dots: Option<u32>) -> usize {
    match dots {
        Some(w) if w > 0 => ((w as f64 / 2.0).round() as usize).max(1),
        _ => DEFAULT_CAPACITY,
    }
}

/// Phase 1: one fetch of `initial_count` samples right away.
/// Phase 2: one single-sample fetch every `every`, until aborted.
pub fn spawn_traffic_poller<A: ManagerApi>(
    api: Arc<A>,
    initial_count: usize,
    every: Duration,
    tx: UnboundedSender<PollEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        spawn_traffic_fetch(api.clone(), initial_count, tx.clone());

        let mut ticker = interval_at(Instant::now() + every, every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            if tx.is_closed() {
                debug!("traffic poller stopping: receiver dropped");
                break;
            }
            spawn_traffic_fetch(api.clone(), 1, tx.clone());
        }
    })
}

fn spawn_traffic_fetch<A: ManagerApi>(api: Arc<A>, count: usize, tx: UnboundedSender<PollEvent>) {
    tokio::spawn(async move {
        let result = api.traffic_data(count).await;
        // A closed channel means the widget is gone; nothing left to update.
        let _ = tx.send(PollEvent::Traffic {
            requested: count,
            result,
        });
    });
}

/// Status panel loop: fetch now, then every [`STATUS_INTERVAL`].
pub fn spawn_status_poller<A: ManagerApi>(
    api: Arc<A>,
    tx: UnboundedSender<PollEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(STATUS_INTERVAL);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            if tx.is_closed() {
                break;
            }
            let api = api.clone();
            let tx = tx.clone();
            tokio::spawn(async move {
                let result = api.server_info().await;
                let _ = tx.send(PollEvent::Status(result));
            });
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::future::Future;
    use std::sync::Mutex;
    use tokio::sync::mpsc;

    /// Scripted endpoint: each traffic call pops the next (delay, result).
    struct Scripted {
        calls: Mutex<Vec<usize>>,
        script: Mutex<Vec<(Duration, Result<Vec<f64>, FetchError>)>>,
    }

    impl Scripted {
        fn new(script: Vec<(Duration, Result<Vec<f64>, FetchError>)>) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                script: Mutex::new(script.into_iter().rev().collect()),
            }
        }
    }

    impl ManagerApi for Scripted {
        fn traffic_data(
            &self,
            count: usize,
        ) -> impl Future<Output = Result<Vec<f64>, FetchError>> + Send {
            self.calls.lock().unwrap().push(count);
            let (delay, result) = self
                .script
                .lock()
                .unwrap()
                .pop()
                .unwrap_or((Duration::ZERO, Err(FetchError::Status(503))));
            async move {
                tokio::time::sleep(delay).await;
                result
            }
        }

        fn server_info(&self) -> impl Future<Output = Result<String, FetchError>> + Send {
            async { Ok("<b>up</b>".to_string()) }
        }
    }

    #[test]
    fn fetch_size_from_width() {
        assert_eq!(initial_fetch_size(Some(240)), 120);
        assert_eq!(initial_fetch_size(Some(3)), 2);
        assert_eq!(initial_fetch_size(Some(1)), 1);
        assert_eq!(initial_fetch_size(Some(0)), DEFAULT_CAPACITY);
        assert_eq!(initial_fetch_size(None), DEFAULT_CAPACITY);
    }

    #[tokio::test(start_paused = true)]
    async fn bulk_first_then_single_samples_on_interval() {
        let api = Arc::new(Scripted::new(vec![
            (Duration::ZERO, Ok(vec![1.0, 2.0, 3.0])),
            (Duration::ZERO, Ok(vec![4.0])),
            (Duration::ZERO, Ok(vec![5.0])),
        ]));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let h = spawn_traffic_poller(api.clone(), 3, DEFAULT_INTERVAL, tx);

        let first = rx.recv().await.unwrap();
        assert_eq!(
            first,
            PollEvent::Traffic {
                requested: 3,
                result: Ok(vec![1.0, 2.0, 3.0])
            }
        );
        let second = rx.recv().await.unwrap();
        assert_eq!(
            second,
            PollEvent::Traffic {
                requested: 1,
                result: Ok(vec![4.0])
            }
        );
        let _third = rx.recv().await.unwrap();
        h.abort();
        assert_eq!(*api.calls.lock().unwrap(), vec![3, 1, 1]);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_fetches_overlap_and_arrive_out_of_order() {
        // The first tick's fetch is slower than the interval; the second tick's
        // fetch overtakes it.
        let api = Arc::new(Scripted::new(vec![
            (Duration::ZERO, Ok(vec![0.0, 0.0])),
            (Duration::from_millis(7000), Ok(vec![111.0])),
            (Duration::from_millis(100), Ok(vec![222.0])),
        ]));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let h = spawn_traffic_poller(api, 2, DEFAULT_INTERVAL, tx);

        let mut arrived = Vec::new();
        for _ in 0..3 {
            if let Some(PollEvent::Traffic { result: Ok(v), .. }) = rx.recv().await {
                arrived.push(v);
            }
        }
        h.abort();
        assert_eq!(arrived, vec![vec![0.0, 0.0], vec![222.0], vec![111.0]]);
    }

    #[tokio::test(start_paused = true)]
    async fn status_poller_fetches_immediately() {
        let api = Arc::new(Scripted::new(vec![]));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let h = spawn_status_poller(api, tx);
        assert_eq!(
            rx.recv().await.unwrap(),
            PollEvent::Status(Ok("<b>up</b>".into()))
        );
        h.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn status_period_is_fixed() {
        let api = Arc::new(Scripted::new(vec![]));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let h = spawn_status_poller(api, tx);
        rx.recv().await.unwrap();
        let first = Instant::now();
        rx.recv().await.unwrap();
        assert_eq!(first.elapsed(), STATUS_INTERVAL);
        h.abort();
    }

    #[test]
    fn shortfall_only_for_short_traffic() {
        let short = PollEvent::Traffic {
            requested: 120,
            result: Ok(vec![1.0; 40]),
        };
        assert_eq!(short.shortfall(), Some(80));
        let full = PollEvent::Traffic {
            requested: 1,
            result: Ok(vec![1.0]),
        };
        assert_eq!(full.shortfall(), None);
        let failed = PollEvent::Traffic {
            requested: 10,
            result: Err(FetchError::Status(500)),
        };
        assert_eq!(failed.shortfall(), None);
        assert_eq!(PollEvent::Status(Ok(String::new())).shortfall(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn poller_stops_when_receiver_dropped() {
        let api = Arc::new(Scripted::new(vec![]));
        let (tx, rx) = mpsc::unbounded_channel();
        let h = spawn_traffic_poller(api, 5, DEFAULT_INTERVAL, tx);
        drop(rx);
        tokio::time::sleep(DEFAULT_INTERVAL * 2).await;
        assert!(h.is_finished());
    }
}
