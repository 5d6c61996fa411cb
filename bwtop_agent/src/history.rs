//! Capped ring of throughput samples (bytes/sec), oldest first.

use std::collections::VecDeque;

#[derive(Debug, Clone)]
pub struct TrafficHistory {
    samples: VecDeque<u64>,
    cap: usize,
}

impl TrafficHistory {
    pub fn new(cap: usize) -> Self {
        let cap = cap.max(1);
        Self {
            samples: VecDeque::with_capacity(cap),
            cap,
        }
    }

    pub fn capacity(&self) -> usize {
        self.cap
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn latest(&self) -> Option<u64> {
        self.samples.back().copied()
    }

    pub fn push(&mut self, v: u64) {
        if self.samples.len() == self.cap {
            self.samples.pop_front();
        }
        self.samples.push_back(v);
    }

    /// Newest `n` samples, oldest first, left-padded with zeros up to `n`.
    pub fn window(&self, n: usize) -> Vec<u64> {
        let n = n.min(self.cap);
        let have = self.samples.len().min(n);
        let mut out = vec![0; n - have];
        out.extend(self.samples.iter().skip(self.samples.len() - have));
        out
    }
}
