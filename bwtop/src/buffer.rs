//! Rolling window of throughput samples fed by the poller.
//!
//! A multi-sample payload replaces the whole window (initial history load);
//! a single sample slides the window by one. The running maximum is kept in
//! step with every ingestion and drives the unit tier of the chart labels.

use std::collections::VecDeque;

use thiserror::Error;

/// Window width used when the chart surface cannot be measured.
pub const DEFAULT_CAPACITY: usize = 300;

/// A chart point: (position oldest→newest, value).
pub type SeriesPoint = (f64, f64);

#[derive(Debug, Error, Clone, PartialEq)]
pub enum IngestError {
    #[error("empty sample payload")]
    Empty,
    #[error("sample {index} is negative ({value})")]
    Negative { index: usize, value: f64 },
    #[error("sample {index} is not a finite number")]
    NonFinite { index: usize },
}

#[derive(Debug, Clone)]
pub struct SampleBuffer {
    samples: VecDeque<f64>,
    capacity: usize,
    running_max: f64,
}

impl SampleBuffer {
    /// `capacity` is fixed for the buffer's lifetime; zero is bumped to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
            running_max: 0.0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> impl Iterator<Item = f64> + '_ {
        self.samples.iter().copied()
    }

    pub fn latest(&self) -> Option<f64> {
        self.samples.back().copied()
    }

    /// Largest sample currently held, 0 when empty.
    pub fn current_max(&self) -> f64 {
        self.running_max
    }

    /// Route a fetched payload: several samples replace the window, one slides it.
    pub fn ingest(&mut self, samples: &[f64]) -> Result<(), IngestError> {
        match samples {
            [] => Err(IngestError::Empty),
            [one] => self.ingest_incremental(*one),
            many => self.ingest_bulk(many),
        }
    }

    /// Replace the contents with `samples` when more than one is given.
    ///
    /// The payload is taken as-is, even past `capacity`; the window width then
    /// stays at that length for subsequent incremental updates.
    pub fn ingest_bulk(&mut self, samples: &[f64]) -> Result<(), IngestError> {
        validate(samples)?;
        if samples.len() <= 1 {
            return Ok(());
        }
        self.samples.clear();
        self.samples.extend(samples.iter().copied());
        self.recompute_max();
        Ok(())
    }

    /// Drop the oldest sample (if any) and append `sample`.
    pub fn ingest_incremental(&mut self, sample: f64) -> Result<(), IngestError> {
        validate(&[sample])?;
        if !self.samples.is_empty() {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
        self.recompute_max();
        Ok(())
    }

    /// Fresh (index, value) view of the window for one redraw.
    pub fn to_series(&self) -> impl Iterator<Item = SeriesPoint> + '_ {
        self.samples
            .iter()
            .enumerate()
            .map(|(i, v)| (i as f64, *v))
    }

    fn recompute_max(&mut self) {
        self.running_max = self.samples.iter().copied().fold(0.0, f64::max);
    }
}

impl Default for SampleBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

/// Every sample must be a finite, non-negative number.
pub fn validate(samples: &[f64]) -> Result<(), IngestError> {
    for (index, &value) in samples.iter().enumerate() {
        if !value.is_finite() {
            return Err(IngestError::NonFinite { index });
        }
        if value < 0.0 {
            return Err(IngestError::Negative { index, value });
        }
    }
    Ok(())
}
