//! Aggregate statistics over repeated timing samples.

use core::num::NonZeroUsize;

use thiserror::Error;


// CONSTANTS
// ================================================================================================

/// Display units for [format_nanos], ordered from the largest.
const TIME_UNITS: [(&str, f64); 4] = [("s", 1e9), ("ms", 1e6), ("us", 1e3), ("ns", 1.0)];

// TYPES
// ================================================================================================

/// A duration expressed in nanoseconds.
pub type Nanosecs = u64;

/// Errors returned by [DataSet] and [RunTimeStats].
#[derive(Debug, Error, PartialEq)]
pub enum StatsError {
    #[error("data set is already closed")]
    AlreadyClosed,
    #[error("data set must be closed before its aggregates are read")]
    NotClosed,
    #[error("cannot close a data set without samples")]
    Empty,
    #[error("sample {0} is not a finite non-negative duration")]
    InvalidSample(f64),
}

// DATA SET
// ================================================================================================

/// An ordered collection of samples with aggregates computed on [DataSet::close].
///
/// Samples keep their insertion order and duplicates are allowed. The aggregates are frozen
/// by `close`: after that no more samples can be added, and before that none of the aggregate
/// getters can be used.
#[derive(Debug, Clone, Default)]
pub struct DataSet {
    samples: Vec<f64>,
    aggregates: Option<Aggregates>,
}

#[derive(Debug, Clone, Copy)]
struct Aggregates {
    mean: f64,
    mean_deviation: f64,
}

impl DataSet {
    /// Returns a new open data set without samples.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a new open data set with room for `capacity` samples.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            samples: Vec::with_capacity(capacity),
            aggregates: None,
        }
    }

    /// Appends a sample to the end of the set.
    ///
    /// # Errors
    /// Returns an error if the set is closed or `value` is negative, infinite or NaN.
    pub fn add_sample(&mut self, value: f64) -> Result<(), StatsError> {
        if self.is_closed() {
            return Err(StatsError::AlreadyClosed);
        }
        if !value.is_finite() || value < 0.0 {
            return Err(StatsError::InvalidSample(value));
        }
        self.samples.push(value);
        Ok(())
    }

    /// Computes the aggregates and freezes the set.
    ///
    /// The mean is computed first and the mean absolute deviation from it in a second pass.
    /// A failed close leaves the set open.
    ///
    /// # Errors
    /// Returns an error if the set is already closed or holds no samples.
    pub fn close(&mut self) -> Result<(), StatsError> {
        if self.is_closed() {
            return Err(StatsError::AlreadyClosed);
        }
        if self.samples.is_empty() {
            return Err(StatsError::Empty);
        }

        let count = self.samples.len() as f64;
        let mean = self.samples.iter().sum::<f64>() / count;
        let mean_deviation = self.samples.iter().map(|s| (s - mean).abs()).sum::<f64>() / count;

        self.aggregates = Some(Aggregates { mean, mean_deviation });
        Ok(())
    }

    /// Returns true once [DataSet::close] has succeeded.
    pub fn is_closed(&self) -> bool {
        self.aggregates.is_some()
    }

    /// Returns the number of samples in the set.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Returns true if no sample was added yet.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Returns the raw samples in insertion order.
    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    /// Returns the arithmetic mean of the samples.
    pub fn mean(&self) -> Result<f64, StatsError> {
        self.aggregates().map(|a| a.mean)
    }

    /// Returns the mean absolute deviation of the samples from their mean.
    pub fn mean_deviation(&self) -> Result<f64, StatsError> {
        self.aggregates().map(|a| a.mean_deviation)
    }

    /// Returns the mean deviation as a fraction of the mean, or 0 when the mean is 0.
    pub fn mean_deviation_per_mean(&self) -> Result<f64, StatsError> {
        self.aggregates().map(|a| {
            if a.mean == 0.0 {
                0.0
            } else {
                a.mean_deviation / a.mean
            }
        })
    }

    fn aggregates(&self) -> Result<Aggregates, StatsError> {
        self.aggregates.ok_or(StatsError::NotClosed)
    }
}

// RUN TIME STATS
// ================================================================================================

/// Timing statistics of a benchmark run.
///
/// Every sample is recorded twice: as the absolute duration of a batch trial and normalized
/// by the batch size, giving the approximate cost of a single hash. The two data sets always
/// hold the same number of samples.
#[derive(Debug, Clone)]
pub struct RunTimeStats {
    batch_size: NonZeroUsize,
    nanoseconds: DataSet,
    nanosecs_per_hash: DataSet,
}

impl RunTimeStats {
    /// Returns empty statistics normalizing every sample by `batch_size`.
    pub fn new(batch_size: NonZeroUsize) -> Self {
        Self {
            batch_size,
            nanoseconds: DataSet::new(),
            nanosecs_per_hash: DataSet::new(),
        }
    }

    /// Returns the number of hashes each sample covers.
    pub fn batch_size(&self) -> NonZeroUsize {
        self.batch_size
    }

    /// Records the duration of one batch trial.
    pub fn add_sample(&mut self, sample: Nanosecs) -> Result<(), StatsError> {
        // both sets are closed together, so checking one keeps them in lockstep
        if self.nanoseconds.is_closed() {
            return Err(StatsError::AlreadyClosed);
        }
        let absolute = sample as f64;
        self.nanoseconds.add_sample(absolute)?;
        self.nanosecs_per_hash.add_sample(absolute / self.batch_size.get() as f64)
    }

    /// Closes both data sets.
    pub fn close(&mut self) -> Result<(), StatsError> {
        if self.nanoseconds.is_closed() || self.nanosecs_per_hash.is_closed() {
            return Err(StatsError::AlreadyClosed);
        }
        if self.nanoseconds.is_empty() {
            return Err(StatsError::Empty);
        }
        self.nanoseconds.close()?;
        self.nanosecs_per_hash.close()
    }

    /// Returns the absolute batch durations.
    pub fn nanoseconds(&self) -> &DataSet {
        &self.nanoseconds
    }

    /// Returns the batch durations divided by the batch size.
    pub fn nanosecs_per_hash(&self) -> &DataSet {
        &self.nanosecs_per_hash
    }
}

// FORMATTING
// ================================================================================================

/// Renders a duration given in nanoseconds with the largest unit that keeps it above 1.
///
/// ```
/// use argon2_bench::stats::format_nanos;
///
/// assert_eq!(format_nanos(1_500_000.0), "1.500 ms");
/// assert_eq!(format_nanos(250.0), "250.000 ns");
/// ```
pub fn format_nanos(nanos: f64) -> String {
    let (unit, scale) = TIME_UNITS
        .iter()
        .copied()
        .find(|&(_, scale)| nanos >= scale)
        .unwrap_or(TIME_UNITS[TIME_UNITS.len() - 1]);
    format!("{:.3} {unit}", nanos / scale)
}
