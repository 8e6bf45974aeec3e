//! Read-only time series store interface and in-memory implementations.

pub mod store;
pub mod synthetic;

pub use store::InMemoryStore;
pub use synthetic::DailyProfile;

use thiserror::Error;

/// Errors raised by a [`TimeSeriesStore`].
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("unknown time series \"{0}\"")]
    UnknownSeries(String),

    #[error("time series \"{name}\" has {len} points, point {point} requested")]
    PointOutOfRange {
        name: String,
        point: usize,
        len: usize,
    },

    #[error("time series \"{0}\" declared twice")]
    DuplicateSeries(String),

    #[error("invalid value \"{raw}\" for series \"{name}\" at point {point}")]
    Parse {
        name: String,
        point: usize,
        raw: String,
    },

    #[error(transparent)]
    Csv(#[from] csv::Error),
}

/// Key-to-series store queried point by point.
pub trait TimeSeriesStore {
    /// Returns the value of series `name` at `point`.
    ///
    /// # Errors
    ///
    /// [`StoreError::UnknownSeries`] when the series is absent and
    /// [`StoreError::PointOutOfRange`] when it is shorter than `point`.
    fn value_at(&self, name: &str, point: usize) -> Result<f64, StoreError>;

    /// Returns `true` when the store holds a series called `name`.
    fn contains(&self, name: &str) -> bool;
}
