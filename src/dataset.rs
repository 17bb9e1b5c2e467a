//! Discharge time series
use ndarray::Array2;

use crate::orientation::{Axis, TimeAxis};

/// Timestamps are opaque numeric tokens (typically seconds or days
/// since the simulation epoch), compared for exact equality only.
/// Integral and fractional time coordinates are both represented.
pub type Timestamp = f64;

/// A time coordinate and its discharge matrix,
/// jointly indexed by time and by river reach.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimeSeriesDataset {
    /// Strictly increasing timestamps, one per time step
    pub time: Vec<Timestamp>,
    /// Discharge values. One axis is time, the other one is the location axis.
    pub discharge: Array2<f64>,
    /// Reach identifiers, in location axis order, when known
    pub reaches: Option<Vec<i64>>,
    /// Explicit time axis declaration, used to resolve square matrices
    pub time_axis_hint: Option<Axis>,
}

impl TimeSeriesDataset {
    /// Builds a new dataset, orientation will be detected.
    pub fn new(time: Vec<Timestamp>, discharge: Array2<f64>) -> Self {
        Self {
            time,
            discharge,
            reaches: None,
            time_axis_hint: None,
        }
    }

    /// Copies and returns Self with given reach identifiers.
    pub fn with_reaches(&self, reaches: Vec<i64>) -> Self {
        let mut s = self.clone();
        s.reaches = Some(reaches);
        s
    }

    /// Copies and returns Self with an explicit time [Axis].
    pub fn with_time_axis(&self, axis: Axis) -> Self {
        let mut s = self.clone();
        s.time_axis_hint = Some(axis);
        s
    }

    /// Number of time steps
    pub fn steps(&self) -> usize {
        self.time.len()
    }

    /// Detects the time axis from shapes only, see [TimeAxis::detect].
    pub fn detect_time_axis(&self) -> Option<TimeAxis> {
        TimeAxis::detect(self.discharge.dim(), self.time.len())
    }
}

/// Result of a merge operation.
/// Discharge keeps the orientation of the record it was merged into.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedDataset {
    /// Strictly increasing timestamps
    pub time: Vec<Timestamp>,
    /// Merged discharge, time along [Self::time_axis]
    pub discharge: Array2<f64>,
    /// Time axis of the record, preserved
    pub time_axis: Axis,
    /// Reach identifiers, if either side provided them
    pub reaches: Option<Vec<i64>>,
    /// Number of addition time steps that duplicated the record tail
    pub overlap: usize,
    /// Number of time steps actually appended
    pub appended: usize,
}

impl MergedDataset {
    pub fn steps(&self) -> usize {
        self.time.len()
    }

    /// Number of reaches
    pub fn reach_count(&self) -> usize {
        self.discharge.len_of(self.time_axis.other().into())
    }

    /// Converts Self back into a [TimeSeriesDataset], with explicit orientation.
    pub fn into_dataset(self) -> TimeSeriesDataset {
        TimeSeriesDataset {
            time: self.time,
            discharge: self.discharge,
            reaches: self.reaches,
            time_axis_hint: Some(self.time_axis),
        }
    }
}
