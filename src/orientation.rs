//! Time axis detection.
//!
//! A discharge matrix is indexed by (time, reach) or by (reach, time).
//! Which of the two physical axes holds time is inferred from the
//! length of the time coordinate. When the matrix is square that
//! inference is underdetermined, and we return [TimeAxis::Ambiguous]
//! rather than picking one: callers must then provide an explicit [Axis].
use std::str::FromStr;

use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Physical axis of a 2-D matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Axis {
    /// Axis 0
    Rows,
    /// Axis 1
    Columns,
}

impl Axis {
    /// Returns the other axis.
    pub fn other(&self) -> Self {
        match self {
            Self::Rows => Self::Columns,
            Self::Columns => Self::Rows,
        }
    }
}

impl From<Axis> for ndarray::Axis {
    fn from(axis: Axis) -> Self {
        match axis {
            Axis::Rows => ndarray::Axis(0),
            Axis::Columns => ndarray::Axis(1),
        }
    }
}

impl std::fmt::Display for Axis {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::Rows => write!(f, "rows"),
            Self::Columns => write!(f, "columns"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
#[error("unknown axis \"{0}\", expecting \"rows\" or \"columns\"")]
pub struct ParsingError(String);

impl FromStr for Axis {
    type Err = ParsingError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "rows" | "row" | "0" | "time-major" => Ok(Self::Rows),
            "columns" | "cols" | "column" | "1" | "reach-major" => Ok(Self::Columns),
            _ => Err(ParsingError(s.to_string())),
        }
    }
}

/// Outcome of time axis detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeAxis {
    /// Time runs along the rows (time-major)
    Rows,
    /// Time runs along the columns (reach-major)
    Columns,
    /// Both axes match the number of time steps
    Ambiguous,
}

impl TimeAxis {
    /// Detects which axis of a matrix of given `shape` holds `steps` time steps.
    /// Returns None when neither axis matches.
    pub fn detect(shape: (usize, usize), steps: usize) -> Option<Self> {
        let (rows, cols) = shape;
        match (rows == steps, cols == steps) {
            (true, true) => Some(Self::Ambiguous),
            (true, false) => Some(Self::Rows),
            (false, true) => Some(Self::Columns),
            (false, false) => None,
        }
    }

    /// Detected axis, if any.
    pub fn axis(&self) -> Option<Axis> {
        match self {
            Self::Rows => Some(Axis::Rows),
            Self::Columns => Some(Axis::Columns),
            Self::Ambiguous => None,
        }
    }

    /// Resolves self with an optional explicit `hint`.
    /// A hint is required when self is [TimeAxis::Ambiguous].
    /// Returns Err(detected) when the hint contradicts the detection.
    pub fn resolve(&self, hint: Option<Axis>) -> Result<Option<Axis>, Axis> {
        match (self.axis(), hint) {
            (Some(detected), Some(hint)) if detected != hint => Err(detected),
            (Some(detected), _) => Ok(Some(detected)),
            (None, hint) => Ok(hint),
        }
    }
}

impl From<Axis> for TimeAxis {
    fn from(axis: Axis) -> Self {
        match axis {
            Axis::Rows => Self::Rows,
            Axis::Columns => Self::Columns,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    #[test]
    fn detection() {
        assert_eq!(TimeAxis::detect((3, 2), 3), Some(TimeAxis::Rows));
        assert_eq!(TimeAxis::detect((2, 3), 3), Some(TimeAxis::Columns));
        assert_eq!(TimeAxis::detect((3, 3), 3), Some(TimeAxis::Ambiguous));
        assert_eq!(TimeAxis::detect((4, 2), 3), None);
    }
    #[test]
    fn resolution() {
        assert_eq!(TimeAxis::Rows.resolve(None), Ok(Some(Axis::Rows)));
        assert_eq!(TimeAxis::Rows.resolve(Some(Axis::Rows)), Ok(Some(Axis::Rows)));
        assert_eq!(TimeAxis::Rows.resolve(Some(Axis::Columns)), Err(Axis::Rows));
        assert_eq!(TimeAxis::Ambiguous.resolve(None), Ok(None));
        assert_eq!(
            TimeAxis::Ambiguous.resolve(Some(Axis::Columns)),
            Ok(Some(Axis::Columns))
        );
    }
    #[test]
    fn parsing() {
        assert_eq!(Axis::from_str("rows"), Ok(Axis::Rows));
        assert_eq!(Axis::from_str(" Columns "), Ok(Axis::Columns));
        assert!(Axis::from_str("diagonal").is_err());
        assert_eq!(Axis::Rows.other(), Axis::Columns);
    }
    #[test]
    fn ndarray_axes() {
        assert_eq!(ndarray::Axis::from(Axis::Rows), ndarray::Axis(0));
        assert_eq!(ndarray::Axis::from(Axis::Columns), ndarray::Axis(1));
    }
}
