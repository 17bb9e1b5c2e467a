//! Record / addition merging.
//!
//! Reconciles an existing record with a newly simulated addition:
//! the addition may repeat the record tail (prefix overlap) and may use
//! the other matrix orientation. The merged result always keeps the
//! record orientation and is validated before being returned,
//! so nothing gets persisted unless it is fully consistent.
use std::{cmp::Ordering, collections::HashSet};

use itertools::Itertools;
use log::{debug, warn};
use ndarray::{concatenate, ShapeError, Slice};
use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    dataset::{MergedDataset, TimeSeriesDataset, Timestamp},
    orientation::Axis,
};

/// Dataset being merged
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Record,
    Addition,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::Record => write!(f, "record"),
            Self::Addition => write!(f, "addition"),
        }
    }
}

/// Merge related errors. None of these are recoverable by guessing:
/// the archive must not be written when one is raised.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("{0} has no time steps")]
    Empty(Role),
    #[error("{role} discharge is {rows}x{cols}, neither axis matches its {steps} time steps")]
    NoTimeAxis {
        role: Role,
        rows: usize,
        cols: usize,
        steps: usize,
    },
    #[error("{role} discharge is {steps}x{steps}: time axis is ambiguous, provide an explicit axis")]
    AmbiguousOrientation { role: Role, steps: usize },
    #[error("{role} time axis declared along {hint} but detected along {detected}")]
    HintMismatch {
        role: Role,
        hint: Axis,
        detected: Axis,
    },
    #[error("reach count mismatch: record has {record}, addition has {addition}")]
    ShapeMismatch { record: usize, addition: usize },
    #[error("{0} does not provide reach identifiers")]
    MissingReachIds(Role),
    #[error("reach identifiers differ at position {index}: record {record}, addition {addition}")]
    ReachMismatch {
        index: usize,
        record: i64,
        addition: i64,
    },
    #[error("{role} lists {ids} reach identifiers for {reaches} reaches")]
    ReachIdsLength {
        role: Role,
        ids: usize,
        reaches: usize,
    },
    #[error("reach identifiers count mismatch: record has {record}, addition has {addition}")]
    ReachCountMismatch { record: usize, addition: usize },
    #[error("{overlap} duplicate time steps are not a clean prefix of the addition")]
    OverlapNotPrefix { overlap: usize },
    #[error("merged time is not strictly increasing at position {index} ({previous} then {current})")]
    NonMonotonicResult {
        index: usize,
        previous: Timestamp,
        current: Timestamp,
    },
    #[error("shape error: {0}")]
    Shape(#[from] ShapeError),
}

/// Merge options.
/// Axis hints only apply to datasets that do not declare their own
/// time axis: Qout archives always do, through their dimensions.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct MergeOpts {
    /// Explicit record time axis, only used when the record
    /// itself does not declare one.
    pub record_axis: Option<Axis>,
    /// Explicit addition time axis, only used when the addition
    /// itself does not declare one.
    pub addition_axis: Option<Axis>,
    /// Both datasets must carry reach identifiers
    pub require_reach_ids: bool,
}

/// Merges `addition` into `record` with default [MergeOpts].
pub fn merge(
    record: &TimeSeriesDataset,
    addition: &TimeSeriesDataset,
) -> Result<MergedDataset, Error> {
    merge_with(record, addition, &MergeOpts::default())
}

/// Merges `addition` into `record`, see module documentation.
pub fn merge_with(
    record: &TimeSeriesDataset,
    addition: &TimeSeriesDataset,
    opts: &MergeOpts,
) -> Result<MergedDataset, Error> {
    if record.time.is_empty() {
        return Err(Error::Empty(Role::Record));
    }
    if addition.time.is_empty() {
        return Err(Error::Empty(Role::Addition));
    }

    let record_axis = time_axis(record, Role::Record, opts.record_axis)?;
    let addition_axis = time_axis(addition, Role::Addition, opts.addition_axis)?;
    debug!(
        "record time along {}, addition time along {}",
        record_axis, addition_axis
    );

    let record_reaches = record.discharge.len_of(record_axis.other().into());
    let addition_reaches = addition.discharge.len_of(addition_axis.other().into());
    if record_reaches != addition_reaches {
        return Err(Error::ShapeMismatch {
            record: record_reaches,
            addition: addition_reaches,
        });
    }

    let reaches = check_reaches(record, record_reaches, addition, addition_reaches, opts)?;

    let overlap = overlap(&record.time, &addition.time)?;
    debug!("{} duplicate time steps", overlap);

    let kept = addition
        .discharge
        .slice_axis(addition_axis.into(), Slice::from(overlap..));
    let kept = if addition_axis == record_axis {
        kept
    } else {
        kept.reversed_axes()
    };

    let mut time = Vec::with_capacity(record.time.len() + addition.time.len() - overlap);
    time.extend_from_slice(&record.time);
    time.extend_from_slice(&addition.time[overlap..]);

    ensure_strictly_increasing(&time)?;

    let discharge = concatenate(record_axis.into(), &[record.discharge.view(), kept])?;

    Ok(MergedDataset {
        time,
        discharge,
        time_axis: record_axis,
        reaches,
        overlap,
        appended: addition.time.len() - overlap,
    })
}

/// Resolves the time axis of a dataset:
/// shape detection first, then dataset hint, then user hint.
fn time_axis(dataset: &TimeSeriesDataset, role: Role, hint: Option<Axis>) -> Result<Axis, Error> {
    let (rows, cols) = dataset.discharge.dim();
    let steps = dataset.time.len();
    let detected = dataset.detect_time_axis().ok_or(Error::NoTimeAxis {
        role,
        rows,
        cols,
        steps,
    })?;
    let hint = dataset.time_axis_hint.or(hint);
    match detected.resolve(hint) {
        Ok(Some(axis)) => Ok(axis),
        Ok(None) => Err(Error::AmbiguousOrientation { role, steps }),
        Err(detected) => Err(Error::HintMismatch {
            role,
            hint: hint.unwrap_or(detected.other()),
            detected,
        }),
    }
}

/// Verifies reach identifiers when possible and returns the identifiers
/// the merged dataset should carry. `record_reaches` and `addition_reaches`
/// are the location axis lengths of each discharge matrix.
fn check_reaches(
    record: &TimeSeriesDataset,
    record_reaches: usize,
    addition: &TimeSeriesDataset,
    addition_reaches: usize,
    opts: &MergeOpts,
) -> Result<Option<Vec<i64>>, Error> {
    for (role, ids, reaches) in [
        (Role::Record, &record.reaches, record_reaches),
        (Role::Addition, &addition.reaches, addition_reaches),
    ] {
        if let Some(ids) = ids {
            if ids.len() != reaches {
                return Err(Error::ReachIdsLength {
                    role,
                    ids: ids.len(),
                    reaches,
                });
            }
        }
    }
    match (&record.reaches, &addition.reaches) {
        (Some(lhs), Some(rhs)) => {
            if lhs.len() != rhs.len() {
                return Err(Error::ReachCountMismatch {
                    record: lhs.len(),
                    addition: rhs.len(),
                });
            }
            if let Some((index, (a, b))) = lhs
                .iter()
                .zip(rhs.iter())
                .enumerate()
                .find(|(_, (a, b))| a != b)
            {
                return Err(Error::ReachMismatch {
                    index,
                    record: *a,
                    addition: *b,
                });
            }
            Ok(Some(lhs.clone()))
        },
        (lhs, rhs) => {
            if opts.require_reach_ids {
                let role = if lhs.is_none() {
                    Role::Record
                } else {
                    Role::Addition
                };
                return Err(Error::MissingReachIds(role));
            }
            warn!("reach ordering not verified: identifiers missing on one side");
            Ok(lhs.clone().or_else(|| rhs.clone()))
        },
    }
}

/// Exact equality key of a timestamp (both zeros compare equal)
fn key(t: Timestamp) -> u64 {
    if t == 0.0 {
        0
    } else {
        t.to_bits()
    }
}

/// Counts the timestamps present on both sides and verifies they form
/// a clean prefix of the addition, duplicating the tail of the record.
fn overlap(record: &[Timestamp], addition: &[Timestamp]) -> Result<usize, Error> {
    let lhs: HashSet<u64> = record.iter().map(|t| key(*t)).collect();
    let k = addition
        .iter()
        .map(|t| key(*t))
        .unique()
        .filter(|t| lhs.contains(t))
        .count();
    if k == 0 {
        return Ok(0);
    }
    if record[record.len() - k..] != addition[..k] {
        return Err(Error::OverlapNotPrefix { overlap: k });
    }
    Ok(k)
}

fn ensure_strictly_increasing(time: &[Timestamp]) -> Result<(), Error> {
    match time
        .iter()
        .tuple_windows()
        .position(|(previous, current)| {
            current.partial_cmp(previous) != Some(Ordering::Greater)
        })
    {
        Some(pos) => Err(Error::NonMonotonicResult {
            index: pos + 1,
            previous: time[pos],
            current: time[pos + 1],
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    #[test]
    fn prefix_overlap() {
        assert_eq!(overlap(&[1.0, 2.0, 3.0], &[3.0, 4.0, 5.0]), Ok(1));
        assert_eq!(overlap(&[1.0, 2.0, 3.0], &[2.0, 3.0, 4.0]), Ok(2));
        assert_eq!(overlap(&[1.0, 2.0, 3.0], &[4.0, 5.0]), Ok(0));
        assert_eq!(overlap(&[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0]), Ok(3));
        // duplicate located in the middle of the addition
        assert_eq!(
            overlap(&[1.0, 2.0, 3.0], &[4.0, 3.0, 5.0]),
            Err(Error::OverlapNotPrefix { overlap: 1 })
        );
        // overlap not aligned on the record tail
        assert_eq!(
            overlap(&[1.0, 2.0, 3.0], &[2.0, 4.0]),
            Err(Error::OverlapNotPrefix { overlap: 1 })
        );
    }
    #[test]
    fn exact_equality() {
        assert_eq!(overlap(&[0.0, 0.125, 0.25], &[0.25, 0.375]), Ok(1));
        assert_eq!(overlap(&[-1.0, -0.0], &[0.0, 1.0]), Ok(1));
        // close is not equal
        assert_eq!(overlap(&[0.0, 0.1 + 0.2], &[0.3, 0.4]), Ok(0));
    }
    #[test]
    fn monotonicity() {
        assert!(ensure_strictly_increasing(&[1.0, 2.0, 3.0]).is_ok());
        assert!(ensure_strictly_increasing(&[1.0]).is_ok());
        assert_eq!(
            ensure_strictly_increasing(&[1.0, 3.0, 3.0, 4.0]),
            Err(Error::NonMonotonicResult {
                index: 2,
                previous: 3.0,
                current: 3.0
            })
        );
        assert!(ensure_strictly_increasing(&[1.0, f64::NAN, 3.0]).is_err());
    }
}
