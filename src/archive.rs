//! Qout archives: netCDF files holding a time coordinate,
//! a discharge matrix and (usually) reach identifiers.
//!
//! Archives are read through libnetcdf, so netCDF-3 (classic, 64-bit offset)
//! and netCDF-4 files are both supported. Appending goes through a sibling
//! copy of the record, opened in append mode: the time coordinate and the
//! discharge matrix are written over their full extent, which grows the
//! unlimited dimension. The copy is then renamed over its destination.
use std::{
    fs::File,
    path::{Path, PathBuf},
};

use log::{debug, warn};
use ndarray::{Ix2, ShapeError};
use netcdf::types::{BasicType, VariableType};
use thiserror::Error;

use crate::{
    config::ArchiveConfig,
    dataset::{MergedDataset, TimeSeriesDataset, Timestamp},
    orientation::Axis,
};

/// Archive related errors
#[derive(Error, Debug)]
pub enum Error {
    #[error("i/o error")]
    IoError(#[from] std::io::Error),
    #[error("netCDF error: {0}")]
    NetCdf(#[from] netcdf::error::Error),
    #[error("missing variable \"{0}\"")]
    MissingVariable(String),
    #[error("variable \"{name}\" should have {expected} dimension(s), has {found}")]
    BadRank {
        name: String,
        expected: usize,
        found: usize,
    },
    #[error("variable \"{discharge}\" does not span the \"{time}\" dimension")]
    TimeDimensionNotUsed { discharge: String, time: String },
    #[error("\"{name}\" has an integer type and cannot store timestamp {value}")]
    NonIntegralTime { name: String, value: Timestamp },
    #[error("dimension \"{name}\" is fixed to {len} and cannot hold {steps} time steps")]
    FixedTimeDimension {
        name: String,
        len: usize,
        steps: usize,
    },
    #[error("archive holds {expected} reaches, merged dataset has {found}")]
    ReachCountChanged { expected: usize, found: usize },
    #[error("archive time axis is {expected}, merged dataset uses {found}")]
    OrientationChanged { expected: Axis, found: Axis },
    #[error("shape error: {0}")]
    Shape(#[from] ShapeError),
}

/// How the time coordinate is laid out in the file
#[derive(Debug, Clone, PartialEq)]
struct Layout {
    /// Name of the time dimension
    time_dim: String,
    /// Discharge axis spanned by the time dimension
    axis: Axis,
    /// Time dimension is unlimited
    unlimited: bool,
    /// Time variable has an integer type
    integral_time: bool,
}

/// A Qout archive. Its content is loaded on opening,
/// the file itself is only modified by [QoutArchive::store].
#[derive(Debug, Clone)]
pub struct QoutArchive {
    path: PathBuf,
    cfg: ArchiveConfig,
    layout: Layout,
    dataset: TimeSeriesDataset,
}

fn variable<'f>(file: &'f netcdf::File, name: &str) -> Result<netcdf::Variable<'f>, Error> {
    file.variable(name)
        .ok_or_else(|| Error::MissingVariable(name.to_string()))
}

fn ensure_rank(var: &netcdf::Variable, expected: usize) -> Result<(), Error> {
    let found = var.dimensions().len();
    if found != expected {
        return Err(Error::BadRank {
            name: var.name(),
            expected,
            found,
        });
    }
    Ok(())
}

fn is_integral(vartype: &VariableType) -> bool {
    !matches!(
        vartype,
        VariableType::Basic(BasicType::Float) | VariableType::Basic(BasicType::Double)
    )
}

impl QoutArchive {
    /// Opens the archive located at `path` and loads its content.
    /// The time axis declared by the file dimensions is attached
    /// to the [TimeSeriesDataset] as hint.
    pub fn open<P: AsRef<Path>>(path: P, cfg: &ArchiveConfig) -> Result<Self, Error> {
        let path = path.as_ref();
        debug!("loading \"{}\"", path.display());
        let file = netcdf::open(path)?;

        let time = variable(&file, &cfg.time_var)?;
        ensure_rank(&time, 1)?;
        let discharge = variable(&file, &cfg.discharge_var)?;
        ensure_rank(&discharge, 2)?;

        let time_dim = &time.dimensions()[0];
        let axis = match discharge
            .dimensions()
            .iter()
            .position(|dim| dim.name() == time_dim.name())
        {
            Some(0) => Axis::Rows,
            Some(_) => Axis::Columns,
            None => {
                return Err(Error::TimeDimensionNotUsed {
                    discharge: discharge.name(),
                    time: time_dim.name(),
                })
            },
        };
        let layout = Layout {
            time_dim: time_dim.name(),
            axis,
            unlimited: time_dim.is_unlimited(),
            integral_time: is_integral(&time.vartype()),
        };

        let timestamps = time.values::<f64>(None, None)?.into_raw_vec();
        let matrix = discharge
            .values::<f64>(None, None)?
            .into_dimensionality::<Ix2>()?;

        let reaches = match &cfg.reach_var {
            Some(name) => match file.variable(name) {
                Some(var) => {
                    ensure_rank(&var, 1)?;
                    Some(var.values::<i64>(None, None)?.into_raw_vec())
                },
                None => {
                    debug!("\"{}\": no \"{}\" variable", path.display(), name);
                    None
                },
            },
            None => None,
        };

        let (rows, cols) = matrix.dim();
        debug!(
            "\"{}\": {} time steps, discharge {}x{}, time along {} (\"{}\"{})",
            path.display(),
            timestamps.len(),
            rows,
            cols,
            axis,
            layout.time_dim,
            if layout.unlimited { ", unlimited" } else { "" },
        );

        Ok(Self {
            path: path.to_path_buf(),
            cfg: cfg.clone(),
            layout,
            dataset: TimeSeriesDataset {
                time: timestamps,
                discharge: matrix,
                reaches,
                time_axis_hint: Some(axis),
            },
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Content of the archive, as loaded
    pub fn dataset(&self) -> &TimeSeriesDataset {
        &self.dataset
    }

    /// Discharge axis spanned by the time dimension
    pub fn time_axis(&self) -> Axis {
        self.layout.axis
    }

    /// True when the time dimension is unlimited (the archive can grow)
    pub fn is_unlimited(&self) -> bool {
        self.layout.unlimited
    }

    /// Verifies that `merged` can be written into this archive layout
    fn check(&self, merged: &MergedDataset) -> Result<(), Error> {
        if self.layout.axis != merged.time_axis {
            return Err(Error::OrientationChanged {
                expected: self.layout.axis,
                found: merged.time_axis,
            });
        }
        let reaches = self
            .dataset
            .discharge
            .len_of(self.layout.axis.other().into());
        if reaches != merged.reach_count() {
            return Err(Error::ReachCountChanged {
                expected: reaches,
                found: merged.reach_count(),
            });
        }
        if !self.layout.unlimited && merged.steps() != self.dataset.steps() {
            return Err(Error::FixedTimeDimension {
                name: self.layout.time_dim.clone(),
                len: self.dataset.steps(),
                steps: merged.steps(),
            });
        }
        if self.layout.integral_time {
            if let Some(value) = merged.time.iter().find(|t| t.fract() != 0.0) {
                return Err(Error::NonIntegralTime {
                    name: self.cfg.time_var.clone(),
                    value: *value,
                });
            }
        }
        Ok(())
    }

    /// Writes `merged` into the file located at `path`, opened in append mode
    fn write(&self, path: &Path, merged: &MergedDataset) -> Result<(), Error> {
        let mut file = netcdf::append(path)?;

        if merged.appended > 0 {
            let padded = file
                .variables()
                .filter(|var| {
                    var.dimensions()
                        .iter()
                        .any(|dim| dim.name() == self.layout.time_dim)
                })
                .map(|var| var.name())
                .filter(|name| *name != self.cfg.time_var && *name != self.cfg.discharge_var)
                .collect::<Vec<_>>();
            for name in padded {
                warn!(
                    "\"{}\": \"{}\" spans the time dimension, padded with fill values",
                    self.path.display(),
                    name
                );
            }
        }

        let time_var = &self.cfg.time_var;
        file.variable_mut(time_var)
            .ok_or_else(|| Error::MissingVariable(time_var.clone()))?
            .put_values(&merged.time, Some(&[0]), Some(&[merged.steps()]))?;

        let (rows, cols) = merged.discharge.dim();
        let values = merged.discharge.iter().copied().collect::<Vec<f64>>();
        let discharge_var = &self.cfg.discharge_var;
        file.variable_mut(discharge_var)
            .ok_or_else(|| Error::MissingVariable(discharge_var.clone()))?
            .put_values(&values, Some(&[0, 0]), Some(&[rows, cols]))?;

        Ok(())
    }

    /// Stores `merged` into `path`. `merged` is validated against this
    /// archive first. The record is then copied to a hidden sibling of
    /// `path`, extended in place and renamed over `path`, so a failure
    /// leaves both the record and any previous content of `path` untouched.
    pub fn store<P: AsRef<Path>>(&self, merged: &MergedDataset, path: P) -> Result<(), Error> {
        self.check(merged)?;
        let path = path.as_ref();
        let tmp = temporary_path(path);
        let written = std::fs::copy(&self.path, &tmp)
            .map_err(Error::from)
            .and_then(|_| self.write(&tmp, merged))
            .and_then(|_| File::open(&tmp)?.sync_all().map_err(Error::from))
            .and_then(|_| std::fs::rename(&tmp, path).map_err(Error::from));
        if let Err(e) = written {
            let _ = std::fs::remove_file(&tmp);
            return Err(e);
        }
        debug!(
            "\"{}\": {} time steps written",
            path.display(),
            merged.steps()
        );
        Ok(())
    }

    /// Stores `merged` into the archive itself
    pub fn save(&self, merged: &MergedDataset) -> Result<(), Error> {
        self.store(merged, &self.path)
    }
}

/// Hidden sibling of `path`, used to write before renaming
pub(crate) fn temporary_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    path.with_file_name(format!(".{}.{}.tmp", name, std::process::id()))
}
