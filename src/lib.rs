#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]

/*
 * qout-archive: multi-year river discharge records.
 * This framework is shipped under both Apache-2.0 and MIT License.
 */

#[macro_use]
extern crate lazy_static;

pub mod archive;
pub mod config;
pub mod dataset;
pub mod housekeeping;
pub mod locator;
pub mod merge;
pub mod orientation;
pub mod period;
pub mod workflow;

mod error;

#[cfg(test)]
mod tests;

pub use error::Error;

/// Package to include all basic structures
pub mod prelude {
    pub use crate::{
        archive::QoutArchive,
        config::ArchiveConfig,
        dataset::{MergedDataset, TimeSeriesDataset, Timestamp},
        locator::FileLocator,
        merge::{merge, merge_with, MergeOpts, Role},
        orientation::{Axis, TimeAxis},
        period::{LastDateFile, SimulationPeriod},
        workflow::{AppendRun, RegionReport, RegionStatus, RunSummary, UpdateRun},
        Error,
    };

    // pub re-export
    pub use hifitime::{Duration, Epoch};
    pub use ndarray::Array2;
}
