use thiserror::Error;

use crate::{
    archive::Error as ArchiveError, locator::Error as LocatorError, merge::Error as MergeError,
    period::Error as PeriodError,
};

/// Errors that may rise while appending onto a record
#[derive(Error, Debug)]
pub enum Error {
    /// File system error
    #[error("i/o error: {0}")]
    IoError(#[from] std::io::Error),
    /// Record and addition cannot be merged
    #[error("merge error: {0}")]
    Merge(#[from] MergeError),
    /// Invalid Qout archive, or netCDF failure
    #[error("archive error: {0}")]
    Archive(#[from] ArchiveError),
    /// Record or addition not found
    #[error("{0}")]
    Locator(#[from] LocatorError),
    /// Invalid date or period
    #[error("{0}")]
    Period(#[from] PeriodError),
}
