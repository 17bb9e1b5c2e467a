//! Simulation periods and their `YYYYMMDD` representation
use std::{
    fmt,
    path::{Path, PathBuf},
};

use hifitime::{Epoch, Unit};
use log::debug;
use thiserror::Error;

/// Name of the file that keeps track of the last simulated day
pub const LAST_DATE_FILE: &str = "last_date_prev_sim.txt";

/// Period related errors
#[derive(Error, Debug)]
pub enum Error {
    #[error("i/o error")]
    IoError(#[from] std::io::Error),
    #[error("invalid date \"{0}\", expecting YYYYMMDD")]
    InvalidDate(String),
    #[error("period ends ({end}) before it starts ({start})")]
    Reversed { start: String, end: String },
}

/// Midnight UTC of the calendar day located `days` away from the day of `epoch`.
/// Steps from noon, so leap seconds never shift the calendar day.
fn shift_days(epoch: Epoch, days: i64) -> Epoch {
    let noon = epoch + Unit::Hour * 12_i64 + Unit::Day * days;
    let (y, m, d, _, _, _, _) = noon.to_gregorian_utc();
    Epoch::from_gregorian_utc_at_midnight(y, m, d)
}

/// Parses a `YYYYMMDD` calendar date, returns midnight UTC of that day
pub fn parse_yyyymmdd(content: &str) -> Result<Epoch, Error> {
    let content = content.trim();
    let invalid = || Error::InvalidDate(content.to_string());
    if content.len() != 8 || !content.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }
    let year = content[0..4].parse::<i32>().map_err(|_| invalid())?;
    let month = content[4..6].parse::<u8>().map_err(|_| invalid())?;
    let day = content[6..8].parse::<u8>().map_err(|_| invalid())?;
    Epoch::maybe_from_gregorian_utc(year, month, day, 0, 0, 0, 0).map_err(|_| invalid())
}

/// Formats the calendar day of given [Epoch] as `YYYYMMDD`
pub fn yyyymmdd(epoch: Epoch) -> String {
    let (y, m, d, _, _, _, _) = epoch.to_gregorian_utc();
    format!("{:04}{:02}{:02}", y, m, d)
}

/// A span of simulated days, both ends included
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationPeriod {
    pub start: Epoch,
    pub end: Epoch,
}

impl fmt::Display for SimulationPeriod {
    /// Formats as found in file names: `YYYYMMDDtoYYYYMMDD`
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}to{}", yyyymmdd(self.start), yyyymmdd(self.end))
    }
}

impl SimulationPeriod {
    pub fn new(start: Epoch, end: Epoch) -> Result<Self, Error> {
        if end < start {
            return Err(Error::Reversed {
                start: yyyymmdd(start),
                end: yyyymmdd(end),
            });
        }
        Ok(Self { start, end })
    }

    /// January 1st to December 31st of given year
    pub fn year(year: i32) -> Self {
        Self {
            start: Epoch::from_gregorian_utc_at_midnight(year, 1, 1),
            end: Epoch::from_gregorian_utc_at_midnight(year, 12, 31),
        }
    }

    /// Period that follows `last` simulated day. It can at most
    /// run until the end of the year it starts in.
    pub fn after(last: Epoch) -> Self {
        let start = shift_days(last, 1);
        let (y, _, _, _, _, _, _) = start.to_gregorian_utc();
        Self {
            start,
            end: Epoch::from_gregorian_utc_at_midnight(y, 12, 31),
        }
    }

    /// Copies and returns Self with a new end date
    pub fn with_end(&self, end: Epoch) -> Result<Self, Error> {
        Self::new(self.start, end)
    }

    /// Year this period starts in
    pub fn start_year(&self) -> i32 {
        let (y, _, _, _, _, _, _) = self.start.to_gregorian_utc();
        y
    }

    /// Last day of the previous period
    pub fn previous_end(&self) -> Epoch {
        shift_days(self.start, -1)
    }

    /// Number of simulated days
    pub fn days(&self) -> usize {
        ((self.end - self.start).to_unit(Unit::Day).round() as usize) + 1
    }
}

/// Bookkeeping file holding the last simulated day, as `YYYYMMDD`
#[derive(Debug, Clone)]
pub struct LastDateFile {
    path: PathBuf,
}

impl LastDateFile {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Default location within given directory
    pub fn within<P: AsRef<Path>>(dir: P) -> Self {
        Self::new(dir.as_ref().join(LAST_DATE_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn read(&self) -> Result<Epoch, Error> {
        let content = std::fs::read_to_string(&self.path)?;
        let epoch = parse_yyyymmdd(&content)?;
        debug!("last simulated day: {}", yyyymmdd(epoch));
        Ok(epoch)
    }

    pub fn write(&self, epoch: Epoch) -> Result<(), Error> {
        std::fs::write(&self.path, yyyymmdd(epoch))?;
        Ok(())
    }
}
