//! Record and addition file discovery.
//!
//! Every region owns one sub-directory, both in the records directory
//! and in the additions (simulation output) directory. Within those,
//! files are identified by their prefix and by the dates embedded
//! at the end of their name:
//!
//! - records end with the last day they cover: `Qout_era5_<..>_20181231.nc`
//! - additions end with the period they cover: `Qout_era5_<..>_20190101to20191231.nc`
//! - annual records are named after their year: `Qout_era5_record_2019.nc`
use std::path::{Path, PathBuf};

use hifitime::Epoch;
use log::{debug, warn};
use regex::Regex;
use thiserror::Error;

use crate::{
    config::ArchiveConfig,
    period::{parse_yyyymmdd, yyyymmdd, Error as PeriodError, SimulationPeriod},
};

lazy_static! {
    /// `<start>to<end>.<ext>` file name tail
    static ref DATE_SPAN: Regex = Regex::new(r"(\d{8})to(\d{8})\.([A-Za-z0-9]+)$")
        .unwrap();
}

/// File discovery errors
#[derive(Error, Debug)]
pub enum Error {
    #[error("i/o error")]
    IoError(#[from] std::io::Error),
    #[error("{region}: no file matching \"{pattern}\" in \"{dir}\"")]
    FileNotFound {
        region: String,
        dir: PathBuf,
        pattern: String,
    },
    #[error("no region found in \"{0}\"")]
    NoRegions(PathBuf),
    #[error("\"{0}\" does not end with a date span")]
    NoDateSpan(String),
    #[error("period error: {0}")]
    Period(#[from] PeriodError),
}

/// Locates archives and additions following the naming
/// conventions of an [ArchiveConfig]
#[derive(Debug, Clone)]
pub struct FileLocator {
    cfg: ArchiveConfig,
}

/// Sorted sub-directory names of `dir`: one per region
pub fn regions<P: AsRef<Path>>(dir: P) -> Result<Vec<String>, Error> {
    let dir = dir.as_ref();
    let mut regions = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            regions.push(entry.file_name().to_string_lossy().to_string());
        }
    }
    regions.sort();
    debug!("\"{}\": {} region(s)", dir.display(), regions.len());
    Ok(regions)
}

/// Sorted file names of `dir`
fn file_names(dir: &Path) -> Result<Vec<String>, Error> {
    let mut names = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            names.push(entry.file_name().to_string_lossy().to_string());
        }
    }
    names.sort();
    Ok(names)
}

/// Parses the `<start>to<end>` span at the end of a file name
pub fn date_span(filename: &str) -> Result<SimulationPeriod, Error> {
    let caps = DATE_SPAN
        .captures(filename)
        .ok_or_else(|| Error::NoDateSpan(filename.to_string()))?;
    let start = parse_yyyymmdd(&caps[1])?;
    let end = parse_yyyymmdd(&caps[2])?;
    Ok(SimulationPeriod::new(start, end)?)
}

impl FileLocator {
    pub fn new(cfg: &ArchiveConfig) -> Self {
        Self { cfg: cfg.clone() }
    }

    /// Returns the single file of `dir/region` that matches `filter`.
    /// Several matches are reported and the first one (in name order) is kept.
    fn find<F: Fn(&str) -> bool>(
        &self,
        dir: &Path,
        region: &str,
        pattern: String,
        filter: F,
    ) -> Result<PathBuf, Error> {
        let dir = dir.join(region);
        let not_found = |dir: PathBuf, pattern: String| Error::FileNotFound {
            region: region.to_string(),
            dir,
            pattern,
        };
        if !dir.is_dir() {
            return Err(not_found(dir, pattern));
        }
        let matches = file_names(&dir)?
            .into_iter()
            .filter(|name| filter(name))
            .collect::<Vec<_>>();
        match matches.first() {
            Some(name) => {
                if matches.len() > 1 {
                    warn!(
                        "{}: {} files match \"{}\", using \"{}\"",
                        region,
                        matches.len(),
                        pattern,
                        name
                    );
                }
                Ok(dir.join(name))
            },
            None => Err(not_found(dir, pattern)),
        }
    }

    /// Record of `region` covering up to the day before `period` starts
    pub fn record<P: AsRef<Path>>(
        &self,
        records: P,
        region: &str,
        period: &SimulationPeriod,
    ) -> Result<PathBuf, Error> {
        let tail = format!("{}{}", yyyymmdd(period.previous_end()), self.cfg.suffix());
        let pattern = format!("{}*{}", self.cfg.prefix, tail);
        self.find(records.as_ref(), region, pattern, |name| {
            name.starts_with(&self.cfg.prefix) && name.ends_with(&tail)
        })
    }

    /// Addition of `region` covering exactly `period`
    pub fn addition<P: AsRef<Path>>(
        &self,
        additions: P,
        region: &str,
        period: &SimulationPeriod,
    ) -> Result<PathBuf, Error> {
        let tail = format!("{}{}", period, self.cfg.suffix());
        let pattern = format!("{}*{}", self.cfg.prefix, tail);
        self.find(additions.as_ref(), region, pattern, |name| {
            name.starts_with(&self.cfg.prefix) && name.ends_with(&tail)
        })
    }

    /// Simulation output of `region` ending on `end`
    pub fn output<P: AsRef<Path>>(
        &self,
        outputs: P,
        region: &str,
        end: Epoch,
    ) -> Result<PathBuf, Error> {
        let tail = format!("{}{}", yyyymmdd(end), self.cfg.suffix());
        let pattern = format!("{}*{}", self.cfg.output_prefix, tail);
        self.find(outputs.as_ref(), region, pattern, |name| {
            name.starts_with(&self.cfg.output_prefix) && name.ends_with(&tail)
        })
    }

    /// Discovers the period actually simulated for `region`, from the
    /// name of its simulation output that starts on `start`.
    pub fn simulated_period<P: AsRef<Path>>(
        &self,
        outputs: P,
        region: &str,
        start: Epoch,
    ) -> Result<SimulationPeriod, Error> {
        let head = format!("{}to", yyyymmdd(start));
        let pattern = format!("{}*{}*{}", self.cfg.output_prefix, head, self.cfg.suffix());
        let path = self.find(outputs.as_ref(), region, pattern, |name| {
            name.starts_with(&self.cfg.output_prefix)
                && name.contains(&head)
                && DATE_SPAN.is_match(name)
        })?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        date_span(&name)
    }

    /// Annual record of `region`, whether it exists or not
    pub fn annual_record<P: AsRef<Path>>(&self, records: P, region: &str, year: i32) -> PathBuf {
        records.as_ref().join(region).join(format!(
            "{}{}{}",
            self.cfg.annual_prefix,
            year,
            self.cfg.suffix()
        ))
    }

    /// New name of a record whose coverage now ends on `new_end`.
    /// Returns None if `record` does not end with `old_end`.
    pub fn renamed_record(&self, record: &Path, old_end: Epoch, new_end: Epoch) -> Option<PathBuf> {
        let name = record.file_name()?.to_string_lossy().to_string();
        let old_tail = format!("{}{}", yyyymmdd(old_end), self.cfg.suffix());
        let stem = name.strip_suffix(&old_tail)?;
        let new_name = format!("{}{}{}", stem, yyyymmdd(new_end), self.cfg.suffix());
        Some(record.with_file_name(new_name))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    #[test]
    fn date_span_parsing() {
        let span = date_span("Qout_era5_t640_24hr_19790101to19791231.nc").unwrap();
        assert_eq!(span.to_string(), "19790101to19791231");
        assert!(date_span("Qout_era5_t640_24hr_19790101to19791231.nc.bak").is_err());
        assert!(date_span("Qout_era5_record_2019.nc").is_err());
        assert!(date_span("Qout_19791231to19790101.nc").is_err());
    }
    #[test]
    fn record_renaming() {
        let locator = FileLocator::new(&ArchiveConfig::default());
        let path = Path::new("/data/japan/Qout_era5_t640_24hr_19790101to20181231.nc");
        let old = parse_yyyymmdd("20181231").unwrap();
        let new = parse_yyyymmdd("20191231").unwrap();
        assert_eq!(
            locator.renamed_record(path, old, new),
            Some(PathBuf::from(
                "/data/japan/Qout_era5_t640_24hr_19790101to20191231.nc"
            ))
        );
        assert_eq!(locator.renamed_record(path, new, new), None);
    }
    #[test]
    fn annual_record_naming() {
        let locator = FileLocator::new(&ArchiveConfig::default());
        assert_eq!(
            locator.annual_record("/records", "japan", 2020),
            PathBuf::from("/records/japan/Qout_era5_record_2020.nc")
        );
    }
}
