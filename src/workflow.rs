//! Region loops.
//!
//! [AppendRun] appends one year of simulation onto the multi-year
//! record of every region, [UpdateRun] appends the latest simulation
//! onto the annual records. Regions are independent: a failing region
//! is logged and reported, the remaining regions proceed.
use std::{
    fmt,
    path::{Path, PathBuf},
};

use hifitime::{Duration, Epoch};
use itertools::Itertools;
use log::{error, info, warn};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::{
    archive::QoutArchive,
    config::ArchiveConfig,
    housekeeping,
    locator::{self, Error as LocatorError, FileLocator},
    merge::merge_with,
    period::{yyyymmdd, LastDateFile, SimulationPeriod},
    Error,
};

fn now() -> Epoch {
    Epoch::now().unwrap_or(Epoch::from_gregorian_utc_at_midnight(2000, 1, 1))
}

/// Outcome of one record / addition merge
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AppendOutcome {
    /// Time steps in the stored record
    pub steps: usize,
    /// Addition time steps already present in the record
    pub overlap: usize,
    /// Time steps actually appended
    pub appended: usize,
}

impl fmt::Display for AppendOutcome {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} time steps appended ({} overlapping), {} in total",
            self.appended, self.overlap, self.steps
        )
    }
}

/// Appends `addition` onto `record` and stores the result into `output`,
/// or into `record` itself. Nothing is written unless the merge succeeded.
pub fn append_file(
    record: &Path,
    addition: &Path,
    output: Option<&Path>,
    cfg: &ArchiveConfig,
) -> Result<AppendOutcome, Error> {
    let archive = QoutArchive::open(record, cfg)?;
    let addition = QoutArchive::open(addition, cfg)?;

    let merged = merge_with(archive.dataset(), addition.dataset(), &cfg.merge)?;

    let output = output.unwrap_or(record);
    archive.store(&merged, output)?;

    let outcome = AppendOutcome {
        steps: merged.steps(),
        overlap: merged.overlap,
        appended: merged.appended,
    };
    info!("\"{}\": {}", output.display(), outcome);
    Ok(outcome)
}

/// What happened to one region
#[derive(Debug, Clone, PartialEq)]
pub enum RegionStatus {
    /// Addition appended onto an existing record
    Appended {
        record: PathBuf,
        outcome: AppendOutcome,
    },
    /// Record created from the addition
    Created { record: PathBuf },
    /// Region skipped
    Failed(String),
}

impl fmt::Display for RegionStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Appended { record, outcome } => {
                write!(f, "appended onto \"{}\": {}", record.display(), outcome)
            },
            Self::Created { record } => write!(f, "created \"{}\"", record.display()),
            Self::Failed(reason) => write!(f, "failed: {}", reason),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RegionReport {
    pub region: String,
    pub status: RegionStatus,
}

impl RegionReport {
    fn new(region: &str, result: Result<RegionStatus, Error>) -> Self {
        let status = match result {
            Ok(status) => {
                info!("{}: {}", region, status);
                status
            },
            Err(e) => {
                error!("{}: {}", region, e);
                RegionStatus::Failed(e.to_string())
            },
        };
        Self {
            region: region.to_string(),
            status,
        }
    }

    pub fn is_success(&self) -> bool {
        !matches!(self.status, RegionStatus::Failed(_))
    }
}

/// Aggregated run report
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Period that was appended
    pub period: SimulationPeriod,
    /// One report per region, in region order
    pub reports: Vec<RegionReport>,
    /// Wall clock time
    pub elapsed: Duration,
}

impl RunSummary {
    pub fn appended(&self) -> usize {
        self.reports
            .iter()
            .filter(|r| matches!(r.status, RegionStatus::Appended { .. }))
            .count()
    }

    pub fn created(&self) -> usize {
        self.reports
            .iter()
            .filter(|r| matches!(r.status, RegionStatus::Created { .. }))
            .count()
    }

    /// Regions that failed
    pub fn failures(&self) -> Vec<&RegionReport> {
        self.reports.iter().filter(|r| !r.is_success()).collect()
    }

    /// True when every region succeeded
    pub fn is_success(&self) -> bool {
        self.reports.iter().all(|r| r.is_success())
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}: {} region(s), {} appended, {} created, {} failed",
            self.period,
            self.reports.len(),
            self.appended(),
            self.created(),
            self.failures().len(),
        )?;
        let failures = self.failures();
        if !failures.is_empty() {
            write!(f, " ({})", failures.iter().map(|r| &r.region).join(", "))?;
        }
        write!(f, ". Total runtime: {}", self.elapsed)
    }
}

/// Runs `process` for every region, sequentially or in parallel.
/// Reports are returned in region order.
fn process_regions<F>(regions: &[String], parallel: bool, process: F) -> Vec<RegionReport>
where
    F: Fn(&str) -> Result<RegionStatus, Error> + Sync + Send,
{
    let run = |region: &String| {
        info!("{}: starting", region);
        RegionReport::new(region, process(region))
    };

    #[cfg(feature = "parallel")]
    {
        if parallel {
            return regions.par_iter().map(run).collect();
        }
    }

    #[cfg(not(feature = "parallel"))]
    {
        if parallel {
            warn!("built without parallel support: regions are processed sequentially");
        }
    }

    regions.iter().map(run).collect()
}

/// Appends one year of simulation onto the record of every region
#[derive(Debug, Clone)]
pub struct AppendRun {
    /// One sub-directory per region, holding its record
    pub records: PathBuf,
    /// One sub-directory per region, holding its addition
    pub additions: PathBuf,
    pub period: SimulationPeriod,
    pub cfg: ArchiveConfig,
}

impl AppendRun {
    pub fn new<P: AsRef<Path>, Q: AsRef<Path>>(
        records: P,
        additions: Q,
        year: i32,
        cfg: &ArchiveConfig,
    ) -> Self {
        Self {
            records: records.as_ref().to_path_buf(),
            additions: additions.as_ref().to_path_buf(),
            period: SimulationPeriod::year(year),
            cfg: cfg.clone(),
        }
    }

    /// Processes all regions of the records directory.
    /// Only fails if regions cannot be listed.
    pub fn run(&self) -> Result<RunSummary, Error> {
        let t0 = now();
        info!(
            "appending {} onto records ending {}",
            self.period,
            yyyymmdd(self.period.previous_end())
        );

        let regions = locator::regions(&self.records)?;
        if regions.is_empty() {
            warn!("no region found in \"{}\"", self.records.display());
        }

        let reports = process_regions(&regions, self.cfg.parallel, |region| self.region(region));

        let summary = RunSummary {
            period: self.period,
            reports,
            elapsed: now() - t0,
        };
        info!("{}", summary);
        Ok(summary)
    }

    /// Locates, merges, stores, renames and cleans up one region
    pub fn region(&self, region: &str) -> Result<RegionStatus, Error> {
        let locator = FileLocator::new(&self.cfg);
        let record = locator.record(&self.records, region, &self.period)?;
        let addition = locator.addition(&self.additions, region, &self.period)?;
        info!(
            "{}: record \"{}\", addition \"{}\"",
            region,
            record.display(),
            addition.display()
        );

        let outcome = append_file(&record, &addition, None, &self.cfg)?;

        let renamed = locator
            .renamed_record(&record, self.period.previous_end(), self.period.end)
            .unwrap_or_else(|| record.clone());
        housekeeping::rename_record(&record, &renamed)?;
        housekeeping::remove_addition(&addition)?;
        housekeeping::purge_transients(&self.additions.join(region), &self.cfg.transient_prefix)?;

        Ok(RegionStatus::Appended {
            record: renamed,
            outcome,
        })
    }
}

/// Appends the latest simulation onto the annual record of every region
#[derive(Debug, Clone)]
pub struct UpdateRun {
    /// RAPID i/o directory, with `input/<region>` and `output/<region>`
    pub rapid_io: PathBuf,
    /// One sub-directory per region, holding its annual records
    pub records: PathBuf,
    pub last_date: LastDateFile,
    pub cfg: ArchiveConfig,
}

impl UpdateRun {
    pub fn new<P: AsRef<Path>, Q: AsRef<Path>>(
        rapid_io: P,
        records: Q,
        last_date: LastDateFile,
        cfg: &ArchiveConfig,
    ) -> Self {
        Self {
            rapid_io: rapid_io.as_ref().to_path_buf(),
            records: records.as_ref().to_path_buf(),
            last_date,
            cfg: cfg.clone(),
        }
    }

    pub fn inputs(&self) -> PathBuf {
        self.rapid_io.join("input")
    }

    pub fn outputs(&self) -> PathBuf {
        self.rapid_io.join("output")
    }

    /// Determines the simulated period, processes every region, then
    /// updates the last date file. That file is left untouched when a
    /// region failed, so the next run covers it again.
    pub fn run(&self) -> Result<RunSummary, Error> {
        let t0 = now();

        let last = self.last_date.read()?;
        let expected = SimulationPeriod::after(last);
        info!(
            "last simulated day: {}, simulation starts {} and ends {} at most",
            yyyymmdd(last),
            yyyymmdd(expected.start),
            yyyymmdd(expected.end)
        );

        let regions = locator::regions(self.inputs())?;
        let first = regions
            .first()
            .ok_or_else(|| LocatorError::NoRegions(self.inputs()))?;

        let locator = FileLocator::new(&self.cfg);
        let simulated = locator.simulated_period(self.outputs(), first, expected.start)?;
        let period = expected.with_end(simulated.end)?;
        if period.end > expected.end {
            warn!(
                "simulation ends {}, past {}",
                yyyymmdd(period.end),
                yyyymmdd(expected.end)
            );
        }
        info!("simulated period: {} ({} days)", period, period.days());

        let reports = process_regions(&regions, self.cfg.parallel, |region| {
            self.region(region, &period)
        });

        let summary = RunSummary {
            period,
            reports,
            elapsed: now() - t0,
        };

        if summary.is_success() {
            self.last_date.write(period.end)?;
            info!(
                "\"{}\" now ends {}",
                self.last_date.path().display(),
                yyyymmdd(period.end)
            );
        } else {
            warn!(
                "{} region(s) failed: \"{}\" left untouched",
                summary.failures().len(),
                self.last_date.path().display()
            );
        }

        info!("{}", summary);
        Ok(summary)
    }

    /// Appends onto, or creates, the annual record of one region
    pub fn region(&self, region: &str, period: &SimulationPeriod) -> Result<RegionStatus, Error> {
        let locator = FileLocator::new(&self.cfg);
        let addition = locator.output(self.outputs(), region, period.end)?;
        let record = locator.annual_record(&self.records, region, period.start_year());
        info!(
            "{}: addition \"{}\", record \"{}\"",
            region,
            addition.display(),
            record.display()
        );

        if record.exists() {
            let outcome = append_file(&record, &addition, None, &self.cfg)?;
            Ok(RegionStatus::Appended { record, outcome })
        } else {
            info!(
                "{}: no {} record yet, creating it",
                region,
                period.start_year()
            );
            housekeeping::seed_record(&addition, &record)?;
            Ok(RegionStatus::Created { record })
        }
    }
}
