//! Command line tool to append simulated discharge onto Qout archives.
//! Refer to README for command line arguments.

mod cli;

use std::{
    fs::{create_dir_all, File},
    path::{Path, PathBuf},
};

use cli::Cli;

use env_logger::{Builder, Target};
use hifitime::Epoch;

use qout_archive::{
    period::LastDateFile,
    prelude::{AppendRun, RunSummary, UpdateRun},
    workflow::append_file,
};

#[macro_use]
extern crate log;

#[macro_use]
extern crate lazy_static;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("i/o error")]
    StdioError(#[from] std::io::Error),
    #[error("archive error")]
    ArchiveError(#[from] qout_archive::Error),
    #[error("invalid configuration")]
    ConfigError(#[from] serde_json::Error),
    #[error("missing argument \"{0}\"")]
    MissingArgument(String),
    #[error("{0} region(s) failed")]
    RegionFailures(usize),
}

fn now() -> Epoch {
    Epoch::now().unwrap_or(Epoch::from_gregorian_utc_at_midnight(2000, 1, 1))
}

/// Log file name, for this mode and session
fn log_file_name(mode: &str, t: Epoch) -> String {
    let (y, m, d, hh, mm, _, _) = t.to_gregorian_utc();
    format!("{}_{:04}{:02}{:02}{:02}{:02}.log", mode, y, m, d, hh, mm)
}

/// Logs to stdout, or into a time stamped file within `logs`.
/// Defaults to info level, unless RUST_LOG says otherwise.
fn init_logger(mode: &str, logs: Option<&Path>) -> Result<(), Error> {
    let mut builder = Builder::new();
    builder
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .format_timestamp_secs()
        .format_module_path(false);

    match logs {
        Some(dir) => {
            create_dir_all(dir)?;
            let path = dir.join(log_file_name(mode, now()));
            let fd = File::create(&path)?;
            builder.target(Target::Pipe(Box::new(fd))).init();
            println!("logging into \"{}\"", path.display());
        },
        None => {
            builder.target(Target::Stdout).init();
        },
    }
    Ok(())
}

/// Last date file: given explicitly, otherwise kept next to the log files,
/// otherwise within the simulation tree.
fn last_date_file(explicit: Option<&Path>, logs: Option<&Path>, rapid_io: &Path) -> LastDateFile {
    match (explicit, logs) {
        (Some(path), _) => LastDateFile::new(path),
        (None, Some(logs)) => LastDateFile::within(logs),
        (None, None) => LastDateFile::within(rapid_io),
    }
}

/// Reports the run, fails in strict mode
fn conclude(summary: &RunSummary, strict: bool) -> Result<(), Error> {
    info!("{}", summary);
    println!("{}", summary);
    let failures = summary.failures().len();
    if failures > 0 {
        if strict {
            return Err(Error::RegionFailures(failures));
        }
        warn!("{} region(s) failed", failures);
    }
    Ok(())
}

pub fn main() -> Result<(), Error> {
    let cli = Cli::new();
    let (mode, matches) = cli
        .mode()
        .ok_or_else(|| Error::MissingArgument("mode".to_string()))?;

    let logs = Cli::logs(matches).map(|p| p.as_path());
    init_logger(mode, logs)?;

    let cfg = Cli::archive_config(matches)?;
    let strict = Cli::strict(matches);

    match mode {
        "append" => {
            let year = *matches
                .get_one::<i32>("year")
                .ok_or_else(|| Error::MissingArgument("year".to_string()))?;
            let records = Cli::path(matches, "records")?;
            let additions = Cli::path(matches, "additions")?;
            info!("appending {} onto \"{}\"", year, records.display());
            let summary = AppendRun::new(records, additions, year, &cfg).run()?;
            conclude(&summary, strict)
        },
        "update" => {
            let rapid_io = Cli::path(matches, "rapid-io")?;
            let records = Cli::path(matches, "records")?;
            let last_date = last_date_file(
                matches.get_one::<PathBuf>("last-date").map(|p| p.as_path()),
                logs,
                rapid_io,
            );
            info!("last date file: \"{}\"", last_date.path().display());
            info!(
                "updating \"{}\" from \"{}\"",
                records.display(),
                rapid_io.display()
            );
            let summary = UpdateRun::new(rapid_io, records, last_date, &cfg).run()?;
            conclude(&summary, strict)
        },
        "merge" => {
            let t0 = now();
            let record = Cli::path(matches, "record")?;
            let addition = Cli::path(matches, "addition")?;
            let output = matches.get_one::<PathBuf>("output");
            let outcome = append_file(record, addition, output.map(|p| p.as_path()), &cfg)?;
            println!("{}. Total runtime: {}", outcome, now() - t0);
            Ok(())
        },
        mode => Err(Error::MissingArgument(mode.to_string())),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    #[test]
    fn log_file_names() {
        let t = Epoch::from_gregorian_utc(2024, 3, 7, 9, 5, 0, 0);
        assert_eq!(log_file_name("append", t), "append_202403070905.log");
    }
    #[test]
    fn last_date_locations() {
        let rapid_io = Path::new("/data/rapid-io");
        let logs = Path::new("/data/logs");
        let explicit = Path::new("/tmp/last.txt");
        assert_eq!(
            last_date_file(Some(explicit), Some(logs), rapid_io).path(),
            explicit
        );
        assert_eq!(
            last_date_file(None, Some(logs), rapid_io).path(),
            Path::new("/data/logs/last_date_prev_sim.txt")
        );
        assert_eq!(
            last_date_file(None, None, rapid_io).path(),
            Path::new("/data/rapid-io/last_date_prev_sim.txt")
        );
    }
}
