use std::path::{Path, PathBuf};

use ndarray::Array2;
use rand::{distributions::Alphanumeric, Rng};

use crate::{dataset::Timestamp, prelude::TimeSeriesDataset};

/// Random name, used to create unique scratch files
pub fn random_name(size: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(size)
        .map(char::from)
        .collect()
}

/// Creates a unique scratch directory
pub fn scratch_dir() -> PathBuf {
    let dir = std::env::temp_dir().join(format!("qout-{}", random_name(10)));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

/// Deterministic discharge of `reach` at time `t`, so merged content
/// can be verified value by value. Values remain exact in single precision,
/// eighths of a time unit are told apart.
pub fn discharge(t: Timestamp, reach: i64) -> f64 {
    (reach.rem_euclid(10_000) * 1000 + ((t * 8.0) as i64).rem_euclid(1000)) as f64
}

/// Time-major (time x reach) discharge matrix
pub fn time_major(time: &[Timestamp], reaches: &[i64]) -> Array2<f64> {
    Array2::from_shape_fn((time.len(), reaches.len()), |(i, j)| {
        discharge(time[i], reaches[j])
    })
}

/// Reach-major (reach x time) discharge matrix
pub fn reach_major(time: &[Timestamp], reaches: &[i64]) -> Array2<f64> {
    Array2::from_shape_fn((reaches.len(), time.len()), |(i, j)| {
        discharge(time[j], reaches[i])
    })
}

/// Time-major dataset, with reach identifiers
pub fn dataset(time: &[Timestamp], reaches: &[i64]) -> TimeSeriesDataset {
    TimeSeriesDataset::new(time.to_vec(), time_major(time, reaches)).with_reaches(reaches.to_vec())
}

/// Describes the Qout file to build
#[derive(Debug, Clone, Copy)]
pub struct QoutLayout {
    /// Qout is (time, rivid), otherwise (rivid, time)
    pub time_major: bool,
    /// time is the unlimited dimension
    pub unlimited: bool,
    /// rivid variable is present
    pub rivid: bool,
    /// Qout is stored in double precision, otherwise single precision
    pub double: bool,
    /// time is stored as integers, otherwise as doubles
    pub integral_time: bool,
}

impl Default for QoutLayout {
    fn default() -> Self {
        Self {
            time_major: true,
            unlimited: true,
            rivid: true,
            double: false,
            integral_time: true,
        }
    }
}

/// Writes a RAPID like Qout file (netCDF-4)
pub fn write_qout(path: &Path, time: &[Timestamp], reaches: &[i64], layout: QoutLayout) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    let mut file = netcdf::create(path).unwrap();
    file.add_attribute("title", "RAPID discharge").unwrap();

    if layout.unlimited {
        file.add_unlimited_dimension("time").unwrap();
    } else {
        file.add_dimension("time", time.len()).unwrap();
    }
    file.add_dimension("rivid", reaches.len()).unwrap();

    let (dims, matrix) = if layout.time_major {
        (["time", "rivid"], time_major(time, reaches))
    } else {
        (["rivid", "time"], reach_major(time, reaches))
    };
    let (rows, cols) = matrix.dim();
    let values = matrix.iter().copied().collect::<Vec<f64>>();
    if layout.double {
        let mut var = file.add_variable::<f64>("Qout", &dims).unwrap();
        var.add_attribute("units", "m3 s-1").unwrap();
        var.put_values(&values, Some(&[0, 0]), Some(&[rows, cols]))
            .unwrap();
    } else {
        let values = values.iter().map(|v| *v as f32).collect::<Vec<f32>>();
        let mut var = file.add_variable::<f32>("Qout", &dims).unwrap();
        var.add_attribute("units", "m3 s-1").unwrap();
        var.put_values(&values, Some(&[0, 0]), Some(&[rows, cols]))
            .unwrap();
    }

    if layout.integral_time {
        let values = time.iter().map(|t| *t as i32).collect::<Vec<i32>>();
        let mut var = file.add_variable::<i32>("time", &["time"]).unwrap();
        var.add_attribute("units", "seconds since 1970-01-01 00:00:00")
            .unwrap();
        var.put_values(&values, Some(&[0]), Some(&[time.len()]))
            .unwrap();
    } else {
        let mut var = file.add_variable::<f64>("time", &["time"]).unwrap();
        var.add_attribute("units", "days since 1970-01-01 00:00:00")
            .unwrap();
        var.put_values(time, Some(&[0]), Some(&[time.len()]))
            .unwrap();
    }

    if layout.rivid {
        let values = reaches.iter().map(|r| *r as i32).collect::<Vec<i32>>();
        let mut var = file.add_variable::<i32>("rivid", &["rivid"]).unwrap();
        var.put_values(&values, Some(&[0]), Some(&[reaches.len()]))
            .unwrap();
    }

    let mut var = file.add_variable::<f64>("lat", &["rivid"]).unwrap();
    var.add_attribute("long_name", "latitude").unwrap();
    var.put_values(&latitudes(reaches), Some(&[0]), Some(&[reaches.len()]))
        .unwrap();
}

/// Latitude of each reach, as written by [write_qout]
pub fn latitudes(reaches: &[i64]) -> Vec<f64> {
    reaches
        .iter()
        .map(|r| 35.0 + (r.rem_euclid(100) as f64) / 4.0)
        .collect()
}

/// Daily timestamps (seconds) of days `first..=last`
pub fn days(first: i64, last: i64) -> Vec<Timestamp> {
    (first..=last).map(|d| (d * 86_400) as f64).collect()
}

/// Verifies that `matrix` holds [discharge] values for
/// given time and reaches, in given orientation.
pub fn check_discharge(
    matrix: &Array2<f64>,
    time: &[Timestamp],
    reaches: &[i64],
    time_major: bool,
) {
    let expected = if time_major {
        self::time_major(time, reaches)
    } else {
        reach_major(time, reaches)
    };
    assert_eq!(matrix.dim(), expected.dim(), "bad discharge shape");
    assert_eq!(matrix, &expected, "bad discharge values");
}
