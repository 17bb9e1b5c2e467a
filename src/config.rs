//! Archive naming and variable conventions
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::merge::MergeOpts;

/// Describes how archives and additions are named and organized.
/// Defaults match the ERA-5 RAPID workflow.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ArchiveConfig {
    /// Prefix of both record and addition file names
    pub prefix: String,
    /// Prefix of simulation outputs, when discovering the simulation end date
    pub output_prefix: String,
    /// Annual record file name prefix, followed by the year
    pub annual_prefix: String,
    /// File name extension, without leading dot
    pub extension: String,
    /// Transient simulation artifacts start with this prefix
    pub transient_prefix: String,
    /// Name of the time coordinate variable
    pub time_var: String,
    /// Name of the discharge variable
    pub discharge_var: String,
    /// Name of the reach identifier variable, if any
    pub reach_var: Option<String>,
    /// Merge options
    pub merge: MergeOpts,
    /// Process regions in parallel
    pub parallel: bool,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            prefix: "Qout_era5".to_string(),
            output_prefix: "Qout".to_string(),
            annual_prefix: "Qout_era5_record_".to_string(),
            extension: "nc".to_string(),
            transient_prefix: "m3".to_string(),
            time_var: "time".to_string(),
            discharge_var: "Qout".to_string(),
            reach_var: Some("rivid".to_string()),
            merge: MergeOpts::default(),
            parallel: false,
        }
    }
}

impl ArchiveConfig {
    /// Copies and returns Self with given [MergeOpts]
    pub fn with_merge_opts(&self, merge: MergeOpts) -> Self {
        let mut s = self.clone();
        s.merge = merge;
        s
    }

    /// Copies and returns Self with parallel processing preference
    pub fn with_parallel(&self, parallel: bool) -> Self {
        let mut s = self.clone();
        s.parallel = parallel;
        s
    }

    /// ".nc" like suffix
    pub fn suffix(&self) -> String {
        format!(".{}", self.extension)
    }
}

#[cfg(all(test, feature = "serde"))]
mod test {
    use super::*;
    use crate::orientation::Axis;
    #[test]
    fn partial_json_config() {
        let content = r#"{
            "discharge_var": "qout",
            "reach_var": null,
            "merge": { "addition_axis": "columns" }
        }"#;
        let cfg: ArchiveConfig = serde_json::from_str(content).unwrap();
        assert_eq!(cfg.discharge_var, "qout");
        assert_eq!(cfg.reach_var, None);
        assert_eq!(cfg.prefix, "Qout_era5");
        assert_eq!(cfg.merge.addition_axis, Some(Axis::Columns));
        assert!(!cfg.merge.require_reach_ids);
    }
}
