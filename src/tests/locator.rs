use std::path::Path;

use crate::{
    locator::{regions, Error, FileLocator},
    period::{parse_yyyymmdd, SimulationPeriod},
    prelude::ArchiveConfig,
    tests::toolkit::scratch_dir,
};

fn touch(path: &Path) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, b"").unwrap();
}

#[test]
fn region_listing() {
    let dir = scratch_dir();
    for region in ["south_america", "japan", "africa"] {
        std::fs::create_dir_all(dir.join(region)).unwrap();
    }
    touch(&dir.join("last_date_prev_sim.txt"));
    assert_eq!(
        regions(&dir).unwrap(),
        vec!["africa", "japan", "south_america"]
    );
    assert!(matches!(
        regions(dir.join("missing")),
        Err(Error::IoError(_))
    ));
    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn yearly_files() {
    let dir = scratch_dir();
    let records = dir.join("records");
    let additions = dir.join("additions");
    touch(&records.join("japan/Qout_era5_t640_24hr_19790101to20181231.nc"));
    touch(&records.join("japan/Qout_era5_t640_24hr_19790101to20171231.nc"));
    touch(&additions.join("japan/Qout_era5_t640_24hr_20190101to20191231.nc"));
    touch(&additions.join("japan/m3_riv_bas_era5_t640_24hr_20190101to20191231.nc"));
    touch(&additions.join("africa/Qout_era5_t640_24hr_20190101to20190630.nc"));

    let locator = FileLocator::new(&ArchiveConfig::default());
    let period = SimulationPeriod::year(2019);

    assert_eq!(
        locator.record(&records, "japan", &period).unwrap(),
        records.join("japan/Qout_era5_t640_24hr_19790101to20181231.nc")
    );
    assert_eq!(
        locator.addition(&additions, "japan", &period).unwrap(),
        additions.join("japan/Qout_era5_t640_24hr_20190101to20191231.nc")
    );

    match locator.addition(&additions, "africa", &period) {
        Err(Error::FileNotFound {
            region, pattern, ..
        }) => {
            assert_eq!(region, "africa");
            assert_eq!(pattern, "Qout_era5*20190101to20191231.nc");
        },
        other => panic!("unexpected {:?}", other),
    }
    assert!(matches!(
        locator.record(&records, "africa", &period),
        Err(Error::FileNotFound { .. })
    ));

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn simulation_outputs() {
    let dir = scratch_dir();
    touch(&dir.join("japan/Qout_era5_t640_24hr_20200615to20200830.nc"));
    touch(&dir.join("japan/Qout_era5_t640_24hr_20200101to20200614.nc"));
    touch(&dir.join("japan/m3_riv_bas_era5_t640_24hr_20200615to20200830.nc"));

    let locator = FileLocator::new(&ArchiveConfig::default());
    let start = parse_yyyymmdd("20200615").unwrap();
    let period = locator.simulated_period(&dir, "japan", start).unwrap();
    assert_eq!(period.to_string(), "20200615to20200830");

    assert_eq!(
        locator.output(&dir, "japan", period.end).unwrap(),
        dir.join("japan/Qout_era5_t640_24hr_20200615to20200830.nc")
    );

    let start = parse_yyyymmdd("20200901").unwrap();
    assert!(matches!(
        locator.simulated_period(&dir, "japan", start),
        Err(Error::FileNotFound { .. })
    ));

    std::fs::remove_dir_all(&dir).unwrap();
}
