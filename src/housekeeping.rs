//! Post merge file operations.
//! These only run once the merged record has been stored.
use std::path::{Path, PathBuf};

use log::info;

use crate::archive::temporary_path;

/// Renames `record` to `renamed`
pub fn rename_record(record: &Path, renamed: &Path) -> std::io::Result<()> {
    if record != renamed {
        std::fs::rename(record, renamed)?;
        info!("renamed \"{}\" to \"{}\"", record.display(), renamed.display());
    }
    Ok(())
}

/// Deletes an addition that has been appended
pub fn remove_addition(addition: &Path) -> std::io::Result<()> {
    std::fs::remove_file(addition)?;
    info!("deleted \"{}\"", addition.display());
    Ok(())
}

/// Deletes the transient simulation artifacts of `dir`:
/// files whose name starts with `prefix`. Returns the deleted files.
pub fn purge_transients(dir: &Path, prefix: &str) -> std::io::Result<Vec<PathBuf>> {
    let mut deleted = Vec::new();
    if prefix.is_empty() {
        return Ok(deleted);
    }
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        if entry.file_name().to_string_lossy().starts_with(prefix) {
            let path = entry.path();
            std::fs::remove_file(&path)?;
            info!("deleted \"{}\"", path.display());
            deleted.push(path);
        }
    }
    deleted.sort();
    Ok(deleted)
}

/// Creates `record` as a copy of `addition`, creating its directory if need be.
/// The copy is renamed into place once complete.
pub fn seed_record(addition: &Path, record: &Path) -> std::io::Result<()> {
    if let Some(parent) = record.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let tmp = temporary_path(record);
    let copied = std::fs::copy(addition, &tmp).and_then(|_| std::fs::rename(&tmp, record));
    if copied.is_err() {
        let _ = std::fs::remove_file(&tmp);
    }
    copied?;
    info!("copied \"{}\" to \"{}\"", addition.display(), record.display());
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::tests::toolkit::scratch_dir;
    #[test]
    fn transient_purge() {
        let dir = scratch_dir();
        for name in [
            "m3_riv_bas_20190101to20191231.nc",
            "m3_riv_bas_20200101to20200131.nc",
            "Qout_era5_20190101to20191231.nc",
        ] {
            std::fs::write(dir.join(name), b"").unwrap();
        }
        std::fs::create_dir(dir.join("m3_kept")).unwrap();

        let deleted = purge_transients(&dir, "m3").unwrap();
        assert_eq!(deleted.len(), 2);
        assert_eq!(deleted[0], dir.join("m3_riv_bas_20190101to20191231.nc"));
        assert!(dir.join("Qout_era5_20190101to20191231.nc").exists());
        assert!(dir.join("m3_kept").is_dir());

        assert!(purge_transients(&dir, "").unwrap().is_empty());
        std::fs::remove_dir_all(&dir).unwrap();
    }
    #[test]
    fn record_seeding() {
        let dir = scratch_dir();
        let addition = dir.join("Qout_era5_20200101to20200131.nc");
        std::fs::write(&addition, b"CDF\x01").unwrap();
        let record = dir.join("records").join("japan").join("Qout_era5_record_2020.nc");

        seed_record(&addition, &record).unwrap();
        assert_eq!(std::fs::read(&record).unwrap(), b"CDF\x01");
        assert!(addition.exists());
        assert_eq!(std::fs::read_dir(record.parent().unwrap()).unwrap().count(), 1);

        let renamed = dir.join("records").join("japan").join("Qout_era5_record.nc");
        rename_record(&record, &renamed).unwrap();
        rename_record(&renamed, &renamed).unwrap();
        assert!(renamed.exists() && !record.exists());

        remove_addition(&addition).unwrap();
        assert!(remove_addition(&addition).is_err());
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
