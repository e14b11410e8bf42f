//! Startup recovery of the size-backup counter from the existing file set.
//!
//! After a restart the engine must continue numbering where the previous
//! process stopped, so backups are neither overwritten nor misnumbered. The
//! counter is reconstructed purely by listing the log file's directory and
//! interpreting the names found there.

use std::fs;
use std::io;
use std::path::Path;

use itertools::process_results;

use crate::config::CountDirection;
use crate::naming;

/// Everything needed to interpret one directory worth of candidates.
pub(crate) struct BackupScan<'a> {
    /// File whose containing directory is listed.
    pub scan_path: &'a Path,
    /// The logical log file backups derive their names from.
    pub base_path: &'a Path,
    /// Formatted suffix of the current period, when date rolling is active.
    /// Entries from other periods must not influence the live counter.
    pub period_suffix: Option<&'a str>,
    pub static_log_file_name: bool,
    pub count_direction: CountDirection,
    pub max_size_roll_backups: i32,
}

/// Reconstruct the highest in-use backup index for the current period.
///
/// A directory that cannot be listed yields 0: the engine will surface any
/// real problem as soon as it opens the active file.
pub(crate) fn recover_backup_count(scan: &BackupScan<'_>) -> i32 {
    match try_recover(scan) {
        Ok(count) => count,
        Err(err) => {
            tracing::debug!(error = %err, "backup scan failed, counter starts at 0");
            0
        }
    }
}

fn try_recover(scan: &BackupScan<'_>) -> io::Result<i32> {
    let dir = match scan.scan_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let base_name = match scan.base_path.file_name().and_then(|name| name.to_str()) {
        Some(name) => name.to_lowercase(),
        None => return Ok(0),
    };
    // Comparisons are case-insensitive, so the period prefix is lowered the
    // same way the entry names are.
    let period_prefix = scan
        .period_suffix
        .map(|suffix| format!("{}{}", base_name, suffix.to_lowercase()));

    process_results(fs::read_dir(dir)?, |entries| {
        entries
            // Entries that are not valid UTF-8 cannot carry a `.N` suffix.
            .filter_map(|entry| entry.file_name().to_str().map(str::to_lowercase))
            .filter_map(|name| {
                backup_index(
                    &name,
                    &base_name,
                    period_prefix.as_deref(),
                    scan.static_log_file_name,
                )
            })
            .fold(0, |current, index| {
                adopt(
                    current,
                    index,
                    scan.count_direction,
                    scan.max_size_roll_backups,
                )
            })
    })
}

/// Interpret one (lowercased) directory entry; `Some(n)` when it is a live
/// backup whose index should be considered.
fn backup_index(
    name: &str,
    base_name: &str,
    period_prefix: Option<&str>,
    static_log_file_name: bool,
) -> Option<i32> {
    if !name.starts_with(base_name) || name == base_name {
        return None;
    }
    let (stem, digits) = naming::split_trailing(name)?;
    // With a static active file name, a size backup is exactly `base.N`;
    // anything between the base name and the final `.` is some unrelated
    // file that merely shares the prefix.
    if static_log_file_name && stem != base_name {
        return None;
    }
    if let Some(prefix) = period_prefix {
        if !name.starts_with(prefix) {
            tracing::debug!(file = name, "ignoring backup from a different date period");
            return None;
        }
    }
    match digits.parse() {
        Ok(index) => Some(index),
        Err(_) => {
            tracing::debug!(file = name, "backup suffix is not an index, skipping");
            None
        }
    }
}

/// The counter-update rule: adopt the larger index when retention allows it.
fn adopt(current: i32, index: i32, direction: CountDirection, max_backups: i32) -> i32 {
    if index <= current || max_backups == 0 {
        return current;
    }
    if max_backups < 0 || direction == CountDirection::Ascending || index <= max_backups {
        index
    } else {
        current
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;

    use tempfile::tempdir;

    use super::*;

    fn scan_static(dir: &Path, max_backups: i32, direction: CountDirection) -> i32 {
        let base = dir.join("app.log");
        recover_backup_count(&BackupScan {
            scan_path: &base,
            base_path: &base,
            period_suffix: None,
            static_log_file_name: true,
            count_direction: direction,
            max_size_roll_backups: max_backups,
        })
    }

    #[test]
    fn adopts_the_highest_existing_index() {
        let dir = tempdir().unwrap();
        for name in &["app.log", "app.log.1", "app.log.2", "app.log.3"] {
            fs::write(dir.path().join(name), b"x").unwrap();
        }
        assert_eq!(scan_static(dir.path(), 5, CountDirection::Descending), 3);
    }

    #[test]
    fn capped_descending_ignores_indices_beyond_the_cap() {
        let dir = tempdir().unwrap();
        for name in &["app.log.2", "app.log.9"] {
            fs::write(dir.path().join(name), b"x").unwrap();
        }
        assert_eq!(scan_static(dir.path(), 5, CountDirection::Descending), 2);
    }

    #[test]
    fn ascending_adopts_indices_beyond_the_cap() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("app.log.9"), b"x").unwrap();
        assert_eq!(scan_static(dir.path(), 5, CountDirection::Ascending), 9);
    }

    #[test]
    fn unbounded_retention_adopts_everything() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("app.log.40"), b"x").unwrap();
        assert_eq!(scan_static(dir.path(), -1, CountDirection::Descending), 40);
    }

    #[test]
    fn zero_retention_counts_nothing() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("app.log.1"), b"x").unwrap();
        assert_eq!(scan_static(dir.path(), 0, CountDirection::Descending), 0);
    }

    #[test]
    fn skips_files_that_merely_share_the_prefix() {
        let dir = tempdir().unwrap();
        for name in &["app.log2.7", "app.log.old", "app.log"] {
            fs::write(dir.path().join(name), b"x").unwrap();
        }
        assert_eq!(scan_static(dir.path(), 5, CountDirection::Descending), 0);
    }

    #[test]
    fn comparison_is_case_insensitive() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("App.LOG.4"), b"x").unwrap();
        assert_eq!(scan_static(dir.path(), 5, CountDirection::Descending), 4);
    }

    #[test]
    fn stale_periods_do_not_influence_the_counter() {
        let dir = tempdir().unwrap();
        for name in &["app.log.2024-05-01.3", "app.log.2024-05-02.1"] {
            fs::write(dir.path().join(name), b"x").unwrap();
        }
        let scheduled = dir.path().join("app.log.2024-05-02");
        let base = dir.path().join("app.log");
        let count = recover_backup_count(&BackupScan {
            scan_path: &scheduled,
            base_path: &base,
            period_suffix: Some(".2024-05-02"),
            static_log_file_name: false,
            count_direction: CountDirection::Ascending,
            max_size_roll_backups: -1,
        });
        assert_eq!(count, 1);
    }

    #[test]
    fn missing_directory_yields_zero() {
        let base = Path::new("/definitely/not/here/app.log");
        let count = recover_backup_count(&BackupScan {
            scan_path: base,
            base_path: base,
            period_suffix: None,
            static_log_file_name: true,
            count_direction: CountDirection::Descending,
            max_size_roll_backups: 5,
        });
        assert_eq!(count, 0);
    }
}
