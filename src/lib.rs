//! Size- and calendar-based log file rotation behind a single
//! [`std::io::Write`] implementor.
//!
//! A [`RollingFile`] owns the active log file and decides, on every write,
//! whether the file must first be rotated: because it grew past a size
//! threshold, because a calendar boundary (minute, hour, half-day, day,
//! week, month) was crossed, or both. The calendar granularity is inferred
//! from the configured date pattern itself, so `.%Y-%m-%d` automatically
//! means daily rotation. On startup the existing file set is scanned and the
//! backup numbering continues where the previous process stopped.
//!
//! ```no_run
//! use std::io::Write;
//! use log_rollover::{RollingConfig, RollingFile, RollingStyle};
//!
//! let config = RollingConfig::new("logs/app.log")
//!     .max_file_size(5 * 1024 * 1024)
//!     .max_size_roll_backups(3)
//!     .rolling_style(RollingStyle::Composite);
//! let mut log = RollingFile::new(config)?;
//! writeln!(log, "engine started")?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![warn(
    missing_docs,
    missing_debug_implementations,
    missing_copy_implementations
)]

use std::fmt;
use std::fs;
use std::io::{self, prelude::*};
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;

mod boundary;
mod clock;
mod config;
mod error;
mod naming;
mod scanner;

pub use boundary::RollPoint;
pub use clock::{Clock, SystemClock};
pub use config::{
    parse_file_size, CountDirection, RollingConfig, RollingStyle, DEFAULT_DATE_PATTERN,
    DEFAULT_MAX_FILE_SIZE,
};
pub use error::{ErrorSink, RollError, TracingSink};

/// A log file that rotates itself as it is written to.
///
/// All rotation state is owned here and mutated only under `&mut self`, so a
/// single instance is inherently serialized; callers that share one across
/// threads wrap it in their own lock.
pub struct RollingFile {
    config: RollingConfig,
    clock: Box<dyn Clock>,
    sink: Box<dyn ErrorSink>,

    /// Last observed time snapshot; refreshed at activation and whenever a
    /// date rollover fires.
    now: NaiveDateTime,
    roll_point: Option<RollPoint>,
    /// Next instant a date rollover is due; `None` means never.
    next_check: Option<NaiveDateTime>,
    /// The name the next date backup will use; doubles as the guard against
    /// rotating twice within one period.
    scheduled: Option<PathBuf>,
    cur_size_roll_backups: i32,

    file: Option<fs::File>,
    /// The physical path currently open.
    active_path: PathBuf,
    /// `active_path` minus any trailing `.N`; size backups of the active
    /// file are numbered against this.
    unindexed_path: PathBuf,
    /// Byte count of the open file.
    written: u64,
}

impl RollingFile {
    /// Open (or create) the configured log file, recovering rotation state
    /// from whatever backups already exist on disk.
    pub fn new(config: RollingConfig) -> Result<Self, RollError> {
        Self::with_clock_and_sink(config, SystemClock, TracingSink)
    }

    /// Like [`RollingFile::new`], with an explicit time source and error
    /// sink, for deterministic tests or to route rotation errors somewhere
    /// other than [`tracing`].
    pub fn with_clock_and_sink<C, S>(
        config: RollingConfig,
        clock: C,
        sink: S,
    ) -> Result<Self, RollError>
    where
        C: Clock + 'static,
        S: ErrorSink + 'static,
    {
        let mut rolling = RollingFile {
            active_path: config.base_path.clone(),
            unindexed_path: config.base_path.clone(),
            config,
            clock: Box::new(clock),
            sink: Box::new(sink),
            now: NaiveDateTime::default(),
            roll_point: None,
            next_check: None,
            scheduled: None,
            cur_size_roll_backups: 0,
            file: None,
            written: 0,
        };
        rolling.activate()?;
        Ok(rolling)
    }

    /// The physical path currently being written to.
    pub fn path(&self) -> &Path {
        &self.active_path
    }

    /// The settings this file was opened with.
    pub fn config(&self) -> &RollingConfig {
        &self.config
    }

    fn roll_on_date(&self) -> bool {
        self.config.rolling_style.roll_on_date()
    }

    fn roll_on_size(&self) -> bool {
        self.config.rolling_style.roll_on_size()
    }

    /// `base_path` plus the date suffix for `t`; `None` without a pattern.
    fn dated_name(&self, t: NaiveDateTime) -> Option<PathBuf> {
        let pattern = self.config.date_pattern.as_deref()?;
        Some(naming::suffixed(
            &self.config.base_path,
            &boundary::suffix(t, pattern),
        ))
    }

    /// Establish initial state: infer the roll point, recover the backup
    /// counter from disk, force a rollover if the active file is left over
    /// from a prior period, and open the active file for appending.
    fn activate(&mut self) -> Result<(), RollError> {
        self.now = self.clock.now();
        if self.roll_on_date() {
            match self.config.date_pattern.clone() {
                Some(pattern) => {
                    boundary::validate_pattern(&pattern)?;
                    self.roll_point = boundary::infer_roll_point(&pattern);
                    self.next_check = self
                        .roll_point
                        .map(|roll_point| boundary::next_boundary(self.now, roll_point));
                    self.scheduled = self.dated_name(self.now);
                }
                None => self.sink.report(&RollError::MissingDatePattern),
            }
        }
        self.recover_backup_count();
        self.roll_over_if_date_boundary_crossing();
        if self.file.is_none() {
            self.open_active(true)
                .map_err(|err| error::fs_err("open", self.active_path.clone(), err))?;
        }
        Ok(())
    }

    fn recover_backup_count(&mut self) {
        let scan_path = if self.config.static_log_file_name || !self.roll_on_date() {
            self.config.base_path.clone()
        } else {
            self.scheduled
                .clone()
                .unwrap_or_else(|| self.config.base_path.clone())
        };
        let period_suffix = if self.roll_on_date() {
            self.config
                .date_pattern
                .as_deref()
                .map(|pattern| boundary::suffix(self.now, pattern))
        } else {
            None
        };
        self.cur_size_roll_backups = scanner::recover_backup_count(&scanner::BackupScan {
            scan_path: &scan_path,
            base_path: &self.config.base_path,
            period_suffix: period_suffix.as_deref(),
            static_log_file_name: self.config.static_log_file_name,
            count_direction: self.config.count_direction,
            max_size_roll_backups: self.config.max_size_roll_backups,
        });
        tracing::debug!(
            count = self.cur_size_roll_backups,
            "size backup counter recovered"
        );
    }

    /// If the active file was last written in an earlier period, roll it
    /// before the first new record lands, naming the backup after the stale
    /// period rather than the current one.
    fn roll_over_if_date_boundary_crossing(&mut self) {
        if !self.config.static_log_file_name || !self.roll_on_date() {
            return;
        }
        let pattern = match self.config.date_pattern.clone() {
            Some(pattern) => pattern,
            None => return,
        };
        let modified = match fs::metadata(&self.config.base_path).and_then(|meta| meta.modified())
        {
            Ok(modified) => modified,
            // No active file yet, nothing to roll.
            Err(_) => return,
        };
        let modified = chrono::DateTime::<chrono::Local>::from(modified).naive_local();
        let stale = boundary::suffix(modified, &pattern);
        if stale != boundary::suffix(self.now, &pattern) {
            tracing::debug!(
                suffix = %stale,
                "active file was last written in a prior period"
            );
            self.scheduled = Some(naming::suffixed(&self.config.base_path, &stale));
            self.roll_over_date();
        }
    }

    /// Run the per-write trigger checks. Date first; then size, against
    /// whatever file is active afterwards.
    fn check_rollovers(&mut self) {
        if self.roll_on_date() {
            let now = self.clock.now();
            if let Some(check) = self.next_check {
                if now >= check {
                    self.now = now;
                    self.next_check = self
                        .roll_point
                        .map(|roll_point| boundary::next_boundary(now, roll_point));
                    self.roll_over_date();
                }
            }
        }
        if self.roll_on_size() && self.file.is_some() && self.written >= self.config.max_file_size
        {
            self.roll_over_size();
        }
    }

    /// Rotate because a calendar boundary was crossed: move the active file
    /// and its size backups under the scheduled period name, then start a
    /// fresh file and a fresh counter.
    fn roll_over_date(&mut self) {
        let candidate = match self.dated_name(self.now) {
            Some(path) => path,
            None => {
                self.sink.report(&RollError::MissingDatePattern);
                return;
            }
        };
        if self.config.static_log_file_name {
            if self.scheduled.as_ref() == Some(&candidate) {
                self.sink.report(&RollError::RedundantRollover {
                    scheduled: candidate,
                });
                return;
            }
            let scheduled = match self.scheduled.clone() {
                Some(scheduled) => scheduled,
                None => candidate.clone(),
            };
            self.file = None;
            for index in 1..=self.cur_size_roll_backups {
                self.roll_file(
                    &naming::indexed(&self.config.base_path, index),
                    &naming::indexed(&scheduled, index),
                );
            }
            self.roll_file(&self.config.base_path, &scheduled);
        } else {
            self.file = None;
        }
        self.cur_size_roll_backups = 0;
        self.scheduled = Some(candidate);
        if let Err(err) = self.open_active(false) {
            // An appender with no writable active file cannot keep logging;
            // the next write retries and surfaces the failure to the caller.
            self.sink
                .report(&error::fs_err("open", self.active_path.clone(), err));
            self.file = None;
        }
    }

    /// Rotate because the active file reached the size threshold.
    fn roll_over_size(&mut self) {
        tracing::debug!(
            written = self.written,
            backups = self.cur_size_roll_backups,
            "rolling over on size"
        );
        self.file = None;
        let max_backups = self.config.max_size_roll_backups;
        if max_backups != 0 {
            match self.config.count_direction {
                CountDirection::Descending => {
                    if self.cur_size_roll_backups == max_backups {
                        self.delete_file(&naming::indexed(&self.unindexed_path, max_backups));
                        self.cur_size_roll_backups -= 1;
                    }
                    // Highest index first, so no rename lands on a live file.
                    for index in (1..=self.cur_size_roll_backups).rev() {
                        self.roll_file(
                            &naming::indexed(&self.unindexed_path, index),
                            &naming::indexed(&self.unindexed_path, index + 1),
                        );
                    }
                    self.cur_size_roll_backups += 1;
                    self.roll_file(&self.active_path, &naming::indexed(&self.unindexed_path, 1));
                }
                CountDirection::Ascending => {
                    if self.cur_size_roll_backups >= max_backups && max_backups > 0 {
                        self.delete_file(&naming::indexed(
                            &self.unindexed_path,
                            self.cur_size_roll_backups - max_backups + 1,
                        ));
                    }
                    if self.config.static_log_file_name {
                        self.cur_size_roll_backups += 1;
                        self.roll_file(
                            &self.active_path,
                            &naming::indexed(&self.unindexed_path, self.cur_size_roll_backups),
                        );
                    }
                }
            }
        }
        if let Err(err) = self.open_active(false) {
            self.sink
                .report(&error::fs_err("open", self.active_path.clone(), err));
            self.file = None;
        }
    }

    /// Open the active file, recomputing its name for non-static
    /// configurations and priming the byte counter.
    fn open_active(&mut self, append: bool) -> io::Result<()> {
        let mut path = self.config.base_path.clone();
        if !self.config.static_log_file_name {
            if self.roll_on_date() {
                if let Some(dated) = self.dated_name(self.now) {
                    path = dated;
                }
            }
            self.unindexed_path = path.clone();
            if self.config.count_direction == CountDirection::Ascending {
                self.cur_size_roll_backups += 1;
                path = naming::indexed(&path, self.cur_size_roll_backups);
            }
            self.scheduled = Some(path.clone());
        } else {
            self.unindexed_path = path.clone();
        }
        self.active_path = path;

        let mut options = fs::OpenOptions::new();
        options.create(true);
        if append {
            options.append(true);
        } else {
            options.write(true).truncate(true);
        }
        let file = options.open(&self.active_path)?;
        self.written = if append {
            file.metadata().map(|meta| meta.len()).unwrap_or(0)
        } else {
            0
        };
        self.file = Some(file);
        Ok(())
    }

    /// Reopen the current path if a failed rotation left us without a file.
    fn active_file(&mut self) -> io::Result<&mut fs::File> {
        if self.file.is_none() {
            let file = fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.active_path)?;
            self.written = file.metadata().map(|meta| meta.len()).unwrap_or(0);
            self.file = Some(file);
        }
        Ok(self
            .file
            .as_mut()
            .expect("should've been opened just above"))
    }

    /// Best-effort move, deleting any pre-existing target first. Failures
    /// are reported and absorbed so the remaining rotation steps still run.
    fn roll_file(&self, from: &Path, to: &Path) {
        if to.exists() {
            tracing::debug!(path = %to.display(), "deleting existing rotation target");
            if let Err(err) = fs::remove_file(to) {
                self.sink
                    .report(&error::fs_err("remove", to.to_path_buf(), err));
            }
        }
        if !from.exists() {
            tracing::debug!(
                from = %from.display(),
                "rotation source does not exist, nothing to move"
            );
            return;
        }
        match fs::rename(from, to) {
            Ok(()) => {
                tracing::debug!(from = %from.display(), to = %to.display(), "moved backup")
            }
            Err(err) => self
                .sink
                .report(&error::fs_err("rename", from.to_path_buf(), err)),
        }
    }

    /// Best-effort delete; a missing file is not an error.
    fn delete_file(&self, path: &Path) {
        match fs::remove_file(path) {
            Ok(()) => tracing::debug!(path = %path.display(), "deleted backup"),
            Err(ref err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => self
                .sink
                .report(&error::fs_err("remove", path.to_path_buf(), err)),
        }
    }
}

impl Write for RollingFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.check_rollovers();
        let file = self.active_file()?;
        let written = file.write(buf)?;
        self.written += written as u64;
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.active_file()?.flush()
    }
}

impl fmt::Debug for RollingFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RollingFile")
            .field("config", &self.config)
            .field("active_path", &self.active_path)
            .field("next_check", &self.next_check)
            .field("scheduled", &self.scheduled)
            .field("cur_size_roll_backups", &self.cur_size_roll_backups)
            .field("written", &self.written)
            .finish()
    }
}
