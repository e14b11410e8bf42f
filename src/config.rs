//! Rotation settings, fixed once the file is opened.

use std::path::{Path, PathBuf};

use crate::error::RollError;

/// Default size threshold: 10 MiB.
pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Default date pattern: one period per day.
pub const DEFAULT_DATE_PATTERN: &str = ".%Y-%m-%d";

/// What triggers a rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RollingStyle {
    /// Rotate on file size only.
    Size,
    /// Rotate on calendar boundaries only.
    Date,
    /// Rotate on whichever of the two fires first.
    Composite,
}

impl RollingStyle {
    /// Whether size-based rotation is active.
    pub fn roll_on_size(self) -> bool {
        matches!(self, RollingStyle::Size | RollingStyle::Composite)
    }

    /// Whether date-based rotation is active.
    pub fn roll_on_date(self) -> bool {
        matches!(self, RollingStyle::Date | RollingStyle::Composite)
    }
}

/// How size-backup indices relate to age.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountDirection {
    /// `.1` is always the newest backup; older backups are renumbered upward
    /// on every rotation.
    Descending,
    /// Indices grow with creation order; existing backups are never renamed.
    Ascending,
}

/// Settings for a [`RollingFile`](crate::RollingFile).
///
/// Built by chaining, in the usual way:
///
/// ```
/// use log_rollover::{CountDirection, RollingConfig, RollingStyle};
///
/// let config = RollingConfig::new("logs/app.log")
///     .rolling_style(RollingStyle::Size)
///     .max_file_size(1024 * 1024)
///     .max_size_roll_backups(5)
///     .count_direction(CountDirection::Descending);
/// ```
#[derive(Debug, Clone)]
pub struct RollingConfig {
    pub(crate) base_path: PathBuf,
    pub(crate) date_pattern: Option<String>,
    pub(crate) max_file_size: u64,
    pub(crate) max_size_roll_backups: i32,
    pub(crate) count_direction: CountDirection,
    pub(crate) rolling_style: RollingStyle,
    pub(crate) static_log_file_name: bool,
}

impl RollingConfig {
    /// Settings for rotating the log file at `path`, defaulting to composite
    /// rotation (daily pattern, 10 MiB threshold), no size-backup retention,
    /// descending numbering, and a static active file name.
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        RollingConfig {
            base_path: path.into(),
            date_pattern: Some(DEFAULT_DATE_PATTERN.to_owned()),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            max_size_roll_backups: 0,
            count_direction: CountDirection::Descending,
            rolling_style: RollingStyle::Composite,
            static_log_file_name: true,
        }
    }

    /// Set the strftime pattern that both names date backups and determines
    /// the rotation granularity (inferred from which boundary changes the
    /// formatted string).
    pub fn date_pattern<S: Into<String>>(mut self, pattern: S) -> Self {
        self.date_pattern = Some(pattern.into());
        self
    }

    /// Clear the date pattern entirely.
    pub fn no_date_pattern(mut self) -> Self {
        self.date_pattern = None;
        self
    }

    /// Set the byte threshold for size-based rotation.
    pub fn max_file_size(mut self, bytes: u64) -> Self {
        self.max_file_size = bytes;
        self
    }

    /// Set the cap on size backups: `0` keeps none (the file is truncated in
    /// place), a negative value keeps all, a positive value is a hard cap.
    pub fn max_size_roll_backups(mut self, count: i32) -> Self {
        self.max_size_roll_backups = count;
        self
    }

    /// Set how backup indices are assigned.
    pub fn count_direction(mut self, direction: CountDirection) -> Self {
        self.count_direction = direction;
        self
    }

    /// Set which triggers are active.
    pub fn rolling_style(mut self, style: RollingStyle) -> Self {
        self.rolling_style = style;
        self
    }

    /// When `true` (the default) the active file always lives at the base
    /// path and the date suffix only appears on rotated backups; when
    /// `false` the active file path itself carries the suffix.
    pub fn static_log_file_name(mut self, is_static: bool) -> Self {
        self.static_log_file_name = is_static;
        self
    }

    /// The logical log file path.
    pub fn path(&self) -> &Path {
        &self.base_path
    }
}

/// Parse a human-readable file size: either bare bytes (`"1048576"`) or a
/// number with a `KB`, `MB` or `GB` suffix, case-insensitively.
pub fn parse_file_size(value: &str) -> Result<u64, RollError> {
    let upper = value.trim().to_ascii_uppercase();
    let (digits, multiplier) = if let Some(rest) = upper.strip_suffix("KB") {
        (rest, 1024)
    } else if let Some(rest) = upper.strip_suffix("MB") {
        (rest, 1024 * 1024)
    } else if let Some(rest) = upper.strip_suffix("GB") {
        (rest, 1024 * 1024 * 1024)
    } else {
        (upper.as_str(), 1)
    };
    digits
        .trim()
        .parse::<u64>()
        .ok()
        .and_then(|n| n.checked_mul(multiplier))
        .ok_or_else(|| RollError::InvalidFileSize {
            value: value.to_owned(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn styles_derive_their_trigger_flags() {
        assert!(RollingStyle::Size.roll_on_size());
        assert!(!RollingStyle::Size.roll_on_date());
        assert!(!RollingStyle::Date.roll_on_size());
        assert!(RollingStyle::Date.roll_on_date());
        assert!(RollingStyle::Composite.roll_on_size());
        assert!(RollingStyle::Composite.roll_on_date());
    }

    #[test]
    fn parses_plain_bytes_and_units() {
        assert_eq!(parse_file_size("4096").unwrap(), 4096);
        assert_eq!(parse_file_size("512KB").unwrap(), 512 * 1024);
        assert_eq!(parse_file_size("10MB").unwrap(), 10 * 1024 * 1024);
        assert_eq!(parse_file_size("1gb").unwrap(), 1024 * 1024 * 1024);
        assert_eq!(parse_file_size(" 10 MB ").unwrap(), 10 * 1024 * 1024);
    }

    #[test]
    fn rejects_junk_sizes() {
        assert!(parse_file_size("ten megabytes").is_err());
        assert!(parse_file_size("10TB").is_err());
        assert!(parse_file_size("").is_err());
        assert!(parse_file_size("-5MB").is_err());
    }

    #[test]
    fn defaults_match_the_documented_values() {
        let config = RollingConfig::new("app.log");
        assert_eq!(config.max_file_size, DEFAULT_MAX_FILE_SIZE);
        assert_eq!(config.date_pattern.as_deref(), Some(DEFAULT_DATE_PATTERN));
        assert_eq!(config.max_size_roll_backups, 0);
        assert_eq!(config.rolling_style, RollingStyle::Composite);
        assert_eq!(config.count_direction, CountDirection::Descending);
        assert!(config.static_log_file_name);
    }
}
