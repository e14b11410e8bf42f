//! Error types and the error-reporting collaborator.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// All errors the rotation engine can produce.
#[derive(Debug, Error)]
pub enum RollError {
    /// Date-based rolling is enabled but no date pattern is configured.
    #[error("date-based rolling requested without a date pattern")]
    MissingDatePattern,

    /// The configured date pattern is not a valid strftime string.
    #[error("invalid date pattern {pattern:?}")]
    InvalidDatePattern {
        /// The rejected pattern.
        pattern: String,
    },

    /// A date rollover fired again for a period that was already rotated.
    #[error("rollover already performed for {}", .scheduled.display())]
    RedundantRollover {
        /// The backup name the period already rotated to.
        scheduled: PathBuf,
    },

    /// A file-system operation failed, with the offending path for context.
    #[error("failed to {} {}: {}", .op, .path.display(), .source)]
    Fs {
        /// The operation that failed ("rename", "remove", "open").
        op: &'static str,
        /// The offending path.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// A human-readable file size could not be parsed.
    #[error("invalid file size {value:?}, expected bytes or a KB/MB/GB suffix")]
    InvalidFileSize {
        /// The rejected input.
        value: String,
    },
}

/// Convenience constructor for [`RollError::Fs`].
pub(crate) fn fs_err(op: &'static str, path: impl Into<PathBuf>, source: io::Error) -> RollError {
    RollError::Fs {
        op,
        path: path.into(),
        source,
    }
}

/// Where non-fatal rotation errors are reported.
///
/// Rotation is best-effort: a failed rename or delete must not stop the
/// remaining steps, let alone the caller's logging, so failures are funnelled
/// here instead of being returned.
pub trait ErrorSink: Send {
    /// Report one rotation error.
    fn report(&self, error: &RollError);
}

/// Default sink, reporting through [`tracing`].
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl ErrorSink for TracingSink {
    fn report(&self, error: &RollError) {
        tracing::warn!(error = %error, "log rotation error");
    }
}
