//! Naming rules for rotated files.
//!
//! Backups are always named `base[.dateSuffix][.N]`. Generation and
//! interpretation live side by side here so the engine and the startup
//! scanner cannot disagree on the concatenation order.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Append a literal suffix to the file name component of `base`.
pub(crate) fn suffixed(base: &Path, suffix: &str) -> PathBuf {
    let mut name = base
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| base.as_os_str().to_os_string());
    name.push(suffix);
    base.with_file_name(name)
}

/// The path of the `index`-th backup of `base`.
pub(crate) fn indexed(base: &Path, index: i32) -> PathBuf {
    suffixed(base, &format!(".{}", index))
}

/// Split a candidate file name on its final `.` into the stem and the
/// trailing segment. `None` when there is no `.` at all.
pub(crate) fn split_trailing(name: &str) -> Option<(&str, &str)> {
    let dot = name.rfind('.')?;
    Some((&name[..dot], &name[dot + 1..]))
}
