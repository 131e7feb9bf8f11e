//! File utility functions

use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

/// Resolve a configured path to an absolute one
///
/// A leading `~` component is replaced by the home directory; relative
/// results are joined onto the current directory.
///
/// ```text
/// expand_path("~/.metricbridge")              // -> /home/user/.metricbridge
/// expand_path("types.db")                     // -> /current/dir/types.db
/// expand_path("/usr/share/collectd/types.db") // unchanged
/// ```
pub fn expand_path(path: impl AsRef<Path>) -> PathBuf {
    let path = path.as_ref();

    let expanded = match (path.strip_prefix("~"), dirs::home_dir()) {
        (Ok(rest), Some(home)) if rest.as_os_str().is_empty() => home,
        (Ok(rest), Some(home)) => home.join(rest),
        _ => path.to_path_buf(),
    };

    if expanded.is_absolute() {
        return expanded;
    }
    match std::env::current_dir() {
        Ok(cwd) => cwd.join(expanded),
        Err(_) => expanded,
    }
}

/// Open a file for appending, creating it when missing
pub fn open_append(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}
