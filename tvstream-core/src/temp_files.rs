//! Scratch file and directory management.
//!
//! Segmented sessions write into a per-channel directory that must be empty
//! when the transcoder starts and gone once the session stops. Concat lists
//! are written to uniquely named files next to it.

use crate::error::CoreResult;
use log::debug;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Name of the per-channel segment directory under the stream output root.
pub fn session_dir_name(channel: &str) -> String {
    let sanitized: String = channel
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    format!("stream_{sanitized}")
}

/// Creates an empty directory at `dir`, removing any stale contents first.
pub fn prepare_clean_dir(dir: &Path) -> CoreResult<()> {
    remove_dir_if_exists(dir)?;
    fs::create_dir_all(dir)?;
    debug!("Prepared scratch directory {}", dir.display());
    Ok(())
}

/// Removes `dir` and its contents. A missing directory is not an error.
pub fn remove_dir_if_exists(dir: &Path) -> CoreResult<()> {
    match fs::remove_dir_all(dir) {
        Ok(()) => {
            debug!("Removed scratch directory {}", dir.display());
            Ok(())
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// Returns a temporary file path with random suffix. Does not create the file.
pub fn create_temp_file_path(dir: &Path, prefix: &str, extension: &str) -> PathBuf {
    use rand::distributions::Alphanumeric;
    use rand::{Rng, thread_rng};

    let random_suffix: String = thread_rng()
        .sample_iter(&Alphanumeric)
        .take(6)
        .map(char::from)
        .collect();

    dir.join(format!("{prefix}_{random_suffix}.{extension}"))
}
