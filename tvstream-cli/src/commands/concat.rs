//! Implementation of the 'concat' subcommand.
//!
//! Probes each file for its duration, writes a looping concat list and plays
//! it on a single transcoder with stream copy.

use std::path::Path;
use std::time::Duration;

use log::{info, warn};
use tvstream_core::{ConcatEntry, ConcatList, CoreConfig, CoreError, concat_session, probe_media};

use crate::cli::ConcatArgs;
use crate::commands::session::run_session;
use crate::error::CliResult;

pub fn run_concat(args: &ConcatArgs, config: CoreConfig) -> CliResult<()> {
    let mut list = ConcatList::default();
    for file in &args.files {
        let path = file
            .canonicalize()
            .map_err(|e| CoreError::PathError(format!("Invalid input path '{}': {}", file.display(), e)))?;
        list.push(entry_for(&path, probe_duration(&path)));
    }

    info!(
        "Concatenating {} files ({}s per loop) on channel {}",
        list.entries().len(),
        list.total_duration().as_secs(),
        args.session.channel
    );
    let spec = concat_session(&args.session.channel, list, &config, args.hls)?;
    run_session(config, spec, &args.session)
}

/// Duration of `path`, or `None` when ffprobe cannot tell.
fn probe_duration(path: &Path) -> Option<Duration> {
    match probe_media(path) {
        Ok(media) => media.duration,
        Err(e) => {
            warn!("Could not probe {}: {e}; its duration will be left to the demuxer", path.display());
            None
        }
    }
}

fn entry_for(path: &Path, duration: Option<Duration>) -> ConcatEntry {
    ConcatEntry::new(&path.display().to_string(), duration)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entries_keep_absolute_paths() {
        let entry = entry_for(Path::new("/media/a.mkv"), Some(Duration::from_secs(90)));
        assert_eq!(entry.path, "/media/a.mkv");
        assert_eq!(entry.duration, Some(Duration::from_secs(90)));
    }
}
