// ============================================================================
// tvstream-core/src/stream/concat.rs
// ============================================================================
//
// CONCAT LISTS: Back-to-back Playback on One Process
//
// A continuous channel runs a single transcoder reading an ffconcat list, so
// consecutive programs play without a restart. This module writes those
// lists and follows the transcoder's stderr to know which entry is playing.
//
// KEY COMPONENTS:
// - ConcatEntry / ConcatList: the ffconcat document
// - ConcatTracker: maps "Opening '...' for reading" lines to entries
//
// AI-ASSISTANT-INFO: ffconcat list writer and playback position tracker

// ---- Standard library imports ----
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

// ---- External crate imports ----
use log::{debug, info};

// ---- Internal crate imports ----
use crate::error::CoreResult;
use crate::temp_files::create_temp_file_path;

const HEADER: &str = "ffconcat version 1.0";

/// One item of a concat list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConcatEntry {
    pub path: String,
    /// Playback length; the demuxer probes it when absent
    pub duration: Option<Duration>,
}

impl ConcatEntry {
    pub fn new(path: &str, duration: Option<Duration>) -> Self {
        Self {
            path: path.to_string(),
            duration,
        }
    }
}

/// An ffconcat document.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConcatList {
    entries: Vec<ConcatEntry>,
}

impl ConcatList {
    pub fn new(entries: Vec<ConcatEntry>) -> Self {
        Self { entries }
    }

    pub fn push(&mut self, entry: ConcatEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[ConcatEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of all known entry durations.
    pub fn total_duration(&self) -> Duration {
        self.entries.iter().filter_map(|e| e.duration).sum()
    }

    pub fn render(&self) -> String {
        let mut out = String::from(HEADER);
        out.push('\n');
        for entry in &self.entries {
            out.push_str(&format!("file '{}'\n", escape_path(&entry.path)));
            if let Some(duration) = entry.duration {
                out.push_str(&format!("duration {:.3}\n", duration.as_secs_f64()));
            }
        }
        out
    }

    /// Writes the list to a uniquely named file in `dir`.
    pub fn write_to(&self, dir: &Path, prefix: &str) -> CoreResult<PathBuf> {
        fs::create_dir_all(dir)?;
        let path = create_temp_file_path(dir, prefix, "ffconcat");
        fs::write(&path, self.render())?;
        debug!("Wrote concat list with {} entries to {}", self.entries.len(), path.display());
        Ok(path)
    }
}

// Single quotes close, escape and reopen the quoted string.
fn escape_path(path: &str) -> String {
    path.replace('\'', r"'\''")
}

/// Follows which concat entry the transcoder is reading.
#[derive(Debug, Clone)]
pub struct ConcatTracker {
    list: ConcatList,
    current: Option<usize>,
    opened: usize,
}

impl ConcatTracker {
    pub fn new(list: ConcatList) -> Self {
        Self {
            list,
            current: None,
            opened: 0,
        }
    }

    /// Feeds one stderr line. Returns the entry index when a new entry starts.
    pub fn observe_line(&mut self, line: &str) -> Option<usize> {
        let opened = parse_opened_path(line)?;
        let len = self.list.entries.len();
        if len == 0 {
            return None;
        }
        // Entries may repeat; search forward from the current position.
        let start = self.current.map_or(0, |i| (i + 1) % len);
        let index = (0..len)
            .map(|offset| (start + offset) % len)
            .find(|&i| self.list.entries[i].path == opened)?;
        self.current = Some(index);
        self.opened += 1;
        info!("Concat playback advanced to item {} ({opened})", index + 1);
        Some(index)
    }

    /// Index of the entry being read, if any has started.
    pub fn current(&self) -> Option<usize> {
        self.current
    }

    /// Number of entries opened so far, counting loops.
    pub fn items_started(&self) -> usize {
        self.opened
    }

    /// Duration of entries fully played, assuming sequential playback.
    pub fn completed_duration(&self) -> Duration {
        let len = self.list.entries.len();
        if len == 0 || self.opened < 2 {
            return Duration::ZERO;
        }
        (0..self.opened - 1)
            .filter_map(|i| self.list.entries[i % len].duration)
            .sum()
    }

    pub fn list(&self) -> &ConcatList {
        &self.list
    }
}

fn parse_opened_path(line: &str) -> Option<&str> {
    let rest = &line[line.find("Opening '")? + "Opening '".len()..];
    let end = rest.rfind("' for reading")?;
    Some(&rest[..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three_items() -> ConcatList {
        ConcatList::new(vec![
            ConcatEntry::new("/media/a.mkv", Some(Duration::from_secs(60))),
            ConcatEntry::new("/media/b.mkv", Some(Duration::from_secs(90))),
            ConcatEntry::new("/media/c.mkv", Some(Duration::from_secs(30))),
        ])
    }

    #[test]
    fn test_render_list() {
        let mut list = ConcatList::default();
        list.push(ConcatEntry::new("/media/it's.mkv", Some(Duration::from_millis(1500))));
        list.push(ConcatEntry::new("/media/b.mkv", None));
        assert_eq!(
            list.render(),
            "ffconcat version 1.0\nfile '/media/it'\\''s.mkv'\nduration 1.500\nfile '/media/b.mkv'\n"
        );
    }

    #[test]
    fn test_write_to_creates_unique_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = three_items().write_to(dir.path(), "channel_1").unwrap();
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.starts_with(HEADER));
        assert_eq!(content.matches("file '").count(), 3);
    }

    #[test]
    fn test_parse_opened_path() {
        let line = "[concat @ 0x55d0] Opening '/media/b.mkv' for reading";
        assert_eq!(parse_opened_path(line), Some("/media/b.mkv"));
        assert_eq!(parse_opened_path("frame=  100 fps=25"), None);
    }

    #[test]
    fn test_tracker_advances_through_items() {
        let mut tracker = ConcatTracker::new(three_items());
        assert_eq!(tracker.current(), None);
        assert_eq!(tracker.observe_line("[concat @ 0x1] Opening '/media/a.mkv' for reading"), Some(0));
        assert_eq!(tracker.observe_line("frame=1"), None);
        assert_eq!(tracker.observe_line("[concat @ 0x1] Opening '/media/b.mkv' for reading"), Some(1));
        assert_eq!(tracker.observe_line("[concat @ 0x1] Opening '/media/c.mkv' for reading"), Some(2));
        assert_eq!(tracker.items_started(), 3);
        assert_eq!(tracker.completed_duration(), Duration::from_secs(150));
        // loops back to the start
        assert_eq!(tracker.observe_line("[concat @ 0x1] Opening '/media/a.mkv' for reading"), Some(0));
        assert_eq!(tracker.completed_duration(), Duration::from_secs(180));
    }

    #[test]
    fn test_tracker_ignores_unknown_paths() {
        let mut tracker = ConcatTracker::new(three_items());
        assert_eq!(tracker.observe_line("Opening '/other.mkv' for reading"), None);
        assert_eq!(tracker.items_started(), 0);
    }
}
