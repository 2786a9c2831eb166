//! Implementation of the 'probe' subcommand.
//!
//! Runs ffprobe on a file and prints an item descriptor that `args` and
//! `play` accept.

use std::path::Path;

use log::info;
use tvstream_core::{CoreError, PlayableItem, ProbedMedia, probe_media};

use crate::cli::ProbeArgs;
use crate::error::{CliErrorContext, CliResult};

pub fn run_probe(args: &ProbeArgs) -> CliResult<()> {
    let input = args
        .input
        .canonicalize()
        .map_err(|e| CoreError::PathError(format!("Invalid input path '{}': {}", args.input.display(), e)))?;

    let media = probe_media(&input)?;
    info!(
        "Found {} video and {} audio streams in {}",
        media.video_streams.len(),
        media.audio_streams.len(),
        input.display()
    );

    let item = item_from_probe(&input, &media, args.start_ms)?;
    let text = serde_json::to_string_pretty(&item)
        .map_err(|e| CoreError::JsonParseError(format!("Failed to serialize item: {e}")))?;
    println!("{text}");
    Ok(())
}

/// Builds an item from the first video and audio streams of `media`.
pub fn item_from_probe(path: &Path, media: &ProbedMedia, start_ms: Option<u64>) -> CliResult<PlayableItem> {
    let video = media
        .video_streams
        .first()
        .cloned()
        .cli_with_context(|| format!("{} has no video stream", path.display()))?;

    let mut item = PlayableItem::new(&path.display().to_string(), video);
    if let Some(audio) = media.audio_streams.first() {
        item = item.with_audio(audio.clone());
    }
    item.start_ms = start_ms;
    item.duration_ms = media.duration.map(|d| d.as_millis() as u64);
    Ok(item)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tvstream_core::media::{AudioStream, FrameSize, VideoStream};

    #[test]
    fn test_item_uses_first_streams_and_duration() {
        let media = ProbedMedia {
            video_streams: vec![VideoStream::new(0, "hevc", FrameSize::new(3840, 2160))],
            audio_streams: vec![AudioStream::new(1, "eac3", 6), AudioStream::new(2, "aac", 2)],
            duration: Some(Duration::from_millis(5_400_250)),
        };
        let item = item_from_probe(Path::new("/media/film.mkv"), &media, Some(1_000)).unwrap();

        assert_eq!(item.path, "/media/film.mkv");
        assert_eq!(item.video.as_ref().unwrap().codec, "hevc");
        assert_eq!(item.audio.as_ref().unwrap().channels, 6);
        assert_eq!(item.duration_ms, Some(5_400_250));
        assert_eq!(item.start_ms, Some(1_000));
        assert!(item.validate().is_ok());
    }

    #[test]
    fn test_audio_only_file_is_rejected() {
        let media = ProbedMedia {
            audio_streams: vec![AudioStream::new(0, "mp3", 2)],
            ..ProbedMedia::default()
        };
        let err = item_from_probe(Path::new("/media/song.mp3"), &media, None).unwrap_err();
        assert!(err.to_string().contains("no video stream"), "{err}");
    }
}
