//! Core library of the tvstream virtual channel engine.
//!
//! This crate compiles playable items into ffmpeg invocations that take the
//! source's decoded frames to the channel's desired output (choosing
//! decoders, filters and encoders per hardware backend), and supervises the
//! resulting transcoder processes as channel sessions.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tvstream_core::{CoreConfig, OutputProfile, PlayableItem, SessionManager, SidecarSpawner};
//! use tvstream_core::media::{FrameSize, VideoStream};
//!
//! let config = CoreConfig::default();
//! config.validate().unwrap();
//!
//! let item = PlayableItem::new(
//!     "/media/movie.mkv",
//!     VideoStream::new(0, "h264", FrameSize::new(1920, 1080)),
//! );
//! let profile = OutputProfile::default();
//!
//! // Arguments only
//! let pipeline = tvstream_core::compile_item(&item, &profile, &config).unwrap();
//! println!("{}", pipeline.args().unwrap().join(" "));
//!
//! // Or run it as a channel session
//! let manager = SessionManager::new(config.clone(), Arc::new(SidecarSpawner));
//! let spec = tvstream_core::item_session("1", &item, &profile, &config).unwrap();
//! let session = manager.get_or_create(spec).unwrap();
//! let mut consumer = session.attach().unwrap();
//! std::io::copy(&mut consumer, &mut std::io::sink()).unwrap();
//! ```

pub mod config;
pub mod error;
pub mod file_logging;
pub mod media;
pub mod pipeline;
pub mod stream;
pub mod temp_files;

// Re-exports for public API
pub use config::{CoreConfig, CoreConfigBuilder};
pub use error::{CoreError, CoreResult};
pub use media::{ProbedMedia, probe_media};
pub use pipeline::{
    AccelState, CommandGenerator, FfmpegState, FrameState, HardwareAccelerationMode, OutputFormat,
    Pipeline, PipelineBuilder, VideoFormat,
};
pub use stream::{
    ConcatEntry, ConcatList, ItemKind, OutputProfile, PlayableItem, SessionManager, SessionSpec,
    SessionState, SidecarSpawner, StreamSession, TranscodeRequest, compile_item, concat_session,
    item_session,
};
pub use temp_files::{create_temp_file_path, prepare_clean_dir, remove_dir_if_exists};
