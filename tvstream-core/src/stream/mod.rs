// ============================================================================
// tvstream-core/src/stream/mod.rs
// ============================================================================
//
// STREAMING: Running Compiled Pipelines for Channels
//
// This module turns playable items into transcoder runs and supervises them:
// compiling items (including offline/error screens), spawning the process,
// waiting for segmented output, fanning the byte stream out to consumers and
// tearing everything down again.
//
// KEY COMPONENTS:
// - item / plan: what to play and how it becomes a session spec
// - process: transcoder process abstraction (ffmpeg-sidecar backed)
// - readiness / concat: playlist polling and concat lists
// - session / manager: lifecycle and one-session-per-channel bookkeeping
// - throttle: reconnect loop detection
//
// AI-ASSISTANT-INFO: Streaming session lifecycle module

pub mod concat;
pub mod item;
pub mod manager;
pub mod plan;
pub mod process;
pub mod readiness;
pub mod session;
pub mod throttle;

pub use concat::{ConcatEntry, ConcatList, ConcatTracker};
pub use item::{ItemKind, OutputProfile, PlayableItem, ServiceMetadata, WatermarkDescriptor};
pub use manager::SessionManager;
pub use plan::{compile_item, concat_session, fallback_screen, item_session, session_dir};
pub use process::{ProcessExit, SidecarSpawner, TranscodeRequest, TranscoderProcess, TranscoderSpawner};
pub use readiness::{RetryPolicy, wait_for_file};
pub use session::{
    ConsumerHandle, SessionOutput, SessionSettings, SessionSpec, SessionState, StreamSession,
};
pub use throttle::{ReconnectThrottle, ThrottleKey};
