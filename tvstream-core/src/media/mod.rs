//! Media descriptors: the immutable description of an input's streams.

pub mod format;
pub mod probe;
pub mod stream;

pub use format::{FrameSize, PixelFormat};
pub use probe::{ProbedMedia, probe_media};
pub use stream::{AudioStream, StillImageStream, StreamKind, VideoStream};
