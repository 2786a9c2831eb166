//! Transcode pipeline compiler.
//!
//! Given a description of the source streams and the desired output, the
//! builder produces an ordered list of steps that `CommandGenerator` renders
//! into transcoder arguments. Building is pure: no I/O, no shared state.

pub mod builder;
pub mod command;
pub mod decoder;
pub mod encoder;
pub mod filter;
pub mod input;
pub mod options;
pub mod state;
pub mod step;
pub mod types;

pub use builder::{HardwareStrategy, PipelineBuilder, strategy_for};
pub use command::{CommandGenerator, Pipeline, PipelineInputs};
pub use decoder::{Decoder, select_decoder};
pub use encoder::{AudioEncoder, VideoEncoder, select_encoder, software_encoder};
pub use filter::{ComplexFilter, Filter, FilterChain};
pub use input::{
    AudioInputSource, ConcatInputSource, InputSource, VideoInputSource, WatermarkInputSource,
    WatermarkPosition, WatermarkSettings,
};
pub use options::{EnvironmentVariable, GlobalOption, InputOption, OutputOption};
pub use state::{AccelState, AudioState, FfmpegState, FrameState, HlsSettings};
pub use step::{FrameStateUpdate, PipelineStep, StepCategory};
pub use types::{
    Continuity, FrameDataLocation, HardwareAccelerationMode, InputProtocol, InputRole,
    OutputFormat, OutputLocation, VideoFormat,
};
