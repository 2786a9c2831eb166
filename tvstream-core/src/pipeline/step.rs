// ============================================================================
// tvstream-core/src/pipeline/step.rs
// ============================================================================
//
// PIPELINE STEPS: The Common Contract of Every Unit of Pipeline Output
//
// A pipeline is an ordered list of `PipelineStep`s. Steps are a closed enum
// so the command generator can group them by category with an exhaustive
// match. Input options and per-stream filters are not steps: they live on
// the input they belong to and are folded into the complex filter.
//
// KEY COMPONENTS:
// - FrameStateUpdate: how a decoder, filter or encoder transforms FrameState
// - StepCategory: global / environment / output / filter
// - PipelineStep: the step enum itself
//
// AI-ASSISTANT-INFO: Pipeline step contract and frame-state transitions

// ---- Internal crate imports ----
use crate::pipeline::encoder::{AudioEncoder, VideoEncoder};
use crate::pipeline::filter::complex::ComplexFilter;
use crate::pipeline::options::{EnvironmentVariable, GlobalOption, OutputOption};
use crate::pipeline::state::FrameState;

/// Declares how a step changes the tracked frame state.
///
/// Steps that only add metadata keep the defaults: they do not affect the
/// frame state and return it unchanged.
pub trait FrameStateUpdate {
    fn affects_frame_state(&self) -> bool {
        false
    }

    fn next_state(&self, current: &FrameState) -> FrameState {
        current.clone()
    }
}

/// Where a step's arguments land on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepCategory {
    Global,
    Environment,
    Output,
    Filter,
}

/// One unit of pipeline output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineStep {
    Global(GlobalOption),
    Environment(EnvironmentVariable),
    Output(OutputOption),
    VideoEncoder(VideoEncoder),
    AudioEncoder(AudioEncoder),
    /// `-c copy` for every stream
    CopyAll,
    ComplexFilter(ComplexFilter),
}

impl PipelineStep {
    pub fn category(&self) -> StepCategory {
        match self {
            Self::Global(_) => StepCategory::Global,
            Self::Environment(_) => StepCategory::Environment,
            Self::Output(_) | Self::VideoEncoder(_) | Self::AudioEncoder(_) | Self::CopyAll => {
                StepCategory::Output
            }
            Self::ComplexFilter(_) => StepCategory::Filter,
        }
    }

    /// Arguments contributed by this step in its category.
    pub fn args(&self) -> Vec<String> {
        match self {
            Self::Global(option) => option.args(),
            Self::Environment(_) => Vec::new(),
            Self::Output(option) => option.args(),
            Self::VideoEncoder(encoder) => encoder.output_args(),
            Self::AudioEncoder(encoder) => encoder.output_args(),
            Self::CopyAll => vec!["-c".to_string(), "copy".to_string()],
            Self::ComplexFilter(filter) => filter.args(),
        }
    }

    pub fn is_video_encoder(&self) -> bool {
        matches!(self, Self::VideoEncoder(_) | Self::CopyAll)
    }

    pub fn is_target(&self) -> bool {
        matches!(self, Self::Output(option) if option.is_target())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories() {
        assert_eq!(PipelineStep::Global(GlobalOption::NoStdIn).category(), StepCategory::Global);
        assert_eq!(PipelineStep::CopyAll.category(), StepCategory::Output);
        assert!(PipelineStep::CopyAll.is_video_encoder());
        assert!(PipelineStep::Output(OutputOption::PipeTarget).is_target());
        assert!(
            PipelineStep::Environment(EnvironmentVariable::VaapiDriver("iHD".to_string()))
                .args()
                .is_empty()
        );
    }
}
