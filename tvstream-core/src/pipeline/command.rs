// ============================================================================
// tvstream-core/src/pipeline/command.rs
// ============================================================================
//
// COMMAND GENERATION: Rendering a Pipeline to Transcoder Arguments
//
// Arguments are grouped by category instead of following step order:
// global options, then each input's options followed by its `-i`, then the
// output options with the complex filter placed right after the video
// encoder, and the output target last.
//
// KEY COMPONENTS:
// - Pipeline: compiled steps, inputs and resolved hardware modes
// - PipelineInputs: inputs in command-line order
// - CommandGenerator: the rendering rules
//
// AI-ASSISTANT-INFO: Pipeline value and its flat argument rendering

// ---- Internal crate imports ----
use crate::error::{CoreError, CoreResult};
use crate::pipeline::input::{
    AudioInputSource, ConcatInputSource, InputSource, VideoInputSource, WatermarkInputSource,
};
use crate::pipeline::state::AccelState;
use crate::pipeline::step::{PipelineStep, StepCategory};

/// Inputs of a compiled pipeline.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PipelineInputs {
    pub video: Option<VideoInputSource>,
    pub audio: Option<AudioInputSource>,
    pub watermark: Option<WatermarkInputSource>,
    pub concat: Option<ConcatInputSource>,
}

impl PipelineInputs {
    /// Inputs in `-i` order. Audio read from the video's path is not repeated.
    pub fn ordered(&self) -> Vec<&InputSource> {
        let mut inputs = Vec::new();
        if let Some(video) = &self.video {
            inputs.push(&video.source);
        }
        if let Some(audio) = &self.audio {
            if !inputs.iter().any(|input| input.path == audio.source.path) {
                inputs.push(&audio.source);
            }
        }
        if let Some(watermark) = &self.watermark {
            inputs.push(&watermark.source);
        }
        if let Some(concat) = &self.concat {
            inputs.push(&concat.source);
        }
        inputs
    }
}

/// A compiled transcode pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct Pipeline {
    steps: Vec<PipelineStep>,
    inputs: PipelineInputs,
    accel: AccelState,
}

impl Pipeline {
    pub fn new(steps: Vec<PipelineStep>, inputs: PipelineInputs, accel: AccelState) -> Self {
        Self {
            steps,
            inputs,
            accel,
        }
    }

    pub fn steps(&self) -> &[PipelineStep] {
        &self.steps
    }

    pub fn inputs(&self) -> &PipelineInputs {
        &self.inputs
    }

    /// Hardware modes the build resolved to.
    pub fn accel(&self) -> AccelState {
        self.accel
    }

    /// Flat argument list for the transcoder, without the program name.
    pub fn args(&self) -> CoreResult<Vec<String>> {
        CommandGenerator::generate(self)
    }

    /// Environment variables the transcoder must run with.
    pub fn environment(&self) -> Vec<(String, String)> {
        self.steps
            .iter()
            .filter_map(|step| match step {
                PipelineStep::Environment(variable) => Some(variable.pair()),
                _ => None,
            })
            .collect()
    }
}

pub struct CommandGenerator;

impl CommandGenerator {
    pub fn generate(pipeline: &Pipeline) -> CoreResult<Vec<String>> {
        let steps = pipeline.steps();
        if !steps.iter().any(PipelineStep::is_video_encoder) {
            return Err(CoreError::MissingEncoder);
        }

        let mut args = Vec::new();

        for step in steps.iter().filter(|s| s.category() == StepCategory::Global) {
            args.extend(step.args());
        }

        for input in pipeline.inputs().ordered() {
            args.extend(input.input_args());
        }

        let filters: Vec<String> = steps
            .iter()
            .filter(|s| s.category() == StepCategory::Filter)
            .flat_map(PipelineStep::args)
            .collect();

        let mut filters_placed = false;
        for step in steps
            .iter()
            .filter(|s| s.category() == StepCategory::Output && !s.is_target())
        {
            args.extend(step.args());
            if step.is_video_encoder() && !filters_placed {
                args.extend(filters.iter().cloned());
                filters_placed = true;
            }
        }

        for step in steps.iter().filter(|s| s.is_target()) {
            args.extend(step.args());
        }

        Ok(args)
    }
}
