// ============================================================================
// tvstream-core/src/stream/process.rs
// ============================================================================
//
// TRANSCODER PROCESS: Spawning and Controlling the External Transcoder
//
// Sessions never touch `std::process` directly. They ask a
// `TranscoderSpawner` for a `TranscoderProcess`, which lets tests swap the
// real ffmpeg-sidecar backed implementation for an in-memory one.
//
// KEY COMPONENTS:
// - TranscodeRequest: program, arguments and environment of one run
// - TranscoderProcess: a running process (pipes, poll, kill, wait)
// - TranscoderSpawner: factory for processes
// - SidecarSpawner: implementation on top of ffmpeg-sidecar
//
// AI-ASSISTANT-INFO: Transcoder process abstraction and ffmpeg-sidecar backend

// ---- Standard library imports ----
use std::io::Read;
use std::path::{Path, PathBuf};

// ---- External crate imports ----
use ffmpeg_sidecar::child::FfmpegChild;
use ffmpeg_sidecar::command::FfmpegCommand;
use log::debug;

// ---- Internal crate imports ----
use crate::error::{CoreResult, command_start_error, command_wait_error};
use crate::pipeline::Pipeline;

/// Everything needed to start one transcoder run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscodeRequest {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub env: Vec<(String, String)>,
}

impl TranscodeRequest {
    pub fn new(program: &Path, args: Vec<String>) -> Self {
        Self {
            program: program.to_path_buf(),
            args,
            env: Vec::new(),
        }
    }

    /// Renders `pipeline` for `program`.
    pub fn from_pipeline(program: &Path, pipeline: &Pipeline) -> CoreResult<Self> {
        Ok(Self {
            program: program.to_path_buf(),
            args: pipeline.args()?,
            env: pipeline.environment(),
        })
    }

    /// Shell-like rendering for logs.
    pub fn display(&self) -> String {
        let mut parts = Vec::with_capacity(self.args.len() + 1);
        parts.extend(self.env.iter().map(|(k, v)| format!("{k}={v}")));
        parts.push(self.program.display().to_string());
        parts.extend(self.args.iter().map(|arg| {
            if arg.contains([' ', ';', '[', '|']) {
                format!("'{arg}'")
            } else {
                arg.clone()
            }
        }));
        parts.join(" ")
    }
}

/// Exit information of a finished process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessExit {
    /// `None` when the process was terminated by a signal
    pub code: Option<i32>,
}

impl ProcessExit {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// A running transcoder.
pub trait TranscoderProcess: Send {
    fn take_stdout(&mut self) -> Option<Box<dyn Read + Send>>;
    fn take_stderr(&mut self) -> Option<Box<dyn Read + Send>>;
    /// Non-blocking exit check.
    fn try_wait(&mut self) -> CoreResult<Option<ProcessExit>>;
    fn kill(&mut self) -> CoreResult<()>;
    fn wait(&mut self) -> CoreResult<ProcessExit>;
}

/// Something that can start transcoder processes.
pub trait TranscoderSpawner: Send + Sync {
    fn spawn(&self, request: &TranscodeRequest) -> CoreResult<Box<dyn TranscoderProcess>>;
}

// ---- ffmpeg-sidecar backend ----

/// Wrapper around `ffmpeg_sidecar::child::FfmpegChild`.
pub struct SidecarProcess {
    child: FfmpegChild,
    program: String,
}

impl TranscoderProcess for SidecarProcess {
    fn take_stdout(&mut self) -> Option<Box<dyn Read + Send>> {
        self.child
            .take_stdout()
            .map(|stdout| Box::new(stdout) as Box<dyn Read + Send>)
    }

    fn take_stderr(&mut self) -> Option<Box<dyn Read + Send>> {
        self.child
            .take_stderr()
            .map(|stderr| Box::new(stderr) as Box<dyn Read + Send>)
    }

    fn try_wait(&mut self) -> CoreResult<Option<ProcessExit>> {
        self.child
            .as_inner_mut()
            .try_wait()
            .map(|status| status.map(|s| ProcessExit { code: s.code() }))
            .map_err(|e| command_wait_error(self.program.clone(), e))
    }

    fn kill(&mut self) -> CoreResult<()> {
        match self.child.kill() {
            Ok(()) => Ok(()),
            // Already exited.
            Err(e) if e.kind() == std::io::ErrorKind::InvalidInput => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn wait(&mut self) -> CoreResult<ProcessExit> {
        self.child
            .wait()
            .map(|status| ProcessExit { code: status.code() })
            .map_err(|e| command_wait_error(self.program.clone(), e))
    }
}

/// Spawns the transcoder through ffmpeg-sidecar.
#[derive(Debug, Clone, Default)]
pub struct SidecarSpawner;

impl TranscoderSpawner for SidecarSpawner {
    fn spawn(&self, request: &TranscodeRequest) -> CoreResult<Box<dyn TranscoderProcess>> {
        let program = request.program.display().to_string();
        debug!("Spawning: {}", request.display());

        let mut cmd = FfmpegCommand::new_with_path(&request.program);
        cmd.args(&request.args);
        for (key, value) in &request.env {
            cmd.as_inner_mut().env(key, value);
        }

        let child = cmd
            .spawn()
            .map_err(|e| command_start_error(program.clone(), e))?;
        Ok(Box::new(SidecarProcess { child, program }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_quotes_filter_graphs() {
        let mut request = TranscodeRequest::new(
            Path::new("ffmpeg"),
            vec![
                "-filter_complex".to_string(),
                "[0:0]scale=1280:720[v];[0:1]anull[a]".to_string(),
            ],
        );
        request.env.push(("LIBVA_DRIVER_NAME".to_string(), "iHD".to_string()));
        assert_eq!(
            request.display(),
            "LIBVA_DRIVER_NAME=iHD ffmpeg -filter_complex '[0:0]scale=1280:720[v];[0:1]anull[a]'"
        );
    }

    #[test]
    fn test_process_exit_success() {
        assert!(ProcessExit { code: Some(0) }.success());
        assert!(!ProcessExit { code: None }.success());
    }
}
