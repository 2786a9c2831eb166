// ============================================================================
// tvstream-core/tests/common/mod.rs
// ============================================================================
//
// TEST HELPERS: In-memory Transcoder for Session Tests
//
// `MockSpawner` hands out `MockProcess`es whose stdout/stderr are fed by the
// test through a `MockControl`. Exiting or killing a mock process closes its
// pipes the way a real process does.
//
// AI-ASSISTANT-INFO: Mock transcoder spawner shared by integration tests

#![allow(dead_code)]

use std::io::{self, Read};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, Sender, channel};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use tvstream_core::error::{CoreResult, command_start_error};
use tvstream_core::stream::{
    ProcessExit, RetryPolicy, SessionOutput, SessionSettings, SessionSpec, TranscodeRequest,
    TranscoderProcess, TranscoderSpawner,
};

/// Pipe end read by the session.
pub struct ChannelReader {
    rx: Receiver<Vec<u8>>,
    pending: Vec<u8>,
    pos: usize,
}

impl Read for ChannelReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.pos >= self.pending.len() {
            match self.rx.recv() {
                Ok(data) => {
                    self.pending = data;
                    self.pos = 0;
                }
                Err(_) => return Ok(0),
            }
        }
        let n = (self.pending.len() - self.pos).min(buf.len());
        buf[..n].copy_from_slice(&self.pending[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}

/// Test-side handle of one mock process.
#[derive(Default)]
pub struct MockControl {
    stdout: Mutex<Option<Sender<Vec<u8>>>>,
    stderr: Mutex<Option<Sender<Vec<u8>>>>,
    exit: Mutex<Option<ProcessExit>>,
    killed: AtomicBool,
    wait_delay: Mutex<Duration>,
}

impl MockControl {
    pub fn write_stdout(&self, data: &[u8]) {
        if let Some(tx) = self.stdout.lock().unwrap().as_ref() {
            let _ = tx.send(data.to_vec());
        }
    }

    pub fn write_stderr(&self, line: &str) {
        if let Some(tx) = self.stderr.lock().unwrap().as_ref() {
            let _ = tx.send(format!("{line}\n").into_bytes());
        }
    }

    /// Simulates the process exiting with `code`.
    pub fn exit(&self, code: i32) {
        self.exit.lock().unwrap().get_or_insert(ProcessExit { code: Some(code) });
        self.close_pipes();
    }

    /// Makes `wait` take `delay`, like a transcoder slow to die.
    pub fn delay_wait(&self, delay: Duration) {
        *self.wait_delay.lock().unwrap() = delay;
    }

    pub fn is_killed(&self) -> bool {
        self.killed.load(Ordering::SeqCst)
    }

    fn close_pipes(&self) {
        self.stdout.lock().unwrap().take();
        self.stderr.lock().unwrap().take();
    }
}

pub struct MockProcess {
    control: Arc<MockControl>,
    stdout: Option<ChannelReader>,
    stderr: Option<ChannelReader>,
}

impl TranscoderProcess for MockProcess {
    fn take_stdout(&mut self) -> Option<Box<dyn Read + Send>> {
        self.stdout.take().map(|r| Box::new(r) as Box<dyn Read + Send>)
    }

    fn take_stderr(&mut self) -> Option<Box<dyn Read + Send>> {
        self.stderr.take().map(|r| Box::new(r) as Box<dyn Read + Send>)
    }

    fn try_wait(&mut self) -> CoreResult<Option<ProcessExit>> {
        Ok(*self.control.exit.lock().unwrap())
    }

    fn kill(&mut self) -> CoreResult<()> {
        self.control.killed.store(true, Ordering::SeqCst);
        self.control.exit.lock().unwrap().get_or_insert(ProcessExit { code: None });
        self.control.close_pipes();
        Ok(())
    }

    fn wait(&mut self) -> CoreResult<ProcessExit> {
        let delay = *self.control.wait_delay.lock().unwrap();
        thread::sleep(delay);
        Ok(self.control.exit.lock().unwrap().unwrap_or(ProcessExit { code: None }))
    }
}

type Behavior = Box<dyn Fn(usize, &TranscodeRequest, &MockControl) + Send + Sync>;

/// Records every request and hands out controllable processes.
pub struct MockSpawner {
    requests: Mutex<Vec<TranscodeRequest>>,
    controls: Mutex<Vec<Arc<MockControl>>>,
    behavior: Behavior,
    fail: bool,
}

impl MockSpawner {
    pub fn new() -> Self {
        Self::with_behavior(|_, _, _| {})
    }

    /// `behavior` runs for every spawn with the spawn index.
    pub fn with_behavior<F>(behavior: F) -> Self
    where
        F: Fn(usize, &TranscodeRequest, &MockControl) + Send + Sync + 'static,
    {
        Self {
            requests: Mutex::new(Vec::new()),
            controls: Mutex::new(Vec::new()),
            behavior: Box::new(behavior),
            fail: false,
        }
    }

    /// Every spawn fails as if the binary were missing.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new()
        }
    }

    /// Writes the playlist (the last argument) as soon as the process starts.
    pub fn writing_playlist() -> Self {
        Self::with_behavior(|_, request, _| {
            if let Some(path) = request.args.last() {
                std::fs::write(path, "#EXTM3U\n").unwrap();
            }
        })
    }

    pub fn requests(&self) -> Vec<TranscodeRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn spawn_count(&self) -> usize {
        self.controls.lock().unwrap().len()
    }

    pub fn control(&self, index: usize) -> Arc<MockControl> {
        Arc::clone(&self.controls.lock().unwrap()[index])
    }
}

impl TranscoderSpawner for MockSpawner {
    fn spawn(&self, request: &TranscodeRequest) -> CoreResult<Box<dyn TranscoderProcess>> {
        if self.fail {
            return Err(command_start_error(
                request.program.display().to_string(),
                io::Error::new(io::ErrorKind::NotFound, "mock: binary not found"),
            ));
        }

        let (stdout_tx, stdout_rx) = channel();
        let (stderr_tx, stderr_rx) = channel();
        let control = Arc::new(MockControl {
            stdout: Mutex::new(Some(stdout_tx)),
            stderr: Mutex::new(Some(stderr_tx)),
            ..MockControl::default()
        });

        let index = {
            let mut controls = self.controls.lock().unwrap();
            controls.push(Arc::clone(&control));
            controls.len() - 1
        };
        self.requests.lock().unwrap().push(request.clone());
        (self.behavior)(index, request, &control);

        Ok(Box::new(MockProcess {
            control,
            stdout: Some(ChannelReader {
                rx: stdout_rx,
                pending: Vec::new(),
                pos: 0,
            }),
            stderr: Some(ChannelReader {
                rx: stderr_rx,
                pending: Vec::new(),
                pos: 0,
            }),
        }))
    }
}

/// Short timings so lifecycle tests run in milliseconds.
pub fn quick_settings() -> SessionSettings {
    SessionSettings {
        idle_grace: Duration::from_millis(50),
        readiness: RetryPolicy {
            retries: 50,
            factor: 1.0,
            min_delay: Duration::from_millis(10),
        },
        consumer_buffer: 16,
        poll_interval: Duration::from_millis(10),
    }
}

pub fn pipe_spec(channel: &str) -> SessionSpec {
    SessionSpec {
        channel: channel.to_string(),
        request: TranscodeRequest::new(Path::new("ffmpeg"), vec!["pipe:1".to_string()]),
        output: SessionOutput::Pipe,
        fallback: None,
        concat: None,
        scratch_files: Vec::new(),
    }
}

pub fn segmented_spec(channel: &str, root: &Path) -> SessionSpec {
    let dir = root.join(format!("stream_{channel}"));
    let playlist = dir.join("stream.m3u8");
    SessionSpec {
        channel: channel.to_string(),
        request: TranscodeRequest::new(
            Path::new("ffmpeg"),
            vec![playlist.display().to_string()],
        ),
        output: SessionOutput::Segmented { dir, playlist },
        fallback: None,
        concat: None,
        scratch_files: Vec::new(),
    }
}

/// Polls `condition` until it holds or two seconds pass.
pub fn eventually<F: FnMut() -> bool>(mut condition: F) -> bool {
    let deadline = Instant::now() + Duration::from_secs(2);
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    condition()
}
