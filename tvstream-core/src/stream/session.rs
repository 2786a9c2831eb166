// ============================================================================
// tvstream-core/src/stream/session.rs
// ============================================================================
//
// STREAM SESSIONS: One Supervised Transcoder per Channel
//
// A session owns exactly one transcoder process and fans its output out to
// any number of consumers. Its lifecycle is
//
//   initializing -> ready -> streaming -> (stopping | error) -> terminated
//
// Each process gets a pump thread (stdout to consumers), a stderr thread
// (debug logging, concat tracking, error tail) and the session has one
// supervisor thread polling for exit. Consumers get their own bounded
// channel; a consumer that falls behind is detached instead of stalling the
// others. Output produced before the first consumer attaches is held in a
// bounded backlog and handed to that consumer. When the last consumer leaves,
// an idle timer stops the session unless somebody attaches before it fires.
//
// KEY COMPONENTS:
// - SessionState / SessionOutput / SessionSpec / SessionSettings
// - StreamSession: start, attach, stop and observation
// - ConsumerHandle: `Read` over the session output, detaches on drop
//
// AI-ASSISTANT-INFO: Streaming session lifecycle and consumer fan-out

// ---- Standard library imports ----
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::fs;
use std::io::{self, BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{Receiver, SyncSender, TrySendError, sync_channel};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

// ---- External crate imports ----
use chrono::{DateTime, Local};
use log::{debug, error, info, warn};

// ---- Internal crate imports ----
use crate::config::CoreConfig;
use crate::error::{CoreError, CoreResult};
use crate::stream::concat::{ConcatList, ConcatTracker};
use crate::stream::process::{ProcessExit, TranscodeRequest, TranscoderProcess, TranscoderSpawner};
use crate::stream::readiness::{RetryPolicy, wait_for_file};
use crate::temp_files::{prepare_clean_dir, remove_dir_if_exists};

const CHUNK_SIZE: usize = 64 * 1024;
const STDERR_TAIL_LINES: usize = 20;

/// Lifecycle state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    Initializing,
    Ready,
    Streaming,
    Stopping,
    Error,
    Terminated,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Initializing => "initializing",
            Self::Ready => "ready",
            Self::Streaming => "streaming",
            Self::Stopping => "stopping",
            Self::Error => "error",
            Self::Terminated => "terminated",
        }
    }

    /// Ready or streaming: consumers may attach.
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Ready | Self::Streaming)
    }

    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Error | Self::Terminated)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a session's output goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutput {
    /// Continuous byte stream on the transcoder's stdout
    Pipe,
    /// Playlist plus segment files in a per-channel directory
    Segmented { dir: PathBuf, playlist: PathBuf },
}

/// Everything needed to start a session.
#[derive(Debug, Clone)]
pub struct SessionSpec {
    pub channel: String,
    pub request: TranscodeRequest,
    pub output: SessionOutput,
    /// Substituted once if the primary process fails
    pub fallback: Option<TranscodeRequest>,
    /// The list being played, for position tracking
    pub concat: Option<ConcatList>,
    /// Files removed when the session stops
    pub scratch_files: Vec<PathBuf>,
}

/// Timing and buffering knobs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionSettings {
    pub idle_grace: Duration,
    pub readiness: RetryPolicy,
    /// Chunks buffered per consumer before it counts as too slow
    pub consumer_buffer: usize,
    pub poll_interval: Duration,
}

impl SessionSettings {
    pub fn from_config(config: &CoreConfig) -> Self {
        Self {
            idle_grace: config.idle_grace(),
            readiness: RetryPolicy::from_config(config),
            consumer_buffer: 256,
            poll_interval: Duration::from_millis(100),
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self::from_config(&CoreConfig::default())
    }
}

struct SessionInner {
    state: SessionState,
    process: Option<Box<dyn TranscoderProcess>>,
    consumers: HashMap<u64, SyncSender<Arc<[u8]>>>,
    next_consumer_id: u64,
    /// Output read before anyone attached, newest last
    backlog: VecDeque<Arc<[u8]>>,
    /// Bumped on every consumer change; a pending idle timer only fires if
    /// the generation it saw is still current
    idle_generation: u64,
    fallback: Option<TranscodeRequest>,
    spawn_count: u32,
    threads: Vec<JoinHandle<()>>,
    tracker: Option<ConcatTracker>,
    stderr_tail: VecDeque<String>,
    last_exit: Option<ProcessExit>,
    bytes_out: u64,
    cleaned: bool,
}

/// A running channel stream.
pub struct StreamSession {
    channel: String,
    output: SessionOutput,
    settings: SessionSettings,
    spawner: Arc<dyn TranscoderSpawner>,
    scratch_files: Vec<PathBuf>,
    started_at: DateTime<Local>,
    inner: Mutex<SessionInner>,
    /// Held for the whole of `stop` so concurrent callers wait for cleanup
    teardown: Mutex<()>,
}

impl fmt::Debug for StreamSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamSession")
            .field("channel", &self.channel)
            .field("output", &self.output)
            .field("state", &self.state())
            .finish()
    }
}

impl StreamSession {
    /// Spawns the transcoder and, for segmented output, waits for the playlist.
    ///
    /// Returns once the session is `Ready`. A failed start cleans up after
    /// itself before the error is returned.
    pub fn start(
        spec: SessionSpec,
        spawner: Arc<dyn TranscoderSpawner>,
        settings: SessionSettings,
    ) -> CoreResult<Arc<Self>> {
        let SessionSpec {
            channel,
            request,
            output,
            fallback,
            concat,
            scratch_files,
        } = spec;
        info!("Starting session for channel {channel}");

        if let SessionOutput::Segmented { dir, .. } = &output {
            prepare_clean_dir(dir)?;
        }

        let session = Arc::new(Self {
            channel,
            output,
            settings,
            spawner,
            scratch_files,
            started_at: Local::now(),
            inner: Mutex::new(SessionInner {
                state: SessionState::Initializing,
                process: None,
                consumers: HashMap::new(),
                next_consumer_id: 0,
                backlog: VecDeque::new(),
                idle_generation: 0,
                fallback,
                spawn_count: 0,
                threads: Vec::new(),
                tracker: concat.map(ConcatTracker::new),
                stderr_tail: VecDeque::new(),
                last_exit: None,
                bytes_out: 0,
                cleaned: false,
            }),
            teardown: Mutex::new(()),
        });

        let mut request = request;
        loop {
            let spawned = {
                let mut inner = session.lock();
                session.spawn_process(&mut inner, &request)
            };
            let error = match spawned.and_then(|()| session.wait_ready()) {
                Ok(()) => break,
                Err(e) => e,
            };

            let fallback = session.lock().fallback.take();
            match fallback {
                Some(next) if !matches!(error, CoreError::CommandStart { .. }) => {
                    warn!(
                        "Channel {} failed to start ({error}); switching to fallback screen",
                        session.channel
                    );
                    session.reap_process();
                    request = next;
                }
                _ => {
                    error!("Session for channel {} failed to start: {error}", session.channel);
                    session.set_state(SessionState::Error);
                    if let Err(cleanup) = session.stop() {
                        warn!("Cleanup after failed start of channel {}: {cleanup}", session.channel);
                    }
                    return Err(error);
                }
            }
        }

        session.set_state(SessionState::Ready);

        let supervisor = Arc::clone(&session);
        let spawned = thread::Builder::new()
            .name(format!("supervise-{}", session.channel))
            .spawn(move || supervisor.supervise());
        match spawned {
            Ok(handle) => session.lock().threads.push(handle),
            Err(e) => {
                error!("Could not start supervisor for channel {}: {e}", session.channel);
                if let Err(cleanup) = session.stop() {
                    warn!("Cleanup of channel {}: {cleanup}", session.channel);
                }
                return Err(e.into());
            }
        }

        Ok(session)
    }

    fn lock(&self) -> MutexGuard<'_, SessionInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_state(&self, state: SessionState) {
        let mut inner = self.lock();
        self.transition(&mut inner, state);
    }

    fn transition(&self, inner: &mut SessionInner, state: SessionState) {
        if inner.state != state {
            info!("Channel {}: {} -> {}", self.channel, inner.state, state);
            inner.state = state;
        }
    }

    // ---- Process handling ----

    fn spawn_process(self: &Arc<Self>, inner: &mut SessionInner, request: &TranscodeRequest) -> CoreResult<()> {
        let mut process = self.spawner.spawn(request)?;
        inner.spawn_count += 1;
        inner.last_exit = None;
        debug!("Channel {} spawned transcoder (#{})", self.channel, inner.spawn_count);

        let stdout = process.take_stdout();
        let stderr = process.take_stderr();
        inner.process = Some(process);

        if let Some(stdout) = stdout {
            let session = Arc::clone(self);
            let handle = thread::Builder::new()
                .name(format!("pump-{}", self.channel))
                .spawn(move || session.pump(stdout))?;
            inner.threads.push(handle);
        }
        if let Some(stderr) = stderr {
            let session = Arc::clone(self);
            let handle = thread::Builder::new()
                .name(format!("stderr-{}", self.channel))
                .spawn(move || session.follow_stderr(stderr))?;
            inner.threads.push(handle);
        }
        Ok(())
    }

    fn wait_ready(&self) -> CoreResult<()> {
        match &self.output {
            SessionOutput::Pipe => Ok(()),
            SessionOutput::Segmented { playlist, .. } => {
                wait_for_file(playlist, &self.settings.readiness, || self.poll_exit())
            }
        }
    }

    fn poll_exit(&self) -> Option<(ProcessExit, String)> {
        let mut inner = self.lock();
        let process = inner.process.as_mut()?;
        match process.try_wait() {
            Ok(Some(exit)) => {
                inner.last_exit = Some(exit);
                Some((exit, tail_text(&inner.stderr_tail)))
            }
            Ok(None) => None,
            Err(e) => {
                warn!("Could not poll transcoder of channel {}: {e}", self.channel);
                None
            }
        }
    }

    fn reap_process(&self) {
        let process = self.lock().process.take();
        if let Some(mut process) = process {
            if let Err(e) = process.kill() {
                debug!("Kill of exited transcoder for channel {}: {e}", self.channel);
            }
            if let Err(e) = process.wait() {
                debug!("Wait on transcoder for channel {}: {e}", self.channel);
            }
        }
    }

    fn supervise(self: Arc<Self>) {
        loop {
            thread::sleep(self.settings.poll_interval);
            let mut inner = self.lock();
            if !inner.state.is_running() {
                break;
            }
            let Some(process) = inner.process.as_mut() else {
                break;
            };
            match process.try_wait() {
                Ok(None) => {}
                Ok(Some(exit)) => {
                    if !self.handle_exit(&mut inner, exit) {
                        break;
                    }
                }
                Err(e) => {
                    error!("Lost track of transcoder for channel {}: {e}", self.channel);
                    inner.consumers.clear();
                    self.transition(&mut inner, SessionState::Error);
                    break;
                }
            }
        }
        debug!("Supervisor for channel {} finished", self.channel);
    }

    /// Returns true while the session keeps running.
    fn handle_exit(self: &Arc<Self>, inner: &mut SessionInner, exit: ProcessExit) -> bool {
        inner.last_exit = Some(exit);
        if exit.success() {
            info!("Transcoder for channel {} finished", self.channel);
            inner.consumers.clear();
            self.transition(inner, SessionState::Terminated);
            return false;
        }

        error!(
            "Transcoder for channel {} exited with code {:?}: {}",
            self.channel,
            exit.code,
            tail_text(&inner.stderr_tail)
        );
        if let Some(fallback) = inner.fallback.take() {
            warn!("Channel {}: switching to fallback screen", self.channel);
            inner.process = None;
            match self.spawn_process(inner, &fallback) {
                Ok(()) => return true,
                Err(e) => error!("Fallback for channel {} failed: {e}", self.channel),
            }
        }

        inner.consumers.clear();
        self.transition(inner, SessionState::Error);
        false
    }

    fn pump(self: Arc<Self>, mut stdout: Box<dyn Read + Send>) {
        let mut buf = vec![0u8; CHUNK_SIZE];
        loop {
            match stdout.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => self.broadcast(&buf[..n]),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    debug!("Output of channel {} closed: {e}", self.channel);
                    break;
                }
            }
        }
    }

    fn broadcast(self: &Arc<Self>, data: &[u8]) {
        let chunk: Arc<[u8]> = Arc::from(data);
        let mut inner = self.lock();
        inner.bytes_out += data.len() as u64;
        if inner.next_consumer_id == 0 {
            if inner.backlog.len() >= self.settings.consumer_buffer.max(1) {
                inner.backlog.pop_front();
            }
            inner.backlog.push_back(chunk);
            return;
        }
        if inner.consumers.is_empty() {
            return;
        }

        let mut dropped = Vec::new();
        for (id, sender) in &inner.consumers {
            match sender.try_send(Arc::clone(&chunk)) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => {
                    warn!("Consumer {id} of channel {} is too slow, detaching", self.channel);
                    dropped.push(*id);
                }
                Err(TrySendError::Disconnected(_)) => dropped.push(*id),
            }
        }
        if dropped.is_empty() {
            return;
        }
        for id in dropped {
            inner.consumers.remove(&id);
        }
        if inner.consumers.is_empty() {
            self.schedule_idle(&mut inner);
        }
    }

    fn follow_stderr(self: Arc<Self>, stderr: Box<dyn Read + Send>) {
        let mut reader = BufReader::new(stderr);
        let mut raw = Vec::new();
        loop {
            raw.clear();
            match reader.read_until(b'\n', &mut raw) {
                Ok(0) => break,
                Ok(_) => {
                    let line = String::from_utf8_lossy(&raw);
                    let line = line.trim_end();
                    if line.is_empty() {
                        continue;
                    }
                    debug!("[{}] {line}", self.channel);
                    let mut inner = self.lock();
                    if let Some(tracker) = inner.tracker.as_mut() {
                        tracker.observe_line(line);
                    }
                    if inner.stderr_tail.len() == STDERR_TAIL_LINES {
                        inner.stderr_tail.pop_front();
                    }
                    inner.stderr_tail.push_back(line.to_string());
                }
                Err(e) => {
                    debug!("Stderr of channel {} closed: {e}", self.channel);
                    break;
                }
            }
        }
    }

    // ---- Consumers ----

    /// Attaches a new consumer. Fails once the session is no longer running.
    ///
    /// The first consumer also receives the output buffered before it came.
    pub fn attach(self: &Arc<Self>) -> CoreResult<ConsumerHandle> {
        let mut inner = self.lock();
        if !inner.state.is_running() {
            return Err(CoreError::SessionStopped(self.channel.clone()));
        }
        let id = inner.next_consumer_id;
        inner.next_consumer_id += 1;
        let (sender, receiver) = sync_channel(self.settings.consumer_buffer.max(1));
        // The backlog never outgrows the channel, so none of these can block
        for chunk in inner.backlog.drain(..) {
            if sender.try_send(chunk).is_err() {
                break;
            }
        }
        inner.consumers.insert(id, sender);
        inner.idle_generation += 1;
        self.transition(&mut inner, SessionState::Streaming);
        debug!(
            "Consumer {id} attached to channel {} ({} total)",
            self.channel,
            inner.consumers.len()
        );

        Ok(ConsumerHandle {
            id,
            session: Arc::clone(self),
            receiver,
            pending: Arc::from(&[][..]),
            offset: 0,
        })
    }

    fn detach(self: &Arc<Self>, id: u64) {
        let mut inner = self.lock();
        if inner.consumers.remove(&id).is_none() {
            return;
        }
        debug!("Consumer {id} detached from channel {}", self.channel);
        if inner.consumers.is_empty() {
            self.schedule_idle(&mut inner);
        }
    }

    fn schedule_idle(self: &Arc<Self>, inner: &mut SessionInner) {
        if !inner.state.is_running() {
            return;
        }
        inner.idle_generation += 1;
        let generation = inner.idle_generation;
        let grace = self.settings.idle_grace;
        debug!("Channel {} has no consumers; stopping in {grace:?}", self.channel);

        let session = Arc::clone(self);
        let spawned = thread::Builder::new()
            .name(format!("idle-{}", self.channel))
            .spawn(move || {
                thread::sleep(grace);
                session.expire_idle(generation);
            });
        if let Err(e) = spawned {
            warn!("Could not start idle timer for channel {}: {e}", self.channel);
        }
    }

    fn expire_idle(&self, generation: u64) {
        {
            let inner = self.lock();
            if inner.idle_generation != generation
                || !inner.consumers.is_empty()
                || !inner.state.is_running()
            {
                return;
            }
        }
        info!("Channel {} idle for {:?}, stopping", self.channel, self.settings.idle_grace);
        if let Err(e) = self.stop() {
            error!("Stopping idle channel {} failed: {e}", self.channel);
        }
    }

    // ---- Teardown ----

    /// Kills the transcoder, waits for its threads and removes scratch files.
    ///
    /// Everything is released before this returns, also for a caller that
    /// arrives while another stop is in progress. Calling it again is a no-op.
    pub fn stop(&self) -> CoreResult<()> {
        let _teardown = self.teardown.lock().unwrap_or_else(PoisonError::into_inner);
        let (process, handles) = {
            let mut inner = self.lock();
            if inner.cleaned {
                return Ok(());
            }
            self.transition(&mut inner, SessionState::Stopping);
            inner.consumers.clear();
            inner.backlog.clear();
            inner.idle_generation += 1;
            inner.fallback = None;
            (inner.process.take(), std::mem::take(&mut inner.threads))
        };

        if let Some(mut process) = process {
            if let Err(e) = process.kill() {
                warn!("Failed to kill transcoder for channel {}: {e}", self.channel);
            }
            match process.wait() {
                Ok(exit) => debug!("Transcoder for channel {} exited with {:?}", self.channel, exit.code),
                Err(e) => warn!("Failed to reap transcoder for channel {}: {e}", self.channel),
            }
        }

        let current = thread::current().id();
        for handle in handles {
            if handle.thread().id() == current {
                continue;
            }
            if handle.join().is_err() {
                warn!("A worker thread of channel {} panicked", self.channel);
            }
        }

        let mut result = Ok(());
        if let SessionOutput::Segmented { dir, .. } = &self.output {
            if let Err(e) = remove_dir_if_exists(dir) {
                error!("Could not remove {}: {e}", dir.display());
                result = Err(e);
            }
        }
        for file in &self.scratch_files {
            match fs::remove_file(file) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => warn!("Could not remove {}: {e}", file.display()),
            }
        }

        let mut inner = self.lock();
        inner.cleaned = true;
        self.transition(&mut inner, SessionState::Terminated);
        result
    }

    /// Polls until the session is finished or `timeout` passes.
    pub fn wait_until_finished(&self, timeout: Option<Duration>) -> SessionState {
        let started = Instant::now();
        loop {
            let state = self.state();
            if state.is_finished() {
                return state;
            }
            if timeout.is_some_and(|limit| started.elapsed() >= limit) {
                return state;
            }
            thread::sleep(self.settings.poll_interval);
        }
    }

    // ---- Observation ----

    pub fn channel(&self) -> &str {
        &self.channel
    }

    pub fn state(&self) -> SessionState {
        self.lock().state
    }

    pub fn output(&self) -> &SessionOutput {
        &self.output
    }

    /// Playlist path of a segmented session.
    pub fn playlist(&self) -> Option<&Path> {
        match &self.output {
            SessionOutput::Segmented { playlist, .. } => Some(playlist),
            SessionOutput::Pipe => None,
        }
    }

    pub fn consumer_count(&self) -> usize {
        self.lock().consumers.len()
    }

    /// How many processes this session has started, fallbacks included.
    pub fn spawn_count(&self) -> u32 {
        self.lock().spawn_count
    }

    pub fn bytes_streamed(&self) -> u64 {
        self.lock().bytes_out
    }

    pub fn started_at(&self) -> DateTime<Local> {
        self.started_at
    }

    pub fn uptime(&self) -> chrono::Duration {
        Local::now().signed_duration_since(self.started_at)
    }

    /// Concat entry currently playing.
    pub fn current_item(&self) -> Option<usize> {
        self.lock().tracker.as_ref().and_then(ConcatTracker::current)
    }

    pub fn items_started(&self) -> usize {
        self.lock().tracker.as_ref().map_or(0, ConcatTracker::items_started)
    }

    /// Playback time of fully played concat entries.
    pub fn completed_duration(&self) -> Duration {
        self.lock()
            .tracker
            .as_ref()
            .map_or(Duration::ZERO, ConcatTracker::completed_duration)
    }

    /// The failure that put the session into `Error`.
    pub fn failure(&self) -> Option<CoreError> {
        let inner = self.lock();
        if inner.state != SessionState::Error {
            return None;
        }
        Some(CoreError::ProcessExited {
            code: inner.last_exit.and_then(|exit| exit.code),
            stderr: tail_text(&inner.stderr_tail),
        })
    }
}

impl Drop for StreamSession {
    fn drop(&mut self) {
        let inner = self.inner.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Some(mut process) = inner.process.take() {
            warn!("Session for channel {} dropped without stop", self.channel);
            let _ = process.kill();
            let _ = process.wait();
        }
    }
}

fn tail_text(tail: &VecDeque<String>) -> String {
    tail.iter().map(String::as_str).collect::<Vec<_>>().join("\n")
}

/// One consumer of a session's byte stream.
///
/// Reading returns end-of-file once the session stops or the consumer is
/// detached for being too slow. Dropping the handle detaches it.
pub struct ConsumerHandle {
    id: u64,
    session: Arc<StreamSession>,
    receiver: Receiver<Arc<[u8]>>,
    pending: Arc<[u8]>,
    offset: usize,
}

impl ConsumerHandle {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn session(&self) -> &Arc<StreamSession> {
        &self.session
    }

    /// Next chunk, or `None` on timeout or end of stream.
    pub fn recv_timeout(&mut self, timeout: Duration) -> Option<Arc<[u8]>> {
        if self.offset < self.pending.len() {
            let rest = Arc::from(&self.pending[self.offset..]);
            self.offset = self.pending.len();
            return Some(rest);
        }
        self.receiver.recv_timeout(timeout).ok()
    }
}

impl Read for ConsumerHandle {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        while self.offset >= self.pending.len() {
            match self.receiver.recv() {
                Ok(chunk) => {
                    self.pending = chunk;
                    self.offset = 0;
                }
                Err(_) => return Ok(0),
            }
        }
        let available = &self.pending[self.offset..];
        let n = available.len().min(buf.len());
        buf[..n].copy_from_slice(&available[..n]);
        self.offset += n;
        Ok(n)
    }
}

impl Drop for ConsumerHandle {
    fn drop(&mut self) {
        self.session.detach(self.id);
    }
}

impl fmt::Debug for ConsumerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConsumerHandle")
            .field("id", &self.id)
            .field("channel", &self.session.channel)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_predicates() {
        assert!(SessionState::Ready.is_running());
        assert!(SessionState::Streaming.is_running());
        assert!(!SessionState::Initializing.is_running());
        assert!(SessionState::Error.is_finished());
        assert!(SessionState::Terminated.is_finished());
        assert!(!SessionState::Stopping.is_finished());
        assert_eq!(SessionState::Streaming.to_string(), "streaming");
    }

    #[test]
    fn test_settings_follow_config() {
        let config = CoreConfig {
            idle_grace_ms: 250,
            readiness_attempts: 3,
            ..CoreConfig::default()
        };
        let settings = SessionSettings::from_config(&config);
        assert_eq!(settings.idle_grace, Duration::from_millis(250));
        assert_eq!(settings.readiness.attempts(), 4);
    }

    #[test]
    fn test_tail_text_joins_lines() {
        let tail: VecDeque<String> = ["a", "b"].iter().map(|s| s.to_string()).collect();
        assert_eq!(tail_text(&tail), "a\nb");
    }
}
