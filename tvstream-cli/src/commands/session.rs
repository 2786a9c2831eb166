// ============================================================================
// tvstream-cli/src/commands/session.rs
// ============================================================================
//
// SESSION DRIVER: Running One Channel Session From the Terminal
//
// Shared by `play` and `concat`. Byte-stream sessions are attached to and
// copied to stdout or a file; segmented sessions are watched until they
// finish. Either way the session is stopped on the way out.
//
// AI-ASSISTANT-INFO: Runs a channel session and reports its progress

use std::fs::File;
use std::io::{self, BufWriter, ErrorKind, Write};
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, info, warn};
use tvstream_core::{CoreConfig, SessionManager, SessionSpec, SessionState, SidecarSpawner, StreamSession};

use crate::cli::SessionArgs;
use crate::error::{CliErrorContext, CliResult};
use crate::terminal::{StreamProgress, print_section, print_status, print_success};

const POLL: Duration = Duration::from_millis(250);

/// Why the copy loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StopReason {
    Finished,
    Limit,
    ReaderGone,
    Detached,
}

/// Starts `spec` and drives it until it ends, the limit passes or the
/// reader goes away.
pub fn run_session(config: CoreConfig, spec: SessionSpec, args: &SessionArgs) -> CliResult<()> {
    debug!("Transcoder command: {}", spec.request.display());

    let manager = SessionManager::new(config, Arc::new(SidecarSpawner));
    let session = manager.get_or_create(spec)?;
    let deadline = args.limit.map(|secs| Instant::now() + Duration::from_secs(secs));

    print_section("Session");
    print_status("Channel", session.channel(), true);
    print_status("State", session.state().as_str(), false);

    let outcome = match session.playlist() {
        Some(playlist) => {
            print_status("Playlist", &playlist.display().to_string(), true);
            watch_segmented(&session, deadline)
        }
        None => stream_to_output(&session, args, deadline),
    };

    let state = session.state();
    let failure = session.failure();
    let bytes = session.bytes_streamed();
    manager.stop_all()?;

    let reason = outcome?;
    if let Some(err) = failure {
        return Err(err);
    }

    info!("Channel {} ended ({reason:?}) in state {state}", session.channel());
    print_success(&format!(
        "Channel {} stopped after {} bytes",
        session.channel(),
        bytes
    ));
    Ok(())
}

fn past(deadline: Option<Instant>) -> bool {
    deadline.is_some_and(|d| Instant::now() >= d)
}

fn stream_to_output(session: &Arc<StreamSession>, args: &SessionArgs, deadline: Option<Instant>) -> CliResult<StopReason> {
    let writer: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).cli_with_context(|| format!("Failed to create output {}", path.display()))?,
        )),
        None => Box::new(io::stdout().lock()),
    };
    copy_stream(session, writer, deadline)
}

fn copy_stream(session: &Arc<StreamSession>, mut writer: Box<dyn Write>, deadline: Option<Instant>) -> CliResult<StopReason> {
    let mut consumer = session.attach()?;
    let progress = StreamProgress::new(session.channel());

    let reason = loop {
        if past(deadline) {
            break StopReason::Limit;
        }
        match consumer.recv_timeout(POLL) {
            Some(chunk) => match writer.write_all(&chunk) {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::BrokenPipe => break StopReason::ReaderGone,
                Err(e) => {
                    progress.finish();
                    return Err(e.into());
                }
            },
            None if session.state().is_finished() => break StopReason::Finished,
            None if session.consumer_count() == 0 => {
                warn!("Output could not keep up and was detached from channel {}", session.channel());
                break StopReason::Detached;
            }
            None => {}
        }
        progress.update(session.state().as_str(), session.bytes_streamed());
    };

    progress.finish();
    if let Err(e) = writer.flush() {
        if e.kind() != ErrorKind::BrokenPipe {
            return Err(e.into());
        }
    }
    Ok(reason)
}

fn watch_segmented(session: &Arc<StreamSession>, deadline: Option<Instant>) -> CliResult<StopReason> {
    let progress = StreamProgress::new(session.channel());
    let reason = loop {
        let state = session.wait_until_finished(Some(POLL));
        if state.is_finished() {
            break StopReason::Finished;
        }
        if past(deadline) {
            break StopReason::Limit;
        }
        progress.update(state.as_str(), session.bytes_streamed());
    };
    progress.finish();
    if session.state() == SessionState::Error {
        warn!("Channel {} failed", session.channel());
    }
    Ok(reason)
}
