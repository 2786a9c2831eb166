//! Waiting for a segmented session's playlist to appear.
//!
//! The transcoder needs a few seconds before the first segment and the
//! playlist are written. The poll is bounded: a fixed number of retries with a
//! multiplicative backoff, and it stops early when the process has already
//! exited so the caller can tell "never became ready" from "died while
//! starting".

use std::path::Path;
use std::thread;
use std::time::Duration;

use log::{debug, warn};

use crate::config::CoreConfig;
use crate::error::{CoreError, CoreResult};
use crate::stream::process::ProcessExit;

/// Bounded retry schedule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub retries: u32,
    pub factor: f64,
    pub min_delay: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &CoreConfig) -> Self {
        Self {
            retries: config.readiness_attempts,
            factor: config.readiness_factor,
            min_delay: config.readiness_min_delay(),
        }
    }

    /// Total number of checks, including the first.
    pub fn attempts(&self) -> u32 {
        self.retries.saturating_add(1)
    }

    /// Delay before retry `n` (0-based).
    pub fn delay(&self, retry: u32) -> Duration {
        let factor = self.factor.max(1.0).powi(retry.min(i32::MAX as u32) as i32);
        self.min_delay.mul_f64(factor)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&CoreConfig::default())
    }
}

/// Polls for `path` until it exists.
///
/// `exited` is consulted before every sleep; `Some((exit, stderr))` ends the
/// wait with `ExitedBeforeReady`.
pub fn wait_for_file<F>(path: &Path, policy: &RetryPolicy, mut exited: F) -> CoreResult<()>
where
    F: FnMut() -> Option<(ProcessExit, String)>,
{
    for attempt in 0..policy.attempts() {
        if path.exists() {
            debug!("{} ready after {} attempt(s)", path.display(), attempt + 1);
            return Ok(());
        }
        if let Some((exit, stderr)) = exited() {
            warn!(
                "Transcoder exited with code {:?} before {} appeared",
                exit.code,
                path.display()
            );
            return Err(CoreError::ExitedBeforeReady {
                path: path.to_path_buf(),
                code: exit.code,
                stderr,
            });
        }
        if attempt < policy.retries {
            thread::sleep(policy.delay(attempt));
        }
    }

    Err(CoreError::ReadinessTimeout {
        path: path.to_path_buf(),
        attempts: policy.attempts(),
    })
}
