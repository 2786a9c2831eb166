//! One session per channel.
//!
//! The manager hands out existing sessions, starts new ones and owns the
//! reconnect throttle. Starting a session (which may wait for a playlist)
//! happens outside the map lock so one slow channel never blocks another.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::{debug, info, warn};

use crate::config::CoreConfig;
use crate::error::CoreResult;
use crate::stream::plan::session_dir;
use crate::stream::process::TranscoderSpawner;
use crate::stream::session::{SessionSettings, SessionSpec, StreamSession};
use crate::stream::throttle::{ReconnectThrottle, ThrottleKey};

pub struct SessionManager {
    config: CoreConfig,
    settings: SessionSettings,
    spawner: Arc<dyn TranscoderSpawner>,
    sessions: Mutex<HashMap<String, Arc<StreamSession>>>,
    throttle: Mutex<ReconnectThrottle>,
}

impl SessionManager {
    pub fn new(config: CoreConfig, spawner: Arc<dyn TranscoderSpawner>) -> Self {
        let settings = SessionSettings::from_config(&config);
        Self::with_settings(config, spawner, settings)
    }

    pub fn with_settings(
        config: CoreConfig,
        spawner: Arc<dyn TranscoderSpawner>,
        settings: SessionSettings,
    ) -> Self {
        let throttle = ReconnectThrottle::from_config(&config);
        Self {
            config,
            settings,
            spawner,
            sessions: Mutex::new(HashMap::new()),
            throttle: Mutex::new(throttle),
        }
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    fn sessions(&self) -> MutexGuard<'_, HashMap<String, Arc<StreamSession>>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Segment directory for `channel`.
    pub fn session_dir(&self, channel: &str) -> PathBuf {
        session_dir(&self.config, channel)
    }

    /// Running session of `channel`, if any.
    pub fn get(&self, channel: &str) -> Option<Arc<StreamSession>> {
        self.sessions()
            .get(channel)
            .filter(|session| session.state().is_running())
            .cloned()
    }

    /// Returns the channel's running session or starts one from `spec`.
    ///
    /// A finished session left in the map is stopped and replaced.
    pub fn get_or_create(&self, spec: SessionSpec) -> CoreResult<Arc<StreamSession>> {
        let channel = spec.channel.clone();
        let stale = {
            let mut sessions = self.sessions();
            let running = sessions
                .get(&channel)
                .filter(|s| s.state().is_running())
                .cloned();
            if let Some(existing) = running {
                debug!("Reusing session for channel {channel}");
                return Ok(existing);
            }
            sessions.remove(&channel)
        };
        if let Some(stale) = stale {
            debug!("Replacing {} session for channel {channel}", stale.state());
            stale.stop()?;
        }

        let session = StreamSession::start(spec, Arc::clone(&self.spawner), self.settings)?;

        let mut sessions = self.sessions();
        let winner = sessions
            .get(&channel)
            .filter(|s| s.state().is_running())
            .cloned();
        if let Some(winner) = winner {
            // Another caller started the channel while this one was starting.
            drop(sessions);
            session.stop()?;
            return Ok(winner);
        }
        sessions.insert(channel, Arc::clone(&session));
        Ok(session)
    }

    /// Stops the channel's session. Returns false when there was none.
    pub fn stop(&self, channel: &str) -> CoreResult<bool> {
        let session = self.sessions().remove(channel);
        match session {
            Some(session) => {
                info!("Stopping channel {channel}");
                session.stop()?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Stops every session, reporting the first failure after trying all.
    pub fn stop_all(&self) -> CoreResult<()> {
        let sessions: Vec<_> = self.sessions().drain().collect();
        let mut first_error = None;
        for (channel, session) in sessions {
            if let Err(e) = session.stop() {
                warn!("Failed to stop channel {channel}: {e}");
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Drops finished sessions from the map, cleaning up after them.
    pub fn reap(&self) -> usize {
        let finished: Vec<_> = {
            let mut sessions = self.sessions();
            let channels: Vec<String> = sessions
                .iter()
                .filter(|(_, s)| s.state().is_finished())
                .map(|(c, _)| c.clone())
                .collect();
            channels
                .into_iter()
                .filter_map(|c| sessions.remove(&c))
                .collect()
        };
        for session in &finished {
            if let Err(e) = session.stop() {
                warn!("Cleanup of channel {} failed: {e}", session.channel());
            }
        }
        finished.len()
    }

    /// Channels with a running session, sorted.
    pub fn active_channels(&self) -> Vec<String> {
        let mut channels: Vec<String> = self
            .sessions()
            .iter()
            .filter(|(_, s)| s.state().is_running())
            .map(|(c, _)| c.clone())
            .collect();
        channels.sort();
        channels
    }

    /// See [`ReconnectThrottle::too_many_attempts`].
    pub fn too_many_attempts(&self, token: &str, item: Option<&ThrottleKey>) -> bool {
        self.throttle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .too_many_attempts(token, item)
    }
}

impl Drop for SessionManager {
    fn drop(&mut self) {
        if let Err(e) = self.stop_all() {
            warn!("Stopping sessions on shutdown: {e}");
        }
    }
}
