//! Detection of too-frequent reconnects.
//!
//! A client stuck in a reconnect loop asks for the same item over and over.
//! The throttle remembers the last request per session token in a bounded
//! map; entries older than the retention window are dropped on every check.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use log::warn;

use crate::config::CoreConfig;

/// Identifies the item a reconnect asked for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ThrottleKey {
    pub key: String,
    /// Offline and error screens never count as repeats
    pub offline: bool,
}

impl ThrottleKey {
    pub fn new(key: impl Into<String>, offline: bool) -> Self {
        Self {
            key: key.into(),
            offline,
        }
    }
}

#[derive(Debug, Clone)]
struct ThrottleEntry {
    last_seen: Instant,
    item: Option<ThrottleKey>,
}

/// Bounded, time-windowed map of the last request per session token.
#[derive(Debug)]
pub struct ReconnectThrottle {
    retention: Duration,
    too_frequent: Duration,
    capacity: usize,
    entries: HashMap<String, ThrottleEntry>,
}

impl ReconnectThrottle {
    /// `window` is how long entries are kept; repeats within a fifth of it
    /// count as too frequent.
    pub fn new(window: Duration, capacity: usize) -> Self {
        Self {
            retention: window,
            too_frequent: window / 5,
            capacity: capacity.max(1),
            entries: HashMap::new(),
        }
    }

    pub fn from_config(config: &CoreConfig) -> Self {
        Self::new(config.throttle_window(), config.throttle_capacity)
    }

    /// Records a request and reports whether it repeats the previous one too soon.
    pub fn too_many_attempts(&mut self, token: &str, item: Option<&ThrottleKey>) -> bool {
        self.check_at(token, item, Instant::now())
    }

    pub fn check_at(&mut self, token: &str, item: Option<&ThrottleKey>, now: Instant) -> bool {
        self.expire(now);

        let too_frequent = self.entries.get(token).is_some_and(|previous| {
            now.saturating_duration_since(previous.last_seen) <= self.too_frequent
                && same_item(previous.item.as_ref(), item)
        });

        if !self.entries.contains_key(token) && self.entries.len() >= self.capacity {
            self.evict_oldest();
        }
        self.entries.insert(
            token.to_string(),
            ThrottleEntry {
                last_seen: now,
                item: item.cloned(),
            },
        );

        if too_frequent {
            warn!("Session {token} is reconnecting too frequently");
        }
        too_frequent
    }

    fn expire(&mut self, now: Instant) {
        let retention = self.retention;
        self.entries
            .retain(|_, entry| now.saturating_duration_since(entry.last_seen) <= retention);
    }

    fn evict_oldest(&mut self) {
        if let Some(oldest) = self
            .entries
            .iter()
            .min_by_key(|(_, entry)| entry.last_seen)
            .map(|(token, _)| token.clone())
        {
            self.entries.remove(&oldest);
        }
    }

    /// Number of tracked tokens.
    pub fn tracked(&self) -> usize {
        self.entries.len()
    }
}

fn same_item(previous: Option<&ThrottleKey>, current: Option<&ThrottleKey>) -> bool {
    match (previous, current) {
        (Some(a), Some(b)) => !a.offline && !b.offline && a.key == b.key,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn throttle() -> ReconnectThrottle {
        ReconnectThrottle::new(Duration::from_secs(5), 4)
    }

    #[test]
    fn test_first_request_is_never_throttled() {
        let mut throttle = throttle();
        let item = ThrottleKey::new("program:/media/a.mkv", false);
        assert!(!throttle.check_at("token", Some(&item), Instant::now()));
    }

    #[test]
    fn test_repeat_within_interval_is_throttled() {
        let mut throttle = throttle();
        let item = ThrottleKey::new("program:/media/a.mkv", false);
        let t0 = Instant::now();
        assert!(!throttle.check_at("token", Some(&item), t0));
        assert!(throttle.check_at("token", Some(&item), t0 + Duration::from_millis(500)));
        // more than a fifth of the window later
        assert!(!throttle.check_at("token", Some(&item), t0 + Duration::from_millis(2000)));
    }

    #[test]
    fn test_different_or_offline_items_are_not_repeats() {
        let mut throttle = throttle();
        let a = ThrottleKey::new("program:/media/a.mkv", false);
        let b = ThrottleKey::new("program:/media/b.mkv", false);
        let offline = ThrottleKey::new("offline", true);
        let t0 = Instant::now();
        throttle.check_at("token", Some(&a), t0);
        assert!(!throttle.check_at("token", Some(&b), t0 + Duration::from_millis(100)));
        throttle.check_at("token", Some(&offline), t0 + Duration::from_millis(200));
        assert!(!throttle.check_at("token", Some(&offline), t0 + Duration::from_millis(300)));
        assert!(!throttle.check_at("token", None, t0 + Duration::from_millis(400)));
    }

    #[test]
    fn test_entries_expire_and_capacity_is_bounded() {
        let mut throttle = throttle();
        let item = ThrottleKey::new("program:/media/a.mkv", false);
        let t0 = Instant::now();
        for i in 0..6 {
            throttle.check_at(&format!("token-{i}"), Some(&item), t0 + Duration::from_millis(i));
        }
        assert_eq!(throttle.tracked(), 4);

        throttle.check_at("late", None, t0 + Duration::from_secs(60));
        assert_eq!(throttle.tracked(), 1);
    }
}
