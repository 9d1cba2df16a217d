// Heartbeat receipts and derived screen liveness.
//
// The tracker stamps its own monotonic clock when a heartbeat arrives, so
// delayed or reordered deliveries can never move a screen's last-seen time
// backwards. Status is computed at read time against a staleness threshold;
// nothing stores an online flag.
use marquee_common::ScreenToken;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Displays beat every 30 seconds; three misses read as offline.
pub const DEFAULT_STALE_THRESHOLD: Duration = Duration::from_secs(90);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenStatus {
    Online,
    Offline,
}

impl ScreenStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScreenStatus::Online => "online",
            ScreenStatus::Offline => "offline",
        }
    }
}

/// Last-seen registry for display screens.
///
/// There is no disconnect signal in the heartbeat protocol; silence past the
/// threshold is the only offline indicator.
#[derive(Debug)]
pub struct PresenceTracker {
    last_seen: RwLock<HashMap<ScreenToken, Instant>>,
    stale_threshold: Duration,
}

impl Default for PresenceTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl PresenceTracker {
    pub fn new() -> Self {
        Self::with_stale_threshold(DEFAULT_STALE_THRESHOLD)
    }

    pub fn with_stale_threshold(stale_threshold: Duration) -> Self {
        Self {
            last_seen: RwLock::new(HashMap::new()),
            stale_threshold,
        }
    }

    pub fn stale_threshold(&self) -> Duration {
        self.stale_threshold
    }

    /// Stamp the receipt time for a token. Overwrites unconditionally: the
    /// tracker's own clock is monotone, so the newest receipt always wins.
    pub fn record_heartbeat(&self, token: &ScreenToken) {
        let mut last_seen = self.last_seen.write();
        last_seen.insert(token.clone(), Instant::now());
        metrics::gauge!("marquee_presence_tracked_screens").set(last_seen.len() as f64);
    }

    /// Derived status: online iff a heartbeat landed within the threshold.
    /// Unknown tokens are offline, not an error.
    pub fn status(&self, token: &ScreenToken) -> ScreenStatus {
        match self.last_seen.read().get(token) {
            Some(seen) if seen.elapsed() <= self.stale_threshold => ScreenStatus::Online,
            _ => ScreenStatus::Offline,
        }
    }

    /// Seconds since the last heartbeat, if one was ever received.
    pub fn last_seen_age(&self, token: &ScreenToken) -> Option<Duration> {
        self.last_seen.read().get(token).map(Instant::elapsed)
    }

    /// Drop a token's state, e.g. when its screen is deleted.
    pub fn forget(&self, token: &ScreenToken) {
        let mut last_seen = self.last_seen.write();
        last_seen.remove(token);
        metrics::gauge!("marquee_presence_tracked_screens").set(last_seen.len() as f64);
    }

    pub fn tracked_count(&self) -> usize {
        self.last_seen.read().len()
    }
}
