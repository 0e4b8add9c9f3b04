//! Per-client request throttling.
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::debug;

// expired entries are swept once the table grows past this, at most once
// per SWEEP_INTERVAL
const SWEEP_THRESHOLD: usize = 4096;
const SWEEP_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Default)]
struct Slots {
    expiries: HashMap<String, Instant>,
    last_sweep: Option<Instant>,
}

impl Slots {
    fn sweep_due(&self, now: Instant) -> bool {
        self.expiries.len() > SWEEP_THRESHOLD
            && self
                .last_sweep
                .is_none_or(|last| now.saturating_duration_since(last) >= SWEEP_INTERVAL)
    }
}

/// Admits at most one request per bucket and client within a period.
///
/// Built once at startup and shared by every request handler.
#[derive(Default)]
pub struct RateLimiter {
    entries: Mutex<Slots>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a request and returns whether it is allowed. A request is
    /// refused while an earlier admitted one for the same bucket and client
    /// is younger than `period`.
    pub fn try_acquire(&self, bucket: &str, client: &str, period: Duration) -> bool {
        self.try_acquire_at(bucket, client, period, Instant::now())
    }

    fn try_acquire_at(&self, bucket: &str, client: &str, period: Duration, now: Instant) -> bool {
        let mut slots = self.entries.lock();
        if slots.sweep_due(now) {
            let before = slots.expiries.len();
            slots.expiries.retain(|_, expires| *expires > now);
            slots.last_sweep = Some(now);
            debug!(swept = before - slots.expiries.len(), "expired rate limit entries swept");
        }

        let slot = format!("{bucket}:{client}");
        match slots.expiries.get(&slot) {
            Some(expires) if *expires > now => false,
            _ => {
                slots.expiries.insert(slot, now + period);
                true
            }
        }
    }
}
