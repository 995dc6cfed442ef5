//! Generation request pacing
//!
//! The engine exposes a fixed number of concurrent generation channels.
//! Pacing aims to keep them busy without flooding them: a moving average
//! of recent request durations, divided by the channel count, gives a
//! target dispatch period, and a dispatch is deferred while the time
//! since the last dispatch is below that target.
//!
//! Durations are measured from dispatch to completion fold. Completions
//! pass through a two-stage queue drained once per update tick, so a
//! measured duration deliberately includes up to two ticks of follow-on
//! work (scene reconciliation) triggered by the completion itself.

use crate::engine::RequestId;
use crate::foundation::collections::BoundedPool;
use crate::foundation::time::Stopwatch;
use log::debug;
use std::time::Duration;

/// Default number of duration samples in the moving average
pub const DEFAULT_HISTORY_WINDOW: usize = 16;

/// Default number of concurrently tracked requests
pub const DEFAULT_TRACKING_SLOTS: usize = 8;

#[derive(Debug)]
struct TrackingSlot {
    id: RequestId,
    watch: Stopwatch,
}

/// Pacing statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RateLimiterStats {
    /// Requests currently tracked between dispatch and fold
    pub tracked: usize,
    /// Duration samples currently in the moving average
    pub samples: usize,
    /// Completions folded into the history so far
    pub folded: u64,
    /// Tracking slots reclaimed by eviction so far
    pub evictions: u64,
    /// Current target dispatch period
    pub target_period: Duration,
}

/// Moving-average dispatch pacing with bounded request tracking
///
/// Tracking memory is constant: the duration history is a fixed ring and
/// in-flight requests live in a fixed pool. When the pool overflows, the
/// entry with the largest elapsed time is evicted; its completion (if it
/// ever arrives) is dropped without polluting the average.
pub struct RateLimiter {
    history: Vec<Duration>,
    window: usize,
    cursor: usize,
    channels: usize,
    target_period: Duration,
    pacing: Stopwatch,
    tracking: BoundedPool<TrackingSlot>,
    stage_incoming: Vec<RequestId>,
    stage_folding: Vec<RequestId>,
    folded: u64,
    evictions: u64,
}

impl RateLimiter {
    /// Create a limiter for an engine with the given channel count
    ///
    /// Counts of zero are clamped to one.
    pub fn new(channels: usize, history_window: usize, tracking_slots: usize) -> Self {
        let window = history_window.max(1);
        Self {
            history: Vec::with_capacity(window),
            window,
            cursor: 0,
            channels: channels.max(1),
            target_period: Duration::ZERO,
            pacing: Stopwatch::new(),
            tracking: BoundedPool::new(tracking_slots.max(1)),
            stage_incoming: Vec::new(),
            stage_folding: Vec::new(),
            folded: 0,
            evictions: 0,
        }
    }

    /// Adjust the channel count, retargeting immediately
    pub fn set_channel_count(&mut self, channels: usize) {
        self.channels = channels.max(1);
        self.recompute_target();
    }

    /// Current channel count
    pub fn channel_count(&self) -> usize {
        self.channels
    }

    /// Current target dispatch period (zero until the first fold)
    pub fn target_period(&self) -> Duration {
        self.target_period
    }

    /// Should a dispatch be deferred right now?
    ///
    /// True while the time since the last dispatch is under the target
    /// period. Before any dispatch, or while the history is empty, this
    /// is always false: cold starts stay eager.
    pub fn check_defer(&self) -> bool {
        self.pacing.is_running() && self.pacing.elapsed() < self.target_period
    }

    /// Record a dispatch and start tracking its request
    ///
    /// If the tracking pool is full, the entry with the largest elapsed
    /// time is evicted to bound memory; the evicted request's eventual
    /// completion is ignored.
    pub fn begin(&mut self, id: RequestId) {
        let slot = TrackingSlot {
            id,
            watch: Stopwatch::start_new(),
        };
        if let Some(evicted) = self
            .tracking
            .insert_or_evict(slot, |entry| entry.watch.elapsed_secs())
        {
            self.evictions += 1;
            debug!(
                "rate limiter: tracking pool full, evicted {} after {:?}",
                evicted.id,
                evicted.watch.elapsed()
            );
        }
        self.pacing.restart();
    }

    /// Note a request's completion
    ///
    /// The sample is not folded yet; it drains through the two-stage
    /// queue on the next two [`Self::update`] calls. Unknown ids (already
    /// evicted, or never begun) are dropped at fold time.
    pub fn end(&mut self, id: RequestId) {
        self.stage_incoming.push(id);
    }

    /// Fold matured completions and age the staging queues
    ///
    /// Call once per update tick.
    pub fn update(&mut self) {
        let folding = std::mem::take(&mut self.stage_folding);
        for id in folding {
            if let Some(slot) = self.tracking.take_where(|entry| entry.id == id) {
                self.record(slot.watch.elapsed());
                self.folded += 1;
            } else {
                debug!("rate limiter: completion for untracked {id}, sample dropped");
            }
        }
        self.stage_folding = std::mem::take(&mut self.stage_incoming);
    }

    /// Requests currently tracked between dispatch and fold
    pub fn in_flight(&self) -> usize {
        self.tracking.len()
    }

    /// Pacing statistics snapshot
    pub fn stats(&self) -> RateLimiterStats {
        RateLimiterStats {
            tracked: self.tracking.len(),
            samples: self.history.len(),
            folded: self.folded,
            evictions: self.evictions,
            target_period: self.target_period,
        }
    }

    fn record(&mut self, duration: Duration) {
        if self.history.len() < self.window {
            self.history.push(duration);
        } else {
            self.history[self.cursor] = duration;
            self.cursor = (self.cursor + 1) % self.window;
        }
        self.recompute_target();
    }

    fn recompute_target(&mut self) {
        if self.history.is_empty() {
            self.target_period = Duration::ZERO;
            return;
        }
        let total: Duration = self.history.iter().sum();
        let average = total / self.history.len() as u32;
        self.target_period = average / self.channels as u32;
    }
}
