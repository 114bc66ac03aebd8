//! Time-bucketed sliding window shared by the error and latency counters.
//!
//! The window holds one bucket per second, indexed by `epoch_secs % len`.
//! Stale buckets are cleared lazily: every read or write first calls
//! `touch(now)`, which zeroes whatever has rolled out of the window since the
//! last write. The clearing pass and the access that follows run under the
//! same lock, so no caller ever observes a half-cleared window.

use parking_lot::Mutex;

/// What a single one-second slot holds.
pub trait Bucket: Default + Send {
    fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Plain event counter (used for server errors).
impl Bucket for u64 {}

/// Sum and count of latencies observed during one second.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LatencyBucket {
    pub sum_ms: i64,
    pub count: u64,
}

impl Bucket for LatencyBucket {}

/// Thread-safe ring of `len` one-second buckets plus a lifetime counter.
pub struct BucketedWindow<B> {
    state: Mutex<WindowState<B>>,
}

struct WindowState<B> {
    buckets: Box<[B]>,
    /// Epoch second of the last write; `None` until the first write after
    /// construction or reset.
    last_write: Option<i64>,
    /// Events ever recorded; only `reset` clears it.
    lifetime_total: u64,
}

impl<B: Bucket> BucketedWindow<B> {
    /// Create a window spanning `len` seconds. `len` must be non-zero.
    pub fn new(len: usize) -> Self {
        assert!(len > 0, "window length must be at least one second");
        Self {
            state: Mutex::new(WindowState::new(len)),
        }
    }

    /// Window length in seconds.
    pub fn span_secs(&self) -> usize {
        self.state.lock().buckets.len()
    }

    /// Apply `update` to the bucket for `now` and bump the lifetime total.
    /// `last_write` only ever moves forward.
    pub fn record(&self, now: i64, update: impl FnOnce(&mut B)) {
        let mut state = self.state.lock();
        state.touch(now);
        let idx = state.index(now);
        update(&mut state.buckets[idx]);
        state.lifetime_total += 1;
        state.last_write = Some(state.last_write.map_or(now, |last| last.max(now)));
    }

    /// Fold over every bucket still inside the window ending at `now`.
    pub fn fold<T>(&self, now: i64, init: T, f: impl FnMut(T, &B) -> T) -> T {
        let mut state = self.state.lock();
        state.touch(now);
        state.buckets.iter().fold(init, f)
    }

    pub fn lifetime_total(&self) -> u64 {
        self.state.lock().lifetime_total
    }

    /// Zero every bucket and the lifetime total, and forget the last write.
    pub fn reset(&self) {
        let len = self.span_secs();
        *self.state.lock() = WindowState::new(len);
    }
}

impl<B: Bucket> WindowState<B> {
    fn new(len: usize) -> Self {
        Self {
            buckets: (0..len).map(|_| B::default()).collect(),
            last_write: None,
            lifetime_total: 0,
        }
    }

    fn index(&self, secs: i64) -> usize {
        secs.rem_euclid(self.buckets.len() as i64) as usize
    }

    fn clear_all(&mut self) {
        self.buckets.iter_mut().for_each(|b| b.clear());
    }

    /// Drop data that has aged out of the window ending at `now`.
    ///
    /// Does not move `last_write`; only `record` does. A clock that went
    /// backwards yields an empty clearing range, so existing data is kept.
    fn touch(&mut self, now: i64) {
        let len = self.buckets.len() as i64;
        match self.last_write {
            None => self.clear_all(),
            Some(last) if now.saturating_sub(last) >= len => {
                tracing::debug!(last, now, "window fully stale, clearing all buckets");
                self.clear_all();
            }
            Some(last) => {
                for second in (last + 1)..=now {
                    if now - second < len {
                        let idx = self.index(second);
                        self.buckets[idx].clear();
                    }
                }
            }
        }
    }
}
