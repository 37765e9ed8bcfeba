//! Per-Key Token-Bucket Rate Limiter
//!
//! Bounds the call rate of any keyed action (conventionally
//! `user_id:action`) to a steady rate with burst capacity. Buckets are
//! created lazily with a full allowance, so the first call for any key
//! always succeeds. Fractional tokens are retained across refills so
//! sub-second bursts amortize smoothly.
//!
//! In-memory and single-process only: counters are not shared across
//! instances. Backed by a concurrent map so the per-key read-modify-write
//! stays correct under a parallel runtime.

use std::time::{Duration, Instant};

use dashmap::DashMap;

/// Rate options for one action. `per_minute` is the usual constructor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateLimitOptions {
    /// Maximum tokens (burst size)
    pub capacity: f64,
    /// Tokens added per millisecond
    pub refill_per_ms: f64,
}

/// Preset: N requests per minute with burst capacity N.
pub fn per_minute(n: u32) -> RateLimitOptions {
    RateLimitOptions {
        capacity: f64::from(n),
        refill_per_ms: f64::from(n) / 60_000.0,
    }
}

/// Outcome of one admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Granted,
    /// Denied; `retry_after` is the time until one token accumulates.
    Denied { retry_after: Duration },
}

impl Admission {
    pub fn is_granted(&self) -> bool {
        matches!(self, Admission::Granted)
    }
}

#[derive(Debug, Clone, Copy)]
struct Bucket {
    tokens: f64,
    last_refill: Instant,
}

/// In-memory token-bucket limiter keyed by opaque strings.
#[derive(Debug, Default)]
pub struct RateLimiter {
    buckets: DashMap<String, Bucket>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume one token from the bucket for `key`, refilling first.
    pub fn consume(&self, key: &str, opts: RateLimitOptions) -> Admission {
        self.consume_at(key, opts, Instant::now())
    }

    fn consume_at(&self, key: &str, opts: RateLimitOptions, now: Instant) -> Admission {
        let mut entry = self.buckets.entry(key.to_string()).or_insert(Bucket {
            tokens: opts.capacity,
            last_refill: now,
        });

        let elapsed_ms = now.saturating_duration_since(entry.last_refill).as_secs_f64() * 1000.0;
        if elapsed_ms > 0.0 {
            entry.tokens = (entry.tokens + elapsed_ms * opts.refill_per_ms).min(opts.capacity);
            entry.last_refill = now;
        }

        if entry.tokens >= 1.0 {
            entry.tokens -= 1.0;
            return Admission::Granted;
        }

        let deficit = 1.0 - entry.tokens;
        let wait_ms = (deficit / opts.refill_per_ms).ceil();
        let retry_after = if wait_ms.is_finite() {
            Duration::from_millis(wait_ms as u64)
        } else {
            // Zero refill rate: the bucket will never recover.
            Duration::MAX
        };
        Admission::Denied { retry_after }
    }

    /// Remove buckets untouched for longer than `max_idle`, bounding map
    /// growth for deployments with many distinct keys. Returns the number
    /// of buckets removed. Callers decide when (if ever) to run this.
    pub fn sweep_idle(&self, max_idle: Duration) -> usize {
        let now = Instant::now();
        let before = self.buckets.len();
        self.buckets
            .retain(|_, bucket| now.saturating_duration_since(bucket.last_refill) <= max_idle);
        before - self.buckets.len()
    }

    /// Number of live buckets.
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}
