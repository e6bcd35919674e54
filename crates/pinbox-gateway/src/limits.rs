//! Upload size limits

use thiserror::Error;

/// Default payload ceiling (10 MiB)
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// An oversized part is counted up to this many times the limit, then abandoned
pub const MAX_DRAIN_MULTIPLE: u64 = 4;

fn megabytes(bytes: &u64) -> f64 {
    *bytes as f64 / BYTES_PER_MB
}

fn observed_label(observed: &u64, capped: &bool) -> String {
    if *capped {
        format!("more than {:.1} MB", megabytes(observed))
    } else {
        format!("{:.1} MB", megabytes(observed))
    }
}

/// The payload exceeded the configured ceiling
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("File too large: {} exceeds the {:.1} MB limit", observed_label(.observed, .capped), megabytes(.limit))]
pub struct TooLarge {
    /// Observed payload size (bytes)
    pub observed: u64,
    /// Configured ceiling (bytes)
    pub limit: u64,
    /// Counting stopped before the end of the payload, `observed` is a lower bound
    pub capped: bool,
}

/// Check a fully known payload size against `max_bytes`
pub fn check(payload_size: u64, max_bytes: u64) -> Result<(), TooLarge> {
    if payload_size > max_bytes {
        Err(TooLarge {
            observed: payload_size,
            limit: max_bytes,
            capped: false,
        })
    } else {
        Ok(())
    }
}

/// Running total for a payload that arrives in chunks.
///
/// `accumulate` fails as soon as the total passes the limit, before the
/// offending chunk is buffered anywhere.
#[derive(Clone, Copy, Debug)]
pub struct SizeGuard {
    limit: u64,
    total: u64,
}

impl SizeGuard {
    /// Create a guard with the given ceiling
    pub fn new(limit: u64) -> Self {
        Self { limit, total: 0 }
    }

    /// Add `len` bytes to the running total
    pub fn accumulate(&mut self, len: usize) -> Result<(), TooLarge> {
        self.total = self.total.saturating_add(len as u64);
        check(self.total, self.limit)
    }

    /// Bytes seen so far
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Configured ceiling
    pub fn limit(&self) -> u64 {
        self.limit
    }

    /// Whether an oversized payload has been counted far enough
    pub fn drain_exhausted(&self) -> bool {
        self.total > self.limit.saturating_mul(MAX_DRAIN_MULTIPLE)
    }
}
