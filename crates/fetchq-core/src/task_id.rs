//! Deterministic task identifiers for deduplication on the managed task service.
//!
//! The id hashes the module path, the version and the current time truncated to
//! [`TASK_ID_CHANGE_INTERVAL`]. Identical requests inside one bucket collide on purpose,
//! so the task service rejects the second submission as a duplicate.
//!
//! Because the time is truncated, two identical tasks may still be created close
//! together (one at 2:59, one at 3:01, each in its own bucket), but never a third
//! within one bucket width.
use std::time::Duration;

use fetchq_model::TASK_ID_CHANGE_INTERVAL;
use sha2::{Digest, Sha256};
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

/// A fixed-width time window, aligned to the Unix epoch in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimeBucket {
    start: i64,
}

impl TimeBucket {
    /// Bucket containing `now` for the default change interval.
    pub fn of(now: OffsetDateTime) -> Self {
        Self::with_interval(now, TASK_ID_CHANGE_INTERVAL)
    }

    /// Bucket containing `now` for an explicit interval (sub-second widths round up to 1s).
    pub fn with_interval(now: OffsetDateTime, interval: Duration) -> Self {
        let width = i64::try_from(interval.as_secs()).unwrap_or(i64::MAX).max(1);
        let secs = now.unix_timestamp();
        Self {
            start: secs.div_euclid(width) * width,
        }
    }

    /// First second of the bucket, as a Unix timestamp.
    pub fn start_unix(&self) -> i64 {
        self.start
    }

    /// First instant of the bucket.
    pub fn start(&self) -> Option<OffsetDateTime> {
        OffsetDateTime::from_unix_timestamp(self.start).ok()
    }

    /// Canonical text form hashed into the task id (RFC 3339, UTC).
    ///
    /// Falls back to the raw Unix timestamp for instants RFC 3339 cannot express.
    pub fn canonical(&self) -> String {
        self.start()
            .and_then(|t| t.format(&Rfc3339).ok())
            .unwrap_or_else(|| self.start.to_string())
    }
}

/// Derive the task id for `module_path@version` at `now`.
///
/// Output is 64 lowercase hex characters, which is valid as a task-service id.
pub fn derive_task_id(module_path: &str, version: &str, now: OffsetDateTime) -> String {
    let bucket = TimeBucket::of(now);
    let digest = Sha256::digest(format!("{module_path}@{version}-{}", bucket.canonical()));
    format!("{digest:x}")
}

#[cfg(test)]
mod tests {
    use super::*;

    // 2024-05-01T13:47:12Z
    const T: i64 = 1_714_571_232;

    fn at(unix: i64) -> OffsetDateTime {
        OffsetDateTime::from_unix_timestamp(unix).unwrap()
    }

    #[test]
    fn same_bucket_yields_same_id() {
        let a = derive_task_id("example.com/foo", "v1.0.0", at(T));
        let b = derive_task_id("example.com/foo", "v1.0.0", at(T + 60 * 60));
        assert_eq!(a, b);
    }

    #[test]
    fn different_buckets_yield_different_ids() {
        let a = derive_task_id("example.com/foo", "v1.0.0", at(T));
        let b = derive_task_id("example.com/foo", "v1.0.0", at(T + 3 * 60 * 60));
        assert_ne!(a, b);
    }

    #[test]
    fn boundary_splits_adjacent_seconds() {
        // 14:59:59 and 15:00:00 fall on either side of a 3h boundary.
        let before = derive_task_id("example.com/foo", "v1.0.0", at(1_714_575_599));
        let after = derive_task_id("example.com/foo", "v1.0.0", at(1_714_575_600));
        assert_ne!(before, after);
    }

    #[test]
    fn distinct_modules_and_versions_do_not_collide() {
        let base = derive_task_id("example.com/foo", "v1.0.0", at(T));
        assert_ne!(base, derive_task_id("example.com/bar", "v1.0.0", at(T)));
        assert_ne!(base, derive_task_id("example.com/foo", "v1.0.1", at(T)));
    }

    #[test]
    fn id_hashes_module_version_and_truncated_time() {
        let expected = format!(
            "{:x}",
            Sha256::digest("example.com/foo@v1.0.0-2024-05-01T12:00:00Z")
        );
        assert_eq!(derive_task_id("example.com/foo", "v1.0.0", at(T)), expected);
    }

    #[test]
    fn id_is_lowercase_hex() {
        let id = derive_task_id("example.com/foo", "v1.0.0", at(T));
        assert_eq!(id.len(), 64);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn bucket_truncates_to_interval_start() {
        let bucket = TimeBucket::of(at(T));
        assert_eq!(bucket.canonical(), "2024-05-01T12:00:00Z");
        assert_eq!(bucket.start_unix(), 1_714_564_800);
    }

    #[test]
    fn bucket_handles_instants_before_epoch() {
        let bucket = TimeBucket::with_interval(at(-1), Duration::from_secs(10));
        assert_eq!(bucket.start_unix(), -10);
    }
}
