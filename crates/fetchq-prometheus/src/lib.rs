//! Prometheus backend for fetch-queue metrics.
//!
//! [`PrometheusMetrics`] implements [`fetchq_core::MetricsBackend`] and renders the
//! text exposition format through [`PrometheusMetrics::encode_text`]; serving it over
//! HTTP is left to the caller.
//!
//! ## Metrics
//! - `fetchq_fetches_scheduled_total{backend}` - Counter
//! - `fetchq_duplicates_ignored_total{backend}` - Counter
//! - `fetchq_schedule_errors_total{backend, error_kind}` - Counter
//! - `fetchq_fetches_completed_total{outcome}` - Counter
//! - `fetchq_fetch_duration_seconds` - Histogram
//!
//! ```rust
//! use fetchq_core::MetricsBackend;
//! use fetchq_prometheus::PrometheusMetrics;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let metrics = PrometheusMetrics::new()?;
//! metrics.record_fetch_scheduled("in_memory");
//! assert!(metrics.encode_text()?.contains("fetchq_fetches_scheduled_total"));
//! # Ok(())
//! # }
//! ```
mod backend;
pub use backend::PrometheusMetrics;

pub use prometheus::{Encoder, Registry, TextEncoder};
