//! Shared helpers for the discovery and test pipelines
//!
//! - Bounded retry with a fixed wait between attempts
//! - Splitting work lists into fixed-size batches
//! - ISO-8601 timestamps

mod retry;

pub use retry::{RetryOutcome, RetryPolicy};

use chrono::{SecondsFormat, Utc};

/// Returns the current UTC time as an ISO-8601 string with millisecond precision
pub fn now_iso8601() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Splits `items` into consecutive batches of at most `size` elements
///
/// A `size` of zero is treated as one.
pub fn batches<T>(items: &[T], size: usize) -> std::slice::Chunks<'_, T> {
    items.chunks(size.max(1))
}
