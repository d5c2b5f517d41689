use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;

static ID_SEQUENCE: AtomicU64 = AtomicU64::new(1);

/// Returns a process-unique identifier: `{prefix}_{unix_millis}_{sequence}`.
///
/// The sequence is monotonic across threads, so two IDs created in the same
/// millisecond still differ.
#[must_use]
pub fn create_id(prefix: &str) -> String {
    let sequence = ID_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    format!("{prefix}_{}_{sequence}", Utc::now().timestamp_millis())
}
