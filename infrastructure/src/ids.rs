use application::IdGenerator;
use domain::RecordId;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::trace;

/// Hands out the current Unix time in milliseconds as record ids.
///
/// When the clock has not moved past the last id (two creates in the same millisecond,
/// or the clock stepping backwards) the previous id plus one is used instead.
#[derive(Debug, Default)]
pub struct ClockIdGenerator {
    last: AtomicI64,
}

impl ClockIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    fn now_millis() -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
            .unwrap_or(0)
    }
}

impl IdGenerator for ClockIdGenerator {
    fn next_id(&self) -> RecordId {
        let now = Self::now_millis();
        // The closure always returns Some, so fetch_update cannot fail.
        let previous = match self
            .last
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                Some(now.max(last.saturating_add(1)))
            }) {
            Ok(previous) | Err(previous) => previous,
        };
        let id = now.max(previous.saturating_add(1));
        trace!(id, "Assigned record id");
        RecordId::new(id)
    }
}
