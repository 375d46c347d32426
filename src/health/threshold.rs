//! Readiness threshold resolution and failure streaks.
//!
//! # State Transitions
//! ```text
//! readiness ok     → streak = 0
//! readiness failed → streak += 1
//! liveness         → UNAVAILABLE while streak > limit
//! ```
//!
//! # Design Decisions
//! - Resolved once at construction; indicators cannot change policy later
//! - One atomic per thresholded indicator, no lock across indicators
//! - Configured overrides win over the indicator's own declaration

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU32, Ordering};

use crate::health::registry::Registration;

/// Failure streak of one thresholded indicator.
#[derive(Debug)]
pub struct ThresholdSlot {
    limit: u32,
    failures: AtomicU32,
}

impl ThresholdSlot {
    fn new(limit: u32) -> Self {
        Self {
            limit,
            failures: AtomicU32::new(0),
        }
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn failures(&self) -> u32 {
        self.failures.load(Ordering::Acquire)
    }

    pub fn reset(&self) {
        self.failures.store(0, Ordering::Release);
    }

    /// Record a failure, returning the new streak length.
    pub fn record_failure(&self) -> u32 {
        let prev = self
            .failures
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                Some(n.saturating_add(1))
            })
            .unwrap_or_else(|n| n);
        prev.saturating_add(1)
    }

    pub fn exceeded(&self) -> bool {
        self.failures() > self.limit
    }
}

/// Slots indexed by indicator id; `None` for unthresholded indicators.
#[derive(Debug, Default)]
pub struct ThresholdTable {
    slots: Vec<Option<ThresholdSlot>>,
}

impl ThresholdTable {
    /// Partition registrations into thresholded and unthresholded.
    ///
    /// `overrides` maps indicator names to configured limits; a negative
    /// value disables the threshold for that name.
    pub fn resolve(registrations: &[Registration], overrides: &BTreeMap<String, i32>) -> Self {
        let slots = registrations
            .iter()
            .map(|r| {
                let limit = match overrides.get(&r.name) {
                    Some(&configured) => u32::try_from(configured).ok(),
                    None => r.threshold.or_else(|| r.indicator.readiness_threshold()),
                };
                limit.map(ThresholdSlot::new)
            })
            .collect();
        Self { slots }
    }

    pub fn get(&self, index: usize) -> Option<&ThresholdSlot> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    pub fn thresholded(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }
}
