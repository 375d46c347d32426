//! Liveness/readiness aggregation.
//!
//! # Responsibilities
//! - Probe every registered indicator in registration order
//! - Fold individual results into one availability decision
//! - Escalate sustained readiness failures into liveness failures

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::health::indicator::{HealthIndicator, ProbeContext};
use crate::health::registry::IndicatorRegistry;
use crate::health::status::{HealthReport, HealthStatus, IndicatorId, IndicatorReport};
use crate::health::threshold::ThresholdTable;

struct Entry {
    name: String,
    indicator: Arc<dyn HealthIndicator>,
}

/// Combined liveness/readiness of all registered indicators.
///
/// Probes take `&self` and may run concurrently with each other; the only
/// shared mutable state is one atomic streak per thresholded indicator.
pub struct Health {
    entries: Vec<Entry>,
    thresholds: ThresholdTable,
}

impl Health {
    pub fn new(registry: IndicatorRegistry) -> Self {
        Self::with_overrides(registry, &BTreeMap::new())
    }

    /// Build with configured threshold overrides keyed by indicator name.
    pub fn with_overrides(registry: IndicatorRegistry, overrides: &BTreeMap<String, i32>) -> Self {
        let thresholds = ThresholdTable::resolve(registry.registrations(), overrides);
        let entries: Vec<Entry> = registry
            .into_registrations()
            .into_iter()
            .map(|r| Entry {
                name: r.name,
                indicator: r.indicator,
            })
            .collect();

        tracing::debug!(
            indicators = entries.len(),
            thresholded = thresholds.thresholded(),
            "Health aggregator ready"
        );

        Self { entries, thresholds }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Ids and names in registration order.
    pub fn indicators(&self) -> impl Iterator<Item = (IndicatorId, &str)> {
        self.entries
            .iter()
            .enumerate()
            .map(|(i, e)| (IndicatorId(i), e.name.as_str()))
    }

    /// Current readiness failure streak, `None` when not thresholded.
    pub fn failure_count(&self, id: IndicatorId) -> Option<u32> {
        self.thresholds.get(id.0).map(|s| s.failures())
    }

    pub fn threshold(&self, id: IndicatorId) -> Option<u32> {
        self.thresholds.get(id.0).map(|s| s.limit())
    }

    /// Liveness probe. Reads failure streaks but never changes them.
    pub async fn liveness(&self, ctx: &ProbeContext) -> HealthReport {
        let mut healthy = true;
        let mut indicators = Vec::with_capacity(self.entries.len());

        for (i, entry) in self.entries.iter().enumerate() {
            let health = match entry.indicator.liveness(ctx).await {
                Err(err) => {
                    tracing::warn!(indicator = %entry.name, id = i, error = %err, "Liveness check failed");
                    HealthStatus::down(err)
                }
                Ok(()) => match self.thresholds.get(i) {
                    Some(slot) if slot.exceeded() => {
                        tracing::error!(
                            indicator = %entry.name,
                            id = i,
                            failures = slot.failures(),
                            threshold = slot.limit(),
                            "Readiness threshold exceeded, reporting not live"
                        );
                        HealthStatus::threshold_exceeded()
                    }
                    _ => HealthStatus::up(),
                },
            };
            healthy &= health.is_up();
            indicators.push(IndicatorReport {
                id: IndicatorId(i),
                name: entry.name.clone(),
                health,
            });
        }

        HealthReport { healthy, indicators }
    }

    /// Readiness probe. The only path that updates failure streaks.
    pub async fn readiness(&self, ctx: &ProbeContext) -> HealthReport {
        let mut healthy = true;
        let mut indicators = Vec::with_capacity(self.entries.len());

        for (i, entry) in self.entries.iter().enumerate() {
            let slot = self.thresholds.get(i);
            let health = match entry.indicator.readiness(ctx).await {
                Ok(()) => {
                    if let Some(slot) = slot {
                        slot.reset();
                    }
                    HealthStatus::up()
                }
                Err(err) => {
                    healthy = false;
                    let failures = slot.map(|s| s.record_failure());
                    tracing::warn!(
                        indicator = %entry.name,
                        id = i,
                        failures,
                        error = %err,
                        "Readiness check failed"
                    );
                    HealthStatus::not_ready(err)
                }
            };
            indicators.push(IndicatorReport {
                id: IndicatorId(i),
                name: entry.name.clone(),
                health,
            });
        }

        HealthReport { healthy, indicators }
    }
}

impl std::fmt::Debug for Health {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Health")
            .field("indicators", &self.entries.iter().map(|e| &e.name).collect::<Vec<_>>())
            .field("thresholds", &self.thresholds)
            .finish()
    }
}
