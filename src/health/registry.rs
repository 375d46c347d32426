//! Indicator registration.
//!
//! Collects indicators while the application is being wired. The
//! registry is consumed when the aggregator is built, so nothing can be
//! registered after startup.

use std::fmt;
use std::sync::Arc;

use crate::health::indicator::HealthIndicator;

/// One registered indicator.
pub struct Registration {
    pub name: String,
    pub indicator: Arc<dyn HealthIndicator>,
    /// Threshold supplied at registration, ahead of the indicator's own.
    pub threshold: Option<u32>,
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("name", &self.name)
            .field("threshold", &self.threshold)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Default)]
pub struct IndicatorRegistry {
    registrations: Vec<Registration>,
}

impl IndicatorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<I>(self, name: impl Into<String>, indicator: I) -> Self
    where
        I: HealthIndicator + 'static,
    {
        self.register_arc(name, Arc::new(indicator))
    }

    /// Register an indicator that is shared with other components.
    pub fn register_arc(mut self, name: impl Into<String>, indicator: Arc<dyn HealthIndicator>) -> Self {
        self.push(name.into(), indicator, None);
        self
    }

    pub fn register_with_threshold<I>(mut self, name: impl Into<String>, indicator: I, threshold: u32) -> Self
    where
        I: HealthIndicator + 'static,
    {
        self.push(name.into(), Arc::new(indicator), Some(threshold));
        self
    }

    pub(crate) fn push(&mut self, name: String, indicator: Arc<dyn HealthIndicator>, threshold: Option<u32>) {
        self.registrations.push(Registration {
            name,
            indicator,
            threshold,
        });
    }

    pub fn registrations(&self) -> &[Registration] {
        &self.registrations
    }

    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    pub(crate) fn into_registrations(self) -> Vec<Registration> {
        self.registrations
    }
}
