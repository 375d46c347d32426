//! Probe result model.

use std::fmt;

use serde::Serialize;

use crate::health::indicator::BoxError;

/// Per-indicator outcome of a probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    Up,
    Down,
    Unavailable,
}

impl Status {
    pub const UP: &'static str = "UP";
    pub const DOWN: &'static str = "DOWN";
    pub const UNAVAILABLE: &'static str = "UNAVAILABLE";

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Up => Self::UP,
            Status::Down => Self::DOWN,
            Status::Unavailable => Self::UNAVAILABLE,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why an indicator is not healthy.
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    /// The indicator's own check failed.
    #[error(transparent)]
    Indicator(BoxError),

    /// Readiness kept failing past the indicator's threshold.
    #[error("service unavailable")]
    Unavailable,
}

impl ProbeError {
    pub fn is_unavailable(&self) -> bool {
        matches!(self, ProbeError::Unavailable)
    }
}

/// Status plus optional cause. The cause is not serialized.
#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: Status,
    #[serde(skip)]
    pub cause: Option<ProbeError>,
}

impl HealthStatus {
    pub fn up() -> Self {
        Self {
            status: Status::Up,
            cause: None,
        }
    }

    pub fn down(err: BoxError) -> Self {
        Self {
            status: Status::Down,
            cause: Some(ProbeError::Indicator(err)),
        }
    }

    /// Readiness failure carrying the indicator's error.
    pub fn not_ready(err: BoxError) -> Self {
        Self {
            status: Status::Unavailable,
            cause: Some(ProbeError::Indicator(err)),
        }
    }

    /// Liveness failure raised by an exceeded readiness threshold.
    pub fn threshold_exceeded() -> Self {
        Self {
            status: Status::Unavailable,
            cause: Some(ProbeError::Unavailable),
        }
    }

    pub fn is_up(&self) -> bool {
        self.status == Status::Up
    }
}

/// Opaque handle of a registered indicator: its registration index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct IndicatorId(pub(crate) usize);

impl IndicatorId {
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for IndicatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Serialize)]
pub struct IndicatorReport {
    pub id: IndicatorId,
    pub name: String,
    #[serde(flatten)]
    pub health: HealthStatus,
}

/// Aggregate probe result, indicators in registration order.
#[derive(Debug, Serialize)]
pub struct HealthReport {
    pub healthy: bool,
    pub indicators: Vec<IndicatorReport>,
}

impl HealthReport {
    pub fn status(&self, id: IndicatorId) -> Option<&HealthStatus> {
        self.indicators.get(id.0).map(|r| &r.health)
    }

    /// First indicator registered under `name`.
    pub fn by_name(&self, name: &str) -> Option<&HealthStatus> {
        self.indicators
            .iter()
            .find(|r| r.name == name)
            .map(|r| &r.health)
    }

    pub fn failing(&self) -> impl Iterator<Item = &IndicatorReport> {
        self.indicators.iter().filter(|r| !r.health.is_up())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_strings() {
        assert_eq!(Status::Up.to_string(), "UP");
        assert_eq!(Status::Down.to_string(), "DOWN");
        assert_eq!(Status::Unavailable.to_string(), "UNAVAILABLE");
        assert_eq!(serde_json::to_string(&Status::Unavailable).unwrap(), "\"UNAVAILABLE\"");
    }

    #[test]
    fn test_cause_is_not_serialized() {
        let status = HealthStatus::down("boom".into());
        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json, serde_json::json!({ "status": "DOWN" }));
        assert_eq!(status.cause.unwrap().to_string(), "boom");
    }

    #[test]
    fn test_threshold_sentinel() {
        let status = HealthStatus::threshold_exceeded();
        assert_eq!(status.status, Status::Unavailable);
        let cause = status.cause.unwrap();
        assert!(cause.is_unavailable());
        assert_eq!(cause.to_string(), "service unavailable");
    }

    #[test]
    fn test_report_lookup_and_serialization() {
        let report = HealthReport {
            healthy: false,
            indicators: vec![
                IndicatorReport { id: IndicatorId(0), name: "db".into(), health: HealthStatus::up() },
                IndicatorReport {
                    id: IndicatorId(1),
                    name: "cache".into(),
                    health: HealthStatus::not_ready("warming".into()),
                },
            ],
        };
        assert!(report.status(IndicatorId(0)).unwrap().is_up());
        assert_eq!(report.by_name("cache").unwrap().status, Status::Unavailable);
        assert!(report.status(IndicatorId(5)).is_none());
        assert_eq!(report.failing().count(), 1);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "healthy": false,
                "indicators": [
                    { "id": 0, "name": "db", "status": "UP" },
                    { "id": 1, "name": "cache", "status": "UNAVAILABLE" }
                ]
            })
        );
    }
}
