//! Health reporting for the predictor
//!
//! A predictor that finished initialization can always serve; the report
//! tells operators whether it is doing so on a degraded footing (for
//! example with the fallback scaling range).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Health status of a component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentStatus {
    /// Component is functioning normally
    Healthy,
    /// Component is experiencing issues but still operational
    Degraded,
}

impl ComponentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentStatus::Healthy => "healthy",
            ComponentStatus::Degraded => "degraded",
        }
    }
}

/// Information about a component's health
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealth {
    pub status: ComponentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub last_check_timestamp: i64,
}

impl ComponentHealth {
    pub fn healthy() -> Self {
        Self {
            status: ComponentStatus::Healthy,
            message: None,
            last_check_timestamp: chrono::Utc::now().timestamp(),
        }
    }

    pub fn degraded(message: impl Into<String>) -> Self {
        Self {
            status: ComponentStatus::Degraded,
            message: Some(message.into()),
            last_check_timestamp: chrono::Utc::now().timestamp(),
        }
    }
}

/// Overall health response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: ComponentStatus,
    pub components: HashMap<String, ComponentHealth>,
}

impl HealthResponse {
    pub fn from_components(components: HashMap<String, ComponentHealth>) -> Self {
        let status = Self::compute_status(&components);
        Self { status, components }
    }

    /// Compute overall status from component statuses
    pub fn compute_status(components: &HashMap<String, ComponentHealth>) -> ComponentStatus {
        let has_degraded = components
            .values()
            .any(|health| health.status == ComponentStatus::Degraded);

        if has_degraded {
            ComponentStatus::Degraded
        } else {
            ComponentStatus::Healthy
        }
    }
}

/// Component names for health tracking
pub mod components {
    pub const TRANSFORMER: &str = "transformer";
    pub const REGRESSOR: &str = "regressor";
    pub const SCALING_RANGE: &str = "scaling_range";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_report_is_healthy() {
        let health = HealthResponse::from_components(HashMap::new());
        assert_eq!(health.status, ComponentStatus::Healthy);
        assert!(health.components.is_empty());
    }

    #[test]
    fn test_degraded_component_degrades_report() {
        let mut map = HashMap::new();
        map.insert(components::TRANSFORMER.to_string(), ComponentHealth::healthy());
        map.insert(
            components::SCALING_RANGE.to_string(),
            ComponentHealth::degraded("dataset missing"),
        );

        let health = HealthResponse::from_components(map);
        assert_eq!(health.status, ComponentStatus::Degraded);
    }

    #[test]
    fn test_status_round_trips_only_known_states() {
        let status: ComponentStatus = serde_json::from_str("\"healthy\"").unwrap();
        assert_eq!(status, ComponentStatus::Healthy);
        assert!(serde_json::from_str::<ComponentStatus>("\"unhealthy\"").is_err());
    }

    #[test]
    fn test_status_serializes_lowercase() {
        let json = serde_json::to_string(&ComponentHealth::degraded("x")).unwrap();
        assert!(json.contains("\"degraded\""));
    }
}
