//! Status condition surface published by the external reconcilers
//!
//! The orchestrator only ever reads conditions; they are written
//! exclusively by the controllers converging each cluster resource.

use chrono::Utc;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

// Condition types shared by all cluster kinds
pub const CONDITION_PODS_READY: &str = "PodsReady";
pub const CONDITION_UPGRADING: &str = "Upgrading";
pub const CONDITION_ERROR: &str = "Error";

/// Tri-state condition value.
///
/// `Unknown` covers both "not yet reported" and an explicit Unknown from
/// the reconciler; a missing condition must never be read as False.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Default)]
pub enum ConditionStatus {
    True,
    False,
    #[default]
    Unknown,
}

impl fmt::Display for ConditionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConditionStatus::True => write!(f, "True"),
            ConditionStatus::False => write!(f, "False"),
            ConditionStatus::Unknown => write!(f, "Unknown"),
        }
    }
}

/// One named observation on a cluster resource's status
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClusterCondition {
    /// Type of condition (PodsReady, Upgrading, Error)
    pub r#type: String,
    /// Tri-state status of the condition
    pub status: ConditionStatus,
    /// Last time the condition transitioned
    #[serde(default)]
    pub last_transition_time: Option<String>,
    /// Reason for the condition
    #[serde(default)]
    pub reason: Option<String>,
    /// Human-readable message
    #[serde(default)]
    pub message: Option<String>,
}

/// Build a condition with the current timestamp.
pub fn build_condition(
    condition_type: &str,
    status: ConditionStatus,
    reason: &str,
    message: &str,
) -> ClusterCondition {
    ClusterCondition {
        r#type: condition_type.to_string(),
        status,
        last_transition_time: Some(Utc::now().to_rfc3339()),
        reason: Some(reason.to_string()),
        message: Some(message.to_string()),
    }
}

/// Look up a condition by type. Reconcilers keep at most one entry per
/// type; if duplicates ever appear, the last observed one wins.
pub fn find_condition<'a>(
    conditions: &'a [ClusterCondition],
    condition_type: &str,
) -> Option<&'a ClusterCondition> {
    conditions.iter().rev().find(|c| c.r#type == condition_type)
}

/// Status of a condition by type, `Unknown` when absent.
pub fn condition_status(conditions: &[ClusterCondition], condition_type: &str) -> ConditionStatus {
    find_condition(conditions, condition_type)
        .map(|c| c.status)
        .unwrap_or(ConditionStatus::Unknown)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_serializes_as_kubernetes_string() {
        assert_eq!(
            serde_json::to_string(&ConditionStatus::True).unwrap(),
            "\"True\""
        );
        let parsed: ConditionStatus = serde_json::from_str("\"Unknown\"").unwrap();
        assert_eq!(parsed, ConditionStatus::Unknown);
    }

    #[test]
    fn test_missing_condition_reads_unknown() {
        let conditions = vec![build_condition(
            CONDITION_PODS_READY,
            ConditionStatus::True,
            "AllReady",
            "all pods ready",
        )];
        assert_eq!(
            condition_status(&conditions, CONDITION_UPGRADING),
            ConditionStatus::Unknown
        );
    }

    #[test]
    fn test_last_observed_wins_on_duplicate_type() {
        let conditions = vec![
            build_condition(CONDITION_ERROR, ConditionStatus::False, "Stale", "stale"),
            build_condition(
                CONDITION_ERROR,
                ConditionStatus::True,
                "UpgradeFailed",
                "image pull backoff",
            ),
        ];
        let found = find_condition(&conditions, CONDITION_ERROR).unwrap();
        assert_eq!(found.status, ConditionStatus::True);
        assert_eq!(found.reason.as_deref(), Some("UpgradeFailed"));
    }

    #[test]
    fn test_build_condition_sets_timestamp() {
        let cond = build_condition(
            CONDITION_PODS_READY,
            ConditionStatus::False,
            "Scaling",
            "1/3 ready",
        );
        assert!(cond.last_transition_time.is_some());
        assert_eq!(cond.status, ConditionStatus::False);
    }
}
