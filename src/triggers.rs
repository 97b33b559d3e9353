//! Evolution Trigger Monitor
//!
//! Pure evaluation of a domain's "revisit when..." rules against a telemetry
//! snapshot. Nothing is remembered between calls; deciding whether to re-run
//! selection is the caller's job.

use crate::domain::DecisionDomain;
use crate::types::*;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

impl Comparator {
    pub fn compare(&self, observed: f64, threshold: f64) -> bool {
        if !observed.is_finite() {
            return false;
        }
        match self {
            Comparator::Gt => observed > threshold,
            Comparator::Gte => observed >= threshold,
            Comparator::Lt => observed < threshold,
            Comparator::Lte => observed <= threshold,
            Comparator::Eq => (observed - threshold).abs() < 1e-9,
            Comparator::Ne => (observed - threshold).abs() >= 1e-9,
        }
    }
}

impl TriggerPredicate {
    /// A threshold over a metric missing from the snapshot is false
    pub fn evaluate(&self, telemetry: &TelemetrySnapshot) -> bool {
        match self {
            TriggerPredicate::Threshold {
                metric,
                comparator,
                value,
            } => telemetry
                .get(metric)
                .map(|observed| comparator.compare(observed, *value))
                .unwrap_or(false),
            TriggerPredicate::All { of } => !of.is_empty() && of.iter().all(|p| p.evaluate(telemetry)),
            TriggerPredicate::Any { of } => of.iter().any(|p| p.evaluate(telemetry)),
        }
    }

    /// Every metric name the predicate reads, in first-seen order
    pub fn metrics(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.collect_metrics(&mut names);
        names
    }

    fn collect_metrics<'a>(&'a self, names: &mut Vec<&'a str>) {
        match self {
            TriggerPredicate::Threshold { metric, .. } => {
                if !names.contains(&metric.as_str()) {
                    names.push(metric);
                }
            }
            TriggerPredicate::All { of } | TriggerPredicate::Any { of } => {
                for inner in of {
                    inner.collect_metrics(names);
                }
            }
        }
    }
}

/// A trigger whose predicate held against the snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggeredWarning {
    pub domain_id: String,
    pub trigger_id: String,
    pub description: String,
    pub condition: String,
    pub suggested_action: String,
    /// Values the predicate read from the snapshot
    pub observed: BTreeMap<String, f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub captured_at: Option<DateTime<Utc>>,
}

/// Evaluate every trigger of `domain`; fired triggers in declaration order
pub fn evaluate(domain: &DecisionDomain, telemetry: &TelemetrySnapshot) -> Vec<TriggeredWarning> {
    let warnings: Vec<TriggeredWarning> = domain
        .triggers()
        .iter()
        .filter(|trigger| trigger.predicate.evaluate(telemetry))
        .map(|trigger| TriggeredWarning {
            domain_id: domain.id().to_string(),
            trigger_id: trigger.id.clone(),
            description: trigger.description.clone(),
            condition: trigger.predicate.to_string(),
            suggested_action: trigger.suggested_action.clone(),
            observed: trigger
                .predicate
                .metrics()
                .into_iter()
                .filter_map(|m| telemetry.get(m).map(|v| (m.to_string(), v)))
                .collect(),
            captured_at: telemetry.captured_at,
        })
        .collect();

    for warning in &warnings {
        tracing::warn!(
            domain = %warning.domain_id,
            trigger = %warning.trigger_id,
            "Evolution trigger fired: {}",
            warning.condition
        );
    }

    warnings
}

/// Whether a previously issued recommendation should be revisited
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StalenessReport {
    pub domain_id: String,
    pub recorded_fingerprint: String,
    pub current_fingerprint: String,
    /// The domain definition or its scoring config changed since the
    /// recommendation was made
    pub definition_changed: bool,
    pub warnings: Vec<TriggeredWarning>,
}

impl StalenessReport {
    pub fn is_stale(&self) -> bool {
        self.definition_changed || !self.warnings.is_empty()
    }
}

/// Compare a recorded recommendation's fingerprint with the current domain
/// and evaluate its triggers
pub fn check_staleness(
    domain: &DecisionDomain,
    recorded_fingerprint: &str,
    telemetry: &TelemetrySnapshot,
) -> StalenessReport {
    StalenessReport {
        domain_id: domain.id().to_string(),
        recorded_fingerprint: recorded_fingerprint.to_string(),
        current_fingerprint: domain.fingerprint().to_string(),
        definition_changed: recorded_fingerprint != domain.fingerprint(),
        warnings: evaluate(domain, telemetry),
    }
}
