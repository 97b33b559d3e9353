//! Decision domain loading
//!
//! `load_domain` is the only way to get a [`DecisionDomain`]. It validates the
//! whole definition up front and reports every issue at once, so scoring and
//! selection never have to handle a malformed matrix.

use crate::config::EngineConfig;
use crate::error::{SchemaError, SchemaIssue};
use crate::types::*;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::HashSet;

/// A validated, immutable decision matrix
#[derive(Debug, Clone, PartialEq)]
pub struct DecisionDomain {
    definition: DomainDefinition,
    fingerprint: String,
    max_rating: u8,
}

impl DecisionDomain {
    pub fn id(&self) -> &str {
        &self.definition.id
    }

    pub fn name(&self) -> &str {
        &self.definition.name
    }

    pub fn description(&self) -> &str {
        &self.definition.description
    }

    pub fn criteria(&self) -> &[Criterion] {
        &self.definition.criteria
    }

    /// Options in declaration order
    pub fn options(&self) -> &[DecisionOption] {
        &self.definition.options
    }

    pub fn triggers(&self) -> &[EvolutionTrigger] {
        &self.definition.triggers
    }

    pub fn criterion(&self, id: &str) -> Option<&Criterion> {
        self.definition.criteria.iter().find(|c| c.id == id)
    }

    pub fn option(&self, id: &str) -> Option<&DecisionOption> {
        self.definition.options.iter().find(|o| o.id == id)
    }

    /// First criterion carrying `tag`, if any
    pub fn tagged_criterion(&self, tag: &str) -> Option<&Criterion> {
        self.definition.criteria.iter().find(|c| c.has_tag(tag))
    }

    /// SHA-256 of the canonical JSON definition and scoring config
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// Top of the rating scale this domain was validated against
    pub fn max_rating(&self) -> u8 {
        self.max_rating
    }

    pub fn definition(&self) -> &DomainDefinition {
        &self.definition
    }
}

/// Validate a definition and freeze it into a [`DecisionDomain`]
pub fn load_domain(
    definition: DomainDefinition,
    config: &EngineConfig,
) -> Result<DecisionDomain, SchemaError> {
    let issues = validate(&definition, config);
    if !issues.is_empty() {
        tracing::debug!(
            domain = %definition.id,
            issues = issues.len(),
            "Rejected domain definition"
        );
        return Err(SchemaError {
            domain_id: definition.id,
            issues,
        });
    }

    let fingerprint = match fingerprint(&definition, config) {
        Ok(fingerprint) => fingerprint,
        Err(e) => {
            return Err(SchemaError {
                domain_id: definition.id,
                issues: vec![SchemaIssue::Unserializable(e.to_string())],
            })
        }
    };
    Ok(DecisionDomain {
        definition,
        fingerprint,
        max_rating: config.max_rating,
    })
}

#[derive(Serialize)]
struct FingerprintInput<'a> {
    definition: &'a DomainDefinition,
    max_rating: u8,
    tie_epsilon: f64,
    complexity_tag: &'a str,
}

/// Hash a definition together with the config fields that can change its
/// ranking. Field order is fixed by the struct layout and ratings are a
/// `BTreeMap`, so the JSON form is canonical.
pub fn fingerprint(
    definition: &DomainDefinition,
    config: &EngineConfig,
) -> Result<String, serde_json::Error> {
    let canonical = serde_json::to_vec(&FingerprintInput {
        definition,
        max_rating: config.max_rating,
        tie_epsilon: config.tie_epsilon,
        complexity_tag: &config.complexity_tag,
    })?;
    let mut hasher = Sha256::new();
    hasher.update(&canonical);
    Ok(hex::encode(hasher.finalize()))
}

fn validate(definition: &DomainDefinition, config: &EngineConfig) -> Vec<SchemaIssue> {
    let mut issues = Vec::new();

    if definition.id.trim().is_empty() {
        issues.push(SchemaIssue::EmptyDomainId);
    }

    // Criteria
    if definition.criteria.is_empty() {
        issues.push(SchemaIssue::NoCriteria);
    }
    let mut criterion_ids = HashSet::new();
    for criterion in &definition.criteria {
        if !criterion_ids.insert(criterion.id.as_str()) {
            issues.push(SchemaIssue::DuplicateCriterion(criterion.id.clone()));
        }
        if !criterion.weight.is_finite() || !(0.0..=1.0).contains(&criterion.weight) {
            issues.push(SchemaIssue::InvalidWeight {
                criterion: criterion.id.clone(),
                weight: criterion.weight,
            });
        }
    }
    if !definition.criteria.is_empty() {
        let sum: f64 = definition.criteria.iter().map(|c| c.weight).sum();
        if !((sum - 1.0).abs() <= config.weight_tolerance) {
            issues.push(SchemaIssue::WeightSum {
                sum,
                tolerance: config.weight_tolerance,
            });
        }
    }

    // Options
    if definition.options.is_empty() {
        issues.push(SchemaIssue::NoOptions);
    }
    let mut option_ids = HashSet::new();
    for option in &definition.options {
        if !option_ids.insert(option.id.as_str()) {
            issues.push(SchemaIssue::DuplicateOption(option.id.clone()));
        }
        for criterion in &definition.criteria {
            if !option.ratings.contains_key(&criterion.id) {
                issues.push(SchemaIssue::MissingRating {
                    option: option.id.clone(),
                    criterion: criterion.id.clone(),
                });
            }
        }
        for (criterion, &rating) in &option.ratings {
            if !criterion_ids.contains(criterion.as_str()) {
                issues.push(SchemaIssue::UndeclaredCriterion {
                    option: option.id.clone(),
                    criterion: criterion.clone(),
                });
            } else if rating > config.max_rating {
                issues.push(SchemaIssue::RatingOutOfRange {
                    option: option.id.clone(),
                    criterion: criterion.clone(),
                    rating,
                    max: config.max_rating,
                });
            }
        }
    }

    // Triggers
    let mut trigger_ids = HashSet::new();
    for trigger in &definition.triggers {
        if !trigger_ids.insert(trigger.id.as_str()) {
            issues.push(SchemaIssue::DuplicateTrigger(trigger.id.clone()));
        }
        if trigger.domain_id != definition.id {
            issues.push(SchemaIssue::ForeignTrigger {
                trigger: trigger.id.clone(),
                found: trigger.domain_id.clone(),
            });
        }
        validate_predicate(&trigger.id, &trigger.predicate, &mut issues);
    }

    issues
}

fn validate_predicate(trigger: &str, predicate: &TriggerPredicate, issues: &mut Vec<SchemaIssue>) {
    match predicate {
        TriggerPredicate::Threshold { metric, value, .. } => {
            if !value.is_finite() {
                issues.push(SchemaIssue::InvalidThreshold {
                    trigger: trigger.to_string(),
                    metric: metric.clone(),
                });
            }
        }
        TriggerPredicate::All { of } | TriggerPredicate::Any { of } => {
            if of.is_empty() {
                issues.push(SchemaIssue::EmptyTriggerPredicate(trigger.to_string()));
            }
            for inner in of {
                validate_predicate(trigger, inner, issues);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ci_platform(integration_weight: f64, cost_weight: f64) -> DomainDefinition {
        DomainDefinition::new(
            "ci-platform",
            "CI Platform",
            vec![
                Criterion::new("integration", "Integration", integration_weight, Direction::Maximize),
                Criterion::new("cost", "Cost", cost_weight, Direction::Minimize),
            ],
            vec![
                DecisionOption::new("github-actions", "GitHub Actions", &[("integration", 5), ("cost", 2)]),
                DecisionOption::new("jenkins", "Jenkins", &[("integration", 3), ("cost", 4)]),
            ],
        )
    }

    #[test]
    fn test_load_valid_domain() {
        let domain = load_domain(ci_platform(0.6, 0.4), &EngineConfig::default()).unwrap();
        assert_eq!(domain.id(), "ci-platform");
        assert_eq!(domain.criteria().len(), 2);
        assert_eq!(domain.options()[1].id, "jenkins");
        assert_eq!(domain.fingerprint().len(), 64);
        assert_eq!(domain.max_rating(), 5);
    }

    #[test]
    fn test_weights_summing_to_099_rejected() {
        let err = load_domain(ci_platform(0.59, 0.4), &EngineConfig::default()).unwrap_err();
        assert!(err.has_issue(|i| matches!(i, SchemaIssue::WeightSum { .. })));
    }

    #[test]
    fn test_weights_summing_to_101_rejected() {
        let err = load_domain(ci_platform(0.61, 0.4), &EngineConfig::default()).unwrap_err();
        assert!(err.has_issue(|i| matches!(i, SchemaIssue::WeightSum { .. })));
    }

    #[test]
    fn test_weights_within_tolerance_accepted() {
        assert!(load_domain(ci_platform(0.6 + 5e-7, 0.4), &EngineConfig::default()).is_ok());
    }

    #[test]
    fn test_missing_rating_rejected() {
        let mut def = ci_platform(0.6, 0.4);
        def.options[1].ratings.remove("cost");
        let err = load_domain(def, &EngineConfig::default()).unwrap_err();
        assert_eq!(
            err.issues,
            vec![SchemaIssue::MissingRating {
                option: "jenkins".to_string(),
                criterion: "cost".to_string(),
            }]
        );
    }

    #[test]
    fn test_undeclared_criterion_rejected() {
        let mut def = ci_platform(0.6, 0.4);
        def.options[0].ratings.insert("vibes".to_string(), 5);
        let err = load_domain(def, &EngineConfig::default()).unwrap_err();
        assert!(err.has_issue(|i| matches!(
            i,
            SchemaIssue::UndeclaredCriterion { criterion, .. } if criterion == "vibes"
        )));
    }

    #[test]
    fn test_rating_outside_scale_rejected() {
        let mut def = ci_platform(0.6, 0.4);
        def.options[0].ratings.insert("integration".to_string(), 6);
        let err = load_domain(def, &EngineConfig::default()).unwrap_err();
        assert!(err.has_issue(|i| matches!(i, SchemaIssue::RatingOutOfRange { rating: 6, .. })));

        // A wider scale accepts it
        let mut def = ci_platform(0.6, 0.4);
        def.options[0].ratings.insert("integration".to_string(), 6);
        let config = EngineConfig {
            max_rating: 10,
            ..Default::default()
        };
        assert!(load_domain(def, &config).is_ok());
    }

    #[test]
    fn test_zero_criteria_rejected() {
        let def = DomainDefinition::new(
            "empty",
            "Empty",
            vec![],
            vec![DecisionOption::new("a", "A", &[])],
        );
        let err = load_domain(def, &EngineConfig::default()).unwrap_err();
        assert_eq!(err.issues, vec![SchemaIssue::NoCriteria]);
    }

    #[test]
    fn test_zero_options_rejected() {
        let mut def = ci_platform(0.6, 0.4);
        def.options.clear();
        let err = load_domain(def, &EngineConfig::default()).unwrap_err();
        assert_eq!(err.issues, vec![SchemaIssue::NoOptions]);
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let mut def = ci_platform(0.6, 0.4);
        let copy = def.options[0].clone();
        def.options.push(copy);
        let err = load_domain(def, &EngineConfig::default()).unwrap_err();
        assert!(err.has_issue(|i| matches!(i, SchemaIssue::DuplicateOption(id) if id == "github-actions")));
    }

    #[test]
    fn test_foreign_trigger_rejected() {
        let mut def = ci_platform(0.6, 0.4).trigger(
            "busy",
            "Frequent deploys",
            TriggerPredicate::threshold("deployment_frequency", Comparator::Gt, 10.0),
            "Reconsider branching",
        );
        def.triggers[0].domain_id = "auth-strategy".to_string();
        let err = load_domain(def, &EngineConfig::default()).unwrap_err();
        assert!(err.has_issue(|i| matches!(i, SchemaIssue::ForeignTrigger { .. })));
    }

    #[test]
    fn test_empty_trigger_combinator_rejected() {
        let def = ci_platform(0.6, 0.4).trigger(
            "never",
            "Nothing",
            TriggerPredicate::All { of: vec![] },
            "Nothing",
        );
        let err = load_domain(def, &EngineConfig::default()).unwrap_err();
        assert_eq!(
            err.issues,
            vec![SchemaIssue::EmptyTriggerPredicate("never".to_string())]
        );
    }

    #[test]
    fn test_collects_all_issues() {
        let mut def = ci_platform(0.5, 0.4);
        def.options[1].ratings.remove("integration");
        let err = load_domain(def, &EngineConfig::default()).unwrap_err();
        assert_eq!(err.issues.len(), 2);
    }

    #[test]
    fn test_fingerprint_tracks_definition_changes() {
        let a = load_domain(ci_platform(0.6, 0.4), &EngineConfig::default()).unwrap();
        let b = load_domain(ci_platform(0.6, 0.4), &EngineConfig::default()).unwrap();
        let c = load_domain(ci_platform(0.5, 0.5), &EngineConfig::default()).unwrap();
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_ne!(a.fingerprint(), c.fingerprint());
    }

    #[test]
    fn test_fingerprint_tracks_scoring_config() {
        let def = ci_platform(0.6, 0.4);
        let base = load_domain(def.clone(), &EngineConfig::default()).unwrap();
        let variants = [
            EngineConfig {
                tie_epsilon: 0.05,
                ..Default::default()
            },
            EngineConfig {
                max_rating: 10,
                ..Default::default()
            },
            EngineConfig {
                complexity_tag: "effort".to_string(),
                ..Default::default()
            },
        ];
        for config in &variants {
            let other = load_domain(def.clone(), config).unwrap();
            assert_ne!(base.fingerprint(), other.fingerprint(), "{:?}", config);
        }

        // Runner-up count doesn't change the ranking
        let more_runner_ups = EngineConfig {
            runner_up_count: 5,
            ..Default::default()
        };
        let same = load_domain(def, &more_runner_ups).unwrap();
        assert_eq!(base.fingerprint(), same.fingerprint());
    }
}
