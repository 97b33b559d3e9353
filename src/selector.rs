//! Recommendation Selector
//!
//! Layers "Best For / Avoid When" qualifiers on top of the raw score:
//! 1. Evaluate fit predicates against the caller's context
//! 2. Drop options with a violated predicate (unknown facts never exclude)
//! 3. If nothing survives, rank everything and flag low confidence
//! 4. Rank survivors by score and explain each position

use crate::config::EngineConfig;
use crate::domain::DecisionDomain;
use crate::error::Result;
use crate::scoring::{self, CriterionContribution, ScoreCard};
use crate::types::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

impl Condition {
    /// `None` when the fact's value is of the wrong kind for this condition
    pub fn evaluate(&self, value: &FactValue) -> Option<bool> {
        match self {
            Condition::Equals(expected) => value.matches(expected),
            Condition::NotEquals(expected) => value.matches(expected).map(|m| !m),
            Condition::OneOf(candidates) => one_of(value, candidates),
            Condition::NoneOf(candidates) => one_of(value, candidates).map(|m| !m),
            Condition::AtLeast(min) => value.as_number().map(|n| n >= *min),
            Condition::AtMost(max) => value.as_number().map(|n| n <= *max),
            Condition::IsTrue => value.as_bool(),
            Condition::IsFalse => value.as_bool().map(|b| !b),
        }
    }
}

fn one_of(value: &FactValue, candidates: &[FactValue]) -> Option<bool> {
    let mut comparable = false;
    for candidate in candidates {
        match value.matches(candidate) {
            Some(true) => return Some(true),
            Some(false) => comparable = true,
            None => {}
        }
    }
    comparable.then_some(false)
}

impl FitPredicate {
    pub fn evaluate(&self, context: &Context) -> PredicateOutcome {
        match context.get(&self.fact).map(|v| self.condition.evaluate(v)) {
            Some(Some(true)) => PredicateOutcome::Satisfied,
            Some(Some(false)) => PredicateOutcome::Violated,
            Some(None) | None => PredicateOutcome::Unknown,
        }
    }
}

/// How one fit predicate fared against the context
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredicateResult {
    pub fact: String,
    pub condition: Condition,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub observed: Option<FactValue>,
    pub outcome: PredicateOutcome,
}

/// A ranked option with everything needed to explain its position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionAssessment {
    pub option_id: String,
    pub name: String,
    pub score: f64,
    pub rank: usize,
    pub breakdown: Vec<CriterionContribution>,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub predicates: Vec<PredicateResult>,
}

/// An option removed by a violated fit predicate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExcludedOption {
    pub option_id: String,
    pub name: String,
    pub violated: Vec<PredicateResult>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub domain_id: String,
    /// Fingerprint of the domain definition this was computed from
    pub fingerprint: String,
    pub primary: OptionAssessment,
    pub runner_ups: Vec<OptionAssessment>,
    /// Every considered option, best first (primary and runner-ups included)
    pub ranked: Vec<OptionAssessment>,
    /// Options with a violated predicate. Under low confidence these are
    /// also in `ranked`.
    pub excluded: Vec<ExcludedOption>,
    /// Context excluded every option; the ranking ignores fit predicates
    pub low_confidence: bool,
    /// Facts referenced by some predicate but absent from the context
    pub unknown_facts: Vec<String>,
    /// Score gap between primary and the first runner-up
    pub margin: Option<f64>,
}

impl Recommendation {
    pub fn is_close_call(&self, epsilon: f64) -> bool {
        self.margin.map(|m| m < epsilon).unwrap_or(false)
    }
}

/// Produce a ranked recommendation for `context`
pub fn recommend(
    domain: &DecisionDomain,
    context: &Context,
    config: &EngineConfig,
) -> Result<Recommendation> {
    let evaluations: Vec<Vec<PredicateResult>> = domain
        .options()
        .iter()
        .map(|option| {
            option
                .fit
                .iter()
                .map(|predicate| PredicateResult {
                    fact: predicate.fact.clone(),
                    condition: predicate.condition.clone(),
                    note: predicate.note.clone(),
                    observed: context.get(&predicate.fact).cloned(),
                    outcome: predicate.evaluate(context),
                })
                .collect()
        })
        .collect();

    let eligible: Vec<usize> = evaluations
        .iter()
        .enumerate()
        .filter(|(_, results)| {
            results
                .iter()
                .all(|r| r.outcome != PredicateOutcome::Violated)
        })
        .map(|(index, _)| index)
        .collect();

    let low_confidence = eligible.is_empty();
    let candidates: Vec<usize> = if low_confidence {
        tracing::warn!(
            domain = %domain.id(),
            "Context excludes every option, ranking all options with low confidence"
        );
        (0..domain.options().len()).collect()
    } else {
        eligible
    };

    // Reported even under low confidence, where they are still ranked
    let excluded: Vec<ExcludedOption> = domain
        .options()
        .iter()
        .zip(&evaluations)
        .filter_map(|(option, results)| {
            let violated: Vec<PredicateResult> = results
                .iter()
                .filter(|r| r.outcome == PredicateOutcome::Violated)
                .cloned()
                .collect();
            (!violated.is_empty()).then(|| ExcludedOption {
                option_id: option.id.clone(),
                name: option.name.clone(),
                violated,
            })
        })
        .collect();

    let unknown_facts: Vec<String> = domain
        .options()
        .iter()
        .flat_map(|o| o.fit.iter())
        .filter(|p| context.get(&p.fact).is_none())
        .map(|p| p.fact.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let cards = scoring::rank(domain, &candidates, config)?;
    let ranked: Vec<OptionAssessment> = cards
        .into_iter()
        .map(|card| assess(domain, card, &evaluations))
        .collect();

    tracing::debug!(
        domain = %domain.id(),
        considered = ranked.len(),
        excluded = excluded.len(),
        unknown_facts = unknown_facts.len(),
        "Ranked options"
    );

    // rank() never returns an empty list
    let primary = ranked[0].clone();
    let runner_ups: Vec<OptionAssessment> = ranked
        .iter()
        .skip(1)
        .take(config.runner_up_count)
        .cloned()
        .collect();
    let margin = runner_ups.first().map(|r| primary.score - r.score);

    Ok(Recommendation {
        domain_id: domain.id().to_string(),
        fingerprint: domain.fingerprint().to_string(),
        primary,
        runner_ups,
        ranked,
        excluded,
        low_confidence,
        unknown_facts,
        margin,
    })
}

fn assess(
    domain: &DecisionDomain,
    card: ScoreCard,
    evaluations: &[Vec<PredicateResult>],
) -> OptionAssessment {
    let option = &domain.options()[card.declaration_index];
    OptionAssessment {
        option_id: card.option_id,
        name: card.option_name,
        score: card.score,
        rank: card.rank,
        breakdown: card.breakdown,
        strengths: option.narrative.strengths.clone(),
        weaknesses: option.narrative.weaknesses.clone(),
        predicates: evaluations[card.declaration_index].clone(),
    }
}
