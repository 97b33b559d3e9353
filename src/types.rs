//! Core types for codex-matrix decision domains
//!
//! These are the authored, serializable shapes:
//! - Criteria and options form a decision matrix
//! - Fit predicates encode "Best For / Avoid When" qualifiers as data
//! - Evolution triggers encode "revisit this when..." thresholds
//!
//! Validation happens in [`crate::domain::load_domain`]; nothing here checks
//! invariants on its own.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Whether a higher raw rating is better or worse on a criterion
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Higher rating is better (e.g. integration quality)
    Maximize,
    /// Lower rating is better (e.g. cost, complexity)
    Minimize,
}

/// A named evaluation axis in a decision matrix
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Criterion {
    pub id: String,
    pub name: String,
    /// Share of the total score (0.0-1.0); a domain's weights sum to 1
    pub weight: f64,
    pub direction: Direction,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

impl Criterion {
    pub fn new(id: &str, name: &str, weight: f64, direction: Direction) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            weight,
            direction,
            tags: Vec::new(),
        }
    }

    pub fn tagged(mut self, tag: &str) -> Self {
        self.tags.push(tag.to_string());
        self
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

/// Free-text strengths and weaknesses, carried through to justifications
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Narrative {
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub weaknesses: Vec<String>,
}

/// A named alternative in a decision matrix
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DecisionOption {
    pub id: String,
    pub name: String,
    /// Criterion id -> ordinal rating on the domain's scale
    pub ratings: BTreeMap<String, u8>,
    /// Applicability conditions over caller context
    #[serde(default)]
    pub fit: Vec<FitPredicate>,
    #[serde(default)]
    pub narrative: Narrative,
}

impl DecisionOption {
    pub fn new(id: &str, name: &str, ratings: &[(&str, u8)]) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            ratings: ratings
                .iter()
                .map(|(criterion, rating)| (criterion.to_string(), *rating))
                .collect(),
            fit: Vec::new(),
            narrative: Narrative::default(),
        }
    }

    pub fn with_fit(mut self, predicate: FitPredicate) -> Self {
        self.fit.push(predicate);
        self
    }

    pub fn with_narrative(mut self, strengths: &[&str], weaknesses: &[&str]) -> Self {
        self.narrative = Narrative {
            strengths: strengths.iter().map(|s| s.to_string()).collect(),
            weaknesses: weaknesses.iter().map(|s| s.to_string()).collect(),
        };
        self
    }

    pub fn rating(&self, criterion_id: &str) -> Option<u8> {
        self.ratings.get(criterion_id).copied()
    }
}

/// A fact value asserted by the caller about their situation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FactValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl FactValue {
    /// Parse a command-line style value: booleans, then numbers, then text
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "true" | "yes" => return FactValue::Bool(true),
            "false" | "no" => return FactValue::Bool(false),
            _ => {}
        }
        match trimmed.parse::<f64>() {
            Ok(n) if n.is_finite() => FactValue::Number(n),
            _ => FactValue::Text(trimmed.to_string()),
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            FactValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FactValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Compare two values of the same kind. `None` when the kinds differ.
    /// Text compares case-insensitively.
    pub fn matches(&self, other: &FactValue) -> Option<bool> {
        match (self, other) {
            (FactValue::Bool(a), FactValue::Bool(b)) => Some(a == b),
            (FactValue::Number(a), FactValue::Number(b)) => Some((a - b).abs() < 1e-9),
            (FactValue::Text(a), FactValue::Text(b)) => Some(a.eq_ignore_ascii_case(b)),
            _ => None,
        }
    }
}

impl fmt::Display for FactValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FactValue::Bool(b) => write!(f, "{}", b),
            FactValue::Number(n) => write!(f, "{}", n),
            FactValue::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<&str> for FactValue {
    fn from(value: &str) -> Self {
        FactValue::Text(value.to_string())
    }
}

impl From<String> for FactValue {
    fn from(value: String) -> Self {
        FactValue::Text(value)
    }
}

impl From<f64> for FactValue {
    fn from(value: f64) -> Self {
        FactValue::Number(value)
    }
}

impl From<i64> for FactValue {
    fn from(value: i64) -> Self {
        FactValue::Number(value as f64)
    }
}

impl From<bool> for FactValue {
    fn from(value: bool) -> Self {
        FactValue::Bool(value)
    }
}

/// Caller-supplied facts (e.g. `team_expertise=javascript`, `traffic=high`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Context {
    facts: BTreeMap<String, FactValue>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, fact: &str, value: impl Into<FactValue>) -> Self {
        self.insert(fact, value);
        self
    }

    pub fn insert(&mut self, fact: &str, value: impl Into<FactValue>) {
        self.facts.insert(fact.to_string(), value.into());
    }

    pub fn get(&self, fact: &str) -> Option<&FactValue> {
        self.facts.get(fact)
    }

    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FactValue)> {
        self.facts.iter()
    }
}

/// Condition a fact must meet for an option to stay eligible
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", content = "value", rename_all = "snake_case")]
pub enum Condition {
    Equals(FactValue),
    NotEquals(FactValue),
    OneOf(Vec<FactValue>),
    NoneOf(Vec<FactValue>),
    AtLeast(f64),
    AtMost(f64),
    IsTrue,
    IsFalse,
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let list = |values: &[FactValue]| {
            values
                .iter()
                .map(|v| v.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        };
        match self {
            Condition::Equals(v) => write!(f, "= {}", v),
            Condition::NotEquals(v) => write!(f, "!= {}", v),
            Condition::OneOf(vs) => write!(f, "in [{}]", list(vs)),
            Condition::NoneOf(vs) => write!(f, "not in [{}]", list(vs)),
            Condition::AtLeast(n) => write!(f, ">= {}", n),
            Condition::AtMost(n) => write!(f, "<= {}", n),
            Condition::IsTrue => write!(f, "is true"),
            Condition::IsFalse => write!(f, "is false"),
        }
    }
}

/// A boolean condition over one context fact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitPredicate {
    pub fact: String,
    pub condition: Condition,
    /// The "Avoid When" prose this predicate encodes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl FitPredicate {
    pub fn new(fact: &str, condition: Condition) -> Self {
        Self {
            fact: fact.to_string(),
            condition,
            note: None,
        }
    }

    pub fn note(mut self, note: &str) -> Self {
        self.note = Some(note.to_string());
        self
    }
}

/// Result of evaluating a fit predicate against a context
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PredicateOutcome {
    Satisfied,
    Violated,
    /// Fact absent from context, or present with a value of another kind
    Unknown,
}

/// Comparison applied between an observed metric and a threshold
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Comparator {
    Gt,
    Gte,
    Lt,
    Lte,
    Eq,
    Ne,
}

impl Comparator {
    pub fn symbol(&self) -> &'static str {
        match self {
            Comparator::Gt => ">",
            Comparator::Gte => ">=",
            Comparator::Lt => "<",
            Comparator::Lte => "<=",
            Comparator::Eq => "==",
            Comparator::Ne => "!=",
        }
    }
}

/// Predicate over a telemetry snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TriggerPredicate {
    Threshold {
        metric: String,
        comparator: Comparator,
        value: f64,
    },
    All {
        of: Vec<TriggerPredicate>,
    },
    Any {
        of: Vec<TriggerPredicate>,
    },
}

impl TriggerPredicate {
    pub fn threshold(metric: &str, comparator: Comparator, value: f64) -> Self {
        TriggerPredicate::Threshold {
            metric: metric.to_string(),
            comparator,
            value,
        }
    }
}

impl fmt::Display for TriggerPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TriggerPredicate::Threshold {
                metric,
                comparator,
                value,
            } => write!(f, "{} {} {}", metric, comparator.symbol(), value),
            TriggerPredicate::All { of } => write_joined(f, of, "AND"),
            TriggerPredicate::Any { of } => write_joined(f, of, "OR"),
        }
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, of: &[TriggerPredicate], sep: &str) -> fmt::Result {
    write!(f, "(")?;
    for (i, p) in of.iter().enumerate() {
        if i > 0 {
            write!(f, " {} ", sep)?;
        }
        write!(f, "{}", p)?;
    }
    write!(f, ")")
}

/// A threshold rule saying when a recommendation should be revisited
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvolutionTrigger {
    pub id: String,
    pub domain_id: String,
    pub description: String,
    pub predicate: TriggerPredicate,
    pub suggested_action: String,
}

/// The authored form of one decision matrix
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainDefinition {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub criteria: Vec<Criterion>,
    pub options: Vec<DecisionOption>,
    #[serde(default)]
    pub triggers: Vec<EvolutionTrigger>,
}

impl DomainDefinition {
    pub fn new(id: &str, name: &str, criteria: Vec<Criterion>, options: Vec<DecisionOption>) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            description: String::new(),
            criteria,
            options,
            triggers: Vec::new(),
        }
    }

    pub fn describe(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    /// Attach a trigger owned by this domain
    pub fn trigger(
        mut self,
        id: &str,
        description: &str,
        predicate: TriggerPredicate,
        suggested_action: &str,
    ) -> Self {
        self.triggers.push(EvolutionTrigger {
            id: id.to_string(),
            domain_id: self.id.clone(),
            description: description.to_string(),
            predicate,
            suggested_action: suggested_action.to_string(),
        });
        self
    }
}

/// Metric name -> observed value, sourced from an external observability system
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySnapshot {
    #[serde(default)]
    pub metrics: BTreeMap<String, f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub captured_at: Option<DateTime<Utc>>,
}

impl TelemetrySnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_metric(mut self, metric: &str, value: f64) -> Self {
        self.metrics.insert(metric.to_string(), value);
        self
    }

    pub fn captured_at(mut self, at: DateTime<Utc>) -> Self {
        self.captured_at = Some(at);
        self
    }

    pub fn get(&self, metric: &str) -> Option<f64> {
        self.metrics.get(metric).copied()
    }
}
