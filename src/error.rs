//! Error types for decision domain loading and evaluation

use thiserror::Error;

/// One problem found while validating a domain definition
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchemaIssue {
    #[error("domain id is empty")]
    EmptyDomainId,

    #[error("domain declares no criteria")]
    NoCriteria,

    #[error("domain declares no options")]
    NoOptions,

    #[error("criterion weights sum to {sum}, expected 1.0 (tolerance {tolerance})")]
    WeightSum { sum: f64, tolerance: f64 },

    #[error("criterion `{criterion}` has invalid weight {weight}")]
    InvalidWeight { criterion: String, weight: f64 },

    #[error("duplicate criterion id `{0}`")]
    DuplicateCriterion(String),

    #[error("duplicate option id `{0}`")]
    DuplicateOption(String),

    #[error("option `{option}` has no rating for criterion `{criterion}`")]
    MissingRating { option: String, criterion: String },

    #[error("option `{option}` rates undeclared criterion `{criterion}`")]
    UndeclaredCriterion { option: String, criterion: String },

    #[error("option `{option}` rates `{criterion}` as {rating}, outside 0..={max}")]
    RatingOutOfRange {
        option: String,
        criterion: String,
        rating: u8,
        max: u8,
    },

    #[error("duplicate trigger id `{0}`")]
    DuplicateTrigger(String),

    #[error("trigger `{trigger}` belongs to domain `{found}`")]
    ForeignTrigger { trigger: String, found: String },

    #[error("trigger `{0}` has an empty all/any predicate")]
    EmptyTriggerPredicate(String),

    #[error("trigger `{trigger}` compares `{metric}` against a non-finite threshold")]
    InvalidThreshold { trigger: String, metric: String },

    #[error("definition could not be serialized for fingerprinting: {0}")]
    Unserializable(String),
}

/// A malformed domain definition. Fatal at load time; no partial domains.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("invalid decision domain `{domain_id}`: {}", join_issues(.issues))]
pub struct SchemaError {
    pub domain_id: String,
    pub issues: Vec<SchemaIssue>,
}

fn join_issues(issues: &[SchemaIssue]) -> String {
    issues
        .iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

impl SchemaError {
    pub fn has_issue(&self, predicate: impl Fn(&SchemaIssue) -> bool) -> bool {
        self.issues.iter().any(predicate)
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MatrixError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// Scoring was asked to rank nothing. Valid domains never get here.
    #[error("decision domain `{0}` has no options to score")]
    EmptyDomain(String),

    #[error("unknown decision domain `{0}`")]
    UnknownDomain(String),

    #[error("invalid engine configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, MatrixError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_error_lists_every_issue() {
        let err = SchemaError {
            domain_id: "ci-platform".to_string(),
            issues: vec![
                SchemaIssue::WeightSum {
                    sum: 0.99,
                    tolerance: 1e-6,
                },
                SchemaIssue::MissingRating {
                    option: "jenkins".to_string(),
                    criterion: "cost".to_string(),
                },
            ],
        };
        let message = err.to_string();
        assert!(message.starts_with("invalid decision domain `ci-platform`"));
        assert!(message.contains("sum to 0.99"));
        assert!(message.contains("option `jenkins` has no rating for criterion `cost`"));
    }

    #[test]
    fn test_schema_error_converts_to_matrix_error() {
        let err: MatrixError = SchemaError {
            domain_id: "x".to_string(),
            issues: vec![SchemaIssue::NoCriteria],
        }
        .into();
        assert!(matches!(err, MatrixError::Schema(_)));
    }
}
