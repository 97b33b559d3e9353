//! Scoring Engine
//!
//! score = Σ normalize(rating, direction) × weight
//!
//! Normalization maps every rating onto 0..1 with "higher is better" on every
//! criterion, so ranking is a plain descending sort plus the near-tie rule.

use crate::config::EngineConfig;
use crate::domain::DecisionDomain;
use crate::error::{MatrixError, Result};
use crate::types::Direction;
use serde::{Deserialize, Serialize};

/// One criterion's share of an option's score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriterionContribution {
    pub criterion_id: String,
    pub criterion_name: String,
    pub direction: Direction,
    pub rating: u8,
    pub normalized: f64,
    pub weight: f64,
    pub contribution: f64,
}

/// Weighted score for one option
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreCard {
    pub option_id: String,
    pub option_name: String,
    pub score: f64,
    /// 1-based position after tie-breaking
    pub rank: usize,
    /// Position in the domain's option list
    pub declaration_index: usize,
    pub breakdown: Vec<CriterionContribution>,
}

impl ScoreCard {
    pub fn rating_for(&self, criterion_id: &str) -> Option<u8> {
        self.breakdown
            .iter()
            .find(|c| c.criterion_id == criterion_id)
            .map(|c| c.rating)
    }
}

/// Map a rating on `0..=max_rating` to `0..=1`, inverted for `Minimize`.
/// Ratings above the scale are clamped.
pub fn normalize(rating: u8, direction: Direction, max_rating: u8) -> f64 {
    if max_rating == 0 {
        return 0.0;
    }
    let max = max_rating as f64;
    let rating = rating.min(max_rating) as f64;
    match direction {
        Direction::Maximize => rating / max,
        Direction::Minimize => (max - rating) / max,
    }
}

/// Score a single option (by declaration index) without ranking it
pub fn score_option(domain: &DecisionDomain, index: usize) -> Option<ScoreCard> {
    let option = domain.options().get(index)?;
    let max_rating = domain.max_rating();

    let breakdown: Vec<CriterionContribution> = domain
        .criteria()
        .iter()
        .map(|criterion| {
            // load_domain guarantees every rating is present
            let rating = option.rating(&criterion.id).unwrap_or(0);
            let normalized = normalize(rating, criterion.direction, max_rating);
            CriterionContribution {
                criterion_id: criterion.id.clone(),
                criterion_name: criterion.name.clone(),
                direction: criterion.direction,
                rating,
                normalized,
                weight: criterion.weight,
                contribution: normalized * criterion.weight,
            }
        })
        .collect();

    let score = breakdown.iter().map(|c| c.contribution).sum();

    Some(ScoreCard {
        option_id: option.id.clone(),
        option_name: option.name.clone(),
        score,
        rank: 0,
        declaration_index: index,
        breakdown,
    })
}

/// Score and rank every option in the domain
pub fn score_domain(domain: &DecisionDomain, config: &EngineConfig) -> Result<Vec<ScoreCard>> {
    let all: Vec<usize> = (0..domain.options().len()).collect();
    rank(domain, &all, config)
}

/// Score and rank a subset of options, given by declaration index.
///
/// Order: score descending, then near-ties resolved in clusters. A cluster
/// is anchored at the best remaining score and holds every option within
/// `tie_epsilon` of it. Inside a cluster the lower complexity rating wins,
/// then declaration order. With `tie_epsilon == 0` nothing clusters and exact
/// score ties keep declaration order.
pub fn rank(
    domain: &DecisionDomain,
    candidates: &[usize],
    config: &EngineConfig,
) -> Result<Vec<ScoreCard>> {
    if candidates.is_empty() {
        return Err(MatrixError::EmptyDomain(domain.id().to_string()));
    }

    let mut cards: Vec<ScoreCard> = candidates
        .iter()
        .filter_map(|&index| score_option(domain, index))
        .collect();
    if cards.is_empty() {
        return Err(MatrixError::EmptyDomain(domain.id().to_string()));
    }

    cards.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then(a.declaration_index.cmp(&b.declaration_index))
    });

    let complexity = domain
        .tagged_criterion(&config.complexity_tag)
        .map(|c| c.id.clone());

    let mut start = 0;
    while start < cards.len() {
        // The anchor always belongs to its own cluster, so `end > start`
        let anchor = cards[start].score;
        let end = cards[start + 1..]
            .iter()
            .position(|c| anchor - c.score >= config.tie_epsilon)
            .map_or(cards.len(), |offset| start + 1 + offset);

        if end - start > 1 {
            let cluster = &mut cards[start..end];
            match &complexity {
                Some(criterion_id) => cluster.sort_by_key(|c| {
                    (
                        c.rating_for(criterion_id).unwrap_or(0),
                        c.declaration_index,
                    )
                }),
                None => cluster.sort_by_key(|c| c.declaration_index),
            }
            tracing::debug!(
                domain = %domain.id(),
                tied = ?cluster.iter().map(|c| c.option_id.as_str()).collect::<Vec<_>>(),
                "Resolved near-tie"
            );
        }
        start = end;
    }

    for (i, card) in cards.iter_mut().enumerate() {
        card.rank = i + 1;
    }

    Ok(cards)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::COMPLEXITY_TAG;
    use crate::domain::load_domain;
    use crate::types::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn ci_platform() -> DecisionDomain {
        let def = DomainDefinition::new(
            "ci-platform",
            "CI Platform",
            vec![
                Criterion::new("integration", "Integration", 0.6, Direction::Maximize),
                Criterion::new("cost", "Cost", 0.4, Direction::Minimize),
            ],
            vec![
                DecisionOption::new("jenkins", "Jenkins", &[("integration", 3), ("cost", 4)]),
                DecisionOption::new(
                    "github-actions",
                    "GitHub Actions",
                    &[("integration", 5), ("cost", 2)],
                ),
            ],
        );
        load_domain(def, &EngineConfig::default()).unwrap()
    }

    /// Two options with identical scores; `complexity` decides the tag
    fn tied_domain(tag_complexity: bool) -> DecisionDomain {
        let mut complexity = Criterion::new("complexity", "Complexity", 0.5, Direction::Minimize);
        if tag_complexity {
            complexity = complexity.tagged(COMPLEXITY_TAG);
        }
        let def = DomainDefinition::new(
            "tied",
            "Tied",
            vec![
                Criterion::new("value", "Value", 0.5, Direction::Maximize),
                complexity,
            ],
            vec![
                // 0.5*0.8 + 0.5*0.4 = 0.6
                DecisionOption::new("ambitious", "Ambitious", &[("value", 4), ("complexity", 3)]),
                // 0.5*0.6 + 0.5*0.6 = 0.6
                DecisionOption::new("modest", "Modest", &[("value", 3), ("complexity", 2)]),
            ],
        );
        load_domain(def, &EngineConfig::default()).unwrap()
    }

    #[test]
    fn test_normalize_range() {
        for rating in 0..=5u8 {
            for direction in [Direction::Maximize, Direction::Minimize] {
                let n = normalize(rating, direction, 5);
                assert!((0.0..=1.0).contains(&n), "{} {:?} -> {}", rating, direction, n);
            }
        }
        assert!(approx(normalize(5, Direction::Maximize, 5), 1.0));
        assert!(approx(normalize(5, Direction::Minimize, 5), 0.0));
        assert!(approx(normalize(2, Direction::Minimize, 5), 0.6));
    }

    #[test]
    fn test_normalize_clamps_and_handles_zero_scale() {
        assert!(approx(normalize(9, Direction::Maximize, 5), 1.0));
        assert_eq!(normalize(3, Direction::Maximize, 0), 0.0);
    }

    #[test]
    fn test_ci_platform_scores() {
        let cards = score_domain(&ci_platform(), &EngineConfig::default()).unwrap();
        assert_eq!(cards[0].option_id, "github-actions");
        assert!(approx(cards[0].score, 0.84));
        assert_eq!(cards[0].rank, 1);
        assert_eq!(cards[1].option_id, "jenkins");
        assert!(approx(cards[1].score, 0.44));
        assert_eq!(cards[1].rank, 2);
    }

    #[test]
    fn test_breakdown_sums_to_score() {
        let cards = score_domain(&ci_platform(), &EngineConfig::default()).unwrap();
        for card in &cards {
            let sum: f64 = card.breakdown.iter().map(|c| c.contribution).sum();
            assert!(approx(sum, card.score));
        }
        let gha = &cards[0];
        assert!(approx(gha.breakdown[0].contribution, 0.6));
        assert!(approx(gha.breakdown[1].contribution, 0.24));
    }

    #[test]
    fn test_tie_prefers_lower_complexity() {
        let cards = score_domain(&tied_domain(true), &EngineConfig::default()).unwrap();
        assert_eq!(cards[0].option_id, "modest");
        assert_eq!(cards[1].option_id, "ambitious");
    }

    #[test]
    fn test_tie_without_complexity_tag_keeps_declaration_order() {
        let cards = score_domain(&tied_domain(false), &EngineConfig::default()).unwrap();
        assert_eq!(cards[0].option_id, "ambitious");
        assert_eq!(cards[1].option_id, "modest");
    }

    #[test]
    fn test_near_tie_within_epsilon_uses_declaration_order() {
        let def = DomainDefinition::new(
            "near",
            "Near",
            vec![Criterion::new("value", "Value", 1.0, Direction::Maximize)],
            vec![
                DecisionOption::new("first", "First", &[("value", 40)]),
                DecisionOption::new("second", "Second", &[("value", 41)]),
            ],
        );
        let config = EngineConfig {
            max_rating: 200,
            ..Default::default()
        };
        let domain = load_domain(def, &config).unwrap();
        // 0.200 vs 0.205: within 0.01
        let cards = score_domain(&domain, &config).unwrap();
        assert_eq!(cards[0].option_id, "first");

        let strict = EngineConfig {
            max_rating: 200,
            tie_epsilon: 0.001,
            ..Default::default()
        };
        let cards = score_domain(&domain, &strict).unwrap();
        assert_eq!(cards[0].option_id, "second");
    }

    /// One weighted value criterion plus a zero-weight complexity criterion,
    /// so complexity only matters inside a tie cluster
    fn value_domain(options: &[(&str, u8, u8)], config: &EngineConfig) -> DecisionDomain {
        let def = DomainDefinition::new(
            "values",
            "Values",
            vec![
                Criterion::new("value", "Value", 1.0, Direction::Maximize),
                Criterion::new("complexity", "Complexity", 0.0, Direction::Minimize)
                    .tagged(COMPLEXITY_TAG),
            ],
            options
                .iter()
                .map(|(id, value, complexity)| {
                    DecisionOption::new(id, id, &[("value", *value), ("complexity", *complexity)])
                })
                .collect(),
        );
        load_domain(def, config).unwrap()
    }

    fn order(cards: &[ScoreCard]) -> Vec<&str> {
        cards.iter().map(|c| c.option_id.as_str()).collect()
    }

    #[test]
    fn test_chained_near_ties_cluster_from_anchor() {
        let config = EngineConfig {
            max_rating: 200,
            tie_epsilon: 0.012,
            ..Default::default()
        };
        // 0.50, 0.49, 0.48: a~b and b~c, but c is outside a's cluster
        let domain = value_domain(&[("a", 100, 3), ("b", 98, 1), ("c", 96, 0)], &config);
        let cards = score_domain(&domain, &config).unwrap();
        assert_eq!(order(&cards), vec!["b", "a", "c"]);
        let ranks: Vec<usize> = cards.iter().map(|c| c.rank).collect();
        assert_eq!(ranks, vec![1, 2, 3]);
    }

    #[test]
    fn test_gap_equal_to_epsilon_is_not_a_tie() {
        let config = EngineConfig {
            max_rating: 4,
            tie_epsilon: 0.25,
            ..Default::default()
        };
        // 0.75 vs 1.0, exactly 0.25 apart
        let domain = value_domain(&[("simple", 3, 0), ("rich", 4, 4)], &config);
        let cards = score_domain(&domain, &config).unwrap();
        assert_eq!(order(&cards), vec!["rich", "simple"]);

        let wider = EngineConfig {
            tie_epsilon: 0.26,
            ..config
        };
        let cards = score_domain(&domain, &wider).unwrap();
        assert_eq!(order(&cards), vec!["simple", "rich"]);
    }

    #[test]
    fn test_zero_epsilon_ranks_without_clustering() {
        let config = EngineConfig {
            tie_epsilon: 0.0,
            ..Default::default()
        };
        assert!(config.validate().is_ok());

        let cards = score_domain(&ci_platform(), &config).unwrap();
        assert_eq!(order(&cards), vec!["github-actions", "jenkins"]);

        // Exact score ties keep declaration order; complexity is not consulted
        let domain = value_domain(&[("first", 3, 4), ("second", 3, 0)], &config);
        let cards = score_domain(&domain, &config).unwrap();
        assert_eq!(order(&cards), vec!["first", "second"]);

        let cards = score_domain(&domain, &EngineConfig::default()).unwrap();
        assert_eq!(order(&cards), vec!["second", "first"]);
    }

    #[test]
    fn test_rank_empty_set_is_empty_domain_error() {
        let domain = ci_platform();
        let err = rank(&domain, &[], &EngineConfig::default()).unwrap_err();
        assert_eq!(err, MatrixError::EmptyDomain("ci-platform".to_string()));
    }

    #[test]
    fn test_rank_subset() {
        let domain = ci_platform();
        let cards = rank(&domain, &[0], &EngineConfig::default()).unwrap();
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].option_id, "jenkins");
        assert_eq!(cards[0].rank, 1);
    }

    #[test]
    fn test_scoring_is_deterministic() {
        let domain = tied_domain(true);
        let a = score_domain(&domain, &EngineConfig::default()).unwrap();
        let b = score_domain(&domain, &EngineConfig::default()).unwrap();
        assert_eq!(a, b);
    }
}
