//! codex-matrix - Decision matrices for the Engineering Codex
//!
//! Each Codex decision domain (auth strategy, CI platform, caching backend...)
//! is a weighted criteria matrix over a fixed set of options. This crate
//! scores those matrices, filters options against facts about the caller's
//! situation, and watches telemetry for signals that an earlier decision
//! should be revisited.
//!
//! Everything here is deterministic: the same definition and the same
//! context always yield the same recommendation.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use codex_matrix::{Context, DecisionEngine, EngineConfig, TelemetrySnapshot};
//!
//! let engine = DecisionEngine::with_builtin_catalog(EngineConfig::default())?;
//!
//! // Recommend
//! let context = Context::new().with("vcs_host", "github");
//! let rec = engine.recommend("ci-platform", &context)?;
//! println!("{} ({:.2})", rec.primary.name, rec.primary.score);
//!
//! // Revisit
//! let telemetry = TelemetrySnapshot::new().with_metric("deployment_frequency", 15.0);
//! for warning in engine.evaluate_triggers("ci-platform", &telemetry)? {
//!     println!("{}", warning.suggested_action);
//! }
//! ```
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │   DomainDefinition (catalog / JSON / YAML files)     │
//! └─────────────────────┬────────────────────────────────┘
//!                       │ load_domain() → SchemaError
//!                       ▼
//! ┌──────────────────────────────────────────────────────┐
//! │                 DecisionEngine                        │
//! │  score()             → ranked ScoreCards              │
//! │  recommend()         → fit filter + Recommendation    │
//! │  evaluate_triggers() → TriggeredWarnings              │
//! │  check_staleness()   → StalenessReport                │
//! └─────────────────────┬────────────────────────────────┘
//!                       │ CLI --record
//!                       ▼
//! ┌──────────────────────────────────────────────────────┐
//! │              SQLite recommendation ledger             │
//! └──────────────────────────────────────────────────────┘
//! ```

pub mod catalog;
pub mod config;
pub mod domain;
pub mod engine;
pub mod error;
pub mod ledger;
pub mod loader;
pub mod scoring;
pub mod selector;
pub mod triggers;
pub mod types;

// Core types
pub use config::{EngineConfig, COMPLEXITY_TAG};
pub use domain::{load_domain, DecisionDomain};
pub use engine::DecisionEngine;
pub use error::{MatrixError, SchemaError, SchemaIssue};
pub use types::*;

// Results
pub use scoring::{CriterionContribution, ScoreCard};
pub use selector::{ExcludedOption, OptionAssessment, PredicateResult, Recommendation};
pub use triggers::{StalenessReport, TriggeredWarning};

// Built-in Codex matrices
pub use catalog::{builtin_domain, builtin_domains};
