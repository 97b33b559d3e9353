//! Decision engine: a registry of loaded domains keyed by id
//!
//! Loading takes `&mut self`; every query takes `&self` and touches only
//! immutable domains, so a loaded engine can be shared across threads.

use crate::catalog;
use crate::config::EngineConfig;
use crate::domain::{self, DecisionDomain};
use crate::error::{MatrixError, Result, SchemaError};
use crate::scoring::{self, ScoreCard};
use crate::selector::{self, Recommendation};
use crate::triggers::{self, StalenessReport, TriggeredWarning};
use crate::types::{Context, DomainDefinition, TelemetrySnapshot};
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct DecisionEngine {
    config: EngineConfig,
    domains: BTreeMap<String, Arc<DecisionDomain>>,
}

impl DecisionEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            domains: BTreeMap::new(),
        })
    }

    /// Engine preloaded with the built-in Codex matrices
    pub fn with_builtin_catalog(config: EngineConfig) -> Result<Self> {
        let mut engine = Self::with_config(config)?;
        engine.load_domains(catalog::builtin_domains())?;
        Ok(engine)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Validate and register a domain. Re-loading an id replaces the old
    /// domain wholesale.
    pub fn load_domain(&mut self, definition: DomainDefinition) -> Result<Arc<DecisionDomain>> {
        let loaded = Arc::new(domain::load_domain(definition, &self.config)?);
        self.register(loaded.clone());
        Ok(loaded)
    }

    /// Validate every definition before registering any of them
    pub fn load_domains(
        &mut self,
        definitions: impl IntoIterator<Item = DomainDefinition>,
    ) -> Result<Vec<Arc<DecisionDomain>>> {
        let loaded = definitions
            .into_iter()
            .map(|def| domain::load_domain(def, &self.config).map(Arc::new))
            .collect::<std::result::Result<Vec<_>, SchemaError>>()?;
        for domain in &loaded {
            self.register(domain.clone());
        }
        Ok(loaded)
    }

    fn register(&mut self, domain: Arc<DecisionDomain>) {
        let id = domain.id().to_string();
        if self.domains.insert(id.clone(), domain).is_some() {
            tracing::info!(domain = %id, "Reloaded decision domain");
        } else {
            tracing::info!(domain = %id, "Registered decision domain");
        }
    }

    pub fn domain(&self, domain_id: &str) -> Result<&Arc<DecisionDomain>> {
        self.domains
            .get(domain_id)
            .ok_or_else(|| MatrixError::UnknownDomain(domain_id.to_string()))
    }

    /// Registered domain ids, sorted
    pub fn domain_ids(&self) -> Vec<&str> {
        self.domains.keys().map(|k| k.as_str()).collect()
    }

    pub fn domains(&self) -> impl Iterator<Item = &Arc<DecisionDomain>> {
        self.domains.values()
    }

    pub fn score(&self, domain_id: &str) -> Result<Vec<ScoreCard>> {
        scoring::score_domain(self.domain(domain_id)?, &self.config)
    }

    pub fn recommend(&self, domain_id: &str, context: &Context) -> Result<Recommendation> {
        selector::recommend(self.domain(domain_id)?, context, &self.config)
    }

    pub fn evaluate_triggers(
        &self,
        domain_id: &str,
        telemetry: &TelemetrySnapshot,
    ) -> Result<Vec<TriggeredWarning>> {
        Ok(triggers::evaluate(self.domain(domain_id)?, telemetry))
    }

    pub fn check_staleness(
        &self,
        domain_id: &str,
        recorded_fingerprint: &str,
        telemetry: &TelemetrySnapshot,
    ) -> Result<StalenessReport> {
        Ok(triggers::check_staleness(
            self.domain(domain_id)?,
            recorded_fingerprint,
            telemetry,
        ))
    }
}
