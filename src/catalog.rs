//! Built-in decision domains: the Codex option tables as data
//!
//! Each facet guide's "Options" matrix becomes a domain here. Star ratings
//! map onto the 0-5 scale; "Best For / Avoid When" qualifiers become fit
//! predicates; "when to switch" guidance becomes evolution triggers.

use crate::config::COMPLEXITY_TAG;
use crate::types::*;
use crate::types::Comparator::{Gt, Gte, Lt};
use crate::types::Direction::{Maximize, Minimize};

/// Get all built-in decision domains
pub fn builtin_domains() -> Vec<DomainDefinition> {
    vec![
        auth_strategy(),
        ci_platform(),
        deployment_strategy(),
        caching_backend(),
        state_management(),
        error_response_format(),
        load_testing_tool(),
    ]
}

/// Look up one built-in domain by id
pub fn builtin_domain(id: &str) -> Option<DomainDefinition> {
    builtin_domains().into_iter().find(|d| d.id == id)
}

fn avoid_unless(fact: &str, condition: Condition, note: &str) -> FitPredicate {
    FitPredicate::new(fact, condition).note(note)
}

fn texts(values: &[&str]) -> Vec<FactValue> {
    values.iter().map(|v| FactValue::from(*v)).collect()
}

// ============================================================================
// AUTHENTICATION
// ============================================================================

fn auth_strategy() -> DomainDefinition {
    DomainDefinition::new(
        "auth-strategy",
        "Authentication Strategy",
        vec![
            Criterion::new("security", "Security posture", 0.35, Maximize),
            Criterion::new("developer-experience", "Developer experience", 0.2, Maximize),
            Criterion::new("complexity", "Implementation complexity", 0.2, Minimize)
                .tagged(COMPLEXITY_TAG),
            Criterion::new("scalability", "Horizontal scalability", 0.15, Maximize),
            Criterion::new("cost", "Running cost", 0.1, Minimize),
        ],
        vec![
            DecisionOption::new(
                "session-cookies",
                "Server-side sessions",
                &[
                    ("security", 4),
                    ("developer-experience", 4),
                    ("complexity", 2),
                    ("scalability", 3),
                    ("cost", 1),
                ],
            )
            .with_fit(avoid_unless(
                "client_type",
                Condition::NoneOf(texts(&["mobile", "third_party_api"])),
                "Avoid when clients are native mobile apps or third-party API consumers",
            ))
            .with_narrative(
                &["Instant revocation", "HttpOnly cookies keep tokens away from scripts"],
                &["Needs a shared session store once you scale out", "CSRF protection required"],
            ),
            DecisionOption::new(
                "jwt",
                "Stateless JWT",
                &[
                    ("security", 3),
                    ("developer-experience", 4),
                    ("complexity", 3),
                    ("scalability", 5),
                    ("cost", 1),
                ],
            )
            .with_fit(avoid_unless(
                "needs_immediate_revocation",
                Condition::IsFalse,
                "Avoid when tokens must be revocable instantly",
            ))
            .with_narrative(
                &["No server-side lookup per request", "Works across services"],
                &["Revocation needs a denylist", "Easy to misconfigure algorithms and expiry"],
            ),
            DecisionOption::new(
                "managed-identity",
                "Managed identity provider (OIDC)",
                &[
                    ("security", 5),
                    ("developer-experience", 4),
                    ("complexity", 2),
                    ("scalability", 5),
                    ("cost", 4),
                ],
            )
            .with_fit(avoid_unless(
                "strict_data_residency",
                Condition::IsFalse,
                "Avoid when user records may not leave your infrastructure",
            ))
            .with_fit(avoid_unless(
                "budget",
                Condition::NoneOf(texts(&["minimal"])),
                "Avoid on a minimal budget; per-MAU pricing grows fast",
            ))
            .with_narrative(
                &["MFA, SSO and social login out of the box", "Security patches handled for you"],
                &["Per-user pricing", "Vendor lock-in on user store"],
            ),
            DecisionOption::new(
                "self-hosted-oidc",
                "Self-hosted OIDC (e.g. Keycloak)",
                &[
                    ("security", 5),
                    ("developer-experience", 2),
                    ("complexity", 5),
                    ("scalability", 4),
                    ("cost", 2),
                ],
            )
            .with_fit(avoid_unless(
                "team_has_ops_capacity",
                Condition::IsTrue,
                "Avoid without a team able to run and patch identity infrastructure",
            ))
            .with_narrative(
                &["Full control of user data", "Standards-based federation"],
                &["Operational burden", "Upgrades are your problem"],
            ),
        ],
    )
    .describe("How users and services prove who they are")
    .trigger(
        "mau-growth",
        "Monthly active users passed 100k",
        TriggerPredicate::threshold("monthly_active_users", Gt, 100_000.0),
        "Re-check managed identity pricing against a self-hosted OIDC deployment",
    )
    .trigger(
        "auth-incidents",
        "Authentication incident in the last quarter",
        TriggerPredicate::threshold("auth_incidents_per_quarter", Gte, 1.0),
        "Review token lifetimes and revocation; prefer server-side sessions or a managed provider",
    )
}

// ============================================================================
// CI/CD
// ============================================================================

fn ci_platform() -> DomainDefinition {
    DomainDefinition::new(
        "ci-platform",
        "CI Platform",
        vec![
            Criterion::new("integration", "VCS integration", 0.35, Maximize),
            Criterion::new("cost", "Cost", 0.25, Minimize),
            Criterion::new("maintenance", "Maintenance burden", 0.2, Minimize)
                .tagged(COMPLEXITY_TAG),
            Criterion::new("flexibility", "Pipeline flexibility", 0.2, Maximize),
        ],
        vec![
            DecisionOption::new(
                "github-actions",
                "GitHub Actions",
                &[("integration", 5), ("cost", 2), ("maintenance", 1), ("flexibility", 4)],
            )
            .with_fit(avoid_unless(
                "vcs_host",
                Condition::Equals("github".into()),
                "Avoid when code is not hosted on GitHub",
            ))
            .with_narrative(
                &["Native PR checks", "Large marketplace of actions"],
                &["Hosted minutes get expensive at scale", "YAML reuse is limited"],
            ),
            DecisionOption::new(
                "gitlab-ci",
                "GitLab CI",
                &[("integration", 4), ("cost", 2), ("maintenance", 2), ("flexibility", 4)],
            )
            .with_fit(avoid_unless(
                "vcs_host",
                Condition::Equals("gitlab".into()),
                "Avoid when code is not hosted on GitLab",
            ))
            .with_narrative(
                &["Built-in registry and environments", "Self-managed option"],
                &["Runner fleet to manage when self-hosted"],
            ),
            DecisionOption::new(
                "jenkins",
                "Jenkins",
                &[("integration", 3), ("cost", 3), ("maintenance", 5), ("flexibility", 5)],
            )
            .with_fit(avoid_unless(
                "team_has_ops_capacity",
                Condition::IsTrue,
                "Avoid without dedicated people to maintain the server and plugins",
            ))
            .with_narrative(
                &["Anything is scriptable", "Runs anywhere"],
                &["Plugin upgrades break builds", "Server is a pet"],
            ),
            DecisionOption::new(
                "circleci",
                "CircleCI",
                &[("integration", 4), ("cost", 3), ("maintenance", 1), ("flexibility", 3)],
            )
            .with_fit(avoid_unless(
                "budget",
                Condition::NoneOf(texts(&["minimal"])),
                "Avoid on a minimal budget once the free tier runs out",
            ))
            .with_narrative(
                &["Fast caching and parallelism"],
                &["Another vendor account", "Credit-based pricing is hard to predict"],
            ),
        ],
    )
    .describe("Where builds, tests and deploy pipelines run")
    .trigger(
        "build-minutes",
        "Hosted build minutes above 50k per month",
        TriggerPredicate::threshold("build_minutes_per_month", Gt, 50_000.0),
        "Compare self-hosted runners against hosted minute pricing",
    )
    .trigger(
        "slow-pipeline",
        "Average pipeline slower than 20 minutes",
        TriggerPredicate::threshold("avg_pipeline_minutes", Gt, 20.0),
        "Invest in caching and test sharding before switching platforms",
    )
}

fn deployment_strategy() -> DomainDefinition {
    DomainDefinition::new(
        "deployment-strategy",
        "Deployment Strategy",
        vec![
            Criterion::new("risk-reduction", "Blast radius reduction", 0.35, Maximize),
            Criterion::new("rollback-speed", "Rollback speed", 0.25, Maximize),
            Criterion::new("infrastructure-cost", "Infrastructure cost", 0.15, Minimize),
            Criterion::new("complexity", "Implementation complexity", 0.25, Minimize)
                .tagged(COMPLEXITY_TAG),
        ],
        vec![
            DecisionOption::new(
                "rolling",
                "Rolling update",
                &[
                    ("risk-reduction", 3),
                    ("rollback-speed", 3),
                    ("infrastructure-cost", 1),
                    ("complexity", 2),
                ],
            )
            .with_narrative(
                &["Default in most orchestrators", "No extra capacity"],
                &["Old and new versions serve traffic together"],
            ),
            DecisionOption::new(
                "blue-green",
                "Blue-green",
                &[
                    ("risk-reduction", 4),
                    ("rollback-speed", 5),
                    ("infrastructure-cost", 4),
                    ("complexity", 3),
                ],
            )
            .with_fit(avoid_unless(
                "breaking_schema_migrations",
                Condition::IsFalse,
                "Avoid when releases carry schema changes both colors cannot share",
            ))
            .with_narrative(
                &["Instant rollback by switching traffic"],
                &["Double the infrastructure during cutover"],
            ),
            DecisionOption::new(
                "canary",
                "Canary release",
                &[
                    ("risk-reduction", 5),
                    ("rollback-speed", 4),
                    ("infrastructure-cost", 3),
                    ("complexity", 4),
                ],
            )
            .with_fit(avoid_unless(
                "traffic",
                Condition::OneOf(texts(&["medium", "high"])),
                "Avoid when traffic is too low for canary metrics to mean anything",
            ))
            .with_fit(avoid_unless(
                "has_observability",
                Condition::IsTrue,
                "Avoid without metrics to compare canary and baseline",
            ))
            .with_narrative(
                &["Smallest blast radius", "Real traffic validation"],
                &["Needs traffic splitting and good metrics"],
            ),
            DecisionOption::new(
                "recreate",
                "Recreate",
                &[
                    ("risk-reduction", 1),
                    ("rollback-speed", 2),
                    ("infrastructure-cost", 1),
                    ("complexity", 1),
                ],
            )
            .with_fit(avoid_unless(
                "downtime_acceptable",
                Condition::IsTrue,
                "Avoid when any downtime is unacceptable",
            ))
            .with_narrative(&["Simplest possible"], &["Downtime on every deploy"]),
        ],
    )
    .describe("How new versions reach production")
    .trigger(
        "deploy-frequency",
        "Deploying more than ten times a day",
        TriggerPredicate::threshold("deployment_frequency", Gt, 10.0),
        "Reconsider trunk-based branching with feature flags and progressive delivery",
    )
    .trigger(
        "change-failure-rate",
        "More than 15% of changes cause failures",
        TriggerPredicate::threshold("change_failure_rate", Gt, 0.15),
        "Move toward canary releases with automated rollback",
    )
}

// ============================================================================
// PERFORMANCE
// ============================================================================

fn caching_backend() -> DomainDefinition {
    DomainDefinition::new(
        "caching-backend",
        "Caching Backend",
        vec![
            Criterion::new("latency", "Read latency", 0.3, Maximize),
            Criterion::new("features", "Data structures and features", 0.2, Maximize),
            Criterion::new("operations", "Operational overhead", 0.25, Minimize)
                .tagged(COMPLEXITY_TAG),
            Criterion::new("cost", "Cost", 0.25, Minimize),
        ],
        vec![
            DecisionOption::new(
                "in-process",
                "In-process LRU",
                &[("latency", 5), ("features", 1), ("operations", 0), ("cost", 0)],
            )
            .with_fit(avoid_unless(
                "instance_count",
                Condition::AtMost(1.0),
                "Avoid when several instances must see the same cached state",
            ))
            .with_narrative(
                &["Zero network hops", "Nothing to deploy"],
                &["Lost on restart", "Not shared between instances"],
            ),
            DecisionOption::new(
                "redis",
                "Redis",
                &[("latency", 4), ("features", 5), ("operations", 3), ("cost", 2)],
            )
            .with_narrative(
                &["Rich data structures", "Pub/sub and expiry built in"],
                &["Another stateful service to run"],
            ),
            DecisionOption::new(
                "memcached",
                "Memcached",
                &[("latency", 4), ("features", 2), ("operations", 2), ("cost", 2)],
            )
            .with_narrative(&["Simple and multi-threaded"], &["Strings only", "No persistence"]),
            DecisionOption::new(
                "cdn-edge",
                "CDN edge cache",
                &[("latency", 4), ("features", 2), ("operations", 1), ("cost", 3)],
            )
            .with_fit(avoid_unless(
                "content_type",
                Condition::OneOf(texts(&["static", "public"])),
                "Avoid for personalized or private responses",
            ))
            .with_narrative(
                &["Offloads origin entirely", "Global latency wins"],
                &["Invalidation is slow and coarse"],
            ),
        ],
    )
    .describe("Where hot data is cached")
    .trigger(
        "hit-ratio",
        "Cache hit ratio below 80%",
        TriggerPredicate::threshold("cache_hit_ratio", Lt, 0.8),
        "Revisit key design and TTLs before scaling the cache tier",
    )
    .trigger(
        "divergent-instances",
        "Multiple instances with reported cache inconsistencies",
        TriggerPredicate::All {
            of: vec![
                TriggerPredicate::threshold("instance_count", Gt, 1.0),
                TriggerPredicate::threshold("cache_inconsistency_reports", Gt, 0.0),
            ],
        },
        "Move shared state out of in-process caches into Redis",
    )
}

fn load_testing_tool() -> DomainDefinition {
    DomainDefinition::new(
        "load-testing-tool",
        "Load Testing Tool",
        vec![
            Criterion::new("scripting", "Scripting language fit", 0.25, Maximize),
            Criterion::new("protocols", "Protocol support", 0.2, Maximize),
            Criterion::new("scale", "Distributed scale", 0.2, Maximize),
            Criterion::new("ci-integration", "CI integration", 0.2, Maximize),
            Criterion::new("complexity", "Setup complexity", 0.15, Minimize)
                .tagged(COMPLEXITY_TAG),
        ],
        vec![
            DecisionOption::new(
                "k6",
                "k6",
                &[
                    ("scripting", 5),
                    ("protocols", 3),
                    ("scale", 4),
                    ("ci-integration", 5),
                    ("complexity", 2),
                ],
            )
            .with_fit(avoid_unless(
                "team_expertise",
                Condition::OneOf(texts(&["javascript", "typescript", "go"])),
                "Avoid when nobody on the team writes JavaScript",
            ))
            .with_narrative(
                &["Tests as code", "Thresholds fail CI builds"],
                &["Not a real browser", "Extensions needed for some protocols"],
            ),
            DecisionOption::new(
                "locust",
                "Locust",
                &[
                    ("scripting", 4),
                    ("protocols", 3),
                    ("scale", 4),
                    ("ci-integration", 3),
                    ("complexity", 2),
                ],
            )
            .with_fit(avoid_unless(
                "team_expertise",
                Condition::Equals("python".into()),
                "Avoid when the team does not write Python",
            ))
            .with_narrative(&["Plain Python scenarios", "Web UI"], &["Lower throughput per worker"]),
            DecisionOption::new(
                "jmeter",
                "Apache JMeter",
                &[
                    ("scripting", 2),
                    ("protocols", 5),
                    ("scale", 4),
                    ("ci-integration", 2),
                    ("complexity", 4),
                ],
            )
            .with_narrative(
                &["Widest protocol coverage"],
                &["XML test plans", "Heavy GUI-driven workflow"],
            ),
            DecisionOption::new(
                "gatling",
                "Gatling",
                &[
                    ("scripting", 3),
                    ("protocols", 4),
                    ("scale", 5),
                    ("ci-integration", 4),
                    ("complexity", 3),
                ],
            )
            .with_fit(avoid_unless(
                "team_expertise",
                Condition::OneOf(texts(&["scala", "java", "kotlin"])),
                "Avoid outside JVM teams",
            ))
            .with_narrative(&["Very efficient load generation", "Good reports"], &["JVM DSL"]),
            DecisionOption::new(
                "artillery",
                "Artillery",
                &[
                    ("scripting", 4),
                    ("protocols", 3),
                    ("scale", 3),
                    ("ci-integration", 4),
                    ("complexity", 1),
                ],
            )
            .with_fit(avoid_unless(
                "target_rps",
                Condition::AtMost(5_000.0),
                "Avoid for very high request rates from a single runner",
            ))
            .with_narrative(&["YAML scenarios", "Quick to start"], &["Limited at high RPS"]),
        ],
    )
    .describe("Which tool generates load for performance tests")
    .trigger(
        "target-rps",
        "Target load above 50k requests per second",
        TriggerPredicate::threshold("target_rps", Gt, 50_000.0),
        "Move to distributed load generation",
    )
    .trigger(
        "new-protocols",
        "gRPC or WebSocket endpoints appeared",
        TriggerPredicate::Any {
            of: vec![
                TriggerPredicate::threshold("grpc_endpoints", Gt, 0.0),
                TriggerPredicate::threshold("websocket_endpoints", Gt, 0.0),
            ],
        },
        "Confirm protocol support in the chosen tool before the next load test",
    )
}

// ============================================================================
// STATE MANAGEMENT
// ============================================================================

fn state_management() -> DomainDefinition {
    DomainDefinition::new(
        "state-management",
        "Frontend State Management",
        vec![
            Criterion::new("learning-curve", "Learning curve", 0.2, Minimize),
            Criterion::new("boilerplate", "Boilerplate", 0.2, Minimize).tagged(COMPLEXITY_TAG),
            Criterion::new("devtools", "Devtools and debugging", 0.15, Maximize),
            Criterion::new("scalability", "Scales with app size", 0.25, Maximize),
            Criterion::new("ecosystem", "Ecosystem", 0.2, Maximize),
        ],
        vec![
            DecisionOption::new(
                "context-hooks",
                "Context + hooks",
                &[
                    ("learning-curve", 1),
                    ("boilerplate", 1),
                    ("devtools", 2),
                    ("scalability", 2),
                    ("ecosystem", 4),
                ],
            )
            .with_fit(avoid_unless(
                "app_size",
                Condition::NoneOf(texts(&["large"])),
                "Avoid for large apps with frequently changing global state",
            ))
            .with_narrative(&["No dependency"], &["Re-render storms", "No devtools"]),
            DecisionOption::new(
                "redux-toolkit",
                "Redux Toolkit",
                &[
                    ("learning-curve", 3),
                    ("boilerplate", 3),
                    ("devtools", 5),
                    ("scalability", 5),
                    ("ecosystem", 5),
                ],
            )
            .with_fit(avoid_unless(
                "team_size",
                Condition::AtLeast(4.0),
                "Avoid for small teams where ceremony outweighs structure",
            ))
            .with_narrative(
                &["Time-travel debugging", "Predictable updates"],
                &["More concepts to learn"],
            ),
            DecisionOption::new(
                "zustand",
                "Zustand",
                &[
                    ("learning-curve", 1),
                    ("boilerplate", 1),
                    ("devtools", 3),
                    ("scalability", 4),
                    ("ecosystem", 3),
                ],
            )
            .with_narrative(&["Tiny API", "No providers"], &["Fewer conventions for big teams"]),
            DecisionOption::new(
                "server-state-query",
                "Server-state library (TanStack Query)",
                &[
                    ("learning-curve", 2),
                    ("boilerplate", 2),
                    ("devtools", 4),
                    ("scalability", 4),
                    ("ecosystem", 4),
                ],
            )
            .with_fit(avoid_unless(
                "state_mostly_server_data",
                Condition::IsTrue,
                "Avoid when most state is client-only UI state",
            ))
            .with_narrative(
                &["Caching, refetching and dedupe for free"],
                &["Not a client state solution"],
            ),
        ],
    )
    .describe("Where client application state lives")
    .trigger(
        "prop-drilling",
        "Props drilled through more than four levels",
        TriggerPredicate::threshold("prop_drilling_depth", Gt, 4.0),
        "Introduce a global store",
    )
    .trigger(
        "state-slices",
        "More than 20 global state slices",
        TriggerPredicate::threshold("global_state_slices", Gt, 20.0),
        "Adopt Redux Toolkit for structure and devtools",
    )
}

// ============================================================================
// ERROR HANDLING
// ============================================================================

fn error_response_format() -> DomainDefinition {
    DomainDefinition::new(
        "error-response-format",
        "Error Response Format",
        vec![
            Criterion::new("standardization", "Standardization", 0.3, Maximize),
            Criterion::new("client-ergonomics", "Client ergonomics", 0.3, Maximize),
            Criterion::new("complexity", "Implementation complexity", 0.2, Minimize)
                .tagged(COMPLEXITY_TAG),
            Criterion::new("extensibility", "Extensibility", 0.2, Maximize),
        ],
        vec![
            DecisionOption::new(
                "problem-details",
                "RFC 9457 Problem Details",
                &[
                    ("standardization", 5),
                    ("client-ergonomics", 4),
                    ("complexity", 2),
                    ("extensibility", 5),
                ],
            )
            .with_fit(avoid_unless(
                "api_style",
                Condition::OneOf(texts(&["rest", "http"])),
                "Avoid outside HTTP/REST APIs",
            ))
            .with_narrative(
                &["IETF standard", "Extension members for domain data"],
                &["Clients must know the media type"],
            ),
            DecisionOption::new(
                "custom-envelope",
                "Custom error envelope",
                &[
                    ("standardization", 2),
                    ("client-ergonomics", 4),
                    ("complexity", 1),
                    ("extensibility", 3),
                ],
            )
            .with_narrative(&["Shaped exactly for your clients"], &["Every consumer learns it anew"]),
            DecisionOption::new(
                "graphql-errors",
                "GraphQL errors with extensions",
                &[
                    ("standardization", 4),
                    ("client-ergonomics", 3),
                    ("complexity", 3),
                    ("extensibility", 4),
                ],
            )
            .with_fit(avoid_unless(
                "api_style",
                Condition::Equals("graphql".into()),
                "Only applies to GraphQL APIs",
            ))
            .with_narrative(&["Partial success"], &["HTTP 200 on errors confuses tooling"]),
            DecisionOption::new(
                "status-codes-only",
                "Bare status codes",
                &[
                    ("standardization", 1),
                    ("client-ergonomics", 1),
                    ("complexity", 0),
                    ("extensibility", 1),
                ],
            )
            .with_fit(avoid_unless(
                "public_api",
                Condition::IsFalse,
                "Avoid for any API with external consumers",
            ))
            .with_narrative(&["Nothing to build"], &["Clients cannot tell errors apart"]),
        ],
    )
    .describe("What error payloads look like on the wire")
    .trigger(
        "public-consumers",
        "More than ten external API consumers",
        TriggerPredicate::threshold("public_api_consumers", Gt, 10.0),
        "Standardize on problem details so consumers can share tooling",
    )
    .trigger(
        "error-tickets",
        "Support tickets about unclear errors above 25 a month",
        TriggerPredicate::threshold("error_support_tickets_per_month", Gt, 25.0),
        "Add machine-readable error codes and documentation links to responses",
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::domain::load_domain;
    use crate::engine::DecisionEngine;

    fn engine() -> DecisionEngine {
        DecisionEngine::with_builtin_catalog(EngineConfig::default()).unwrap()
    }

    #[test]
    fn test_every_builtin_domain_loads() {
        for def in builtin_domains() {
            let id = def.id.clone();
            assert!(
                load_domain(def, &EngineConfig::default()).is_ok(),
                "{} should validate",
                id
            );
        }
    }

    #[test]
    fn test_builtin_ids_unique() {
        let engine = engine();
        assert_eq!(engine.domain_ids().len(), builtin_domains().len());
    }

    #[test]
    fn test_every_domain_has_triggers_and_complexity_tag() {
        for def in builtin_domains() {
            assert!(!def.triggers.is_empty(), "{} needs triggers", def.id);
            assert!(
                def.criteria.iter().any(|c| c.has_tag(COMPLEXITY_TAG)),
                "{} needs a complexity criterion",
                def.id
            );
        }
    }

    #[test]
    fn test_ci_platform_follows_vcs_host() {
        let engine = engine();
        let github = engine
            .recommend("ci-platform", &Context::new().with("vcs_host", "github"))
            .unwrap();
        assert_eq!(github.primary.option_id, "github-actions");

        let gitlab = engine
            .recommend("ci-platform", &Context::new().with("vcs_host", "gitlab"))
            .unwrap();
        assert_eq!(gitlab.primary.option_id, "gitlab-ci");
        assert_eq!(gitlab.excluded[0].option_id, "github-actions");
    }

    #[test]
    fn test_deployment_tie_goes_to_simpler_option() {
        // blue-green and canary both score 0.66
        let rec = engine()
            .recommend("deployment-strategy", &Context::new())
            .unwrap();
        assert_eq!(rec.primary.option_id, "blue-green");
        assert_eq!(rec.runner_ups[0].option_id, "canary");
        assert!(rec.is_close_call(0.01));
    }

    #[test]
    fn test_low_traffic_excludes_canary() {
        let rec = engine()
            .recommend(
                "deployment-strategy",
                &Context::new()
                    .with("traffic", "low")
                    .with("has_observability", true),
            )
            .unwrap();
        assert_eq!(rec.primary.option_id, "blue-green");
        assert_eq!(rec.runner_ups[0].option_id, "rolling");
        assert!(rec.excluded.iter().any(|e| e.option_id == "canary"));
    }

    #[test]
    fn test_load_testing_follows_team_expertise() {
        let rec = engine()
            .recommend(
                "load-testing-tool",
                &Context::new()
                    .with("team_expertise", "python")
                    .with("target_rps", 20_000i64),
            )
            .unwrap();
        assert_eq!(rec.primary.option_id, "locust");
        let excluded: Vec<&str> = rec.excluded.iter().map(|e| e.option_id.as_str()).collect();
        assert_eq!(excluded, vec!["k6", "gatling", "artillery"]);
    }

    #[test]
    fn test_caching_trigger_needs_both_signals() {
        let engine = engine();
        let one = TelemetrySnapshot::new().with_metric("instance_count", 3.0);
        let fired = engine.evaluate_triggers("caching-backend", &one).unwrap();
        assert!(fired.is_empty());

        let both = one.with_metric("cache_inconsistency_reports", 2.0);
        let fired = engine.evaluate_triggers("caching-backend", &both).unwrap();
        assert_eq!(fired[0].trigger_id, "divergent-instances");
    }

    #[test]
    fn test_deployment_frequency_trigger() {
        let engine = engine();
        let busy = TelemetrySnapshot::new().with_metric("deployment_frequency", 15.0);
        let quiet = TelemetrySnapshot::new().with_metric("deployment_frequency", 5.0);
        let fired = engine.evaluate_triggers("deployment-strategy", &busy).unwrap();
        assert!(fired.iter().any(|w| w.trigger_id == "deploy-frequency"));
        assert!(engine
            .evaluate_triggers("deployment-strategy", &quiet)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_builtin_domain_lookup() {
        assert!(builtin_domain("auth-strategy").is_some());
        assert!(builtin_domain("nope").is_none());
    }
}
