//! codex-matrix CLI
//!
//! Surfaces the decision-matrix engine for the Codex option tables.
//!
//! Run with: cargo run -- recommend ci-platform --fact vcs_host=github

use anyhow::{anyhow, Context as _, Result};
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use codex_matrix::{
    ledger, loader, Context, DecisionEngine, EngineConfig, FactValue, Recommendation,
    TelemetrySnapshot, TriggeredWarning,
};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "codex-matrix", version, about = "Decision-matrix recommendations for the Engineering Codex")]
struct Cli {
    /// Extra domain definitions (file or directory, JSON or YAML)
    #[arg(long, global = true)]
    defs: Option<PathBuf>,

    /// Engine configuration file (JSON or YAML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Ledger database (defaults to the user data directory)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Skip the built-in Codex domains
    #[arg(long, global = true)]
    no_builtin: bool,

    /// More logging (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List registered decision domains
    Domains,
    /// Show the ranked score table for a domain
    Score {
        domain: String,
        #[arg(long)]
        json: bool,
    },
    /// Recommend an option given facts about your situation
    Recommend {
        domain: String,
        /// Context fact, e.g. --fact team_expertise=javascript
        #[arg(long = "fact", value_parser = parse_fact)]
        facts: Vec<(String, FactValue)>,
        #[arg(long)]
        json: bool,
        /// Store the recommendation in the ledger
        #[arg(long)]
        record: bool,
    },
    /// Evaluate evolution triggers against telemetry
    Triggers {
        domain: String,
        #[command(flatten)]
        telemetry: TelemetryArgs,
        #[arg(long)]
        json: bool,
    },
    /// Check whether the last recorded recommendation is stale
    Check {
        domain: String,
        #[command(flatten)]
        telemetry: TelemetryArgs,
    },
    /// Show recorded recommendations for a domain
    History {
        domain: String,
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Validate a definition file or directory
    Validate { path: PathBuf },
}

#[derive(Debug, Args)]
struct TelemetryArgs {
    /// Metric value, e.g. --metric deployment_frequency=15
    #[arg(long = "metric", value_parser = parse_metric)]
    metrics: Vec<(String, f64)>,
}

impl TelemetryArgs {
    fn snapshot(&self) -> TelemetrySnapshot {
        self.metrics
            .iter()
            .fold(TelemetrySnapshot::new(), |snapshot, (name, value)| {
                snapshot.with_metric(name, *value)
            })
            .captured_at(Utc::now())
    }
}

fn split_pair(raw: &str) -> Result<(&str, &str), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.trim(), v.trim()))
        .filter(|(k, _)| !k.is_empty())
        .ok_or_else(|| format!("expected name=value, got `{}`", raw))
}

fn parse_fact(raw: &str) -> Result<(String, FactValue), String> {
    let (name, value) = split_pair(raw)?;
    Ok((name.to_string(), FactValue::parse(value)))
}

fn parse_metric(raw: &str) -> Result<(String, f64), String> {
    let (name, value) = split_pair(raw)?;
    match value.parse::<f64>() {
        Ok(n) if n.is_finite() => Ok((name.to_string(), n)),
        _ => Err(format!("metric `{}` needs a finite number, got `{}`", name, value)),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match &cli.config {
        Some(path) => loader::load_config(path)?,
        None => EngineConfig::default(),
    };

    if let Command::Validate { path } = &cli.command {
        return run_validate(path, config);
    }

    let engine = build_engine(&cli, config)?;

    match &cli.command {
        Command::Domains => run_domains(&engine),
        Command::Score { domain, json } => run_score(&engine, domain, *json),
        Command::Recommend {
            domain,
            facts,
            json,
            record,
        } => {
            let mut context = Context::new();
            for (name, value) in facts {
                context.insert(name, value.clone());
            }
            run_recommend(&engine, domain, &context, *json, record.then(|| db_path(&cli)))
        }
        Command::Triggers {
            domain,
            telemetry,
            json,
        } => run_triggers(&engine, domain, &telemetry.snapshot(), *json),
        Command::Check { domain, telemetry } => {
            run_check(&engine, domain, &telemetry.snapshot(), &db_path(&cli)?)
        }
        Command::History { domain, limit } => run_history(domain, *limit, &db_path(&cli)?),
        Command::Validate { .. } => Ok(()),
    }
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn build_engine(cli: &Cli, config: EngineConfig) -> Result<DecisionEngine> {
    let mut engine = if cli.no_builtin {
        DecisionEngine::with_config(config)?
    } else {
        DecisionEngine::with_builtin_catalog(config)?
    };
    if let Some(path) = &cli.defs {
        let definitions = loader::load_definitions(path)?;
        engine
            .load_domains(definitions)
            .with_context(|| format!("Failed to load definitions from {:?}", path))?;
    }
    Ok(engine)
}

fn db_path(cli: &Cli) -> Result<PathBuf> {
    if let Some(path) = &cli.db {
        return Ok(path.clone());
    }
    // XDG data dir on Linux, ~/Library/Application Support on macOS
    let dir = dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("codex-matrix");
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create data directory {:?}", dir))?;
    Ok(dir.join("ledger.db"))
}

fn run_validate(path: &Path, config: EngineConfig) -> Result<()> {
    let definitions = loader::load_definitions(path)?;
    let mut engine = DecisionEngine::with_config(config)?;
    let mut failures = 0;
    for def in definitions {
        let id = def.id.clone();
        match engine.load_domain(def) {
            Ok(domain) => println!(
                "  ✓ {} ({} criteria, {} options, {} triggers)",
                id,
                domain.criteria().len(),
                domain.options().len(),
                domain.triggers().len()
            ),
            Err(e) => {
                failures += 1;
                println!("  ✗ {}: {}", id, e);
            }
        }
    }
    if failures > 0 {
        return Err(anyhow!("{} invalid domain definition(s)", failures));
    }
    Ok(())
}

fn run_domains(engine: &DecisionEngine) -> Result<()> {
    println!("\n{:<24} {:<32} {:>8} {:>8}", "ID", "NAME", "OPTIONS", "TRIGGERS");
    println!("{}", "─".repeat(75));
    for domain in engine.domains() {
        println!(
            "{:<24} {:<32} {:>8} {:>8}",
            domain.id(),
            truncate(domain.name(), 32),
            domain.options().len(),
            domain.triggers().len()
        );
    }
    println!();
    Ok(())
}

fn run_score(engine: &DecisionEngine, domain_id: &str, json: bool) -> Result<()> {
    let cards = engine.score(domain_id)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&cards)?);
        return Ok(());
    }

    let domain = engine.domain(domain_id)?;
    println!("\n{} ({})", domain.name(), domain.id());
    println!("{}", "═".repeat(60));
    for card in &cards {
        println!("{:>2}. {:<36} {:.3}", card.rank, truncate(&card.option_name, 36), card.score);
        for c in &card.breakdown {
            println!(
                "      {:<28} {} × {:.2} = {:.3}",
                truncate(&c.criterion_name, 28),
                c.rating,
                c.weight,
                c.contribution
            );
        }
    }
    println!();
    Ok(())
}

fn run_recommend(
    engine: &DecisionEngine,
    domain_id: &str,
    context: &Context,
    json: bool,
    record_to: Option<Result<PathBuf>>,
) -> Result<()> {
    let recommendation = engine.recommend(domain_id, context)?;

    if let Some(path) = record_to {
        let conn = ledger::init_ledger(&path?)?;
        ledger::record_recommendation(&conn, &recommendation, context, Utc::now())?;
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&recommendation)?);
    } else {
        print_recommendation(&recommendation, engine.config().tie_epsilon);
    }
    Ok(())
}

fn print_recommendation(rec: &Recommendation, tie_epsilon: f64) {
    println!("\n┌────────────────────────────────────────────────────────────┐");
    println!("│ RECOMMENDATION: {:<43}│", truncate(&rec.domain_id, 43));
    println!("└────────────────────────────────────────────────────────────┘\n");

    if rec.low_confidence {
        println!("⚠ LOW CONFIDENCE: your context ruled out every option.");
        println!("  The ranking below ignores fit conditions; add or revise facts.\n");
    }

    println!("★ {} ({:.3})", rec.primary.name, rec.primary.score);
    for s in &rec.primary.strengths {
        println!("    + {}", s);
    }
    for w in &rec.primary.weaknesses {
        println!("    - {}", w);
    }
    if rec.is_close_call(tie_epsilon) {
        println!("    (close call: decided by tie-break)");
    }

    if !rec.runner_ups.is_empty() {
        println!("\nRunner-ups:");
        for r in &rec.runner_ups {
            println!("  {}. {} ({:.3})", r.rank, r.name, r.score);
        }
    }

    if !rec.excluded.is_empty() {
        if rec.low_confidence {
            println!("\nRuled out by your context (ranked anyway):");
        } else {
            println!("\nExcluded by your context:");
        }
        for e in &rec.excluded {
            println!("  ✗ {}", e.name);
            for v in &e.violated {
                let observed = v.observed.as_ref().map(|o| o.to_string()).unwrap_or_default();
                match &v.note {
                    Some(note) => println!("      {} ({} = {})", note, v.fact, observed),
                    None => println!("      {} {} (got {})", v.fact, v.condition, observed),
                }
            }
        }
    }

    if !rec.unknown_facts.is_empty() {
        println!("\nFacts that would sharpen this: {}", rec.unknown_facts.join(", "));
    }
    println!();
}

fn print_warnings(warnings: &[TriggeredWarning]) {
    if warnings.is_empty() {
        println!("No evolution triggers fired.");
        return;
    }
    for w in warnings {
        println!("⚡ {} [{}]", w.description, w.condition);
        println!("   → {}", w.suggested_action);
    }
}

fn run_triggers(
    engine: &DecisionEngine,
    domain_id: &str,
    telemetry: &TelemetrySnapshot,
    json: bool,
) -> Result<()> {
    let warnings = engine.evaluate_triggers(domain_id, telemetry)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&warnings)?);
    } else {
        print_warnings(&warnings);
    }
    Ok(())
}

fn run_check(
    engine: &DecisionEngine,
    domain_id: &str,
    telemetry: &TelemetrySnapshot,
    db: &Path,
) -> Result<()> {
    // Fail on unknown domains before touching the ledger
    engine.domain(domain_id)?;
    let conn = ledger::init_ledger(db)?;
    let Some(entry) = ledger::latest_recommendation(&conn, domain_id)? else {
        println!("No recorded recommendation for {}. Run `recommend {} --record` first.", domain_id, domain_id);
        return Ok(());
    };

    let report = engine.check_staleness(domain_id, &entry.fingerprint, telemetry)?;
    println!(
        "Last recommendation: {} (recorded {})",
        entry.primary_option,
        entry.recorded_at.format("%Y-%m-%d %H:%M UTC")
    );
    if report.definition_changed {
        println!(
            "⚠ The {} matrix or scoring config changed since then; re-run `recommend`.",
            domain_id
        );
    }
    print_warnings(&report.warnings);
    if !report.is_stale() {
        println!("✓ Still current.");
    }
    Ok(())
}

fn run_history(domain_id: &str, limit: usize, db: &Path) -> Result<()> {
    let conn = ledger::init_ledger(db)?;
    let entries = ledger::history(&conn, domain_id, limit)?;
    if entries.is_empty() {
        println!("No recorded recommendations for {}.", domain_id);
        return Ok(());
    }
    for e in entries {
        let facts: Vec<String> = e.context.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
        println!(
            "#{:<4} {}  {:<24} {}{}",
            e.id,
            e.recorded_at.format("%Y-%m-%d %H:%M"),
            e.primary_option,
            if e.low_confidence { "(low confidence) " } else { "" },
            facts.join(" ")
        );
    }
    Ok(())
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}
