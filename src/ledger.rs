//! Recommendation ledger
//!
//! SQLite history of issued recommendations. The engine itself never touches
//! it; the CLI records recommendations here so a later `check` can tell
//! whether the definition changed or a trigger fired since.

use crate::selector::Recommendation;
use crate::types::Context as FactContext;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use std::path::Path;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS recommendations (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    domain_id TEXT NOT NULL,
    fingerprint TEXT NOT NULL,
    primary_option TEXT NOT NULL,
    low_confidence INTEGER NOT NULL,
    context_json TEXT NOT NULL,
    recommendation_json TEXT NOT NULL,
    recorded_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_recommendations_domain
    ON recommendations(domain_id, id);
"#;

/// Open (or create) the ledger database
pub fn init_ledger(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path)
        .with_context(|| format!("Failed to open ledger at {:?}", path))?;
    conn.execute_batch(SCHEMA)?;
    Ok(conn)
}

/// A stored recommendation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: i64,
    pub domain_id: String,
    pub fingerprint: String,
    pub primary_option: String,
    pub low_confidence: bool,
    pub context: FactContext,
    pub recommendation: Recommendation,
    pub recorded_at: DateTime<Utc>,
}

/// Store a recommendation and the context it was made for
pub fn record_recommendation(
    conn: &Connection,
    recommendation: &Recommendation,
    context: &FactContext,
    recorded_at: DateTime<Utc>,
) -> Result<i64> {
    conn.execute(
        "INSERT INTO recommendations
         (domain_id, fingerprint, primary_option, low_confidence, context_json, recommendation_json, recorded_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            recommendation.domain_id,
            recommendation.fingerprint,
            recommendation.primary.option_id,
            recommendation.low_confidence as i32,
            serde_json::to_string(context)?,
            serde_json::to_string(recommendation)?,
            recorded_at.to_rfc3339(),
        ],
    )?;
    let id = conn.last_insert_rowid();
    tracing::info!(
        domain = %recommendation.domain_id,
        primary = %recommendation.primary.option_id,
        id,
        "Recorded recommendation"
    );
    Ok(id)
}

const SELECT: &str = "SELECT id, domain_id, fingerprint, primary_option, low_confidence,
        context_json, recommendation_json, recorded_at
 FROM recommendations";

type RawRow = (i64, String, String, String, i32, String, String, String);

fn raw_row(row: &Row<'_>) -> rusqlite::Result<RawRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
        row.get(7)?,
    ))
}

fn into_entry(raw: RawRow) -> Result<LedgerEntry> {
    let (id, domain_id, fingerprint, primary_option, low_confidence, context_json, rec_json, at) =
        raw;
    Ok(LedgerEntry {
        id,
        domain_id,
        fingerprint,
        primary_option,
        low_confidence: low_confidence != 0,
        context: serde_json::from_str(&context_json)
            .with_context(|| format!("Corrupt context in ledger row {}", id))?,
        recommendation: serde_json::from_str(&rec_json)
            .with_context(|| format!("Corrupt recommendation in ledger row {}", id))?,
        recorded_at: DateTime::parse_from_rfc3339(&at)
            .with_context(|| format!("Bad timestamp in ledger row {}", id))?
            .with_timezone(&Utc),
    })
}

/// Most recent recommendation for a domain
pub fn latest_recommendation(conn: &Connection, domain_id: &str) -> Result<Option<LedgerEntry>> {
    let raw = conn
        .query_row(
            &format!("{} WHERE domain_id = ?1 ORDER BY id DESC LIMIT 1", SELECT),
            [domain_id],
            raw_row,
        )
        .optional()?;
    raw.map(into_entry).transpose()
}

/// Recommendations for a domain, newest first
pub fn history(conn: &Connection, domain_id: &str, limit: usize) -> Result<Vec<LedgerEntry>> {
    let mut stmt = conn.prepare(&format!(
        "{} WHERE domain_id = ?1 ORDER BY id DESC LIMIT ?2",
        SELECT
    ))?;
    let rows = stmt
        .query_map(params![domain_id, limit as i64], raw_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    rows.into_iter().map(into_entry).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::engine::DecisionEngine;
    use chrono::TimeZone;
    use tempfile::tempdir;

    fn setup_ledger() -> (Connection, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let conn = init_ledger(&dir.path().join("ledger.db")).unwrap();
        (conn, dir)
    }

    fn engine() -> DecisionEngine {
        DecisionEngine::with_builtin_catalog(EngineConfig::default()).unwrap()
    }

    #[test]
    fn test_empty_ledger() {
        let (conn, _dir) = setup_ledger();
        assert!(latest_recommendation(&conn, "ci-platform").unwrap().is_none());
        assert!(history(&conn, "ci-platform", 10).unwrap().is_empty());
    }

    #[test]
    fn test_record_and_read_back() {
        let (conn, _dir) = setup_ledger();
        let engine = engine();
        let context = FactContext::new().with("vcs_host", "github");
        let rec = engine.recommend("ci-platform", &context).unwrap();
        let at = Utc.with_ymd_and_hms(2026, 5, 4, 9, 30, 0).unwrap();

        let id = record_recommendation(&conn, &rec, &context, at).unwrap();
        let entry = latest_recommendation(&conn, "ci-platform").unwrap().unwrap();
        assert_eq!(entry.id, id);
        assert_eq!(entry.primary_option, "github-actions");
        assert_eq!(entry.fingerprint, rec.fingerprint);
        assert_eq!(entry.context, context);
        assert_eq!(entry.recommendation.primary.option_id, rec.primary.option_id);
        assert!((entry.recommendation.primary.score - rec.primary.score).abs() < 1e-9);
        let ranked: Vec<&str> = entry
            .recommendation
            .ranked
            .iter()
            .map(|r| r.option_id.as_str())
            .collect();
        let expected: Vec<&str> = rec.ranked.iter().map(|r| r.option_id.as_str()).collect();
        assert_eq!(ranked, expected);
        assert_eq!(entry.recorded_at, at);
        assert!(!entry.low_confidence);
    }

    #[test]
    fn test_history_is_newest_first_and_per_domain() {
        let (conn, _dir) = setup_ledger();
        let engine = engine();
        let now = Utc::now();
        for host in ["github", "gitlab"] {
            let context = FactContext::new().with("vcs_host", host);
            let rec = engine.recommend("ci-platform", &context).unwrap();
            record_recommendation(&conn, &rec, &context, now).unwrap();
        }
        let other = engine
            .recommend("caching-backend", &FactContext::new())
            .unwrap();
        record_recommendation(&conn, &other, &FactContext::new(), now).unwrap();

        let entries = history(&conn, "ci-platform", 10).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].primary_option, "gitlab-ci");
        assert_eq!(entries[1].primary_option, "github-actions");

        assert_eq!(history(&conn, "ci-platform", 1).unwrap().len(), 1);
    }

    #[test]
    fn test_recorded_fingerprint_detects_reload() {
        let (conn, _dir) = setup_ledger();
        let mut engine = engine();
        let rec = engine
            .recommend("ci-platform", &FactContext::new())
            .unwrap();
        record_recommendation(&conn, &rec, &FactContext::new(), Utc::now()).unwrap();

        let mut changed = crate::catalog::builtin_domain("ci-platform").unwrap();
        changed.options[0].ratings.insert("cost".to_string(), 3);
        engine.load_domain(changed).unwrap();

        let entry = latest_recommendation(&conn, "ci-platform").unwrap().unwrap();
        let report = engine
            .check_staleness(
                "ci-platform",
                &entry.fingerprint,
                &crate::types::TelemetrySnapshot::new(),
            )
            .unwrap();
        assert!(report.is_stale());
        assert!(report.definition_changed);
    }
}
