// Command handlers. Each returns the rendered output; `main` prints it.

use std::fmt::Write as _;
use std::sync::Arc;

use anyhow::Context;
use serde_json::json;
use tracing::info;

use hoopscope_core::config::Config;
use hoopscope_core::{CanonicalRecord, DatasetSnapshot, Scope, Season};
use hoopscope_nba::insight::{HotTakes, Narrative};
use hoopscope_nba::leaders::Stat;
use hoopscope_nba::{Analysis, Analyzer, Aggregator, AttemptOutcome, CollectReport, InsightContext};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Output {
    Text,
    Json,
}

pub struct App {
    config: Config,
    aggregator: Aggregator,
    analyzer: Analyzer,
}

impl App {
    pub fn new(config: Config, aggregator: Aggregator, analyzer: Analyzer) -> Self {
        Self {
            config,
            aggregator,
            analyzer,
        }
    }

    /// The current snapshot, collecting the league for the configured season
    /// when nothing has been collected yet.
    async fn dataset(&self) -> anyhow::Result<Arc<DatasetSnapshot>> {
        if let Some(snapshot) = self.aggregator.current() {
            return Ok(snapshot);
        }
        info!("no snapshot available, collecting league data first");
        let report = self
            .aggregator
            .collect(&Scope::League, &self.config.sources.season)
            .await
            .context("initial collection failed")?;
        Ok(report.snapshot)
    }

    // -----------------------------------------------------------------------
    // collect
    // -----------------------------------------------------------------------

    pub async fn collect(&self, scope: &Scope, season: Option<Season>, out: Output) -> anyhow::Result<String> {
        let season = season.unwrap_or_else(|| self.config.sources.season.clone());
        let report = self.aggregator.collect(scope, &season).await?;
        Ok(match out {
            Output::Json => to_json(&collect_json(&report, &self.aggregator))?,
            Output::Text => collect_text(&report, &self.aggregator),
        })
    }

    // -----------------------------------------------------------------------
    // players
    // -----------------------------------------------------------------------

    pub async fn players(
        &self,
        team: Option<&str>,
        sort: Stat,
        limit: usize,
        out: Output,
    ) -> anyhow::Result<String> {
        let snapshot = self.dataset().await?;
        let scope = team.map_or(Scope::League, |t| Scope::Team(t.trim().to_uppercase()));
        let weights = self.analyzer.weights();
        let board = hoopscope_nba::leaders::leaders(snapshot.in_scope(&scope), sort, limit, weights);

        // Leader entries carry name/team only; look the full records back up.
        let rows: Vec<(&CanonicalRecord, f64)> = board
            .iter()
            .filter_map(|e| {
                snapshot
                    .in_scope(&scope)
                    .find(|r| r.name == e.name && r.team == e.team)
                    .map(|r| (r, e.value))
            })
            .collect();

        Ok(match out {
            Output::Json => to_json(&json!({
                "source": snapshot.source,
                "season": snapshot.season,
                "scope": scope.to_string(),
                "sort": sort.key(),
                "players": rows.iter().map(|(r, v)| json!({ "record": r, "value": v })).collect::<Vec<_>>(),
            }))?,
            Output::Text => players_text(&rows, sort),
        })
    }

    // -----------------------------------------------------------------------
    // lookup
    // -----------------------------------------------------------------------

    pub async fn lookup(&self, name: &str, brief: bool, out: Output) -> anyhow::Result<String> {
        let snapshot = self.dataset().await?;
        let (context, narrative) = if brief {
            (self.analyzer.lookup(&snapshot, name)?, None)
        } else {
            let report = self.analyzer.player_report(&snapshot, name).await?;
            (report.context, Some(report.narrative))
        };
        Ok(match out {
            Output::Json => to_json(&json!({ "player": context, "narrative": narrative }))?,
            Output::Text => lookup_text(&context, narrative.as_ref()),
        })
    }

    // -----------------------------------------------------------------------
    // analyze
    // -----------------------------------------------------------------------

    pub async fn analyze(&self, scope: &Scope, out: Output) -> anyhow::Result<String> {
        let snapshot = self.dataset().await?;
        let analysis = self.analyzer.analyze(&snapshot, scope).await?;
        Ok(match out {
            Output::Json => to_json(&analysis)?,
            Output::Text => analysis_text(&analysis),
        })
    }

    // -----------------------------------------------------------------------
    // hot-takes
    // -----------------------------------------------------------------------

    pub async fn hot_takes(&self, count: usize, out: Output) -> anyhow::Result<String> {
        anyhow::ensure!(count > 0, "count must be at least 1");
        let snapshot = self.dataset().await?;
        let takes = self.analyzer.hot_takes(&snapshot, count).await?;
        Ok(match out {
            Output::Json => to_json(&takes)?,
            Output::Text => hot_takes_text(&takes, &snapshot),
        })
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

fn to_json<T: serde::Serialize>(value: &T) -> anyhow::Result<String> {
    serde_json::to_string_pretty(value).context("failed to serialize output")
}

fn pct(p: Option<f64>) -> String {
    p.map_or_else(|| "-".to_string(), |v| format!("{:.1}%", v * 100.0))
}

fn outcome_text(outcome: &AttemptOutcome) -> String {
    match outcome {
        AttemptOutcome::Accepted { records } => format!("accepted ({records} records)"),
        AttemptOutcome::Unavailable(e) => format!("unavailable ({e})"),
        AttemptOutcome::Rejected(e) => format!("rejected ({e})"),
        AttemptOutcome::OutOfScope { fetched } => {
            format!("no records in scope ({fetched} fetched)")
        }
    }
}

fn collect_json(report: &CollectReport, aggregator: &Aggregator) -> serde_json::Value {
    let snap = &report.snapshot;
    json!({
        "source": snap.source,
        "scope": snap.scope.to_string(),
        "season": snap.season,
        "collected_at": snap.collected_at,
        "records": snap.len(),
        "persisted": report.persisted,
        "path": aggregator.store().path().display().to_string(),
        "attempts": report.attempts.iter().map(|a| json!({
            "source": a.source,
            "outcome": outcome_text(&a.outcome),
        })).collect::<Vec<_>>(),
    })
}

fn collect_text(report: &CollectReport, aggregator: &Aggregator) -> String {
    let snap = &report.snapshot;
    let mut s = format!(
        "Collected {} records for {} {} from {} ({}) at {}\n",
        snap.len(),
        snap.scope,
        snap.season,
        snap.source.label(),
        snap.source,
        snap.collected_at.format("%Y-%m-%d %H:%M:%S UTC"),
    );
    for attempt in &report.attempts {
        let _ = writeln!(s, "  {:<10} {}", attempt.source.as_str(), outcome_text(&attempt.outcome));
    }
    if report.persisted {
        let _ = write!(s, "Snapshot written to {}", aggregator.store().path().display());
    } else {
        s.push_str("Snapshot NOT persisted (kept in memory only)");
    }
    s
}

fn players_text(rows: &[(&CanonicalRecord, f64)], sort: Stat) -> String {
    if rows.is_empty() {
        return "No players found.".to_string();
    }
    let mut s = format!(
        "{:<4} {:<26} {:<4} {:>5} {:>5} {:>5} {:>6} {:>6} {:>8}\n",
        "#", "PLAYER", "TEAM", "PTS", "REB", "AST", "FG%", "3P%", sort.key().to_uppercase()
    );
    for (i, (r, value)) in rows.iter().enumerate() {
        let _ = writeln!(
            s,
            "{:<4} {:<26} {:<4} {:>5.1} {:>5.1} {:>5.1} {:>6} {:>6} {:>8.2}",
            i + 1,
            r.name,
            r.team,
            r.points,
            r.rebounds,
            r.assists,
            pct(r.fg_pct),
            pct(r.fg3_pct),
            value,
        );
    }
    s.trim_end().to_string()
}

fn narrative_text(s: &mut String, narrative: &Narrative) {
    let _ = write!(s, "\n{}\n[{}]", narrative.text, narrative.source);
}

fn lookup_text(ctx: &InsightContext, narrative: Option<&Narrative>) -> String {
    let r = &ctx.record;
    let mut s = format!("{} ({}, {})\n", r.name, if r.team.is_empty() { "-" } else { r.team.as_str() }, r.season);
    let _ = writeln!(
        s,
        "  {:.0} games, {:.1} min | {:.1} pts, {:.1} reb, {:.1} ast, {:.1} stl, {:.1} blk, {:.1} tov",
        r.games_played, r.minutes, r.points, r.rebounds, r.assists, r.steals, r.blocks, r.turnovers
    );
    let _ = writeln!(
        s,
        "  FG {} | 3P {} | FT {}",
        pct(r.fg_pct),
        pct(r.fg3_pct),
        pct(r.ft_pct)
    );
    let _ = write!(
        s,
        "  Offensive {:.2} ({}) | Defensive {:.2} ({}) | Overall {:.2} ({})",
        ctx.scores.offensive,
        ctx.ratings.offensive.label,
        ctx.scores.defensive,
        ctx.ratings.defensive.label,
        ctx.scores.overall,
        ctx.ratings.overall.label,
    );
    if let Some(n) = narrative {
        s.push('\n');
        narrative_text(&mut s, n);
    }
    s
}

fn analysis_text(analysis: &Analysis) -> String {
    match analysis {
        Analysis::Player(report) => lookup_text(&report.context, Some(&report.narrative)),
        Analysis::Team { context, narrative } => {
            let a = &context.averages;
            let mut s = format!(
                "{} ({} players): {:.1} pts, {:.1} reb, {:.1} ast | FG {} | 3P {}\n",
                context.team,
                a.players,
                a.points,
                a.rebounds,
                a.assists,
                pct(a.fg_pct),
                pct(a.fg3_pct)
            );
            narrative_text(&mut s, narrative);
            s
        }
        Analysis::League { context, narrative } => {
            let a = &context.averages;
            let mut s = format!(
                "League ({} players): {:.1} pts, {:.1} reb, {:.1} ast | FG {} | 3P {} | FT {}\n",
                a.players,
                a.points,
                a.rebounds,
                a.assists,
                pct(a.fg_pct),
                pct(a.fg3_pct),
                pct(a.ft_pct)
            );
            narrative_text(&mut s, narrative);
            s
        }
    }
}

fn hot_takes_text(takes: &HotTakes, snapshot: &DatasetSnapshot) -> String {
    let mut s = format!(
        "Hot takes from {} players ({}, {})\n",
        takes.players_analyzed,
        snapshot.source.label(),
        takes.source,
    );
    for (i, take) in takes.takes.iter().enumerate() {
        let _ = write!(s, "\n{}. {}\n   {}\n", i + 1, take.claim, take.rationale);
    }
    s.trim_end().to_string()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
