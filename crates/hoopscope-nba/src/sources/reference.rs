// Reference-site per-game table, consumed as a CSV export.
//
// The location is either an http(s) URL or a local file path. A
// `{season_end}` placeholder is replaced with the season's ending year, the
// way the reference site keys its league pages (`NBA_2024_per_game`).
//
// A player traded mid-season appears once per team plus one combined row
// (`TOT`, or `2TM`/`3TM` in newer exports). Only the combined row is kept.

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::debug;

use hoopscope_core::{Scope, Season, SourceKind};

use super::{get_text, RawRecord, SourceAdapter, SourceError};

pub struct ReferenceAdapter {
    http: reqwest::Client,
    location: Option<String>,
}

impl ReferenceAdapter {
    pub fn new(http: reqwest::Client, location: Option<String>) -> Self {
        Self { http, location }
    }

    fn resolve(&self, season: &Season) -> Option<String> {
        let loc = self.location.as_deref()?.trim();
        if loc.is_empty() {
            return None;
        }
        Some(loc.replace("{season_end}", &season.end_year().to_string()))
    }
}

#[async_trait]
impl SourceAdapter for ReferenceAdapter {
    fn kind(&self) -> SourceKind {
        SourceKind::Secondary
    }

    async fn fetch(
        &self,
        scope: &Scope,
        season: &Season,
        timeout: Duration,
    ) -> Result<Vec<RawRecord>, SourceError> {
        let location = self.resolve(season).ok_or(SourceError::NotConfigured)?;
        debug!(%location, %scope, "reading per-game table");

        let text = if location.starts_with("http://") || location.starts_with("https://") {
            get_text(&self.http, &location, &[], timeout).await?
        } else {
            match tokio::time::timeout(timeout, tokio::fs::read_to_string(&location)).await {
                Ok(Ok(text)) => text,
                Ok(Err(e)) => return Err(SourceError::Transport(format!("{location}: {e}"))),
                Err(_) => return Err(SourceError::TimedOut(timeout)),
            }
        };
        parse_per_game_csv(&text)
    }
}

/// Parse a per-game table. Repeated header rows (the site re-prints the
/// header every 20 rows) and the league-average footer are skipped.
pub(crate) fn parse_per_game_csv(text: &str) -> Result<Vec<RawRecord>, SourceError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| SourceError::UnexpectedShape(format!("unreadable header: {e}")))?
        .clone();
    if !headers.iter().any(|h| h == "Player") {
        return Err(SourceError::UnexpectedShape(
            "per-game table has no `Player` column".into(),
        ));
    }

    let mut records = Vec::new();
    for (i, row) in reader.records().enumerate() {
        let row = row.map_err(|e| SourceError::UnexpectedShape(format!("row {i}: {e}")))?;
        let record: Map<String, Value> = headers
            .iter()
            .zip(row.iter())
            .map(|(h, v)| (h.to_string(), Value::String(v.to_string())))
            .collect();

        let player = record.get("Player").and_then(Value::as_str).unwrap_or_default();
        if player.is_empty() || player == "Player" || player == "League Average" {
            continue;
        }
        records.push(Value::Object(record));
    }

    if records.is_empty() {
        return Err(SourceError::Empty);
    }
    Ok(drop_split_rows(records))
}

fn team_cell(record: &Value) -> &str {
    record
        .get("Tm")
        .or_else(|| record.get("Team"))
        .and_then(Value::as_str)
        .unwrap_or_default()
}

fn is_combined_team(team: &str) -> bool {
    let team = team.to_ascii_uppercase();
    team == "TOT"
        || team
            .strip_suffix("TM")
            .is_some_and(|n| !n.is_empty() && n.chars().all(|c| c.is_ascii_digit()))
}

/// Drop per-team rows of players who also have a combined-season row.
fn drop_split_rows(records: Vec<RawRecord>) -> Vec<RawRecord> {
    let combined: HashSet<String> = records
        .iter()
        .filter(|r| is_combined_team(team_cell(r)))
        .filter_map(|r| r.get("Player").and_then(Value::as_str).map(str::to_string))
        .collect();
    if combined.is_empty() {
        return records;
    }
    let before = records.len();
    let kept: Vec<RawRecord> = records
        .into_iter()
        .filter(|r| {
            let player = r.get("Player").and_then(Value::as_str).unwrap_or_default();
            !combined.contains(player) || is_combined_team(team_cell(r))
        })
        .collect();
    debug!(traded = combined.len(), dropped = before - kept.len(), "collapsed traded-player rows");
    kept
}
