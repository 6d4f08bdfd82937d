// Official league stats API (`leaguedashplayerstats`).
//
// The endpoint answers with tabular result sets: one `headers` array and a
// `rowSet` of positional rows. Each row is zipped with the headers into a
// raw record keyed by the API's own column names.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::debug;

use hoopscope_core::{Scope, Season, SourceKind};

use super::{get_text, RawRecord, SourceAdapter, SourceError};

pub const DEFAULT_URL: &str = "https://stats.nba.com/stats/leaguedashplayerstats";

pub struct NbaStatsAdapter {
    http: reqwest::Client,
    url: String,
}

impl NbaStatsAdapter {
    pub fn new(http: reqwest::Client, url: String) -> Self {
        Self { http, url }
    }

    fn query(season: &Season) -> Vec<(&'static str, String)> {
        let mut q: Vec<(&'static str, String)> = vec![
            ("PerMode", "PerGame".into()),
            ("Season", season.to_string()),
            ("SeasonType", "Regular Season".into()),
            ("LeagueID", "00".into()),
            ("MeasureType", "Base".into()),
            ("PlusMinus", "N".into()),
            ("PaceAdjust", "N".into()),
            ("Rank", "N".into()),
            ("Month", "0".into()),
            ("OpponentTeamID", "0".into()),
            ("TeamID", "0".into()),
            ("Period", "0".into()),
            ("LastNGames", "0".into()),
        ];
        for blank in [
            "Outcome",
            "Location",
            "SeasonSegment",
            "DateFrom",
            "DateTo",
            "VsConference",
            "VsDivision",
            "Conference",
            "Division",
            "GameSegment",
            "ShotClockRange",
        ] {
            q.push((blank, String::new()));
        }
        q
    }
}

#[async_trait]
impl SourceAdapter for NbaStatsAdapter {
    fn kind(&self) -> SourceKind {
        SourceKind::Primary
    }

    async fn fetch(
        &self,
        scope: &Scope,
        season: &Season,
        timeout: Duration,
    ) -> Result<Vec<RawRecord>, SourceError> {
        // The API filters teams by numeric id only; scope is applied downstream.
        debug!(url = %self.url, %scope, %season, "requesting league player stats");
        let body = get_text(&self.http, &self.url, &Self::query(season), timeout).await?;
        let payload: Value = serde_json::from_str(&body)
            .map_err(|e| SourceError::UnexpectedShape(format!("invalid JSON: {e}")))?;
        parse_result_sets(&payload)
    }
}

/// Zip the first result set's `headers` with each row of its `rowSet`.
///
/// Accepts both `resultSets: [...]` (list endpoints) and the singular
/// `resultSet: {...}` some endpoints use.
pub(crate) fn parse_result_sets(payload: &Value) -> Result<Vec<RawRecord>, SourceError> {
    let set = payload
        .get("resultSets")
        .and_then(Value::as_array)
        .and_then(|sets| sets.first())
        .or_else(|| payload.get("resultSet"))
        .ok_or_else(|| SourceError::UnexpectedShape("no result set".into()))?;

    let headers: Vec<&str> = set
        .get("headers")
        .and_then(Value::as_array)
        .ok_or_else(|| SourceError::UnexpectedShape("result set has no headers".into()))?
        .iter()
        .map(|h| h.as_str().unwrap_or_default())
        .collect();

    let rows = set
        .get("rowSet")
        .and_then(Value::as_array)
        .ok_or_else(|| SourceError::UnexpectedShape("result set has no rowSet".into()))?;

    if rows.is_empty() {
        return Err(SourceError::Empty);
    }

    rows.iter()
        .enumerate()
        .map(|(i, row)| {
            let cells = row
                .as_array()
                .ok_or_else(|| SourceError::UnexpectedShape(format!("row {i} is not an array")))?;
            if cells.len() != headers.len() {
                return Err(SourceError::UnexpectedShape(format!(
                    "row {i} has {} cells for {} headers",
                    cells.len(),
                    headers.len()
                )));
            }
            let record: Map<String, Value> = headers
                .iter()
                .zip(cells)
                .map(|(h, v)| (h.to_string(), v.clone()))
                .collect();
            Ok(Value::Object(record))
        })
        .collect()
}
