// Broadcaster athletes API.
//
// Each athlete carries nested statistics categories; they are flattened into
// one raw record of `stat name -> value` next to the athlete's identity.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::debug;

use hoopscope_core::{Scope, Season, SourceKind};

use super::{get_text, RawRecord, SourceAdapter, SourceError};

pub const DEFAULT_URL: &str =
    "https://site.api.espn.com/apis/site/v2/sports/basketball/nba/athletes";

pub struct EspnAdapter {
    http: reqwest::Client,
    url: String,
}

impl EspnAdapter {
    pub fn new(http: reqwest::Client, url: String) -> Self {
        Self { http, url }
    }
}

#[async_trait]
impl SourceAdapter for EspnAdapter {
    fn kind(&self) -> SourceKind {
        SourceKind::Tertiary
    }

    async fn fetch(
        &self,
        scope: &Scope,
        season: &Season,
        timeout: Duration,
    ) -> Result<Vec<RawRecord>, SourceError> {
        // Seasons are keyed by the year they end in.
        let query = [
            ("season", season.end_year().to_string()),
            ("limit", "1000".to_string()),
        ];
        debug!(url = %self.url, %scope, %season, "requesting athletes");
        let body = get_text(&self.http, &self.url, &query, timeout).await?;
        let payload: Value = serde_json::from_str(&body)
            .map_err(|e| SourceError::UnexpectedShape(format!("invalid JSON: {e}")))?;
        parse_athletes(&payload)
    }
}

/// Flatten `athletes[].statistics.splits.categories[].stats[]`.
/// Athletes without a statistics block are skipped.
pub(crate) fn parse_athletes(payload: &Value) -> Result<Vec<RawRecord>, SourceError> {
    let athletes = payload
        .get("athletes")
        .and_then(Value::as_array)
        .ok_or_else(|| SourceError::UnexpectedShape("no `athletes` array".into()))?;

    let records: Vec<RawRecord> = athletes.iter().filter_map(flatten_athlete).collect();
    if records.is_empty() {
        return Err(SourceError::Empty);
    }
    Ok(records)
}

fn flatten_athlete(athlete: &Value) -> Option<RawRecord> {
    let categories = athlete
        .pointer("/statistics/splits/categories")
        .and_then(Value::as_array)?;

    let mut out = Map::new();
    if let Some(name) = athlete.get("displayName") {
        out.insert("displayName".into(), name.clone());
    }
    let team = athlete
        .pointer("/team/abbreviation")
        .or_else(|| athlete.get("team").filter(|t| t.is_string()));
    if let Some(team) = team {
        out.insert("team".into(), team.clone());
    }
    if let Some(age) = athlete.get("age") {
        out.insert("age".into(), age.clone());
    }

    for category in categories {
        let Some(stats) = category.get("stats").and_then(Value::as_array) else {
            continue;
        };
        // The games category reports a single unnamed value.
        if category.get("name").and_then(Value::as_str) == Some("games") {
            if let Some(value) = stats.first().and_then(|s| s.get("value")) {
                out.entry("games").or_insert_with(|| value.clone());
            }
        }
        for stat in stats {
            if let (Some(name), Some(value)) =
                (stat.get("name").and_then(Value::as_str), stat.get("value"))
            {
                out.insert(name.to_string(), value.clone());
            }
        }
    }
    Some(Value::Object(out))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn athlete(name: &str, team: Value, categories: Value) -> Value {
        json!({
            "displayName": name,
            "team": team,
            "age": 25,
            "statistics": { "splits": { "categories": categories } }
        })
    }

    #[test]
    fn categories_are_flattened() {
        let payload = json!({
            "athletes": [athlete(
                "Luka Doncic",
                json!({ "abbreviation": "DAL" }),
                json!([
                    { "name": "games", "stats": [{ "value": 70 }] },
                    { "name": "scoring", "stats": [
                        { "name": "pointsPerGame", "value": 33.9 },
                        { "name": "fieldGoalPercentage", "value": 48.7 }
                    ]},
                    { "name": "assists", "stats": [{ "name": "assistsPerGame", "value": 9.8 }] }
                ])
            )]
        });
        let raws = parse_athletes(&payload).unwrap();
        assert_eq!(raws.len(), 1);
        let r = &raws[0];
        assert_eq!(r["displayName"], "Luka Doncic");
        assert_eq!(r["team"], "DAL");
        assert_eq!(r["games"], 70);
        assert_eq!(r["pointsPerGame"], 33.9);
        assert_eq!(r["assistsPerGame"], 9.8);
    }

    #[test]
    fn athletes_without_statistics_are_skipped() {
        let payload = json!({
            "athletes": [
                { "displayName": "No Stats" },
                athlete("Has Stats", json!("BOS"), json!([]))
            ]
        });
        let raws = parse_athletes(&payload).unwrap();
        assert_eq!(raws.len(), 1);
        assert_eq!(raws[0]["team"], "BOS");
    }

    #[test]
    fn no_usable_athletes_is_empty() {
        let payload = json!({ "athletes": [{ "displayName": "X" }] });
        assert_eq!(parse_athletes(&payload), Err(SourceError::Empty));
    }

    #[test]
    fn missing_athletes_is_unexpected_shape() {
        assert!(matches!(
            parse_athletes(&json!({ "items": [] })),
            Err(SourceError::UnexpectedShape(_))
        ));
    }
}
