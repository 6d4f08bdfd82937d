// Raw-record normalization.
//
// Each source has a fixed mapping table from its own field names to canonical
// fields, plus the scale its percentages arrive on. A canonical field that a
// raw record lacks gets the documented default (0.0 for counting stats,
// `None` for percentages and age). Only a structurally unusable record is an
// error; a nameless row inside a batch is dropped.

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::warn;

use hoopscope_core::{CanonicalRecord, Season, SourceKind};

use crate::sources::RawRecord;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizationError {
    #[error("raw {source_kind} payload is a {found}, not a record")]
    NotARecord {
        source_kind: SourceKind,
        found: &'static str,
    },

    #[error("raw {source_kind} record at index {index} has no player name")]
    MissingIdentity { source_kind: SourceKind, index: usize },
}

// ---------------------------------------------------------------------------
// Mapping tables
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Name,
    Team,
    Age,
    Games,
    Minutes,
    Points,
    Rebounds,
    DefensiveRebounds,
    Assists,
    Steals,
    Blocks,
    Turnovers,
    Fouls,
    FgPct,
    Fg3Pct,
    FtPct,
}

/// How a source reports shooting percentages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PercentScale {
    /// `0.512`. Values above 1.0 are assumed to be on the 0-100 scale anyway.
    Fraction,
    /// `51.2`.
    Percent,
}

struct Mapping {
    /// (raw field name, canonical field). Earlier entries win when a record
    /// carries several aliases of the same field.
    fields: &'static [(&'static str, Field)],
    percent_scale: PercentScale,
}

const NBA_STATS_MAPPING: Mapping = Mapping {
    fields: &[
        ("PLAYER_NAME", Field::Name),
        ("TEAM_ABBREVIATION", Field::Team),
        ("AGE", Field::Age),
        ("GP", Field::Games),
        ("MIN", Field::Minutes),
        ("PTS", Field::Points),
        ("REB", Field::Rebounds),
        ("DREB", Field::DefensiveRebounds),
        ("AST", Field::Assists),
        ("STL", Field::Steals),
        ("BLK", Field::Blocks),
        ("TOV", Field::Turnovers),
        ("PF", Field::Fouls),
        ("FG_PCT", Field::FgPct),
        ("FG3_PCT", Field::Fg3Pct),
        ("FT_PCT", Field::FtPct),
    ],
    percent_scale: PercentScale::Fraction,
};

const REFERENCE_MAPPING: Mapping = Mapping {
    fields: &[
        ("Player", Field::Name),
        ("Tm", Field::Team),
        ("Team", Field::Team),
        ("Age", Field::Age),
        ("G", Field::Games),
        ("MP", Field::Minutes),
        ("PTS", Field::Points),
        ("TRB", Field::Rebounds),
        ("DRB", Field::DefensiveRebounds),
        ("AST", Field::Assists),
        ("STL", Field::Steals),
        ("BLK", Field::Blocks),
        ("TOV", Field::Turnovers),
        ("PF", Field::Fouls),
        ("FG%", Field::FgPct),
        ("3P%", Field::Fg3Pct),
        ("FT%", Field::FtPct),
    ],
    percent_scale: PercentScale::Fraction,
};

const ESPN_MAPPING: Mapping = Mapping {
    fields: &[
        ("displayName", Field::Name),
        ("team", Field::Team),
        ("age", Field::Age),
        ("gamesPlayed", Field::Games),
        ("games", Field::Games),
        ("avgMinutes", Field::Minutes),
        ("minutesPerGame", Field::Minutes),
        ("avgPoints", Field::Points),
        ("pointsPerGame", Field::Points),
        ("avgRebounds", Field::Rebounds),
        ("reboundsPerGame", Field::Rebounds),
        ("avgDefensiveRebounds", Field::DefensiveRebounds),
        ("defensiveReboundsPerGame", Field::DefensiveRebounds),
        ("avgAssists", Field::Assists),
        ("assistsPerGame", Field::Assists),
        ("avgSteals", Field::Steals),
        ("stealsPerGame", Field::Steals),
        ("avgBlocks", Field::Blocks),
        ("blocksPerGame", Field::Blocks),
        ("avgTurnovers", Field::Turnovers),
        ("turnoversPerGame", Field::Turnovers),
        ("avgFouls", Field::Fouls),
        ("foulsPerGame", Field::Fouls),
        ("fieldGoalPct", Field::FgPct),
        ("fieldGoalPercentage", Field::FgPct),
        ("threePointFieldGoalPct", Field::Fg3Pct),
        ("threePointPercentage", Field::Fg3Pct),
        ("freeThrowPct", Field::FtPct),
        ("freeThrowPercentage", Field::FtPct),
    ],
    percent_scale: PercentScale::Percent,
};

fn mapping_for(kind: SourceKind) -> &'static Mapping {
    match kind {
        // Synthetic records are generated in the official API's shape.
        SourceKind::Primary | SourceKind::Synthetic => &NBA_STATS_MAPPING,
        SourceKind::Secondary => &REFERENCE_MAPPING,
        SourceKind::Tertiary => &ESPN_MAPPING,
    }
}

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

/// Normalize one raw record produced by a `source_kind` adapter.
pub fn normalize(
    raw: &RawRecord,
    source_kind: SourceKind,
    season: &Season,
) -> Result<CanonicalRecord, NormalizationError> {
    normalize_at(raw, source_kind, season, 0)
}

/// Normalize a whole adapter result. Rows without a player name are skipped;
/// a value that is not a record at all rejects the batch as a unit.
pub fn normalize_batch(
    raws: &[RawRecord],
    source_kind: SourceKind,
    season: &Season,
) -> Result<Vec<CanonicalRecord>, NormalizationError> {
    let mut out = Vec::with_capacity(raws.len());
    let mut nameless = 0usize;
    for (i, raw) in raws.iter().enumerate() {
        match normalize_at(raw, source_kind, season, i) {
            Ok(record) => out.push(record),
            Err(NormalizationError::MissingIdentity { .. }) => nameless += 1,
            Err(e) => return Err(e),
        }
    }
    if nameless > 0 {
        warn!(source = %source_kind, skipped = nameless, kept = out.len(), "dropped rows without a player name");
    }
    Ok(out)
}

fn normalize_at(
    raw: &RawRecord,
    source_kind: SourceKind,
    season: &Season,
    index: usize,
) -> Result<CanonicalRecord, NormalizationError> {
    let obj = raw.as_object().ok_or(NormalizationError::NotARecord {
        source_kind,
        found: json_kind(raw),
    })?;
    let mapping = mapping_for(source_kind);

    let name = lookup(obj, mapping, Field::Name)
        .and_then(text_value)
        .filter(|n| !n.is_empty())
        .ok_or(NormalizationError::MissingIdentity { source_kind, index })?;
    let team = lookup(obj, mapping, Field::Team)
        .and_then(text_value)
        .map(|t| t.to_uppercase())
        .unwrap_or_default();

    let mut record = CanonicalRecord::empty(name, team, season.clone());

    let count = |field: Field| -> f64 {
        lookup(obj, mapping, field)
            .and_then(numeric_value)
            .unwrap_or(0.0)
    };
    let pct = |field: Field| -> Option<f64> {
        lookup(obj, mapping, field)
            .and_then(numeric_value)
            .map(|v| scale_percent(v, mapping.percent_scale))
    };

    record.age = lookup(obj, mapping, Field::Age).and_then(numeric_value);
    record.games_played = count(Field::Games);
    record.minutes = count(Field::Minutes);
    record.points = count(Field::Points);
    record.rebounds = count(Field::Rebounds);
    record.defensive_rebounds = count(Field::DefensiveRebounds);
    record.assists = count(Field::Assists);
    record.steals = count(Field::Steals);
    record.blocks = count(Field::Blocks);
    record.turnovers = count(Field::Turnovers);
    record.fouls = count(Field::Fouls);
    record.fg_pct = pct(Field::FgPct);
    record.fg3_pct = pct(Field::Fg3Pct);
    record.ft_pct = pct(Field::FtPct);

    Ok(record)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// First present, non-null raw value mapped to `field`.
fn lookup<'a>(obj: &'a Map<String, Value>, mapping: &Mapping, field: Field) -> Option<&'a Value> {
    mapping
        .fields
        .iter()
        .filter(|(_, f)| *f == field)
        .filter_map(|(raw_name, _)| obj.get(*raw_name))
        .find(|v| !v.is_null())
}

fn text_value(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Numbers pass through; numeric strings (`".512"`, `" 31.4 "`) are parsed.
/// Empty or unparseable strings and non-finite values count as missing.
fn numeric_value(v: &Value) -> Option<f64> {
    let parsed = match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|x| x.is_finite())
}

fn scale_percent(value: f64, scale: PercentScale) -> f64 {
    match scale {
        PercentScale::Percent => value / 100.0,
        PercentScale::Fraction if value > 1.0 => value / 100.0,
        PercentScale::Fraction => value,
    }
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn season() -> Season {
        "2023-24".parse().unwrap()
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn nba_stats_record_maps_every_field() {
        let raw = json!({
            "PLAYER_ID": 203999,
            "PLAYER_NAME": "Nikola Jokic",
            "TEAM_ABBREVIATION": "DEN",
            "AGE": 29.0,
            "GP": 79,
            "MIN": 34.6,
            "PTS": 26.4,
            "REB": 12.4,
            "DREB": 9.5,
            "AST": 9.0,
            "STL": 1.4,
            "BLK": 0.9,
            "TOV": 3.0,
            "PF": 2.5,
            "FG_PCT": 0.583,
            "FG3_PCT": 0.359,
            "FT_PCT": 0.817
        });
        let rec = normalize(&raw, SourceKind::Primary, &season()).unwrap();
        assert_eq!(rec.name, "Nikola Jokic");
        assert_eq!(rec.team, "DEN");
        assert_eq!(rec.age, Some(29.0));
        assert!(approx(rec.games_played, 79.0));
        assert!(approx(rec.minutes, 34.6));
        assert!(approx(rec.points, 26.4));
        assert!(approx(rec.defensive_rebounds, 9.5));
        assert!(approx(rec.fouls, 2.5));
        assert_eq!(rec.fg_pct, Some(0.583));
        assert_eq!(rec.fg3_pct, Some(0.359));
        assert_eq!(rec.ft_pct, Some(0.817));
        assert_eq!(rec.season, season());
    }

    #[test]
    fn missing_fields_take_documented_defaults() {
        let raw = json!({ "PLAYER_NAME": "Bench Guy" });
        let rec = normalize(&raw, SourceKind::Primary, &season()).unwrap();
        assert_eq!(rec.team, "");
        assert_eq!(rec.age, None);
        assert_eq!(rec.points, 0.0);
        assert_eq!(rec.turnovers, 0.0);
        assert_eq!(rec.fg_pct, None);
        assert_eq!(rec.fg3_pct, None);
        assert_eq!(rec.ft_pct, None);
    }

    #[test]
    fn null_values_count_as_missing() {
        let raw = json!({ "PLAYER_NAME": "X", "FG3_PCT": null, "PTS": null });
        let rec = normalize(&raw, SourceKind::Primary, &season()).unwrap();
        assert_eq!(rec.fg3_pct, None);
        assert_eq!(rec.points, 0.0);
    }

    #[test]
    fn reference_strings_are_parsed() {
        let raw = json!({
            "Rk": "1",
            "Player": "Joel Embiid",
            "Tm": "PHI",
            "MP": "33.6",
            "PTS": "34.7",
            "TRB": "11.0",
            "FG%": ".529",
            "3P%": "",
            "FT%": ".883"
        });
        let rec = normalize(&raw, SourceKind::Secondary, &season()).unwrap();
        assert_eq!(rec.team, "PHI");
        assert!(approx(rec.points, 34.7));
        assert!(approx(rec.rebounds, 11.0));
        assert_eq!(rec.fg_pct, Some(0.529));
        assert_eq!(rec.fg3_pct, None, "empty cell is missing, not zero");
        assert_eq!(rec.ft_pct, Some(0.883));
    }

    #[test]
    fn reference_accepts_newer_team_header() {
        let raw = json!({ "Player": "A", "Team": "bos" });
        let rec = normalize(&raw, SourceKind::Secondary, &season()).unwrap();
        assert_eq!(rec.team, "BOS");
    }

    #[test]
    fn espn_percentages_are_rescaled() {
        let raw = json!({
            "displayName": "Luka Doncic",
            "team": "DAL",
            "gamesPlayed": 70,
            "avgPoints": 33.9,
            "fieldGoalPct": 48.7,
            "threePointFieldGoalPct": 38.2,
            "freeThrowPct": 78.6
        });
        let rec = normalize(&raw, SourceKind::Tertiary, &season()).unwrap();
        assert!(approx(rec.points, 33.9));
        assert!(approx(rec.fg_pct.unwrap(), 0.487));
        assert!(approx(rec.fg3_pct.unwrap(), 0.382));
        assert!(approx(rec.ft_pct.unwrap(), 0.786));
    }

    #[test]
    fn espn_legacy_aliases_map() {
        let raw = json!({
            "displayName": "Trae Young",
            "pointsPerGame": 25.7,
            "assistsPerGame": 10.8,
            "fieldGoalPercentage": 43.0
        });
        let rec = normalize(&raw, SourceKind::Tertiary, &season()).unwrap();
        assert!(approx(rec.points, 25.7));
        assert!(approx(rec.assists, 10.8));
        assert!(approx(rec.fg_pct.unwrap(), 0.43));
    }

    #[test]
    fn fraction_source_with_percent_value_is_rescaled() {
        let raw = json!({ "PLAYER_NAME": "X", "FG_PCT": 51.0 });
        let rec = normalize(&raw, SourceKind::Primary, &season()).unwrap();
        assert!(approx(rec.fg_pct.unwrap(), 0.51));
    }

    #[test]
    fn non_object_is_structural_error() {
        let err = normalize(&json!([1, 2, 3]), SourceKind::Primary, &season()).unwrap_err();
        assert_eq!(
            err,
            NormalizationError::NotARecord {
                source_kind: SourceKind::Primary,
                found: "array"
            }
        );
    }

    #[test]
    fn single_record_without_name_is_an_error() {
        let err = normalize(&json!({ "PTS": 10.0 }), SourceKind::Primary, &season()).unwrap_err();
        assert_eq!(
            err,
            NormalizationError::MissingIdentity {
                source_kind: SourceKind::Primary,
                index: 0
            }
        );
    }

    #[test]
    fn batch_skips_nameless_rows() {
        let raws = vec![
            json!({ "PLAYER_NAME": "Ok" }),
            json!({ "PLAYER_NAME": "   ", "PTS": 10.0 }),
            json!({ "PLAYER_NAME": null, "PTS": 12.0 }),
            json!({ "PLAYER_NAME": "Also Ok" }),
        ];
        let recs = normalize_batch(&raws, SourceKind::Primary, &season()).unwrap();
        let names: Vec<_> = recs.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Ok", "Also Ok"]);
    }

    #[test]
    fn batch_with_non_record_is_rejected() {
        let raws = vec![json!({ "PLAYER_NAME": "Ok" }), json!(42)];
        assert!(matches!(
            normalize_batch(&raws, SourceKind::Tertiary, &season()),
            Err(NormalizationError::NotARecord { found: "number", .. })
        ));
    }

    #[test]
    fn batch_preserves_order() {
        let raws = vec![json!({ "PLAYER_NAME": "B" }), json!({ "PLAYER_NAME": "A" })];
        let recs = normalize_batch(&raws, SourceKind::Synthetic, &season()).unwrap();
        let names: Vec<_> = recs.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["B", "A"]);
    }

    #[test]
    fn normalization_is_deterministic() {
        let raw = json!({ "Player": "Y", "PTS": "12.5", "FG%": ".444" });
        let a = normalize(&raw, SourceKind::Secondary, &season()).unwrap();
        let b = normalize(&raw, SourceKind::Secondary, &season()).unwrap();
        assert_eq!(a, b);
    }
}
