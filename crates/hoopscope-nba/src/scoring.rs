// Deterministic offensive/defensive/overall scores.
//
// Every score is scaled by a minutes factor so low-minute players cannot post
// inflated per-game numbers. Scores are neither clamped nor rounded.

use serde::Serialize;

use hoopscope_core::config::ScoringConfig;
use hoopscope_core::CanonicalRecord;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreResult {
    pub offensive: f64,
    pub defensive: f64,
    pub overall: f64,
}

/// `clamp(minutes / ceiling, 0, 1)`. The ceiling is validated positive at
/// config load.
pub fn minutes_factor(minutes: f64, w: &ScoringConfig) -> f64 {
    (minutes / w.minutes_ceiling).clamp(0.0, 1.0)
}

pub fn offensive_score(r: &CanonicalRecord, w: &ScoringConfig) -> f64 {
    // Percentages are weighted on the 0-100 scale; missing ones contribute 0.
    let pct = |p: Option<f64>| p.unwrap_or(0.0) * 100.0;
    let raw = r.points * w.points
        + pct(r.fg_pct) * w.fg_pct
        + pct(r.fg3_pct) * w.fg3_pct
        + pct(r.ft_pct) * w.ft_pct
        + r.assists * w.assists
        - r.turnovers * w.turnovers;
    raw * minutes_factor(r.minutes, w)
}

pub fn defensive_score(r: &CanonicalRecord, w: &ScoringConfig) -> f64 {
    let raw = r.steals * w.steals + r.blocks * w.blocks + r.defensive_rebounds * w.defensive_rebounds
        - r.fouls * w.fouls;
    raw * minutes_factor(r.minutes, w)
}

pub fn score(record: &CanonicalRecord, weights: &ScoringConfig) -> ScoreResult {
    let offensive = offensive_score(record, weights);
    let defensive = defensive_score(record, weights);
    ScoreResult {
        offensive,
        defensive,
        overall: offensive * weights.overall_offense + defensive * weights.overall_defense,
    }
}
