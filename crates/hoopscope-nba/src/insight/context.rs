// Read-only inputs to narrative generation.

use serde::Serialize;

use hoopscope_core::config::ScoringConfig;
use hoopscope_core::CanonicalRecord;

use crate::rating::{RatingTables, Ratings};
use crate::scoring::{score, ScoreResult};

/// One player's record with its derived scores and ratings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InsightContext {
    pub record: CanonicalRecord,
    pub scores: ScoreResult,
    pub ratings: Ratings,
}

impl InsightContext {
    pub fn new(record: CanonicalRecord, weights: &ScoringConfig, tables: &RatingTables) -> Self {
        let scores = score(&record, weights);
        let ratings = tables.rate(&scores);
        Self {
            record,
            scores,
            ratings,
        }
    }
}

// ---------------------------------------------------------------------------
// Aggregate contexts
// ---------------------------------------------------------------------------

/// Per-stat means over a set of records. Percentage means only count records
/// that report the percentage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatAverages {
    pub players: usize,
    pub points: f64,
    pub rebounds: f64,
    pub assists: f64,
    pub steals: f64,
    pub blocks: f64,
    pub fg_pct: Option<f64>,
    pub fg3_pct: Option<f64>,
    pub ft_pct: Option<f64>,
    pub offensive_score: f64,
    pub defensive_score: f64,
}

impl StatAverages {
    /// `None` for an empty set.
    pub fn from_records<'a>(
        records: impl IntoIterator<Item = &'a CanonicalRecord>,
        weights: &ScoringConfig,
    ) -> Option<Self> {
        let records: Vec<&CanonicalRecord> = records.into_iter().collect();
        if records.is_empty() {
            return None;
        }
        let n = records.len() as f64;
        let mean = |f: fn(&CanonicalRecord) -> f64| records.iter().map(|r| f(r)).sum::<f64>() / n;
        let pct_mean = |f: fn(&CanonicalRecord) -> Option<f64>| {
            let present: Vec<f64> = records.iter().filter_map(|r| f(r)).collect();
            (!present.is_empty()).then(|| present.iter().sum::<f64>() / present.len() as f64)
        };
        let scores: Vec<ScoreResult> = records.iter().map(|r| score(r, weights)).collect();

        Some(Self {
            players: records.len(),
            points: mean(|r| r.points),
            rebounds: mean(|r| r.rebounds),
            assists: mean(|r| r.assists),
            steals: mean(|r| r.steals),
            blocks: mean(|r| r.blocks),
            fg_pct: pct_mean(|r| r.fg_pct),
            fg3_pct: pct_mean(|r| r.fg3_pct),
            ft_pct: pct_mean(|r| r.ft_pct),
            offensive_score: scores.iter().map(|s| s.offensive).sum::<f64>() / n,
            defensive_score: scores.iter().map(|s| s.defensive).sum::<f64>() / n,
        })
    }
}

/// A ranked player line used in summaries and leader boards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeaderEntry {
    pub name: String,
    pub team: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamContext {
    pub team: String,
    pub averages: StatAverages,
    /// Highest overall scores on the team, best first.
    pub key_players: Vec<LeaderEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeagueContext {
    pub averages: StatAverages,
    pub top_scorers: Vec<LeaderEntry>,
}
