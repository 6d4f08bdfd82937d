// Player lookup, team/league summaries and hot takes over a snapshot.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

use hoopscope_core::config::{Config, ScoringConfig};
use hoopscope_core::{CanonicalRecord, DatasetSnapshot, Scope};
use hoopscope_llm::ReasoningBackend;

use crate::insight::{
    HotTakes, InsightContext, InsightGenerator, LeaderEntry, LeagueContext, Narrative,
    StatAverages, TeamContext,
};
use crate::leaders::{leaders, Stat};
use crate::rating::{BandTableError, RatingTables};

/// Players named in a team's key-player list.
const KEY_PLAYERS: usize = 3;
/// Scorers listed in league context.
const TOP_SCORERS: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalysisError {
    #[error("player '{0}' not found")]
    PlayerNotFound(String),

    #[error("team '{0}' not found")]
    TeamNotFound(String),

    #[error("no data available")]
    NoData,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerReport {
    #[serde(flatten)]
    pub context: InsightContext,
    pub narrative: Narrative,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Analysis {
    Player(PlayerReport),
    Team {
        context: TeamContext,
        narrative: Narrative,
    },
    League {
        context: LeagueContext,
        narrative: Narrative,
    },
}

pub struct Analyzer {
    weights: ScoringConfig,
    tables: RatingTables,
    generator: InsightGenerator,
}

impl Analyzer {
    pub fn new(weights: ScoringConfig, tables: RatingTables, generator: InsightGenerator) -> Self {
        Self {
            weights,
            tables,
            generator,
        }
    }

    pub fn from_config(config: &Config, backend: Arc<dyn ReasoningBackend>) -> Result<Self, BandTableError> {
        Ok(Self::new(
            config.scoring.clone(),
            RatingTables::from_config(&config.ratings)?,
            InsightGenerator::new(backend, config.backend.timeout()),
        ))
    }

    pub fn weights(&self) -> &ScoringConfig {
        &self.weights
    }

    pub fn context_for(&self, record: &CanonicalRecord) -> InsightContext {
        InsightContext::new(record.clone(), &self.weights, &self.tables)
    }

    /// Scores and ratings for the best name match, without commentary.
    pub fn lookup(&self, snapshot: &DatasetSnapshot, name: &str) -> Result<InsightContext, AnalysisError> {
        snapshot
            .find_player(name)
            .map(|r| self.context_for(r))
            .ok_or_else(|| AnalysisError::PlayerNotFound(name.trim().to_string()))
    }

    pub async fn player_report(
        &self,
        snapshot: &DatasetSnapshot,
        name: &str,
    ) -> Result<PlayerReport, AnalysisError> {
        let context = self.lookup(snapshot, name)?;
        let narrative = self.generator.generate(&context).await;
        Ok(PlayerReport { context, narrative })
    }

    pub fn team_context(&self, snapshot: &DatasetSnapshot, team: &str) -> Result<TeamContext, AnalysisError> {
        let scope = Scope::Team(team.trim().to_uppercase());
        let members: Vec<&CanonicalRecord> = snapshot.in_scope(&scope).collect();
        let averages = StatAverages::from_records(members.iter().copied(), &self.weights)
            .ok_or_else(|| AnalysisError::TeamNotFound(team.trim().to_string()))?;
        Ok(TeamContext {
            team: team.trim().to_uppercase(),
            averages,
            key_players: leaders(members, Stat::Overall, KEY_PLAYERS, &self.weights),
        })
    }

    pub fn league_context(&self, snapshot: &DatasetSnapshot) -> Result<LeagueContext, AnalysisError> {
        let averages =
            StatAverages::from_records(&snapshot.records, &self.weights).ok_or(AnalysisError::NoData)?;
        Ok(LeagueContext {
            averages,
            top_scorers: self.leaders(snapshot, Stat::Points, TOP_SCORERS),
        })
    }

    /// Commentary for a player, a team, or the whole snapshot.
    pub async fn analyze(&self, snapshot: &DatasetSnapshot, scope: &Scope) -> Result<Analysis, AnalysisError> {
        match scope {
            Scope::Player(name) => Ok(Analysis::Player(self.player_report(snapshot, name).await?)),
            Scope::Team(team) => {
                let context = self.team_context(snapshot, team)?;
                let narrative = self.generator.generate(&context).await;
                Ok(Analysis::Team { context, narrative })
            }
            Scope::League => {
                let context = self.league_context(snapshot)?;
                let narrative = self.generator.generate(&context).await;
                Ok(Analysis::League { context, narrative })
            }
        }
    }

    pub async fn hot_takes(&self, snapshot: &DatasetSnapshot, count: usize) -> Result<HotTakes, AnalysisError> {
        if snapshot.is_empty() {
            return Err(AnalysisError::NoData);
        }
        Ok(self
            .generator
            .hot_takes(&snapshot.records, count, &self.weights)
            .await)
    }

    pub fn leaders(&self, snapshot: &DatasetSnapshot, stat: Stat, n: usize) -> Vec<LeaderEntry> {
        leaders(&snapshot.records, stat, n, &self.weights)
    }
}
