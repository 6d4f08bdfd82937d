// Canonical statistical record shared by every source, plus the identifiers
// (source kind, scope, season) that travel with it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Source kind
// ---------------------------------------------------------------------------

/// Which upstream origin a batch of records came from. Order of declaration
/// is the default fallback priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Official league statistics API.
    Primary,
    /// Reference site per-game table export.
    Secondary,
    /// Broadcaster athletes API.
    Tertiary,
    /// Algorithmically generated sample data. Never fails.
    Synthetic,
}

impl SourceKind {
    pub const ALL: [SourceKind; 4] = [
        SourceKind::Primary,
        SourceKind::Secondary,
        SourceKind::Tertiary,
        SourceKind::Synthetic,
    ];

    /// Stable lowercase identifier used in config files and snapshots.
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Primary => "primary",
            SourceKind::Secondary => "secondary",
            SourceKind::Tertiary => "tertiary",
            SourceKind::Synthetic => "synthetic",
        }
    }

    /// Human-readable origin name.
    pub fn label(&self) -> &'static str {
        match self {
            SourceKind::Primary => "NBA Stats API",
            SourceKind::Secondary => "Basketball Reference",
            SourceKind::Tertiary => "ESPN API",
            SourceKind::Synthetic => "Synthetic sample data",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceKind {
    type Err = ParseIdentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "primary" => Ok(SourceKind::Primary),
            "secondary" => Ok(SourceKind::Secondary),
            "tertiary" => Ok(SourceKind::Tertiary),
            "synthetic" => Ok(SourceKind::Synthetic),
            other => Err(ParseIdentError::SourceKind(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseIdentError {
    #[error("unknown source kind `{0}` (expected primary, secondary, tertiary or synthetic)")]
    SourceKind(String),

    #[error("invalid season `{0}` (expected e.g. 2023-24)")]
    Season(String),

    #[error("invalid scope `{0}` (expected league, team:<code> or player:<name>)")]
    Scope(String),
}

// ---------------------------------------------------------------------------
// Season
// ---------------------------------------------------------------------------

/// A statistical period in `YYYY-YY` form, e.g. `2023-24`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Season {
    start_year: i32,
}

impl Season {
    pub fn new(start_year: i32) -> Self {
        Self { start_year }
    }

    pub fn start_year(&self) -> i32 {
        self.start_year
    }

    /// Calendar year the season ends in. Reference sites key seasons by it.
    pub fn end_year(&self) -> i32 {
        self.start_year + 1
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:02}", self.start_year, self.end_year().rem_euclid(100))
    }
}

impl FromStr for Season {
    type Err = ParseIdentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseIdentError::Season(s.to_string());
        let (start, end) = s.trim().split_once('-').ok_or_else(invalid)?;
        if start.len() != 4 || end.len() != 2 {
            return Err(invalid());
        }
        let start_year: i32 = start.parse().map_err(|_| invalid())?;
        let end_suffix: i32 = end.parse().map_err(|_| invalid())?;
        if (start_year + 1).rem_euclid(100) != end_suffix {
            return Err(invalid());
        }
        Ok(Season { start_year })
    }
}

impl TryFrom<String> for Season {
    type Error = ParseIdentError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Season> for String {
    fn from(season: Season) -> Self {
        season.to_string()
    }
}

// ---------------------------------------------------------------------------
// Scope
// ---------------------------------------------------------------------------

/// Breadth of a collection or analysis request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Scope {
    League,
    /// Team code, e.g. `LAL`. Matched case-insensitively.
    Team(String),
    /// Player name fragment. Matched as a case-insensitive substring.
    Player(String),
}

impl Scope {
    /// Whether `record` falls inside this scope.
    pub fn matches(&self, record: &CanonicalRecord) -> bool {
        match self {
            Scope::League => true,
            Scope::Team(code) => record.team.eq_ignore_ascii_case(code.trim()),
            Scope::Player(fragment) => record
                .name
                .to_lowercase()
                .contains(&fragment.trim().to_lowercase()),
        }
    }

    /// The canonical form `FromStr` produces: team codes trimmed and
    /// uppercased, player fragments trimmed.
    pub fn normalized(&self) -> Scope {
        match self {
            Scope::League => Scope::League,
            Scope::Team(code) => Scope::Team(code.trim().to_uppercase()),
            Scope::Player(fragment) => Scope::Player(fragment.trim().to_string()),
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::League => f.write_str("league"),
            Scope::Team(code) => write!(f, "team:{code}"),
            Scope::Player(name) => write!(f, "player:{name}"),
        }
    }
}

impl FromStr for Scope {
    type Err = ParseIdentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("league") {
            return Ok(Scope::League);
        }
        match trimmed.split_once(':') {
            Some((kind, value)) if !value.trim().is_empty() => {
                match kind.to_ascii_lowercase().as_str() {
                    "team" => Ok(Scope::Team(value.trim().to_uppercase())),
                    "player" => Ok(Scope::Player(value.trim().to_string())),
                    _ => Err(ParseIdentError::Scope(s.to_string())),
                }
            }
            _ => Err(ParseIdentError::Scope(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Canonical record
// ---------------------------------------------------------------------------

/// Normalized, source-agnostic per-game statistics for one player-season.
///
/// Every record carries the full field set. Counting stats default to `0.0`
/// when a source omits them; percentages (fractions in `0..=1`) and age use
/// `None` as the missing marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalRecord {
    pub name: String,
    pub team: String,
    pub season: Season,
    pub age: Option<f64>,
    pub games_played: f64,
    pub minutes: f64,
    pub points: f64,
    pub rebounds: f64,
    pub defensive_rebounds: f64,
    pub assists: f64,
    pub steals: f64,
    pub blocks: f64,
    pub turnovers: f64,
    pub fouls: f64,
    pub fg_pct: Option<f64>,
    pub fg3_pct: Option<f64>,
    pub ft_pct: Option<f64>,
}

/// Identity used for deduplication: name and team compared
/// case-insensitively, season exactly.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordKey {
    name: String,
    team: String,
    season: Season,
}

impl CanonicalRecord {
    /// A record with every statistic at its documented default.
    pub fn empty(name: impl Into<String>, team: impl Into<String>, season: Season) -> Self {
        Self {
            name: name.into(),
            team: team.into(),
            season,
            age: None,
            games_played: 0.0,
            minutes: 0.0,
            points: 0.0,
            rebounds: 0.0,
            defensive_rebounds: 0.0,
            assists: 0.0,
            steals: 0.0,
            blocks: 0.0,
            turnovers: 0.0,
            fouls: 0.0,
            fg_pct: None,
            fg3_pct: None,
            ft_pct: None,
        }
    }

    pub fn key(&self) -> RecordKey {
        RecordKey {
            name: self.name.trim().to_lowercase(),
            team: self.team.trim().to_uppercase(),
            season: self.season.clone(),
        }
    }

    /// Simple box-score efficiency:
    /// `PTS + 1.2 REB + 1.5 AST + 2 STL + 2 BLK - TOV`.
    pub fn efficiency(&self) -> f64 {
        self.points + self.rebounds * 1.2 + self.assists * 1.5 + self.steals * 2.0
            + self.blocks * 2.0
            - self.turnovers
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
