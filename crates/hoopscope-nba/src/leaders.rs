// Leader boards: top-N records by a single statistic.

use std::fmt;
use std::str::FromStr;

use hoopscope_core::config::ScoringConfig;
use hoopscope_core::CanonicalRecord;

use crate::insight::LeaderEntry;
use crate::scoring::score;

/// A statistic a leader board can rank by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stat {
    Points,
    Rebounds,
    Assists,
    Steals,
    Blocks,
    FgPct,
    Fg3Pct,
    FtPct,
    Efficiency,
    Offensive,
    Defensive,
    Overall,
}

impl Stat {
    pub const ALL: [Stat; 12] = [
        Stat::Points,
        Stat::Rebounds,
        Stat::Assists,
        Stat::Steals,
        Stat::Blocks,
        Stat::FgPct,
        Stat::Fg3Pct,
        Stat::FtPct,
        Stat::Efficiency,
        Stat::Offensive,
        Stat::Defensive,
        Stat::Overall,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Stat::Points => "pts",
            Stat::Rebounds => "reb",
            Stat::Assists => "ast",
            Stat::Steals => "stl",
            Stat::Blocks => "blk",
            Stat::FgPct => "fg",
            Stat::Fg3Pct => "fg3",
            Stat::FtPct => "ft",
            Stat::Efficiency => "eff",
            Stat::Offensive => "off",
            Stat::Defensive => "def",
            Stat::Overall => "overall",
        }
    }

    /// `None` when the record does not report the statistic.
    pub fn value(&self, r: &CanonicalRecord, weights: &ScoringConfig) -> Option<f64> {
        match self {
            Stat::Points => Some(r.points),
            Stat::Rebounds => Some(r.rebounds),
            Stat::Assists => Some(r.assists),
            Stat::Steals => Some(r.steals),
            Stat::Blocks => Some(r.blocks),
            Stat::FgPct => r.fg_pct,
            Stat::Fg3Pct => r.fg3_pct,
            Stat::FtPct => r.ft_pct,
            Stat::Efficiency => Some(r.efficiency()),
            Stat::Offensive => Some(score(r, weights).offensive),
            Stat::Defensive => Some(score(r, weights).defensive),
            Stat::Overall => Some(score(r, weights).overall),
        }
    }
}

impl fmt::Display for Stat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Stat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Stat::ALL
            .into_iter()
            .find(|stat| stat.key() == wanted)
            .ok_or_else(|| {
                let keys: Vec<&str> = Stat::ALL.iter().map(|s| s.key()).collect();
                format!("unknown stat `{s}` (expected one of {})", keys.join(", "))
            })
    }
}

/// Top `n` records by `stat`, highest first. Ties keep input order; records
/// without the statistic are left out.
pub fn leaders<'a>(
    records: impl IntoIterator<Item = &'a CanonicalRecord>,
    stat: Stat,
    n: usize,
    weights: &ScoringConfig,
) -> Vec<LeaderEntry> {
    let mut ranked: Vec<(&CanonicalRecord, f64)> = records
        .into_iter()
        .filter_map(|r| stat.value(r, weights).filter(|v| !v.is_nan()).map(|v| (r, v)))
        .collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    ranked
        .into_iter()
        .take(n)
        .map(|(r, value)| LeaderEntry {
            name: r.name.clone(),
            team: r.team.clone(),
            value,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use hoopscope_core::Season;

    fn rec(name: &str, pts: f64, fg3: Option<f64>) -> CanonicalRecord {
        let mut r = CanonicalRecord::empty(name, "LAL", Season::new(2023));
        r.points = pts;
        r.fg3_pct = fg3;
        r
    }

    #[test]
    fn leaders_sorted_descending_with_stable_ties() {
        let records = vec![rec("A", 10.0, None), rec("B", 30.0, None), rec("C", 10.0, None)];
        let top = leaders(&records, Stat::Points, 3, &ScoringConfig::default());
        let names: Vec<_> = top.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["B", "A", "C"]);
    }

    #[test]
    fn missing_values_are_excluded() {
        let records = vec![rec("A", 10.0, None), rec("B", 5.0, Some(0.4))];
        let top = leaders(&records, Stat::Fg3Pct, 5, &ScoringConfig::default());
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].name, "B");
    }

    #[test]
    fn stat_keys_round_trip() {
        for stat in Stat::ALL {
            assert_eq!(stat.key().parse::<Stat>().unwrap(), stat);
        }
        assert!("xyz".parse::<Stat>().is_err());
    }
}
