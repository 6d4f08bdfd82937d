// Score-to-label classification.
//
// A band table is an ascending list of (lower bound, label). A score gets the
// highest band whose lower bound it reaches; the lowest band is unbounded
// below, so classification is total.

use serde::Serialize;
use thiserror::Error;

use hoopscope_core::config::{BandSpec, RatingsConfig};

use crate::scoring::ScoreResult;

// ---------------------------------------------------------------------------
// Band table
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BandTableError {
    #[error("band table is empty")]
    Empty,

    #[error("band bounds must be strictly ascending (band {index})")]
    NotAscending { index: usize },

    #[error("band {index} has no lower bound")]
    MissingBound { index: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub struct BandTable {
    /// Ascending. The first bound is always `-inf`.
    bands: Vec<(f64, String)>,
}

impl BandTable {
    /// Build from ascending `(lower_bound, label)` pairs. The first bound is
    /// replaced with `-inf`.
    pub fn new<S: Into<String>>(bands: Vec<(f64, S)>) -> Result<Self, BandTableError> {
        if bands.is_empty() {
            return Err(BandTableError::Empty);
        }
        let mut out: Vec<(f64, String)> = Vec::with_capacity(bands.len());
        for (index, (bound, label)) in bands.into_iter().enumerate() {
            let bound = if index == 0 { f64::NEG_INFINITY } else { bound };
            if let Some((prev, _)) = out.last() {
                if bound.is_nan() || bound <= *prev {
                    return Err(BandTableError::NotAscending { index });
                }
            }
            out.push((bound, label.into()));
        }
        Ok(Self { bands: out })
    }

    pub fn from_specs(specs: &[BandSpec]) -> Result<Self, BandTableError> {
        let pairs = specs
            .iter()
            .enumerate()
            .map(|(index, spec)| match (index, spec.min) {
                (0, min) => Ok((min.unwrap_or(f64::NEG_INFINITY), spec.label.clone())),
                (_, Some(min)) => Ok((min, spec.label.clone())),
                (_, None) => Err(BandTableError::MissingBound { index }),
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(pairs)
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.bands.iter().map(|(_, l)| l.as_str())
    }

    pub fn len(&self) -> usize {
        self.bands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bands.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rating {
    pub label: String,
    /// Zero-based band index, lowest first.
    pub band: usize,
}

/// Highest band whose lower bound is `<= score`. NaN lands in the lowest band.
pub fn classify(score: f64, table: &BandTable) -> Rating {
    let band = table
        .bands
        .iter()
        .rposition(|(bound, _)| *bound <= score)
        .unwrap_or(0);
    Rating {
        label: table.bands[band].1.clone(),
        band,
    }
}

/// The three tables a full rating needs.
#[derive(Debug, Clone, PartialEq)]
pub struct RatingTables {
    pub offensive: BandTable,
    pub defensive: BandTable,
    pub overall: BandTable,
}

impl RatingTables {
    pub fn from_config(config: &RatingsConfig) -> Result<Self, BandTableError> {
        Ok(Self {
            offensive: BandTable::from_specs(&config.offensive)?,
            defensive: BandTable::from_specs(&config.defensive)?,
            overall: BandTable::from_specs(&config.overall)?,
        })
    }

    pub fn rate(&self, scores: &ScoreResult) -> Ratings {
        Ratings {
            offensive: classify(scores.offensive, &self.offensive),
            defensive: classify(scores.defensive, &self.defensive),
            overall: classify(scores.overall, &self.overall),
        }
    }
}

impl Default for RatingTables {
    fn default() -> Self {
        // The built-in tables are ascending by construction.
        Self::from_config(&RatingsConfig::default()).unwrap_or_else(|_| Self {
            offensive: single_band(),
            defensive: single_band(),
            overall: single_band(),
        })
    }
}

fn single_band() -> BandTable {
    BandTable {
        bands: vec![(f64::NEG_INFINITY, "Unrated".to_string())],
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Ratings {
    pub offensive: Rating,
    pub defensive: Rating,
    pub overall: Rating,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offensive() -> BandTable {
        RatingTables::default().offensive
    }

    #[test]
    fn boundary_goes_to_higher_band() {
        let t = offensive();
        assert_eq!(classify(20.0, &t).label, "Excellent");
        assert_eq!(classify(19.999_999, &t).label, "Good");
        assert_eq!(classify(25.0, &t).label, "Elite");
    }

    #[test]
    fn every_score_gets_a_band() {
        let t = offensive();
        for s in [f64::NEG_INFINITY, -1e12, -5.0, 0.0, 9.9, 10.0, 1e12, f64::INFINITY] {
            let r = classify(s, &t);
            assert!(r.band < t.len());
        }
        assert_eq!(classify(-40.0, &t).label, "Below Average");
        assert_eq!(classify(f64::INFINITY, &t).label, "Elite");
    }

    #[test]
    fn nan_is_lowest_band() {
        let r = classify(f64::NAN, &offensive());
        assert_eq!(r.band, 0);
        assert_eq!(r.label, "Below Average");
    }

    #[test]
    fn default_tables_match_standard_bands() {
        let tables = RatingTables::default();
        assert_eq!(classify(8.0, &tables.defensive).label, "Elite");
        assert_eq!(classify(3.9, &tables.defensive).label, "Average");
        assert_eq!(classify(18.0, &tables.overall).label, "Elite");
        assert_eq!(classify(10.5, &tables.overall).label, "Good");
        assert_eq!(classify(6.99, &tables.overall).label, "Below Average");
    }

    #[test]
    fn construction_rejects_bad_tables() {
        assert_eq!(
            BandTable::new(Vec::<(f64, &str)>::new()),
            Err(BandTableError::Empty)
        );
        assert_eq!(
            BandTable::new(vec![(0.0, "a"), (5.0, "b"), (5.0, "c")]),
            Err(BandTableError::NotAscending { index: 2 })
        );
        assert_eq!(
            BandTable::from_specs(&[BandSpec::new(None, "a"), BandSpec::new(None, "b")]),
            Err(BandTableError::MissingBound { index: 1 })
        );
    }

    #[test]
    fn first_bound_is_unbounded_below() {
        let t = BandTable::new(vec![(100.0, "low"), (200.0, "high")]).unwrap();
        assert_eq!(classify(-1.0, &t).label, "low");
        assert_eq!(t.labels().collect::<Vec<_>>(), vec!["low", "high"]);
    }

    #[test]
    fn rate_labels_all_three_scores() {
        let scores = ScoreResult {
            offensive: 21.0,
            defensive: 4.5,
            overall: 14.4,
        };
        let r = RatingTables::default().rate(&scores);
        assert_eq!(r.offensive.label, "Excellent");
        assert_eq!(r.defensive.label, "Good");
        assert_eq!(r.overall.label, "Good");
    }
}
