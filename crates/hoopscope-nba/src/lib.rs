// NBA statistics pipeline: source adapters with fallback, normalization,
// scoring, rating, and narrative insight.

pub mod aggregator;
pub mod analysis;
pub mod insight;
pub mod leaders;
pub mod normalize;
pub mod rating;
pub mod scoring;
pub mod sources;

pub use aggregator::{Aggregator, AttemptOutcome, CollectReport, CollectionFailed, SourceAttempt};
pub use analysis::{Analysis, AnalysisError, Analyzer, PlayerReport};
pub use insight::{InsightContext, InsightGenerator, Narratable, Narrative, NarrativeSource};
pub use rating::{classify, BandTable, Rating, RatingTables, Ratings};
pub use scoring::{score, ScoreResult};
pub use sources::{RawRecord, SourceAdapter, SourceError};
