// Insight generation.
//
// A narrative request makes exactly one backend call. If the backend answers
// in time with usable text, that text is the narrative. Otherwise the
// rule-based template for the same context is used. Generation itself never
// fails.

pub mod context;
pub mod fallback;
pub mod hot_takes;
pub mod prompt;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, warn};

use hoopscope_core::config::ScoringConfig;
use hoopscope_core::CanonicalRecord;
use hoopscope_llm::{BackendError, ReasoningBackend};

pub use context::{InsightContext, LeaderEntry, LeagueContext, StatAverages, TeamContext};
pub use hot_takes::HotTake;

// ---------------------------------------------------------------------------
// Narratable
// ---------------------------------------------------------------------------

/// A context that can be narrated: it knows its prompt and its rule-based
/// fallback.
pub trait Narratable {
    fn prompt(&self) -> String;
    fn fallback(&self) -> String;
}

impl Narratable for InsightContext {
    fn prompt(&self) -> String {
        prompt::player_prompt(self)
    }
    fn fallback(&self) -> String {
        fallback::player_narrative(self)
    }
}

impl Narratable for TeamContext {
    fn prompt(&self) -> String {
        prompt::team_prompt(self)
    }
    fn fallback(&self) -> String {
        fallback::team_narrative(self)
    }
}

impl Narratable for LeagueContext {
    fn prompt(&self) -> String {
        prompt::league_prompt(self)
    }
    fn fallback(&self) -> String {
        fallback::league_narrative(self)
    }
}

// ---------------------------------------------------------------------------
// Narrative
// ---------------------------------------------------------------------------

/// Where a narrative's text came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NarrativeSource {
    /// Generated by the named model.
    Model(String),
    /// Rule-based template, with the reason the backend was not used.
    RuleBased(BackendError),
}

impl NarrativeSource {
    pub fn is_model(&self) -> bool {
        matches!(self, NarrativeSource::Model(_))
    }
}

impl fmt::Display for NarrativeSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NarrativeSource::Model(name) => write!(f, "model: {name}"),
            NarrativeSource::RuleBased(reason) => write!(f, "rule-based ({reason})"),
        }
    }
}

impl Serialize for NarrativeSource {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Narrative {
    pub text: String,
    pub source: NarrativeSource,
}

/// Terminal state of one backend request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendOutcome {
    Succeeded(String),
    TimedOut,
    Failed(BackendError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HotTakes {
    pub takes: Vec<HotTake>,
    pub source: NarrativeSource,
    /// Takes that came from the model; the rest are rule-based.
    pub from_model: usize,
    pub players_analyzed: usize,
}

// ---------------------------------------------------------------------------
// Generator
// ---------------------------------------------------------------------------

pub struct InsightGenerator {
    backend: Arc<dyn ReasoningBackend>,
    timeout: Duration,
}

impl InsightGenerator {
    pub fn new(backend: Arc<dyn ReasoningBackend>, timeout: Duration) -> Self {
        Self { backend, timeout }
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// One backend call bounded by the generator's timeout. Blank text counts
    /// as a backend error.
    pub async fn request(&self, prompt: &str) -> BackendOutcome {
        debug!(backend = self.backend.name(), prompt_len = prompt.len(), "awaiting backend");
        match tokio::time::timeout(self.timeout, self.backend.infer(prompt, self.timeout)).await {
            Err(_) | Ok(Err(BackendError::TimedOut(_))) => BackendOutcome::TimedOut,
            Ok(Err(e)) => BackendOutcome::Failed(e),
            Ok(Ok(text)) if text.trim().is_empty() => BackendOutcome::Failed(BackendError::EmptyResponse),
            Ok(Ok(text)) => BackendOutcome::Succeeded(text.trim().to_string()),
        }
    }

    /// Narrate `subject`, falling back to its rule-based text.
    pub async fn generate<N: Narratable + ?Sized>(&self, subject: &N) -> Narrative {
        let prompt = subject.prompt();
        match self.request(&prompt).await {
            BackendOutcome::Succeeded(text) => {
                info!(backend = self.backend.name(), chars = text.len(), "narrative generated");
                Narrative {
                    text,
                    source: NarrativeSource::Model(self.backend.name().to_string()),
                }
            }
            outcome => {
                let reason = self.fallback_reason(outcome);
                Narrative {
                    text: subject.fallback(),
                    source: NarrativeSource::RuleBased(reason),
                }
            }
        }
    }

    /// `count` hot takes about `records`. Parsed model takes come first; any
    /// shortfall is filled from the rule-based takes.
    pub async fn hot_takes(
        &self,
        records: &[CanonicalRecord],
        count: usize,
        weights: &ScoringConfig,
    ) -> HotTakes {
        let summary = hot_takes::data_summary(records, weights);
        let prompt = prompt::hot_takes_prompt(&summary, count);

        let (mut takes, source) = match self.request(&prompt).await {
            BackendOutcome::Succeeded(text) => {
                let parsed = hot_takes::parse_hot_takes(&text);
                if parsed.is_empty() {
                    let reason = BackendError::Malformed("no hot takes in response".into());
                    warn!(backend = self.backend.name(), "{reason}, using rule-based takes");
                    (Vec::new(), NarrativeSource::RuleBased(reason))
                } else {
                    (parsed, NarrativeSource::Model(self.backend.name().to_string()))
                }
            }
            outcome => (Vec::new(), NarrativeSource::RuleBased(self.fallback_reason(outcome))),
        };

        takes.truncate(count);
        let from_model = takes.len();
        if from_model < count {
            if from_model > 0 {
                warn!(parsed = from_model, wanted = count, "topping up with rule-based takes");
            }
            takes.extend(hot_takes::rule_based_hot_takes(records, count - from_model, weights));
        }

        HotTakes {
            takes,
            source,
            from_model,
            players_analyzed: records.len(),
        }
    }

    fn fallback_reason(&self, outcome: BackendOutcome) -> BackendError {
        let reason = match outcome {
            BackendOutcome::TimedOut => BackendError::TimedOut(self.timeout),
            BackendOutcome::Failed(e) => e,
            BackendOutcome::Succeeded(_) => BackendError::EmptyResponse,
        };
        if reason != BackendError::Disabled {
            warn!(backend = self.backend.name(), %reason, "backend unavailable, using rule-based text");
        }
        reason
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
