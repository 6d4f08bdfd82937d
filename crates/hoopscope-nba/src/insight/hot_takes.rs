// Hot takes: short contrarian claims, each backed by a rationale from the
// data. Model output is parsed into claim/rationale pairs; rule-based takes
// fill any shortfall.

use serde::Serialize;

use hoopscope_core::config::ScoringConfig;
use hoopscope_core::CanonicalRecord;

use crate::leaders::{leaders, Stat};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HotTake {
    pub claim: String,
    pub rationale: String,
}

/// Plain-text digest of `records` given to the model as its only data.
pub fn data_summary(records: &[CanonicalRecord], weights: &ScoringConfig) -> String {
    let mut lines = vec![format!("Total players: {}", records.len())];

    lines.push("Top 5 scorers:".to_string());
    for e in leaders(records, Stat::Points, 5, weights) {
        lines.push(format!("- {} ({}): {:.1} PPG", e.name, e.team, e.value));
    }
    lines.push("Top 5 assist leaders:".to_string());
    for e in leaders(records, Stat::Assists, 5, weights) {
        lines.push(format!("- {} ({}): {:.1} APG", e.name, e.team, e.value));
    }

    let fg: Vec<f64> = records.iter().filter_map(|r| r.fg_pct).collect();
    let fg3: Vec<f64> = records.iter().filter_map(|r| r.fg3_pct).collect();
    for (label, values) in [("FG%", fg), ("3P%", fg3)] {
        if !values.is_empty() {
            let mean = values.iter().sum::<f64>() / values.len() as f64;
            lines.push(format!("League average {label}: {mean:.3}"));
        }
    }
    lines.join("\n")
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Extract `HOT TAKE:` / `RATIONALE:` pairs. A numbered line (`3.` or
/// `3. HOT TAKE: ...`) starts a new take; lines after a rationale continue
/// it. Incomplete takes are dropped.
pub fn parse_hot_takes(text: &str) -> Vec<HotTake> {
    let mut takes = Vec::new();
    let mut claim: Option<String> = None;
    let mut rationale: Option<String> = None;

    let mut flush = |claim: &mut Option<String>, rationale: &mut Option<String>| {
        if let (Some(c), Some(r)) = (claim.take(), rationale.take()) {
            if !c.is_empty() && !r.is_empty() {
                takes.push(HotTake {
                    claim: c,
                    rationale: r,
                });
            }
        }
    };

    for raw in text.lines() {
        let mut line = raw.trim().trim_start_matches(['*', '-', ' ']).trim();

        if let Some(rest) = strip_number(line) {
            flush(&mut claim, &mut rationale);
            line = rest;
            if line.is_empty() {
                continue;
            }
        }

        let line = line.replace("**", "");
        let line = line.trim();
        if let Some(rest) = strip_label(line, "HOT TAKE:") {
            if claim.is_some() {
                flush(&mut claim, &mut rationale);
            }
            claim = Some(rest.to_string());
        } else if let Some(rest) = strip_label(line, "RATIONALE:") {
            rationale = Some(rest.to_string());
        } else if let Some(r) = rationale.as_mut() {
            if !line.is_empty() {
                if !r.is_empty() {
                    r.push(' ');
                }
                r.push_str(line);
            }
        }
    }
    flush(&mut claim, &mut rationale);
    takes
}

/// `"12. rest"` -> `Some("rest")`.
fn strip_number(line: &str) -> Option<&str> {
    let digits = line.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }
    let rest = line[digits..].strip_prefix('.')?;
    (rest.is_empty() || rest.starts_with(char::is_whitespace)).then(|| rest.trim())
}

fn strip_label<'a>(line: &'a str, label: &str) -> Option<&'a str> {
    let head = line.get(..label.len())?;
    head.eq_ignore_ascii_case(label)
        .then(|| line[label.len()..].trim())
}

// ---------------------------------------------------------------------------
// Rule-based takes
// ---------------------------------------------------------------------------

/// Up to `count` takes derived from the leaders in `records`. Templates with
/// no supporting data are skipped, so fewer may come back.
pub fn rule_based_hot_takes(
    records: &[CanonicalRecord],
    count: usize,
    weights: &ScoringConfig,
) -> Vec<HotTake> {
    let top = |stat: Stat| {
        leaders(records, stat, 1, weights)
            .into_iter()
            .next()
            .and_then(|first| {
                records
                    .iter()
                    .find(|r| r.name == first.name && r.team == first.team)
            })
    };
    let pct = |p: Option<f64>| p.map_or_else(|| "n/a".to_string(), |v| format!("{v:.3}"));

    let mut takes = Vec::new();

    if let Some(r) = top(Stat::Points) {
        takes.push(HotTake {
            claim: format!("{} is overrated as a scorer", r.name),
            rationale: format!(
                "Despite averaging {:.1} PPG, {} shoots only {} from the field, \
                 so the volume comes with a real efficiency cost.",
                r.points,
                r.name,
                pct(r.fg_pct)
            ),
        });
    }
    if let Some(r) = top(Stat::Assists) {
        takes.push(HotTake {
            claim: format!("{} is the best playmaker in the league", r.name),
            rationale: format!(
                "{} leads with {:.1} assists per game while shooting {} from the field.",
                r.name,
                r.assists,
                pct(r.fg_pct)
            ),
        });
    }
    if let Some(r) = top(Stat::Rebounds) {
        takes.push(HotTake {
            claim: format!("{} is underappreciated", r.name),
            rationale: format!(
                "{} averages {:.1} rebounds with {:.1} PPG, a complete line that \
                 rarely gets the same attention as the top scorers.",
                r.name, r.rebounds, r.points
            ),
        });
    }
    if let Some(r) = top(Stat::Efficiency) {
        takes.push(HotTake {
            claim: format!("{} is the most efficient player", r.name),
            rationale: format!(
                "An efficiency of {:.1} (points, boards, assists, steals and blocks \
                 net of turnovers) is the best in the data.",
                r.efficiency()
            ),
        });
    }

    let volume: Vec<&CanonicalRecord> = records.iter().filter(|r| r.points > 25.0).collect();
    let volume_fg: Vec<f64> = volume.iter().filter_map(|r| r.fg_pct).collect();
    let rest_fg: Vec<f64> = records
        .iter()
        .filter(|r| r.points <= 25.0)
        .filter_map(|r| r.fg_pct)
        .collect();
    if !volume_fg.is_empty() && !rest_fg.is_empty() {
        let mean = |v: &[f64]| v.iter().sum::<f64>() / v.len() as f64;
        takes.push(HotTake {
            claim: "High-volume scorers are hurting their teams".to_string(),
            rationale: format!(
                "Players averaging over 25 PPG ({} of them) shoot {:.3} from the field \
                 against {:.3} for everyone else.",
                volume.len(),
                mean(&volume_fg),
                mean(&rest_fg)
            ),
        });
    }

    if let Some(r) = top(Stat::Defensive) {
        takes.push(HotTake {
            claim: format!("{} is the best defender nobody talks about", r.name),
            rationale: format!(
                "{:.1} steals, {:.1} blocks and {:.1} defensive rebounds a night \
                 add up to the top defensive score in the data.",
                r.steals, r.blocks, r.defensive_rebounds
            ),
        });
    }

    takes.truncate(count);
    takes
}

#[cfg(test)]
mod tests {
    use super::*;
    use hoopscope_core::Season;

    fn rec(name: &str, pts: f64, ast: f64, reb: f64, fg: f64) -> CanonicalRecord {
        let mut r = CanonicalRecord::empty(name, "BOS", Season::new(2023));
        r.minutes = 32.0;
        r.points = pts;
        r.assists = ast;
        r.rebounds = reb;
        r.defensive_rebounds = reb * 0.7;
        r.fg_pct = Some(fg);
        r
    }

    fn sample() -> Vec<CanonicalRecord> {
        vec![
            rec("Scorer", 30.0, 4.0, 5.0, 0.45),
            rec("Passer", 18.0, 11.0, 4.0, 0.49),
            rec("Big", 15.0, 2.0, 13.0, 0.60),
        ]
    }

    #[test]
    fn parses_numbered_takes_with_continuations() {
        let text = "\
Here are your takes:

1. HOT TAKE: Scorer is a fraud
   RATIONALE: 30 PPG on 45% shooting.
   That is a lot of missed shots.

2. **HOT TAKE:** Big is the MVP
   **RATIONALE:** 13 rebounds.

3. HOT TAKE: this one has no rationale
";
        let takes = parse_hot_takes(text);
        assert_eq!(takes.len(), 2);
        assert_eq!(takes[0].claim, "Scorer is a fraud");
        assert_eq!(
            takes[0].rationale,
            "30 PPG on 45% shooting. That is a lot of missed shots."
        );
        assert_eq!(takes[1].claim, "Big is the MVP");
        assert_eq!(takes[1].rationale, "13 rebounds.");
    }

    #[test]
    fn inline_numbered_take_is_parsed() {
        let takes = parse_hot_takes("1. HOT TAKE: A\nRATIONALE: B\n2. HOT TAKE: C\nRATIONALE: D");
        assert_eq!(takes.len(), 2);
        assert_eq!(takes[1].claim, "C");
    }

    #[test]
    fn free_text_yields_nothing() {
        assert!(parse_hot_takes("The league is great this year.").is_empty());
    }

    #[test]
    fn rule_based_takes_use_leaders() {
        let takes = rule_based_hot_takes(&sample(), 10, &ScoringConfig::default());
        assert_eq!(takes[0].claim, "Scorer is overrated as a scorer");
        assert_eq!(takes[1].claim, "Passer is the best playmaker in the league");
        assert_eq!(takes[2].claim, "Big is underappreciated");
        assert!(takes.iter().any(|t| t.claim.starts_with("High-volume")));
        assert_eq!(takes.len(), 6);
    }

    #[test]
    fn rule_based_takes_respect_count_and_empty_data() {
        assert_eq!(rule_based_hot_takes(&sample(), 2, &ScoringConfig::default()).len(), 2);
        assert!(rule_based_hot_takes(&[], 5, &ScoringConfig::default()).is_empty());
    }

    #[test]
    fn summary_lists_leaders_and_averages() {
        let s = data_summary(&sample(), &ScoringConfig::default());
        assert!(s.starts_with("Total players: 3"));
        assert!(s.contains("- Scorer (BOS): 30.0 PPG"));
        assert!(s.contains("- Passer (BOS): 11.0 APG"));
        assert!(s.contains("League average FG%: 0.513"));
        assert!(!s.contains("3P%"));
    }
}
