// Rule-based narratives used when the reasoning backend is unavailable.
// Built only from the context; no I/O and no randomness.

use super::context::{InsightContext, LeagueContext, StatAverages, TeamContext};

fn pct_phrase(p: Option<f64>, what: &str) -> Option<String> {
    p.map(|v| format!("{:.1}% {what}", v * 100.0))
}

fn shooting_sentence(fg: Option<f64>, fg3: Option<f64>, ft: Option<f64>) -> String {
    let parts: Vec<String> = [
        pct_phrase(fg, "from the field"),
        pct_phrase(fg3, "from three"),
        pct_phrase(ft, "at the line"),
    ]
    .into_iter()
    .flatten()
    .collect();
    if parts.is_empty() {
        "No shooting percentages were reported.".to_string()
    } else {
        format!("Shooting: {}.", parts.join(", "))
    }
}

pub fn player_narrative(ctx: &InsightContext) -> String {
    let r = &ctx.record;
    let team = if r.team.is_empty() {
        String::new()
    } else {
        format!(" ({})", r.team)
    };

    let lean = match ctx.ratings.offensive.band.cmp(&ctx.ratings.defensive.band) {
        std::cmp::Ordering::Greater => "The value comes mainly from the offensive end.",
        std::cmp::Ordering::Less => "The value comes mainly from the defensive end.",
        std::cmp::Ordering::Equal => "Offensive and defensive impact are rated evenly.",
    };

    let mut text = format!(
        "{}{} rates {} overall (score {:.1}): {} on offense ({:.1}) and {} on defense ({:.1}). ",
        r.name,
        team,
        ctx.ratings.overall.label,
        ctx.scores.overall,
        ctx.ratings.offensive.label,
        ctx.scores.offensive,
        ctx.ratings.defensive.label,
        ctx.scores.defensive,
    );
    text.push_str(&format!(
        "Averages {:.1} points, {:.1} rebounds and {:.1} assists in {:.1} minutes over {:.0} games. ",
        r.points, r.rebounds, r.assists, r.minutes, r.games_played,
    ));
    text.push_str(&shooting_sentence(r.fg_pct, r.fg3_pct, r.ft_pct));
    text.push(' ');
    text.push_str(lean);
    text
}

fn averages_sentence(a: &StatAverages) -> String {
    format!(
        "Across {} players the averages are {:.1} points, {:.1} rebounds and {:.1} assists per game, \
         with mean offensive and defensive scores of {:.1} and {:.1}.",
        a.players, a.points, a.rebounds, a.assists, a.offensive_score, a.defensive_score,
    )
}

pub fn team_narrative(ctx: &TeamContext) -> String {
    let a = &ctx.averages;
    let mut text = format!("{}: {} ", ctx.team, averages_sentence(a));
    text.push_str(&shooting_sentence(a.fg_pct, a.fg3_pct, a.ft_pct));
    if !ctx.key_players.is_empty() {
        let names: Vec<&str> = ctx.key_players.iter().map(|p| p.name.as_str()).collect();
        text.push_str(&format!(" Leading contributors by overall score: {}.", names.join(", ")));
    }
    text
}

pub fn league_narrative(ctx: &LeagueContext) -> String {
    let a = &ctx.averages;
    let mut text = format!("League view. {} ", averages_sentence(a));
    text.push_str(&shooting_sentence(a.fg_pct, a.fg3_pct, a.ft_pct));
    if let Some(top) = ctx.top_scorers.first() {
        text.push_str(&format!(
            " Top scorer: {} ({}) at {:.1} points per game.",
            top.name, top.team, top.value
        ));
    }
    text
}
