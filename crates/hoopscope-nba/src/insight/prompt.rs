// Prompt templates for player, team and league commentary and hot takes.
//
// Every prompt carries the pre-computed numbers so the model comments on
// them instead of doing arithmetic. Prompts are pure functions of their
// context: the same context always yields the same text.

use super::context::{InsightContext, LeagueContext, TeamContext};

/// Three-decimal shooting percentage, or `n/a` when the source had none.
pub(crate) fn fmt_pct(p: Option<f64>) -> String {
    match p {
        Some(v) => format!("{v:.3}"),
        None => "n/a".to_string(),
    }
}

// ---------------------------------------------------------------------------
// Player
// ---------------------------------------------------------------------------

pub fn player_prompt(ctx: &InsightContext) -> String {
    let r = &ctx.record;
    let team = if r.team.is_empty() { "Unknown" } else { r.team.as_str() };
    let mut prompt = String::with_capacity(1024);

    prompt.push_str("Analyze this NBA player's performance and provide insights.\n\n");

    prompt.push_str(&format!(
        "## PLAYER\n\
         Player: {} | Team: {} | Season: {}\n\
         Games: {:.0} | Minutes: {:.1} per game\n\n",
        r.name, team, r.season, r.games_played, r.minutes,
    ));

    prompt.push_str(&format!(
        "## PER GAME\n\
         Points: {:.1} | Rebounds: {:.1} | Assists: {:.1}\n\
         Steals: {:.1} | Blocks: {:.1} | Turnovers: {:.1}\n\
         FG%: {} | 3P%: {} | FT%: {}\n\n",
        r.points,
        r.rebounds,
        r.assists,
        r.steals,
        r.blocks,
        r.turnovers,
        fmt_pct(r.fg_pct),
        fmt_pct(r.fg3_pct),
        fmt_pct(r.ft_pct),
    ));

    prompt.push_str(&format!(
        "## SCORES\n\
         Offensive: {:.2} ({})\n\
         Defensive: {:.2} ({})\n\
         Overall: {:.2} ({})\n\n",
        ctx.scores.offensive,
        ctx.ratings.offensive.label,
        ctx.scores.defensive,
        ctx.ratings.defensive.label,
        ctx.scores.overall,
        ctx.ratings.overall.label,
    ));

    prompt.push_str(
        "## TASK\n\
         In 3-5 sentences cover strengths and weaknesses, efficiency, and role.\n\
         Use only the numbers above. Write in a professional but engaging tone.\n",
    );
    prompt
}

// ---------------------------------------------------------------------------
// Team
// ---------------------------------------------------------------------------

pub fn team_prompt(ctx: &TeamContext) -> String {
    let a = &ctx.averages;
    let mut prompt = String::with_capacity(1024);

    prompt.push_str("Analyze this NBA team's performance.\n\n");
    prompt.push_str(&format!(
        "## TEAM\n\
         Team: {} | Players: {}\n\
         Average Points: {:.1} | Rebounds: {:.1} | Assists: {:.1}\n\
         Average FG%: {} | 3P%: {} | FT%: {}\n\
         Mean offensive score: {:.2} | Mean defensive score: {:.2}\n\n",
        ctx.team,
        a.players,
        a.points,
        a.rebounds,
        a.assists,
        fmt_pct(a.fg_pct),
        fmt_pct(a.fg3_pct),
        fmt_pct(a.ft_pct),
        a.offensive_score,
        a.defensive_score,
    ));

    if !ctx.key_players.is_empty() {
        prompt.push_str("## KEY PLAYERS (overall score)\n");
        for p in &ctx.key_players {
            prompt.push_str(&format!("- {}: {:.2}\n", p.name, p.value));
        }
        prompt.push('\n');
    }

    prompt.push_str(
        "## TASK\n\
         Cover team strengths and weaknesses, playing style, key contributors,\n\
         and areas for improvement. Write in a professional tone.\n",
    );
    prompt
}

// ---------------------------------------------------------------------------
// League
// ---------------------------------------------------------------------------

pub fn league_prompt(ctx: &LeagueContext) -> String {
    let a = &ctx.averages;
    let mut prompt = String::with_capacity(1024);

    prompt.push_str("Analyze current NBA league trends based on these averages.\n\n");
    prompt.push_str(&format!(
        "## LEAGUE AVERAGES ({} players)\n\
         - Points per game: {:.1}\n\
         - Rebounds per game: {:.1}\n\
         - Assists per game: {:.1}\n\
         - Field Goal %: {}\n\
         - Three Point %: {}\n\
         - Free Throw %: {}\n\n",
        a.players,
        a.points,
        a.rebounds,
        a.assists,
        fmt_pct(a.fg_pct),
        fmt_pct(a.fg3_pct),
        fmt_pct(a.ft_pct),
    ));

    if !ctx.top_scorers.is_empty() {
        prompt.push_str("## TOP SCORERS\n");
        for p in &ctx.top_scorers {
            prompt.push_str(&format!("- {} ({}): {:.1} PPG\n", p.name, p.team, p.value));
        }
        prompt.push('\n');
    }

    prompt.push_str(
        "## TASK\n\
         Cover league trends, offensive vs defensive balance, three-point impact,\n\
         and notable statistical patterns. Write in a professional tone.\n",
    );
    prompt
}

// ---------------------------------------------------------------------------
// Hot takes
// ---------------------------------------------------------------------------

/// `summary` is the plain-text data digest from `hot_takes::data_summary`.
pub fn hot_takes_prompt(summary: &str, count: usize) -> String {
    let mut prompt = String::with_capacity(2048);

    prompt.push_str(&format!(
        "You are an NBA analyst known for controversial but data-supported hot takes.\n\
         Based on the statistics below, generate {count} hot takes that are bold,\n\
         go against popular opinion, and are backed ONLY by the numbers provided.\n\n"
    ));

    prompt.push_str("## DATA\n");
    prompt.push_str(summary);
    prompt.push_str("\n\n");

    prompt.push_str(
        "## RULES\n\
         - Only use statistics listed above; do not invent rankings or percentages.\n\
         - Quote specific numbers in every rationale.\n\n",
    );

    prompt.push_str("## FORMAT (exactly)\n");
    for i in 1..=count {
        prompt.push_str(&format!(
            "{i}. HOT TAKE: [short controversial statement, max 15 words]\n   \
             RATIONALE: [explanation citing the data]\n\n"
        ));
    }
    prompt
}
