// hoopscope entry point.
//
// Startup sequence:
// 1. Initialize tracing (stderr, so stdout carries command output)
// 2. Load config
// 3. Build the aggregator and restore any persisted snapshot
// 4. Build the reasoning backend and analyzer
// 5. Run the requested command

mod commands;

use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;

use hoopscope_core::config;
use hoopscope_core::{Scope, Season};
use hoopscope_llm::LlmClient;
use hoopscope_nba::leaders::Stat;
use hoopscope_nba::{Aggregator, Analyzer};

use crate::commands::{App, Output};

/// NBA player statistics: multi-source collection, scoring and commentary
#[derive(Parser, Debug)]
#[command(name = "hoopscope", version)]
struct Cli {
    /// Use only the synthetic sample source (no network)
    #[arg(long, env = "HOOPSCOPE_SYNTHETIC_ONLY")]
    synthetic_only: bool,

    /// Print JSON instead of plain text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Collect a fresh snapshot, falling back through the configured sources
    Collect {
        /// league, team:<code> or player:<name>
        #[arg(long, default_value = "league")]
        scope: Scope,

        /// Season such as 2023-24 (defaults to the configured season)
        #[arg(long)]
        season: Option<Season>,
    },

    /// List players in the current snapshot
    Players {
        /// Only players on this team
        #[arg(long)]
        team: Option<String>,

        /// Stat to sort by: pts, reb, ast, stl, blk, fg, fg3, ft, eff, off, def, overall
        #[arg(long, default_value = "pts")]
        sort: Stat,

        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// Stats, scores and ratings for one player
    Lookup {
        /// Full or partial player name
        name: String,

        /// Skip the narrative
        #[arg(long)]
        brief: bool,
    },

    /// Commentary for a player, team or the whole league
    Analyze {
        /// league, team:<code> or player:<name>
        #[arg(default_value = "league")]
        scope: Scope,
    },

    /// Contrarian, data-backed hot takes
    HotTakes {
        #[arg(short, long, default_value = "5")]
        count: usize,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // 1. Initialize tracing
    init_tracing()?;

    // 2. Load config
    let mut config = config::load_config().context("failed to load configuration")?;
    if cli.synthetic_only {
        config.sources.use_synthetic_only = true;
    }
    info!(
        season = %config.sources.season,
        order = ?config.sources.effective_order(),
        "config loaded"
    );

    // 3. Aggregator + persisted snapshot
    let aggregator = Aggregator::from_config(&config);
    match aggregator.load_persisted() {
        Ok(Some(snap)) => info!(records = snap.len(), source = %snap.source, "using persisted snapshot"),
        Ok(None) => info!(path = %aggregator.store().path().display(), "no persisted snapshot yet"),
        Err(e) => tracing::warn!(error = %e, "ignoring unreadable snapshot"),
    }

    // 4. Backend + analyzer
    let llm_client = LlmClient::from_config(&config.backend);
    match &llm_client {
        LlmClient::Active(_) => info!(model = %config.backend.model, "reasoning backend enabled"),
        LlmClient::Disabled => info!("reasoning backend disabled, narratives are rule-based"),
    }
    let analyzer = Analyzer::from_config(&config, Arc::new(llm_client))
        .context("invalid rating bands")?;

    let app = App::new(config, aggregator, analyzer);
    let output = if cli.json { Output::Json } else { Output::Text };

    // 5. Run
    let rendered = match cli.command {
        Commands::Collect { scope, season } => app.collect(&scope, season, output).await?,
        Commands::Players { team, sort, limit } => {
            app.players(team.as_deref(), sort, limit, output).await?
        }
        Commands::Lookup { name, brief } => app.lookup(&name, brief, output).await?,
        Commands::Analyze { scope } => app.analyze(&scope, output).await?,
        Commands::HotTakes { count } => app.hot_takes(count, output).await?,
    };
    println!("{rendered}");
    Ok(())
}

fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("hoopscope=info,warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
