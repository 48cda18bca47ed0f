//! Command-line front end for the pitchside library.
//!
//! Thin demo consumer: parses a query, runs it through the resilient
//! client, prints the JSON result. Not a server — the library is the
//! product.

use anyhow::Result;
use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use tracing_subscriber::EnvFilter;

use pitchside::{FixturesQuery, FootballClient, PlayersQuery, Settings, TeamsQuery};

#[derive(Parser)]
#[command(
    name = "pitchside",
    version,
    about = "Query the API-Football upstream with caching and rate limiting"
)]
struct Cli {
    /// Print rate limiter and cache statistics to stderr after the query.
    #[arg(long, global = true)]
    stats: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List leagues, optionally filtered by country and season.
    Leagues {
        #[arg(long)]
        country: Option<String>,
        #[arg(long)]
        season: Option<u32>,
    },
    /// Fetch a team by id.
    Team { id: u32 },
    /// Search teams by name.
    Teams {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        country: Option<String>,
        #[arg(long)]
        league: Option<u32>,
        #[arg(long)]
        season: Option<u32>,
    },
    /// List fixtures matching the given filters.
    Fixtures {
        #[arg(long)]
        league: Option<u32>,
        #[arg(long)]
        season: Option<u32>,
        #[arg(long)]
        team: Option<u32>,
        /// Specific day, YYYY-MM-DD.
        #[arg(long)]
        date: Option<String>,
        /// N most recent fixtures of a team.
        #[arg(long)]
        last: Option<u32>,
        /// N upcoming fixtures of a team.
        #[arg(long)]
        next: Option<u32>,
    },
    /// League table for a season.
    Standings {
        league: u32,
        season: u32,
        #[arg(long)]
        team: Option<u32>,
    },
    /// Player records for a team or league season.
    Players {
        #[arg(long)]
        team: Option<u32>,
        #[arg(long)]
        league: Option<u32>,
        #[arg(long)]
        season: Option<u32>,
    },
    /// Top goal scorers for a league season.
    TopScorers { league: u32, season: u32 },
    /// Upstream prediction for a fixture.
    Predictions { fixture: u32 },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("pitchside=info")),
        )
        .init();

    let cli = Cli::parse();
    let settings = Settings::from_env()?;
    let client = FootballClient::new(settings)?;

    let result: Value = match cli.command {
        Command::Leagues { country, season } => {
            json!(client.leagues(country.as_deref(), season).await?)
        }
        Command::Team { id } => client.team(id).await?.unwrap_or(Value::Null),
        Command::Teams {
            name,
            country,
            league,
            season,
        } => json!(
            client
                .search_teams(TeamsQuery {
                    name,
                    country,
                    league,
                    season,
                })
                .await?
        ),
        Command::Fixtures {
            league,
            season,
            team,
            date,
            last,
            next,
        } => json!(
            client
                .fixtures(FixturesQuery {
                    league,
                    season,
                    team,
                    date,
                    last,
                    next,
                    ..Default::default()
                })
                .await?
        ),
        Command::Standings {
            league,
            season,
            team,
        } => json!(client.standings(league, season, team).await?),
        Command::Players {
            team,
            league,
            season,
        } => json!(
            client
                .players(PlayersQuery {
                    team,
                    league,
                    season,
                    id: None,
                })
                .await?
        ),
        Command::TopScorers { league, season } => {
            json!(client.top_scorers(league, season).await?)
        }
        Command::Predictions { fixture } => {
            client.predictions(fixture).await?.unwrap_or(Value::Null)
        }
    };

    println!("{}", serde_json::to_string_pretty(&result)?);

    if cli.stats {
        eprintln!(
            "rate limiter: {}",
            serde_json::to_string(&client.rate_limiter_stats())?
        );
        eprintln!("cache: {}", serde_json::to_string(&client.cache_stats())?);
    }

    Ok(())
}
