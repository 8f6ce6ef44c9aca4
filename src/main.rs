use clap::{Parser, Subcommand};
use std::process;
use tracing_subscriber::EnvFilter;
use tvdb2::{
    Client, ClientConfig, Episode, EpisodeField, EpisodeIndex, Field, Params, Series,
    SeriesField, TvdbError, params,
};

/// Query the TVDB catalog from the command line
#[derive(Parser)]
#[command(name = "tvdb2", version, about)]
struct Cli {
    /// TVDB API key
    #[arg(long, env = "TVDB_API_KEY", hide_env_values = true)]
    api_key: String,

    /// Language to request data in (e.g. "en", "it")
    #[arg(long, short, env = "TVDB_LANGUAGE", global = true)]
    language: Option<String>,

    /// API base URL
    #[arg(long, default_value = tvdb2::DEFAULT_BASE_URL, hide = true)]
    base_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Search series by name
    Search { name: String },
    /// Show the full record of the best matching series
    Best { name: String },
    /// Show the full record of a series
    Series { id: u64 },
    /// List the episodes of a series
    Episodes {
        series_id: u64,
        /// Only episodes of this aired season
        #[arg(long)]
        season: Option<u32>,
        /// Only this page of 100 episodes, in listing order
        #[arg(long)]
        page: Option<u32>,
    },
    /// Show one episode, by absolute number or as SxE (e.g. 3x9)
    Episode { series_id: u64, index: EpisodeIndex },
    /// List the languages the API can answer in
    Languages,
}

fn print_series(client: &Client, series: &Series) -> Result<(), TvdbError> {
    println!("Series #{}", series.id());
    for field in SeriesField::all() {
        if let Some(value) = series.get(client, field)? {
            println!("  {}: {}", field.json_key(), value);
        }
    }
    Ok(())
}

fn print_episode(client: &Client, episode: &Episode) -> Result<(), TvdbError> {
    println!("Episode #{} ({})", episode.id(), episode.x(client)?);
    for field in EpisodeField::all() {
        if let Some(value) = episode.get(client, field)? {
            println!("  {}: {}", field.json_key(), value);
        }
    }
    Ok(())
}

fn run(cli: Cli) -> Result<(), TvdbError> {
    let mut config = ClientConfig::new(cli.api_key).with_base_url(cli.base_url);
    if let Some(language) = cli.language {
        config = config.with_language(language);
    }
    let client = Client::login(&config)?;

    match cli.command {
        Command::Search { name } => {
            let results = client.search_by_name(&name)?;
            if results.is_empty() {
                println!("No series found for '{}'.", name);
            }
            for series in &results {
                println!(
                    "{:>8}  {}  ({})",
                    series.id(),
                    series.name(&client)?.unwrap_or_default(),
                    series.first_aired(&client)?.unwrap_or_default()
                );
            }
        }
        Command::Best { name } => match client.best_search(&name)? {
            Some(series) => print_series(&client, &series)?,
            None => println!("No series found for '{}'.", name),
        },
        Command::Series { id } => match client.series(id)? {
            Some(series) => print_series(&client, &series)?,
            None => println!("Series {} not found.", id),
        },
        Command::Episodes {
            series_id,
            season,
            page,
        } => {
            let mut filter = Params::new();
            if let Some(season) = season {
                filter.extend(params([("airedSeason", season)]));
            }
            if let Some(page) = page {
                filter.extend(params([("page", page)]));
            }
            for episode in client.list_episodes(series_id, &filter)? {
                println!(
                    "{:>6}  {}  {}",
                    episode.x(&client)?,
                    episode.first_aired(&client)?.unwrap_or_default(),
                    episode.name(&client)?.unwrap_or_default()
                );
            }
        }
        Command::Episode { series_id, index } => {
            let series = client.series(series_id)?;
            let episode = match series {
                Some(series) => series.episode_at(&client, index)?,
                None => None,
            };
            match episode {
                Some(episode) => print_episode(&client, &episode)?,
                None => println!("Episode {} not found.", index),
            }
        }
        Command::Languages => {
            for language in client.languages()? {
                println!(
                    "{:>4}  {}",
                    language.get_str("abbreviation").unwrap_or_default(),
                    language.get_str("englishName").unwrap_or_default()
                );
            }
        }
    }
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(Cli::parse()) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
