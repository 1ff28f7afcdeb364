use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use log::{error, warn};

use event_scout_lib::config::{AppConfig, Credentials};
use event_scout_lib::output::{self, WriteOutcome};
use event_scout_lib::scraping;

#[derive(Parser)]
#[command(name = "event-scout", version, about = "Event calendar scraper and recommender")]
struct Cli {
    /// JSON config file; defaults to the per-user data directory.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the calendars that can be scraped.
    Sites,
    /// Scrape a calendar into a CSV file.
    Scrape {
        #[arg(long)]
        site: Option<String>,
        #[arg(long)]
        output: Option<PathBuf>,
        #[arg(long)]
        delay_ms: Option<u64>,
    },
    /// Print the first few events of a scraped CSV.
    Preview {
        #[arg(long)]
        input: Option<PathBuf>,
        #[arg(long, default_value_t = 3)]
        limit: usize,
    },
    /// Ask the language model to pick events matching the interests document.
    Recommend {
        #[arg(long)]
        events: Option<PathBuf>,
        #[arg(long)]
        interests: Option<PathBuf>,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Email a file as an attachment.
    Email {
        #[arg(long)]
        file: Option<PathBuf>,
        #[arg(long)]
        to: Option<String>,
    },
    /// Scrape, recommend, and email in one go.
    Run,
}

fn main() -> ExitCode {
    // .env may carry RUST_LOG, so load it before the logger reads the environment.
    let dotenv = dotenv::dotenv();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    if let Err(err) = dotenv {
        log::debug!("no .env loaded: {err}");
    }

    let cli = Cli::parse();
    match execute(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

fn execute(cli: Cli) -> anyhow::Result<()> {
    let mut config = AppConfig::load(cli.config.as_deref()).context("unable to load config")?;
    let credentials = Credentials::from_env();

    match cli.command {
        Commands::Sites => {
            for site in scraping::list_sites() {
                println!("{}\t{}\t{}\t{}", site.id, site.name, site.url, site.default_output);
            }
        }
        Commands::Scrape {
            site,
            output,
            delay_ms,
        } => {
            if let Some(site) = site {
                config.site = site;
            }
            if let Some(delay_ms) = delay_ms {
                config.page_delay_ms = delay_ms;
            }
            let site = event_scout_lib::resolve_site(&config.site)?;
            let output =
                output.unwrap_or_else(|| event_scout_lib::events_path(&config, site.as_ref()));
            let harvest = event_scout_lib::scrape(&config, site.as_ref(), &output)?;
            match harvest.outcome {
                WriteOutcome::Written(count) => {
                    println!("saved {count} events to {}", output.display())
                }
                WriteOutcome::Empty => warn!("no events found; nothing written"),
            }
        }
        Commands::Preview { input, limit } => {
            let input = match input {
                Some(path) => path,
                None => default_events_path(&config)?,
            };
            let events = output::read_events(&input)
                .with_context(|| format!("unable to read {}", input.display()))?;
            println!("{} events in {}", events.len(), input.display());
            for (i, event) in events.iter().take(limit).enumerate() {
                println!("\nEvent {}:", i + 1);
                println!("  Title: {}", event.title);
                println!("  Dates: {} to {}", event.start_date, event.end_date);
                println!("  Time: {} - {}", event.start_time, event.end_time);
                println!("  Location: {}", event.location);
                println!("  Link: {}", event.link);
            }
        }
        Commands::Recommend {
            events,
            interests,
            output,
        } => {
            let events = match events {
                Some(path) => path,
                None => default_events_path(&config)?,
            };
            let interests = interests.unwrap_or_else(|| config.interests_file.clone());
            let output = output.unwrap_or_else(|| config.recommendations_file.clone());
            let text =
                event_scout_lib::recommend(&config, &credentials, &events, &interests, &output)?;
            println!("{text}");
        }
        Commands::Email { file, to } => {
            let file = file.unwrap_or_else(|| config.recommendations_file.clone());
            event_scout_lib::email(&config, &credentials, &file, to.as_deref())?;
        }
        Commands::Run => event_scout_lib::run(&config, &credentials)?,
    }

    Ok(())
}

fn default_events_path(config: &AppConfig) -> anyhow::Result<PathBuf> {
    let site = event_scout_lib::resolve_site(&config.site)?;
    Ok(event_scout_lib::events_path(config, site.as_ref()))
}
