pub mod collector;
pub mod config;
pub mod llm;
pub mod mailer;
pub mod models;
pub mod output;
pub mod scraping;
mod utils;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context};
use log::{info, warn};

use collector::Harvest;
use config::{AppConfig, Credentials};
use llm::Recommender;
use mailer::Mailer;
use output::{CsvResultWriter, WriteOutcome};
use scraping::base::SitePageFetcher;
use scraping::EventSite;

pub fn resolve_site(id: &str) -> anyhow::Result<Box<dyn EventSite>> {
    scraping::find_site(id).ok_or_else(|| anyhow!("unknown site id: {id}"))
}

/// Where the events table for `site` goes unless the caller says otherwise.
pub fn events_path(config: &AppConfig, site: &dyn EventSite) -> PathBuf {
    config
        .output_file
        .clone()
        .unwrap_or_else(|| PathBuf::from(site.default_output()))
}

pub fn scrape(config: &AppConfig, site: &dyn EventSite, output: &Path) -> anyhow::Result<Harvest> {
    info!("starting to scrape {}", site.site_name());
    let fetcher = SitePageFetcher::new(site).context("unable to build http client")?;
    let writer = CsvResultWriter::new(output);
    let harvest = collector::harvest(&fetcher, site, &writer, config.page_delay())
        .with_context(|| format!("scraping {} failed", site.site_id()))?;
    info!(
        "harvest started {} finished with {} events",
        harvest.scraped_at.to_rfc3339(),
        harvest.records.len()
    );
    Ok(harvest)
}

pub fn recommend(
    config: &AppConfig,
    credentials: &Credentials,
    events: &Path,
    interests: &Path,
    output: &Path,
) -> anyhow::Result<String> {
    let recommender = Recommender::from_config(config, credentials.api_key()?)?;
    let text = recommender
        .recommend(events, interests)
        .context("recommendation request failed")?;
    fs::write(output, &text)
        .with_context(|| format!("unable to write recommendations to {}", output.display()))?;
    info!("recommendations saved to {}", output.display());
    Ok(text)
}

pub fn email(
    config: &AppConfig,
    credentials: &Credentials,
    file: &Path,
    recipient: Option<&str>,
) -> anyhow::Result<()> {
    let mailer = Mailer::from_config(
        config,
        credentials.sender_email()?,
        credentials.app_password()?,
    );
    let recipient = recipient
        .map(str::to_string)
        .or_else(|| config.recipient_email.clone())
        .unwrap_or_else(|| mailer.sender().to_string());
    mailer
        .send_file(file, &recipient)
        .with_context(|| format!("unable to email {}", file.display()))
}

/// Scrape, recommend, then mail the picks. Stops early when the calendar was empty.
pub fn run(config: &AppConfig, credentials: &Credentials) -> anyhow::Result<()> {
    let site = resolve_site(&config.site)?;
    let events = events_path(config, site.as_ref());

    let harvest = scrape(config, site.as_ref(), &events)?;
    if harvest.outcome == WriteOutcome::Empty {
        warn!("no events scraped; skipping recommendations");
        return Ok(());
    }

    let text = recommend(
        config,
        credentials,
        &events,
        &config.interests_file,
        &config.recommendations_file,
    )?;
    println!("{text}");

    email(config, credentials, &config.recommendations_file, None)
}
