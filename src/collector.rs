use std::thread;
use std::time::Duration;

use chrono::{DateTime, Utc};
use log::info;
use thiserror::Error;

use crate::models::{EventRecord, PageListing};
use crate::output::{WriteError, WriteOutcome};
use crate::scraping::{FetchError, ParseError};

pub const DEFAULT_PAGE_DELAY: Duration = Duration::from_secs(1);

pub trait PageFetcher {
    /// Returns the raw markup of the 1-based listing page.
    fn fetch(&self, page: u32) -> Result<String, FetchError>;
}

pub trait EventExtractor {
    fn extract(&self, page: u32, markup: &str) -> Result<PageListing, ParseError>;
}

pub trait ResultWriter {
    fn write(&self, records: &[EventRecord]) -> Result<WriteOutcome, WriteError>;
}

#[derive(Debug, Error)]
pub enum CollectError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Write(#[from] WriteError),
}

#[derive(Debug)]
pub struct Harvest {
    pub records: Vec<EventRecord>,
    pub outcome: WriteOutcome,
    pub scraped_at: DateTime<Utc>,
}

/// Walks the listing page by page until a page comes back empty or stops advertising
/// a next page. Any fetch or parse failure aborts the walk.
pub fn collect_events<F, E>(
    fetcher: &F,
    extractor: &E,
    delay: Duration,
) -> Result<Vec<EventRecord>, CollectError>
where
    F: PageFetcher + ?Sized,
    E: EventExtractor + ?Sized,
{
    let mut all_records = Vec::new();
    let mut page = 1;

    loop {
        info!("scraping page {page}");
        let markup = fetcher.fetch(page)?;
        let listing = extractor.extract(page, &markup)?;

        if listing.records.is_empty() {
            info!("no more events found on page {page}");
            break;
        }

        info!("found {} events on page {page}", listing.records.len());
        all_records.extend(listing.records);

        if !listing.has_next {
            break;
        }

        if !delay.is_zero() {
            thread::sleep(delay);
        }
        page += 1;
    }

    info!("total events scraped: {}", all_records.len());
    Ok(all_records)
}

pub fn harvest<F, E, W>(
    fetcher: &F,
    extractor: &E,
    writer: &W,
    delay: Duration,
) -> Result<Harvest, CollectError>
where
    F: PageFetcher + ?Sized,
    E: EventExtractor + ?Sized,
    W: ResultWriter + ?Sized,
{
    let scraped_at = Utc::now();
    let records = collect_events(fetcher, extractor, delay)?;
    let outcome = writer.write(&records)?;
    Ok(Harvest {
        records,
        outcome,
        scraped_at,
    })
}
