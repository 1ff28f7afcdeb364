use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use super::base;
use super::{EventSite, ParseError};
use crate::collector::EventExtractor;
use crate::models::{EventRecord, PageListing};

const URL: &str = "https://www.babson.edu/about/events/";
const SITE_ID: &str = "babson";
const SITE_NAME: &str = "Babson College Events";
const DEFAULT_OUTPUT: &str = "babson_events.csv";
const ALL_CATEGORIES_QUERY: &str = "search=all&categories%5B%5D=All";

static ENTRY_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("li.event-item").expect("babson entry selector"));
static TITLE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("p.title").expect("babson title"));
static DATE_STAMP_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div.date-stamp").expect("babson date stamp"));
static MONTH_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div.month").expect("babson month"));
static DAY_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div.day").expect("babson day"));
static YEAR_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div.year").expect("babson year"));
static TIME_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("span.datelisting").expect("babson time"));
static LOCATION_ICON_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("span.fa-map-marker").expect("babson location icon"));
static LINK_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a.find-out-more").expect("babson link"));
static PAGINATION_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("ul.pagination").expect("babson pagination"));
static PAGINATION_LINK_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a").expect("babson pagination link"));
// Matches the calendar's "Next Page ›" control.
static NEXT_PAGE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)page\s*›|next\s+page").expect("next page regex"));

pub struct Babson;

impl EventSite for Babson {
    fn site_id(&self) -> &'static str {
        SITE_ID
    }

    fn site_name(&self) -> &'static str {
        SITE_NAME
    }

    fn listing_url(&self) -> &'static str {
        URL
    }

    fn default_output(&self) -> &'static str {
        DEFAULT_OUTPUT
    }

    fn page_url(&self, base: &str, page: u32) -> String {
        let mut url = format!("{base}?{ALL_CATEGORIES_QUERY}");
        if page > 1 {
            url.push_str(&format!("&page={page}"));
        }
        url
    }
}

impl EventExtractor for Babson {
    fn extract(&self, page: u32, markup: &str) -> Result<PageListing, ParseError> {
        if markup.trim().is_empty() {
            return Err(ParseError {
                page,
                reason: "empty document".to_string(),
            });
        }

        let document = Html::parse_document(markup);
        let records: Vec<EventRecord> =
            document.select(&ENTRY_SELECTOR).map(parse_entry).collect();
        if records.is_empty() {
            return Ok(PageListing::end_of_listing());
        }

        Ok(PageListing {
            records,
            has_next: has_next_page(&document),
        })
    }
}

fn parse_entry(entry: ElementRef<'_>) -> EventRecord {
    EventRecord::from_parts(
        base::first_text(&entry, &TITLE_SELECTOR),
        extract_dates(&entry),
        extract_times(&entry),
        extract_location(&entry),
        base::first_attr(&entry, &LINK_SELECTOR, "href"),
    )
}

fn extract_dates(entry: &ElementRef<'_>) -> (Option<String>, Option<String>) {
    let stamps: Vec<String> = entry.select(&DATE_STAMP_SELECTOR).map(format_date).collect();
    match stamps.as_slice() {
        [] => (None, None),
        [single] => (Some(single.clone()), Some(single.clone())),
        [start, end, ..] => (Some(start.clone()), Some(end.clone())),
    }
}

/// Formats a date stamp as "Nov 15, 2025"; absent parts are left blank.
fn format_date(stamp: ElementRef<'_>) -> String {
    let part = |selector: &Selector| base::first_text(&stamp, selector).unwrap_or_default();
    format_date_parts(&part(&MONTH_SELECTOR), &part(&DAY_SELECTOR), &part(&YEAR_SELECTOR))
}

pub(crate) fn format_date_parts(month: &str, day: &str, year: &str) -> String {
    format!("{month} {day}, {year}").trim().to_string()
}

fn extract_times(entry: &ElementRef<'_>) -> (Option<String>, Option<String>) {
    let mut times = base::all_texts(entry, &TIME_SELECTOR).into_iter();
    (times.next(), times.next())
}

fn extract_location(entry: &ElementRef<'_>) -> Option<String> {
    let icon = entry.select(&LOCATION_ICON_SELECTOR).next()?;
    base::next_sibling_text(icon)
}

fn has_next_page(document: &Html) -> bool {
    let Some(pagination) = document.select(&PAGINATION_SELECTOR).next() else {
        return false;
    };
    pagination.select(&PAGINATION_LINK_SELECTOR).any(|link| {
        link.value()
            .attr("title")
            .is_some_and(|title| NEXT_PAGE_RE.is_match(title))
    })
}
