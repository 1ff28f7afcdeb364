use std::time::Duration;

use log::debug;
use reqwest::blocking::Client;
use scraper::node::Node;
use scraper::{ElementRef, Selector};

use super::{EventSite, FetchError};
use crate::collector::PageFetcher;

/// Some calendars refuse obvious bots, so we identify as a desktop browser.
pub const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

pub fn clean_text(input: &str) -> String {
    input
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .trim()
        .to_string()
}

pub fn inner_text(element: ElementRef<'_>) -> String {
    clean_text(&element.text().collect::<Vec<_>>().join(" "))
}

/// Text of the first match; a present but empty element yields `Some("")`.
pub fn first_text(element: &ElementRef<'_>, selector: &Selector) -> Option<String> {
    element.select(selector).next().map(inner_text)
}

/// Text of every match in document order; empty matches are kept so positions line up.
pub fn all_texts(element: &ElementRef<'_>, selector: &Selector) -> Vec<String> {
    element.select(selector).map(inner_text).collect()
}

pub fn first_attr(element: &ElementRef<'_>, selector: &Selector, attr: &str) -> Option<String> {
    element
        .select(selector)
        .next()
        .and_then(|el| el.value().attr(attr))
        .map(str::to_string)
}

/// Text of the node right after `element` among its siblings, whether that is a bare
/// text node, a comment or another element.
pub fn next_sibling_text(element: ElementRef<'_>) -> Option<String> {
    let sibling = element.next_sibling()?;
    match sibling.value() {
        Node::Text(text) => Some(clean_text(text)),
        Node::Comment(comment) => Some(clean_text(comment)),
        Node::Element(_) => ElementRef::wrap(sibling).map(inner_text),
        _ => None,
    }
}

pub fn build_client() -> reqwest::Result<Client> {
    Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .user_agent(BROWSER_USER_AGENT)
        .build()
}

pub fn fetch_html(client: &Client, url: &str, page: u32) -> Result<String, FetchError> {
    let response = client
        .get(url)
        .send()
        .map_err(|source| FetchError::Transport { page, source })?;
    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status { page, status });
    }
    response
        .text()
        .map_err(|source| FetchError::Transport { page, source })
}

/// Fetches listing pages of one site over HTTP.
pub struct SitePageFetcher<'a> {
    site: &'a dyn EventSite,
    base_url: String,
    client: Client,
}

impl<'a> SitePageFetcher<'a> {
    pub fn new(site: &'a dyn EventSite) -> reqwest::Result<Self> {
        Self::with_base_url(site, site.listing_url())
    }

    pub fn with_base_url(site: &'a dyn EventSite, base_url: &str) -> reqwest::Result<Self> {
        Ok(Self {
            site,
            base_url: base_url.to_string(),
            client: build_client()?,
        })
    }
}

impl PageFetcher for SitePageFetcher<'_> {
    fn fetch(&self, page: u32) -> Result<String, FetchError> {
        let url = self.site.page_url(&self.base_url, page);
        debug!("GET {url}");
        fetch_html(&self.client, &url, page)
    }
}
