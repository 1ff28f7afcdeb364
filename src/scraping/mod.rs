pub mod babson_html;
pub mod base;

use reqwest::StatusCode;
use thiserror::Error;

use crate::collector::EventExtractor;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request for page {page} failed: {source}")]
    Transport {
        page: u32,
        #[source]
        source: reqwest::Error,
    },
    #[error("page {page} returned HTTP {status}")]
    Status { page: u32, status: StatusCode },
}

impl FetchError {
    pub fn page(&self) -> u32 {
        match self {
            FetchError::Transport { page, .. } | FetchError::Status { page, .. } => *page,
        }
    }
}

#[derive(Debug, Error)]
#[error("unable to parse page {page}: {reason}")]
pub struct ParseError {
    pub page: u32,
    pub reason: String,
}

/// An events calendar we know how to page through and read.
pub trait EventSite: EventExtractor + Send + Sync {
    fn site_id(&self) -> &'static str;
    fn site_name(&self) -> &'static str;
    fn listing_url(&self) -> &'static str;
    fn default_output(&self) -> &'static str;
    fn page_url(&self, base: &str, page: u32) -> String;
}

#[derive(Clone, Debug, serde::Serialize)]
pub struct SiteInfo {
    pub id: String,
    pub name: String,
    pub url: String,
    pub default_output: String,
}

fn active_sites() -> Vec<Box<dyn EventSite>> {
    vec![Box::new(babson_html::Babson)]
}

pub fn list_sites() -> Vec<SiteInfo> {
    active_sites()
        .into_iter()
        .map(|site| SiteInfo {
            id: site.site_id().to_string(),
            name: site.site_name().to_string(),
            url: site.listing_url().to_string(),
            default_output: site.default_output().to_string(),
        })
        .collect()
}

pub fn find_site(id: &str) -> Option<Box<dyn EventSite>> {
    for site in active_sites() {
        if site.site_id() == id {
            return Some(site);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_knows_babson() {
        let sites = list_sites();
        assert_eq!(sites.len(), 1);
        assert_eq!(sites[0].id, "babson");
        assert_eq!(sites[0].default_output, "babson_events.csv");

        let site = find_site("babson").expect("babson registered");
        assert_eq!(site.listing_url(), "https://www.babson.edu/about/events/");
        assert!(find_site("nowhere").is_none());
    }

    #[test]
    fn fetch_error_reports_its_page() {
        let err = FetchError::Status {
            page: 4,
            status: StatusCode::BAD_GATEWAY,
        };
        assert_eq!(err.page(), 4);
        assert_eq!(err.to_string(), "page 4 returned HTTP 502 Bad Gateway");
    }
}
