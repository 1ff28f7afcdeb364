use serde::{Deserialize, Serialize};

/// Placeholder written for any field the listing markup did not provide.
pub const NOT_AVAILABLE: &str = "N/A";

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct EventRecord {
    pub title: String,
    pub start_date: String,
    pub end_date: String,
    pub start_time: String,
    pub end_time: String,
    pub location: String,
    pub link: String,
}

impl EventRecord {
    pub const FIELDS: [&'static str; 7] = [
        "title",
        "start_date",
        "end_date",
        "start_time",
        "end_time",
        "location",
        "link",
    ];

    /// Collapses the optional extraction results into a record, one field at a time.
    pub fn from_parts(
        title: Option<String>,
        dates: (Option<String>, Option<String>),
        times: (Option<String>, Option<String>),
        location: Option<String>,
        link: Option<String>,
    ) -> Self {
        Self {
            title: or_not_available(title),
            start_date: or_not_available(dates.0),
            end_date: or_not_available(dates.1),
            start_time: or_not_available(times.0),
            end_time: or_not_available(times.1),
            location: or_not_available(location),
            link: or_not_available(link),
        }
    }
}

fn or_not_available(value: Option<String>) -> String {
    value.unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

/// What one listing page yielded.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PageListing {
    pub records: Vec<EventRecord>,
    pub has_next: bool,
}

impl PageListing {
    pub fn end_of_listing() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_parts_become_not_available() {
        let record = EventRecord::from_parts(
            Some("Forum".to_string()),
            (Some("Nov 15, 2025".to_string()), Some("Nov 15, 2025".to_string())),
            (Some("10:00am".to_string()), None),
            None,
            Some("/e/1".to_string()),
        );
        assert_eq!(record.title, "Forum");
        assert_eq!(record.end_time, NOT_AVAILABLE);
        assert_eq!(record.location, NOT_AVAILABLE);
        assert_eq!(record.link, "/e/1");
    }
}
