use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use log::{info, warn};
use thiserror::Error;

use crate::collector::ResultWriter;
use crate::models::EventRecord;

#[derive(Debug, Error)]
pub enum WriteError {
    #[error("unable to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("unable to encode {}: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Written(usize),
    /// Nothing to write; the destination was left untouched.
    Empty,
}

pub struct CsvResultWriter {
    path: PathBuf,
}

impl CsvResultWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ResultWriter for CsvResultWriter {
    fn write(&self, records: &[EventRecord]) -> Result<WriteOutcome, WriteError> {
        write_events(&self.path, records)
    }
}

pub fn write_events(path: &Path, records: &[EventRecord]) -> Result<WriteOutcome, WriteError> {
    if records.is_empty() {
        warn!("no events to save; leaving {} untouched", path.display());
        return Ok(WriteOutcome::Empty);
    }

    let io_err = |source| WriteError::Io {
        path: path.to_path_buf(),
        source,
    };
    let csv_err = |source| WriteError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let file = File::create(path).map_err(io_err)?;
    let mut writer = csv::Writer::from_writer(file);
    for record in records {
        writer.serialize(record).map_err(csv_err)?;
    }
    let mut file = writer
        .into_inner()
        .map_err(|err| io_err(err.into_error()))?;
    file.flush().map_err(io_err)?;

    info!("saved {} events to {}", records.len(), path.display());
    Ok(WriteOutcome::Written(records.len()))
}

pub fn read_events(path: &Path) -> Result<Vec<EventRecord>, csv::Error> {
    let mut reader = csv::Reader::from_path(path)?;
    reader.deserialize().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NOT_AVAILABLE;

    fn record(title: &str, location: &str) -> EventRecord {
        EventRecord {
            title: title.to_string(),
            start_date: "Nov 15, 2025".to_string(),
            end_date: "Nov 15, 2025".to_string(),
            start_time: "10:00am".to_string(),
            end_time: NOT_AVAILABLE.to_string(),
            location: location.to_string(),
            link: "/about/events/forum/".to_string(),
        }
    }

    #[test]
    fn writes_header_and_rows_in_column_order() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("events.csv");
        let writer = CsvResultWriter::new(&path);

        let outcome = writer
            .write(&[record("Forum", "Knight Auditorium")])
            .expect("write csv");
        assert_eq!(outcome, WriteOutcome::Written(1));

        let contents = std::fs::read_to_string(&path).expect("read back");
        let mut lines = contents.lines();
        assert_eq!(lines.next(), Some(EventRecord::FIELDS.join(",").as_str()));
        assert_eq!(
            lines.next(),
            Some("Forum,\"Nov 15, 2025\",\"Nov 15, 2025\",10:00am,N/A,Knight Auditorium,/about/events/forum/")
        );
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn round_trips_values_with_delimiters_and_quotes() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("events.csv");
        let records = vec![
            record("Plain title", "Olin Hall"),
            record("Talk: \"Scaling, Fast\"", "Room 1, Horn Library"),
            record("Multi\nline", NOT_AVAILABLE),
        ];

        write_events(&path, &records).expect("write csv");
        let decoded = read_events(&path).expect("read csv");

        assert_eq!(decoded, records);
    }

    #[test]
    fn empty_collection_is_a_no_op() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("events.csv");

        let outcome = write_events(&path, &[]).expect("empty write");

        assert_eq!(outcome, WriteOutcome::Empty);
        assert!(!path.exists());
    }

    #[test]
    fn unwritable_destination_is_a_write_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("missing").join("events.csv");

        let err = write_events(&path, &[record("Forum", "Olin")]).expect_err("no parent dir");

        assert!(matches!(err, WriteError::Io { .. }));
    }
}
