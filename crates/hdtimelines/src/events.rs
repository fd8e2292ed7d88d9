use crate::constants::{BIRTH_HEADER, DATE_HEADER, LABEL_HEADER};
use crate::dates::DateResolver;
use crate::error::{Result, TimelineError};

use csv::{ReaderBuilder, Trim};
use log::debug;
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::Path;

/// One row of an event file
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct EventRecord {
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hdate: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hdate_end: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hdate_birth: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hdate_death: Option<String>,
    /// Hover text; falls back to the label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Hover text for the end of the event
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub htext_end: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, alias = "colour", skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rank: Option<u32>,
}

impl EventRecord {
    pub fn new(label: &str, hdate: &str) -> Self {
        Self {
            label: label.to_string(),
            hdate: Some(hdate.to_string()),
            ..Default::default()
        }
    }

    /// Date columns present on this record, by header name
    pub fn date_fields(&self) -> [(&'static str, Option<&str>); 4] {
        [
            (DATE_HEADER, self.hdate.as_deref()),
            ("hdate_end", self.hdate_end.as_deref()),
            (BIRTH_HEADER, self.hdate_birth.as_deref()),
            ("hdate_death", self.hdate_death.as_deref()),
        ]
    }
}

/// Reads events from a CSV file
///
/// # Errors
/// Returns error if the file cannot be read or the header is missing
/// `label`, or has neither `hdate` nor `hdate_birth`
pub fn read_events_csv<P: AsRef<Path>>(path: P) -> Result<Vec<EventRecord>> {
    let file = std::fs::File::open(path)?;
    read_events_from_reader(file)
}

pub fn read_events_from_reader<R: Read>(reader: R) -> Result<Vec<EventRecord>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .flexible(true) // allow additional columns
        .from_reader(reader);

    validate_csv_headers(&mut rdr)?;

    let mut events = Vec::new();
    for result in rdr.deserialize() {
        let event: EventRecord = result?;
        events.push(event);
    }
    debug!("read {} events", events.len());
    Ok(events)
}

fn validate_csv_headers<R: Read>(csv_reader: &mut csv::Reader<R>) -> Result<()> {
    let headers = csv_reader
        .headers()
        .map_err(|e| TimelineError::CsvHeader(format!("Failed to read headers: {}", e)))?;

    let has = |name: &str| headers.iter().any(|h| h == name);

    if !has(LABEL_HEADER) {
        return Err(TimelineError::CsvHeader(format!(
            "Missing '{}' column",
            LABEL_HEADER
        )));
    }
    if !has(DATE_HEADER) && !has(BIRTH_HEADER) {
        return Err(TimelineError::CsvHeader(format!(
            "Expected '{}' or '{}' column",
            DATE_HEADER, BIRTH_HEADER
        )));
    }
    Ok(())
}

/// Resolves every date of every event, returning the event count
pub fn validate_events(events: &[EventRecord], resolver: &DateResolver) -> Result<usize> {
    for (i, event) in events.iter().enumerate() {
        let row = i + 2; // 1-indexed, after the header
        for (column, text) in event.date_fields() {
            if let Some(text) = text {
                resolver.resolve(text, false).map_err(|e| e.at(row, column))?;
            }
        }
    }
    Ok(events.len())
}

/// Reads a CSV file and checks that all of its dates resolve
pub fn check_events<P: AsRef<Path>>(path: P, resolver: &DateResolver) -> Result<usize> {
    let events = read_events_csv(path)?;
    validate_events(&events, resolver)
}
