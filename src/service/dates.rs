//! Due-date parsing.
//!
//! Accepts what browser and script clients commonly send: ISO dates,
//! full timestamps with or without an offset, RFC 2822 strings, and epoch
//! milliseconds. Timestamps without an offset are read as UTC.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Utc};
use serde::Deserialize;

use crate::contracts::DeskError;

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Stored dates are kept to four-digit years so they always round-trip
/// through their RFC 3339 form.
const YEAR_RANGE: std::ops::RangeInclusive<i32> = 0..=9999;

/// A due date as it arrives over the wire.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum DueDateInput {
    EpochMillis(i64),
    Text(String),
}

impl DueDateInput {
    /// True for inputs a partial update treats as "not supplied"
    /// (empty string or zero).
    pub fn is_blank(&self) -> bool {
        match self {
            DueDateInput::EpochMillis(ms) => *ms == 0,
            DueDateInput::Text(s) => s.is_empty(),
        }
    }

    pub fn parse(&self) -> Result<DateTime<Utc>, DeskError> {
        match self {
            DueDateInput::EpochMillis(ms) => DateTime::from_timestamp_millis(*ms)
                .filter(|dt| YEAR_RANGE.contains(&dt.year()))
                .ok_or_else(|| DeskError::InvalidDate(ms.to_string())),
            DueDateInput::Text(s) => parse_due_date(s),
        }
    }
}

impl From<&str> for DueDateInput {
    fn from(value: &str) -> Self {
        DueDateInput::Text(value.to_string())
    }
}

/// Parses a textual due date.
pub fn parse_due_date(input: &str) -> Result<DateTime<Utc>, DeskError> {
    parse_text(input)
        .filter(|dt| YEAR_RANGE.contains(&dt.year()))
        .ok_or_else(|| DeskError::InvalidDate(input.to_string()))
}

fn parse_text(input: &str) -> Option<DateTime<Utc>> {
    let text = input.trim();
    if text.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }

    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
    }

    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Some(dt.and_utc());
        }
    }

    DateTime::parse_from_rfc2822(text)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn date_only_is_midnight_utc() {
        assert_eq!(
            parse_due_date("2024-03-15").unwrap(),
            Utc.with_ymd_and_hms(2024, 3, 15, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn rfc3339_offsets_are_normalized() {
        assert_eq!(
            parse_due_date("2024-03-15T10:00:00+02:00").unwrap(),
            Utc.with_ymd_and_hms(2024, 3, 15, 8, 0, 0).unwrap()
        );
        assert_eq!(
            parse_due_date("2024-03-15T10:00:00.000Z").unwrap(),
            Utc.with_ymd_and_hms(2024, 3, 15, 10, 0, 0).unwrap()
        );
    }

    #[test]
    fn naive_timestamps_are_read_as_utc() {
        let expected = Utc.with_ymd_and_hms(2024, 3, 15, 9, 30, 0).unwrap();
        assert_eq!(parse_due_date("2024-03-15T09:30").unwrap(), expected);
        assert_eq!(parse_due_date("2024-03-15 09:30:00").unwrap(), expected);
    }

    #[test]
    fn rfc2822_is_accepted() {
        assert_eq!(
            parse_due_date("Fri, 15 Mar 2024 10:00:00 +0000").unwrap(),
            Utc.with_ymd_and_hms(2024, 3, 15, 10, 0, 0).unwrap()
        );
    }

    #[test]
    fn garbage_is_invalid() {
        for input in ["", "   ", "not a date", "2024-13-01", "2024-02-30", "15/03/2024"] {
            assert!(
                matches!(parse_due_date(input), Err(DeskError::InvalidDate(_))),
                "{input:?} should be rejected"
            );
        }
    }

    #[test]
    fn epoch_millis_input() {
        let input = DueDateInput::EpochMillis(1_710_460_800_000);
        assert_eq!(
            input.parse().unwrap(),
            Utc.with_ymd_and_hms(2024, 3, 15, 0, 0, 0).unwrap()
        );
        assert!(matches!(
            DueDateInput::EpochMillis(i64::MAX).parse(),
            Err(DeskError::InvalidDate(_))
        ));
        // Year 10000 and beyond is out of range
        assert!(matches!(
            DueDateInput::EpochMillis(253_402_300_800_000).parse(),
            Err(DeskError::InvalidDate(_))
        ));
    }

    #[test]
    fn wire_input_accepts_strings_and_numbers() {
        let text: DueDateInput = serde_json::from_str("\"2024-03-15\"").unwrap();
        assert_eq!(text, DueDateInput::Text("2024-03-15".into()));
        let millis: DueDateInput = serde_json::from_str("1710460800000").unwrap();
        assert_eq!(millis, DueDateInput::EpochMillis(1_710_460_800_000));
    }

    #[test]
    fn blank_inputs() {
        assert!(DueDateInput::from("").is_blank());
        assert!(DueDateInput::EpochMillis(0).is_blank());
        assert!(!DueDateInput::from("2024-03-15").is_blank());
    }
}
