//! DATE and DATE-TIME value parsing.
//!
//! Booking feeds mix all-day `DATE` values with `DATE-TIME` values in UTC, in a
//! named zone (`TZID=`), or floating. The decoder keeps values raw; this module
//! interprets them once so callers can decide how to map each form onto a night.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};

use crate::error::{IcsError, Result};
use crate::types::Property;

/// An interpreted `DTSTART` / `DTEND` style value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateValue {
    /// `VALUE=DATE` (`20260110`) or ISO `2026-01-10`.
    Date(NaiveDate),
    /// DATE-TIME with trailing `Z`.
    Utc(DateTime<Utc>),
    /// DATE-TIME qualified by a `TZID` parameter; the zone name is kept as given.
    Zoned(NaiveDateTime, String),
    /// DATE-TIME with neither `Z` nor `TZID`.
    Floating(NaiveDateTime),
}

impl DateValue {
    /// Interpret a property value, honoring its `TZID` parameter.
    ///
    /// # Errors
    /// Returns `IcsError::InvalidValue` if the value matches none of the accepted forms.
    pub fn from_property(property: &Property) -> Result<Self> {
        let raw = property.value.trim();
        let invalid = || IcsError::InvalidValue {
            property: property.name.clone(),
            value: raw.to_string(),
        };

        if let Some(date) = parse_date(raw) {
            return Ok(DateValue::Date(date));
        }

        let (body, utc) = match raw.strip_suffix('Z').or_else(|| raw.strip_suffix('z')) {
            Some(body) => (body, true),
            None => (raw, false),
        };
        let naive = parse_date_time(body).ok_or_else(invalid)?;

        if utc {
            return Ok(DateValue::Utc(Utc.from_utc_datetime(&naive)));
        }
        match property.param("TZID") {
            Some(tz) if !tz.is_empty() => Ok(DateValue::Zoned(naive, tz.to_string())),
            _ => Ok(DateValue::Floating(naive)),
        }
    }

    /// The calendar date as written, without any zone conversion.
    pub fn naive_date(&self) -> NaiveDate {
        match self {
            DateValue::Date(d) => *d,
            DateValue::Utc(dt) => dt.date_naive(),
            DateValue::Zoned(dt, _) | DateValue::Floating(dt) => dt.date(),
        }
    }
}

/// Parse `YYYYMMDD` or `YYYY-MM-DD`.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    match raw.len() {
        8 if raw.bytes().all(|b| b.is_ascii_digit()) => {
            NaiveDate::parse_from_str(raw, "%Y%m%d").ok()
        }
        10 => NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok(),
        _ => None,
    }
}

fn parse_date_time(raw: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, "%Y%m%dT%H%M%S")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y%m%dT%H%M"))
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S"))
        .ok()
}

/// Format a date as an iCalendar `DATE` value (`YYYYMMDD`).
pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}

/// Build a `NAME;VALUE=DATE:YYYYMMDD` property.
pub fn date_property(name: &str, date: NaiveDate) -> Property {
    Property::new(name, format_date(date)).with_param("VALUE", "DATE")
}
