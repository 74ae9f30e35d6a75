//! Feed parser: one source's payload → normalized [`Reservation`] records.
//!
//! Parsing never fails outright: the result always carries whatever reservations
//! could be read, and a payload-level problem is reported in [`ParsedFeed::error`]
//! so the caller can carry on with the other sources.

use chrono::{Duration, NaiveDate, TimeZone};
use chrono_tz::Tz;
use ics_core::{Component, DateValue};
use tracing::{debug, warn};

use crate::error::{Result, SyncError};
use crate::model::{Label, Reservation, Source};

/// Reservations read from one payload.
#[derive(Debug, Clone, Default)]
pub struct ParsedFeed {
    pub reservations: Vec<Reservation>,
    /// Records dropped because they were malformed.
    pub skipped: usize,
    /// Records deliberately left out (derived prep time, operator directives, cancellations).
    pub ignored: usize,
    /// Set when the payload is not a readable calendar container.
    pub error: Option<SyncError>,
}

/// Parse one source's payload.
///
/// Events already tagged `RESERVATION` (a previously emitted calendar) are taken
/// as reservations again, keeping the source recorded in `X-STAY-SOURCE`. Events
/// tagged as prep time or manual directives are skipped: those are re-derived or
/// owned by the operator.
pub fn parse_feed(source_id: &str, source: &Source, bytes: &[u8], tz: Tz) -> ParsedFeed {
    let decoded = match ics_core::decode_bytes(bytes) {
        Ok(decoded) => decoded,
        Err(e) => {
            warn!(source = %source_id, error = %e, "feed is not a calendar container");
            return ParsedFeed {
                error: Some(SyncError::Parse {
                    source_id: source_id.to_string(),
                    message: e.to_string(),
                }),
                ..ParsedFeed::default()
            };
        }
    };
    for diag in &decoded.diagnostics {
        debug!(source = %source_id, line = diag.line, "{}", diag.message);
    }

    let mut out = ParsedFeed::default();
    for event in decoded.calendars.iter().flat_map(|c| c.children("VEVENT")) {
        match Label::from_component(event) {
            None | Some(Label::Reservation) => {}
            Some(label) => {
                debug!(source = %source_id, %label, "skipping tagged event");
                out.ignored += 1;
                continue;
            }
        }
        if is_cancelled(event) {
            debug!(source = %source_id, "skipping cancelled event");
            out.ignored += 1;
            continue;
        }

        match reservation_from_event(event, source, tz) {
            Ok(reservation) => out.reservations.push(reservation),
            Err(e) => {
                warn!(source = %source_id, error = %e, "skipping malformed event");
                out.skipped += 1;
            }
        }
    }

    debug!(
        source = %source_id,
        reservations = out.reservations.len(),
        skipped = out.skipped,
        ignored = out.ignored,
        "parsed feed"
    );
    out
}

fn reservation_from_event(event: &Component, source: &Source, tz: Tz) -> Result<Reservation> {
    let raw_uid = event.text("UID").unwrap_or_default().trim().to_string();
    let (start, end) = event_span(event, tz, &raw_uid)?;
    let uid = if raw_uid.is_empty() {
        format!("{}-{}-{}", source, start.format("%Y%m%d"), end.format("%Y%m%d")).to_lowercase()
    } else {
        raw_uid
    };

    let source = event
        .text("X-STAY-SOURCE")
        .filter(|s| !s.trim().is_empty())
        .map(Source::from)
        .unwrap_or_else(|| source.clone());

    Ok(Reservation::new(uid, source, start, end)?
        .with_summary(event.text("SUMMARY").unwrap_or_default().trim())
        .with_description(clean_text(&event.text("DESCRIPTION").unwrap_or_default()))
        .with_location(event.text("LOCATION").unwrap_or_default().trim()))
}

fn is_cancelled(event: &Component) -> bool {
    event
        .text("STATUS")
        .is_some_and(|s| s.trim().eq_ignore_ascii_case("CANCELLED"))
}

/// Collapse line breaks and repeated spaces.
fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Night range `[start, end)` of an event.
///
/// `DTEND` wins over `DURATION`; an all-day `DTSTART` with neither covers one night.
pub(crate) fn event_span(event: &Component, tz: Tz, uid: &str) -> Result<(NaiveDate, NaiveDate)> {
    let invalid = |message: String| SyncError::Validation {
        uid: if uid.is_empty() { "<no uid>".to_string() } else { uid.to_string() },
        message,
    };

    let start_prop = event
        .property("DTSTART")
        .ok_or_else(|| invalid("missing DTSTART".to_string()))?;
    let start_value = DateValue::from_property(start_prop).map_err(|e| invalid(e.to_string()))?;
    let start = night_of(&start_value, tz);

    let end = if let Some(end_prop) = event.property("DTEND") {
        let value = DateValue::from_property(end_prop).map_err(|e| invalid(e.to_string()))?;
        night_of(&value, tz)
    } else if let Some(duration) = event.property("DURATION") {
        let days = parse_day_duration(&duration.value)
            .ok_or_else(|| invalid(format!("unsupported DURATION '{}'", duration.value)))?;
        Duration::try_days(days)
            .and_then(|span| start.checked_add_signed(span))
            .ok_or_else(|| invalid(format!("DURATION '{}' is out of range", duration.value)))?
    } else if matches!(start_value, DateValue::Date(_)) {
        start
            .succ_opt()
            .ok_or_else(|| invalid(format!("no night after {start}")))?
    } else {
        return Err(invalid("missing DTEND".to_string()));
    };

    if end <= start {
        return Err(invalid(format!("end {end} is not after start {start}")));
    }
    Ok((start, end))
}

/// The night a boundary falls on, seen from the property's zone.
pub(crate) fn night_of(value: &DateValue, tz: Tz) -> NaiveDate {
    match value {
        DateValue::Date(d) => *d,
        DateValue::Utc(dt) => dt.with_timezone(&tz).date_naive(),
        DateValue::Zoned(naive, tzid) => match tzid.parse::<Tz>() {
            Ok(event_tz) => event_tz
                .from_local_datetime(naive)
                .earliest()
                .map(|dt| dt.with_timezone(&tz).date_naive())
                .unwrap_or_else(|| naive.date()),
            Err(_) => naive.date(),
        },
        DateValue::Floating(naive) => naive.date(),
    }
}

/// `P3D`, `P2W`, `+P1D`. Time parts are not meaningful for nights.
fn parse_day_duration(raw: &str) -> Option<i64> {
    let body = raw.trim().trim_start_matches('+').strip_prefix('P')?;
    if let Some(weeks) = body.strip_suffix('W') {
        return weeks.parse::<i64>().ok()?.checked_mul(7);
    }
    let days = body.strip_suffix('D')?;
    days.parse::<i64>().ok()
}
