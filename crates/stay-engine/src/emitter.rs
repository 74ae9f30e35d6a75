//! Calendar emitter: resolved nights back to the interchange format.
//!
//! Consecutive nights with the same category and origin collapse into one
//! all-day event. `Available` nights are never written; a night without an event
//! is bookable. Output is a pure function of the input: no wall-clock stamps, and
//! events are ordered by `(start, category, origin)`.

use chrono::NaiveDate;
use ics_core::{date_property, encode, format_date, Component, Property};
use serde::Serialize;

use crate::error::Result;
use crate::model::{BufferInterval, BufferKind, Label, NightCategory, Reservation};
use crate::resolver::NightMap;

/// Calendar-level metadata written into every emitted payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarMeta {
    pub prodid: String,
    pub name: String,
    pub timezone: String,
}

impl CalendarMeta {
    pub fn new(name: impl Into<String>, timezone: impl Into<String>) -> Self {
        Self {
            prodid: "-//staysync//Rental Calendar Sync//EN".to_string(),
            name: name.into(),
            timezone: timezone.into(),
        }
    }
}

/// A run of consecutive nights sharing category and origin; `end` is exclusive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NightRun {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub category: NightCategory,
    pub origin_uid: Option<String>,
    pub description: String,
}

/// Rendered payload plus the number of events it holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Emitted {
    pub payload: String,
    pub events: usize,
}

/// Run-length encode non-available nights.
pub fn night_runs(nights: &NightMap) -> Vec<NightRun> {
    let mut runs: Vec<NightRun> = Vec::new();
    for night in nights.iter() {
        if night.category == NightCategory::Available {
            continue;
        }
        if let Some(last) = runs.last_mut() {
            if last.end == night.date
                && last.category == night.category
                && last.origin_uid == night.origin_uid
            {
                last.end = night.date.succ_opt().unwrap_or(night.date);
                continue;
            }
        }
        runs.push(NightRun {
            start: night.date,
            end: night.date.succ_opt().unwrap_or(night.date),
            category: night.category,
            origin_uid: night.origin_uid.clone(),
            description: night.description.clone(),
        });
    }
    runs.sort_by(|a, b| {
        (a.start, a.category, &a.origin_uid).cmp(&(b.start, b.category, &b.origin_uid))
    });
    runs
}

/// Render the resolved (master) calendar.
pub fn emit_master(nights: &NightMap, meta: &CalendarMeta) -> Result<Emitted> {
    let runs = night_runs(nights);
    let mut calendar = calendar_shell(meta);
    for run in &runs {
        // Available runs are filtered out above, so a label always exists.
        let Some(label) = run.category.label() else {
            continue;
        };
        let origin = run.origin_uid.as_deref().unwrap_or("night");
        let uid = format!(
            "{}-{}-{}",
            origin,
            label.as_str().to_ascii_lowercase(),
            format_date(run.start)
        );
        let mut event = day_event(&uid, run.start, run.end);
        event.push(Property::text_value("SUMMARY", run.category.title()));
        event.push(Property::text_value("DESCRIPTION", &run.description));
        event.push(Property::new("CATEGORIES", label.as_str()));
        event.push(Property::new("STATUS", "CONFIRMED"));
        event.push(Property::new("TRANSP", "OPAQUE"));
        calendar.push_component(event);
    }
    Ok(Emitted {
        payload: encode(&calendar)?,
        events: runs.len(),
    })
}

/// Render the import calendar: every reservation and buffer, unresolved.
///
/// Reservations keep their own summary, description and source so the payload can
/// be fed back through the feed parser as a cached source.
pub fn emit_import(
    reservations: &[Reservation],
    buffers: &[BufferInterval],
    meta: &CalendarMeta,
) -> Result<Emitted> {
    let mut events: Vec<(NaiveDate, String, Component)> = Vec::new();

    for r in reservations {
        let mut event = day_event(r.uid(), r.start(), r.end());
        event.push(Property::text_value("SUMMARY", r.summary()));
        event.push(Property::text_value("DESCRIPTION", r.description()));
        if !r.location().is_empty() {
            event.push(Property::text_value("LOCATION", r.location()));
        }
        event.push(Property::new("CATEGORIES", Label::Reservation.as_str()));
        event.push(Property::text_value("X-STAY-SOURCE", &r.source().to_string()));
        event.push(Property::new("STATUS", "CONFIRMED"));
        event.push(Property::new("TRANSP", "OPAQUE"));
        events.push((r.start(), r.uid().to_string(), event));
    }

    for b in buffers {
        let uid = b.uid();
        let side = match b.kind() {
            BufferKind::Before => "before",
            BufferKind::After => "after",
        };
        let mut event = day_event(&uid, b.start(), b.end());
        event.push(Property::text_value(
            "SUMMARY",
            &format!("Prep time {} {}", side, b.parent_uid()),
        ));
        event.push(Property::text_value("DESCRIPTION", b.description()));
        event.push(Property::new("CATEGORIES", Label::PrepTime.as_str()));
        event.push(Property::new("STATUS", "CONFIRMED"));
        event.push(Property::new("TRANSP", "TRANSPARENT"));
        events.push((b.start(), uid, event));
    }

    events.sort_by(|a, b| (a.0, &a.1).cmp(&(b.0, &b.1)));
    let count = events.len();
    let mut calendar = calendar_shell(&CalendarMeta {
        name: format!("{} (import)", meta.name),
        ..meta.clone()
    });
    for (_, _, event) in events {
        calendar.push_component(event);
    }
    Ok(Emitted {
        payload: encode(&calendar)?,
        events: count,
    })
}

pub(crate) fn calendar_shell(meta: &CalendarMeta) -> Component {
    let mut calendar = Component::new("VCALENDAR");
    calendar.push(Property::new("VERSION", "2.0"));
    calendar.push(Property::text_value("PRODID", &meta.prodid));
    calendar.push(Property::new("CALSCALE", "GREGORIAN"));
    calendar.push(Property::new("METHOD", "PUBLISH"));
    calendar.push(Property::text_value("X-WR-CALNAME", &meta.name));
    calendar.push(Property::text_value("X-WR-TIMEZONE", &meta.timezone));
    calendar
}

/// All-day VEVENT skeleton. DTSTAMP is derived from the start date to keep output stable.
pub(crate) fn day_event(uid: &str, start: NaiveDate, end: NaiveDate) -> Component {
    let mut event = Component::new("VEVENT");
    event.push(Property::text_value("UID", uid));
    event.push(Property::new("DTSTAMP", format!("{}T000000Z", format_date(start))));
    event.push(date_property("DTSTART", start));
    event.push(date_property("DTEND", end));
    event
}
