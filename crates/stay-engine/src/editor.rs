//! Directive editor: single-night BLOCK / UNBLOCK / CLEAR edits on the manual calendar.
//!
//! A [`DirectiveBook`] is loaded for one edit session, modified, and rendered back.
//! Entries it does not understand are carried through untouched.

use chrono::NaiveDate;
use chrono_tz::Tz;
use ics_core::{encode, format_date, Component, Property};
use tracing::info;

use crate::directive::{parse_directives, ParsedDirectives};
use crate::emitter::{calendar_shell, day_event, CalendarMeta};
use crate::error::{Result, SyncError};
use crate::feed::event_span;
use crate::model::{DirectiveKind, Label};

#[derive(Debug, Clone)]
pub struct DirectiveBook {
    events: Vec<Component>,
    tz: Tz,
}

impl DirectiveBook {
    pub fn empty(tz: Tz) -> Self {
        Self {
            events: Vec::new(),
            tz,
        }
    }

    /// Load the stored payload. Absence yields an empty book.
    ///
    /// # Errors
    /// Returns `SyncError::Parse` for an unreadable payload, so a damaged file is
    /// never silently replaced by an empty one.
    pub fn load(payload: Option<&[u8]>, tz: Tz) -> Result<Self> {
        let Some(bytes) = payload else {
            return Ok(Self::empty(tz));
        };
        let decoded = ics_core::decode_bytes(bytes).map_err(|e| SyncError::Parse {
            source_id: "manual".to_string(),
            message: e.to_string(),
        })?;
        let events = decoded
            .calendars
            .into_iter()
            .flat_map(|c| c.components.into_iter())
            .filter(|c| c.name == "VEVENT")
            .collect();
        Ok(Self { events, tz })
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Block each night, replacing any single-night directive already on it.
    pub fn block(&mut self, dates: &[NaiveDate]) -> usize {
        self.set(dates, DirectiveKind::Block)
    }

    /// Release each night's prep time, replacing any single-night directive already on it.
    pub fn unblock(&mut self, dates: &[NaiveDate]) -> usize {
        self.set(dates, DirectiveKind::Unblock)
    }

    /// Remove every directive starting on one of `dates`. Returns how many were removed.
    pub fn clear(&mut self, dates: &[NaiveDate]) -> usize {
        let before = self.events.len();
        let tz = self.tz;
        self.events
            .retain(|e| !matches!(span(e, tz), Some((start, _)) if dates.contains(&start)));
        let removed = before - self.events.len();
        info!(dates = dates.len(), removed, "cleared manual directives");
        removed
    }

    /// Directives currently in the book.
    pub fn directives(&self) -> ParsedDirectives {
        let mut calendar = Component::new("VCALENDAR");
        calendar.components = self.events.clone();
        match encode(&calendar) {
            Ok(payload) => parse_directives(Some(payload.as_bytes()), self.tz),
            Err(e) => ParsedDirectives {
                error: Some(e.into()),
                ..ParsedDirectives::default()
            },
        }
    }

    /// Render the book in the directive payload format.
    pub fn to_payload(&self, meta: &CalendarMeta) -> Result<String> {
        let mut calendar = calendar_shell(&CalendarMeta {
            name: format!("{} (manual)", meta.name),
            ..meta.clone()
        });
        calendar.components = self.events.clone();
        Ok(encode(&calendar)?)
    }

    fn set(&mut self, dates: &[NaiveDate], kind: DirectiveKind) -> usize {
        let tz = self.tz;
        for date in dates {
            let Some(next) = date.succ_opt() else {
                continue;
            };
            self.events
                .retain(|e| !matches!(span(e, tz), Some(s) if s == (*date, next)));
            self.events.push(single_night(*date, next, kind));
        }
        info!(dates = dates.len(), kind = ?kind, "recorded manual directives");
        dates.len()
    }
}

fn span(event: &Component, tz: Tz) -> Option<(NaiveDate, NaiveDate)> {
    let uid = event.text("UID").unwrap_or_default();
    event_span(event, tz, &uid).ok()
}

fn single_night(date: NaiveDate, next: NaiveDate, kind: DirectiveKind) -> Component {
    let (prefix, description) = match kind {
        DirectiveKind::Block => ("manual-block", "Blocked manually"),
        DirectiveKind::Unblock => ("manual-remove", "Unblocked manually"),
    };
    let label: Label = kind.label();
    let mut event = day_event(&format!("{}-{}", prefix, format_date(date)), date, next);
    event.push(Property::text_value("SUMMARY", &date.to_string()));
    event.push(Property::text_value("DESCRIPTION", description));
    event.push(Property::new("CATEGORIES", label.as_str()));
    event.push(Property::new("STATUS", "CONFIRMED"));
    event.push(Property::new("TRANSP", "TRANSPARENT"));
    event
}
