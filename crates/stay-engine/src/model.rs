//! Record types flowing through the pipeline.
//!
//! `Reservation`, `BufferInterval` and `Directive` are immutable once built and
//! their constructors reject empty or inverted ranges, so every downstream stage
//! can rely on `start < end`. All ranges are half-open: `[start, end)` in nights.

use std::fmt;
use std::str::FromStr;

use chrono::{Duration, NaiveDate};
use ics_core::Component;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SyncError};

/// Where a reservation came from.
///
/// Variant order is significant: it is the deduplication tie-break.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Source {
    Airbnb,
    Booking,
    Vrbo,
    Other(String),
    /// Re-loaded from a previously emitted import calendar.
    Import,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Airbnb => f.write_str("AIRBNB"),
            Source::Booking => f.write_str("BOOKING"),
            Source::Vrbo => f.write_str("VRBO"),
            Source::Other(name) => f.write_str(name),
            Source::Import => f.write_str("IMPORT"),
        }
    }
}

impl FromStr for Source {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        Ok(match upper.as_str() {
            "AIRBNB" => Source::Airbnb,
            "BOOKING" | "BOOKING.COM" => Source::Booking,
            "VRBO" => Source::Vrbo,
            "IMPORT" => Source::Import,
            _ => Source::Other(upper),
        })
    }
}

impl From<String> for Source {
    fn from(s: String) -> Self {
        match s.parse() {
            Ok(source) => source,
            Err(never) => match never {},
        }
    }
}

impl From<Source> for String {
    fn from(source: Source) -> Self {
        source.to_string()
    }
}

/// Category labels carried in `CATEGORIES`, parsed once at the parser boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Label {
    Reservation,
    PrepTime,
    ManualBlock,
    ManualRemove,
}

impl Label {
    /// Canonical wire spelling.
    pub fn as_str(self) -> &'static str {
        match self {
            Label::Reservation => "RESERVATION",
            Label::PrepTime => "PREP-TIME",
            Label::ManualBlock => "MANUAL-BLOCK",
            Label::ManualRemove => "MANUAL-REMOVE",
        }
    }

    /// Exact, case-insensitive match of a single category token.
    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim().to_ascii_uppercase().as_str() {
            "RESERVATION" | "RESERVATION-NATIVE" => Some(Label::Reservation),
            "PREP-TIME" | "PREP-TIME-BEFORE" | "PREP-TIME-AFTER" => Some(Label::PrepTime),
            "MANUAL-BLOCK" => Some(Label::ManualBlock),
            "MANUAL-REMOVE" => Some(Label::ManualRemove),
            _ => None,
        }
    }

    /// First recognized label across every `CATEGORIES` property of an event.
    pub fn from_component(event: &Component) -> Option<Self> {
        event
            .properties_named("CATEGORIES")
            .flat_map(|p| {
                p.text()
                    .split(',')
                    .map(str::to_string)
                    .collect::<Vec<_>>()
            })
            .find_map(|token| Label::from_token(&token))
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn check_range(uid: &str, start: NaiveDate, end: NaiveDate) -> Result<()> {
    if end <= start {
        return Err(SyncError::Validation {
            uid: uid.to_string(),
            message: format!("end {end} is not after start {start}"),
        });
    }
    Ok(())
}

/// Every night in `[start, end)`.
pub fn nights(start: NaiveDate, end: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    start.iter_days().take_while(move |d| *d < end)
}

/// A confirmed booking interval from one source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reservation {
    uid: String,
    source: Source,
    start: NaiveDate,
    end: NaiveDate,
    summary: String,
    description: String,
    location: String,
}

impl Reservation {
    /// # Errors
    /// Returns `SyncError::Validation` unless `end > start`.
    pub fn new(
        uid: impl Into<String>,
        source: Source,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Self> {
        let uid = uid.into();
        check_range(&uid, start, end)?;
        Ok(Self {
            uid,
            source,
            start,
            end,
            summary: String::new(),
            description: String::new(),
            location: String::new(),
        })
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = summary.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = location.into();
        self
    }

    pub fn uid(&self) -> &str {
        &self.uid
    }

    pub fn source(&self) -> &Source {
        &self.source
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    /// Exclusive: the checkout date.
    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn summary(&self) -> &str {
        &self.summary
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn nights(&self) -> impl Iterator<Item = NaiveDate> {
        nights(self.start, self.end)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum BufferKind {
    Before,
    After,
}

/// Preparation time adjacent to a reservation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BufferInterval {
    parent_uid: String,
    kind: BufferKind,
    start: NaiveDate,
    end: NaiveDate,
    description: String,
}

impl BufferInterval {
    /// Derive the buffer of `kind` for `parent`.
    ///
    /// `None` when `days` is zero or the buffer would leave the calendar's date range.
    pub fn derive(parent: &Reservation, kind: BufferKind, days: u32) -> Option<Self> {
        if days == 0 {
            return None;
        }
        let span = Duration::try_days(i64::from(days))?;
        let (start, end) = match kind {
            BufferKind::Before => (parent.start().checked_sub_signed(span)?, parent.start()),
            BufferKind::After => (parent.end(), parent.end().checked_add_signed(span)?),
        };
        Some(Self {
            parent_uid: parent.uid().to_string(),
            kind,
            start,
            end,
            description: format!(
                "Preparation time. Linked to {} reservation {} to {}",
                parent.source(),
                parent.start(),
                parent.end()
            ),
        })
    }

    pub fn parent_uid(&self) -> &str {
        &self.parent_uid
    }

    pub fn kind(&self) -> BufferKind {
        self.kind
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// UID used when the buffer is written to the import calendar.
    pub fn uid(&self) -> String {
        match self.kind {
            BufferKind::Before => format!("{}-tp-before", self.parent_uid),
            BufferKind::After => format!("{}-tp-after", self.parent_uid),
        }
    }

    pub fn nights(&self) -> impl Iterator<Item = NaiveDate> {
        nights(self.start, self.end)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum DirectiveKind {
    Block,
    Unblock,
}

impl DirectiveKind {
    pub fn label(self) -> Label {
        match self {
            DirectiveKind::Block => Label::ManualBlock,
            DirectiveKind::Unblock => Label::ManualRemove,
        }
    }

    pub fn from_label(label: Label) -> Option<Self> {
        match label {
            Label::ManualBlock => Some(DirectiveKind::Block),
            Label::ManualRemove => Some(DirectiveKind::Unblock),
            _ => None,
        }
    }
}

/// An operator instruction over a date range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Directive {
    uid: String,
    kind: DirectiveKind,
    start: NaiveDate,
    end: NaiveDate,
    description: String,
}

impl Directive {
    /// # Errors
    /// Returns `SyncError::Validation` unless `end > start`.
    pub fn new(
        uid: impl Into<String>,
        kind: DirectiveKind,
        start: NaiveDate,
        end: NaiveDate,
        description: impl Into<String>,
    ) -> Result<Self> {
        let uid = uid.into();
        check_range(&uid, start, end)?;
        Ok(Self {
            uid,
            kind,
            start,
            end,
            description: description.into(),
        })
    }

    pub fn uid(&self) -> &str {
        &self.uid
    }

    pub fn kind(&self) -> DirectiveKind {
        self.kind
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn nights(&self) -> impl Iterator<Item = NaiveDate> {
        nights(self.start, self.end)
    }
}

/// Resolved status of one night. Declaration order is the emitter's sort order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NightCategory {
    #[default]
    Available,
    PrepTime,
    Reserved,
    Blocked,
}

impl NightCategory {
    /// Label written for this category; `None` for `Available`, which is implicit.
    pub fn label(self) -> Option<Label> {
        match self {
            NightCategory::Available => None,
            NightCategory::PrepTime => Some(Label::PrepTime),
            NightCategory::Reserved => Some(Label::Reservation),
            NightCategory::Blocked => Some(Label::ManualBlock),
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            NightCategory::Available => "Available",
            NightCategory::PrepTime => "Prep time",
            NightCategory::Reserved => "Reserved",
            NightCategory::Blocked => "Blocked",
        }
    }
}

impl fmt::Display for NightCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NightState {
    pub date: NaiveDate,
    pub category: NightCategory,
    pub description: String,
    pub origin_uid: Option<String>,
}

impl NightState {
    pub fn available(date: NaiveDate) -> Self {
        Self {
            date,
            category: NightCategory::Available,
            description: String::new(),
            origin_uid: None,
        }
    }
}

/// The bounded range of nights `[start, end)` that gets resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ResolutionWindow {
    start: NaiveDate,
    end: NaiveDate,
}

impl ResolutionWindow {
    /// # Errors
    /// Returns `SyncError::InvalidWindow` if the window holds no nights.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if end <= start {
            return Err(SyncError::InvalidWindow { start, end });
        }
        Ok(Self { start, end })
    }

    /// `[today - past_days, today + future_days)`.
    ///
    /// # Errors
    /// `SyncError::Config` if either edge falls outside the representable dates.
    pub fn around(today: NaiveDate, past_days: u32, future_days: u32) -> Result<Self> {
        let start = Duration::try_days(i64::from(past_days))
            .and_then(|span| today.checked_sub_signed(span))
            .ok_or_else(|| {
                SyncError::Config(format!("window of {past_days} past days is out of range"))
            })?;
        let end = Duration::try_days(i64::from(future_days))
            .and_then(|span| today.checked_add_signed(span))
            .ok_or_else(|| {
                SyncError::Config(format!("window of {future_days} future days is out of range"))
            })?;
        Self::new(start, end)
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date < self.end
    }

    /// Intersect `[start, end)` with the window.
    pub fn clip(&self, start: NaiveDate, end: NaiveDate) -> Option<(NaiveDate, NaiveDate)> {
        let start = start.max(self.start);
        let end = end.min(self.end);
        (start < end).then_some((start, end))
    }

    pub fn nights(&self) -> impl Iterator<Item = NaiveDate> {
        nights(self.start, self.end)
    }

    pub fn len(&self) -> usize {
        (self.end - self.start).num_days() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
