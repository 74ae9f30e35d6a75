//! The CPU-only reconciliation pipeline over already-fetched payloads.
//!
//! ```text
//! feeds ─ parse ─┬─ deduplicate ─ expand buffers ─┐
//!                │                                ├─ resolve ─ emit
//! manual ────────┴──────── parse directives ──────┘
//! ```

use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::buffer::expand_buffers;
use crate::config::SyncConfig;
use crate::dedup::deduplicate;
use crate::directive::parse_directives;
use crate::emitter::{emit_import, emit_master, CalendarMeta};
use crate::error::SyncError;
use crate::feed::parse_feed;
use crate::model::{NightCategory, Source};
use crate::resolver::{resolve, NightMap};

/// Raw bytes fetched from one source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedPayload {
    pub id: String,
    pub source: Source,
    pub bytes: Vec<u8>,
}

/// Everything one run consumes.
#[derive(Debug, Clone, Default)]
pub struct RunInputs {
    pub feeds: Vec<FeedPayload>,
    /// Sources that could not be fetched at all.
    pub fetch_failures: Vec<SyncError>,
    pub directives: Option<Vec<u8>>,
    pub cached_import: Option<Vec<u8>>,
}

/// Tallies reported to the surrounding application.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Counts {
    pub sources_ok: usize,
    pub sources_failed: usize,
    /// Reservations read from all sources, before deduplication.
    pub fetched: usize,
    pub duplicates_removed: usize,
    pub reservations: usize,
    /// Buffer intervals derived.
    pub buffered: usize,
    pub directives: usize,
    pub reserved_nights: usize,
    pub prep_nights: usize,
    /// Nights blocked by directives.
    pub blocked: usize,
    /// Prep nights released by directives.
    pub removed: usize,
    pub skipped_records: usize,
    pub events_emitted: usize,
    pub used_cached_import: bool,
}

/// Successful run output.
#[derive(Debug, Clone)]
pub struct Reconciliation {
    /// Resolved calendar.
    pub master: String,
    /// Reservations and buffers; stored as the fallback for later runs.
    pub import: String,
    pub nights: NightMap,
    pub counts: Counts,
    /// Recoverable problems: failed sources, unreadable directive payload.
    pub warnings: Vec<SyncError>,
}

/// A fatal run error with the counts gathered before it happened.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{error}")]
pub struct RunError {
    pub error: SyncError,
    pub counts: Counts,
}

impl RunError {
    pub fn new(error: SyncError, counts: Counts) -> Self {
        Self { error, counts }
    }
}

impl From<SyncError> for RunError {
    fn from(error: SyncError) -> Self {
        Self::new(error, Counts::default())
    }
}

/// Run the whole pipeline. `today` anchors the resolution window.
///
/// Falls back to `cached_import` when no feed yields a readable payload.
///
/// # Errors
/// `InvalidWindow` / `Config` for a bad configuration, `AggregateFailure` when no
/// source and no cache could be read, `Serialization` when rendering fails.
pub fn reconcile_payloads(
    inputs: &RunInputs,
    config: &SyncConfig,
    today: NaiveDate,
) -> Result<Reconciliation, RunError> {
    let mut counts = Counts::default();
    let tz = config.tz()?;
    let window = config.window(today)?;

    let mut warnings: Vec<SyncError> = inputs.fetch_failures.clone();
    counts.sources_failed = inputs.fetch_failures.len();

    let mut reservations = Vec::new();
    for feed in &inputs.feeds {
        let parsed = parse_feed(&feed.id, &feed.source, &feed.bytes, tz);
        counts.skipped_records += parsed.skipped;
        match parsed.error {
            Some(e) => {
                counts.sources_failed += 1;
                warnings.push(e);
            }
            None => {
                counts.sources_ok += 1;
                reservations.extend(parsed.reservations);
            }
        }
    }

    if counts.sources_ok == 0 {
        let attempted = counts.sources_failed;
        let cached = inputs
            .cached_import
            .as_deref()
            .map(|bytes| parse_feed("import", &Source::Import, bytes, tz))
            .filter(|parsed| parsed.error.is_none());
        let Some(parsed) = cached else {
            return Err(RunError::new(SyncError::AggregateFailure { attempted }, counts));
        };
        warn!(attempted, "no source succeeded, using cached import calendar");
        counts.used_cached_import = true;
        counts.skipped_records += parsed.skipped;
        reservations.extend(parsed.reservations);
    }
    counts.fetched = reservations.len();

    let deduped = deduplicate(reservations);
    counts.duplicates_removed = deduped.removed;
    counts.reservations = deduped.reservations.len();

    let buffers = expand_buffers(&deduped.reservations, config.before_days, config.after_days);
    counts.buffered = buffers.len();

    let parsed = parse_directives(inputs.directives.as_deref(), tz);
    counts.directives = parsed.directives.len();
    counts.skipped_records += parsed.skipped;
    if let Some(e) = parsed.error {
        warnings.push(e);
    }

    let resolution = resolve(&deduped.reservations, &buffers, &parsed.directives, window);
    counts.reserved_nights = resolution.nights.count(NightCategory::Reserved);
    counts.prep_nights = resolution.nights.count(NightCategory::PrepTime);
    counts.blocked = resolution.stats.blocked;
    counts.removed = resolution.stats.released;

    let meta = CalendarMeta::new(&config.calendar_name, &config.timezone);
    let master = emit_master(&resolution.nights, &meta)
        .map_err(|e| RunError::new(e.into(), counts.clone()))?;
    let import = emit_import(&deduped.reservations, &buffers, &meta)
        .map_err(|e| RunError::new(e.into(), counts.clone()))?;
    counts.events_emitted = master.events;

    info!(
        sources_ok = counts.sources_ok,
        sources_failed = counts.sources_failed,
        reservations = counts.reservations,
        events = counts.events_emitted,
        "reconciliation complete"
    );

    Ok(Reconciliation {
        master: master.payload,
        import: import.payload,
        nights: resolution.nights,
        counts,
        warnings,
    })
}
