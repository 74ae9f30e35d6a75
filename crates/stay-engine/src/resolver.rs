//! Night resolver: one [`NightState`] per night of the window.
//!
//! Priority is applied as a fixed sequence of passes over a freshly initialized map:
//!
//! 1. every night starts `Available`
//! 2. reservations mark their nights `Reserved` (sovereign from here on)
//! 3. buffers mark still-`Available` nights `PrepTime`
//! 4. UNBLOCK directives turn `PrepTime` nights back to `Available`
//! 5. BLOCK directives turn `Available` nights into `Blocked`
//!
//! Within each pass inputs are visited in a fixed order and the first writer
//! wins, so the result never depends on input order.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, info};

use crate::model::{
    BufferInterval, Directive, DirectiveKind, NightCategory, NightState, Reservation,
    ResolutionWindow,
};

/// Whether a BLOCK directive may claim a night currently in `category`.
///
/// Blocks yield to bookings: only `Available` nights are blocked, so neither a
/// reservation nor its prep time is ever hidden behind an operator block.
pub fn block_applies_to(category: NightCategory) -> bool {
    category == NightCategory::Available
}

/// Whether an UNBLOCK directive may release a night currently in `category`.
pub fn unblock_applies_to(category: NightCategory) -> bool {
    category == NightCategory::PrepTime
}

/// Resolved nights of one window, ordered by date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NightMap {
    window: ResolutionWindow,
    nights: BTreeMap<NaiveDate, NightState>,
}

impl NightMap {
    fn available(window: ResolutionWindow) -> Self {
        let nights = window
            .nights()
            .map(|d| (d, NightState::available(d)))
            .collect();
        Self { window, nights }
    }

    pub fn window(&self) -> ResolutionWindow {
        self.window
    }

    pub fn get(&self, date: NaiveDate) -> Option<&NightState> {
        self.nights.get(&date)
    }

    pub fn category(&self, date: NaiveDate) -> Option<NightCategory> {
        self.get(date).map(|n| n.category)
    }

    pub fn iter(&self) -> impl Iterator<Item = &NightState> {
        self.nights.values()
    }

    /// Nights in `[from, to)`.
    pub fn range(&self, from: NaiveDate, to: NaiveDate) -> impl Iterator<Item = &NightState> {
        self.nights.range(from..to.max(from)).map(|(_, n)| n)
    }

    pub fn len(&self) -> usize {
        self.nights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nights.is_empty()
    }

    pub fn count(&self, category: NightCategory) -> usize {
        self.iter().filter(|n| n.category == category).count()
    }
}

/// Per-pass tallies, in nights.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ResolutionStats {
    pub reserved: usize,
    pub prep_time: usize,
    /// Prep nights released by UNBLOCK.
    pub released: usize,
    pub blocked: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub nights: NightMap,
    pub stats: ResolutionStats,
}

/// Resolve every night of `window`. Intervals outside the window are ignored.
pub fn resolve(
    reservations: &[Reservation],
    buffers: &[BufferInterval],
    directives: &[Directive],
    window: ResolutionWindow,
) -> Resolution {
    let mut map = NightMap::available(window);
    let mut stats = ResolutionStats::default();

    let mut ordered: Vec<&Reservation> = reservations.iter().collect();
    ordered.sort_by(|a, b| (a.start(), a.end(), a.uid()).cmp(&(b.start(), b.end(), b.uid())));
    for r in ordered {
        let stamp = Stamp {
            category: NightCategory::Reserved,
            description: format!("{}. Check-in: {}. Check-out: {}", r.source(), r.start(), r.end()),
            origin_uid: r.uid().to_string(),
        };
        stats.reserved += apply(&mut map, r.start(), r.end(), &stamp, |current| {
            current != NightCategory::Reserved
        });
    }

    let mut ordered: Vec<&BufferInterval> = buffers.iter().collect();
    ordered.sort_by(|a, b| {
        (a.start(), a.parent_uid(), a.kind()).cmp(&(b.start(), b.parent_uid(), b.kind()))
    });
    for b in ordered {
        let stamp = Stamp {
            category: NightCategory::PrepTime,
            description: b.description().to_string(),
            origin_uid: b.uid(),
        };
        stats.prep_time += apply(&mut map, b.start(), b.end(), &stamp, |current| {
            current == NightCategory::Available
        });
    }

    let mut ordered: Vec<&Directive> = directives.iter().collect();
    ordered.sort_by(|a, b| (a.uid(), a.start()).cmp(&(b.uid(), b.start())));

    for d in ordered.iter().filter(|d| d.kind() == DirectiveKind::Unblock) {
        let stamp = Stamp {
            category: NightCategory::Available,
            description: or_default(d.description(), "Unblocked manually"),
            origin_uid: d.uid().to_string(),
        };
        stats.released += apply(&mut map, d.start(), d.end(), &stamp, unblock_applies_to);
    }

    for d in ordered.iter().filter(|d| d.kind() == DirectiveKind::Block) {
        let stamp = Stamp {
            category: NightCategory::Blocked,
            description: or_default(d.description(), "Blocked manually"),
            origin_uid: d.uid().to_string(),
        };
        stats.blocked += apply(&mut map, d.start(), d.end(), &stamp, block_applies_to);
    }

    info!(
        nights = map.len(),
        reserved = stats.reserved,
        prep_time = stats.prep_time,
        released = stats.released,
        blocked = stats.blocked,
        "resolved nights"
    );
    Resolution { nights: map, stats }
}

/// What a pass writes into the nights it claims.
struct Stamp {
    category: NightCategory,
    description: String,
    origin_uid: String,
}

/// Stamp every in-window night of `[start, end)` that `admits` accepts.
/// Returns how many nights changed.
fn apply(
    map: &mut NightMap,
    start: NaiveDate,
    end: NaiveDate,
    stamp: &Stamp,
    admits: impl Fn(NightCategory) -> bool,
) -> usize {
    let Some((start, end)) = map.window.clip(start, end) else {
        debug!(%start, %end, origin = %stamp.origin_uid, "interval outside window");
        return 0;
    };
    let mut changed = 0;
    for night in map.nights.range_mut(start..end).map(|(_, n)| n) {
        if admits(night.category) {
            night.category = stamp.category;
            night.description.clone_from(&stamp.description);
            night.origin_uid = Some(stamp.origin_uid.clone());
            changed += 1;
        }
    }
    changed
}

fn or_default(text: &str, fallback: &str) -> String {
    if text.trim().is_empty() {
        fallback.to_string()
    } else {
        text.to_string()
    }
}
