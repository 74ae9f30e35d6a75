//! Collapse reservations that describe the same stay as reported by several sources.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use tracing::{debug, info};

use crate::model::Reservation;

/// Deduplicated reservations plus how many records were dropped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Deduplicated {
    pub reservations: Vec<Reservation>,
    pub removed: usize,
}

/// Group by `(start, end, summary)` (exact, case-sensitive) and keep one record per group.
///
/// The survivor has the longest description; ties go to the earlier [`crate::Source`]
/// variant, then to the lexically smaller UID, so the result does not depend on
/// input order. Output is sorted by `(start, end, summary)`.
pub fn deduplicate(reservations: Vec<Reservation>) -> Deduplicated {
    let total = reservations.len();
    let mut groups: BTreeMap<(NaiveDate, NaiveDate, String), Reservation> = BTreeMap::new();

    for candidate in reservations {
        let key = (candidate.start(), candidate.end(), candidate.summary().to_string());
        match groups.get_mut(&key) {
            Some(kept) => {
                if outranks(&candidate, kept) {
                    debug!(kept = %candidate.uid(), dropped = %kept.uid(), "duplicate stay");
                    *kept = candidate;
                } else {
                    debug!(kept = %kept.uid(), dropped = %candidate.uid(), "duplicate stay");
                }
            }
            None => {
                groups.insert(key, candidate);
            }
        }
    }

    let reservations: Vec<Reservation> = groups.into_values().collect();
    let removed = total - reservations.len();
    if removed > 0 {
        info!(removed, "removed duplicate reservations");
    }
    Deduplicated {
        reservations,
        removed,
    }
}

fn outranks(candidate: &Reservation, kept: &Reservation) -> bool {
    let candidate_len = candidate.description().chars().count();
    let kept_len = kept.description().chars().count();
    (candidate_len, std::cmp::Reverse(candidate.source()), std::cmp::Reverse(candidate.uid()))
        > (kept_len, std::cmp::Reverse(kept.source()), std::cmp::Reverse(kept.uid()))
}
