//! Preparation-time buffers around each reservation.

use tracing::warn;

use crate::model::{BufferInterval, BufferKind, Reservation};

/// Derive BEFORE/AFTER buffers for every reservation.
///
/// A zero day-count suppresses that side. Buffers touch but never overlap their
/// own reservation; overlap with other stays is settled by the resolver. A buffer
/// that would run past the last representable date is skipped with a warning.
pub fn expand_buffers(
    reservations: &[Reservation],
    before_days: u32,
    after_days: u32,
) -> Vec<BufferInterval> {
    reservations
        .iter()
        .flat_map(|r| {
            [
                derive_or_warn(r, BufferKind::Before, before_days),
                derive_or_warn(r, BufferKind::After, after_days),
            ]
        })
        .flatten()
        .collect()
}

fn derive_or_warn(parent: &Reservation, kind: BufferKind, days: u32) -> Option<BufferInterval> {
    let buffer = BufferInterval::derive(parent, kind, days);
    if buffer.is_none() && days > 0 {
        warn!(uid = parent.uid(), ?kind, days, "preparation time out of date range, skipped");
    }
    buffer
}
