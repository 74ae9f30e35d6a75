//! Directive parser: the operator's manual calendar → [`Directive`] records.

use chrono_tz::Tz;
use tracing::{debug, warn};

use crate::error::SyncError;
use crate::feed::event_span;
use crate::model::{Directive, DirectiveKind, Label};

#[derive(Debug, Clone, Default)]
pub struct ParsedDirectives {
    pub directives: Vec<Directive>,
    /// Entries dropped because their label or range was unusable.
    pub skipped: usize,
    /// Set when a payload was present but unreadable as a calendar.
    pub error: Option<SyncError>,
}

/// Parse the manual directive payload. `None` (no payload stored yet) is not an error.
pub fn parse_directives(payload: Option<&[u8]>, tz: Tz) -> ParsedDirectives {
    let Some(bytes) = payload else {
        debug!("no manual directive payload");
        return ParsedDirectives::default();
    };

    let decoded = match ics_core::decode_bytes(bytes) {
        Ok(decoded) => decoded,
        Err(e) => {
            warn!(error = %e, "manual directive payload is unreadable");
            return ParsedDirectives {
                error: Some(SyncError::Parse {
                    source_id: "manual".to_string(),
                    message: e.to_string(),
                }),
                ..ParsedDirectives::default()
            };
        }
    };

    let mut out = ParsedDirectives::default();
    for event in decoded.calendars.iter().flat_map(|c| c.children("VEVENT")) {
        let uid = event.text("UID").unwrap_or_default().trim().to_string();
        let Some(kind) = Label::from_component(event).and_then(DirectiveKind::from_label) else {
            warn!(uid = %uid, "skipping manual entry without a directive label");
            out.skipped += 1;
            continue;
        };

        let parsed = event_span(event, tz, &uid).and_then(|(start, end)| {
            let uid = if uid.is_empty() {
                format!("{}-{}", kind.label().as_str().to_lowercase(), start.format("%Y%m%d"))
            } else {
                uid.clone()
            };
            let description = event
                .text("DESCRIPTION")
                .filter(|d| !d.trim().is_empty())
                .or_else(|| event.text("SUMMARY"))
                .unwrap_or_default();
            Directive::new(uid, kind, start, end, description.trim())
        });

        match parsed {
            Ok(directive) => out.directives.push(directive),
            Err(e) => {
                warn!(uid = %uid, error = %e, "skipping malformed directive");
                out.skipped += 1;
            }
        }
    }

    debug!(
        directives = out.directives.len(),
        skipped = out.skipped,
        "parsed manual directives"
    );
    out
}
